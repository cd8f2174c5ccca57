//! Trait descriptors - the resolved representation handed to renderers.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::types::Combinator;

const ELLIPSIS: &str = " [...]";

/// Primitive JSON Schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Integer,
    Null,
    Number,
    String,
}

impl Primitive {
    /// Parse a `type` keyword value. Returns `None` for `array`, `object`
    /// and unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(Primitive::Boolean),
            "integer" => Some(Primitive::Integer),
            "null" => Some(Primitive::Null),
            "number" => Some(Primitive::Number),
            "string" => Some(Primitive::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Integer => "integer",
            Primitive::Null => "null",
            Primitive::Number => "number",
            Primitive::String => "string",
        }
    }
}

/// Base-type tag of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseType {
    Object,
    Instance,
    Boolean,
    Integer,
    Null,
    Number,
    String,
    Union,
    Compound,
    Enum,
    Array,
    Map,
    Not,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Object => "object",
            BaseType::Instance => "instance",
            BaseType::Boolean => "boolean",
            BaseType::Integer => "integer",
            BaseType::Null => "null",
            BaseType::Number => "number",
            BaseType::String => "string",
            BaseType::Union => "union",
            BaseType::Compound => "compound",
            BaseType::Enum => "enum",
            BaseType::Array => "array",
            BaseType::Map => "map",
            BaseType::Not => "not",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for properties not listed in `properties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalProperties {
    /// Any extra property is allowed (`true`) or rejected (`false`).
    Allowed(bool),
    /// Extra properties must match this trait.
    Trait(Box<TraitDescriptor>),
}

/// Element constraints of an array trait.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayItems {
    Any,
    Uniform(Box<TraitDescriptor>),
    Tuple(Vec<TraitDescriptor>),
}

/// What a descriptor describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraitKind {
    /// A named object type with fields.
    Object {
        fields: Vec<FieldDescriptor>,
        additional_properties: AdditionalProperties,
    },
    /// A value that is an instance of a named object type.
    Instance { target: String },
    Primitive { primitive: Primitive },
    /// A `type` list.
    Union { members: Vec<TraitDescriptor> },
    /// An `anyOf`/`oneOf`/`allOf` over branch traits.
    Compound {
        combinator: Combinator,
        branches: Vec<TraitDescriptor>,
    },
    Enum { values: Vec<Value> },
    Array { items: ArrayItems },
    /// An object without declared properties.
    Map { values: AdditionalProperties },
    Not { inner: Box<TraitDescriptor> },
}

/// A resolved type descriptor.
///
/// Named types (the root, definitions, referenced and anonymous objects)
/// carry a `classname`; inline traits such as a plain `number` field do
/// not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classname: Option<String>,
    #[serde(flatten)]
    pub kind: TraitKind,
    /// Must be present; no undefined/absent value is accepted.
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Other named types this one depends on, sorted. Includes named
    /// traits that were inlined into it.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

impl TraitDescriptor {
    pub fn new(kind: TraitKind) -> Self {
        Self {
            classname: None,
            kind,
            required: false,
            description: None,
            default: None,
            imports: Vec::new(),
        }
    }

    pub fn named(mut self, classname: impl Into<String>) -> Self {
        self.classname = Some(classname.into());
        self
    }

    /// Attach the per-use options passed through when building a trait.
    pub fn with_options(mut self, required: bool, description: Option<String>) -> Self {
        self.required = required;
        self.description = description;
        self
    }

    pub fn with_default(mut self, default: Option<&Value>) -> Self {
        self.default = default.cloned();
        self
    }

    /// Fill `imports` from the instances this descriptor refers to,
    /// excluding itself.
    pub fn with_imports(mut self) -> Self {
        let mut names = BTreeSet::new();
        self.kind.collect_instances(&mut names);
        if let Some(own) = &self.classname {
            names.remove(own);
        }
        self.imports = names.into_iter().collect();
        self
    }

    pub fn base_type(&self) -> BaseType {
        match &self.kind {
            TraitKind::Object { .. } => BaseType::Object,
            TraitKind::Instance { .. } => BaseType::Instance,
            TraitKind::Primitive { primitive } => match primitive {
                Primitive::Boolean => BaseType::Boolean,
                Primitive::Integer => BaseType::Integer,
                Primitive::Null => BaseType::Null,
                Primitive::Number => BaseType::Number,
                Primitive::String => BaseType::String,
            },
            TraitKind::Union { .. } => BaseType::Union,
            TraitKind::Compound { .. } => BaseType::Compound,
            TraitKind::Enum { .. } => BaseType::Enum,
            TraitKind::Array { .. } => BaseType::Array,
            TraitKind::Map { .. } => BaseType::Map,
            TraitKind::Not { .. } => BaseType::Not,
        }
    }

    /// Fields of an object descriptor; empty for every other kind.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            TraitKind::Object { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Additional-properties policy of object and map descriptors.
    pub fn additional_properties(&self) -> Option<&AdditionalProperties> {
        match &self.kind {
            TraitKind::Object {
                additional_properties,
                ..
            } => Some(additional_properties),
            TraitKind::Map { values } => Some(values),
            _ => None,
        }
    }

    /// Display name of the type: the classname when named, otherwise a
    /// structural name such as `number`, `string | null` or
    /// `array<Point>`.
    pub fn type_name(&self) -> String {
        if let Some(name) = &self.classname {
            return name.clone();
        }
        match &self.kind {
            TraitKind::Object { .. } => "object".to_string(),
            TraitKind::Instance { target } => target.clone(),
            TraitKind::Primitive { primitive } => primitive.as_str().to_string(),
            TraitKind::Union { members } => join_names(members, " | "),
            TraitKind::Compound {
                combinator,
                branches,
            } => format!("{}<{}>", combinator.keyword(), join_names(branches, ", ")),
            TraitKind::Enum { .. } => "enum".to_string(),
            TraitKind::Array { items } => match items {
                ArrayItems::Any => "array".to_string(),
                ArrayItems::Uniform(item) => format!("array<{}>", item.type_name()),
                ArrayItems::Tuple(items) => format!("tuple<{}>", join_names(items, ", ")),
            },
            TraitKind::Map { values } => match values {
                AdditionalProperties::Trait(value) => format!("map<{}>", value.type_name()),
                AdditionalProperties::Allowed(_) => "map".to_string(),
            },
            TraitKind::Not { inner } => format!("not<{}>", inner.type_name()),
        }
    }
}

impl TraitKind {
    fn collect_instances(&self, out: &mut BTreeSet<String>) {
        match self {
            TraitKind::Object {
                fields,
                additional_properties,
            } => {
                for field in fields {
                    field.descriptor.collect_instances(out);
                }
                additional_properties.collect_instances(out);
            }
            TraitKind::Instance { target } => {
                out.insert(target.clone());
            }
            TraitKind::Union { members: traits }
            | TraitKind::Compound {
                branches: traits, ..
            } => {
                for t in traits {
                    t.collect_instances(out);
                }
            }
            TraitKind::Array { items } => match items {
                ArrayItems::Any => {}
                ArrayItems::Uniform(item) => item.collect_instances(out),
                ArrayItems::Tuple(items) => {
                    for item in items {
                        item.collect_instances(out);
                    }
                }
            },
            TraitKind::Map { values } => values.collect_instances(out),
            TraitKind::Not { inner } => inner.collect_instances(out),
            TraitKind::Primitive { .. } | TraitKind::Enum { .. } => {}
        }
    }
}

impl TraitDescriptor {
    /// A named descriptor stands for its type; only anonymous ones are
    /// searched further.
    fn collect_instances(&self, out: &mut BTreeSet<String>) {
        match &self.classname {
            Some(name) => {
                out.insert(name.clone());
            }
            None => self.kind.collect_instances(out),
        }
    }
}

impl AdditionalProperties {
    fn collect_instances(&self, out: &mut BTreeSet<String>) {
        if let AdditionalProperties::Trait(t) = self {
            t.collect_instances(out);
        }
    }
}

/// One property of an object descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "trait")]
    pub descriptor: TraitDescriptor,
}

impl FieldDescriptor {
    pub fn required(&self) -> bool {
        self.descriptor.required
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    pub fn type_name(&self) -> String {
        self.descriptor.type_name()
    }
}

fn join_names(traits: &[TraitDescriptor], sep: &str) -> String {
    traits
        .iter()
        .map(TraitDescriptor::type_name)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Collapse whitespace and truncate `text` at a word boundary so the
/// result fits in `width` characters, marking the cut with ` [...]`.
/// When no word fits, the bare marker is returned, itself clipped to
/// `width`.
pub fn shorten_description(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut out = String::new();
    let mut len = 0;
    for word in words {
        let needed = word.chars().count() + usize::from(len > 0);
        if len + needed > budget {
            break;
        }
        if len > 0 {
            out.push(' ');
        }
        out.push_str(word);
        len += needed;
    }
    if out.is_empty() {
        return ELLIPSIS.trim_start().chars().take(width).collect();
    }
    out.push_str(ELLIPSIS);
    out
}
