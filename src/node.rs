//! Schema nodes - raw fragments bound to their document context.

use std::cell::OnceCell;

use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::extract::ExtractorKind;
use crate::reference::join_pointer;
use crate::types::{json_type_name, Combinator};

/// Per-node metadata set by the enclosing object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    /// The enclosing object lists this property in `required`.
    pub required: bool,
}

/// The declared `type` of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl<'a> {
    Single(&'a str),
    Union(Vec<&'a str>),
}

impl TypeDecl<'_> {
    /// Whether this is exactly `"object"`.
    pub fn is_object(&self) -> bool {
        matches!(self, TypeDecl::Single("object"))
    }
}

/// The declared `additionalProperties` of a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdditionalDecl<'a> {
    Allowed(bool),
    Schema(&'a Value),
}

/// Recognized keywords of a fragment, with draft-04 defaults applied.
///
/// Keywords that are absent take their defaults (`type` is `"object"`,
/// `additionalProperties` is `true`, `required` is empty). Keywords present
/// with the wrong JSON type are rejected when the record is parsed.
#[derive(Debug, Clone)]
pub struct SchemaFields<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub type_decl: TypeDecl<'a>,
    /// Whether `type` was written in the fragment rather than defaulted.
    pub declares_type: bool,
    pub properties: Option<&'a Map<String, Value>>,
    pub required: Vec<&'a str>,
    pub additional_properties: AdditionalDecl<'a>,
    pub reference: Option<&'a str>,
    pub enumeration: Option<&'a [Value]>,
    pub any_of: Option<&'a [Value]>,
    pub one_of: Option<&'a [Value]>,
    pub all_of: Option<&'a [Value]>,
    pub not: Option<&'a Value>,
    pub items: Option<&'a Value>,
    pub default: Option<&'a Value>,
    pub examples: Option<&'a Value>,
}

impl<'a> SchemaFields<'a> {
    /// Parse the recognized keywords of `schema`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchemaInput` for wrongly-typed keywords and
    /// `InvalidReferenceFormat` for a non-string `$ref`.
    pub fn parse(schema: &'a Map<String, Value>, pointer: &str) -> Result<Self, ResolveError> {
        let reference = match schema.get("$ref") {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(ResolveError::InvalidReferenceFormat {
                    reference: other.to_string(),
                })
            }
        };

        let (type_decl, declares_type) = match schema.get("type") {
            None => (TypeDecl::Single("object"), false),
            Some(Value::String(s)) => (TypeDecl::Single(s.as_str()), true),
            Some(Value::Array(arr)) => {
                let names = arr
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        ResolveError::invalid_input(pointer, "'type' list must contain only strings")
                    })?;
                (TypeDecl::Union(names), true)
            }
            Some(other) => {
                return Err(ResolveError::invalid_input(
                    pointer,
                    format!(
                        "'type' must be a string or list of strings, got {}",
                        json_type_name(other)
                    ),
                ))
            }
        };

        let required = match schema.get("required") {
            None => Vec::new(),
            Some(Value::Array(arr)) => arr
                .iter()
                .map(|v| v.as_str())
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    ResolveError::invalid_input(pointer, "'required' must contain only strings")
                })?,
            Some(other) => {
                return Err(ResolveError::invalid_input(
                    pointer,
                    format!("'required' must be a list, got {}", json_type_name(other)),
                ))
            }
        };

        let additional_properties = match schema.get("additionalProperties") {
            None => AdditionalDecl::Allowed(true),
            Some(Value::Bool(b)) => AdditionalDecl::Allowed(*b),
            Some(v @ Value::Object(_)) => AdditionalDecl::Schema(v),
            Some(other) => {
                return Err(ResolveError::invalid_input(
                    pointer,
                    format!(
                        "'additionalProperties' must be a boolean or schema, got {}",
                        json_type_name(other)
                    ),
                ))
            }
        };

        Ok(Self {
            title: string_field(schema, "title", pointer)?,
            description: string_field(schema, "description", pointer)?,
            type_decl,
            declares_type,
            properties: object_field(schema, "properties", pointer)?,
            required,
            additional_properties,
            reference,
            enumeration: array_field(schema, "enum", pointer)?,
            any_of: array_field(schema, "anyOf", pointer)?,
            one_of: array_field(schema, "oneOf", pointer)?,
            all_of: array_field(schema, "allOf", pointer)?,
            not: schema.get("not"),
            items: schema.get("items"),
            default: schema.get("default"),
            examples: schema.get("examples"),
        })
    }

    /// The first combinator present, consulted as `anyOf`, `oneOf`, `allOf`.
    pub fn compound(&self) -> Option<(Combinator, &'a [Value])> {
        Combinator::ALL.into_iter().find_map(|c| {
            let branches = match c {
                Combinator::AnyOf => self.any_of,
                Combinator::OneOf => self.one_of,
                Combinator::AllOf => self.all_of,
            };
            branches.map(|b| (c, b))
        })
    }
}

fn string_field<'a>(
    schema: &'a Map<String, Value>,
    key: &str,
    pointer: &str,
) -> Result<Option<&'a str>, ResolveError> {
    match schema.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ResolveError::invalid_input(
            pointer,
            format!("'{}' must be a string, got {}", key, json_type_name(other)),
        )),
    }
}

fn array_field<'a>(
    schema: &'a Map<String, Value>,
    key: &str,
    pointer: &str,
) -> Result<Option<&'a [Value]>, ResolveError> {
    match schema.get(key) {
        None => Ok(None),
        Some(Value::Array(arr)) => Ok(Some(arr.as_slice())),
        Some(other) => Err(ResolveError::invalid_input(
            pointer,
            format!("'{}' must be a list, got {}", key, json_type_name(other)),
        )),
    }
}

fn object_field<'a>(
    schema: &'a Map<String, Value>,
    key: &str,
    pointer: &str,
) -> Result<Option<&'a Map<String, Value>>, ResolveError> {
    match schema.get(key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ResolveError::invalid_input(
            pointer,
            format!("'{}' must be a mapping, got {}", key, json_type_name(other)),
        )),
    }
}

/// A schema fragment bound to its context, parent, name and metadata.
///
/// Every node of a resolution run shares the same context: the root
/// mapping that all `#/...` pointers resolve against.
#[derive(Debug, Clone)]
pub struct SchemaNode<'a> {
    schema: &'a Map<String, Value>,
    context: &'a Map<String, Value>,
    parent: Option<&'a Map<String, Value>>,
    name: Option<String>,
    metadata: Metadata,
    pointer: String,
    fields: SchemaFields<'a>,
    extractor: OnceCell<ExtractorKind>,
}

impl<'a> SchemaNode<'a> {
    /// Wrap a whole document; the document becomes its own context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchemaInput` if the document is not a mapping.
    pub fn root(document: &'a Value) -> Result<Self, ResolveError> {
        Self::from_context(as_mapping(document, "#")?)
    }

    pub(crate) fn from_context(context: &'a Map<String, Value>) -> Result<Self, ResolveError> {
        Self::build(context, context, None, None, Metadata::default(), "#".to_string())
    }

    pub(crate) fn bound(
        schema: &'a Value,
        context: &'a Map<String, Value>,
        parent: Option<&'a Map<String, Value>>,
        name: Option<String>,
        pointer: String,
    ) -> Result<Self, ResolveError> {
        let schema = as_mapping(schema, &pointer)?;
        Self::build(schema, context, parent, name, Metadata::default(), pointer)
    }

    fn build(
        schema: &'a Map<String, Value>,
        context: &'a Map<String, Value>,
        parent: Option<&'a Map<String, Value>>,
        name: Option<String>,
        metadata: Metadata,
        pointer: String,
    ) -> Result<Self, ResolveError> {
        let fields = SchemaFields::parse(schema, &pointer)?;
        Ok(Self {
            schema,
            context,
            parent,
            name,
            metadata,
            pointer,
            fields,
            extractor: OnceCell::new(),
        })
    }

    /// Make a child node for a nested fragment under `segment`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchemaInput` if the fragment is not a mapping.
    pub fn make_child(
        &self,
        schema: &'a Value,
        segment: &str,
        name: Option<String>,
        metadata: Metadata,
    ) -> Result<SchemaNode<'a>, ResolveError> {
        let pointer = join_pointer(&self.pointer, segment);
        let schema = as_mapping(schema, &pointer)?;
        Self::build(schema, self.context, Some(self.schema), name, metadata, pointer)
    }

    /// Make a child node for the `index`-th entry of a list-valued keyword
    /// such as `items` or `anyOf`.
    pub fn make_indexed_child(
        &self,
        schema: &'a Value,
        keyword: &str,
        index: usize,
    ) -> Result<SchemaNode<'a>, ResolveError> {
        let pointer = join_pointer(&join_pointer(&self.pointer, keyword), &index.to_string());
        let schema = as_mapping(schema, &pointer)?;
        Self::build(schema, self.context, Some(self.schema), None, Metadata::default(), pointer)
    }

    pub fn schema(&self) -> &'a Map<String, Value> {
        self.schema
    }

    pub fn context(&self) -> &'a Map<String, Value> {
        self.context
    }

    pub fn parent(&self) -> Option<&'a Map<String, Value>> {
        self.parent
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn metadata(&self) -> Metadata {
        self.metadata
    }

    /// JSON pointer of this fragment within its context (`#` for the root).
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn fields(&self) -> &SchemaFields<'a> {
        &self.fields
    }

    /// Whether this node wraps the context mapping itself.
    pub fn is_root(&self) -> bool {
        std::ptr::eq(self.schema, self.context)
    }

    /// Whether this fragment carries a `$ref`.
    pub fn is_reference(&self) -> bool {
        self.fields.reference.is_some()
    }

    /// Keys of the raw fragment, in document order.
    pub fn keys(&self) -> Vec<String> {
        self.schema.keys().cloned().collect()
    }

    pub(crate) fn extractor_cell(&self) -> &OnceCell<ExtractorKind> {
        &self.extractor
    }

    /// Child nodes for `properties`, each carrying its `required` flag.
    pub fn properties(&self) -> Result<Vec<(&'a str, SchemaNode<'a>)>, ResolveError> {
        let Some(props) = self.fields.properties else {
            return Ok(Vec::new());
        };
        let base = join_pointer(&self.pointer, "properties");
        let mut children = Vec::with_capacity(props.len());
        for (key, value) in props {
            let metadata = Metadata {
                required: self.fields.required.contains(&key.as_str()),
            };
            let pointer = join_pointer(&base, key);
            let schema = as_mapping(value, &pointer)?;
            let child = Self::build(schema, self.context, Some(self.schema), None, metadata, pointer)?;
            children.push((key.as_str(), child));
        }
        Ok(children)
    }

    /// Named child nodes held under each definition tag, in tag order.
    pub fn definitions<S: AsRef<str>>(
        &self,
        tags: &[S],
    ) -> Result<Vec<SchemaNode<'a>>, ResolveError> {
        let mut definitions = Vec::new();
        for tag in tags {
            let tag = tag.as_ref();
            let Some(value) = self.schema.get(tag) else {
                continue;
            };
            let base = join_pointer(&self.pointer, tag);
            let defs = value
                .as_object()
                .ok_or_else(|| ResolveError::invalid_input(&base, "definitions must be a mapping"))?;
            for (name, schema) in defs {
                let pointer = join_pointer(&base, name);
                let schema = as_mapping(schema, &pointer)?;
                definitions.push(Self::build(
                    schema,
                    self.context,
                    Some(defs),
                    Some(name.clone()),
                    Metadata::default(),
                    pointer,
                )?);
            }
        }
        Ok(definitions)
    }

    /// Child nodes for the branches of the node's combinator.
    pub fn branches(&self) -> Result<Vec<SchemaNode<'a>>, ResolveError> {
        let Some((combinator, branches)) = self.fields.compound() else {
            return Ok(Vec::new());
        };
        branches
            .iter()
            .enumerate()
            .map(|(i, branch)| self.make_indexed_child(branch, combinator.keyword(), i))
            .collect()
    }
}

fn as_mapping<'a>(value: &'a Value, pointer: &str) -> Result<&'a Map<String, Value>, ResolveError> {
    value.as_object().ok_or_else(|| {
        ResolveError::invalid_input(
            pointer,
            format!("schema should be a mapping, got {}", json_type_name(value)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_rejects_non_mapping() {
        let doc = json!(["not", "a", "schema"]);
        let result = SchemaNode::root(&doc);
        assert!(matches!(
            result,
            Err(ResolveError::InvalidSchemaInput { pointer, .. }) if pointer == "#"
        ));
    }

    #[test]
    fn root_is_its_own_context() {
        let doc = json!({"type": "object"});
        let root = SchemaNode::root(&doc).unwrap();
        assert!(root.is_root());
        assert!(root.parent().is_none());
        assert_eq!(root.pointer(), "#");
    }

    #[test]
    fn fields_apply_defaults() {
        let doc = json!({});
        let root = SchemaNode::root(&doc).unwrap();
        let fields = root.fields();
        assert_eq!(fields.type_decl, TypeDecl::Single("object"));
        assert!(!fields.declares_type);
        assert_eq!(fields.additional_properties, AdditionalDecl::Allowed(true));
        assert!(fields.required.is_empty());
        assert!(fields.description.is_none());
    }

    #[test]
    fn fields_parse_type_list() {
        let doc = json!({"type": ["string", "null"]});
        let root = SchemaNode::root(&doc).unwrap();
        assert_eq!(root.fields().type_decl, TypeDecl::Union(vec!["string", "null"]));
    }

    #[test]
    fn fields_reject_bad_required() {
        let doc = json!({"type": "object", "required": "name"});
        let result = SchemaNode::root(&doc);
        assert!(matches!(result, Err(ResolveError::InvalidSchemaInput { .. })));
    }

    #[test]
    fn fields_reject_non_string_ref() {
        let doc = json!({"$ref": 42});
        let result = SchemaNode::root(&doc);
        assert!(matches!(result, Err(ResolveError::InvalidReferenceFormat { .. })));
    }

    #[test]
    fn compound_prefers_any_of() {
        let doc = json!({"allOf": [{}], "anyOf": [{}, {}]});
        let root = SchemaNode::root(&doc).unwrap();
        let (combinator, branches) = root.fields().compound().unwrap();
        assert_eq!(combinator, Combinator::AnyOf);
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn properties_carry_required_metadata() {
        let doc = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "string"},
                "label": {"type": "string"}
            }
        });
        let root = SchemaNode::root(&doc).unwrap();
        let props = root.properties().unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].0, "id");
        assert!(props[0].1.metadata().required);
        assert_eq!(props[0].1.pointer(), "#/properties/id");
        assert!(!props[1].1.metadata().required);
        assert!(!props[1].1.is_root());
        assert!(std::ptr::eq(props[1].1.context(), root.schema()));
    }

    #[test]
    fn definitions_follow_tag_order() {
        let doc = json!({
            "$defs": {"B": {"type": "string"}},
            "definitions": {"A": {"type": "number"}}
        });
        let root = SchemaNode::root(&doc).unwrap();
        let defs = root.definitions(&["definitions", "$defs"]).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name().unwrap()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(defs[1].pointer(), "#/$defs/B");
    }

    #[test]
    fn child_must_be_mapping() {
        let doc = json!({"properties": {"x": true}});
        let root = SchemaNode::root(&doc).unwrap();
        let result = root.properties();
        assert!(matches!(
            result,
            Err(ResolveError::InvalidSchemaInput { pointer, .. }) if pointer == "#/properties/x"
        ));
    }
}
