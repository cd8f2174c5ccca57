//! Extractors - the ordered rule set that turns nodes into descriptors.
//!
//! Each [`ExtractorKind`] pairs a pure predicate ([`ExtractorKind::check`])
//! with builders for inline traits and named types. [`ExtractorKind::ALL`]
//! fixes the priority order; dispatch returns the first kind whose predicate
//! holds. New rules are added by inserting a variant at the right position
//! in that table.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::classify::Classifier;
use crate::descriptor::{
    AdditionalProperties, ArrayItems, FieldDescriptor, Primitive, TraitDescriptor, TraitKind,
};
use crate::error::ResolveError;
use crate::node::{AdditionalDecl, Metadata, SchemaNode, TypeDecl};
use crate::reference::resolve_reference;
use crate::resolver::Resolution;
use crate::types::Combinator;

/// Classification and codegen rules, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// `not`
    Not,
    /// `$ref` to an object type.
    RefObject,
    /// Any other `$ref`; the target's trait is inlined.
    RefTrait,
    AnyOfObject,
    OneOfObject,
    AllOfObject,
    /// Any remaining `anyOf`/`oneOf`/`allOf`.
    CompoundTrait,
    /// `enum` on a node with an explicit name.
    NamedEnum,
    AnonymousEnum,
    /// A single primitive `type`.
    SimpleType,
    /// A list of `type` names.
    CompoundType,
    Array,
    /// `type: "object"`, declared or defaulted.
    Object,
}

impl ExtractorKind {
    /// Every extractor, highest priority first.
    pub const ALL: [ExtractorKind; 13] = [
        ExtractorKind::Not,
        ExtractorKind::RefObject,
        ExtractorKind::RefTrait,
        ExtractorKind::AnyOfObject,
        ExtractorKind::OneOfObject,
        ExtractorKind::AllOfObject,
        ExtractorKind::CompoundTrait,
        ExtractorKind::NamedEnum,
        ExtractorKind::AnonymousEnum,
        ExtractorKind::SimpleType,
        ExtractorKind::CompoundType,
        ExtractorKind::Array,
        ExtractorKind::Object,
    ];

    /// Position in [`ExtractorKind::ALL`]; lower runs first.
    pub fn priority(self) -> usize {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or(Self::ALL.len())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtractorKind::Not => "not",
            ExtractorKind::RefObject => "ref_object",
            ExtractorKind::RefTrait => "ref_trait",
            ExtractorKind::AnyOfObject => "any_of_object",
            ExtractorKind::OneOfObject => "one_of_object",
            ExtractorKind::AllOfObject => "all_of_object",
            ExtractorKind::CompoundTrait => "compound_trait",
            ExtractorKind::NamedEnum => "named_enum",
            ExtractorKind::AnonymousEnum => "anonymous_enum",
            ExtractorKind::SimpleType => "simple_type",
            ExtractorKind::CompoundType => "compound_type",
            ExtractorKind::Array => "array",
            ExtractorKind::Object => "object",
        }
    }

    /// Whether this extractor applies to `node`. Has no side effects.
    pub fn check(self, node: &SchemaNode<'_>, classifier: &Classifier) -> Result<bool, ResolveError> {
        let fields = node.fields();
        let combinator_object = |c: Combinator| -> Result<bool, ResolveError> {
            // A fragment with its own properties is a plain object; its
            // combinators only add constraints.
            Ok(fields.properties.is_none()
                && matches!(fields.compound(), Some((found, _)) if found == c)
                && classifier.is_object(node)?)
        };

        Ok(match self {
            ExtractorKind::Not => fields.not.is_some(),
            ExtractorKind::RefObject => fields.reference.is_some() && classifier.is_object(node)?,
            ExtractorKind::RefTrait => fields.reference.is_some(),
            ExtractorKind::AnyOfObject => combinator_object(Combinator::AnyOf)?,
            ExtractorKind::OneOfObject => combinator_object(Combinator::OneOf)?,
            ExtractorKind::AllOfObject => combinator_object(Combinator::AllOf)?,
            ExtractorKind::CompoundTrait => {
                fields.properties.is_none() && fields.compound().is_some()
            }
            ExtractorKind::NamedEnum => fields.enumeration.is_some() && node.name().is_some(),
            ExtractorKind::AnonymousEnum => fields.enumeration.is_some(),
            ExtractorKind::SimpleType => {
                matches!(fields.type_decl, TypeDecl::Single(t) if Primitive::parse(t).is_some())
            }
            ExtractorKind::CompoundType => matches!(fields.type_decl, TypeDecl::Union(_)),
            ExtractorKind::Array => fields.type_decl == TypeDecl::Single("array"),
            ExtractorKind::Object => fields.type_decl.is_object(),
        })
    }

    /// Return the first extractor matching `node`.
    ///
    /// The choice is memoized on the node, so repeated dispatch is cheap
    /// and always agrees with the first result.
    ///
    /// # Errors
    ///
    /// Returns `NoMatchingExtractor` when no rule applies, plus any
    /// classification error.
    pub fn dispatch(node: &SchemaNode<'_>, classifier: &Classifier) -> Result<Self, ResolveError> {
        if let Some(kind) = node.extractor_cell().get() {
            return Ok(*kind);
        }
        for kind in Self::ALL {
            if kind.check(node, classifier)? {
                debug!(pointer = node.pointer(), extractor = kind.as_str(), "dispatched");
                return Ok(*node.extractor_cell().get_or_init(|| kind));
            }
        }
        Err(ResolveError::NoMatchingExtractor {
            pointer: node.pointer().to_string(),
            keys: node.keys(),
        })
    }

    /// Build the inline trait for a use of `node`, e.g. as a property.
    pub fn build_trait<'a>(
        self,
        node: &SchemaNode<'a>,
        required: bool,
        description: Option<String>,
        run: &mut Resolution<'a>,
    ) -> Result<TraitDescriptor, ResolveError> {
        let fields = node.fields();
        let descriptor = match self {
            ExtractorKind::Not => {
                let inner = match fields.not {
                    Some(not) => node.make_child(not, "not", None, Metadata::default())?,
                    None => return Err(self.mismatch(node)),
                };
                TraitDescriptor::new(TraitKind::Not {
                    inner: Box::new(run.trait_for(&inner)?),
                })
            }
            ExtractorKind::RefObject => TraitDescriptor::new(TraitKind::Instance {
                target: self.reference_target(node, run)?,
            }),
            ExtractorKind::RefTrait => {
                let Some(reference) = fields.reference else {
                    return Err(self.mismatch(node));
                };
                // The target's trait is inlined under the target's name.
                let inlined = run.follow(reference, |run, target| {
                    let kind = run.dispatch(&target)?;
                    let described = description.clone().or_else(|| run.describe(&target));
                    let name = run.classname(&target)?;
                    Ok(kind.build_trait(&target, required, described, run)?.named(name))
                })?;
                return Ok(inlined);
            }
            ExtractorKind::AnyOfObject
            | ExtractorKind::OneOfObject
            | ExtractorKind::CompoundTrait => self.compound(node, run)?,
            ExtractorKind::AllOfObject => TraitDescriptor::new(TraitKind::Instance {
                target: run.require_type(node.clone())?,
            }),
            ExtractorKind::NamedEnum => TraitDescriptor::new(TraitKind::Enum {
                values: fields.enumeration.unwrap_or_default().to_vec(),
            })
            .named(run.classname(node)?),
            ExtractorKind::AnonymousEnum => TraitDescriptor::new(TraitKind::Enum {
                values: fields.enumeration.unwrap_or_default().to_vec(),
            }),
            ExtractorKind::SimpleType => match &fields.type_decl {
                TypeDecl::Single(t) => primitive_trait(node, t)?,
                TypeDecl::Union(_) => return Err(self.mismatch(node)),
            },
            ExtractorKind::CompoundType => {
                let TypeDecl::Union(names) = &fields.type_decl else {
                    return Err(self.mismatch(node));
                };
                let members = names
                    .iter()
                    .map(|name| member_trait(node, name, run))
                    .collect::<Result<Vec<_>, _>>()?;
                TraitDescriptor::new(TraitKind::Union { members })
            }
            ExtractorKind::Array => TraitDescriptor::new(TraitKind::Array {
                items: array_items(node, run)?,
            }),
            ExtractorKind::Object => object_trait(node, run)?,
        };
        Ok(descriptor
            .with_options(required, description)
            .with_default(fields.default))
    }

    /// Build the descriptor of `node` as a named type.
    ///
    /// Object rules produce field lists (or aliases of other object types);
    /// every other rule yields its trait under the node's classname.
    pub fn build_object<'a>(
        self,
        node: &SchemaNode<'a>,
        run: &mut Resolution<'a>,
    ) -> Result<TraitDescriptor, ResolveError> {
        let classname = run.classname(node)?;
        let description = node
            .fields()
            .description
            .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "));

        let descriptor = match self {
            ExtractorKind::RefObject => TraitDescriptor::new(TraitKind::Instance {
                target: self.reference_target(node, run)?,
            }),
            ExtractorKind::AnyOfObject | ExtractorKind::OneOfObject => self.compound(node, run)?,
            ExtractorKind::AllOfObject => {
                let mut fields = Vec::new();
                merge_fields(node, run, &mut fields)?;
                TraitDescriptor::new(TraitKind::Object {
                    fields,
                    additional_properties: additional_policy(node, run)?,
                })
            }
            // A `type` list naming "object" emits its object member here;
            // uses of the node keep the full union.
            ExtractorKind::Object | ExtractorKind::CompoundType
                if node.fields().properties.is_some() =>
            {
                let mut fields = Vec::new();
                for (name, child) in node.properties()? {
                    fields.push(FieldDescriptor {
                        name: name.to_string(),
                        descriptor: run.trait_for(&child)?,
                    });
                }
                TraitDescriptor::new(TraitKind::Object {
                    fields,
                    additional_properties: additional_policy(node, run)?,
                })
            }
            _ => self.build_trait(node, false, None, run)?,
        };

        Ok(TraitDescriptor {
            description,
            ..descriptor.named(classname).with_imports()
        })
    }

    fn compound<'a>(
        self,
        node: &SchemaNode<'a>,
        run: &mut Resolution<'a>,
    ) -> Result<TraitDescriptor, ResolveError> {
        let Some((combinator, _)) = node.fields().compound() else {
            return Err(self.mismatch(node));
        };
        let branches = node
            .branches()?
            .iter()
            .map(|branch| run.trait_for(branch))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TraitDescriptor::new(TraitKind::Compound {
            combinator,
            branches,
        }))
    }

    /// Classname of the object a `$ref` points at, queueing it as a named type.
    fn reference_target<'a>(
        self,
        node: &SchemaNode<'a>,
        run: &mut Resolution<'a>,
    ) -> Result<String, ResolveError> {
        let Some(reference) = node.fields().reference else {
            return Err(self.mismatch(node));
        };
        // Only the name is needed here, so the target is not marked in
        // progress; an object may refer to itself while its fields build.
        let target = resolve_reference(reference, run.root().context())?;
        run.require_type(target)
    }

    fn mismatch(self, node: &SchemaNode<'_>) -> ResolveError {
        ResolveError::invalid_input(
            node.pointer(),
            format!("extractor '{}' does not apply", self.as_str()),
        )
    }
}

fn primitive_trait(node: &SchemaNode<'_>, name: &str) -> Result<TraitDescriptor, ResolveError> {
    let primitive = Primitive::parse(name).ok_or_else(|| {
        ResolveError::invalid_input(node.pointer(), format!("unrecognized type identifier: {}", name))
    })?;
    Ok(TraitDescriptor::new(TraitKind::Primitive { primitive }))
}

/// One member of a `type` list, using the node's other keywords where
/// the member needs them.
fn member_trait<'a>(
    node: &SchemaNode<'a>,
    name: &str,
    run: &mut Resolution<'a>,
) -> Result<TraitDescriptor, ResolveError> {
    match name {
        "array" => Ok(TraitDescriptor::new(TraitKind::Array {
            items: array_items(node, run)?,
        })),
        "object" => object_trait(node, run),
        other => primitive_trait(node, other),
    }
}

fn object_trait<'a>(
    node: &SchemaNode<'a>,
    run: &mut Resolution<'a>,
) -> Result<TraitDescriptor, ResolveError> {
    if node.fields().properties.is_some() {
        return Ok(TraitDescriptor::new(TraitKind::Instance {
            target: run.require_type(node.clone())?,
        }));
    }
    Ok(TraitDescriptor::new(TraitKind::Map {
        values: additional_policy(node, run)?,
    }))
}

fn array_items<'a>(
    node: &SchemaNode<'a>,
    run: &mut Resolution<'a>,
) -> Result<ArrayItems, ResolveError> {
    match node.fields().items {
        None => Ok(ArrayItems::Any),
        Some(Value::Array(list)) => {
            let mut traits = Vec::with_capacity(list.len());
            for (i, item) in list.iter().enumerate() {
                let child = node.make_indexed_child(item, "items", i)?;
                traits.push(run.trait_for(&child)?);
            }
            Ok(ArrayItems::Tuple(traits))
        }
        Some(items) => {
            let child = node.make_child(items, "items", None, Metadata::default())?;
            Ok(ArrayItems::Uniform(Box::new(run.trait_for(&child)?)))
        }
    }
}

fn additional_policy<'a>(
    node: &SchemaNode<'a>,
    run: &mut Resolution<'a>,
) -> Result<AdditionalProperties, ResolveError> {
    match node.fields().additional_properties {
        AdditionalDecl::Allowed(allowed) => Ok(AdditionalProperties::Allowed(allowed)),
        AdditionalDecl::Schema(schema) => {
            let child = node.make_child(schema, "additionalProperties", None, Metadata::default())?;
            Ok(AdditionalProperties::Trait(Box::new(run.trait_for(&child)?)))
        }
    }
}

/// Collect the fields of every object reachable through `allOf` and `$ref`
/// from `node`. Later fields replace earlier ones of the same name; a field
/// stays required if any contributor requires it.
fn merge_fields<'a>(
    node: &SchemaNode<'a>,
    run: &mut Resolution<'a>,
    out: &mut Vec<FieldDescriptor>,
) -> Result<(), ResolveError> {
    if let Some(reference) = node.fields().reference {
        return run.follow(reference, |run, target| merge_fields(&target, run, out));
    }
    if node.fields().properties.is_some() {
        for (name, child) in node.properties()? {
            let descriptor = run.trait_for(&child)?;
            match out.iter_mut().find(|f| f.name == name) {
                Some(existing) => {
                    let required = existing.required() || descriptor.required;
                    existing.descriptor = TraitDescriptor {
                        required,
                        ..descriptor
                    };
                }
                None => out.push(FieldDescriptor {
                    name: name.to_string(),
                    descriptor,
                }),
            }
        }
        return Ok(());
    }
    if let Some((Combinator::AllOf, _)) = node.fields().compound() {
        for branch in node.branches()? {
            merge_fields(&branch, run, out)?;
        }
    }
    Ok(())
}
