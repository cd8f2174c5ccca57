//! Schema resolution - turns a document into its set of named types.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::Classifier;
use crate::descriptor::{shorten_description, TraitDescriptor};
use crate::error::ResolveError;
use crate::extract::ExtractorKind;
use crate::hash::schema_hash;
use crate::naming::{self, AnonymousTypeRegistry};
use crate::node::SchemaNode;
use crate::reference::{resolve_reference, ReferenceChain};
use crate::types::ResolveOptions;

/// Resolve `document` into its named types.
///
/// The result covers the root, every definition under the configured
/// definition tags, and every object type reached from them (through
/// `$ref` or as an anonymous nested object). Types are ordered by
/// extractor priority, then name.
///
/// # Errors
///
/// Returns `ResolveError` if the document is not a mapping, a reference is
/// malformed, missing or cyclic, or a fragment cannot be classified or
/// named.
pub fn resolve_schema(
    document: &Value,
    options: &ResolveOptions,
) -> Result<ResolvedSchema, ResolveError> {
    Resolution::new(document, options)?.resolve()
}

/// One named type of a resolved document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedType {
    pub name: String,
    /// The extractor that produced this type.
    pub extractor: ExtractorKind,
    pub descriptor: TraitDescriptor,
}

/// The named types of a document, in deterministic order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSchema {
    pub types: Vec<NamedType>,
}

impl ResolvedSchema {
    /// Look up a type by classname.
    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.name.as_str()).collect()
    }

    /// Dependency edges `(from, to)` between named types.
    pub fn dependencies(&self) -> Vec<(&str, &str)> {
        self.types
            .iter()
            .flat_map(|t| {
                t.descriptor
                    .imports
                    .iter()
                    .map(move |import| (t.name.as_str(), import.as_str()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedType> {
        self.types.iter()
    }
}

/// State of a single resolution run.
///
/// Owns everything that must not outlive the run: the anonymous name
/// registry, the chain of references being followed, and the worklist of
/// named types still to build.
#[derive(Debug)]
pub struct Resolution<'a> {
    root: SchemaNode<'a>,
    options: ResolveOptions,
    classifier: Classifier,
    anonymous: AnonymousTypeRegistry,
    references: ReferenceChain,
    queue: VecDeque<(String, SchemaNode<'a>)>,
    claimed: HashMap<String, Claim>,
}

/// The node that owns a classname.
#[derive(Debug)]
struct Claim {
    pointer: String,
    hash: String,
}

impl<'a> Resolution<'a> {
    /// Start a run over `document`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchemaInput` if the document is not a mapping.
    pub fn new(document: &'a Value, options: &ResolveOptions) -> Result<Self, ResolveError> {
        Ok(Self {
            root: SchemaNode::root(document)?,
            options: options.clone(),
            classifier: Classifier::new(options.compound_policy),
            anonymous: AnonymousTypeRegistry::new(),
            references: ReferenceChain::new(),
            queue: VecDeque::new(),
            claimed: HashMap::new(),
        })
    }

    pub fn root(&self) -> &SchemaNode<'a> {
        &self.root
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn anonymous_types(&self) -> &AnonymousTypeRegistry {
        &self.anonymous
    }

    /// Classname of `node` within this run.
    pub fn classname(&mut self, node: &SchemaNode<'a>) -> Result<String, ResolveError> {
        naming::classname(
            node,
            &self.options.root_name,
            &self.classifier,
            &mut self.anonymous,
        )
    }

    pub fn dispatch(&self, node: &SchemaNode<'a>) -> Result<ExtractorKind, ResolveError> {
        ExtractorKind::dispatch(node, &self.classifier)
    }

    /// Description of `node` shortened for trait documentation.
    pub fn describe(&self, node: &SchemaNode<'a>) -> Option<String> {
        node.fields()
            .description
            .map(|d| shorten_description(d, self.options.description_width))
    }

    /// Build the inline trait for `node`, carrying its `required` flag and
    /// shortened description.
    pub fn trait_for(&mut self, node: &SchemaNode<'a>) -> Result<TraitDescriptor, ResolveError> {
        let kind = self.dispatch(node)?;
        let description = self.describe(node);
        kind.build_trait(node, node.metadata().required, description, self)
    }

    /// Make sure `node` is emitted as a named type and return its classname.
    ///
    /// A classname already owned by another fragment is reused only when
    /// both fragments have the same content.
    ///
    /// # Errors
    ///
    /// Returns `ClassnameConflict` when the name belongs to a different
    /// fragment.
    pub(crate) fn require_type(&mut self, node: SchemaNode<'a>) -> Result<String, ResolveError> {
        let name = self.classname(&node)?;
        let hash = schema_hash(node.schema());
        if let Some(claim) = self.claimed.get(&name) {
            if claim.pointer != node.pointer() && claim.hash != hash {
                return Err(ResolveError::ClassnameConflict {
                    name,
                    first: claim.pointer.clone(),
                    second: node.pointer().to_string(),
                });
            }
            return Ok(name);
        }
        debug!(name = %name, pointer = node.pointer(), "queued named type");
        self.claimed.insert(
            name.clone(),
            Claim {
                pointer: node.pointer().to_string(),
                hash,
            },
        );
        self.queue.push_back((name.clone(), node));
        Ok(name)
    }

    /// Queue the root or a definition, reserving its classname so no
    /// anonymous type is minted under it. A definition whose name is
    /// already taken is skipped.
    fn seed(&mut self, node: SchemaNode<'a>) -> Result<(), ResolveError> {
        let name = self.classname(&node)?;
        if let Some(claim) = self.claimed.get(&name) {
            if claim.pointer != node.pointer() {
                warn!(
                    name = %name,
                    kept = %claim.pointer,
                    skipped = node.pointer(),
                    "duplicate classname"
                );
            }
            return Ok(());
        }
        self.anonymous.reserve(name);
        self.require_type(node)?;
        Ok(())
    }

    /// Resolve `reference` and run `f` on its target while the reference is
    /// in progress.
    ///
    /// # Errors
    ///
    /// Returns `CyclicReference` if the target is already being followed.
    pub(crate) fn follow<T>(
        &mut self,
        reference: &str,
        f: impl FnOnce(&mut Self, SchemaNode<'a>) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let target = resolve_reference(reference, self.root.context())?;
        self.references.enter(reference, &target)?;
        let result = f(self, target);
        self.references.exit();
        result
    }

    /// Run to completion.
    pub fn resolve(mut self) -> Result<ResolvedSchema, ResolveError> {
        self.seed(self.root.clone())?;
        for definition in self.root.definitions(&self.options.definition_tags)? {
            self.seed(definition)?;
        }

        let mut types = Vec::new();
        while let Some((name, node)) = self.queue.pop_front() {
            let extractor = self.dispatch(&node)?;
            let descriptor = extractor.build_object(&node, &mut self)?;
            types.push(NamedType {
                name,
                extractor,
                descriptor,
            });
        }

        types.sort_by(|a, b| {
            a.extractor
                .priority()
                .cmp(&b.extractor.priority())
                .then_with(|| a.name.cmp(&b.name))
        });
        debug!(
            types = types.len(),
            anonymous = self.anonymous.len(),
            "resolution complete"
        );
        Ok(ResolvedSchema { types })
    }
}
