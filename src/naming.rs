//! Type naming - explicit, root, reference-derived and anonymous names.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::classify::Classifier;
use crate::error::ResolveError;
use crate::hash::schema_hash;
use crate::node::SchemaNode;
use crate::reference::resolve_reference;

/// Turn an arbitrary name into a type identifier.
///
/// Splits on every non-alphanumeric character, upper-cases the first
/// letter of each piece and joins them (`point-2d_value` becomes
/// `Point2dValue`). Identifiers that would start with a digit get a
/// leading underscore. Returns `None` when nothing usable remains.
pub fn regularize_name(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    for word in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    Some(out)
}

/// Generated names for anonymous object fragments, keyed by content hash.
///
/// Scoped to a single resolution run: structurally identical fragments get
/// the same name within a run, and separate runs never share assignments.
/// Reserved names (those already taken by named types) are never minted.
#[derive(Debug, Clone, Default)]
pub struct AnonymousTypeRegistry {
    names: HashMap<String, String>,
    reserved: HashSet<String>,
    minted: usize,
}

impl AnonymousTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `name` out of the generated sequence.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    /// Return the name registered for `hash`, minting the next free
    /// `AnonymousType<k>` for a hash seen for the first time.
    pub fn name_for(&mut self, hash: String) -> &str {
        let Self {
            names,
            reserved,
            minted,
        } = self;
        names
            .entry(hash)
            .or_insert_with_key(|hash| {
                let name = loop {
                    *minted += 1;
                    let candidate = format!("AnonymousType{}", minted);
                    if !reserved.contains(&candidate) {
                        break candidate;
                    }
                };
                debug!(hash = hash.get(..12).unwrap_or(hash.as_str()), name = %name, "minted anonymous type name");
                name
            })
            .as_str()
    }

    /// The name already registered for `hash`, if any.
    pub fn get(&self, hash: &str) -> Option<&str> {
        self.names.get(hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Compute the classname of `node`.
///
/// In order: an explicit name is regularized; the root gets `root_name`;
/// a reference takes the classname of its target; an anonymous object is
/// named through `registry` by content hash.
///
/// # Errors
///
/// Returns `UnsupportedAnonymousNaming` for anonymous fragments that are
/// neither objects nor references, `InvalidSchemaInput` when an explicit
/// name has no usable characters, and reference errors from the target
/// lookup.
pub fn classname(
    node: &SchemaNode<'_>,
    root_name: &str,
    classifier: &Classifier,
    registry: &mut AnonymousTypeRegistry,
) -> Result<String, ResolveError> {
    if let Some(name) = node.name() {
        return regularize_name(name).ok_or_else(|| {
            ResolveError::invalid_input(
                node.pointer(),
                format!("cannot derive a type name from '{}'", name),
            )
        });
    }
    if node.is_root() {
        return Ok(root_name.to_string());
    }
    if let Some(pointer) = node.fields().reference {
        // Targets are named after their last segment (or are the root),
        // so this recursion is one level deep.
        let target = resolve_reference(pointer, node.context())?;
        return classname(&target, root_name, classifier, registry);
    }
    if classifier.is_object(node)? {
        return Ok(registry.name_for(schema_hash(node.schema())).to_string());
    }
    Err(ResolveError::UnsupportedAnonymousNaming {
        pointer: node.pointer().to_string(),
        keys: node.keys(),
    })
}
