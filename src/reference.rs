//! Internal `$ref` resolution against a document context.

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ResolveError;
use crate::node::SchemaNode;

/// Resolve an internal pointer (e.g. `#/definitions/Foo`) against `context`.
///
/// `#` and `#/` resolve to the context root. Any other pointer is walked
/// segment by segment through the context mapping; the returned node is
/// named after the final segment. JSON Pointer escapes (`~1` for `/`,
/// `~0` for `~`) are honoured.
///
/// # Errors
///
/// Returns `InvalidReferenceFormat` if the pointer does not start with `#`,
/// and `UnresolvedReference` if any segment is missing.
pub fn resolve_reference<'a>(
    pointer: &str,
    context: &'a Map<String, Value>,
) -> Result<SchemaNode<'a>, ResolveError> {
    let Some(path) = pointer.strip_prefix('#') else {
        return Err(ResolveError::InvalidReferenceFormat {
            reference: pointer.to_string(),
        });
    };
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return SchemaNode::from_context(context);
    }

    let unresolved = || ResolveError::UnresolvedReference {
        reference: pointer.to_string(),
    };

    let mut segments = path.split('/').map(|part| part.replace("~1", "/").replace("~0", "~"));
    let mut name = segments.next().unwrap_or_default();
    let mut parent = context;
    let mut current = context.get(&name).ok_or_else(unresolved)?;
    for key in segments {
        let next = match current {
            Value::Object(map) => {
                parent = map;
                map.get(&key)
            }
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        current = next.ok_or_else(unresolved)?;
        name = key;
    }

    SchemaNode::bound(current, context, Some(parent), Some(name), format!("#/{}", path))
}

/// Append an escaped segment to a JSON pointer.
pub(crate) fn join_pointer(base: &str, segment: &str) -> String {
    format!("{}/{}", base, segment.replace('~', "~0").replace('/', "~1"))
}

/// The chain of pointers currently being followed.
///
/// Following a pointer that is already in the chain is a cycle: it fails
/// with `CyclicReference` instead of recursing without bound.
#[derive(Debug, Clone, Default)]
pub struct ReferenceChain {
    pointers: Vec<String>,
}

impl ReferenceChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pointers currently in progress.
    pub fn depth(&self) -> usize {
        self.pointers.len()
    }

    /// Whether `pointer` (in `#/...` form) is currently being followed.
    pub fn contains(&self, pointer: &str) -> bool {
        self.pointers.iter().any(|p| p == pointer)
    }

    /// Mark the resolved `target` of `reference` as in progress.
    ///
    /// # Errors
    ///
    /// Returns `CyclicReference` if the target is already in progress.
    pub fn enter(&mut self, reference: &str, target: &SchemaNode<'_>) -> Result<(), ResolveError> {
        if self.contains(target.pointer()) {
            return Err(ResolveError::CyclicReference {
                reference: reference.to_string(),
                chain: self.pointers.clone(),
            });
        }
        trace!(reference, depth = self.depth(), "following $ref");
        self.pointers.push(target.pointer().to_string());
        Ok(())
    }

    /// Leave the most recently entered reference.
    pub fn exit(&mut self) {
        self.pointers.pop();
    }

    /// Resolve `pointer` and run `f` on the target while the pointer is
    /// marked in progress.
    ///
    /// # Errors
    ///
    /// Returns `CyclicReference` if `pointer` is already in progress, any
    /// error from [`resolve_reference`], or the error returned by `f`.
    pub fn follow<'a, T>(
        &mut self,
        pointer: &str,
        context: &'a Map<String, Value>,
        f: impl FnOnce(&mut Self, SchemaNode<'a>) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let target = resolve_reference(pointer, context)?;
        self.enter(pointer, &target)?;
        let result = f(self, target);
        self.exit();
        result
    }

    /// Follow `$ref` links from `node` until reaching a fragment that is
    /// not itself a reference.
    ///
    /// # Errors
    ///
    /// Returns `CyclicReference` if the links loop back on themselves.
    pub fn dereference<'a>(&mut self, node: &SchemaNode<'a>) -> Result<SchemaNode<'a>, ResolveError> {
        match node.fields().reference {
            None => Ok(node.clone()),
            Some(pointer) => self.follow(pointer, node.context(), |chain, target| {
                chain.dereference(&target)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "definitions": {
                "Foo": {"type": "object", "properties": {"a": {"type": "string"}}},
                "Loop": {"$ref": "#/definitions/Loop"},
                "Alias": {"$ref": "#/definitions/Foo"}
            },
            "items": [{"type": "string"}]
        })
    }

    #[test]
    fn resolves_definition() {
        let doc = document();
        let context = doc.as_object().unwrap();
        let node = resolve_reference("#/definitions/Foo", context).unwrap();
        assert_eq!(node.name(), Some("Foo"));
        assert_eq!(node.pointer(), "#/definitions/Foo");
        assert_eq!(Some(node.schema()), doc["definitions"]["Foo"].as_object());
        assert!(std::ptr::eq(node.parent().unwrap(), doc["definitions"].as_object().unwrap()));
    }

    #[test]
    fn empty_path_is_root() {
        let doc = document();
        let context = doc.as_object().unwrap();
        assert!(resolve_reference("#", context).unwrap().is_root());
        assert!(resolve_reference("#/", context).unwrap().is_root());
    }

    #[test]
    fn walks_array_indices() {
        let doc = document();
        let node = resolve_reference("#/items/0", doc.as_object().unwrap()).unwrap();
        assert_eq!(node.schema()["type"], "string");
        assert_eq!(node.name(), Some("0"));
    }

    #[test]
    fn rejects_external_pointer() {
        let doc = document();
        let result = resolve_reference("definitions/Foo", doc.as_object().unwrap());
        assert!(matches!(result, Err(ResolveError::InvalidReferenceFormat { .. })));
    }

    #[test]
    fn missing_segment_is_unresolved() {
        let doc = document();
        let context = doc.as_object().unwrap();
        for pointer in ["#/definitions/Bar", "#/definitions/Foo/type/x", "#/items/3"] {
            let result = resolve_reference(pointer, context);
            assert!(
                matches!(result, Err(ResolveError::UnresolvedReference { .. })),
                "{} should be unresolved",
                pointer
            );
        }
    }

    #[test]
    fn dereference_follows_aliases() {
        let doc = document();
        let context = doc.as_object().unwrap();
        let alias = resolve_reference("#/definitions/Alias", context).unwrap();
        let mut chain = ReferenceChain::new();
        let target = chain.dereference(&alias).unwrap();
        assert_eq!(target.pointer(), "#/definitions/Foo");
        assert_eq!(chain.depth(), 0);
    }

    #[test]
    fn self_reference_is_cyclic() {
        let doc = document();
        let context = doc.as_object().unwrap();
        let node = resolve_reference("#/definitions/Loop", context).unwrap();
        let result = ReferenceChain::new().dereference(&node);
        assert!(matches!(
            result,
            Err(ResolveError::CyclicReference { reference, chain })
                if reference == "#/definitions/Loop" && chain == vec!["#/definitions/Loop"]
        ));
    }

    #[test]
    fn chain_is_unwound_after_error() {
        let doc = document();
        let context = doc.as_object().unwrap();
        let mut chain = ReferenceChain::new();
        let result: Result<(), _> = chain.follow("#/definitions/Foo", context, |chain, _| {
            assert!(chain.contains("#/definitions/Foo"));
            Err(ResolveError::UnresolvedReference {
                reference: "#/elsewhere".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(chain.depth(), 0);
    }

    #[test]
    fn join_pointer_escapes() {
        assert_eq!(join_pointer("#/definitions", "a/b~c"), "#/definitions/a~1b~0c");
    }
}
