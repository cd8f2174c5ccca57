//! Classification of fragments as object types, traits, or references.

use serde::Serialize;

use crate::error::ResolveError;
use crate::node::SchemaNode;
use crate::reference::ReferenceChain;
use crate::types::CompoundPolicy;

/// The three classification predicates evaluated for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub is_object: bool,
    pub is_trait: bool,
    pub is_reference: bool,
}

/// Decides whether fragments denote object types or traits.
///
/// Both predicates are pure: each top-level call follows `$ref` links with
/// its own [`ReferenceChain`], so a reference loop is reported as
/// `CyclicReference` rather than overflowing the stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    policy: CompoundPolicy,
}

impl Classifier {
    pub fn new(policy: CompoundPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CompoundPolicy {
        self.policy
    }

    /// Whether `node` denotes an object type.
    ///
    /// A fragment with `properties` is an object; a `$ref` delegates to its
    /// target; a combinator is an object when all of its branches are.
    pub fn is_object(&self, node: &SchemaNode<'_>) -> Result<bool, ResolveError> {
        self.object_in(node, &mut ReferenceChain::new())
    }

    /// Whether `node` denotes a trait.
    ///
    /// A `$ref` delegates to its target. Under [`CompoundPolicy::Inherited`]
    /// a combinator is a trait when any branch is; under
    /// [`CompoundPolicy::Exclusive`] when it is not an object. Otherwise a
    /// fragment declaring `enum`, or a `type` other than `"object"`, is a
    /// trait.
    pub fn is_trait(&self, node: &SchemaNode<'_>) -> Result<bool, ResolveError> {
        self.trait_in(node, &mut ReferenceChain::new())
    }

    pub fn is_reference(&self, node: &SchemaNode<'_>) -> bool {
        node.is_reference()
    }

    /// Evaluate all three predicates.
    pub fn classify(&self, node: &SchemaNode<'_>) -> Result<Classification, ResolveError> {
        Ok(Classification {
            is_object: self.is_object(node)?,
            is_trait: self.is_trait(node)?,
            is_reference: self.is_reference(node),
        })
    }

    fn object_in(
        &self,
        node: &SchemaNode<'_>,
        chain: &mut ReferenceChain,
    ) -> Result<bool, ResolveError> {
        let fields = node.fields();
        if fields.properties.is_some() {
            return Ok(true);
        }
        if let Some(pointer) = fields.reference {
            return chain.follow(pointer, node.context(), |chain, target| {
                self.object_in(&target, chain)
            });
        }
        if fields.compound().is_some() {
            let branches = node.branches()?;
            if branches.is_empty() {
                return Ok(false);
            }
            for branch in &branches {
                if !self.object_in(branch, chain)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn trait_in(
        &self,
        node: &SchemaNode<'_>,
        chain: &mut ReferenceChain,
    ) -> Result<bool, ResolveError> {
        let fields = node.fields();
        if let Some(pointer) = fields.reference {
            return chain.follow(pointer, node.context(), |chain, target| {
                self.trait_in(&target, chain)
            });
        }
        if fields.compound().is_some() {
            return match self.policy {
                CompoundPolicy::Inherited => {
                    for branch in &node.branches()? {
                        if self.trait_in(branch, chain)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                CompoundPolicy::Exclusive => Ok(!self.object_in(node, chain)?),
            };
        }
        Ok(fields.enumeration.is_some() || !fields.type_decl.is_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn classify(doc: &Value) -> Classification {
        let root = SchemaNode::root(doc).unwrap();
        Classifier::default().classify(&root).unwrap()
    }

    #[test]
    fn object_with_properties() {
        let c = classify(&json!({"type": "object", "properties": {"a": {"type": "string"}}}));
        assert!(c.is_object);
        assert!(!c.is_trait);
        assert!(!c.is_reference);
    }

    #[test]
    fn primitive_is_trait() {
        let c = classify(&json!({"type": "string"}));
        assert!(c.is_trait);
        assert!(!c.is_object);
    }

    #[test]
    fn enum_is_trait() {
        let c = classify(&json!({"enum": ["a", "b"]}));
        assert!(c.is_trait);
        assert!(!c.is_object);
    }

    #[test]
    fn type_list_is_trait() {
        let c = classify(&json!({"type": ["string", "null"]}));
        assert!(c.is_trait);
    }

    #[test]
    fn bare_object_is_neither() {
        let c = classify(&json!({"type": "object"}));
        assert!(!c.is_object);
        assert!(!c.is_trait);
    }

    #[test]
    fn any_of_objects_is_object() {
        let obj = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let c = classify(&json!({"anyOf": [obj.clone(), obj]}));
        assert!(c.is_object);
        assert!(!c.is_trait);
    }

    #[test]
    fn mixed_compound_is_trait_only() {
        let c = classify(&json!({
            "oneOf": [
                {"properties": {"a": {"type": "string"}}},
                {"type": "string"}
            ]
        }));
        assert!(!c.is_object);
        assert!(c.is_trait);
    }

    #[test]
    fn inherited_policy_can_double_classify() {
        // Every branch is an object, and one branch is also a trait.
        let doc = json!({
            "allOf": [
                {"properties": {"a": {"type": "string"}}},
                {"type": "string", "properties": {"b": {"type": "string"}}}
            ]
        });
        let root = SchemaNode::root(&doc).unwrap();

        let inherited = Classifier::new(CompoundPolicy::Inherited);
        assert!(inherited.is_object(&root).unwrap());
        assert!(inherited.is_trait(&root).unwrap());

        let exclusive = Classifier::new(CompoundPolicy::Exclusive);
        assert!(exclusive.is_object(&root).unwrap());
        assert!(!exclusive.is_trait(&root).unwrap());
    }

    #[test]
    fn reference_delegates_to_target() {
        let doc = json!({
            "definitions": {
                "Point": {"type": "object", "properties": {"x": {"type": "number"}}},
                "Color": {"type": "string"}
            },
            "properties": {
                "p": {"$ref": "#/definitions/Point"},
                "c": {"$ref": "#/definitions/Color"}
            }
        });
        let root = SchemaNode::root(&doc).unwrap();
        let props = root.properties().unwrap();
        let classifier = Classifier::default();

        let p = classifier.classify(&props[0].1).unwrap();
        assert!(p.is_object && !p.is_trait && p.is_reference);

        let c = classifier.classify(&props[1].1).unwrap();
        assert!(!c.is_object && c.is_trait && c.is_reference);
    }

    #[test]
    fn reference_cycle_is_an_error() {
        let doc = json!({
            "definitions": {
                "Foo": {"$ref": "#/definitions/Bar"},
                "Bar": {"$ref": "#/definitions/Foo"}
            },
            "properties": {"f": {"$ref": "#/definitions/Foo"}}
        });
        let root = SchemaNode::root(&doc).unwrap();
        let props = root.properties().unwrap();
        let result = Classifier::default().is_object(&props[0].1);
        assert!(matches!(result, Err(ResolveError::CyclicReference { .. })));
    }

    #[test]
    fn repeated_classification_is_stable() {
        let doc = json!({"anyOf": [{"type": "string"}, {"type": "number"}]});
        let root = SchemaNode::root(&doc).unwrap();
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&root).unwrap(), classifier.classify(&root).unwrap());
    }
}
