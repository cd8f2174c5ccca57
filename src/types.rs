//! Core types for schema trait resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classname given to the root of a document unless configured otherwise.
pub const DEFAULT_ROOT_NAME: &str = "RootInstance";

/// Default width of shortened field descriptions.
pub const DEFAULT_DESCRIPTION_WIDTH: usize = 70;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Schema combinator keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Combinator {
    AnyOf,
    OneOf,
    AllOf,
}

impl Combinator {
    /// All combinators, in the order they are consulted.
    pub const ALL: [Combinator; 3] = [Combinator::AnyOf, Combinator::OneOf, Combinator::AllOf];

    /// Returns the schema keyword for this combinator.
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::AnyOf => "anyOf",
            Combinator::OneOf => "oneOf",
            Combinator::AllOf => "allOf",
        }
    }
}

/// How `anyOf`/`oneOf`/`allOf` fragments are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundPolicy {
    /// Object iff ALL branches are objects; trait iff ANY branch is a trait.
    ///
    /// A fragment mixing objects and traits can be both. Dispatch priority
    /// still picks exactly one extractor.
    #[default]
    Inherited,
    /// Object iff all branches are objects; trait otherwise.
    Exclusive,
}

/// Options for a resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Top-level keys holding dictionaries of named types.
    pub definition_tags: Vec<String>,
    /// Classname of the document root.
    pub root_name: String,
    /// Classification of combinator fragments.
    pub compound_policy: CompoundPolicy,
    /// Maximum length of descriptions attached to traits.
    pub description_width: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            definition_tags: vec!["definitions".to_string()],
            root_name: DEFAULT_ROOT_NAME.to_string(),
            compound_policy: CompoundPolicy::default(),
            description_width: DEFAULT_DESCRIPTION_WIDTH,
        }
    }
}

impl ResolveOptions {
    /// Create options with the defaults: `definitions` as the only
    /// definition tag, `RootInstance` as root name, inherited compound policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the definition tags.
    pub fn definition_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the root classname.
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Set the compound classification policy.
    pub fn compound_policy(mut self, policy: CompoundPolicy) -> Self {
        self.compound_policy = policy;
        self
    }

    /// Set the description width.
    pub fn description_width(mut self, width: usize) -> Self {
        self.description_width = width;
        self
    }
}
