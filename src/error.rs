//! Error types for schema loading and trait resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or resolving a schema document.
///
/// Resolution is deterministic: retrying the same input yields the same
/// error, so callers should fix the schema (or the extractor set) instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    // Schema errors (exit code 2)
    #[error("invalid schema at {pointer}: {message}")]
    InvalidSchemaInput { pointer: String, message: String },

    #[error("unrecognized $ref format '{reference}': must start with '#'")]
    InvalidReferenceFormat { reference: String },

    #[error("$ref '{reference}' not present in the schema")]
    UnresolvedReference { reference: String },

    #[error("cyclic $ref '{reference}' (in progress: {})", chain.join(" -> "))]
    CyclicReference {
        reference: String,
        chain: Vec<String>,
    },

    #[error("no extractor matches schema at {pointer} with keys ({})", keys.join(", "))]
    NoMatchingExtractor { pointer: String, keys: Vec<String> },

    #[error("cannot name anonymous schema at {pointer} with keys ({})", keys.join(", "))]
    UnsupportedAnonymousNaming { pointer: String, keys: Vec<String> },

    #[error("classname '{name}' names both {first} and {second}")]
    ClassnameConflict {
        name: String,
        first: String,
        second: String,
    },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            _ => 2,
        }
    }

    pub(crate) fn invalid_input(pointer: &str, message: impl Into<String>) -> Self {
        ResolveError::InvalidSchemaInput {
            pointer: pointer.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_exit_codes() {
        let err = ResolveError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ResolveError::UnresolvedReference {
            reference: "#/definitions/Missing".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ResolveError::NoMatchingExtractor {
            pointer: "#/properties/x".into(),
            keys: vec!["type".into()],
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cyclic_reference_display_lists_chain() {
        let err = ResolveError::CyclicReference {
            reference: "#/definitions/Foo".into(),
            chain: vec!["#/definitions/Foo".into(), "#/definitions/Bar".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic $ref '#/definitions/Foo' (in progress: #/definitions/Foo -> #/definitions/Bar)"
        );
    }

    #[test]
    fn anonymous_naming_display_lists_keys() {
        let err = ResolveError::UnsupportedAnonymousNaming {
            pointer: "#/properties/tags".into(),
            keys: vec!["type".into(), "items".into()],
        };
        assert_eq!(
            err.to_string(),
            "cannot name anonymous schema at #/properties/tags with keys (type, items)"
        );
    }

    #[test]
    fn classname_conflict_display_names_both_pointers() {
        let err = ResolveError::ClassnameConflict {
            name: "Point".into(),
            first: "#/definitions/Point".into(),
            second: "#/properties/point".into(),
        };
        assert_eq!(
            err.to_string(),
            "classname 'Point' names both #/definitions/Point and #/properties/point"
        );
        assert_eq!(err.exit_code(), 2);
    }
}
