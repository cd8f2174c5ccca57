//! Schema Traits
//!
//! Resolution of JSON Schema (draft-04) documents into named type
//! definitions for code generators.
//!
//! A document is walked from its root and its definitions. Every fragment
//! is classified as an object type, a trait (a field-level type such as a
//! primitive, enum or union) or a reference, and handed to the first
//! matching extractor. The result is a deterministic list of named types,
//! each carrying a [`TraitDescriptor`] that a renderer can turn into source
//! text.
//!
//! # Example
//!
//! ```
//! use schema_traits::{resolve_schema, ResolveOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "definitions": {
//!         "Point": {
//!             "type": "object",
//!             "properties": {
//!                 "x": {"type": "number"},
//!                 "y": {"type": "number"}
//!             }
//!         }
//!     },
//!     "type": "object",
//!     "properties": {
//!         "p": {"$ref": "#/definitions/Point"}
//!     }
//! });
//!
//! let resolved = resolve_schema(&schema, &ResolveOptions::default()).unwrap();
//! assert_eq!(resolved.names(), vec!["Point", "RootInstance"]);
//!
//! let root = resolved.get("RootInstance").unwrap();
//! assert_eq!(root.descriptor.field("p").unwrap().type_name(), "Point");
//! assert_eq!(resolved.dependencies(), vec![("RootInstance", "Point")]);
//! ```
//!
//! # Naming
//!
//! | Fragment | Classname |
//! |----------|-----------|
//! | Definition `line-item` | `LineItem` |
//! | Document root | `RootInstance` (configurable) |
//! | `{"$ref": "#/definitions/Point"}` | `Point` |
//! | Unnamed object with `properties` | `AnonymousType<k>`, shared by identical fragments |
//!
//! Unnamed fragments that are neither objects nor references have no
//! classname; asking for one is an error.

mod classify;
mod descriptor;
mod error;
mod extract;
mod hash;
mod loader;
mod naming;
mod node;
mod reference;
mod resolver;
mod types;

pub use classify::{Classification, Classifier};
pub use descriptor::{
    shorten_description, AdditionalProperties, ArrayItems, BaseType, FieldDescriptor, Primitive,
    TraitDescriptor, TraitKind,
};
pub use error::ResolveError;
pub use extract::ExtractorKind;
pub use hash::schema_hash;
pub use loader::{load_schema, load_schema_auto, load_schema_reader, load_schema_str, STDIN_SOURCE};
pub use naming::{classname, regularize_name, AnonymousTypeRegistry};
pub use node::{AdditionalDecl, Metadata, SchemaFields, SchemaNode, TypeDecl};
pub use reference::{resolve_reference, ReferenceChain};
pub use resolver::{resolve_schema, NamedType, Resolution, ResolvedSchema};
pub use types::{
    json_type_name, Combinator, CompoundPolicy, ResolveOptions, DEFAULT_DESCRIPTION_WIDTH,
    DEFAULT_ROOT_NAME,
};
