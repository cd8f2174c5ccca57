//! Schema loading from files, strings and standard input.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ResolveError;

/// Source name that reads the schema from standard input.
pub const STDIN_SOURCE: &str = "-";

/// Load a schema from a file path.
///
/// Object keys keep their document order, so property order in the
/// resolved types follows the file.
///
/// # Errors
///
/// Returns `FileNotFound` when nothing exists at `path`, `ReadError` when
/// it cannot be opened or read (a directory, missing permissions), and
/// `InvalidJson` when the content does not parse.
pub fn load_schema(path: &Path) -> Result<Value, ResolveError> {
    match File::open(path) {
        Ok(file) => load_schema_reader(BufReader::new(file), &path.to_string_lossy()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ResolveError::ReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `ResolveError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, ResolveError> {
    serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })
}

/// Load a schema from any reader.
///
/// `name` is only used in error messages.
pub fn load_schema_reader(mut reader: impl Read, name: &str) -> Result<Value, ResolveError> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|source| ResolveError::ReadError {
            path: PathBuf::from(name),
            source,
        })?;
    load_schema_str(&content)
}

/// Load a schema from a file path, or from standard input when `source`
/// is `-`.
pub fn load_schema_auto(source: &str) -> Result<Value, ResolveError> {
    if source == STDIN_SOURCE {
        load_schema_reader(std::io::stdin().lock(), "<stdin>")
    } else {
        load_schema(Path::new(source))
    }
}
