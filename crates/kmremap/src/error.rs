//! Error types for reading and rewriting metadata

use crate::header::HeaderError;
use crate::wire::DecodeError;
use thiserror::Error;

/// Failure to turn an annotation into a metadata tree
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The annotation elements had the wrong shape
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// The payload could not be decoded
    #[error("Malformed metadata payload: {0}")]
    Decode(#[from] DecodeError),
}

/// A class whose metadata could not be rewritten
#[derive(Debug, Error)]
#[error("Failed to remap Kotlin metadata of class {class_name}")]
pub struct RemapError {
    /// Internal name of the class being processed
    pub class_name: String,
    /// What went wrong
    #[source]
    pub source: MetadataError,
}

impl RemapError {
    /// Attach a class name to an error
    pub fn new(class_name: impl Into<String>, source: impl Into<MetadataError>) -> Self {
        Self {
            class_name: class_name.into(),
            source: source.into(),
        }
    }
}
