//! Kotlin Metadata Remapping
//!
//! This crate rewrites the `@kotlin.Metadata` annotation of compiled Kotlin
//! classes so that the class names and JVM descriptors it records follow a
//! class renaming applied to the bytecode. It provides the header codec, the
//! protobuf payload model, the tree remapper and a class visitor that plugs
//! the rewrite into a visitor chain.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod annotation;
pub mod bits;
pub mod config;
pub mod error;
pub mod header;
pub mod mapper;
pub mod mappings;
pub mod metadata;
pub mod model;
pub mod remap;
pub mod strings;
pub mod version;
pub mod visitor;
pub mod wire;

pub use annotation::{AnnotationNode, AnnotationValue};
pub use config::{ConfigError, RemapConfig};
pub use error::{MetadataError, RemapError};
pub use header::{Header, HeaderError, MetadataKind, METADATA_DESCRIPTOR};
pub use mapper::{IdentityMapper, NameMapper, SimpleNameMapper};
pub use mappings::{read_tiny, read_tiny_file, MappingError};
pub use metadata::KotlinClassMetadata;
pub use remap::KotlinClassRemapper;
pub use version::{Diagnostic, MetadataVersion};
pub use visitor::{
    ClassNode, ClassVisitor, KotlinMetadataRemappingClassVisitor, MetadataRemapper,
    PassthroughReason, RemapOutcome, RemapResult,
};
pub use wire::DecodeError;
