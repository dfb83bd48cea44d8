//! Metadata version checks
//!
//! Both checks are advisory. They produce a [`Diagnostic`] that is logged and
//! handed back to the caller, but never stop a class from being processed.

use crate::header::Header;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `major.minor.patch` metadata version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataVersion {
    /// Major
    pub major: i32,
    /// Minor
    pub minor: i32,
    /// Patch, never compared
    #[serde(default)]
    pub patch: i32,
}

impl MetadataVersion {
    /// The metadata version this library reads and writes
    pub const CURRENT: Self = Self::new(2, 1, 0);

    /// Create a version
    pub const fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse an `mv` array; needs at least major and minor
    pub fn from_array(values: &[i32]) -> Option<Self> {
        match values {
            [major, minor, rest @ ..] => Some(Self::new(
                *major,
                *minor,
                rest.first().copied().unwrap_or(0),
            )),
            _ => None,
        }
    }

    /// Whether major and minor agree
    pub fn same_feature_release(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl Default for MetadataVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Advisory finding about one class's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The producer wrote a different major.minor version
    VersionMismatch {
        /// Internal name of the class
        class_name: String,
        /// `mv` as found in the class
        found: Vec<i32>,
        /// Version this library targets
        current: MetadataVersion,
    },
    /// Re-encoding changed the number of `d2` strings
    PayloadSizeDrift {
        /// Internal name of the class
        class_name: String,
        /// `d2` entries before the rewrite
        original: usize,
        /// `d2` entries after the rewrite
        remapped: usize,
    },
}

impl Diagnostic {
    /// Class the diagnostic is about
    pub fn class_name(&self) -> &str {
        match self {
            Self::VersionMismatch { class_name, .. } | Self::PayloadSizeDrift { class_name, .. } => {
                class_name
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionMismatch {
                class_name,
                found,
                current,
            } => {
                let found: Vec<String> = found.iter().map(i32::to_string).collect();
                write!(
                    f,
                    "Kotlin metadata of {class_name} has version {} but {current} is supported; \
                     remapping may lose data",
                    found.join(".")
                )
            }
            Self::PayloadSizeDrift {
                class_name,
                original,
                remapped,
            } => write!(
                f,
                "Kotlin metadata of {class_name} changed size while remapping \
                 ({original} -> {remapped} strings)"
            ),
        }
    }
}

/// Compare a header's version against `current`
pub fn check_version(
    class_name: &str,
    header: &Header,
    current: &MetadataVersion,
) -> Option<Diagnostic> {
    let compatible = MetadataVersion::from_array(&header.metadata_version)
        .is_some_and(|found| found.same_feature_release(current));
    if compatible {
        return None;
    }
    Some(Diagnostic::VersionMismatch {
        class_name: class_name.to_string(),
        found: header.metadata_version.clone(),
        current: *current,
    })
}

/// Compare the string payload of a header before and after rewriting
pub fn check_payload_drift(
    class_name: &str,
    original: &Header,
    remapped: &Header,
) -> Option<Diagnostic> {
    if original.data2.len() == remapped.data2.len() {
        return None;
    }
    Some(Diagnostic::PayloadSizeDrift {
        class_name: class_name.to_string(),
        original: original.data2.len(),
        remapped: remapped.data2.len(),
    })
}
