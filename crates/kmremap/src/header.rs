//! The raw `@kotlin.Metadata` header
//!
//! The header is a flat set of annotation elements. Only the seven keys below
//! are interpreted; everything else in the annotation is carried along
//! untouched when the header is written back.

use crate::annotation::{AnnotationNode, AnnotationValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Descriptor of the annotation that carries the metadata
pub const METADATA_DESCRIPTOR: &str = "Lkotlin/Metadata;";

/// Element keys of the metadata annotation
pub mod keys {
    /// Kind
    pub const KIND: &str = "k";
    /// Metadata version
    pub const METADATA_VERSION: &str = "mv";
    /// Protobuf payload
    pub const DATA1: &str = "d1";
    /// String table strings
    pub const DATA2: &str = "d2";
    /// Extra string
    pub const EXTRA_STRING: &str = "xs";
    /// Package name
    pub const PACKAGE_NAME: &str = "pn";
    /// Extra flags
    pub const EXTRA_INT: &str = "xi";
}

/// Errors raised while reading header elements
#[derive(Debug, Error)]
pub enum HeaderError {
    /// An element had the wrong value shape
    #[error("Invalid value for metadata element `{key}`: expected {expected}")]
    InvalidValue {
        /// Element key
        key: &'static str,
        /// Expected shape
        expected: &'static str,
    },
}

/// What a class file's metadata describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetadataKind {
    /// A class, interface, object or enum
    Class,
    /// A file's top-level declarations
    FileFacade,
    /// A lambda or other synthetic class
    SyntheticClass,
    /// The facade of a `@JvmMultifileClass`
    MultiFileClassFacade,
    /// One part of a `@JvmMultifileClass`
    MultiFileClassPart,
    /// Anything else
    Unknown(i32),
}

impl MetadataKind {
    /// Interpret a `k` value
    pub fn from_i32(kind: i32) -> Self {
        match kind {
            1 => Self::Class,
            2 => Self::FileFacade,
            3 => Self::SyntheticClass,
            4 => Self::MultiFileClassFacade,
            5 => Self::MultiFileClassPart,
            other => Self::Unknown(other),
        }
    }
}

fn default_kind() -> i32 {
    1
}

/// Typed view of the metadata annotation elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// `k`
    #[serde(rename = "k", default = "default_kind")]
    pub kind: i32,
    /// `mv`
    #[serde(rename = "mv", default)]
    pub metadata_version: Vec<i32>,
    /// `d1`
    #[serde(rename = "d1", default)]
    pub data1: Vec<String>,
    /// `d2`
    #[serde(rename = "d2", default)]
    pub data2: Vec<String>,
    /// `xs`
    #[serde(rename = "xs", default, skip_serializing_if = "Option::is_none")]
    pub extra_string: Option<String>,
    /// `pn`
    #[serde(rename = "pn", default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// `xi`
    #[serde(rename = "xi", default, skip_serializing_if = "Option::is_none")]
    pub extra_int: Option<i32>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            metadata_version: Vec::new(),
            data1: Vec::new(),
            data2: Vec::new(),
            extra_string: None,
            package_name: None,
            extra_int: None,
        }
    }
}

impl Header {
    /// Kind of metadata this header carries
    pub fn metadata_kind(&self) -> MetadataKind {
        MetadataKind::from_i32(self.kind)
    }

    /// Assemble a header from annotation elements
    ///
    /// Returns `None` when the annotation has no elements at all, whether the
    /// element list is missing or empty.
    pub fn from_annotation_values(
        values: Option<&[(String, AnnotationValue)]>,
    ) -> Result<Option<Self>, HeaderError> {
        let Some(values) = values.filter(|values| !values.is_empty()) else {
            return Ok(None);
        };

        let mut header = Self::default();
        for (name, value) in values {
            match name.as_str() {
                keys::KIND => header.kind = expect(keys::KIND, "int", value.as_int())?,
                keys::METADATA_VERSION => {
                    header.metadata_version =
                        expect(keys::METADATA_VERSION, "int[]", value.as_int_array())?
                }
                keys::DATA1 => {
                    header.data1 = expect(keys::DATA1, "String[]", value.as_string_array())?
                }
                keys::DATA2 => {
                    header.data2 = expect(keys::DATA2, "String[]", value.as_string_array())?
                }
                keys::EXTRA_STRING => {
                    header.extra_string = Some(
                        expect(keys::EXTRA_STRING, "String", value.as_str())?.to_string(),
                    )
                }
                keys::PACKAGE_NAME => {
                    header.package_name = Some(
                        expect(keys::PACKAGE_NAME, "String", value.as_str())?.to_string(),
                    )
                }
                keys::EXTRA_INT => {
                    header.extra_int = Some(expect(keys::EXTRA_INT, "int", value.as_int())?)
                }
                _ => {}
            }
        }
        Ok(Some(header))
    }

    /// Write this header over a template's elements
    ///
    /// Element order and unrecognised elements come from `template`. The
    /// optional `xs`, `pn` and `xi` elements are only replaced when this
    /// header has a value for them.
    pub fn to_annotation_values(
        &self,
        template: &[(String, AnnotationValue)],
    ) -> Vec<(String, AnnotationValue)> {
        template
            .iter()
            .map(|(name, value)| {
                let replaced = match name.as_str() {
                    keys::KIND => Some(AnnotationValue::Int(self.kind)),
                    keys::METADATA_VERSION => {
                        Some(AnnotationValue::int_array(&self.metadata_version))
                    }
                    keys::DATA1 => Some(AnnotationValue::string_array(&self.data1)),
                    keys::DATA2 => Some(AnnotationValue::string_array(&self.data2)),
                    keys::EXTRA_STRING => self.extra_string.clone().map(AnnotationValue::String),
                    keys::PACKAGE_NAME => self.package_name.clone().map(AnnotationValue::String),
                    keys::EXTRA_INT => self.extra_int.map(AnnotationValue::Int),
                    _ => None,
                };
                (name.clone(), replaced.unwrap_or_else(|| value.clone()))
            })
            .collect()
    }

    /// Build a fresh metadata annotation holding this header
    pub fn to_annotation(&self) -> AnnotationNode {
        let mut node = AnnotationNode::new(METADATA_DESCRIPTOR)
            .with_value(keys::KIND, AnnotationValue::Int(self.kind))
            .with_value(
                keys::METADATA_VERSION,
                AnnotationValue::int_array(&self.metadata_version),
            )
            .with_value(keys::DATA1, AnnotationValue::string_array(&self.data1))
            .with_value(keys::DATA2, AnnotationValue::string_array(&self.data2));
        if let Some(extra_string) = &self.extra_string {
            node.visit(keys::EXTRA_STRING, AnnotationValue::String(extra_string.clone()));
        }
        if let Some(package_name) = &self.package_name {
            node.visit(keys::PACKAGE_NAME, AnnotationValue::String(package_name.clone()));
        }
        if let Some(extra_int) = self.extra_int {
            node.visit(keys::EXTRA_INT, AnnotationValue::Int(extra_int));
        }
        node
    }
}

fn expect<T>(key: &'static str, expected: &'static str, value: Option<T>) -> Result<T, HeaderError> {
    value.ok_or(HeaderError::InvalidValue { key, expected })
}
