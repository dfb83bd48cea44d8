//! Kind-specific decoding of a [`Header`] into a metadata tree and back

use crate::bits;
use crate::header::{Header, MetadataKind};
use crate::model::{self, KmClass, KmLambda, KmPackage, Message};
use crate::wire::DecodeError;
use serde::Serialize;

/// Decoded metadata of one class file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KotlinClassMetadata {
    /// A class
    Class {
        /// Class tree
        class: KmClass,
    },
    /// Top-level declarations of one file
    FileFacade {
        /// Declarations
        package: KmPackage,
    },
    /// A synthetic class; `None` when it is not a lambda
    SyntheticClass {
        /// Lambda tree
        lambda: Option<KmLambda>,
    },
    /// A multi-file class facade, listing its parts
    MultiFileClassFacade {
        /// Internal names of the parts
        part_class_names: Vec<String>,
    },
    /// One part of a multi-file class
    MultiFileClassPart {
        /// Declarations
        package: KmPackage,
        /// Internal name of the facade
        facade_class_name: String,
    },
    /// A kind this library does not know
    Unknown {
        /// Raw `k` value
        kind: i32,
    },
}

impl KotlinClassMetadata {
    /// Decode the payload of a header
    pub fn read(header: &Header) -> Result<Self, DecodeError> {
        let metadata = match header.metadata_kind() {
            MetadataKind::Class => Self::Class {
                class: read_payload(header)?,
            },
            MetadataKind::FileFacade => Self::FileFacade {
                package: read_payload(header)?,
            },
            MetadataKind::SyntheticClass => Self::SyntheticClass {
                lambda: if header.data1.is_empty() {
                    None
                } else {
                    Some(read_payload(header)?)
                },
            },
            MetadataKind::MultiFileClassFacade => Self::MultiFileClassFacade {
                part_class_names: header.data1.clone(),
            },
            MetadataKind::MultiFileClassPart => Self::MultiFileClassPart {
                package: read_payload(header)?,
                facade_class_name: header
                    .extra_string
                    .clone()
                    .ok_or(DecodeError::MissingField("xs"))?,
            },
            MetadataKind::Unknown(kind) => Self::Unknown { kind },
        };
        Ok(metadata)
    }

    /// Encode into a new header based on `original`
    ///
    /// Everything the tree does not own (kind, version, package name, extra
    /// flags) is taken from `original`. Kinds without a tree return
    /// `original` unchanged.
    pub fn write(&self, original: &Header) -> Header {
        let mut header = original.clone();
        match self {
            Self::Class { class } => write_payload(&mut header, class),
            Self::FileFacade { package } => write_payload(&mut header, package),
            Self::SyntheticClass {
                lambda: Some(lambda),
            } => write_payload(&mut header, lambda),
            Self::MultiFileClassPart {
                package,
                facade_class_name,
            } => {
                write_payload(&mut header, package);
                header.extra_string = Some(facade_class_name.clone());
            }
            Self::SyntheticClass { lambda: None }
            | Self::MultiFileClassFacade { .. }
            | Self::Unknown { .. } => {}
        }
        header
    }

    /// Whether this kind carries a tree that can be rewritten
    pub fn is_remappable(&self) -> bool {
        matches!(
            self,
            Self::Class { .. }
                | Self::FileFacade { .. }
                | Self::SyntheticClass { lambda: Some(_) }
                | Self::MultiFileClassPart { .. }
        )
    }
}

fn read_payload<T: Message>(header: &Header) -> Result<T, DecodeError> {
    let bytes = bits::decode_bytes(&header.data1)?;
    model::decode_root(&bytes, &header.data2)
}

fn write_payload<T: Message>(header: &mut Header, message: &T) {
    let (bytes, strings) = model::encode_root(message);
    header.data1 = bits::encode_bytes(&bytes);
    header.data2 = strings;
}
