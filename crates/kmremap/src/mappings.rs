//! Tiny mapping files
//!
//! Only class entries are read. Both the `v1` and the `tiny 2` layouts are
//! understood; member lines are skipped.

use crate::mapper::SimpleNameMapper;
use std::path::Path;
use thiserror::Error;

/// Mapping file errors
#[derive(Debug, Error)]
pub enum MappingError {
    /// Failed to read the file
    #[error("Failed to read mappings: {0}")]
    IoError(#[from] std::io::Error),

    /// The header is not a known Tiny header
    #[error("Unsupported mapping format: {0:?}")]
    UnsupportedFormat(String),

    /// A requested namespace is not declared in the header
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// A class line has too few columns
    #[error("Malformed mapping on line {line}: expected {expected} columns")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// Expected column count
        expected: usize,
    },
}

/// Read a Tiny file into a mapper from namespace `from` to namespace `to`
pub fn read_tiny_file(path: &Path, from: &str, to: &str) -> Result<SimpleNameMapper, MappingError> {
    let content = std::fs::read_to_string(path)?;
    read_tiny(&content, from, to)
}

/// Parse Tiny mappings from a string
pub fn read_tiny(content: &str, from: &str, to: &str) -> Result<SimpleNameMapper, MappingError> {
    let mut lines = content.lines();
    let header = lines.next().unwrap_or_default();
    let columns: Vec<&str> = header.split('\t').collect();

    let (namespaces, class_tag, first_column) = match columns.as_slice() {
        ["v1", namespaces @ ..] => (namespaces, "CLASS", 1),
        ["tiny", "2", _, namespaces @ ..] => (namespaces, "c", 1),
        _ => return Err(MappingError::UnsupportedFormat(header.to_string())),
    };

    let position = |name: &str| {
        namespaces
            .iter()
            .position(|namespace| *namespace == name)
            .ok_or_else(|| MappingError::UnknownNamespace(name.to_string()))
    };
    let from_column = first_column + position(from)?;
    let to_column = first_column + position(to)?;

    let mut mapper = SimpleNameMapper::new();
    for (index, line) in lines.enumerate() {
        if line.starts_with('\t') || line.starts_with('#') {
            continue;
        }
        let row: Vec<&str> = line.split('\t').collect();
        if row.first() != Some(&class_tag) {
            continue;
        }

        let expected = first_column + namespaces.len();
        if row.len() < expected.max(from_column + 1) {
            return Err(MappingError::Malformed {
                // The header is line 1
                line: index + 2,
                expected,
            });
        }

        let source = row[from_column];
        let target = row.get(to_column).copied().unwrap_or_default();
        if source.is_empty() || target.is_empty() || source == target {
            continue;
        }
        mapper.insert(source, target);
    }

    tracing::debug!(
        classes = mapper.len(),
        from,
        to,
        "loaded class mappings"
    );
    Ok(mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::NameMapper;

    const TINY_V1: &str = "v1\tofficial\tintermediary\tnamed\n\
        CLASS\ta\tnet/minecraft/class_1\tnet/minecraft/Block\n\
        FIELD\ta\tI\tb\tfield_1\tlevel\n\
        CLASS\tb\tnet/minecraft/class_2\tnet/minecraft/Item\n";

    const TINY_V2: &str = "tiny\t2\t0\tintermediary\tnamed\n\
        c\tnet/minecraft/class_1\tnet/minecraft/Block\n\
        \tm\t()V\tmethod_1\ttick\n\
        \t\tp\t1\t\tworld\n\
        c\tnet/minecraft/class_1$class_3\tnet/minecraft/Block$Settings\n\
        c\tnet/minecraft/class_9\t\n";

    #[test]
    fn test_tiny_v1() {
        let mapper = read_tiny(TINY_V1, "intermediary", "named").unwrap();
        assert_eq!(mapper.len(), 2);
        assert_eq!(
            mapper.map_class_name("net/minecraft/class_2"),
            "net/minecraft/Item"
        );
    }

    #[test]
    fn test_tiny_v2_skips_members_and_blank_names() {
        let mapper = read_tiny(TINY_V2, "intermediary", "named").unwrap();
        assert_eq!(mapper.len(), 2);
        assert_eq!(
            mapper.map_class_name("net/minecraft/class_1$class_3"),
            "net/minecraft/Block$Settings"
        );
        assert_eq!(
            mapper.map_class_name("net/minecraft/class_9"),
            "net/minecraft/class_9"
        );
    }

    #[test]
    fn test_reverse_direction() {
        let mapper = read_tiny(TINY_V2, "named", "intermediary").unwrap();
        assert_eq!(
            mapper.map_class_name("net/minecraft/Block"),
            "net/minecraft/class_1"
        );
    }

    #[test]
    fn test_unknown_namespace() {
        let result = read_tiny(TINY_V2, "official", "named");
        assert!(matches!(result, Err(MappingError::UnknownNamespace(ns)) if ns == "official"));
    }

    #[test]
    fn test_unsupported_header() {
        let result = read_tiny("a/b/C -> x:\n", "named", "intermediary");
        assert!(matches!(result, Err(MappingError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_short_class_line() {
        let content = "tiny\t2\t0\tintermediary\tnamed\nc\n";
        let result = read_tiny(content, "intermediary", "named");
        assert!(matches!(result, Err(MappingError::Malformed { line: 2, .. })));
    }
}
