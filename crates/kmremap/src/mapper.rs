//! The name mapping capability metadata is rewritten through

use rustc_hash::FxHashMap;

/// Maps internal class names and the descriptors that mention them
///
/// Implementations are shared across threads while many class files are
/// processed, so they must be read-only. Names not known to the mapper are
/// returned unchanged.
pub trait NameMapper: Send + Sync {
    /// Map an internal (`a/b/C$D`) class name
    fn map_class_name(&self, internal_name: &str) -> String;

    /// Map every class referenced by a method descriptor
    fn map_method_descriptor(&self, descriptor: &str) -> String {
        map_descriptor(self, descriptor)
    }

    /// Map every class referenced by a field descriptor
    fn map_field_descriptor(&self, descriptor: &str) -> String {
        map_descriptor(self, descriptor)
    }
}

/// Rewrite every `L...;` reference of a descriptor
///
/// A reference without a closing `;` is copied verbatim.
pub fn map_descriptor<M: NameMapper + ?Sized>(mapper: &M, descriptor: &str) -> String {
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;

    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..start]);
        let reference = &rest[start + 1..];
        match reference.find(';') {
            Some(end) => {
                out.push('L');
                out.push_str(&mapper.map_class_name(&reference[..end]));
                out.push(';');
                rest = &reference[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Maps every name to itself
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl NameMapper for IdentityMapper {
    fn map_class_name(&self, internal_name: &str) -> String {
        internal_name.to_string()
    }

    fn map_method_descriptor(&self, descriptor: &str) -> String {
        descriptor.to_string()
    }

    fn map_field_descriptor(&self, descriptor: &str) -> String {
        descriptor.to_string()
    }
}

/// Class renames held in a hash map
#[derive(Debug, Clone, Default)]
pub struct SimpleNameMapper {
    classes: FxHashMap<String, String>,
}

impl SimpleNameMapper {
    /// Create an empty mapper
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class rename
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.classes.insert(from.into(), to.into());
    }

    /// Builder form of [`SimpleNameMapper::insert`]
    pub fn with_class(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from, to);
        self
    }

    /// Number of class renames
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no renames are known
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SimpleNameMapper {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapper = Self::new();
        for (from, to) in iter {
            mapper.insert(from, to);
        }
        mapper
    }
}

impl NameMapper for SimpleNameMapper {
    fn map_class_name(&self, internal_name: &str) -> String {
        match self.classes.get(internal_name) {
            Some(mapped) => mapped.clone(),
            None => internal_name.to_string(),
        }
    }
}
