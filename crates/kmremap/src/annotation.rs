//! Annotation values as handed over by a bytecode reader

use serde::Serialize;

/// A constant annotation element value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnnotationValue {
    /// `byte`
    Byte(i8),
    /// `boolean`
    Boolean(bool),
    /// `char`
    Char(char),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// `String`
    String(String),
    /// Class literal, as a type descriptor
    Type(String),
    /// Enum constant
    Enum {
        /// Enum type descriptor
        desc: String,
        /// Constant name
        value: String,
    },
    /// Nested annotation
    Annotation(AnnotationNode),
    /// Array of values
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    /// The value as an `int`
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The value as a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// The value as an `int[]`
    pub fn as_int_array(&self) -> Option<Vec<i32>> {
        match self {
            Self::Array(values) => values.iter().map(Self::as_int).collect(),
            _ => None,
        }
    }

    /// The value as a `String[]`
    pub fn as_string_array(&self) -> Option<Vec<String>> {
        match self {
            Self::Array(values) => values
                .iter()
                .map(|value| value.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    /// Build an `int[]`
    pub fn int_array(values: &[i32]) -> Self {
        Self::Array(values.iter().copied().map(Self::Int).collect())
    }

    /// Build a `String[]`
    pub fn string_array(values: &[String]) -> Self {
        Self::Array(values.iter().cloned().map(Self::String).collect())
    }
}

/// An annotation occurrence: its type descriptor and element values in
/// declaration order
///
/// `values` is `None` for an annotation that was visited without any
/// elements, matching how bytecode libraries represent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationNode {
    /// Annotation type descriptor, e.g. `Lkotlin/Metadata;`
    pub desc: String,
    /// Element name/value pairs
    pub values: Option<Vec<(String, AnnotationValue)>>,
}

impl AnnotationNode {
    /// Create an annotation without elements
    pub fn new(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            values: None,
        }
    }

    /// Append an element
    pub fn visit(&mut self, name: impl Into<String>, value: AnnotationValue) {
        self.values
            .get_or_insert_with(Vec::new)
            .push((name.into(), value));
    }

    /// Builder form of [`AnnotationNode::visit`]
    pub fn with_value(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.visit(name, value);
        self
    }

    /// Look up an element by name
    pub fn get(&self, name: &str) -> Option<&AnnotationValue> {
        self.values
            .as_ref()?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_creates_values() {
        let mut node = AnnotationNode::new("Lkotlin/Metadata;");
        assert!(node.values.is_none());

        node.visit("k", AnnotationValue::Int(1));
        node.visit("mv", AnnotationValue::int_array(&[1, 9, 0]));

        assert_eq!(node.get("k").and_then(AnnotationValue::as_int), Some(1));
        assert_eq!(
            node.get("mv").and_then(AnnotationValue::as_int_array),
            Some(vec![1, 9, 0])
        );
        assert!(node.get("d1").is_none());
    }

    #[test]
    fn test_typed_accessors_reject_other_shapes() {
        assert_eq!(AnnotationValue::Long(1).as_int(), None);
        assert_eq!(AnnotationValue::Int(1).as_str(), None);
        let mixed = AnnotationValue::Array(vec![
            AnnotationValue::String("a".to_string()),
            AnnotationValue::Int(1),
        ]);
        assert_eq!(mixed.as_string_array(), None);
        assert_eq!(mixed.as_int_array(), None);
    }
}
