//! Raw syntax tree for DeskML.
//!
//! Produced directly by the grammar, before any schema validation. Every
//! tag, attribute key and attribute value keeps the span it was parsed from.

use std::fmt;

use deskml_combinator::Located;
use serde::{Deserialize, Serialize};

/// A complete DeskML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Located<MlNode>>,
}

/// A node in the raw tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MlNode {
    /// `<name attrs>children</name>`
    Tag(TagNode),

    /// Everything between tags, verbatim.
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagNode {
    pub tag: Located<String>,
    pub attributes: Vec<AttributeData>,
    pub children: Vec<Located<MlNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
}

/// An attribute as written: `key="text"`, `key=12.5` or a bare `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeData {
    pub key: Located<String>,
    pub attr: Located<AttrValue>,
}

/// The value of an attribute. Bare attributes are `Boolean(true)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::String(_) => AttrType::String,
            AttrValue::Number(_) => AttrType::Number,
            AttrValue::Boolean(_) => AttrType::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(s) => f.write_str(s),
            AttrValue::Number(n) => write!(f, "{}", format_number(*n)),
            AttrValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// The runtime type of an attribute value, as declared in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    String,
    Number,
    Boolean,
}

impl AttrType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttrType::String => "string",
            AttrType::Number => "number",
            AttrType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a number the way it was most likely written: `100`, not `100.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attr_type_names() {
        assert_eq!(AttrValue::String("x".into()).attr_type().as_str(), "string");
        assert_eq!(AttrValue::Number(1.0).attr_type().as_str(), "number");
        assert_eq!(AttrValue::Boolean(true).attr_type().as_str(), "boolean");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_accessors_are_type_strict() {
        let value = AttrValue::Number(4.0);
        assert_eq!(value.as_number(), Some(4.0));
        assert_eq!(value.as_str(), None);
        assert_eq!(value.as_bool(), None);
    }
}
