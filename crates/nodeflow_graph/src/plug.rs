// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plugs and the literal values they can hold.

use crate::node::NodeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One endpoint of a connection: a node and one of its attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plug {
    /// Owning node
    pub node: NodeRef,
    /// Attribute name on the node
    pub attr: String,
}

impl Plug {
    /// Create a new plug
    pub fn new(node: impl Into<NodeRef>, attr: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            attr: attr.into(),
        }
    }

    /// Parse a `node.attr` path. The attribute may itself contain dots.
    pub fn parse(path: &str) -> Option<Self> {
        let (node, attr) = path.split_once('.')?;
        if node.is_empty() || attr.is_empty() {
            return None;
        }
        Some(Self::new(node, attr))
    }

    /// Same node, different attribute
    pub fn with_attr(&self, attr: impl Into<String>) -> Self {
        Self::new(self.node.clone(), attr)
    }
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attr)
    }
}

/// Data type carried by an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    /// Boolean value
    Bool,
    /// Integer / enum value
    Int,
    /// Floating point value
    Float,
    /// RGB colour
    Color,
    /// 3D vector (normals, points)
    Vector,
    /// String value (paths, names)
    String,
    /// Shader or message link carrying no literal
    Message,
    /// Accepts anything
    Any,
}

impl AttrType {
    /// Check if an output of this type can drive an input of `other`
    pub fn can_connect_to(&self, other: &AttrType) -> bool {
        // Any type can connect to anything
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        if self == other {
            return true;
        }

        matches!(
            (self, other),
            (Self::Int, Self::Float)
                | (Self::Float, Self::Int)
                | (Self::Bool, Self::Int)
                | (Self::Color, Self::Vector)
                | (Self::Vector, Self::Color)
        )
    }

    /// Check if a literal can be stored in an attribute of this type
    pub fn accepts(&self, value: &AttrValue) -> bool {
        match self {
            Self::Message => false,
            Self::Any => true,
            other => value.attr_type().can_connect_to(other),
        }
    }
}

/// Literal value stored on an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Boolean
    Bool(bool),
    /// Integer / enum index
    Int(i32),
    /// Float
    Float(f32),
    /// RGB colour
    Color([f32; 3]),
    /// 3D vector
    Vector([f32; 3]),
    /// String
    String(String),
}

impl AttrValue {
    /// Get the attribute type for this value
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::Bool(_) => AttrType::Bool,
            Self::Int(_) => AttrType::Int,
            Self::Float(_) => AttrType::Float,
            Self::Color(_) => AttrType::Color,
            Self::Vector(_) => AttrType::Vector,
            Self::String(_) => AttrType::String,
        }
    }

    /// Three-component payload of a colour or vector
    pub fn triple(&self) -> Option<[f32; 3]> {
        match self {
            Self::Color(rgb) | Self::Vector(rgb) => Some(*rgb),
            _ => None,
        }
    }

    /// Scalar payload of a float or integer
    pub fn scalar(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce this literal into the representation an attribute of
    /// `target` stores, if the two are compatible
    pub fn coerce_to(&self, target: AttrType) -> Option<AttrValue> {
        match (self, target) {
            (_, AttrType::Any) => Some(self.clone()),
            (Self::Int(v), AttrType::Float) => Some(Self::Float(*v as f32)),
            (Self::Float(v), AttrType::Int) => Some(Self::Int(v.round() as i32)),
            (Self::Bool(v), AttrType::Int) => Some(Self::Int(i32::from(*v))),
            (Self::Color(v), AttrType::Vector) => Some(Self::Vector(*v)),
            (Self::Vector(v), AttrType::Color) => Some(Self::Color(*v)),
            (value, target) if value.attr_type() == target => Some(value.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Color([r, g, b]) | Self::Vector([r, g, b]) => write!(f, "({r}, {g}, {b})"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plug_parse() {
        let plug = Plug::parse("file1.outColor").unwrap();
        assert_eq!(plug.node.as_str(), "file1");
        assert_eq!(plug.attr, "outColor");

        let nested = Plug::parse("MASH1_Color.texture.r").unwrap();
        assert_eq!(nested.attr, "texture.r");

        assert!(Plug::parse("noattr").is_none());
        assert!(Plug::parse(".outColor").is_none());
    }

    #[test]
    fn test_type_compatibility() {
        assert!(AttrType::Float.can_connect_to(&AttrType::Int));
        assert!(AttrType::Color.can_connect_to(&AttrType::Vector));
        assert!(!AttrType::Color.can_connect_to(&AttrType::Float));
        assert!(AttrType::Message.can_connect_to(&AttrType::Any));
        assert!(!AttrType::Message.accepts(&AttrValue::Float(1.0)));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(
            AttrValue::Int(1).coerce_to(AttrType::Float),
            Some(AttrValue::Float(1.0))
        );
        assert_eq!(
            AttrValue::Color([1.0, 0.0, 0.0]).coerce_to(AttrType::Vector),
            Some(AttrValue::Vector([1.0, 0.0, 0.0]))
        );
        assert_eq!(AttrValue::Float(0.5).coerce_to(AttrType::Color), None);
    }
}
