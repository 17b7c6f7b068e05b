// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node references, node templates and stored nodes.

use crate::kind::NodeKind;
use crate::plug::{AttrType, AttrValue, Plug};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a node living in the host graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(String);

impl NodeRef {
    /// Create a reference from a host node name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Host node name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Plug for one of this node's attributes
    pub fn plug(&self, attr: impl Into<String>) -> Plug {
        Plug::new(self.clone(), attr)
    }
}

impl From<&str> for NodeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&NodeRef> for NodeRef {
    fn from(node: &NodeRef) -> Self {
        node.clone()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attribute direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrDirection {
    /// Accepts at most one incoming connection and may hold a literal
    Input,
    /// Emits a value to any number of consumers
    Output,
}

/// Declaration of one attribute on a node template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrSpec {
    /// Attribute name
    pub name: String,
    /// Attribute direction
    pub direction: AttrDirection,
    /// Data type
    pub attr_type: AttrType,
    /// Default literal (inputs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<AttrValue>,
}

impl AttrSpec {
    /// Create a new input attribute
    pub fn input(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            direction: AttrDirection::Input,
            attr_type,
            default_value: None,
        }
    }

    /// Create a new output attribute
    pub fn output(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            direction: AttrDirection::Output,
            attr_type,
            default_value: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: AttrValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Template describing the attributes a node kind exposes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Node kind
    pub kind: NodeKind,
    /// Description
    pub description: String,
    /// Declared attributes
    pub attributes: Vec<AttrSpec>,
}

impl NodeTemplate {
    /// Create a node of this template's kind
    pub fn instantiate(&self, name: NodeRef) -> SceneNode {
        let mut node = SceneNode::new(name, self.kind.clone());
        for spec in &self.attributes {
            node.attributes.insert(
                spec.name.clone(),
                Attribute {
                    direction: spec.direction,
                    attr_type: spec.attr_type,
                    value: spec.default_value.clone(),
                },
            );
        }
        node
    }
}

/// Registry of node templates known to a graph store
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    templates: IndexMap<NodeKind, NodeTemplate>,
}

impl KindRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one for the same kind
    pub fn register(&mut self, template: NodeTemplate) {
        self.templates.insert(template.kind.clone(), template);
    }

    /// Get a template by kind
    pub fn get(&self, kind: &NodeKind) -> Option<&NodeTemplate> {
        self.templates.get(kind)
    }

    /// Get all registered kinds
    pub fn kinds(&self) -> impl Iterator<Item = &NodeKind> {
        self.templates.keys()
    }

    /// Get all registered templates
    pub fn templates(&self) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values()
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// A stored attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// Direction
    pub direction: AttrDirection,
    /// Data type
    pub attr_type: AttrType,
    /// Current literal, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AttrValue>,
}

/// A node instance held by the in-memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    /// Unique node name
    pub name: NodeRef,
    /// Node kind
    pub kind: NodeKind,
    /// Attributes by name, in declaration order
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,
}

impl SceneNode {
    /// Create a node with no attributes
    pub fn new(name: impl Into<NodeRef>, kind: impl Into<NodeKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an input attribute holding a literal
    pub fn with_value(mut self, attr: impl Into<String>, value: AttrValue) -> Self {
        let attr_type = value.attr_type();
        self.attributes.insert(
            attr.into(),
            Attribute {
                direction: AttrDirection::Input,
                attr_type,
                value: Some(value),
            },
        );
        self
    }

    /// Add an input attribute with no literal
    pub fn with_input(mut self, attr: impl Into<String>, attr_type: AttrType) -> Self {
        self.attributes.insert(
            attr.into(),
            Attribute {
                direction: AttrDirection::Input,
                attr_type,
                value: None,
            },
        );
        self
    }

    /// Add an output attribute
    pub fn with_output(mut self, attr: impl Into<String>, attr_type: AttrType) -> Self {
        self.attributes.insert(
            attr.into(),
            Attribute {
                direction: AttrDirection::Output,
                attr_type,
                value: None,
            },
        );
        self
    }

    /// Get an attribute by name
    pub fn attribute(&self, attr: &str) -> Option<&Attribute> {
        self.attributes.get(attr)
    }
}
