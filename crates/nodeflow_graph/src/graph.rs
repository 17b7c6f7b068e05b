// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory shading graph implementing [`SceneGraphAdapter`].

use crate::adapter::{FaultKind, SceneGraphAdapter};
use crate::connection::Connection;
use crate::kind::NodeKind;
use crate::node::{AttrDirection, AttrSpec, Attribute, KindRegistry, NodeRef, SceneNode};
use crate::plug::{AttrValue, Plug};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Current scene document format version
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// An in-memory shading graph
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// Scene name
    pub name: String,
    /// Templates used when creating nodes
    registry: KindRegistry,
    /// Kinds the simulated host can currently create
    available: IndexSet<NodeKind>,
    /// Nodes in creation order
    nodes: IndexMap<NodeRef, SceneNode>,
    /// Connections keyed by their destination plug
    connections: IndexMap<Plug, Connection>,
    /// Consumer group membership
    groups: IndexMap<NodeRef, IndexSet<NodeRef>>,
}

impl SceneGraph {
    /// Create an empty scene where every registered kind is available
    pub fn new(name: impl Into<String>, registry: KindRegistry) -> Self {
        let available = registry.kinds().cloned().collect();
        Self {
            name: name.into(),
            registry,
            available,
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            groups: IndexMap::new(),
        }
    }

    /// Template registry
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Mark a kind as unavailable, as if its plugin were unloaded
    pub fn disable_kind(&mut self, kind: &NodeKind) {
        self.available.shift_remove(kind);
    }

    /// Mark a registered kind as available again
    pub fn enable_kind(&mut self, kind: NodeKind) {
        if self.registry.get(&kind).is_some() {
            self.available.insert(kind);
        }
    }

    /// Insert a node, replacing any node with the same name
    pub fn insert_node(&mut self, node: SceneNode) -> NodeRef {
        let name = node.name.clone();
        if node.kind == NodeKind::ShadingGroup {
            self.groups.entry(name.clone()).or_default();
        }
        self.nodes.insert(name.clone(), node);
        name
    }

    /// Create a templated node under an exact name
    pub fn spawn(&mut self, kind: impl Into<NodeKind>, name: impl Into<NodeRef>) -> Result<NodeRef, FaultKind> {
        let kind = kind.into();
        let template = self
            .registry
            .get(&kind)
            .ok_or_else(|| FaultKind::UnknownKind(kind.clone()))?;
        let node = template.instantiate(name.into());
        Ok(self.insert_node(node))
    }

    /// Remove a node together with its connections and memberships
    pub fn remove_node(&mut self, node: &NodeRef) -> Option<SceneNode> {
        self.connections.retain(|_, c| !c.involves_node(node));
        self.groups.shift_remove(node);
        for members in self.groups.values_mut() {
            members.shift_remove(node);
        }
        self.nodes.shift_remove(node)
    }

    /// Get a node by reference
    pub fn node(&self, node: &NodeRef) -> Option<&SceneNode> {
        self.nodes.get(node)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn attribute(&self, plug: &Plug) -> Result<&Attribute, FaultKind> {
        let node = self
            .nodes
            .get(&plug.node)
            .ok_or_else(|| FaultKind::StaleNode(plug.node.clone()))?;
        node.attribute(&plug.attr)
            .ok_or_else(|| FaultKind::MissingAttribute(plug.clone()))
    }

    fn unique_name(&self, hint: &str) -> NodeRef {
        let base = if hint.is_empty() { "node" } else { hint };
        if !self.nodes.contains_key(&NodeRef::from(base)) {
            return NodeRef::from(base);
        }
        let mut index = 1;
        loop {
            let candidate = NodeRef::new(format!("{base}{index}"));
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Snapshot the scene as a serializable document
    pub fn to_document(&self) -> SceneDocument {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeDocument {
                name: node.name.clone(),
                kind: node.kind.clone(),
                attributes: node
                    .attributes
                    .iter()
                    .map(|(name, attr)| AttrSpec {
                        name: name.clone(),
                        direction: attr.direction,
                        attr_type: attr.attr_type,
                        default_value: attr.value.clone(),
                    })
                    .collect(),
                values: IndexMap::new(),
            })
            .collect();

        let connections = self
            .connections
            .values()
            .map(|c| (c.source.to_string(), c.destination.to_string()))
            .collect();

        let groups = self
            .groups
            .iter()
            .map(|(group, members)| GroupDocument {
                group: group.clone(),
                members: members.iter().cloned().collect(),
            })
            .collect();

        let all_available = self.registry.kinds().all(|k| self.available.contains(k));

        SceneDocument {
            version: SCENE_FORMAT_VERSION,
            name: self.name.clone(),
            nodes,
            connections,
            groups,
            available_kinds: (!all_available).then(|| self.available.iter().cloned().collect()),
        }
    }

    /// Build a scene from a document. Nodes whose kind has a template start
    /// from that template before the document's attributes are applied.
    pub fn from_document(document: SceneDocument, registry: KindRegistry) -> Result<Self, DocumentError> {
        if document.version != SCENE_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion(document.version));
        }

        let mut scene = Self::new(document.name, registry);
        if let Some(kinds) = document.available_kinds {
            scene.available = kinds.into_iter().collect();
        }

        for doc in document.nodes {
            let mut node = match scene.registry.get(&doc.kind) {
                Some(template) => template.instantiate(doc.name),
                None => SceneNode::new(doc.name, doc.kind),
            };
            for spec in doc.attributes {
                node.attributes.insert(
                    spec.name,
                    Attribute {
                        direction: spec.direction,
                        attr_type: spec.attr_type,
                        value: spec.default_value,
                    },
                );
            }
            for (attr, value) in doc.values {
                match node.attributes.get_mut(&attr) {
                    Some(existing) => existing.value = Some(value),
                    None => node = node.with_value(attr, value),
                }
            }
            scene.insert_node(node);
        }

        for (source, destination) in document.connections {
            let source = Plug::parse(&source).ok_or(DocumentError::InvalidPlug(source))?;
            let destination =
                Plug::parse(&destination).ok_or(DocumentError::InvalidPlug(destination))?;
            scene.connect(&source, &destination)?;
        }

        for group in document.groups {
            scene.assign_to_group(&group.members, &group.group)?;
        }

        Ok(scene)
    }

    /// Serialize to a pretty RON string
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(4);
        Ok(ron::ser::to_string_pretty(&self.to_document(), pretty)?)
    }

    /// Load from a RON string
    pub fn from_ron(text: &str, registry: KindRegistry) -> Result<Self, DocumentError> {
        let document: SceneDocument = ron::from_str(text)?;
        Self::from_document(document, registry)
    }
}

impl SceneGraphAdapter for SceneGraph {
    fn node_exists(&self, node: &NodeRef) -> bool {
        self.nodes.contains_key(node)
    }

    fn node_kind(&self, node: &NodeRef) -> Result<NodeKind, FaultKind> {
        self.nodes
            .get(node)
            .map(|n| n.kind.clone())
            .ok_or_else(|| FaultKind::StaleNode(node.clone()))
    }

    fn attribute_exists(&self, node: &NodeRef, attr: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.attributes.contains_key(attr))
    }

    fn get_literal(&self, plug: &Plug) -> Result<AttrValue, FaultKind> {
        self.attribute(plug)?
            .value
            .clone()
            .ok_or_else(|| FaultKind::NoLiteral(plug.clone()))
    }

    fn set_literal(&mut self, plug: &Plug, value: AttrValue) -> Result<(), FaultKind> {
        let attr = self.attribute(plug)?;
        if attr.direction != AttrDirection::Input {
            return Err(FaultKind::NotAnInput(plug.clone()));
        }
        let value = value
            .coerce_to(attr.attr_type)
            .filter(|_| attr.attr_type.accepts(&value))
            .ok_or_else(|| FaultKind::TypeMismatch(plug.clone()))?;

        if let Some(attr) = self
            .nodes
            .get_mut(&plug.node)
            .and_then(|n| n.attributes.get_mut(&plug.attr))
        {
            attr.value = Some(value);
        }
        Ok(())
    }

    fn list_incoming(&self, plug: &Plug) -> Option<Plug> {
        self.connections.get(plug).map(|c| c.source.clone())
    }

    fn list_upstream(&self, node: &NodeRef) -> Vec<(Plug, Plug)> {
        let Some(scene_node) = self.nodes.get(node) else {
            return Vec::new();
        };
        scene_node
            .attributes
            .keys()
            .filter_map(|attr| {
                let destination = node.plug(attr.as_str());
                self.connections
                    .get(&destination)
                    .map(|c| (c.source.clone(), destination))
            })
            .collect()
    }

    fn list_outgoing_consumers(&self, node: &NodeRef) -> Vec<NodeRef> {
        let mut consumers = IndexSet::new();
        for connection in self.connections.values() {
            if connection.source.node == *node {
                consumers.insert(connection.destination.node.clone());
            }
        }
        consumers.into_iter().collect()
    }

    fn is_connected(&self, source: &Plug, destination: &Plug) -> bool {
        self.connections
            .get(destination)
            .is_some_and(|c| c.source == *source)
    }

    fn connect(&mut self, source: &Plug, destination: &Plug) -> Result<(), FaultKind> {
        let source_attr = self.attribute(source)?;
        let destination_attr = self.attribute(destination)?;

        if source.node == destination.node {
            return Err(FaultKind::SelfLoop(source.node.clone()));
        }
        if destination_attr.direction != AttrDirection::Input {
            return Err(FaultKind::NotAnInput(destination.clone()));
        }
        if !source_attr.attr_type.can_connect_to(&destination_attr.attr_type) {
            return Err(FaultKind::TypeMismatch(destination.clone()));
        }

        // Last connection into a destination wins
        if let Some(previous) = self.connections.get(destination) {
            tracing::trace!("Replacing {} -> {}", previous.source, destination);
        }
        self.connections.insert(
            destination.clone(),
            Connection::new(source.clone(), destination.clone()),
        );
        Ok(())
    }

    fn disconnect(&mut self, destination: &Plug) -> Result<(), FaultKind> {
        self.attribute(destination)?;
        self.connections.shift_remove(destination);
        Ok(())
    }

    fn create_node(&mut self, kind: &NodeKind, name_hint: &str) -> Result<NodeRef, FaultKind> {
        if self.registry.get(kind).is_none() {
            return Err(FaultKind::UnknownKind(kind.clone()));
        }
        if !self.available.contains(kind) {
            return Err(FaultKind::KindUnavailable(kind.clone()));
        }
        let name = self.unique_name(name_hint);
        self.spawn(kind.clone(), name)
    }

    fn available_kinds(&self) -> IndexSet<NodeKind> {
        self.available.clone()
    }

    fn is_kind_available(&self, kind: &NodeKind) -> bool {
        self.available.contains(kind)
    }

    fn nodes_of_kind(&self, kind: &NodeKind) -> Vec<NodeRef> {
        self.nodes
            .values()
            .filter(|n| n.kind == *kind)
            .map(|n| n.name.clone())
            .collect()
    }

    fn group_members(&self, group: &NodeRef) -> Result<Vec<NodeRef>, FaultKind> {
        if !self.nodes.contains_key(group) {
            return Err(FaultKind::StaleNode(group.clone()));
        }
        self.groups
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .ok_or_else(|| FaultKind::NotAGroup(group.clone()))
    }

    fn member_groups(&self, member: &NodeRef) -> Vec<NodeRef> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(member))
            .map(|(group, _)| group.clone())
            .collect()
    }

    fn assign_to_group(&mut self, members: &[NodeRef], group: &NodeRef) -> Result<(), FaultKind> {
        if !self.nodes.contains_key(group) {
            return Err(FaultKind::StaleNode(group.clone()));
        }
        if !self.groups.contains_key(group) {
            return Err(FaultKind::NotAGroup(group.clone()));
        }
        if let Some(missing) = members.iter().find(|m| !self.nodes.contains_key(*m)) {
            return Err(FaultKind::StaleNode(missing.clone()));
        }

        for (other, other_members) in self.groups.iter_mut() {
            if other != group {
                for member in members {
                    other_members.shift_remove(member);
                }
            }
        }
        if let Some(target) = self.groups.get_mut(group) {
            target.extend(members.iter().cloned());
        }
        Ok(())
    }
}

/// Serializable form of a [`SceneGraph`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version
    pub version: u32,
    /// Scene name
    pub name: String,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    /// Connections as `("node.attr", "node.attr")` pairs
    #[serde(default)]
    pub connections: Vec<(String, String)>,
    /// Consumer group membership
    #[serde(default)]
    pub groups: Vec<GroupDocument>,
    /// Kinds the host can create; all registered kinds when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_kinds: Option<Vec<NodeKind>>,
}

/// Serializable node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Node name
    pub name: NodeRef,
    /// Node kind
    pub kind: NodeKind,
    /// Attributes declared beyond (or overriding) the kind's template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttrSpec>,
    /// Literal values to apply after the attributes are declared
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub values: IndexMap<String, AttrValue>,
}

/// Serializable consumer group membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDocument {
    /// Group node
    pub group: NodeRef,
    /// Member nodes
    pub members: Vec<NodeRef>,
}

/// Error loading or saving a scene document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// RON parse error
    #[error("Failed to parse scene: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Failed to serialize scene: {0}")]
    Serialize(#[from] ron::Error),

    /// Unsupported format version
    #[error("Unsupported scene format version: {0}")]
    UnsupportedVersion(u32),

    /// Malformed plug path
    #[error("Invalid plug path: {0}")]
    InvalidPlug(String),

    /// The document describes an impossible graph
    #[error("Invalid scene: {0}")]
    Graph(#[from] FaultKind),
}
