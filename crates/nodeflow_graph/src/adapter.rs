// SPDX-License-Identifier: MIT OR Apache-2.0
//! The narrow interface the conversion engine uses to reach a host graph.

use crate::kind::NodeKind;
use crate::node::NodeRef;
use crate::plug::{AttrValue, Plug};
use indexmap::IndexSet;

/// Reason a host graph query or mutation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaultKind {
    /// The node no longer exists
    #[error("Node not found: {0}")]
    StaleNode(NodeRef),

    /// The node exists but lacks the attribute
    #[error("Attribute not found: {0}")]
    MissingAttribute(Plug),

    /// The attribute exists but holds no literal
    #[error("Attribute has no literal value: {0}")]
    NoLiteral(Plug),

    /// The value or connection does not fit the attribute's type
    #[error("Type mismatch on {0}")]
    TypeMismatch(Plug),

    /// Output attributes cannot be driven or set
    #[error("Attribute is not an input: {0}")]
    NotAnInput(Plug),

    /// No template is registered for the kind
    #[error("Unknown node kind: {0}")]
    UnknownKind(NodeKind),

    /// The kind is known but not loaded in the host
    #[error("Node kind not available: {0}")]
    KindUnavailable(NodeKind),

    /// The node is not a consumer group
    #[error("Not a shading group: {0}")]
    NotAGroup(NodeRef),

    /// Connecting a node to itself
    #[error("Self-loop not allowed on {0}")]
    SelfLoop(NodeRef),
}

/// Scene graph adapter implemented by a host integration.
///
/// Destination attributes accept a single incoming connection; connecting
/// into an already-driven attribute replaces the previous driver.
pub trait SceneGraphAdapter {
    /// Whether the node exists
    fn node_exists(&self, node: &NodeRef) -> bool;

    /// Kind of the node
    fn node_kind(&self, node: &NodeRef) -> Result<NodeKind, FaultKind>;

    /// Whether the node exposes the attribute
    fn attribute_exists(&self, node: &NodeRef, attr: &str) -> bool;

    /// Read a literal attribute value
    fn get_literal(&self, plug: &Plug) -> Result<AttrValue, FaultKind>;

    /// Write a literal attribute value. A connection driving the attribute
    /// is left in place.
    fn set_literal(&mut self, plug: &Plug, value: AttrValue) -> Result<(), FaultKind>;

    /// The single plug driving a destination attribute, if any
    fn list_incoming(&self, plug: &Plug) -> Option<Plug>;

    /// Every connection feeding into the node as `(source, destination)`,
    /// in the host's attribute order
    fn list_upstream(&self, node: &NodeRef) -> Vec<(Plug, Plug)>;

    /// Every node reading from one of this node's attributes, deduplicated
    fn list_outgoing_consumers(&self, node: &NodeRef) -> Vec<NodeRef>;

    /// Whether `source` drives `destination`
    fn is_connected(&self, source: &Plug, destination: &Plug) -> bool;

    /// Connect `source` into `destination`, replacing any previous driver
    fn connect(&mut self, source: &Plug, destination: &Plug) -> Result<(), FaultKind>;

    /// Break the connection driving `destination`, if any
    fn disconnect(&mut self, destination: &Plug) -> Result<(), FaultKind>;

    /// Create a node. The host may alter `name_hint` to keep names unique.
    fn create_node(&mut self, kind: &NodeKind, name_hint: &str) -> Result<NodeRef, FaultKind>;

    /// Every node kind the host can currently create
    fn available_kinds(&self) -> IndexSet<NodeKind>;

    /// Whether the host can currently create nodes of `kind`
    fn is_kind_available(&self, kind: &NodeKind) -> bool {
        self.available_kinds().contains(kind)
    }

    /// Every node of a kind, in creation order
    fn nodes_of_kind(&self, kind: &NodeKind) -> Vec<NodeRef>;

    /// Members of a consumer group
    fn group_members(&self, group: &NodeRef) -> Result<Vec<NodeRef>, FaultKind>;

    /// Consumer groups a member belongs to
    fn member_groups(&self, member: &NodeRef) -> Vec<NodeRef>;

    /// Move members into a consumer group, removing them from any other
    fn assign_to_group(&mut self, members: &[NodeRef], group: &NodeRef) -> Result<(), FaultKind>;
}
