// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeRef;
use crate::plug::Plug;
use serde::{Deserialize, Serialize};

/// A connection from a source plug into a destination plug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Driving plug
    pub source: Plug,
    /// Driven plug
    pub destination: Plug,
}

impl Connection {
    /// Create a new connection
    pub fn new(source: Plug, destination: Plug) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node: &NodeRef) -> bool {
        self.source.node == *node || self.destination.node == *node
    }

    /// Check if this connection feeds into a specific node
    pub fn feeds(&self, node: &NodeRef) -> bool {
        self.destination.node == *node
    }
}
