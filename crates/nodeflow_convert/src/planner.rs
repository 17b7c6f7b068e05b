// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot transfer planning.
//!
//! Reads a source material against the slot map and lists what would be
//! carried over to a target material kind, without touching the graph.

use crate::catalog::{LEAF_SAMPLER, SAMPLER_PATH_ATTR};
use crate::slots::{DestinationAttr, SemanticSlot, SlotMap};
use nodeflow_graph::{AttrValue, MaterialKind, NodeRef, Plug, SceneGraphAdapter};
use serde::Serialize;
use std::collections::HashSet;

/// Leaf sampler found at the end of a texture chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafSampler {
    /// Sampler node
    pub node: NodeRef,
    /// Image path; empty when unset
    pub path: String,
}

/// What an entry carries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TransferPayload {
    /// A live connection
    Texture {
        /// Plug currently driving the source attribute
        source: Plug,
        /// Nearest leaf sampler upstream, for diagnostics
        leaf: Option<LeafSampler>,
    },
    /// A literal value
    Value {
        /// Value read from the source attribute
        value: AttrValue,
    },
}

/// Transfer mode of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Carry a connection
    Texture,
    /// Carry a literal
    Value,
}

/// One row of a transfer plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEntry {
    /// Material the slot is read from
    pub source_shader: NodeRef,
    /// Slot being transferred
    pub slot: SemanticSlot,
    /// Connection or literal
    pub payload: TransferPayload,
    /// Where the slot lands
    pub destination: DestinationAttr,
    /// Output to read when the source is a leaf sampler
    pub preferred_output: String,
    /// Material kind the plan targets
    pub target_kind: MaterialKind,
}

impl TransferEntry {
    /// Transfer mode
    pub fn mode(&self) -> TransferMode {
        match self.payload {
            TransferPayload::Texture { .. } => TransferMode::Texture,
            TransferPayload::Value { .. } => TransferMode::Value,
        }
    }

    /// Node driving the source attribute, for texture entries
    pub fn source_node(&self) -> Option<&NodeRef> {
        match &self.payload {
            TransferPayload::Texture { source, .. } => Some(&source.node),
            TransferPayload::Value { .. } => None,
        }
    }

    /// Source plug on the material, `shader.attr`
    pub fn source_plug(&self) -> Plug {
        self.source_shader.plug(self.slot.source_attr())
    }
}

/// List the transfers from `shader` onto a material of `target_kind`, in
/// slot declaration order. Absent attributes and uninteresting literals
/// are left out.
pub fn plan<A>(adapter: &A, slots: &SlotMap, shader: &NodeRef, target_kind: MaterialKind) -> Vec<TransferEntry>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut entries = Vec::new();
    if !adapter.node_exists(shader) {
        tracing::warn!("Cannot plan from missing material '{}'", shader);
        return entries;
    }

    for (slot, target) in slots.targets_for(target_kind) {
        if !adapter.attribute_exists(shader, slot.source_attr()) {
            continue;
        }
        let plug = shader.plug(slot.source_attr());

        let payload = if let Some(source) = adapter.list_incoming(&plug) {
            let leaf = find_leaf_sampler(adapter, &source.node);
            TransferPayload::Texture { source, leaf }
        } else {
            if !slot.carries_literal() {
                continue;
            }
            let Ok(value) = adapter.get_literal(&plug) else {
                continue;
            };
            if slot.is_default_literal(&value) {
                continue;
            }
            TransferPayload::Value { value }
        };

        entries.push(TransferEntry {
            source_shader: shader.clone(),
            slot,
            payload,
            destination: target.destination.clone(),
            preferred_output: target.preferred_output.clone(),
            target_kind,
        });
    }

    tracing::debug!("Planned {} entries from '{}' onto {}", entries.len(), shader, target_kind);
    entries
}

/// Nearest leaf sampler at or upstream of `node`, depth first in the host's
/// attribute order
pub fn find_leaf_sampler<A>(adapter: &A, node: &NodeRef) -> Option<LeafSampler>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut visited = HashSet::new();
    find_leaf_inner(adapter, node, &mut visited)
}

fn find_leaf_inner<A>(adapter: &A, node: &NodeRef, visited: &mut HashSet<NodeRef>) -> Option<LeafSampler>
where
    A: SceneGraphAdapter + ?Sized,
{
    if !visited.insert(node.clone()) {
        return None;
    }
    if adapter.node_kind(node).is_ok_and(|kind| kind == LEAF_SAMPLER) {
        let path = adapter
            .get_literal(&node.plug(SAMPLER_PATH_ATTR))
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        return Some(LeafSampler {
            node: node.clone(),
            path,
        });
    }
    adapter
        .list_upstream(node)
        .into_iter()
        .find_map(|(source, _)| find_leaf_inner(adapter, &source.node, visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::create_default_slot_map;
    use crate::testing::{bump_chain, scenario_a, scene};
    use nodeflow_graph::{SceneNode, UtilityKind};

    #[test]
    fn test_scenario_a_plan() {
        let mut graph = scene();
        let fixture = scenario_a(&mut graph, "wood.png");
        let entries = plan(
            &graph,
            &create_default_slot_map(),
            &fixture.material,
            MaterialKind::RedshiftStandardMaterial,
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].slot, SemanticSlot::BaseColor);
        assert_eq!(entries[0].mode(), TransferMode::Texture);
        assert_eq!(entries[0].destination.to_string(), "base_color");
        assert_eq!(
            entries[0].payload,
            TransferPayload::Texture {
                source: fixture.file.plug("outColor"),
                leaf: Some(LeafSampler {
                    node: fixture.file.clone(),
                    path: "wood.png".to_string(),
                }),
            }
        );

        assert_eq!(entries[1].slot, SemanticSlot::SpecularRoughness);
        assert_eq!(entries[1].destination.to_string(), "refl_roughness");
        assert_eq!(
            entries[1].payload,
            TransferPayload::Value {
                value: AttrValue::Float(0.35)
            }
        );
    }

    #[test]
    fn test_zero_weight_filtered() {
        let mut graph = scene();
        let zero = graph.insert_node(
            SceneNode::new("M0", MaterialKind::AiStandardSurface)
                .with_value("emission", AttrValue::Float(0.0)),
        );
        let lit = graph.insert_node(
            SceneNode::new("M3", MaterialKind::AiStandardSurface)
                .with_value("emission", AttrValue::Float(0.3)),
        );
        let slots = create_default_slot_map();

        assert!(plan(&graph, &slots, &zero, MaterialKind::RedshiftStandardMaterial).is_empty());

        let entries = plan(&graph, &slots, &lit, MaterialKind::RedshiftStandardMaterial);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mode(), TransferMode::Value);
        assert_eq!(entries[0].destination.to_string(), "emission_weight");
    }

    #[test]
    fn test_black_colour_filtered_except_base() {
        let mut graph = scene();
        let shader = graph.insert_node(
            SceneNode::new("M1", MaterialKind::AiStandardSurface)
                .with_value("baseColor", AttrValue::Color([0.0, 0.0, 0.0]))
                .with_value("emissionColor", AttrValue::Color([0.0, 0.0, 0.0])),
        );
        let entries = plan(
            &graph,
            &create_default_slot_map(),
            &shader,
            MaterialKind::RedshiftStandardMaterial,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slot, SemanticSlot::BaseColor);
    }

    #[test]
    fn test_connection_only_slots_skip_literals() {
        let mut graph = scene();
        let shader = graph.spawn(MaterialKind::Lambert, "lambert1").unwrap();
        let entries = plan(&graph, &create_default_slot_map(), &shader, MaterialKind::Blinn);

        // Only the diffuse colour carries over; normalCamera never moves as a value
        assert!(entries.iter().all(|e| e.mode() == TransferMode::Value));
        assert!(entries.iter().all(|e| e.slot != SemanticSlot::NormalCamera));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_leaf_sampler_found_through_chain() {
        let mut graph = scene();
        let chain = bump_chain(&mut graph);
        let leaf = find_leaf_sampler(&graph, &chain.bump).unwrap();
        assert_eq!(leaf.node, chain.file);
        assert_eq!(leaf.path, "height.exr");

        let lonely = graph.spawn(UtilityKind::Noise, "noise1").unwrap();
        assert!(find_leaf_sampler(&graph, &lonely).is_none());
    }

    #[test]
    fn test_missing_material_plans_nothing() {
        let graph = scene();
        assert!(plan(
            &graph,
            &create_default_slot_map(),
            &NodeRef::from("gone"),
            MaterialKind::AiStandardSurface
        )
        .is_empty());
    }
}
