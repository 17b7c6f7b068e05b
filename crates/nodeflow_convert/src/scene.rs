// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene queries built on the adapter: material scans, consumer groups and
//! instancer networks.

use crate::schema::SUPPORTED_SOURCES;
use indexmap::IndexSet;
use nodeflow_graph::{NodeKind, NodeRef, SceneGraphAdapter};
use std::collections::VecDeque;

/// Group attribute holding the surface material
pub const SURFACE_ATTR: &str = "surfaceShader";

/// Group attribute holding the displacement network
pub const DISPLACEMENT_ATTR: &str = "displacementShader";

/// Every material in the scene that can be converted from
pub fn scene_materials<A>(adapter: &A) -> Vec<NodeRef>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut found = IndexSet::new();
    for kind in SUPPORTED_SOURCES {
        found.extend(adapter.nodes_of_kind(&NodeKind::Material(*kind)));
    }
    found.into_iter().collect()
}

/// Materials bound to a geometry member through its consumer groups
pub fn materials_of_member<A>(adapter: &A, member: &NodeRef) -> Vec<NodeRef>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut found = IndexSet::new();
    for group in adapter.member_groups(member) {
        if let Some(source) = adapter.list_incoming(&group.plug(SURFACE_ATTR)) {
            found.insert(source.node);
        }
    }
    found.into_iter().collect()
}

/// Consumer groups a material feeds
pub fn shading_groups_of<A>(adapter: &A, material: &NodeRef) -> Vec<NodeRef>
where
    A: SceneGraphAdapter + ?Sized,
{
    adapter
        .list_outgoing_consumers(material)
        .into_iter()
        .filter(|node| adapter.node_kind(node).is_ok_and(|kind| kind == NodeKind::ShadingGroup))
        .collect()
}

/// Nodes of `kind` anywhere upstream of `root`, nearest first
pub fn upstream_of_kind<A>(adapter: &A, root: &NodeRef, kind: &NodeKind) -> Vec<NodeRef>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut found = Vec::new();
    let mut visited = IndexSet::new();
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(node) = queue.pop_front() {
        if !visited.insert(node.clone()) {
            continue;
        }
        if node != *root && adapter.node_kind(&node).is_ok_and(|k| k == *kind) {
            found.push(node.clone());
        }
        for (source, _) in adapter.list_upstream(&node) {
            queue.push_back(source.node);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assigned_material, scene};
    use nodeflow_graph::{MaterialKind, UtilityKind};

    #[test]
    fn test_scene_materials_lists_supported_kinds() {
        let mut graph = scene();
        let lambert = graph.spawn(MaterialKind::Lambert, "lambert1").unwrap();
        let ai = graph.spawn(MaterialKind::AiStandardSurface, "ai1").unwrap();
        graph.spawn(MaterialKind::AiFlat, "flat1").unwrap();
        graph.spawn(UtilityKind::File, "file1").unwrap();

        let found = scene_materials(&graph);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&lambert));
        assert!(found.contains(&ai));
    }

    #[test]
    fn test_member_and_group_lookup() {
        let mut graph = scene();
        let fixture = assigned_material(&mut graph);

        assert_eq!(materials_of_member(&graph, &fixture.mesh), vec![fixture.material.clone()]);
        assert_eq!(shading_groups_of(&graph, &fixture.material), vec![fixture.group]);
        assert!(materials_of_member(&graph, &NodeRef::from("nothing")).is_empty());
    }

    #[test]
    fn test_upstream_of_kind() {
        let mut graph = scene();
        let waiter = graph.spawn(UtilityKind::MashWaiter, "MASH1").unwrap();
        let color = graph.spawn(UtilityKind::MashColor, "MASH1_Color").unwrap();
        let distribute = graph.spawn(UtilityKind::MashDistribute, "MASH1_Distribute").unwrap();
        graph
            .connect(&distribute.plug("outputPoints"), &color.plug("inputPoints"))
            .unwrap();
        graph
            .connect(&color.plug("outputPoints"), &waiter.plug("inputPoints"))
            .unwrap();

        let kind = NodeKind::Utility(UtilityKind::MashDistribute);
        assert_eq!(upstream_of_kind(&graph, &waiter, &kind), vec![distribute]);
        assert!(upstream_of_kind(&graph, &color, &NodeKind::Utility(UtilityKind::MashColor)).is_empty());
    }
}
