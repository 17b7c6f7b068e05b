// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared scene fixtures for unit tests.

use nodeflow_graph::{
    create_default_registry, AttrType, AttrValue, MaterialKind, NodeKind, NodeRef, SceneGraph,
    SceneGraphAdapter, SceneNode, UtilityKind,
};

/// Empty scene with every known kind available
pub fn scene() -> SceneGraph {
    SceneGraph::new("test", create_default_registry())
}

/// A material with one sampled slot and one literal slot
pub struct TexturedMaterial {
    pub material: NodeRef,
    pub file: NodeRef,
}

/// `M1.baseColor` driven by sampler `F1` holding `path`, plus a literal
/// `specularRoughness` of 0.35
pub fn scenario_a(graph: &mut SceneGraph, path: &str) -> TexturedMaterial {
    let material = graph.insert_node(
        SceneNode::new("M1", MaterialKind::AiStandardSurface)
            .with_input("baseColor", AttrType::Color)
            .with_value("specularRoughness", AttrValue::Float(0.35))
            .with_output("outColor", AttrType::Color),
    );
    let file = sampler(graph, "F1", path);
    graph
        .connect(&file.plug("outColor"), &material.plug("baseColor"))
        .unwrap();
    TexturedMaterial { material, file }
}

/// Height map feeding a bump node feeding a material's normal input
pub struct BumpChain {
    pub file: NodeRef,
    pub bump: NodeRef,
    pub material: NodeRef,
}

/// `file1.outAlpha -> bump1.bumpValue`, `bump1.outNormal -> M2.normalCamera`
pub fn bump_chain(graph: &mut SceneGraph) -> BumpChain {
    let file = sampler(graph, "file1", "height.exr");
    let bump = graph.spawn(UtilityKind::Bump2d, "bump1").unwrap();
    let material = graph.insert_node(
        SceneNode::new("M2", MaterialKind::AiStandardSurface)
            .with_input("normalCamera", AttrType::Vector)
            .with_output("outColor", AttrType::Color),
    );
    graph
        .connect(&file.plug("outAlpha"), &bump.plug("bumpValue"))
        .unwrap();
    graph
        .connect(&bump.plug("outNormal"), &material.plug("normalCamera"))
        .unwrap();
    BumpChain { file, bump, material }
}

/// One colour correction fanning out into two slots of a material
pub struct SharedCorrection {
    pub file: NodeRef,
    pub correct: NodeRef,
    pub material: NodeRef,
}

/// `cc1.outColor` feeds both `M4.baseColor` and `M4.specularColor`
pub fn shared_color_correct(graph: &mut SceneGraph) -> SharedCorrection {
    let file = sampler(graph, "file4", "grade.png");
    let correct = graph.spawn(UtilityKind::AiColorCorrect, "cc1").unwrap();
    let material = graph.insert_node(
        SceneNode::new("M4", MaterialKind::AiStandardSurface)
            .with_input("baseColor", AttrType::Color)
            .with_input("specularColor", AttrType::Color)
            .with_output("outColor", AttrType::Color),
    );
    graph
        .connect(&file.plug("outColor"), &correct.plug("input"))
        .unwrap();
    graph
        .connect(&correct.plug("outColor"), &material.plug("baseColor"))
        .unwrap();
    graph
        .connect(&correct.plug("outColor"), &material.plug("specularColor"))
        .unwrap();
    SharedCorrection {
        file,
        correct,
        material,
    }
}

/// Material whose `baseColor` texture and `color` literal land on the same
/// destination for most targets
pub fn collision_material(graph: &mut SceneGraph) -> NodeRef {
    let file = sampler(graph, "F5", "albedo.png");
    let material = graph.insert_node(
        SceneNode::new("M5", MaterialKind::AiStandardSurface)
            .with_input("baseColor", AttrType::Color)
            .with_value("color", AttrValue::Color([0.1, 0.2, 0.3]))
            .with_output("outColor", AttrType::Color),
    );
    graph
        .connect(&file.plug("outColor"), &material.plug("baseColor"))
        .unwrap();
    material
}

/// A material bound to geometry through a consumer group
pub struct AssignedMaterial {
    pub material: NodeRef,
    pub group: NodeRef,
    pub mesh: NodeRef,
}

/// `shader1 -> shader1SG.surfaceShader`, with `pCube1` a member of the group
pub fn assigned_material(graph: &mut SceneGraph) -> AssignedMaterial {
    let material = graph.insert_node(
        SceneNode::new("shader1", MaterialKind::AiStandardSurface)
            .with_value("baseColor", AttrValue::Color([0.8, 0.2, 0.2]))
            .with_output("outColor", AttrType::Color),
    );
    let group = graph.spawn(NodeKind::ShadingGroup, "shader1SG").unwrap();
    let mesh = graph.insert_node(SceneNode::new("pCube1", "mesh"));
    graph
        .connect(&material.plug("outColor"), &group.plug("surfaceShader"))
        .unwrap();
    graph
        .assign_to_group(std::slice::from_ref(&mesh), &group)
        .unwrap();
    AssignedMaterial {
        material,
        group,
        mesh,
    }
}

/// A minimal instancer network
pub struct Instancer {
    pub waiter: NodeRef,
    pub distribute: NodeRef,
}

/// `MASH1_Distribute.outputPoints -> MASH1.inputPoints`
pub fn instancer(graph: &mut SceneGraph) -> Instancer {
    let waiter = graph.spawn(UtilityKind::MashWaiter, "MASH1").unwrap();
    let distribute = graph
        .spawn(UtilityKind::MashDistribute, "MASH1_Distribute")
        .unwrap();
    graph
        .connect(&distribute.plug("outputPoints"), &waiter.plug("inputPoints"))
        .unwrap();
    Instancer { waiter, distribute }
}

fn sampler(graph: &mut SceneGraph, name: &str, path: &str) -> NodeRef {
    let file = graph.spawn(UtilityKind::File, name).unwrap();
    graph
        .set_literal(
            &file.plug("fileTextureName"),
            AttrValue::String(path.to_string()),
        )
        .unwrap();
    file
}
