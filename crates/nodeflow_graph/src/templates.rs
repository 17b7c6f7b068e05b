// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node templates.
//!
//! Describes the attribute layout of every kind in the known vocabulary,
//! matching what the respective host plugins expose, so the in-memory
//! store can create nodes the way a host would.

use crate::kind::{MaterialKind, NodeKind, UtilityKind};
use crate::node::{AttrSpec, KindRegistry, NodeTemplate};
use crate::plug::{AttrType, AttrValue};

fn color(name: &str, rgb: [f32; 3]) -> AttrSpec {
    AttrSpec::input(name, AttrType::Color).with_default(AttrValue::Color(rgb))
}

fn float(name: &str, value: f32) -> AttrSpec {
    AttrSpec::input(name, AttrType::Float).with_default(AttrValue::Float(value))
}

fn int(name: &str, value: i32) -> AttrSpec {
    AttrSpec::input(name, AttrType::Int).with_default(AttrValue::Int(value))
}

fn normal_input(name: &str) -> AttrSpec {
    AttrSpec::input(name, AttrType::Vector)
}

fn out_color() -> AttrSpec {
    AttrSpec::output("outColor", AttrType::Color)
}

fn out_alpha() -> AttrSpec {
    AttrSpec::output("outAlpha", AttrType::Float)
}

fn material(kind: MaterialKind, description: &str, mut attributes: Vec<AttrSpec>) -> NodeTemplate {
    // surfaceShader's outColor doubles as its input colour
    if kind != MaterialKind::SurfaceShader {
        attributes.push(out_color());
    }
    NodeTemplate {
        kind: NodeKind::Material(kind),
        description: description.to_string(),
        attributes,
    }
}

fn utility(kind: UtilityKind, description: &str, attributes: Vec<AttrSpec>) -> NodeTemplate {
    NodeTemplate {
        kind: NodeKind::Utility(kind),
        description: description.to_string(),
        attributes,
    }
}

/// Create the registry with every built-in template
pub fn create_default_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    register_materials(&mut registry);
    register_utilities(&mut registry);
    register_instancer(&mut registry);

    registry.register(NodeTemplate {
        kind: NodeKind::ShadingGroup,
        description: "Binds geometry members to a surface material".to_string(),
        attributes: vec![
            AttrSpec::input("surfaceShader", AttrType::Any),
            AttrSpec::input("displacementShader", AttrType::Any),
            AttrSpec::input("volumeShader", AttrType::Any),
        ],
    });

    registry
}

fn register_materials(registry: &mut KindRegistry) {
    use MaterialKind as M;

    // ========================================================================
    // Arnold / host standard surfaces
    // ========================================================================

    for (kind, base) in [(M::AiStandardSurface, 1.0), (M::StandardSurface, 0.8)] {
        registry.register(material(
            kind,
            "Physically based uber surface",
            vec![
                float("base", base),
                color("baseColor", [0.8, 0.8, 0.8]),
                float("metalness", 0.0),
                float("specular", 1.0),
                color("specularColor", [1.0, 1.0, 1.0]),
                float("specularRoughness", 0.2),
                float("subsurface", 0.0),
                color("subsurfaceColor", [1.0, 1.0, 1.0]),
                float("coat", 0.0),
                color("coatColor", [1.0, 1.0, 1.0]),
                float("coatRoughness", 0.1),
                float("emission", 0.0),
                color("emissionColor", [1.0, 1.0, 1.0]),
                color("opacity", [1.0, 1.0, 1.0]),
                normal_input("normalCamera"),
            ],
        ));
    }

    registry.register(material(M::AiFlat, "Unlit constant colour", vec![color("color", [1.0, 1.0, 1.0])]));
    registry.register(material(
        M::AiToon,
        "Cel-shaded surface",
        vec![color("base_color", [1.0, 1.0, 1.0])],
    ));
    for kind in [
        M::AiAmbientOcclusion,
        M::AiCarPaint,
        M::AiHair,
        M::AiLayerShader,
        M::AiMatte,
        M::AiMixShader,
        M::AiShadowMatte,
        M::AiSkin,
        M::AiWireframe,
    ] {
        registry.register(material(kind, "Arnold surface", Vec::new()));
    }

    // ========================================================================
    // Redshift
    // ========================================================================

    registry.register(material(
        M::RedshiftStandardMaterial,
        "Redshift physically based surface",
        vec![
            float("diffuse_weight", 1.0),
            color("base_color", [0.8, 0.8, 0.8]),
            float("metalness", 0.0),
            float("refl_weight", 1.0),
            color("refl_color", [1.0, 1.0, 1.0]),
            float("refl_roughness", 0.2),
            float("subsurface_weight", 0.0),
            color("subsurface_color", [1.0, 1.0, 1.0]),
            float("coat_weight", 0.0),
            color("coat_color", [1.0, 1.0, 1.0]),
            float("coat_roughness", 0.0),
            float("emission_weight", 0.0),
            color("emission_color", [0.0, 0.0, 0.0]),
            color("opacity_color", [1.0, 1.0, 1.0]),
            normal_input("bump_input"),
        ],
    ));
    registry.register(material(
        M::RedshiftMaterial,
        "Legacy Redshift surface",
        vec![
            color("diffuse_color", [0.5, 0.5, 0.5]),
            color("refl_color", [1.0, 1.0, 1.0]),
            float("refl_roughness", 0.0),
            color("opacity_color", [1.0, 1.0, 1.0]),
            normal_input("bump_input"),
        ],
    ));
    registry.register(material(
        M::RedshiftOpenPbrMaterial,
        "Redshift OpenPBR surface",
        vec![
            color("base_color", [0.8, 0.8, 0.8]),
            float("metalness", 0.0),
            float("specular_roughness", 0.3),
            color("emission_color", [1.0, 1.0, 1.0]),
            normal_input("bump_input"),
        ],
    ));
    registry.register(material(
        M::RedshiftToonMaterial,
        "Redshift toon surface",
        vec![
            color("base_color", [1.0, 1.0, 1.0]),
            float("refl_roughness", 0.0),
            normal_input("bump_input"),
        ],
    ));
    registry.register(material(
        M::RedshiftArchitectural,
        "Redshift architectural surface",
        vec![color("diffuse", [0.5, 0.5, 0.5])],
    ));
    registry.register(material(
        M::RedshiftCarPaint,
        "Redshift car paint",
        vec![color("base_color", [0.5, 0.0, 0.0])],
    ));
    registry.register(material(
        M::RedshiftSkin,
        "Redshift skin",
        vec![
            color("overall_color", [1.0, 1.0, 1.0]),
            color("shallow_color", [1.0, 0.9, 0.7]),
        ],
    ));
    registry.register(material(
        M::RedshiftIncandescent,
        "Redshift incandescent",
        vec![color("color", [1.0, 1.0, 1.0])],
    ));
    registry.register(material(
        M::RedshiftSprite,
        "Redshift sprite cut-out",
        vec![color("opacity_color", [1.0, 1.0, 1.0])],
    ));
    for kind in [
        M::RedshiftHair,
        M::RedshiftMaterialBlender,
        M::RedshiftMatteShadowCatcher,
        M::RedshiftOslSurfaceShader,
        M::RedshiftPrincipledHair,
        M::RedshiftShaderSwitch,
        M::RedshiftSubSurfaceScatter,
    ] {
        registry.register(material(kind, "Redshift surface", Vec::new()));
    }

    // ========================================================================
    // Host legacy materials
    // ========================================================================

    let lambert_base = || {
        vec![
            color("color", [0.5, 0.5, 0.5]),
            float("diffuse", 0.8),
            color("transparency", [0.0, 0.0, 0.0]),
            color("incandescence", [0.0, 0.0, 0.0]),
            normal_input("normalCamera"),
        ]
    };

    registry.register(material(M::Lambert, "Lambertian diffuse", lambert_base()));

    let mut blinn = lambert_base();
    blinn.push(color("specularColor", [0.5, 0.5, 0.5]));
    blinn.push(float("eccentricity", 0.3));
    registry.register(material(M::Blinn, "Blinn specular", blinn));

    let mut phong = lambert_base();
    phong.push(color("specularColor", [0.5, 0.5, 0.5]));
    phong.push(float("cosinePower", 20.0));
    registry.register(material(M::Phong, "Phong specular", phong));

    let mut phong_e = lambert_base();
    phong_e.push(color("specularColor", [0.5, 0.5, 0.5]));
    phong_e.push(float("roughness", 0.5));
    phong_e.push(float("highlightSize", 0.5));
    registry.register(material(M::PhongE, "Phong E specular", phong_e));

    registry.register(material(
        M::SurfaceShader,
        "Unlit surface",
        vec![color("outColor", [0.0, 0.0, 0.0])],
    ));
}

fn register_utilities(registry: &mut KindRegistry) {
    use UtilityKind as U;

    // ========================================================================
    // Samplers / placement
    // ========================================================================

    registry.register(utility(
        U::File,
        "Image file sampler",
        vec![
            AttrSpec::input("fileTextureName", AttrType::String)
                .with_default(AttrValue::String(String::new())),
            AttrSpec::input("uvCoord", AttrType::Vector),
            color("colorGain", [1.0, 1.0, 1.0]),
            out_color(),
            out_alpha(),
        ],
    ));
    registry.register(utility(
        U::Place2dTexture,
        "2D texture placement",
        vec![
            float("repeatU", 1.0),
            float("repeatV", 1.0),
            AttrSpec::output("outUV", AttrType::Vector),
        ],
    ));

    // ========================================================================
    // Bump / normal
    // ========================================================================

    registry.register(utility(
        U::Bump2d,
        "Height or tangent-space bump",
        vec![
            AttrSpec::input("bumpValue", AttrType::Float),
            float("bumpDepth", 1.0),
            int("bumpInterp", 0),
            AttrSpec::output("outNormal", AttrType::Vector),
        ],
    ));
    registry.register(utility(
        U::AiNormalMap,
        "Arnold tangent-space normal map",
        vec![
            AttrSpec::input("input", AttrType::Vector),
            float("strength", 1.0),
            AttrSpec::output("outValue", AttrType::Vector),
        ],
    ));
    registry.register(utility(
        U::RedshiftBumpMap,
        "Redshift height or normal bump",
        vec![
            AttrSpec::input("input", AttrType::Any),
            int("inputType", 0),
            float("scale", 1.0),
            AttrSpec::output("out", AttrType::Vector),
        ],
    ));

    // ========================================================================
    // Colour math
    // ========================================================================

    for (kind, description, input) in [
        (U::ColorCorrect, "Colour correct", "inColor"),
        (U::AiColorCorrect, "Arnold colour correct", "input"),
        (U::RsColorCorrect, "Redshift colour correct", "input"),
        (U::AiRange, "Arnold range", "input"),
        (U::RsRange, "Redshift range", "input"),
        (U::RemapColor, "Remap colour", "color"),
        (U::RemapHsv, "Remap HSV", "color"),
        (U::Clamp, "Clamp", "input"),
        (U::Reverse, "Reverse", "input"),
        (U::GammaCorrect, "Gamma correct", "value"),
        (U::HsvToRgb, "HSV to RGB", "inHsv"),
        (U::RgbToHsv, "RGB to HSV", "inRgb"),
        (U::Luminance, "Luminance", "value"),
        (U::UnitConversion, "Unit conversion", "input"),
    ] {
        registry.register(utility(
            kind,
            description,
            vec![AttrSpec::input(input, AttrType::Color), out_color(), out_alpha()],
        ));
    }

    registry.register(utility(
        U::RemapValue,
        "Remap scalar through a curve",
        vec![
            AttrSpec::input("inputValue", AttrType::Float),
            AttrSpec::output("outValue", AttrType::Float),
            out_color(),
        ],
    ));
    registry.register(utility(
        U::AiMultiply,
        "Arnold multiply",
        vec![
            AttrSpec::input("input1", AttrType::Color),
            color("input2", [1.0, 1.0, 1.0]),
            out_color(),
        ],
    ));
    registry.register(utility(
        U::RsColorLayer,
        "Redshift colour layer",
        vec![
            AttrSpec::input("input1", AttrType::Color),
            AttrSpec::input("layer1_color", AttrType::Color),
            out_color(),
        ],
    ));
    registry.register(utility(
        U::MultiplyDivide,
        "Multiply / divide",
        vec![
            AttrSpec::input("input1", AttrType::Vector),
            AttrSpec::input("input2", AttrType::Vector),
            int("operation", 1),
            AttrSpec::output("output", AttrType::Vector),
        ],
    ));
    registry.register(utility(
        U::BlendColors,
        "Blend two colours",
        vec![
            color("color1", [1.0, 0.0, 0.0]),
            color("color2", [0.0, 0.0, 1.0]),
            float("blender", 0.5),
            AttrSpec::output("output", AttrType::Color),
        ],
    ));
    registry.register(utility(
        U::Condition,
        "Condition",
        vec![
            float("firstTerm", 0.0),
            float("secondTerm", 0.0),
            color("colorIfTrue", [0.0, 0.0, 0.0]),
            color("colorIfFalse", [1.0, 1.0, 1.0]),
            AttrSpec::output("outColor", AttrType::Color),
        ],
    ));

    // ========================================================================
    // Procedural textures
    // ========================================================================

    for (kind, description) in [
        (U::Ramp, "Ramp"),
        (U::Noise, "Noise"),
        (U::Fractal, "Fractal"),
        (U::Stencil, "Stencil"),
        (U::LayeredTexture, "Layered texture"),
    ] {
        registry.register(utility(
            kind,
            description,
            vec![AttrSpec::input("uvCoord", AttrType::Vector), out_color(), out_alpha()],
        ));
    }
}

fn register_instancer(registry: &mut KindRegistry) {
    registry.register(utility(
        UtilityKind::MashWaiter,
        "Instancer network root",
        vec![
            AttrSpec::input("inputPoints", AttrType::Any),
            AttrSpec::output("outputPoints", AttrType::Any),
        ],
    ));
    registry.register(utility(
        UtilityKind::MashColor,
        "Per-instance colour",
        vec![
            AttrSpec::input("texture", AttrType::Any),
            int("mapType", 0),
            AttrSpec::input("inputPoints", AttrType::Any),
            AttrSpec::output("outputPoints", AttrType::Any),
        ],
    ));
    registry.register(utility(
        UtilityKind::MashDistribute,
        "Instance distribution",
        vec![
            AttrSpec::input("strengthMap", AttrType::Any),
            AttrSpec::input("useStrengthMap", AttrType::Bool)
                .with_default(AttrValue::Bool(false)),
            AttrSpec::output("outputPoints", AttrType::Any),
        ],
    ));
}
