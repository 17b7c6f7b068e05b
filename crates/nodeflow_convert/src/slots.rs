// SPDX-License-Identifier: MIT OR Apache-2.0
//! Semantic slot map.
//!
//! A semantic slot is a material channel named by the source attribute
//! that carries it (`baseColor`, `specularRoughness`, ...). For every
//! target material kind the map gives the destination attribute and the
//! output to read when the slot is fed straight from a leaf sampler.
//!
//! Declaration order matters: the planner walks slots in this order, and
//! when two slots land on the same destination the later one wins.

use crate::catalog::{CatalogError, CATALOG_FORMAT_VERSION};
use indexmap::IndexMap;
use nodeflow_graph::{AttrValue, MaterialKind, NodeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An abstract material channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticSlot {
    /// Base colour
    BaseColor,
    /// Diffuse colour of legacy materials
    Color,
    /// Specular roughness
    SpecularRoughness,
    /// Blinn highlight size
    Eccentricity,
    /// Phong E roughness
    Roughness,
    /// Metalness
    Metalness,
    /// Specular colour
    SpecularColor,
    /// Emission colour
    EmissionColor,
    /// Legacy emission colour
    Incandescence,
    /// Opacity
    Opacity,
    /// Legacy transparency
    Transparency,
    /// Bump / normal input
    NormalCamera,
    /// Displacement, wired on the consumer group
    DisplacementShader,
    /// Subsurface colour
    SubsurfaceColor,
    /// Coat colour
    CoatColor,
    /// Coat roughness
    CoatRoughness,
    /// Base weight
    Base,
    /// Specular weight
    Specular,
    /// Emission weight
    Emission,
    /// Subsurface weight
    Subsurface,
    /// Coat weight
    Coat,
}

impl SemanticSlot {
    /// Every slot, in declaration order
    pub const ALL: &'static [SemanticSlot] = &[
        Self::BaseColor,
        Self::Color,
        Self::SpecularRoughness,
        Self::Eccentricity,
        Self::Roughness,
        Self::Metalness,
        Self::SpecularColor,
        Self::EmissionColor,
        Self::Incandescence,
        Self::Opacity,
        Self::Transparency,
        Self::NormalCamera,
        Self::DisplacementShader,
        Self::SubsurfaceColor,
        Self::CoatColor,
        Self::CoatRoughness,
        Self::Base,
        Self::Specular,
        Self::Emission,
        Self::Subsurface,
        Self::Coat,
    ];

    /// Attribute on the source material that carries this slot
    pub fn source_attr(&self) -> &'static str {
        match self {
            Self::BaseColor => "baseColor",
            Self::Color => "color",
            Self::SpecularRoughness => "specularRoughness",
            Self::Eccentricity => "eccentricity",
            Self::Roughness => "roughness",
            Self::Metalness => "metalness",
            Self::SpecularColor => "specularColor",
            Self::EmissionColor => "emissionColor",
            Self::Incandescence => "incandescence",
            Self::Opacity => "opacity",
            Self::Transparency => "transparency",
            Self::NormalCamera => "normalCamera",
            Self::DisplacementShader => "displacementShader",
            Self::SubsurfaceColor => "subsurfaceColor",
            Self::CoatColor => "coatColor",
            Self::CoatRoughness => "coatRoughness",
            Self::Base => "base",
            Self::Specular => "specular",
            Self::Emission => "emission",
            Self::Subsurface => "subsurface",
            Self::Coat => "coat",
        }
    }

    /// Whether an unconnected slot transfers its literal value
    pub fn carries_literal(&self) -> bool {
        !matches!(
            self,
            Self::Roughness
                | Self::Transparency
                | Self::NormalCamera
                | Self::DisplacementShader
                | Self::SubsurfaceColor
                | Self::CoatColor
        )
    }

    /// Whether pure black is a meaningful value for this slot
    pub fn keeps_black(&self) -> bool {
        matches!(self, Self::BaseColor | Self::Color | Self::SpecularColor)
    }

    /// Whether a weight of zero is dropped for this slot
    pub fn skips_zero(&self) -> bool {
        matches!(self, Self::Emission | Self::Subsurface | Self::Coat)
    }

    /// Whether a literal is an uninteresting default that is not worth
    /// transferring
    pub fn is_default_literal(&self, value: &AttrValue) -> bool {
        match value {
            AttrValue::Color(rgb) | AttrValue::Vector(rgb) => {
                *rgb == [0.0, 0.0, 0.0] && !self.keeps_black()
            }
            AttrValue::Float(v) => *v == 0.0 && self.skips_zero(),
            _ => false,
        }
    }
}

impl fmt::Display for SemanticSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_attr())
    }
}

/// Instancer component a virtual destination points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstancerComponent {
    /// Per-instance colour node
    Color,
    /// Distribution node
    Distribute,
}

impl InstancerComponent {
    /// Prefix used in destination paths
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Color => "MASH_Color",
            Self::Distribute => "MASH_Distribute",
        }
    }
}

/// Where a slot lands on the target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DestinationAttr {
    /// A plain attribute on the target material
    Attribute(String),
    /// The displacement input of the target's consumer group
    Displacement,
    /// An attribute on a node of the target instancer network
    Instancer {
        /// Which instancer node
        component: InstancerComponent,
        /// Attribute on that node
        attr: String,
    },
}

impl DestinationAttr {
    /// Path used for the displacement indirection
    pub const DISPLACEMENT: &'static str = "_displacement_";

    /// Parse a destination path
    pub fn parse(path: &str) -> Self {
        if path == Self::DISPLACEMENT {
            return Self::Displacement;
        }
        for component in [InstancerComponent::Color, InstancerComponent::Distribute] {
            if let Some(attr) = path
                .strip_prefix(component.prefix())
                .and_then(|rest| rest.strip_prefix('.'))
            {
                return Self::Instancer {
                    component,
                    attr: attr.to_string(),
                };
            }
        }
        Self::Attribute(path.to_string())
    }

    /// Whether this is a plain attribute on the target node
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Attribute(_))
    }
}

impl fmt::Display for DestinationAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(attr) => f.write_str(attr),
            Self::Displacement => f.write_str(Self::DISPLACEMENT),
            Self::Instancer { component, attr } => write!(f, "{}.{attr}", component.prefix()),
        }
    }
}

impl From<String> for DestinationAttr {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&str> for DestinationAttr {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<DestinationAttr> for String {
    fn from(destination: DestinationAttr) -> Self {
        destination.to_string()
    }
}

/// Destination of one slot on one target material kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotTarget {
    /// Destination attribute
    pub destination: DestinationAttr,
    /// Output to read when the slot is fed directly by a leaf sampler
    pub preferred_output: String,
}

/// Key two plan entries collide on. Entries written into one explicit
/// target share the key space; otherwise each source material gets its
/// own target and only collides with itself.
pub fn collision_key(
    source_shader: &NodeRef,
    destination: &DestinationAttr,
    explicit_target: bool,
) -> (Option<NodeRef>, String) {
    let owner = (!explicit_target).then(|| source_shader.clone());
    (owner, destination.to_string())
}

/// Slot -> target material kind -> destination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotMap {
    slots: IndexMap<SemanticSlot, IndexMap<MaterialKind, SlotTarget>>,
}

impl SlotMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a slot for one target kind, replacing any previous mapping
    pub fn insert(
        &mut self,
        slot: SemanticSlot,
        kind: MaterialKind,
        destination: impl Into<DestinationAttr>,
        preferred_output: impl Into<String>,
    ) {
        self.slots.entry(slot).or_default().insert(
            kind,
            SlotTarget {
                destination: destination.into(),
                preferred_output: preferred_output.into(),
            },
        );
    }

    /// Destination of a slot on a target kind
    pub fn get(&self, slot: SemanticSlot, kind: MaterialKind) -> Option<&SlotTarget> {
        self.slots.get(&slot).and_then(|targets| targets.get(&kind))
    }

    /// Every slot mapped for a target kind, in declaration order
    pub fn targets_for(&self, kind: MaterialKind) -> impl Iterator<Item = (SemanticSlot, &SlotTarget)> {
        self.slots
            .iter()
            .filter_map(move |(slot, targets)| targets.get(&kind).map(|target| (*slot, target)))
    }

    /// Whether any slot maps onto the target kind
    pub fn supports(&self, kind: MaterialKind) -> bool {
        self.targets_for(kind).next().is_some()
    }

    /// Number of declared slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Serialize to a pretty RON string
    pub fn to_ron(&self) -> Result<String, CatalogError> {
        let document = SlotMapDocument {
            version: CATALOG_FORMAT_VERSION,
            slots: self.clone(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        Ok(ron::ser::to_string_pretty(&document, pretty)?)
    }

    /// Load from a RON string
    pub fn from_ron(text: &str) -> Result<Self, CatalogError> {
        let document: SlotMapDocument = ron::from_str(text)?;
        if document.version != CATALOG_FORMAT_VERSION {
            return Err(CatalogError::UnsupportedVersion(document.version));
        }
        Ok(document.slots)
    }
}

#[derive(Serialize, Deserialize)]
struct SlotMapDocument {
    version: u32,
    slots: SlotMap,
}

/// Create the built-in slot map
pub fn create_default_slot_map() -> SlotMap {
    use MaterialKind as M;
    use SemanticSlot as S;

    const COLOR: &str = "outColor";
    const ALPHA: &str = "outAlpha";

    let table: &[(SemanticSlot, &[(MaterialKind, &str, &str)])] = &[
        (
            S::BaseColor,
            &[
                (M::RedshiftStandardMaterial, "base_color", COLOR),
                (M::RedshiftMaterial, "diffuse_color", COLOR),
                (M::RedshiftArchitectural, "diffuse", COLOR),
                (M::RedshiftCarPaint, "base_color", COLOR),
                (M::RedshiftSkin, "overall_color", COLOR),
                (M::RedshiftToonMaterial, "base_color", COLOR),
                (M::RedshiftOpenPbrMaterial, "base_color", COLOR),
                (M::AiStandardSurface, "baseColor", COLOR),
                (M::AiFlat, "color", COLOR),
                (M::AiToon, "base_color", COLOR),
                (M::StandardSurface, "baseColor", COLOR),
                (M::Lambert, "color", COLOR),
                (M::Blinn, "color", COLOR),
                (M::Phong, "color", COLOR),
                (M::PhongE, "color", COLOR),
                (M::SurfaceShader, "outColor", COLOR),
                (M::Mash, "MASH_Color.texture", COLOR),
            ],
        ),
        (
            S::Color,
            &[
                (M::RedshiftStandardMaterial, "base_color", COLOR),
                (M::RedshiftMaterial, "diffuse_color", COLOR),
                (M::AiStandardSurface, "baseColor", COLOR),
                (M::StandardSurface, "baseColor", COLOR),
                (M::Lambert, "color", COLOR),
                (M::Blinn, "color", COLOR),
                (M::Phong, "color", COLOR),
                (M::PhongE, "color", COLOR),
                (M::Mash, "MASH_Color.texture", COLOR),
            ],
        ),
        (
            S::SpecularRoughness,
            &[
                (M::RedshiftStandardMaterial, "refl_roughness", ALPHA),
                (M::RedshiftMaterial, "refl_roughness", ALPHA),
                (M::RedshiftOpenPbrMaterial, "specular_roughness", ALPHA),
                (M::RedshiftToonMaterial, "refl_roughness", ALPHA),
                (M::AiStandardSurface, "specularRoughness", ALPHA),
                (M::StandardSurface, "specularRoughness", ALPHA),
                (M::Blinn, "eccentricity", ALPHA),
                (M::Mash, "MASH_Distribute.strengthMap", ALPHA),
            ],
        ),
        (
            S::Eccentricity,
            &[
                (M::RedshiftStandardMaterial, "refl_roughness", ALPHA),
                (M::AiStandardSurface, "specularRoughness", ALPHA),
                (M::StandardSurface, "specularRoughness", ALPHA),
            ],
        ),
        (
            S::Roughness,
            &[
                (M::RedshiftStandardMaterial, "refl_roughness", ALPHA),
                (M::AiStandardSurface, "specularRoughness", ALPHA),
                (M::StandardSurface, "specularRoughness", ALPHA),
            ],
        ),
        (
            S::Metalness,
            &[
                (M::RedshiftStandardMaterial, "metalness", ALPHA),
                (M::RedshiftOpenPbrMaterial, "metalness", ALPHA),
                (M::AiStandardSurface, "metalness", ALPHA),
                (M::StandardSurface, "metalness", ALPHA),
                (M::Mash, "MASH_Distribute.strengthMap", ALPHA),
            ],
        ),
        (
            S::SpecularColor,
            &[
                (M::RedshiftStandardMaterial, "refl_color", COLOR),
                (M::RedshiftMaterial, "refl_color", COLOR),
                (M::AiStandardSurface, "specularColor", COLOR),
                (M::StandardSurface, "specularColor", COLOR),
                (M::Blinn, "specularColor", COLOR),
                (M::Phong, "specularColor", COLOR),
                (M::PhongE, "specularColor", COLOR),
            ],
        ),
        (
            S::EmissionColor,
            &[
                (M::RedshiftStandardMaterial, "emission_color", COLOR),
                (M::RedshiftIncandescent, "color", COLOR),
                (M::RedshiftOpenPbrMaterial, "emission_color", COLOR),
                (M::AiStandardSurface, "emissionColor", COLOR),
                (M::StandardSurface, "emissionColor", COLOR),
                (M::Mash, "MASH_Color.texture", COLOR),
            ],
        ),
        (
            S::Incandescence,
            &[
                (M::RedshiftStandardMaterial, "emission_color", COLOR),
                (M::RedshiftIncandescent, "color", COLOR),
                (M::AiStandardSurface, "emissionColor", COLOR),
                (M::StandardSurface, "emissionColor", COLOR),
            ],
        ),
        (
            S::Opacity,
            &[
                (M::RedshiftStandardMaterial, "opacity_color", COLOR),
                (M::RedshiftMaterial, "opacity_color", COLOR),
                (M::RedshiftSprite, "opacity_color", COLOR),
                (M::AiStandardSurface, "opacity", COLOR),
                (M::StandardSurface, "opacity", COLOR),
                (M::Mash, "MASH_Distribute.strengthMap", ALPHA),
            ],
        ),
        (
            S::Transparency,
            &[
                (M::RedshiftStandardMaterial, "opacity_color", COLOR),
                (M::AiStandardSurface, "opacity", COLOR),
                (M::StandardSurface, "opacity", COLOR),
                (M::Mash, "MASH_Distribute.strengthMap", ALPHA),
            ],
        ),
        (
            S::NormalCamera,
            &[
                (M::RedshiftStandardMaterial, "bump_input", "out"),
                (M::RedshiftMaterial, "bump_input", "out"),
                (M::RedshiftOpenPbrMaterial, "bump_input", "out"),
                (M::RedshiftToonMaterial, "bump_input", "out"),
                (M::AiStandardSurface, "normalCamera", "outNormal"),
                (M::StandardSurface, "normalCamera", "outNormal"),
                (M::Blinn, "normalCamera", "outNormal"),
                (M::Phong, "normalCamera", "outNormal"),
                (M::Lambert, "normalCamera", "outNormal"),
            ],
        ),
        (
            S::DisplacementShader,
            &[
                (M::RedshiftStandardMaterial, DestinationAttr::DISPLACEMENT, COLOR),
                (M::RedshiftMaterial, DestinationAttr::DISPLACEMENT, COLOR),
                (M::AiStandardSurface, DestinationAttr::DISPLACEMENT, COLOR),
                (M::StandardSurface, DestinationAttr::DISPLACEMENT, COLOR),
            ],
        ),
        (
            S::SubsurfaceColor,
            &[
                (M::RedshiftStandardMaterial, "subsurface_color", COLOR),
                (M::RedshiftSkin, "shallow_color", COLOR),
                (M::AiStandardSurface, "subsurfaceColor", COLOR),
                (M::StandardSurface, "subsurfaceColor", COLOR),
            ],
        ),
        (
            S::CoatColor,
            &[
                (M::RedshiftStandardMaterial, "coat_color", COLOR),
                (M::AiStandardSurface, "coatColor", COLOR),
                (M::StandardSurface, "coatColor", COLOR),
            ],
        ),
        (
            S::CoatRoughness,
            &[
                (M::RedshiftStandardMaterial, "coat_roughness", ALPHA),
                (M::AiStandardSurface, "coatRoughness", ALPHA),
                (M::StandardSurface, "coatRoughness", ALPHA),
            ],
        ),
        (
            S::Base,
            &[
                (M::RedshiftStandardMaterial, "diffuse_weight", ALPHA),
                (M::AiStandardSurface, "base", ALPHA),
                (M::StandardSurface, "base", ALPHA),
            ],
        ),
        (
            S::Specular,
            &[
                (M::RedshiftStandardMaterial, "refl_weight", ALPHA),
                (M::AiStandardSurface, "specular", ALPHA),
                (M::StandardSurface, "specular", ALPHA),
            ],
        ),
        (
            S::Emission,
            &[
                (M::RedshiftStandardMaterial, "emission_weight", ALPHA),
                (M::AiStandardSurface, "emission", ALPHA),
                (M::StandardSurface, "emission", ALPHA),
            ],
        ),
        (
            S::Subsurface,
            &[
                (M::RedshiftStandardMaterial, "subsurface_weight", ALPHA),
                (M::AiStandardSurface, "subsurface", ALPHA),
                (M::StandardSurface, "subsurface", ALPHA),
            ],
        ),
        (
            S::Coat,
            &[
                (M::RedshiftStandardMaterial, "coat_weight", ALPHA),
                (M::AiStandardSurface, "coat", ALPHA),
                (M::StandardSurface, "coat", ALPHA),
            ],
        ),
    ];

    let mut map = SlotMap::new();
    for (slot, targets) in table {
        for (kind, destination, preferred) in *targets {
            map.insert(*slot, *kind, *destination, *preferred);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_parse() {
        assert_eq!(DestinationAttr::parse("_displacement_"), DestinationAttr::Displacement);
        assert_eq!(
            DestinationAttr::parse("MASH_Color.texture"),
            DestinationAttr::Instancer {
                component: InstancerComponent::Color,
                attr: "texture".to_string(),
            }
        );
        assert_eq!(
            DestinationAttr::parse("MASH_Distribute.strengthMap").to_string(),
            "MASH_Distribute.strengthMap"
        );
        assert_eq!(
            DestinationAttr::parse("base_color"),
            DestinationAttr::Attribute("base_color".to_string())
        );
    }

    #[test]
    fn test_declaration_order() {
        let map = create_default_slot_map();
        assert_eq!(map.len(), SemanticSlot::ALL.len());

        let slots: Vec<SemanticSlot> = map
            .targets_for(MaterialKind::RedshiftStandardMaterial)
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(slots.first(), Some(&SemanticSlot::BaseColor));
        assert_eq!(slots.last(), Some(&SemanticSlot::Coat));
        assert_eq!(slots.len(), SemanticSlot::ALL.len());

        let lambert: Vec<SemanticSlot> = map
            .targets_for(MaterialKind::Lambert)
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(
            lambert,
            vec![SemanticSlot::BaseColor, SemanticSlot::Color, SemanticSlot::NormalCamera]
        );
    }

    #[test]
    fn test_lookup() {
        let map = create_default_slot_map();
        let target = map
            .get(SemanticSlot::NormalCamera, MaterialKind::RedshiftStandardMaterial)
            .unwrap();
        assert_eq!(target.destination, DestinationAttr::Attribute("bump_input".into()));
        assert_eq!(target.preferred_output, "out");

        let blinn = map.get(SemanticSlot::SpecularRoughness, MaterialKind::Blinn).unwrap();
        assert_eq!(blinn.destination.to_string(), "eccentricity");

        assert!(map.get(SemanticSlot::Coat, MaterialKind::Lambert).is_none());
        assert!(map.supports(MaterialKind::Mash));
        assert!(!map.supports(MaterialKind::AiWireframe));
    }

    #[test]
    fn test_literal_filter() {
        let black = AttrValue::Color([0.0, 0.0, 0.0]);
        assert!(!SemanticSlot::BaseColor.is_default_literal(&black));
        assert!(!SemanticSlot::SpecularColor.is_default_literal(&black));
        assert!(SemanticSlot::EmissionColor.is_default_literal(&black));
        assert!(SemanticSlot::Opacity.is_default_literal(&black));

        assert!(SemanticSlot::Emission.is_default_literal(&AttrValue::Float(0.0)));
        assert!(!SemanticSlot::Emission.is_default_literal(&AttrValue::Float(0.3)));
        assert!(!SemanticSlot::Metalness.is_default_literal(&AttrValue::Float(0.0)));

        assert!(SemanticSlot::Base.carries_literal());
        assert!(!SemanticSlot::NormalCamera.carries_literal());
        assert!(!SemanticSlot::Transparency.carries_literal());
    }

    #[test]
    fn test_collision_key() {
        let a = NodeRef::from("a");
        let b = NodeRef::from("b");
        let dst = DestinationAttr::parse("base_color");
        assert_eq!(collision_key(&a, &dst, true), collision_key(&b, &dst, true));
        assert_ne!(collision_key(&a, &dst, false), collision_key(&b, &dst, false));
    }

    #[test]
    fn test_ron_round_trip() {
        let map = create_default_slot_map();
        let text = map.to_ron().unwrap();
        let loaded = SlotMap::from_ron(&text).unwrap();
        assert_eq!(loaded.len(), map.len());
        assert_eq!(
            loaded.get(SemanticSlot::BaseColor, MaterialKind::Mash),
            map.get(SemanticSlot::BaseColor, MaterialKind::Mash)
        );
    }
}
