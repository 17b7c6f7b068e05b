// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node kind vocabulary.
//!
//! Hosts identify node kinds by string tags. Known tags are parsed into
//! closed enums so the catalogs can match on them; anything else survives
//! as [`NodeKind::Other`] and is treated as schema-agnostic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines a closed enum whose variants map one-to-one onto host tags.
macro_rules! host_tags {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$( $name::$variant, )*];

            /// Host tag for this kind
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $tag, )*
                }
            }

            /// Parse a host tag
            pub fn parse(tag: &str) -> Option<Self> {
                match tag {
                    $( $tag => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let tag = String::deserialize(deserializer)?;
                Self::parse(&tag).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown {} tag: {tag}", stringify!($name)))
                })
            }
        }
    };
}

host_tags! {
    /// Surface material kinds the engine can read from or write to.
    pub enum MaterialKind {
        /// Redshift standard material
        RedshiftStandardMaterial => "RedshiftStandardMaterial",
        /// Redshift architectural material
        RedshiftArchitectural => "RedshiftArchitectural",
        /// Redshift car paint
        RedshiftCarPaint => "RedshiftCarPaint",
        /// Redshift hair
        RedshiftHair => "RedshiftHair",
        /// Redshift incandescent
        RedshiftIncandescent => "RedshiftIncandescent",
        /// Legacy Redshift material
        RedshiftMaterial => "RedshiftMaterial",
        /// Redshift material blender
        RedshiftMaterialBlender => "RedshiftMaterialBlender",
        /// Redshift matte shadow catcher
        RedshiftMatteShadowCatcher => "RedshiftMatteShadowCatcher",
        /// Redshift OSL surface shader
        RedshiftOslSurfaceShader => "RedshiftOSLSurfaceShader",
        /// Redshift `OpenPBR` material
        RedshiftOpenPbrMaterial => "RedshiftOpenPBRMaterial",
        /// Redshift principled hair
        RedshiftPrincipledHair => "RedshiftPrincipledHair",
        /// Redshift shader switch
        RedshiftShaderSwitch => "RedshiftShaderSwitch",
        /// Redshift skin
        RedshiftSkin => "RedshiftSkin",
        /// Redshift sprite
        RedshiftSprite => "RedshiftSprite",
        /// Redshift subsurface scatter
        RedshiftSubSurfaceScatter => "RedshiftSubSurfaceScatter",
        /// Redshift toon material
        RedshiftToonMaterial => "RedshiftToonMaterial",
        /// Arnold standard surface
        AiStandardSurface => "aiStandardSurface",
        /// Arnold flat
        AiFlat => "aiFlat",
        /// Arnold ambient occlusion
        AiAmbientOcclusion => "aiAmbientOcclusion",
        /// Arnold car paint
        AiCarPaint => "aiCarPaint",
        /// Arnold hair
        AiHair => "aiHair",
        /// Arnold layer shader
        AiLayerShader => "aiLayerShader",
        /// Arnold matte
        AiMatte => "aiMatte",
        /// Arnold mix shader
        AiMixShader => "aiMixShader",
        /// Arnold shadow matte
        AiShadowMatte => "aiShadowMatte",
        /// Arnold skin
        AiSkin => "aiSkin",
        /// Arnold toon
        AiToon => "aiToon",
        /// Arnold wireframe
        AiWireframe => "aiWireframe",
        /// Host standard surface
        StandardSurface => "standardSurface",
        /// Lambert
        Lambert => "lambert",
        /// Blinn
        Blinn => "blinn",
        /// Phong
        Phong => "phong",
        /// `PhongE`
        PhongE => "phongE",
        /// Surface shader
        SurfaceShader => "surfaceShader",
        /// Virtual instancer target; has no material node of its own
        Mash => "MASH",
    }
}

host_tags! {
    /// Texture, utility and instancer node kinds.
    pub enum UtilityKind {
        /// File texture sampler (the leaf of most chains)
        File => "file",
        /// 2D texture placement
        Place2dTexture => "place2dTexture",
        /// Host colour correct
        ColorCorrect => "colorCorrect",
        /// Remap value
        RemapValue => "remapValue",
        /// Remap colour
        RemapColor => "remapColor",
        /// Remap HSV
        RemapHsv => "remapHsv",
        /// Multiply/divide
        MultiplyDivide => "multiplyDivide",
        /// Clamp
        Clamp => "clamp",
        /// Reverse
        Reverse => "reverse",
        /// Blend colours
        BlendColors => "blendColors",
        /// Condition
        Condition => "condition",
        /// Ramp
        Ramp => "ramp",
        /// Noise
        Noise => "noise",
        /// Fractal
        Fractal => "fractal",
        /// Stencil
        Stencil => "stencil",
        /// Layered texture
        LayeredTexture => "layeredTexture",
        /// Gamma correct
        GammaCorrect => "gammaCorrect",
        /// HSV to RGB
        HsvToRgb => "hsvToRgb",
        /// RGB to HSV
        RgbToHsv => "rgbToHsv",
        /// Unit conversion
        UnitConversion => "unitConversion",
        /// Luminance
        Luminance => "luminance",
        /// Height bump
        Bump2d => "bump2d",
        /// Arnold tangent-space normal map
        AiNormalMap => "aiNormalMap",
        /// Redshift bump/normal map
        RedshiftBumpMap => "RedshiftBumpMap",
        /// Arnold colour correct
        AiColorCorrect => "aiColorCorrect",
        /// Redshift colour correct
        RsColorCorrect => "rsColorCorrect",
        /// Arnold range
        AiRange => "aiRange",
        /// Redshift range
        RsRange => "rsRange",
        /// Arnold multiply
        AiMultiply => "aiMultiply",
        /// Redshift colour layer
        RsColorLayer => "rsColorLayer",
        /// Instancer colour node
        MashColor => "MASH_Color",
        /// Instancer distribute node
        MashDistribute => "MASH_Distribute",
        /// Instancer root ("waiter") node
        MashWaiter => "MASH_Waiter",
    }
}

/// Kind of a node in the host graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// A surface material
    Material(MaterialKind),
    /// A texture or utility node
    Utility(UtilityKind),
    /// A consumer group binding geometry to a material
    ShadingGroup,
    /// Any host kind outside the known vocabulary
    Other(String),
}

impl NodeKind {
    /// Host tag used for shading groups
    pub const SHADING_GROUP_TAG: &'static str = "shadingEngine";

    /// Parse a host tag. Unknown tags become [`NodeKind::Other`].
    pub fn parse(tag: &str) -> Self {
        if let Some(material) = MaterialKind::parse(tag) {
            Self::Material(material)
        } else if let Some(utility) = UtilityKind::parse(tag) {
            Self::Utility(utility)
        } else if tag == Self::SHADING_GROUP_TAG {
            Self::ShadingGroup
        } else {
            Self::Other(tag.to_string())
        }
    }

    /// Host tag for this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Material(kind) => kind.as_str(),
            Self::Utility(kind) => kind.as_str(),
            Self::ShadingGroup => Self::SHADING_GROUP_TAG,
            Self::Other(tag) => tag,
        }
    }

    /// The material kind, if this is a material
    pub fn material(&self) -> Option<MaterialKind> {
        match self {
            Self::Material(kind) => Some(*kind),
            _ => None,
        }
    }

    /// The utility kind, if this is a utility
    pub fn utility(&self) -> Option<UtilityKind> {
        match self {
            Self::Utility(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<MaterialKind> for NodeKind {
    fn from(kind: MaterialKind) -> Self {
        Self::Material(kind)
    }
}

impl From<UtilityKind> for NodeKind {
    fn from(kind: UtilityKind) -> Self {
        Self::Utility(kind)
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(NodeKind::parse("file"), NodeKind::Utility(UtilityKind::File));
        assert_eq!(
            NodeKind::parse("aiStandardSurface"),
            NodeKind::Material(MaterialKind::AiStandardSurface)
        );
        assert_eq!(NodeKind::parse("shadingEngine"), NodeKind::ShadingGroup);
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        let kind = NodeKind::parse("myStudioTriplanar");
        assert_eq!(kind, NodeKind::Other("myStudioTriplanar".to_string()));
        assert_eq!(kind.as_str(), "myStudioTriplanar");
        assert!(kind.material().is_none());
    }

    #[test]
    fn test_tags_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in MaterialKind::ALL {
            assert!(seen.insert(kind.as_str()));
        }
        for kind in UtilityKind::ALL {
            assert!(seen.insert(kind.as_str()));
        }
    }

    #[test]
    fn test_serde_uses_host_tag() {
        let kind = NodeKind::Utility(UtilityKind::RedshiftBumpMap);
        let text = ron::to_string(&kind).unwrap();
        assert_eq!(text, "\"RedshiftBumpMap\"");
        let loaded: NodeKind = ron::from_str(&text).unwrap();
        assert_eq!(loaded, kind);

        let material: MaterialKind = ron::from_str("\"RedshiftOpenPBRMaterial\"").unwrap();
        assert_eq!(material, MaterialKind::RedshiftOpenPbrMaterial);
        assert!(ron::from_str::<MaterialKind>("\"notAMaterial\"").is_err());
    }
}
