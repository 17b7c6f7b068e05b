// SPDX-License-Identifier: MIT OR Apache-2.0
//! Target schemas (renderer vocabularies) and their material kinds.

use indexmap::IndexMap;
use nodeflow_graph::{MaterialKind, NodeKind, NodeRef, SceneGraphAdapter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rendering schema that source graphs are translated into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Schema {
    /// Redshift
    Redshift,
    /// Arnold
    Arnold,
    /// The host's own shading nodes
    Maya,
    /// Instancer networks (virtual material target)
    Mash,
}

impl Schema {
    /// Every schema, in menu order
    pub const ALL: &'static [Schema] = &[Schema::Redshift, Schema::Arnold, Schema::Maya, Schema::Mash];

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redshift => "Redshift",
            Self::Arnold => "Arnold",
            Self::Maya => "Maya",
            Self::Mash => "MASH",
        }
    }

    /// Parse a display name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|schema| schema.as_str().eq_ignore_ascii_case(name))
    }

    /// Material kinds belonging to this schema, in menu order
    pub fn materials(&self) -> &'static [MaterialKind] {
        use MaterialKind as M;
        match self {
            Self::Redshift => &[
                M::RedshiftStandardMaterial,
                M::RedshiftArchitectural,
                M::RedshiftCarPaint,
                M::RedshiftHair,
                M::RedshiftIncandescent,
                M::RedshiftMaterial,
                M::RedshiftMaterialBlender,
                M::RedshiftMatteShadowCatcher,
                M::RedshiftOslSurfaceShader,
                M::RedshiftOpenPbrMaterial,
                M::RedshiftPrincipledHair,
                M::RedshiftShaderSwitch,
                M::RedshiftSkin,
                M::RedshiftSprite,
                M::RedshiftSubSurfaceScatter,
                M::RedshiftToonMaterial,
            ],
            Self::Arnold => &[
                M::AiStandardSurface,
                M::AiFlat,
                M::AiAmbientOcclusion,
                M::AiCarPaint,
                M::AiHair,
                M::AiLayerShader,
                M::AiMatte,
                M::AiMixShader,
                M::AiShadowMatte,
                M::AiSkin,
                M::AiToon,
                M::AiWireframe,
            ],
            Self::Maya => &[
                M::StandardSurface,
                M::Lambert,
                M::Blinn,
                M::Phong,
                M::PhongE,
                M::SurfaceShader,
            ],
            Self::Mash => &[M::Mash],
        }
    }

    /// Schema a material kind belongs to; unlisted kinds count as host kinds
    pub fn of(kind: MaterialKind) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|schema| schema.materials().contains(&kind))
            .unwrap_or(Self::Maya)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Material kinds the scene scan picks up as conversion sources
pub const SUPPORTED_SOURCES: &[MaterialKind] = &[
    MaterialKind::AiStandardSurface,
    MaterialKind::StandardSurface,
    MaterialKind::Lambert,
    MaterialKind::Blinn,
    MaterialKind::Phong,
    MaterialKind::PhongE,
    MaterialKind::RedshiftStandardMaterial,
    MaterialKind::RedshiftMaterial,
];

/// Suggested target for a source material kind
pub fn suggestion_for(kind: MaterialKind) -> Option<(Schema, MaterialKind)> {
    use MaterialKind as M;
    match kind {
        M::AiStandardSurface => Some((Schema::Redshift, M::RedshiftStandardMaterial)),
        M::StandardSurface | M::RedshiftStandardMaterial | M::RedshiftMaterial => {
            Some((Schema::Arnold, M::AiStandardSurface))
        }
        M::Lambert | M::Blinn | M::Phong | M::PhongE => Some((Schema::Maya, M::StandardSurface)),
        _ => None,
    }
}

/// Pick a target by majority vote over the source materials' kinds.
/// Ties go to the suggestion seen first.
pub fn suggest_target<A>(adapter: &A, shaders: &[NodeRef]) -> (Schema, MaterialKind)
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut votes: IndexMap<(Schema, MaterialKind), usize> = IndexMap::new();
    for shader in shaders {
        let Some(kind) = adapter.node_kind(shader).ok().and_then(|k| k.material()) else {
            continue;
        };
        if let Some(suggestion) = suggestion_for(kind) {
            *votes.entry(suggestion).or_default() += 1;
        }
    }

    let mut best: Option<((Schema, MaterialKind), usize)> = None;
    for (suggestion, count) in votes {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((suggestion, count));
        }
    }
    best.map_or((Schema::Arnold, MaterialKind::AiStandardSurface), |(s, _)| s)
}

/// Material kinds of a schema the host can currently create. The virtual
/// instancer target is always offered; if nothing is loaded the full list
/// is returned so the caller can still pick one.
pub fn available_materials<A>(adapter: &A, schema: Schema) -> Vec<MaterialKind>
where
    A: SceneGraphAdapter + ?Sized,
{
    let kinds = adapter.available_kinds();
    let available: Vec<MaterialKind> = schema
        .materials()
        .iter()
        .copied()
        .filter(|m| *m == MaterialKind::Mash || kinds.contains(&NodeKind::Material(*m)))
        .collect();

    if available.is_empty() {
        schema.materials().to_vec()
    } else {
        available
    }
}
