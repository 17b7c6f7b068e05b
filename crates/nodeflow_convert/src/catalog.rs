// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion rule catalog and passthrough set.
//!
//! A rule says how one node kind is rebuilt for one schema: the kind to
//! create, how its input and output attributes are renamed, and literals
//! to set on the new node. Kinds without a rule for a schema, and kinds in
//! the passthrough set, are kept as they are.

use crate::schema::Schema;
use indexmap::{IndexMap, IndexSet};
use nodeflow_graph::{AttrValue, NodeKind, UtilityKind};
use serde::{Deserialize, Serialize};

/// Current catalog document format version
pub const CATALOG_FORMAT_VERSION: u32 = 1;

/// Kind of the leaf sampler nodes texture chains end in
pub const LEAF_SAMPLER: NodeKind = NodeKind::Utility(UtilityKind::File);

/// Attribute holding a leaf sampler's image path
pub const SAMPLER_PATH_ATTR: &str = "fileTextureName";

/// How one node kind is rebuilt for one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRule {
    /// Kind being replaced
    pub source_kind: NodeKind,
    /// Schema the rule applies to
    pub schema: Schema,
    /// Kind to create in its place
    pub target_kind: NodeKind,
    /// Old input attribute -> new input attribute
    #[serde(default)]
    pub input_remap: IndexMap<String, String>,
    /// Old output attribute -> new output attribute
    #[serde(default)]
    pub output_remap: IndexMap<String, String>,
    /// Literals applied to the new node right after creation
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub post_set: IndexMap<String, AttrValue>,
}

impl ConversionRule {
    /// Create a rule with empty remaps
    pub fn new(source_kind: impl Into<NodeKind>, schema: Schema, target_kind: impl Into<NodeKind>) -> Self {
        Self {
            source_kind: source_kind.into(),
            schema,
            target_kind: target_kind.into(),
            input_remap: IndexMap::new(),
            output_remap: IndexMap::new(),
            post_set: IndexMap::new(),
        }
    }

    /// Map an input attribute
    pub fn input(mut self, old: &str, new: &str) -> Self {
        self.input_remap.insert(old.to_string(), new.to_string());
        self
    }

    /// Map an output attribute
    pub fn output(mut self, old: &str, new: &str) -> Self {
        self.output_remap.insert(old.to_string(), new.to_string());
        self
    }

    /// Set a literal on the created node
    pub fn post_set(mut self, attr: &str, value: AttrValue) -> Self {
        self.post_set.insert(attr.to_string(), value);
        self
    }

    /// Whether the rule keeps the node kind unchanged
    pub fn is_identity(&self) -> bool {
        self.source_kind == self.target_kind
    }

    /// Name of an output attribute on the converted node
    pub fn remap_output<'a>(&'a self, attr: &'a str) -> &'a str {
        self.output_remap.get(attr).map_or(attr, String::as_str)
    }
}

/// Lookup tables driving the graph converter
#[derive(Debug, Clone, Default)]
pub struct ConversionCatalog {
    rules: IndexMap<(NodeKind, Schema), ConversionRule>,
    passthrough: IndexSet<NodeKind>,
}

impl ConversionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any rule for the same kind and schema
    pub fn register(&mut self, rule: ConversionRule) {
        self.rules
            .insert((rule.source_kind.clone(), rule.schema), rule);
    }

    /// Mark a kind as schema-agnostic
    pub fn add_passthrough(&mut self, kind: impl Into<NodeKind>) {
        self.passthrough.insert(kind.into());
    }

    /// Rule for a kind and schema, if any
    pub fn lookup(&self, kind: &NodeKind, schema: Schema) -> Option<&ConversionRule> {
        self.rules.get(&(kind.clone(), schema))
    }

    /// Rule that actually changes the node kind, if any. Passthrough kinds
    /// never have one.
    pub fn replacement(&self, kind: &NodeKind, schema: Schema) -> Option<&ConversionRule> {
        if self.is_passthrough(kind) {
            return None;
        }
        self.lookup(kind, schema).filter(|rule| !rule.is_identity())
    }

    /// Whether a kind is schema-agnostic
    pub fn is_passthrough(&self, kind: &NodeKind) -> bool {
        self.passthrough.contains(kind)
    }

    /// All rules, in registration order
    pub fn rules(&self) -> impl Iterator<Item = &ConversionRule> {
        self.rules.values()
    }

    /// All passthrough kinds
    pub fn passthrough(&self) -> impl Iterator<Item = &NodeKind> {
        self.passthrough.iter()
    }

    /// Snapshot as a serializable document
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            version: CATALOG_FORMAT_VERSION,
            rules: self.rules.values().cloned().collect(),
            passthrough: self.passthrough.iter().cloned().collect(),
        }
    }

    /// Build from a document, rejecting duplicate rules
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        if document.version != CATALOG_FORMAT_VERSION {
            return Err(CatalogError::UnsupportedVersion(document.version));
        }
        let mut catalog = Self::new();
        for rule in document.rules {
            if catalog.lookup(&rule.source_kind, rule.schema).is_some() {
                return Err(CatalogError::DuplicateRule {
                    kind: rule.source_kind,
                    schema: rule.schema,
                });
            }
            catalog.register(rule);
        }
        for kind in document.passthrough {
            catalog.add_passthrough(kind);
        }
        Ok(catalog)
    }

    /// Serialize to a pretty RON string
    pub fn to_ron(&self) -> Result<String, CatalogError> {
        let pretty = ron::ser::PrettyConfig::new();
        Ok(ron::ser::to_string_pretty(&self.to_document(), pretty)?)
    }

    /// Load from a RON string
    pub fn from_ron(text: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = ron::from_str(text)?;
        Self::from_document(document)
    }
}

/// Serializable form of a [`ConversionCatalog`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Format version
    pub version: u32,
    /// Conversion rules
    #[serde(default)]
    pub rules: Vec<ConversionRule>,
    /// Passthrough kinds
    #[serde(default)]
    pub passthrough: Vec<NodeKind>,
}

/// Error loading or saving a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// RON parse error
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] ron::Error),

    /// Unsupported format version
    #[error("Unsupported catalog format version: {0}")]
    UnsupportedVersion(u32),

    /// Two rules for the same kind and schema
    #[error("Duplicate rule for {kind} -> {schema}")]
    DuplicateRule {
        /// Source kind
        kind: NodeKind,
        /// Target schema
        schema: Schema,
    },
}

/// Create the built-in catalog
pub fn create_default_catalog() -> ConversionCatalog {
    use Schema::{Arnold, Maya, Redshift};
    use UtilityKind as U;

    let mut catalog = ConversionCatalog::new();

    // ========================================================================
    // Height bump
    // ========================================================================

    catalog.register(
        ConversionRule::new(U::Bump2d, Redshift, U::RedshiftBumpMap)
            .input("bumpValue", "input")
            .output("outNormal", "out")
            .post_set("inputType", AttrValue::Int(0)),
    );
    for schema in [Arnold, Maya] {
        catalog.register(
            ConversionRule::new(U::Bump2d, schema, U::Bump2d)
                .input("bumpValue", "bumpValue")
                .output("outNormal", "outNormal"),
        );
    }

    // ========================================================================
    // Tangent-space normal maps
    // ========================================================================

    catalog.register(
        ConversionRule::new(U::AiNormalMap, Redshift, U::RedshiftBumpMap)
            .input("input", "input")
            .output("outValue", "out")
            .post_set("inputType", AttrValue::Int(1)),
    );
    catalog.register(
        ConversionRule::new(U::AiNormalMap, Arnold, U::AiNormalMap)
            .input("input", "input")
            .output("outValue", "outValue"),
    );
    catalog.register(
        ConversionRule::new(U::AiNormalMap, Maya, U::Bump2d)
            .input("input", "bumpValue")
            .output("outValue", "outNormal")
            .post_set("bumpInterp", AttrValue::Int(1)),
    );
    catalog.register(
        ConversionRule::new(U::RedshiftBumpMap, Arnold, U::AiNormalMap)
            .input("input", "input")
            .output("out", "outValue"),
    );
    catalog.register(
        ConversionRule::new(U::RedshiftBumpMap, Maya, U::Bump2d)
            .input("input", "bumpValue")
            .output("out", "outNormal")
            .post_set("bumpInterp", AttrValue::Int(1)),
    );

    // ========================================================================
    // Colour correction
    // ========================================================================

    for (source, schema, target, input) in [
        (U::AiColorCorrect, Redshift, U::RsColorCorrect, "input"),
        (U::AiColorCorrect, Arnold, U::AiColorCorrect, "input"),
        (U::AiColorCorrect, Maya, U::ColorCorrect, "inColor"),
        (U::RsColorCorrect, Arnold, U::AiColorCorrect, "input"),
        (U::RsColorCorrect, Maya, U::ColorCorrect, "inColor"),
        (U::RsColorCorrect, Redshift, U::RsColorCorrect, "input"),
    ] {
        catalog.register(
            ConversionRule::new(source, schema, target)
                .input("input", input)
                .output("outColor", "outColor"),
        );
    }

    // ========================================================================
    // Range / multiply
    // ========================================================================

    catalog.register(
        ConversionRule::new(U::AiRange, Redshift, U::RsRange)
            .input("input", "input")
            .output("outColor", "outColor"),
    );
    catalog.register(
        ConversionRule::new(U::AiRange, Maya, U::RemapValue)
            .input("input", "inputValue")
            .output("outColor", "outValue"),
    );
    catalog.register(
        ConversionRule::new(U::AiRange, Arnold, U::AiRange)
            .input("input", "input")
            .output("outColor", "outColor"),
    );
    catalog.register(
        ConversionRule::new(U::AiMultiply, Redshift, U::RsColorLayer)
            .input("input1", "input1")
            .output("outColor", "outColor"),
    );
    catalog.register(
        ConversionRule::new(U::AiMultiply, Maya, U::MultiplyDivide)
            .input("input1", "input1")
            .output("outColor", "output"),
    );
    catalog.register(
        ConversionRule::new(U::AiMultiply, Arnold, U::AiMultiply)
            .input("input1", "input1")
            .output("outColor", "outColor"),
    );

    // ========================================================================
    // Passthrough
    // ========================================================================

    for kind in [
        U::File,
        U::Place2dTexture,
        U::ColorCorrect,
        U::RemapValue,
        U::RemapColor,
        U::RemapHsv,
        U::MultiplyDivide,
        U::Clamp,
        U::Reverse,
        U::BlendColors,
        U::Condition,
        U::Ramp,
        U::Noise,
        U::Fractal,
        U::Stencil,
        U::LayeredTexture,
        U::GammaCorrect,
        U::HsvToRgb,
        U::RgbToHsv,
        U::UnitConversion,
        U::Luminance,
    ] {
        catalog.add_passthrough(kind);
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let catalog = create_default_catalog();
        let bump = NodeKind::Utility(UtilityKind::Bump2d);

        let rule = catalog.lookup(&bump, Schema::Redshift).unwrap();
        assert_eq!(rule.target_kind, NodeKind::Utility(UtilityKind::RedshiftBumpMap));
        assert_eq!(rule.remap_output("outNormal"), "out");
        assert_eq!(rule.remap_output("outAlpha"), "outAlpha");
        assert_eq!(rule.post_set.get("inputType"), Some(&AttrValue::Int(0)));

        assert!(catalog.replacement(&bump, Schema::Redshift).is_some());
        assert!(catalog.lookup(&bump, Schema::Arnold).unwrap().is_identity());
        assert!(catalog.replacement(&bump, Schema::Arnold).is_none());
        assert!(catalog.lookup(&bump, Schema::Mash).is_none());
    }

    #[test]
    fn test_passthrough() {
        let catalog = create_default_catalog();
        assert!(catalog.is_passthrough(&LEAF_SAMPLER));
        assert!(catalog.is_passthrough(&NodeKind::Utility(UtilityKind::Place2dTexture)));
        assert!(!catalog.is_passthrough(&NodeKind::Utility(UtilityKind::Bump2d)));
        assert!(!catalog.is_passthrough(&NodeKind::parse("studioTriplanar")));
    }

    #[test]
    fn test_register_replaces() {
        let mut catalog = create_default_catalog();
        let before = catalog.rules().count();
        catalog.register(ConversionRule::new(UtilityKind::Bump2d, Schema::Redshift, UtilityKind::Bump2d));
        assert_eq!(catalog.rules().count(), before);
        assert!(catalog
            .lookup(&NodeKind::Utility(UtilityKind::Bump2d), Schema::Redshift)
            .unwrap()
            .is_identity());
    }

    #[test]
    fn test_document_round_trip() {
        let catalog = create_default_catalog();
        let text = catalog.to_ron().unwrap();
        let loaded = ConversionCatalog::from_ron(&text).unwrap();
        assert_eq!(loaded.rules().count(), catalog.rules().count());
        assert_eq!(loaded.passthrough().count(), catalog.passthrough().count());
        assert_eq!(
            loaded.lookup(&NodeKind::Utility(UtilityKind::AiNormalMap), Schema::Maya),
            catalog.lookup(&NodeKind::Utility(UtilityKind::AiNormalMap), Schema::Maya)
        );
    }

    #[test]
    fn test_duplicate_rules_rejected() {
        let mut document = create_default_catalog().to_document();
        let first = document.rules[0].clone();
        document.rules.push(first);
        assert!(matches!(
            ConversionCatalog::from_document(document),
            Err(CatalogError::DuplicateRule { .. })
        ));
    }
}
