// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine facade over the conversion tables.

use crate::catalog::{create_default_catalog, ConversionCatalog};
use crate::converter::GraphConverter;
use crate::executor::{execute, TransferReport};
use crate::planner::{plan, TransferEntry};
use crate::schema::Schema;
use crate::session::ConversionSession;
use crate::slots::{create_default_slot_map, SlotMap};
use crate::validator::{validate, ValidationIssue};
use nodeflow_graph::{MaterialKind, NodeRef, SceneGraphAdapter};

/// Conversion catalog and slot map, loaded once and shared by every run
#[derive(Debug, Clone)]
pub struct ConversionEngine {
    catalog: ConversionCatalog,
    slots: SlotMap,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionEngine {
    /// Engine over the built-in tables
    pub fn new() -> Self {
        Self::with_tables(create_default_catalog(), create_default_slot_map())
    }

    /// Engine over caller-supplied tables
    pub fn with_tables(catalog: ConversionCatalog, slots: SlotMap) -> Self {
        tracing::debug!(
            "Conversion engine: {} rules, {} passthrough kinds, {} slots",
            catalog.rules().count(),
            catalog.passthrough().count(),
            slots.len()
        );
        Self { catalog, slots }
    }

    /// Conversion catalog
    pub fn catalog(&self) -> &ConversionCatalog {
        &self.catalog
    }

    /// Slot map
    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    /// Plan the transfer of one material onto `target_kind`
    pub fn plan<A>(&self, adapter: &A, shader: &NodeRef, target_kind: MaterialKind) -> Vec<TransferEntry>
    where
        A: SceneGraphAdapter + ?Sized,
    {
        plan(adapter, &self.slots, shader, target_kind)
    }

    /// Plan several materials into one plan, in the order given
    pub fn plan_many<A>(&self, adapter: &A, shaders: &[NodeRef], target_kind: MaterialKind) -> Vec<TransferEntry>
    where
        A: SceneGraphAdapter + ?Sized,
    {
        shaders
            .iter()
            .flat_map(|shader| self.plan(adapter, shader, target_kind))
            .collect()
    }

    /// Validate a plan
    pub fn validate<A>(&self, adapter: &A, plan: &[TransferEntry], target: Option<&NodeRef>) -> Vec<ValidationIssue>
    where
        A: SceneGraphAdapter + ?Sized,
    {
        validate(adapter, &self.catalog, plan, target)
    }

    /// Execute a plan
    pub fn execute<A>(&self, adapter: &mut A, plan: &[TransferEntry], target: Option<&NodeRef>) -> TransferReport
    where
        A: SceneGraphAdapter + ?Sized,
    {
        execute(adapter, &self.catalog, plan, target)
    }

    /// Convert the network behind `node` for `schema` outside of a transfer.
    /// Returns the replacement node and the session holding the log.
    pub fn convert_network<A>(&self, adapter: &mut A, node: &NodeRef, schema: Schema) -> (NodeRef, ConversionSession)
    where
        A: SceneGraphAdapter + ?Sized,
    {
        let mut session = ConversionSession::new(schema);
        let converted = GraphConverter::new(&self.catalog).convert_node(adapter, node, &mut session);
        (converted, session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bump_chain, scenario_a, scene};

    #[test]
    fn test_plan_many_keeps_order() {
        let mut graph = scene();
        let a = scenario_a(&mut graph, "wood.png");
        let chain = bump_chain(&mut graph);
        let engine = ConversionEngine::new();

        let entries = engine.plan_many(
            &graph,
            &[chain.material.clone(), a.material.clone()],
            MaterialKind::RedshiftStandardMaterial,
        );
        let shaders: Vec<&NodeRef> = entries.iter().map(|e| &e.source_shader).collect();
        assert_eq!(shaders, vec![&chain.material, &a.material, &a.material]);
    }

    #[test]
    fn test_plan_validate_execute() {
        let mut graph = scene();
        let fixture = scenario_a(&mut graph, "wood.png");
        let engine = ConversionEngine::default();

        let entries = engine.plan(&graph, &fixture.material, MaterialKind::AiStandardSurface);
        assert!(engine.validate(&graph, &entries, None).is_empty());

        let report = engine.execute(&mut graph, &entries, None);
        assert_eq!(report.ok_count, 2);
        assert_eq!(report.created.len(), 2);
    }

    #[test]
    fn test_convert_network() {
        let mut graph = scene();
        let chain = bump_chain(&mut graph);
        let engine = ConversionEngine::new();

        let (converted, session) = engine.convert_network(&mut graph, &chain.bump, Schema::Redshift);
        assert_eq!(converted.as_str(), "bump1_Redshiftconv");
        assert_eq!(session.created().to_vec(), vec![converted]);
    }
}
