// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recursive, memoized graph rewrite.
//!
//! [`GraphConverter::convert_node`] rebuilds a node for the session's
//! schema and rewires everything feeding it, walking upstream until it
//! reaches nodes that need no conversion. Each original node is handled
//! once per session, so fan-in in the source graph stays fan-in in the
//! converted graph.

use crate::catalog::ConversionCatalog;
use crate::schema::Schema;
use crate::session::ConversionSession;
use nodeflow_graph::{NodeRef, Plug, SceneGraphAdapter};

/// Name given to the node converted from `original`
pub fn converted_name(original: &NodeRef, schema: Schema) -> NodeRef {
    NodeRef::new(format!("{original}_{schema}conv"))
}

/// Rewrites upstream chains using a conversion catalog
#[derive(Debug, Clone, Copy)]
pub struct GraphConverter<'a> {
    catalog: &'a ConversionCatalog,
}

impl<'a> GraphConverter<'a> {
    /// Create a converter over a catalog
    pub fn new(catalog: &'a ConversionCatalog) -> Self {
        Self { catalog }
    }

    /// Convert a node and everything upstream of it, returning the node to
    /// use in its place. Nodes that need no conversion are returned as is.
    pub fn convert_node<A>(&self, adapter: &mut A, node: &NodeRef, session: &mut ConversionSession) -> NodeRef
    where
        A: SceneGraphAdapter + ?Sized,
    {
        if let Some(converted) = session.cache.get(node) {
            tracing::debug!("Cache hit: {} -> {}", node, converted);
            return converted.clone();
        }
        if session.in_progress.contains(node) {
            session.log.info(format!("Cycle through '{node}', keeping it"));
            return node.clone();
        }

        let kind = match adapter.node_kind(node) {
            Ok(kind) => kind,
            Err(fault) => {
                session.log.skip(fault.to_string());
                session.cache.insert(node.clone(), node.clone());
                return node.clone();
            }
        };

        let schema = session.schema();
        let Some(rule) = self.catalog.replacement(&kind, schema) else {
            return self.keep_and_walk(adapter, node, session);
        };

        if !adapter.is_kind_available(&rule.target_kind) {
            session.log.info(format!(
                "Node kind '{}' not available, keeping '{kind}' ({node})",
                rule.target_kind
            ));
            return self.keep_and_walk(adapter, node, session);
        }

        // A node left behind by an earlier run is picked up again
        let name = converted_name(node, schema);
        let converted = if adapter.node_kind(&name).is_ok_and(|existing| existing == rule.target_kind) {
            session.log.info(format!("Reusing '{name}' for '{node}'"));
            name
        } else {
            match adapter.create_node(&rule.target_kind, name.as_str()) {
                Ok(created) => {
                    session.log.create(format!(
                        "{kind} -> {}  ({node} -> {created})",
                        rule.target_kind
                    ));
                    session.record_created(created.clone());
                    created
                }
                Err(fault) => {
                    session
                        .log
                        .fail(format!("Creating {} for '{node}': {fault}", rule.target_kind));
                    return self.keep_and_walk(adapter, node, session);
                }
            }
        };

        // Cached before the inputs are rebuilt so re-entrant walks find it
        session.cache.insert(node.clone(), converted.clone());
        session.in_progress.insert(node.clone());

        for (attr, value) in &rule.post_set {
            let plug = converted.plug(attr.as_str());
            match adapter.set_literal(&plug, value.clone()) {
                Ok(()) => session.log.info(format!("Set {plug} = {value}")),
                Err(fault) => session.log.fail(format!("Setting {plug}: {fault}")),
            }
        }

        for (old_attr, new_attr) in &rule.input_remap {
            let Some(upstream) = adapter.list_incoming(&node.plug(old_attr.as_str())) else {
                continue;
            };
            let source = self.resolve_output_plug(adapter, &upstream, session);
            self.connect_logged(adapter, &source, &converted.plug(new_attr.as_str()), session);
        }

        session.in_progress.remove(node);
        converted
    }

    /// The plug to read in place of `plug` once its node is converted
    pub fn resolve_output_plug<A>(&self, adapter: &mut A, plug: &Plug, session: &mut ConversionSession) -> Plug
    where
        A: SceneGraphAdapter + ?Sized,
    {
        let converted = self.convert_node(adapter, &plug.node, session);
        if converted == plug.node {
            return plug.clone();
        }

        let attr = adapter
            .node_kind(&plug.node)
            .ok()
            .and_then(|kind| self.catalog.lookup(&kind, session.schema()))
            .map_or(plug.attr.as_str(), |rule| rule.remap_output(&plug.attr));
        Plug::new(converted, attr)
    }

    fn keep_and_walk<A>(&self, adapter: &mut A, node: &NodeRef, session: &mut ConversionSession) -> NodeRef
    where
        A: SceneGraphAdapter + ?Sized,
    {
        session.in_progress.insert(node.clone());
        for (source, _) in adapter.list_upstream(node) {
            self.convert_node(adapter, &source.node, session);
        }
        session.in_progress.remove(node);
        session.cache.insert(node.clone(), node.clone());
        node.clone()
    }

    fn connect_logged<A>(&self, adapter: &mut A, source: &Plug, destination: &Plug, session: &mut ConversionSession)
    where
        A: SceneGraphAdapter + ?Sized,
    {
        if !adapter.node_exists(&source.node) {
            session.log.skip(format!("Source gone: {source}"));
            return;
        }
        if !adapter.node_exists(&destination.node) {
            session.log.skip(format!("Destination gone: {destination}"));
            return;
        }
        if adapter.is_connected(source, destination) {
            return;
        }
        match adapter.connect(source, destination) {
            Ok(()) => session.log.info(format!("Wired {source} -> {destination}")),
            Err(fault) => session.log.fail(format!("{source} -> {destination}: {fault}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::create_default_catalog;
    use crate::session::LogTag;
    use crate::testing::{bump_chain, scene, shared_color_correct};
    use nodeflow_graph::{AttrType, AttrValue, NodeKind, SceneNode, UtilityKind};

    #[test]
    fn test_bump_converts_once() {
        let mut graph = scene();
        let chain = bump_chain(&mut graph);
        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Redshift);

        let plug = converter.resolve_output_plug(&mut graph, &chain.bump.plug("outNormal"), &mut session);
        assert_eq!(plug.node.as_str(), "bump1_Redshiftconv");
        assert_eq!(plug.attr, "out");

        let rs_bump = NodeKind::Utility(UtilityKind::RedshiftBumpMap);
        assert_eq!(graph.nodes_of_kind(&rs_bump), vec![plug.node.clone()]);
        assert_eq!(graph.get_literal(&plug.node.plug("inputType")), Ok(AttrValue::Int(0)));
        assert!(graph.is_connected(&chain.file.plug("outAlpha"), &plug.node.plug("input")));
        assert_eq!(session.log().count(LogTag::Create), 1);

        // Same session: cached
        let again = converter.resolve_output_plug(&mut graph, &chain.bump.plug("outNormal"), &mut session);
        assert_eq!(again, plug);
        assert_eq!(graph.nodes_of_kind(&rs_bump).len(), 1);
    }

    #[test]
    fn test_fan_in_preserved() {
        let mut graph = scene();
        let shared = shared_color_correct(&mut graph);
        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Redshift);

        let a = converter.resolve_output_plug(&mut graph, &shared.correct.plug("outColor"), &mut session);
        let b = converter.resolve_output_plug(&mut graph, &shared.correct.plug("outColor"), &mut session);
        assert_eq!(a, b);
        assert_eq!(
            graph
                .nodes_of_kind(&NodeKind::Utility(UtilityKind::RsColorCorrect))
                .len(),
            1
        );
    }

    #[test]
    fn test_passthrough_chain_untouched() {
        let mut graph = scene();
        let file = graph.spawn(UtilityKind::File, "file1").unwrap();
        let correct = graph.spawn(UtilityKind::ColorCorrect, "cc1").unwrap();
        graph.connect(&file.plug("outColor"), &correct.plug("inColor")).unwrap();
        let before = graph.node_count();

        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Arnold);
        let plug = converter.resolve_output_plug(&mut graph, &correct.plug("outColor"), &mut session);

        assert_eq!(plug, correct.plug("outColor"));
        assert_eq!(graph.node_count(), before);
        assert!(session.cache().contains(&file));
        assert_eq!(session.cache().replacements().count(), 0);
    }

    #[test]
    fn test_deep_node_converted_behind_passthrough() {
        let mut graph = scene();
        let chain = bump_chain(&mut graph);
        let reverse = graph.spawn(UtilityKind::Reverse, "rev1").unwrap();
        graph.connect(&chain.bump.plug("outNormal"), &reverse.plug("input")).unwrap();

        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Redshift);
        let converted = converter.convert_node(&mut graph, &reverse, &mut session);

        // The passthrough node stays, the bump behind it is still rebuilt
        assert_eq!(converted, reverse);
        assert_eq!(
            session.cache().get(&chain.bump).map(NodeRef::as_str),
            Some("bump1_Redshiftconv")
        );
    }

    #[test]
    fn test_unavailable_kind_falls_back() {
        let mut graph = scene();
        let chain = bump_chain(&mut graph);
        graph.disable_kind(&NodeKind::Utility(UtilityKind::RedshiftBumpMap));

        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Redshift);
        let plug = converter.resolve_output_plug(&mut graph, &chain.bump.plug("outNormal"), &mut session);

        assert_eq!(plug, chain.bump.plug("outNormal"));
        assert_eq!(session.log().count(LogTag::Info), 1);
        assert_eq!(session.log().count(LogTag::Fail), 0);
        assert!(session.created().is_empty());
    }

    #[test]
    fn test_reuses_node_from_earlier_run() {
        let mut graph = scene();
        let chain = bump_chain(&mut graph);
        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);

        let mut first = ConversionSession::new(Schema::Redshift);
        let a = converter.convert_node(&mut graph, &chain.bump, &mut first);
        let count = graph.node_count();

        let mut second = ConversionSession::new(Schema::Redshift);
        let b = converter.convert_node(&mut graph, &chain.bump, &mut second);

        assert_eq!(a, b);
        assert_eq!(graph.node_count(), count);
        assert!(second.created().is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = scene();
        let a = graph.insert_node(
            SceneNode::new("loopA", "studioBlend")
                .with_input("in", AttrType::Color)
                .with_output("out", AttrType::Color),
        );
        let b = graph.insert_node(
            SceneNode::new("loopB", "studioBlend")
                .with_input("in", AttrType::Color)
                .with_output("out", AttrType::Color),
        );
        graph.connect(&a.plug("out"), &b.plug("in")).unwrap();
        graph.connect(&b.plug("out"), &a.plug("in")).unwrap();

        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Maya);
        assert_eq!(converter.convert_node(&mut graph, &a, &mut session), a);
        assert_eq!(session.log().count(LogTag::Info), 1);
        assert!(session.cache().contains(&b));
    }

    #[test]
    fn test_rejected_input_logged_and_node_kept() {
        let mut graph = scene();
        let ramp = graph.insert_node(
            SceneNode::new("ramp9", "studioRamp").with_output("outValue", AttrType::Float),
        );
        let correct = graph.insert_node(
            SceneNode::new("cc9", UtilityKind::AiColorCorrect)
                .with_input("input", AttrType::Any)
                .with_output("outColor", AttrType::Color),
        );
        graph.connect(&ramp.plug("outValue"), &correct.plug("input")).unwrap();

        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Redshift);
        let converted = converter.convert_node(&mut graph, &correct, &mut session);

        // The Redshift node only takes colour on its input
        assert_eq!(converted.as_str(), "cc9_Redshiftconv");
        assert!(graph.node_exists(&converted));
        assert_eq!(session.log().count(LogTag::Fail), 1);
        assert_eq!(graph.list_incoming(&converted.plug("input")), None);
        assert_eq!(session.cache().get(&correct), Some(&converted));
    }

    #[test]
    fn test_stale_node_skipped() {
        let mut graph = scene();
        let catalog = create_default_catalog();
        let converter = GraphConverter::new(&catalog);
        let mut session = ConversionSession::new(Schema::Arnold);

        let gone = NodeRef::from("deleted1");
        assert_eq!(converter.convert_node(&mut graph, &gone, &mut session), gone);
        assert_eq!(session.log().count(LogTag::Skip), 1);
    }
}
