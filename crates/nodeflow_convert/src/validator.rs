// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plan validation.
//!
//! Checks a plan against the live graph and the chosen target. Nothing is
//! mutated; the caller decides whether to go ahead.

use crate::catalog::{ConversionCatalog, LEAF_SAMPLER};
use crate::planner::{TransferEntry, TransferPayload};
use crate::schema::Schema;
use crate::slots::collision_key;
use indexmap::{IndexMap, IndexSet};
use nodeflow_graph::{MaterialKind, NodeKind, NodeRef, SceneGraphAdapter};
use serde::Serialize;
use std::fmt;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory
    Warning,
    /// Blocking by convention
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// What an issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A texture chain ends in a sampler with no image path
    UnsetSource,
    /// Two entries write the same destination
    SlotCollision,
    /// The target lacks the destination, or cannot be resolved at all
    MissingDestination,
    /// Part of the upstream chain will be rebuilt as another kind
    PendingConversion,
}

/// One finding of the validator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Severity
    pub severity: Severity,
    /// Kind of finding
    pub kind: IssueKind,
    /// Human-readable message
    pub message: String,
    /// Plan indices the issue refers to
    pub entries: Vec<usize>,
}

impl ValidationIssue {
    fn warning(kind: IssueKind, message: String, entries: Vec<usize>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message,
            entries,
        }
    }

    fn error(kind: IssueKind, message: String, entries: Vec<usize>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message,
            entries,
        }
    }

    /// Whether this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Validate a plan against the graph. `target` is the node entries will be
/// written into, or `None` when a new material is created per source.
pub fn validate<A>(
    adapter: &A,
    catalog: &ConversionCatalog,
    plan: &[TransferEntry],
    target: Option<&NodeRef>,
) -> Vec<ValidationIssue>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut issues = Vec::new();
    let all: Vec<usize> = (0..plan.len()).collect();

    let target_kinds: IndexSet<MaterialKind> = plan.iter().map(|e| e.target_kind).collect();
    let target_ok = match target {
        Some(node) if !adapter.node_exists(node) => {
            issues.push(ValidationIssue::error(
                IssueKind::MissingDestination,
                format!("Target '{node}' not found"),
                all.clone(),
            ));
            false
        }
        Some(_) => true,
        None => {
            for kind in &target_kinds {
                if *kind == MaterialKind::Mash {
                    issues.push(ValidationIssue::error(
                        IssueKind::MissingDestination,
                        "Instancer targets need an existing waiter node".to_string(),
                        all.clone(),
                    ));
                } else if !adapter.is_kind_available(&NodeKind::Material(*kind)) {
                    issues.push(ValidationIssue::error(
                        IssueKind::MissingDestination,
                        format!("Material kind '{kind}' is not available; make sure its plugin is loaded"),
                        all.clone(),
                    ));
                }
            }
            false
        }
    };

    let mut seen: IndexMap<(Option<NodeRef>, String), usize> = IndexMap::new();

    for (index, entry) in plan.iter().enumerate() {
        let slot_plug = entry.source_plug();

        if let TransferPayload::Texture { leaf: Some(leaf), .. } = &entry.payload {
            if leaf.path.is_empty() {
                issues.push(ValidationIssue::warning(
                    IssueKind::UnsetSource,
                    format!("Sampler '{}' on '{slot_plug}' has no image path", leaf.node),
                    vec![index],
                ));
            }
        }

        let key = collision_key(&entry.source_shader, &entry.destination, target.is_some());
        if let Some(previous) = seen.insert(key, index) {
            issues.push(ValidationIssue::warning(
                IssueKind::SlotCollision,
                format!(
                    "'{}' and '{}' both target '{}'; the later one wins",
                    plan[previous].source_plug(),
                    slot_plug,
                    entry.destination
                ),
                vec![previous, index],
            ));
        }

        if let Some(node) = target.filter(|_| target_ok) {
            if entry.target_kind != MaterialKind::Mash && entry.destination.is_plain() {
                let attr = entry.destination.to_string();
                if !adapter.attribute_exists(node, &attr) {
                    issues.push(ValidationIssue::error(
                        IssueKind::MissingDestination,
                        format!("Attribute '{attr}' not found on '{node}'"),
                        vec![index],
                    ));
                }
            }
        }

        // Samplers are wired as they are; nothing behind them is rebuilt
        let rebuilt_source = entry
            .source_node()
            .filter(|node| adapter.node_kind(node).is_ok_and(|kind| kind != LEAF_SAMPLER));
        if let Some(source) = rebuilt_source {
            let schema = Schema::of(entry.target_kind);
            for (node, from, to) in pending_conversions(adapter, catalog, source, schema) {
                issues.push(ValidationIssue::warning(
                    IssueKind::PendingConversion,
                    format!("'{node}' ({from}) will be converted to '{to}' for {schema}"),
                    vec![index],
                ));
            }
        }
    }

    issues
}

/// Nodes at or upstream of `start` that a run would rebuild, with their
/// current and future kinds
fn pending_conversions<A>(
    adapter: &A,
    catalog: &ConversionCatalog,
    start: &NodeRef,
    schema: Schema,
) -> Vec<(NodeRef, NodeKind, NodeKind)>
where
    A: SceneGraphAdapter + ?Sized,
{
    let mut found = Vec::new();
    let mut visited = IndexSet::new();
    let mut stack = vec![start.clone()];

    while let Some(node) = stack.pop() {
        if !visited.insert(node.clone()) {
            continue;
        }
        let Ok(kind) = adapter.node_kind(&node) else {
            continue;
        };
        if let Some(rule) = catalog.replacement(&kind, schema) {
            found.push((node.clone(), kind, rule.target_kind.clone()));
        }
        for (source, _) in adapter.list_upstream(&node).into_iter().rev() {
            stack.push(source.node);
        }
    }

    found
}
