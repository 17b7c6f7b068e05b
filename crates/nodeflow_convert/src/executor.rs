// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plan execution.
//!
//! Applies a plan in one linear pass. Every entry ends up OK, SKIP or
//! FAIL in the log and in the counters; nothing escapes as an error and
//! there is no rollback. Running the same plan again against the same
//! target converges: existing connections, equal literals and converted
//! nodes left by the first run are all recognised and skipped.

use crate::catalog::{ConversionCatalog, LEAF_SAMPLER};
use crate::converter::GraphConverter;
use crate::planner::{TransferEntry, TransferPayload};
use crate::scene::{shading_groups_of, upstream_of_kind, DISPLACEMENT_ATTR, SURFACE_ATTR};
use crate::schema::Schema;
use crate::session::{ConversionSession, TransferLog};
use crate::slots::{collision_key, DestinationAttr, InstancerComponent};
use indexmap::IndexMap;
use nodeflow_graph::{
    AttrValue, FaultKind, MaterialKind, NodeKind, NodeRef, Plug, SceneGraphAdapter, UtilityKind,
};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

const POINTS_IN: &str = "inputPoints";
const POINTS_OUT: &str = "outputPoints";

/// Result of one run
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    /// Run identifier
    pub run_id: Uuid,
    /// Entries applied
    pub ok_count: usize,
    /// Entries skipped (already satisfied, superseded or unresolvable)
    pub skip_count: usize,
    /// Entries that failed
    pub fail_count: usize,
    /// Consumers moved onto new materials
    pub reassigned_count: usize,
    /// Nodes created during the run
    pub created: Vec<NodeRef>,
    /// Ordered log
    pub log: TransferLog,
}

impl TransferReport {
    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} ok, {} skipped, {} failed, {} reassigned, {} created",
            self.ok_count,
            self.skip_count,
            self.fail_count,
            self.reassigned_count,
            self.created.len()
        )
    }

    /// Whether no entry failed
    pub fn is_clean(&self) -> bool {
        self.fail_count == 0
    }

    fn tally(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.ok_count += 1,
            Outcome::Skipped => self.skip_count += 1,
            Outcome::Failed => self.fail_count += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied,
    Skipped,
    Failed,
}

/// Execute a plan. `target` is the node to write into (the waiter node for
/// instancer targets); without one a new material and consumer group are
/// created for each source material.
pub fn execute<A>(
    adapter: &mut A,
    catalog: &ConversionCatalog,
    plan: &[TransferEntry],
    target: Option<&NodeRef>,
) -> TransferReport
where
    A: SceneGraphAdapter + ?Sized,
{
    let schema = plan
        .first()
        .map_or(Schema::Maya, |entry| Schema::of(entry.target_kind));
    let mut session = ConversionSession::new(schema);
    let run_id = session.run_id();

    let span = tracing::info_span!("transfer", run = %run_id);
    let _enter = span.enter();
    tracing::info!("Executing {} entries into {}", plan.len(), schema);

    let converter = GraphConverter::new(catalog);
    let superseded = superseded_entries(plan, target.is_some());

    let mut report = TransferReport {
        run_id,
        ok_count: 0,
        skip_count: 0,
        fail_count: 0,
        reassigned_count: 0,
        created: Vec::new(),
        log: TransferLog::new(),
    };

    let mut by_shader: IndexMap<&NodeRef, Vec<usize>> = IndexMap::new();
    for (index, entry) in plan.iter().enumerate() {
        by_shader.entry(&entry.source_shader).or_default().push(index);
    }

    for (shader, indices) in by_shader {
        let target_kind = plan[indices[0]].target_kind;
        let Some(destination) = resolve_target(adapter, shader, target_kind, target, &mut session) else {
            report.fail_count += indices.len();
            continue;
        };

        for index in indices {
            let entry = &plan[index];
            let outcome = if superseded.contains(&index) {
                session.log.skip(format!(
                    "{} superseded by a later entry on '{}'",
                    entry.source_plug(),
                    entry.destination
                ));
                Outcome::Skipped
            } else {
                apply_entry(adapter, &converter, entry, &destination, &mut session)
            };
            report.tally(outcome);
        }

        if target_kind != MaterialKind::Mash && *shader != destination {
            report.reassigned_count += reassign_consumers(adapter, shader, &destination, &mut session);
        }
    }

    let (log, created) = session.finish();
    report.log = log;
    report.created = created;
    tracing::info!("Transfer finished: {}", report.summary());
    report
}

/// Create a material of `kind` for `shader` together with a consumer group
/// bound to it
pub fn create_target_material<A>(
    adapter: &mut A,
    shader: &NodeRef,
    kind: MaterialKind,
    session: &mut ConversionSession,
) -> Result<NodeRef, FaultKind>
where
    A: SceneGraphAdapter + ?Sized,
{
    let material = adapter.create_node(&NodeKind::Material(kind), &format!("{shader}_NF"))?;
    session.log.create(format!("{kind} '{material}' for '{shader}'"));
    session.record_created(material.clone());

    let group = adapter.create_node(&NodeKind::ShadingGroup, &format!("{material}SG"))?;
    session.log.create(format!("Shading group '{group}'"));
    session.record_created(group.clone());

    if let Err(fault) = adapter.connect(&material.plug("outColor"), &group.plug(SURFACE_ATTR)) {
        session.log.fail(format!("Binding '{material}' to '{group}': {fault}"));
    }
    Ok(material)
}

/// Move every member of the old material's consumer groups into the new
/// material's first group. The old material is left in place.
pub fn reassign_consumers<A>(
    adapter: &mut A,
    old: &NodeRef,
    new: &NodeRef,
    session: &mut ConversionSession,
) -> usize
where
    A: SceneGraphAdapter + ?Sized,
{
    let Some(new_group) = shading_groups_of(adapter, new).into_iter().next() else {
        session.log.skip(format!("No shading group on '{new}'"));
        return 0;
    };

    let mut total = 0;
    for old_group in shading_groups_of(adapter, old) {
        if old_group == new_group {
            continue;
        }
        let members = match adapter.group_members(&old_group) {
            Ok(members) => members,
            Err(fault) => {
                session.log.fail(fault.to_string());
                continue;
            }
        };
        if members.is_empty() {
            continue;
        }
        match adapter.assign_to_group(&members, &new_group) {
            Ok(()) => {
                total += members.len();
                session.log.assign(format!(
                    "{} object(s): {old_group} -> {new_group}",
                    members.len()
                ));
            }
            Err(fault) => session.log.fail(format!("Assigning to '{new_group}': {fault}")),
        }
    }
    total
}

/// Indices of entries a later entry overwrites
fn superseded_entries(plan: &[TransferEntry], explicit_target: bool) -> HashSet<usize> {
    let mut last = IndexMap::new();
    for (index, entry) in plan.iter().enumerate() {
        last.insert(
            collision_key(&entry.source_shader, &entry.destination, explicit_target),
            index,
        );
    }
    plan.iter()
        .enumerate()
        .filter(|(index, entry)| {
            let key = collision_key(&entry.source_shader, &entry.destination, explicit_target);
            last.get(&key) != Some(index)
        })
        .map(|(index, _)| index)
        .collect()
}

fn resolve_target<A>(
    adapter: &mut A,
    shader: &NodeRef,
    kind: MaterialKind,
    target: Option<&NodeRef>,
    session: &mut ConversionSession,
) -> Option<NodeRef>
where
    A: SceneGraphAdapter + ?Sized,
{
    match target {
        Some(node) if adapter.node_exists(node) => Some(node.clone()),
        Some(node) => {
            session.log.fail(format!("Target '{node}' not found; skipping '{shader}'"));
            None
        }
        None if kind == MaterialKind::Mash => {
            session
                .log
                .fail(format!("No instancer waiter given; skipping '{shader}'"));
            None
        }
        None => match create_target_material(adapter, shader, kind, session) {
            Ok(material) => Some(material),
            Err(fault) => {
                session.log.fail(format!("Creating {kind} for '{shader}': {fault}"));
                None
            }
        },
    }
}

fn apply_entry<A>(
    adapter: &mut A,
    converter: &GraphConverter<'_>,
    entry: &TransferEntry,
    target: &NodeRef,
    session: &mut ConversionSession,
) -> Outcome
where
    A: SceneGraphAdapter + ?Sized,
{
    let destination = match resolve_destination(adapter, entry, target, session) {
        Ok(plug) => plug,
        Err(outcome) => return outcome,
    };

    match &entry.payload {
        TransferPayload::Texture { source, .. } => {
            transfer_texture(adapter, converter, entry, source, &destination, session)
        }
        TransferPayload::Value { value } => transfer_value(adapter, entry, value, &destination, session),
    }
}

fn resolve_destination<A>(
    adapter: &mut A,
    entry: &TransferEntry,
    target: &NodeRef,
    session: &mut ConversionSession,
) -> Result<Plug, Outcome>
where
    A: SceneGraphAdapter + ?Sized,
{
    match &entry.destination {
        DestinationAttr::Attribute(attr) => Ok(target.plug(attr.as_str())),
        DestinationAttr::Displacement => {
            let Some(group) = shading_groups_of(adapter, target).into_iter().next() else {
                session
                    .log
                    .skip(format!("No shading group for displacement on '{target}'"));
                return Err(Outcome::Skipped);
            };
            Ok(group.plug(DISPLACEMENT_ATTR))
        }
        DestinationAttr::Instancer {
            component: InstancerComponent::Color,
            attr,
        } => {
            let color = instancer_color(adapter, target, session).ok_or(Outcome::Failed)?;
            Ok(color.plug(attr.as_str()))
        }
        DestinationAttr::Instancer {
            component: InstancerComponent::Distribute,
            attr,
        } => {
            let kind = NodeKind::Utility(UtilityKind::MashDistribute);
            let Some(distribute) = upstream_of_kind(adapter, target, &kind).into_iter().next() else {
                session
                    .log
                    .skip(format!("No distribute node for '{}'", entry.source_plug()));
                return Err(Outcome::Skipped);
            };

            let toggle = distribute.plug("useStrengthMap");
            if adapter.get_literal(&toggle) != Ok(AttrValue::Bool(true)) {
                if let Err(fault) = adapter.set_literal(&toggle, AttrValue::Bool(true)) {
                    session.log.fail(format!("Enabling {toggle}: {fault}"));
                    return Err(Outcome::Failed);
                }
                session.log.info(format!("Enabled {toggle}"));
            }
            Ok(distribute.plug(attr.as_str()))
        }
    }
}

/// The instancer colour node, found upstream of the waiter or created and
/// spliced into its points stream. Resolved at most once per run.
fn instancer_color<A>(adapter: &mut A, waiter: &NodeRef, session: &mut ConversionSession) -> Option<NodeRef>
where
    A: SceneGraphAdapter + ?Sized,
{
    if let Some(node) = session.instancer_color.as_ref().filter(|n| adapter.node_exists(n)) {
        return Some(node.clone());
    }

    let kind = NodeKind::Utility(UtilityKind::MashColor);
    let node = match upstream_of_kind(adapter, waiter, &kind).into_iter().next() {
        Some(existing) => existing,
        None => match adapter.create_node(&kind, &format!("{waiter}_Color")) {
            Ok(created) => {
                session.log.create(format!("Instancer colour node '{created}'"));
                session.record_created(created.clone());
                if let Err(fault) = adapter.set_literal(&created.plug("mapType"), AttrValue::Int(1)) {
                    session.log.fail(format!("Setting {created}.mapType: {fault}"));
                }
                splice_points(adapter, &created, waiter, session);
                created
            }
            Err(fault) => {
                session
                    .log
                    .fail(format!("Creating instancer colour node for '{waiter}': {fault}"));
                return None;
            }
        },
    };

    session.instancer_color = Some(node.clone());
    Some(node)
}

/// Insert `node` between the waiter and whatever fed its points
fn splice_points<A>(adapter: &mut A, node: &NodeRef, waiter: &NodeRef, session: &mut ConversionSession)
where
    A: SceneGraphAdapter + ?Sized,
{
    let waiter_in = waiter.plug(POINTS_IN);
    if let Some(upstream) = adapter.list_incoming(&waiter_in) {
        if let Err(fault) = adapter.connect(&upstream, &node.plug(POINTS_IN)) {
            session.log.fail(format!("{upstream} -> {node}.{POINTS_IN}: {fault}"));
        }
    }
    if let Err(fault) = adapter.connect(&node.plug(POINTS_OUT), &waiter_in) {
        session.log.fail(format!("{node}.{POINTS_OUT} -> {waiter_in}: {fault}"));
    }
}

fn transfer_texture<A>(
    adapter: &mut A,
    converter: &GraphConverter<'_>,
    entry: &TransferEntry,
    source: &Plug,
    destination: &Plug,
    session: &mut ConversionSession,
) -> Outcome
where
    A: SceneGraphAdapter + ?Sized,
{
    if !adapter.node_exists(&source.node) {
        session.log.skip(format!("Source node '{}' gone", source.node));
        return Outcome::Skipped;
    }

    // Samplers wired straight in use the slot's preferred output
    let plug = if adapter.node_kind(&source.node).is_ok_and(|kind| kind == LEAF_SAMPLER) {
        source.node.plug(entry.preferred_output.as_str())
    } else {
        converter.resolve_output_plug(adapter, source, session)
    };

    if !adapter.node_exists(&plug.node) {
        session.log.skip(format!("Source node '{}' gone", plug.node));
        return Outcome::Skipped;
    }
    if adapter.is_connected(&plug, destination) {
        session.log.skip(format!("Already connected: {plug} -> {destination}"));
        return Outcome::Skipped;
    }

    match adapter.connect(&plug, destination) {
        Ok(()) => {
            session.log.ok(format!("{plug} -> {destination}"));
            Outcome::Applied
        }
        Err(fault) => {
            session.log.fail(format!("{plug} -> {destination}: {fault}"));
            Outcome::Failed
        }
    }
}

fn transfer_value<A>(
    adapter: &mut A,
    entry: &TransferEntry,
    value: &AttrValue,
    destination: &Plug,
    session: &mut ConversionSession,
) -> Outcome
where
    A: SceneGraphAdapter + ?Sized,
{
    let driver = adapter.list_incoming(destination);
    if driver.is_none()
        && adapter
            .get_literal(destination)
            .is_ok_and(|current| literal_matches(&current, value))
    {
        session.log.skip(format!("Already set: {destination} = {value}"));
        return Outcome::Skipped;
    }

    // The existing driver stays until the literal is stored
    if let Err(fault) = adapter.set_literal(destination, value.clone()) {
        session.log.fail(format!("Value {destination}: {fault}"));
        return Outcome::Failed;
    }

    // A connected destination would ignore the literal
    if let Some(driver) = driver {
        if let Err(fault) = adapter.disconnect(destination) {
            session.log.fail(format!("Disconnecting {destination}: {fault}"));
            return Outcome::Failed;
        }
        session.log.info(format!("Disconnected {driver} -> {destination}"));
    }

    session
        .log
        .ok(format!("{} -> {destination} = {value}", entry.source_plug()));
    Outcome::Applied
}

fn literal_matches(current: &AttrValue, wanted: &AttrValue) -> bool {
    if let (Some(a), Some(b)) = (current.triple(), wanted.triple()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (current.scalar(), wanted.scalar()) {
        return a == b;
    }
    current == wanted
}
