// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shading-network conversion engine for `NodeFlow`.
//!
//! This crate carries material setups from one renderer vocabulary to
//! another:
//! - A catalog of node conversion rules and the kinds that never change
//! - A semantic slot map from abstract channels to target attributes
//! - A memoized, cycle-safe converter for upstream networks
//! - Planning, validation and best-effort execution of slot transfers
//!
//! ## Architecture
//!
//! Every run owns a fresh [`ConversionSession`] holding the conversion
//! cache, the cycle guard and the tagged log. The planner and validator
//! only read the graph; the executor is the single place that mutates it,
//! always through a [`nodeflow_graph::SceneGraphAdapter`]. Failures inside
//! a run are folded into the log and the report counters instead of being
//! returned as errors.

pub mod catalog;
pub mod converter;
pub mod engine;
pub mod executor;
pub mod planner;
pub mod run;
pub mod scene;
pub mod schema;
pub mod session;
pub mod slots;
pub mod validator;

#[cfg(test)]
mod testing;

pub use catalog::{create_default_catalog, CatalogDocument, CatalogError, ConversionCatalog, ConversionRule};
pub use converter::{converted_name, GraphConverter};
pub use engine::ConversionEngine;
pub use executor::{execute, TransferReport};
pub use planner::{plan, LeafSampler, TransferEntry, TransferMode, TransferPayload};
pub use run::{RunError, RunState, TransferRun};
pub use scene::{materials_of_member, scene_materials};
pub use schema::{available_materials, suggest_target, Schema};
pub use session::{ConversionCache, ConversionSession, LogLine, LogTag, TransferLog};
pub use slots::{create_default_slot_map, DestinationAttr, SemanticSlot, SlotMap, SlotTarget};
pub use validator::{validate, IssueKind, Severity, ValidationIssue};
