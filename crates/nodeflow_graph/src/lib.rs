// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shading graph vocabulary and scene graph adapter for `NodeFlow`.
//!
//! This crate provides everything the conversion engine needs to talk to
//! a host's live shading graph:
//! - Node references, plugs and literal attribute values
//! - A closed vocabulary of known node kinds with an open fallback
//! - The [`SceneGraphAdapter`] trait the engine queries and mutates
//! - [`SceneGraph`], an in-memory store implementing the adapter
//!
//! ## Architecture
//!
//! The host owns its graph. The engine only ever holds [`NodeRef`]s and
//! [`Plug`]s and goes through the adapter for every read and write, so a
//! host integration only has to implement one trait. The in-memory store
//! backs the command-line driver and the engine's tests, and describes
//! the attributes of newly created nodes through a [`KindRegistry`].

pub mod adapter;
pub mod connection;
pub mod graph;
pub mod kind;
pub mod node;
pub mod plug;
pub mod templates;

pub use adapter::{FaultKind, SceneGraphAdapter};
pub use connection::Connection;
pub use graph::{DocumentError, SceneDocument, SceneGraph};
pub use kind::{MaterialKind, NodeKind, UtilityKind};
pub use node::{AttrDirection, AttrSpec, Attribute, KindRegistry, NodeRef, NodeTemplate, SceneNode};
pub use plug::{AttrType, AttrValue, Plug};
pub use templates::create_default_registry;
