//! Core types for the teleport-request system.
//!
//! This crate provides the foundational types used throughout the
//! implementation:
//!
//! - **Identifiers**: [`ActorId`], [`WorldId`], [`TransferId`]
//! - **Spatial values**: [`Location`]
//! - **Request vocabulary**: [`RequestKind`], [`RequestOutcome`], [`Role`]
//! - **User feedback**: [`Notice`]
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod identifiers;
mod location;
mod notice;
mod request;

pub use identifiers::{ActorId, TransferId, WorldId};
pub use location::Location;
pub use notice::Notice;
pub use request::{RequestKind, RequestOutcome, Role};
