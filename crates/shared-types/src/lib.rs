//! # Shared Types Crate
//!
//! Entities shared by the P-Mode crate and the message-unit crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: message metadata and authentication evidence
//!   are defined once and consumed by both subsystems.
//! - **Back-references by id**: nothing in here points at a P-Mode object;
//!   message units only carry the P-Mode id string.

pub mod entities;
pub mod errors;
pub mod security;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use security::*;
pub use time::*;
