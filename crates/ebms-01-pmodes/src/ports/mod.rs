//! Ports (Hexagonal Architecture)
//!
//! - `inbound`: API exposed to the message-processing pipeline
//! - `outbound`: store, validator and credential dependencies

pub mod inbound;
pub mod outbound;
