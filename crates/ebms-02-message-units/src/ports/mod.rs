//! Ports (Hexagonal Architecture)
//!
//! - `inbound`: API exposed to the message-processing pipeline
//! - `outbound`: the transactional repository

pub mod inbound;
pub mod outbound;
