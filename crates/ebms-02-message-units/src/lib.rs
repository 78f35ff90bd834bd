//! # ebms-02-message-units
//!
//! Processing-state machine of the ebMS core: where each message unit is in
//! its processing, and the guarantee that no unit is processed twice at the
//! same time.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **State Ledger**: append-only history of timed processing states
//! - **Repository Port**: transactional load/find/insert/save with a version
//!   check on every save
//! - **Transition Guard**: appends a state only if the unit is in the state
//!   the caller expects, treating a lost race as a normal negative result
//!
//! ## Concurrency
//!
//! ```text
//! worker A ── start_delivery ──┐
//!                              ├─→ load v3 (READY_FOR_DELIVERY) ─→ save(expect v3) ─→ commit ✓  → true
//! worker B ── start_delivery ──┘                                   save(expect v3) ─→ commit ✗  → false
//! ```
//!
//! Callers keep `UnitRef` handles and re-read units when they need the
//! current data; nothing holds a unit across calls.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::*;
pub use error::*;
pub use ports::inbound::MessageUnitApi;
pub use ports::outbound::{MessageUnitRepository, RepositoryTransaction, UnitFilter};
pub use service::MessageUnitManager;
