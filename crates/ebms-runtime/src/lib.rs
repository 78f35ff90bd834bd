//! # ebMS Core Runtime Library
//!
//! Exposes the wiring of the core for the `ebms-core` binary and for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `EBMS_CONFIG` file, environment)
//! 2. Validate implementation names
//! 3. Build store, validator, repository and the services on top of them
//! 4. Load P-Mode documents from the configured directory

pub mod container;
pub mod loader;

pub use container::{ConfigError, Core, CoreConfig};
pub use loader::{load_pmodes, LoadError, LoadSummary};
