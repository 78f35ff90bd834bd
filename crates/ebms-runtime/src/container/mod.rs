//! # Core Container
//!
//! Configuration and the factories that turn it into running services.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, CoreConfig};
pub use subsystems::Core;
