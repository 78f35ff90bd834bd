//! Adapters for the outbound ports.

pub mod credentials;
pub mod memory_store;
pub mod validators;

pub use credentials::StaticCredentialResolver;
pub use memory_store::InMemoryPModeSet;
pub use validators::{AcceptAllValidator, BasicPModeValidator};
