//! # ebms-01-pmodes
//!
//! P-Mode resolution for the ebMS core: which processing agreement governs a
//! message.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Store**: lock-guarded P-Mode set with unique, optionally generated ids
//! - **Validator**: every structural and key-reference rule in one pass
//! - **Matcher**: weighted scoring that picks the single best P-Mode
//! - **Pull Authorization**: which P-Modes a Pull Request may take messages from
//!
//! ## Architecture
//!
//! ```text
//! admin / loader ──add/replace──→ PModeManager ──validate──→ PModeValidator
//!                                      │
//!                                      └──────────→ PModeSet ←── snapshot ── PModeMatcher
//!                                                                               ↑
//!                      received User Message / Pull Request ────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ebms_01_pmodes::adapters::{BasicPModeValidator, InMemoryPModeSet, StaticCredentialResolver};
//! use ebms_01_pmodes::ports::inbound::{PModeManagementApi, PModeMatchingApi};
//! use ebms_01_pmodes::{PModeManager, PModeMatcher};
//!
//! let store = Arc::new(InMemoryPModeSet::new());
//! let validator = Arc::new(BasicPModeValidator::new(Arc::new(StaticCredentialResolver::new())));
//! let manager = PModeManager::new(store.clone(), validator);
//! let matcher = PModeMatcher::new(store);
//!
//! manager.add(pmode)?;
//! let governing = matcher.find_for_received_user_message(&metadata);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::*;
pub use error::*;
pub use ports::inbound::{PModeManagementApi, PModeMatchingApi};
pub use ports::outbound::{CertificateUsage, CredentialResolver, PModeSet, PModeValidator};
pub use service::{PModeManager, PModeMatcher};
