//! Domain layer for the P-Mode subsystem.

pub mod authorization;
pub mod matching;
pub mod pmode;
pub mod security;
pub mod validation;

pub use authorization::{authorize, find_pullable, is_pullable};
pub use matching::{score, select_best, weights};
pub use pmode::*;
pub use security::*;
pub use validation::{validate_pmode, ValidationIssue};
