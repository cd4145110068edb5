//! GDPR Permission Evaluation
//!
//! Decides whether a vendor may sync cookies or receive personal
//! information, given the user's consent string. Every decision is
//! Consent + Vendor List + Configuration = allow/deny.
//!
//! Key features:
//! - Version-specific purpose tables for framework v1 and v2
//! - Legitimate interest accepted as the vendor's legal basis for personal
//!   information, never for cookie sync; the user's purpose grant is always
//!   required
//! - Vendor-level consent mandatory for every allow
//! - Missing consent resolved by configuration, malformed consent surfaced as
//!   an error, unsupported versions and unknown vendors denied
//! - Swappable enforcement through the [`Permissions`] trait

pub mod config;
pub mod engine;
pub mod error;
pub mod purpose;

// Re-export primary types for convenience
pub use config::{build_permissions, PolicyConfig};
pub use engine::{AlwaysAllow, Permissions, PermissionsEngine};
pub use error::{PermissionsError, PermissionsErrorKind, PermissionsResult};
pub use purpose::{purpose_satisfied, purpose_table, PurposeKind, PurposeTable};
