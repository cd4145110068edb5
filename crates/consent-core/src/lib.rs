//! Shared vocabulary for GDPR consent evaluation.
//!
//! Defines the decoded consent token, vendor list and purpose types, plus
//! the collaborator traits a permission evaluator consumes:
//! - [`ConsentParser`] turns a raw consent string into a [`ConsentToken`]
//! - [`VendorListSource`] fetches a [`VendorList`] for a framework version
//!   and list revision
//!
//! [`memory`] provides in-memory implementations of both.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::*;
pub use memory::{
    FixedConsentParser, ParsedConsent, StaticVendorList, StaticVendorLists, VendorRecord,
};
pub use traits::*;
pub use types::*;
