use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CatalogResult, DecodeError};
use crate::types::{PurposeId, SpecVersion, VendorId};

// ---------------------------------------------------------------------------
// ConsentToken — decoded, read-only consent record
// ---------------------------------------------------------------------------

/// The structured form of one consent string.
///
/// Built once per incoming string by a [`ConsentParser`] and discarded after
/// a single evaluation.
pub trait ConsentToken: Send + Sync {
    /// Framework version exactly as encoded. May be outside the supported
    /// set; see [`SpecVersion::from_raw`].
    fn version(&self) -> u8;

    /// Revision of the vendor list the token was encoded against.
    fn vendor_list_version(&self) -> u16;

    fn purpose_allowed(&self, purpose: PurposeId) -> bool;

    fn vendor_consent(&self, vendor: VendorId) -> bool;
}

// ---------------------------------------------------------------------------
// ConsentParser — raw string to ConsentToken
// ---------------------------------------------------------------------------

/// Decodes raw consent strings. Never returns a partially valid token.
pub trait ConsentParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<Box<dyn ConsentToken>, DecodeError>;
}

// ---------------------------------------------------------------------------
// Vendor / VendorList — one revision of the global vendor list
// ---------------------------------------------------------------------------

/// Purposes a vendor declares, per legal basis.
pub trait Vendor: Send + Sync {
    fn purpose(&self, purpose: PurposeId) -> bool;
    fn legitimate_interest(&self, purpose: PurposeId) -> bool;
}

pub trait VendorList: Send + Sync {
    fn version(&self) -> u16;

    /// A miss is a valid answer, not an error.
    fn vendor(&self, id: VendorId) -> Option<&dyn Vendor>;
}

// ---------------------------------------------------------------------------
// VendorListSource — fetches (and may cache) vendor lists
//
// This is the only suspension point in a permission decision. Retries and
// caching belong to implementations, not to callers.
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VendorListSource: Send + Sync {
    async fn fetch(
        &self,
        version: SpecVersion,
        list_version: u16,
    ) -> CatalogResult<Arc<dyn VendorList>>;
}
