use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use consent_core::{
    BidderName, ConsentParser, PublisherId, SpecVersion, VendorId, VendorListSource,
};

use crate::config::PolicyConfig;
use crate::error::{PermissionsError, PermissionsResult};
use crate::purpose::{personal_info_permitted, purpose_table, sync_permitted};

// ---------------------------------------------------------------------------
// Permissions trait — the decision surface used by the request pipeline
// ---------------------------------------------------------------------------

/// GDPR permission decisions.
///
/// Implemented by [`PermissionsEngine`] and [`AlwaysAllow`]; callers hold a
/// `dyn Permissions` and never branch on which one is active.
#[async_trait]
pub trait Permissions: Send + Sync {
    /// May the host set or read its own cookie?
    async fn host_cookies_allowed(&self, consent: &str) -> PermissionsResult<bool>;

    /// May this bidder sync its user ID with the host?
    async fn bidder_sync_allowed(&self, bidder: &BidderName, consent: &str)
        -> PermissionsResult<bool>;

    /// May this bidder receive personal information (user IDs, device
    /// identifiers, precise geo) for this publisher's traffic?
    async fn personal_info_allowed(
        &self,
        bidder: &BidderName,
        publisher: &PublisherId,
        consent: &str,
    ) -> PermissionsResult<bool>;
}

// ---------------------------------------------------------------------------
// AlwaysAllow — enforcement disabled
// ---------------------------------------------------------------------------

/// Grants every request without reading the consent string.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

#[async_trait]
impl Permissions for AlwaysAllow {
    async fn host_cookies_allowed(&self, _consent: &str) -> PermissionsResult<bool> {
        Ok(true)
    }

    async fn bidder_sync_allowed(
        &self,
        _bidder: &BidderName,
        _consent: &str,
    ) -> PermissionsResult<bool> {
        Ok(true)
    }

    async fn personal_info_allowed(
        &self,
        _bidder: &BidderName,
        _publisher: &PublisherId,
        _consent: &str,
    ) -> PermissionsResult<bool> {
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// PermissionsEngine — consent-backed decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Sync,
    PersonalInfo,
}

/// Evaluates consent strings against the global vendor list.
///
/// Holds no per-request state; one engine serves concurrent decisions. Each
/// decision makes at most one vendor list fetch and never retries it.
pub struct PermissionsEngine {
    host_vendor_id: VendorId,
    usersync_if_ambiguous: bool,
    non_standard_publishers: HashSet<PublisherId>,
    vendor_ids: HashMap<BidderName, VendorId>,
    parser: Arc<dyn ConsentParser>,
    vendor_lists: Arc<dyn VendorListSource>,
}

impl PermissionsEngine {
    pub fn new(
        config: &PolicyConfig,
        parser: Arc<dyn ConsentParser>,
        vendor_lists: Arc<dyn VendorListSource>,
    ) -> Self {
        Self {
            host_vendor_id: VendorId(config.host_vendor_id),
            usersync_if_ambiguous: config.usersync_if_ambiguous,
            non_standard_publishers: config
                .non_standard_publishers
                .iter()
                .map(|p| PublisherId::new(p.as_str()))
                .collect(),
            vendor_ids: config
                .bidder_vendor_ids
                .iter()
                .map(|(name, id)| (BidderName::new(name.as_str()), VendorId(*id)))
                .collect(),
            parser,
            vendor_lists,
        }
    }

    pub fn vendor_id(&self, bidder: &BidderName) -> Option<VendorId> {
        self.vendor_ids.get(bidder).copied()
    }

    /// Outcome for a bidder with no vendor ID: fall back to the ambiguous
    /// consent setting when there is no consent string, deny otherwise.
    fn unknown_bidder(&self, bidder: &BidderName, consent: &str) -> bool {
        let allowed = consent.is_empty() && self.usersync_if_ambiguous;
        tracing::debug!(bidder = %bidder, allowed, "bidder has no vendor id");
        allowed
    }

    async fn allowed(
        &self,
        check: Check,
        vendor_id: VendorId,
        consent: &str,
    ) -> PermissionsResult<bool> {
        if consent.is_empty() {
            tracing::debug!(
                vendor_id = %vendor_id,
                allowed = self.usersync_if_ambiguous,
                "no consent string, using ambiguous consent setting"
            );
            return Ok(self.usersync_if_ambiguous);
        }

        let token = self.parser.parse(consent).map_err(|source| {
            tracing::warn!(
                vendor_id = %vendor_id,
                consent_len = consent.len(),
                error = %source,
                "malformed consent string"
            );
            PermissionsError::MalformedConsent {
                consent: consent.to_string(),
                source,
            }
        })?;

        let version = match SpecVersion::from_raw(token.version()) {
            Some(version) => version,
            None => {
                tracing::debug!(
                    vendor_id = %vendor_id,
                    version = token.version(),
                    "unsupported consent version, denying"
                );
                return Ok(false);
            }
        };

        let list_version = token.vendor_list_version();
        let vendor_list = self
            .vendor_lists
            .fetch(version, list_version)
            .await
            .map_err(|source| {
                tracing::warn!(
                    version = %version,
                    list_version,
                    error = %source,
                    "vendor list fetch failed"
                );
                PermissionsError::CatalogUnavailable {
                    spec_version: version,
                    list_version,
                    source,
                }
            })?;

        let vendor = match vendor_list.vendor(vendor_id) {
            Some(vendor) => vendor,
            None => {
                tracing::debug!(
                    vendor_id = %vendor_id,
                    version = %version,
                    list_version,
                    "vendor not in vendor list, denying"
                );
                return Ok(false);
            }
        };

        let table = purpose_table(version);
        let allowed = match check {
            Check::Sync => sync_permitted(table, vendor, token.as_ref(), vendor_id),
            Check::PersonalInfo => {
                personal_info_permitted(table, vendor, token.as_ref(), vendor_id)
            }
        };

        tracing::debug!(
            vendor_id = %vendor_id,
            version = %version,
            list_version,
            check = ?check,
            allowed,
            "consent evaluated"
        );
        Ok(allowed)
    }
}

#[async_trait]
impl Permissions for PermissionsEngine {
    async fn host_cookies_allowed(&self, consent: &str) -> PermissionsResult<bool> {
        self.allowed(Check::Sync, self.host_vendor_id, consent).await
    }

    async fn bidder_sync_allowed(
        &self,
        bidder: &BidderName,
        consent: &str,
    ) -> PermissionsResult<bool> {
        match self.vendor_id(bidder) {
            Some(id) => self.allowed(Check::Sync, id, consent).await,
            None => Ok(self.unknown_bidder(bidder, consent)),
        }
    }

    async fn personal_info_allowed(
        &self,
        bidder: &BidderName,
        publisher: &PublisherId,
        consent: &str,
    ) -> PermissionsResult<bool> {
        // Exempt publishers bypass consent entirely, before any parsing.
        if self.non_standard_publishers.contains(publisher) {
            tracing::debug!(publisher = %publisher, "non-standard publisher, allowing");
            return Ok(true);
        }

        match self.vendor_id(bidder) {
            Some(id) => self.allowed(Check::PersonalInfo, id, consent).await,
            None => Ok(self.unknown_bidder(bidder, consent)),
        }
    }
}
