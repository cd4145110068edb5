//! In-memory collaborators: prepared consent tokens and vendor lists.
//!
//! Hosts that load vendor lists out of band can serve them through
//! [`StaticVendorLists`]; tests use [`FixedConsentParser`] to get
//! deterministic tokens without a bitstream decoder.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{CatalogError, CatalogResult, DecodeError};
use crate::traits::{ConsentParser, ConsentToken, Vendor, VendorList, VendorListSource};
use crate::types::{PurposeId, SpecVersion, VendorId};

// ---------------------------------------------------------------------------
// ParsedConsent / FixedConsentParser
// ---------------------------------------------------------------------------

/// A consent token held as plain sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConsent {
    pub version: u8,
    pub vendor_list_version: u16,
    pub purposes: BTreeSet<PurposeId>,
    pub vendors: BTreeSet<VendorId>,
}

impl ParsedConsent {
    pub fn new(version: u8, vendor_list_version: u16) -> Self {
        Self {
            version,
            vendor_list_version,
            purposes: BTreeSet::new(),
            vendors: BTreeSet::new(),
        }
    }

    pub fn with_purposes(mut self, purposes: impl IntoIterator<Item = u8>) -> Self {
        self.purposes.extend(purposes.into_iter().map(PurposeId));
        self
    }

    pub fn with_vendors(mut self, vendors: impl IntoIterator<Item = u16>) -> Self {
        self.vendors.extend(vendors.into_iter().map(VendorId));
        self
    }
}

impl ConsentToken for ParsedConsent {
    fn version(&self) -> u8 {
        self.version
    }

    fn vendor_list_version(&self) -> u16 {
        self.vendor_list_version
    }

    fn purpose_allowed(&self, purpose: PurposeId) -> bool {
        self.purposes.contains(&purpose)
    }

    fn vendor_consent(&self, vendor: VendorId) -> bool {
        self.vendors.contains(&vendor)
    }
}

/// Parser that recognizes only the strings it was given.
#[derive(Debug, Clone, Default)]
pub struct FixedConsentParser {
    tokens: HashMap<String, ParsedConsent>,
}

impl FixedConsentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, raw: impl Into<String>, token: ParsedConsent) -> Self {
        self.tokens.insert(raw.into(), token);
        self
    }

    pub fn insert(&mut self, raw: impl Into<String>, token: ParsedConsent) {
        self.tokens.insert(raw.into(), token);
    }
}

impl ConsentParser for FixedConsentParser {
    fn parse(&self, raw: &str) -> Result<Box<dyn ConsentToken>, DecodeError> {
        match self.tokens.get(raw) {
            Some(token) => Ok(Box::new(token.clone())),
            None => Err(DecodeError::new(format!(
                "unrecognized consent string ({} bytes)",
                raw.len()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// VendorRecord / StaticVendorList
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRecord {
    pub purposes: BTreeSet<PurposeId>,
    pub legitimate_interests: BTreeSet<PurposeId>,
}

impl VendorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_purposes(mut self, purposes: impl IntoIterator<Item = u8>) -> Self {
        self.purposes.extend(purposes.into_iter().map(PurposeId));
        self
    }

    pub fn with_legitimate_interests(mut self, purposes: impl IntoIterator<Item = u8>) -> Self {
        self.legitimate_interests
            .extend(purposes.into_iter().map(PurposeId));
        self
    }
}

impl Vendor for VendorRecord {
    fn purpose(&self, purpose: PurposeId) -> bool {
        self.purposes.contains(&purpose)
    }

    fn legitimate_interest(&self, purpose: PurposeId) -> bool {
        self.legitimate_interests.contains(&purpose)
    }
}

/// One revision of a vendor list held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticVendorList {
    version: u16,
    vendors: BTreeMap<VendorId, VendorRecord>,
}

impl StaticVendorList {
    pub fn new(version: u16) -> Self {
        Self {
            version,
            vendors: BTreeMap::new(),
        }
    }

    pub fn with_vendor(mut self, id: u16, record: VendorRecord) -> Self {
        self.vendors.insert(VendorId(id), record);
        self
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    /// Parse a published global vendor list document.
    ///
    /// v1 documents carry `vendors` as an array with `purposeIds` and
    /// `legIntPurposeIds`; v2 documents carry `vendors` as an object keyed
    /// by vendor ID with `purposes` and `legIntPurposes`.
    pub fn from_json(version: SpecVersion, bytes: &[u8]) -> CatalogResult<Self> {
        let list = match version {
            SpecVersion::V1 => {
                let doc: GvlV1Document = serde_json::from_slice(bytes)?;
                let mut list = Self::new(doc.vendor_list_version);
                for v in doc.vendors {
                    list.vendors.insert(
                        VendorId(v.id),
                        VendorRecord::new()
                            .with_purposes(v.purpose_ids)
                            .with_legitimate_interests(v.leg_int_purpose_ids),
                    );
                }
                list
            }
            SpecVersion::V2 => {
                let doc: GvlV2Document = serde_json::from_slice(bytes)?;
                let mut list = Self::new(doc.vendor_list_version);
                for (key, v) in doc.vendors {
                    if key.parse::<u16>().ok() != Some(v.id) {
                        return Err(CatalogError::Parse(format!(
                            "vendor key {} does not match id {}",
                            key, v.id
                        )));
                    }
                    list.vendors.insert(
                        VendorId(v.id),
                        VendorRecord::new()
                            .with_purposes(v.purposes)
                            .with_legitimate_interests(v.leg_int_purposes),
                    );
                }
                list
            }
        };
        tracing::debug!(
            version = %version,
            list_version = list.version,
            vendors = list.vendors.len(),
            "parsed vendor list"
        );
        Ok(list)
    }
}

impl VendorList for StaticVendorList {
    fn version(&self) -> u16 {
        self.version
    }

    fn vendor(&self, id: VendorId) -> Option<&dyn Vendor> {
        self.vendors.get(&id).map(|v| v as &dyn Vendor)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GvlV1Document {
    vendor_list_version: u16,
    #[serde(default)]
    vendors: Vec<GvlV1Vendor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GvlV1Vendor {
    id: u16,
    #[serde(default)]
    purpose_ids: Vec<u8>,
    #[serde(default)]
    leg_int_purpose_ids: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GvlV2Document {
    vendor_list_version: u16,
    #[serde(default)]
    vendors: BTreeMap<String, GvlV2Vendor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GvlV2Vendor {
    id: u16,
    #[serde(default)]
    purposes: Vec<u8>,
    #[serde(default)]
    leg_int_purposes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// StaticVendorLists — VendorListSource over preloaded lists
// ---------------------------------------------------------------------------

type ListMap = HashMap<(SpecVersion, u16), Arc<StaticVendorList>>;

/// Serves vendor lists registered up front, keyed by framework version and
/// list revision.
///
/// A forced failure can be installed to simulate an unreachable upstream.
#[derive(Default)]
pub struct StaticVendorLists {
    lists: Mutex<ListMap>,
    failure: Mutex<Option<CatalogError>>,
    fetches: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> CatalogResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| CatalogError::Unavailable(format!("lock poisoned: {}", e)))
}

impl StaticVendorLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, version: SpecVersion, list: StaticVendorList) -> Self {
        // A fresh instance cannot be poisoned.
        if let Ok(mut lists) = self.lists.lock() {
            lists.insert((version, list.version), Arc::new(list));
        }
        self
    }

    pub fn insert(&self, version: SpecVersion, list: StaticVendorList) -> CatalogResult<()> {
        lock(&self.lists)?.insert((version, list.version), Arc::new(list));
        Ok(())
    }

    /// Make every subsequent fetch fail with `error` until cleared.
    pub fn fail_with(&self, error: CatalogError) -> CatalogResult<()> {
        *lock(&self.failure)? = Some(error);
        Ok(())
    }

    pub fn clear_failure(&self) -> CatalogResult<()> {
        *lock(&self.failure)? = None;
        Ok(())
    }

    /// Number of fetch calls served, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VendorListSource for StaticVendorLists {
    async fn fetch(
        &self,
        version: SpecVersion,
        list_version: u16,
    ) -> CatalogResult<Arc<dyn VendorList>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = lock(&self.failure)?.clone() {
            return Err(err);
        }

        let lists = lock(&self.lists)?;
        match lists.get(&(version, list_version)) {
            Some(list) => Ok(Arc::clone(list) as Arc<dyn VendorList>),
            None => Err(CatalogError::UnknownListVersion {
                version,
                list_version,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GVL_V1: &str = r#"{
        "vendorListVersion": 74,
        "lastUpdated": "2018-05-30T16:00:15Z",
        "purposes": [{"id": 1, "name": "Storage and access of information"}],
        "vendors": [
            {"id": 2, "name": "Captify", "purposeIds": [1, 2, 3], "legIntPurposeIds": [], "featureIds": []},
            {"id": 32, "name": "AppNexus", "purposeIds": [1], "legIntPurposeIds": [3], "featureIds": [2]}
        ]
    }"#;

    const GVL_V2: &str = r#"{
        "gvlSpecificationVersion": 2,
        "vendorListVersion": 12,
        "tcfPolicyVersion": 2,
        "vendors": {
            "8": {"id": 8, "name": "Emerse", "purposes": [1, 3], "legIntPurposes": [2], "flexiblePurposes": []},
            "32": {"id": 32, "name": "AppNexus", "purposes": [], "legIntPurposes": [1, 3]}
        }
    }"#;

    #[test]
    fn test_parsed_consent_lookups() {
        let token = ParsedConsent::new(2, 12)
            .with_purposes([1, 3])
            .with_vendors([32]);
        assert_eq!(token.version(), 2);
        assert_eq!(token.vendor_list_version(), 12);
        assert!(token.purpose_allowed(PurposeId(1)));
        assert!(!token.purpose_allowed(PurposeId(2)));
        assert!(token.vendor_consent(VendorId(32)));
        assert!(!token.vendor_consent(VendorId(8)));
    }

    #[test]
    fn test_fixed_parser_known_and_unknown() {
        let parser = FixedConsentParser::new().with_token("COabc", ParsedConsent::new(1, 5));
        let token = parser.parse("COabc").unwrap();
        assert_eq!(token.version(), 1);
        assert_eq!(token.vendor_list_version(), 5);

        let err = parser.parse("garbage").err().unwrap();
        assert!(err.to_string().contains("7 bytes"));
        assert!(!err.to_string().contains("garbage"));
    }

    #[test]
    fn test_vendor_record_legal_bases_are_separate() {
        let record = VendorRecord::new()
            .with_purposes([1])
            .with_legitimate_interests([3]);
        assert!(record.purpose(PurposeId(1)));
        assert!(!record.legitimate_interest(PurposeId(1)));
        assert!(record.legitimate_interest(PurposeId(3)));
        assert!(!record.purpose(PurposeId(3)));
    }

    #[test]
    fn test_gvl_v1_parse() {
        let list = StaticVendorList::from_json(SpecVersion::V1, GVL_V1.as_bytes()).unwrap();
        assert_eq!(list.version(), 74);
        assert_eq!(list.len(), 2);
        let appnexus = list.vendor(VendorId(32)).unwrap();
        assert!(appnexus.purpose(PurposeId(1)));
        assert!(appnexus.legitimate_interest(PurposeId(3)));
        assert!(list.vendor(VendorId(99)).is_none());
    }

    #[test]
    fn test_gvl_v2_parse() {
        let list = StaticVendorList::from_json(SpecVersion::V2, GVL_V2.as_bytes()).unwrap();
        assert_eq!(list.version(), 12);
        let emerse = list.vendor(VendorId(8)).unwrap();
        assert!(emerse.purpose(PurposeId(3)));
        assert!(emerse.legitimate_interest(PurposeId(2)));
        let appnexus = list.vendor(VendorId(32)).unwrap();
        assert!(!appnexus.purpose(PurposeId(1)));
        assert!(appnexus.legitimate_interest(PurposeId(1)));
    }

    #[test]
    fn test_gvl_shape_mismatch_is_parse_error() {
        let err = StaticVendorList::from_json(SpecVersion::V2, GVL_V1.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_gvl_v2_key_mismatch_rejected() {
        let doc = r#"{"vendorListVersion": 1, "vendors": {"9": {"id": 8}}}"#;
        let err = StaticVendorList::from_json(SpecVersion::V2, doc.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_static_lists_fetch() {
        let source = StaticVendorLists::new().with_list(
            SpecVersion::V2,
            StaticVendorList::new(12).with_vendor(8, VendorRecord::new().with_purposes([1])),
        );

        let list = source.fetch(SpecVersion::V2, 12).await.unwrap();
        assert_eq!(list.version(), 12);
        assert!(list.vendor(VendorId(8)).is_some());

        // Same revision number under another framework version is a miss.
        let err = source.fetch(SpecVersion::V1, 12).await.err().unwrap();
        assert_eq!(
            err,
            CatalogError::UnknownListVersion {
                version: SpecVersion::V1,
                list_version: 12
            }
        );
        assert_eq!(source.fetch_count(), 2);

        source
            .insert(SpecVersion::V1, StaticVendorList::new(12))
            .unwrap();
        let list = source.fetch(SpecVersion::V1, 12).await.unwrap();
        assert!(list.vendor(VendorId(8)).is_none());
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_static_lists_forced_failure() {
        let source = StaticVendorLists::new().with_list(SpecVersion::V1, StaticVendorList::new(3));
        source
            .fail_with(CatalogError::Unavailable("timeout".into()))
            .unwrap();
        assert!(matches!(
            source.fetch(SpecVersion::V1, 3).await,
            Err(CatalogError::Unavailable(_))
        ));

        source.clear_failure().unwrap();
        assert!(source.fetch(SpecVersion::V1, 3).await.is_ok());
    }
}
