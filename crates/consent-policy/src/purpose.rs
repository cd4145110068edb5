use consent_core::{ConsentToken, PurposeId, SpecVersion, Vendor, VendorId};
use std::fmt;

// ---------------------------------------------------------------------------
// PurposeKind — the purposes a permission decision depends on
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurposeKind {
    /// Storing or reading identifiers on the user's device.
    InfoStorageAccess,
    /// Using data to select ads: "ad selection, delivery, reporting" in v1,
    /// "create a personalised ads profile" in v2.
    AdSelection,
}

impl fmt::Display for PurposeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurposeKind::InfoStorageAccess => write!(f, "InfoStorageAccess"),
            PurposeKind::AdSelection => write!(f, "AdSelection"),
        }
    }
}

// ---------------------------------------------------------------------------
// PurposeTable — per-version purpose numbering
// ---------------------------------------------------------------------------

/// Purpose numbers for one framework version.
///
/// Each version has its own table even where numbers coincide, so a v1
/// constant is never read under v2 semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurposeTable {
    pub version: SpecVersion,
    pub info_storage_access: PurposeId,
    pub ad_selection: PurposeId,
}

const V1_PURPOSES: PurposeTable = PurposeTable {
    version: SpecVersion::V1,
    info_storage_access: PurposeId(1),
    ad_selection: PurposeId(3),
};

const V2_PURPOSES: PurposeTable = PurposeTable {
    version: SpecVersion::V2,
    info_storage_access: PurposeId(1),
    ad_selection: PurposeId(3),
};

/// Resolve the purpose table for a framework version.
pub fn purpose_table(version: SpecVersion) -> &'static PurposeTable {
    match version {
        SpecVersion::V1 => &V1_PURPOSES,
        SpecVersion::V2 => &V2_PURPOSES,
    }
}

impl PurposeTable {
    pub fn id(&self, kind: PurposeKind) -> PurposeId {
        match kind {
            PurposeKind::InfoStorageAccess => self.info_storage_access,
            PurposeKind::AdSelection => self.ad_selection,
        }
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// A purpose passes when the vendor declares it under either legal basis
/// (consent or legitimate interest) and the user granted it.
///
/// The user grant is required even when the vendor relies on legitimate
/// interest.
pub fn purpose_satisfied(
    vendor: &dyn Vendor,
    token: &dyn ConsentToken,
    purpose: PurposeId,
) -> bool {
    (vendor.purpose(purpose) || vendor.legitimate_interest(purpose))
        && token.purpose_allowed(purpose)
}

/// Cookie sync: storage access must be declared under consent and granted,
/// and the vendor must have vendor-level consent. Legitimate interest does
/// not count here.
pub fn sync_permitted(
    table: &PurposeTable,
    vendor: &dyn Vendor,
    token: &dyn ConsentToken,
    vendor_id: VendorId,
) -> bool {
    let storage = table.id(PurposeKind::InfoStorageAccess);
    vendor.purpose(storage) && token.purpose_allowed(storage) && token.vendor_consent(vendor_id)
}

/// Personal information: storage access and ad selection must each be
/// satisfied, and the vendor must have vendor-level consent.
pub fn personal_info_permitted(
    table: &PurposeTable,
    vendor: &dyn Vendor,
    token: &dyn ConsentToken,
    vendor_id: VendorId,
) -> bool {
    [PurposeKind::InfoStorageAccess, PurposeKind::AdSelection]
        .into_iter()
        .all(|kind| purpose_satisfied(vendor, token, table.id(kind)))
        && token.vendor_consent(vendor_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_core::{ParsedConsent, VendorRecord};

    const VENDOR: VendorId = VendorId(32);

    fn full_token(version: u8) -> ParsedConsent {
        ParsedConsent::new(version, 1)
            .with_purposes([1, 3])
            .with_vendors([VENDOR.get()])
    }

    #[test]
    fn test_tables_are_distinct_per_version() {
        assert_eq!(purpose_table(SpecVersion::V1).version, SpecVersion::V1);
        assert_eq!(purpose_table(SpecVersion::V2).version, SpecVersion::V2);
        assert_ne!(
            purpose_table(SpecVersion::V1),
            purpose_table(SpecVersion::V2)
        );
    }

    #[test]
    fn test_table_ids() {
        let v1 = purpose_table(SpecVersion::V1);
        assert_eq!(v1.id(PurposeKind::InfoStorageAccess), PurposeId(1));
        assert_eq!(v1.id(PurposeKind::AdSelection), PurposeId(3));
        let v2 = purpose_table(SpecVersion::V2);
        assert_eq!(v2.id(PurposeKind::InfoStorageAccess), PurposeId(1));
        assert_eq!(v2.id(PurposeKind::AdSelection), PurposeId(3));
    }

    #[test]
    fn test_purpose_satisfied_truth_table() {
        let p = PurposeId(1);
        let granted = ParsedConsent::new(2, 1).with_purposes([1]);
        let withheld = ParsedConsent::new(2, 1);

        let consent_basis = VendorRecord::new().with_purposes([1]);
        let li_basis = VendorRecord::new().with_legitimate_interests([1]);
        let undeclared = VendorRecord::new();

        assert!(purpose_satisfied(&consent_basis, &granted, p));
        assert!(purpose_satisfied(&li_basis, &granted, p));
        assert!(!purpose_satisfied(&undeclared, &granted, p));
        assert!(!purpose_satisfied(&consent_basis, &withheld, p));
        assert!(!purpose_satisfied(&li_basis, &withheld, p));
    }

    #[test]
    fn test_sync_ignores_legitimate_interest() {
        let table = purpose_table(SpecVersion::V2);
        let token = full_token(2);
        let li_only = VendorRecord::new().with_legitimate_interests([1]);
        assert!(!sync_permitted(table, &li_only, &token, VENDOR));

        let consent_basis = VendorRecord::new().with_purposes([1]);
        assert!(sync_permitted(table, &consent_basis, &token, VENDOR));
    }

    #[test]
    fn test_sync_requires_vendor_consent() {
        let table = purpose_table(SpecVersion::V1);
        let vendor = VendorRecord::new().with_purposes([1]);
        let token = ParsedConsent::new(1, 1).with_purposes([1]);
        assert!(!sync_permitted(table, &vendor, &token, VENDOR));
    }

    #[test]
    fn test_personal_info_needs_both_purposes() {
        for version in [SpecVersion::V1, SpecVersion::V2] {
            let table = purpose_table(version);
            let vendor = VendorRecord::new()
                .with_purposes([1])
                .with_legitimate_interests([3]);

            let both = full_token(version.as_u8());
            assert!(personal_info_permitted(table, &vendor, &both, VENDOR));

            let storage_only = ParsedConsent::new(version.as_u8(), 1)
                .with_purposes([1])
                .with_vendors([VENDOR.get()]);
            assert!(!personal_info_permitted(table, &vendor, &storage_only, VENDOR));

            let selection_only = ParsedConsent::new(version.as_u8(), 1)
                .with_purposes([3])
                .with_vendors([VENDOR.get()]);
            assert!(!personal_info_permitted(table, &vendor, &selection_only, VENDOR));
        }
    }

    #[test]
    fn test_personal_info_requires_vendor_declared_purposes() {
        for version in [SpecVersion::V1, SpecVersion::V2] {
            let table = purpose_table(version);
            let token = full_token(version.as_u8());

            let storage_only = VendorRecord::new().with_purposes([1]);
            assert!(!personal_info_permitted(table, &storage_only, &token, VENDOR));

            let li_storage_only = VendorRecord::new().with_legitimate_interests([1]);
            assert!(!personal_info_permitted(table, &li_storage_only, &token, VENDOR));

            let selection_only = VendorRecord::new()
                .with_purposes([3])
                .with_legitimate_interests([3]);
            assert!(!personal_info_permitted(table, &selection_only, &token, VENDOR));

            assert!(!personal_info_permitted(table, &VendorRecord::new(), &token, VENDOR));
        }
    }

    #[test]
    fn test_personal_info_requires_vendor_consent() {
        let table = purpose_table(SpecVersion::V2);
        let vendor = VendorRecord::new().with_purposes([1, 3]);
        let token = ParsedConsent::new(2, 1).with_purposes([1, 3]);
        assert!(!personal_info_permitted(table, &vendor, &token, VENDOR));
    }
}
