use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// VendorId — numeric identity of an ad-bidding participant in a vendor list
// ---------------------------------------------------------------------------

/// Identifies a vendor within one specification version's global vendor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub u16);

impl VendorId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for VendorId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SpecVersion — supported consent framework versions
// ---------------------------------------------------------------------------

/// Consent framework version a token was encoded against.
///
/// Exhaustive (no #[non_exhaustive]) so adding a version forces review of
/// every purpose table and match site. Raw versions outside this set are
/// represented as `None` by [`SpecVersion::from_raw`] and never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecVersion {
    V1,
    V2,
}

impl SpecVersion {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(SpecVersion::V1),
            2 => Some(SpecVersion::V2),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            SpecVersion::V1 => 1,
            SpecVersion::V2 => 2,
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVersion::V1 => write!(f, "v1"),
            SpecVersion::V2 => write!(f, "v2"),
        }
    }
}

// ---------------------------------------------------------------------------
// PurposeId — numeric purpose constant as encoded in tokens and vendor lists
// ---------------------------------------------------------------------------

/// A purpose number. Meaning depends on the [`SpecVersion`] it is read under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PurposeId(pub u8);

impl PurposeId {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PurposeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BidderName / PublisherId — caller-facing identities
// ---------------------------------------------------------------------------

/// Name a bidder is registered under in the host configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BidderName(pub String);

impl BidderName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BidderName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for BidderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublisherId(pub String);

impl PublisherId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PublisherId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
