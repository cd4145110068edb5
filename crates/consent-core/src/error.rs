use thiserror::Error;

use crate::types::SpecVersion;

/// Raised by a [`ConsentParser`](crate::ConsentParser) when a raw consent
/// string cannot be decoded. Never produced for an empty string; callers
/// handle absence of consent before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("consent decode error: {0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failures of a [`VendorListSource`](crate::VendorListSource).
///
/// A vendor missing from a list that was fetched successfully is not an
/// error; lookups return `None` for that case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("vendor list unavailable: {0}")]
    Unavailable(String),

    #[error("vendor list parse error: {0}")]
    Parse(String),

    #[error("no {version} vendor list with version {list_version}")]
    UnknownListVersion {
        version: SpecVersion,
        list_version: u16,
    },
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
