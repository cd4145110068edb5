use consent_core::{CatalogError, DecodeError};
use std::fmt;
use thiserror::Error;

/// Single error enum for all permission operations.
///
/// Only two conditions reach callers from a decision: a consent string that
/// could not be decoded, and a vendor list that could not be fetched.
/// Unsupported versions, unknown bidders and vendors missing from the list
/// are denials (`Ok(false)`), not errors. Display output never contains the
/// raw consent string.
#[derive(Debug, Error)]
pub enum PermissionsError {
    #[error("malformed consent string ({} bytes): {source}", .consent.len())]
    MalformedConsent {
        consent: String,
        #[source]
        source: DecodeError,
    },

    #[error("vendor list {spec_version}/{list_version} unavailable: {source}")]
    CatalogUnavailable {
        spec_version: consent_core::SpecVersion,
        list_version: u16,
        #[source]
        source: CatalogError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PermissionsError {
    pub fn kind(&self) -> PermissionsErrorKind {
        match self {
            PermissionsError::MalformedConsent { .. } => PermissionsErrorKind::MalformedConsent,
            PermissionsError::CatalogUnavailable { .. } => {
                PermissionsErrorKind::CatalogUnavailable
            }
            PermissionsError::Config(_) => PermissionsErrorKind::Config,
            PermissionsError::Io(_) => PermissionsErrorKind::Io,
        }
    }
}

impl From<toml::de::Error> for PermissionsError {
    fn from(e: toml::de::Error) -> Self {
        PermissionsError::Config(format!("TOML parse error: {}", e))
    }
}

/// Discriminator for PermissionsError variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionsErrorKind {
    MalformedConsent,
    CatalogUnavailable,
    Config,
    Io,
}

impl fmt::Display for PermissionsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionsErrorKind::MalformedConsent => write!(f, "MalformedConsent"),
            PermissionsErrorKind::CatalogUnavailable => write!(f, "CatalogUnavailable"),
            PermissionsErrorKind::Config => write!(f, "Config"),
            PermissionsErrorKind::Io => write!(f, "Io"),
        }
    }
}

pub type PermissionsResult<T> = Result<T, PermissionsError>;
