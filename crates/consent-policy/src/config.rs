use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use consent_core::{ConsentParser, VendorListSource};

use crate::engine::{AlwaysAllow, Permissions, PermissionsEngine};
use crate::error::{PermissionsError, PermissionsResult};

/// Process-wide GDPR settings.
///
/// Loaded from the `[gdpr]` table of the host configuration, or from a
/// standalone TOML file with the same keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyConfig {
    /// The host's own vendor ID. Zero disables enforcement.
    #[serde(default)]
    pub host_vendor_id: u16,

    /// Decision returned when no consent string is supplied.
    #[serde(default)]
    pub usersync_if_ambiguous: bool,

    /// Publishers whose traffic skips the personal information check.
    #[serde(default)]
    pub non_standard_publishers: Vec<String>,

    /// Bidder name to global vendor list ID.
    #[serde(default)]
    pub bidder_vendor_ids: BTreeMap<String, u16>,
}

impl PolicyConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> PermissionsResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: PolicyConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> PermissionsResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PermissionsError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> PermissionsResult<()> {
        if let Some((bidder, _)) = self.bidder_vendor_ids.iter().find(|(_, id)| **id == 0) {
            return Err(PermissionsError::Config(format!(
                "bidder '{}' is mapped to vendor id 0",
                bidder
            )));
        }
        if self.bidder_vendor_ids.keys().any(|b| b.trim().is_empty()) {
            return Err(PermissionsError::Config("bidder name must not be empty".into()));
        }
        if self
            .non_standard_publishers
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err(PermissionsError::Config(
                "non_standard_publishers must not contain empty ids".into(),
            ));
        }
        let mut seen = HashSet::new();
        for publisher in &self.non_standard_publishers {
            if !seen.insert(publisher.as_str()) {
                tracing::warn!(publisher = %publisher, "duplicate non-standard publisher");
            }
        }
        Ok(())
    }

    pub fn is_enforcing(&self) -> bool {
        self.host_vendor_id != 0
    }
}

/// Build the permissions implementation selected by `config`.
///
/// Returns [`AlwaysAllow`] when enforcement is disabled, otherwise a
/// [`PermissionsEngine`] over the given collaborators.
pub fn build_permissions(
    config: &PolicyConfig,
    parser: Arc<dyn ConsentParser>,
    vendor_lists: Arc<dyn VendorListSource>,
) -> PermissionsResult<Arc<dyn Permissions>> {
    config.validate()?;
    if !config.is_enforcing() {
        tracing::info!("gdpr host vendor id is 0, consent enforcement disabled");
        return Ok(Arc::new(AlwaysAllow));
    }
    tracing::info!(
        host_vendor_id = config.host_vendor_id,
        bidders = config.bidder_vendor_ids.len(),
        non_standard_publishers = config.non_standard_publishers.len(),
        "gdpr consent enforcement enabled"
    );
    Ok(Arc::new(PermissionsEngine::new(config, parser, vendor_lists)))
}
