use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::ResourceData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::SamlIdpConfig;

// ============================================================================
// State Structures
// ============================================================================

/// Local record of every managed identity provider
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct IdpsyncState {
    /// Last time the state was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    /// Records keyed by local name
    #[serde(default)]
    pub saml_idp: BTreeMap<String, IdpRecord>,
}

/// Remote id and last observed attributes of one identity provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IdpRecord {
    /// Platform-assigned id
    pub id: String,

    /// When the attributes were last read or written
    pub last_updated: DateTime<Utc>,

    /// Attributes as last read back from the platform
    pub attributes: SamlIdpConfig,
}

// ============================================================================
// IdpsyncState Implementation
// ============================================================================

impl IdpsyncState {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk, stamping `last_updated`
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Some(Utc::now());
        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        // Replace atomically; a failed write leaves the previous state
        let tmp = tmp_path(path);
        fs::write(&tmp, &content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Records as engine resource data
    pub fn records(&self) -> BTreeMap<String, ResourceData<SamlIdpConfig>> {
        self.saml_idp
            .iter()
            .map(|(name, record)| (name.clone(), record.to_data()))
            .collect()
    }

    /// One record as engine resource data
    pub fn get(&self, name: &str) -> Option<ResourceData<SamlIdpConfig>> {
        self.saml_idp.get(name).map(IdpRecord::to_data)
    }

    /// Store a record; records without an id are forgotten instead
    ///
    /// Returns whether a record was stored.
    pub fn record(&mut self, name: &str, data: ResourceData<SamlIdpConfig>) -> bool {
        let Some(id) = data.id().map(str::to_string) else {
            self.forget(name);
            return false;
        };

        self.saml_idp.insert(
            name.to_string(),
            IdpRecord {
                id,
                last_updated: Utc::now(),
                attributes: data.config,
            },
        );
        true
    }

    /// Drop a record; returns whether one existed
    pub fn forget(&mut self, name: &str) -> bool {
        self.saml_idp.remove(name).is_some()
    }

    /// Name of the record holding `id`, if any
    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.saml_idp
            .iter()
            .find(|(_, record)| record.id == id)
            .map(|(name, _)| name.as_str())
    }
}

impl IdpRecord {
    fn to_data(&self) -> ResourceData<SamlIdpConfig> {
        ResourceData::with_id(self.id.clone(), self.attributes.clone())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::minimal;
    use oktakit::Status;
    use tempfile::TempDir;

    #[test]
    fn test_default_state() {
        let state = IdpsyncState::default();
        assert!(state.saml_idp.is_empty());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let state = IdpsyncState::load(&dir.path().join("state.toml")).unwrap();
        assert_eq!(state, IdpsyncState::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut attributes = minimal("corp");
        attributes.kind = Some("SAML2".to_string());
        attributes.status = Some(Status::Inactive);
        attributes.subject_format = ["urn:a".to_string()].into_iter().collect();

        let mut state = IdpsyncState::default();
        assert!(state.record("corp", ResourceData::with_id("0oa1", attributes.clone())));
        state.save(&path).unwrap();
        assert!(state.last_updated.is_some());
        assert!(!dir.path().join("nested").join("state.toml.tmp").exists());

        let loaded = IdpsyncState::load(&path).unwrap();
        assert_eq!(loaded.saml_idp["corp"].id, "0oa1");
        assert_eq!(loaded.saml_idp["corp"].attributes, attributes);
        assert_eq!(loaded.get("corp").unwrap().id(), Some("0oa1"));
    }

    #[test]
    fn test_record_without_id_forgets() {
        let mut state = IdpsyncState::default();
        state.record("corp", ResourceData::with_id("0oa1", minimal("corp")));

        assert!(!state.record("corp", ResourceData::new(minimal("corp"))));
        assert!(state.get("corp").is_none());
    }

    #[test]
    fn test_records_and_lookup() {
        let mut state = IdpsyncState::default();
        state.record("b", ResourceData::with_id("0oa2", minimal("b")));
        state.record("a", ResourceData::with_id("0oa1", minimal("a")));

        let names: Vec<String> = state.records().into_keys().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(state.name_for_id("0oa2"), Some("b"));
        assert_eq!(state.name_for_id("0oa9"), None);

        assert!(state.forget("a"));
        assert!(!state.forget("a"));
    }

    #[test]
    fn test_invalid_state_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        fs::write(&path, "saml_idp = 5").unwrap();
        assert!(IdpsyncState::load(&path).is_err());
    }
}
