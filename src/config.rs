use anyhow::{Context, Result, bail};
use oktakit::HttpBackend;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;
use crate::schema::{IdpsyncConfig, ProviderConfig};

/// Default HTTP timeout when the config sets none
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolve the config file path: explicit flag, else the default location
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(paths::expand(&path.to_string_lossy())),
        None => paths::config_file(),
    }
}

/// Resolve the state file path: explicit flag, else the default location
pub fn state_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(paths::expand(&path.to_string_lossy())),
        None => paths::state_file(),
    }
}

/// Load the config document
pub fn load(path: &Path) -> Result<IdpsyncConfig> {
    IdpsyncConfig::load(path)
}

/// Connection settings after applying command-line/environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub org_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl Connection {
    /// Merge overrides over the `[provider]` table
    ///
    /// Overrides come from `--org-url`/`OKTA_ORG_URL` and
    /// `--api-token`/`OKTA_API_TOKEN`.
    pub fn resolve(
        provider: &ProviderConfig,
        org_url: Option<&str>,
        api_token: Option<&str>,
    ) -> Result<Self> {
        let org_url = org_url
            .map(str::to_string)
            .or_else(|| provider.org_url.clone())
            .context("No org URL configured (set [provider].org_url or OKTA_ORG_URL)")?;

        let api_token = api_token
            .map(str::to_string)
            .or_else(|| provider.api_token.clone())
            .context("No API token configured (set OKTA_API_TOKEN)")?;

        if !org_url.starts_with("https://") && !org_url.starts_with("http://") {
            bail!("Org URL must start with https:// (got '{}')", org_url);
        }
        if api_token.trim().is_empty() {
            bail!("API token is empty");
        }

        Ok(Self {
            org_url: org_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: Duration::from_secs(provider.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }

    /// Build the HTTP backend
    pub fn backend(&self) -> HttpBackend {
        log::debug!("Connecting to {} (timeout {:?})", self.org_url, self.timeout);
        HttpBackend::with_timeout(self.org_url.clone(), &self.api_token, self.timeout)
    }
}
