use anyhow::{Context, Result};
use oktakit::{
    AccountLinkAction, AcsType, Binding, GroupsAction, IssuerMode, LifecycleAction, MatchType,
    ProvisioningAction, SignatureAlgorithm, SignatureScope, Status,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ============================================================================
// Main Config Schema
// ============================================================================

/// The idpsync configuration document
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IdpsyncConfig {
    /// Connection settings for the identity platform
    #[serde(default)]
    pub provider: ProviderConfig,

    /// SAML identity providers, keyed by local name
    #[serde(default)]
    pub saml_idp: BTreeMap<String, SamlIdpConfig>,
}

impl IdpsyncConfig {
    /// Load a config file; a missing file is an empty config
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        config.validate()?;

        log::debug!(
            "Loaded {} identity provider(s) from {}",
            config.saml_idp.len(),
            path.display()
        );
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, idp) in &self.saml_idp {
            idp.validate()
                .with_context(|| format!("Invalid saml_idp '{}'", name))?;
        }
        Ok(())
    }
}

// ============================================================================
// Provider - connection to the identity platform
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the org, e.g. https://example.okta.com
    #[serde(default)]
    pub org_url: Option<String>,

    /// API token (prefer OKTA_API_TOKEN)
    #[serde(default)]
    pub api_token: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// SAML identity provider
// ============================================================================

/// Flat configuration of one SAML identity provider
///
/// Attributes with a platform default are optional; they are filled in once
/// the provider has been written and read back. The same struct is stored in
/// the state file as the last observed attributes.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SamlIdpConfig {
    /// Display name on the platform
    pub name: String,

    /// Computed type tag; never set in a config file
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_mode: Option<IssuerMode>,

    // Endpoints
    #[serde(default)]
    pub acs_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acs_binding: Option<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acs_type: Option<AcsType>,

    #[serde(default)]
    pub sso_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_binding: Option<Binding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_destination: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    // Subject
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub subject_format: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_match_type: Option<MatchType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_match_attribute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_template: Option<String>,

    // Trust
    #[serde(default)]
    pub issuer: String,

    #[serde(default)]
    pub audience: String,

    #[serde(default)]
    pub kid: String,

    // Provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_action: Option<ProvisioningAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprovisioned_action: Option<LifecycleAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_action: Option<LifecycleAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups_action: Option<GroupsAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups_attribute: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups_assignment: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups_filter: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_master: Option<bool>,

    // Account linking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_link_action: Option<AccountLinkAction>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub account_link_group_include: BTreeSet<String>,

    /// Allowed clock skew in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clock_skew: Option<u64>,

    // Algorithms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_signature_algorithm: Option<SignatureAlgorithm>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_signature_scope: Option<SignatureScope>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_signature_algorithm: Option<SignatureAlgorithm>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_signature_scope: Option<SignatureScope>,
}

impl SamlIdpConfig {
    /// Validate a declared identity provider
    pub fn validate(&self) -> Result<()> {
        if self.kind.is_some() {
            anyhow::bail!("'type' is computed and cannot be set");
        }

        let required = [
            ("name", &self.name),
            ("acs_url", &self.acs_url),
            ("sso_url", &self.sso_url),
            ("issuer", &self.issuer),
            ("audience", &self.audience),
            ("kid", &self.kid),
        ];
        for (attribute, value) in required {
            if value.is_empty() {
                anyhow::bail!("'{}' is required", attribute);
            }
        }

        Ok(())
    }

    /// Copy without the computed type tag, as written in a config file
    pub fn as_declared(&self) -> Self {
        Self {
            kind: None,
            ..self.clone()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A config with only the required attributes set
    pub(crate) fn minimal(name: &str) -> SamlIdpConfig {
        SamlIdpConfig {
            name: name.to_string(),
            acs_url: "https://example.okta.com/sso/saml2/acs".to_string(),
            sso_url: "https://idp.example.com/sso".to_string(),
            issuer: "urn:example:idp".to_string(),
            audience: "urn:example:sp".to_string(),
            kid: "kid-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_example_config() {
        let toml = r#"
[provider]
org_url = "https://example.okta.com"
timeout_secs = 10

[saml_idp.corp]
name = "Corp IdP"
acs_url = "https://example.okta.com/sso/saml2/acs"
sso_url = "https://idp.corp.example/sso"
sso_binding = "HTTP-REDIRECT"
issuer = "urn:corp:idp"
audience = "urn:corp:sp"
kid = "corp-kid"
status = "INACTIVE"
subject_format = [
    "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
    "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress",
    "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
]
groups_action = "ASSIGN"
groups_assignment = ["00g2", "00g1"]
request_signature_algorithm = "SHA-1"
"#;

        let config: IdpsyncConfig = toml::from_str(toml).expect("Failed to parse config");
        config.validate().unwrap();

        assert_eq!(
            config.provider.org_url.as_deref(),
            Some("https://example.okta.com")
        );
        assert_eq!(config.provider.timeout_secs, Some(10));

        let corp = &config.saml_idp["corp"];
        assert_eq!(corp.name, "Corp IdP");
        assert_eq!(corp.sso_binding, Some(Binding::Redirect));
        assert_eq!(corp.status, Some(Status::Inactive));
        assert_eq!(corp.subject_format.len(), 2);
        assert_eq!(corp.groups_action, Some(GroupsAction::Assign));
        assert_eq!(
            corp.groups_assignment.iter().collect::<Vec<_>>(),
            vec!["00g1", "00g2"]
        );
        assert_eq!(
            corp.request_signature_algorithm,
            Some(SignatureAlgorithm::Sha1)
        );
        assert_eq!(corp.issuer_mode, None);
        assert_eq!(corp.kind, None);
    }

    #[test]
    fn test_type_is_rejected() {
        let mut idp = minimal("corp");
        idp.kind = Some("SAML2".to_string());
        let err = idp.validate().unwrap_err();
        assert!(err.to_string().contains("computed"));
    }

    #[test]
    fn test_missing_required_attribute() {
        let mut idp = minimal("corp");
        idp.kid = String::new();
        let err = idp.validate().unwrap_err();
        assert!(err.to_string().contains("kid"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let toml = r#"
[saml_idp.corp]
name = "Corp"
acs_url = "a"
sso_url = "b"
issuer = "c"
audience = "d"
kid = "e"
colour = "blue"
"#;
        assert!(toml::from_str::<IdpsyncConfig>(toml).is_err());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let toml = r#"
[saml_idp.corp]
name = "Corp"
acs_type = "TENANT"
"#;
        assert!(toml::from_str::<IdpsyncConfig>(toml).is_err());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = IdpsyncConfig::load(&dir.path().join("config.toml")).unwrap();
        assert!(config.saml_idp.is_empty());
    }

    #[test]
    fn test_load_rejects_type_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[saml_idp.corp]
name = "Corp"
type = "SAML2"
acs_url = "a"
sso_url = "b"
issuer = "c"
audience = "d"
kid = "e"
"#,
        )
        .unwrap();

        let err = IdpsyncConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("computed"));
    }

    #[test]
    fn test_serialize_skips_unset() {
        let toml = toml::to_string(&minimal("corp")).unwrap();
        assert!(!toml.contains("status"));
        assert!(!toml.contains("subject_format"));
        assert!(toml.contains("acs_url"));
    }

    #[test]
    fn test_as_declared_drops_type() {
        let mut idp = minimal("corp");
        idp.kind = Some("SAML2".to_string());
        assert!(idp.as_declared().validate().is_ok());
    }
}
