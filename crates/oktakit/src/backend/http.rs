//! HTTP backend for an Okta-style `/api/v1/idps` API.
//!
//! Requests authenticate with an API token (`Authorization: SSWS <token>`).
//! Non-2xx responses are decoded from the platform's error body into
//! [`Error::NotFound`], [`Error::Rejected`] or [`Error::Unauthorized`].
//! There is no retry; a timeout surfaces as an [`Error::HttpError`].

use crate::backend::IdpBackend;
use crate::error::{Error, Result};
use crate::types::{SamlIdentityProvider, Status};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("oktakit/", env!("CARGO_PKG_VERSION"));

type Response = ureq::http::Response<ureq::Body>;

/// Blocking HTTP backend.
///
/// # Example
///
/// ```no_run
/// use oktakit::backend::IdpBackend;
/// use oktakit::backend::http::HttpBackend;
///
/// let backend = HttpBackend::new("https://example.okta.com", "00aBcD...");
/// let idp = backend.read("0oa62bfdiumsUndnZ0h7").unwrap();
/// println!("{} is {:?}", idp.name, idp.status);
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Org base URL without a trailing slash.
    org_url: String,
    /// Precomputed authorization header value.
    authorization: String,
}

impl HttpBackend {
    /// Create a backend with the default timeout.
    #[must_use]
    pub fn new(org_url: impl Into<String>, api_token: &str) -> Self {
        Self::with_timeout(org_url, api_token, DEFAULT_TIMEOUT)
    }

    /// Create a backend with a custom per-request timeout.
    #[must_use]
    pub fn with_timeout(org_url: impl Into<String>, api_token: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            org_url: org_url.into().trim_end_matches('/').to_string(),
            authorization: format!("SSWS {}", api_token),
        }
    }

    /// Get the org base URL.
    #[must_use]
    pub fn org_url(&self) -> &str {
        &self.org_url
    }

    /// URL of the identity provider collection.
    fn idps_url(&self) -> String {
        format!("{}/api/v1/idps", self.org_url)
    }

    /// URL of a single identity provider.
    fn idp_url(&self, id: &str) -> String {
        format!("{}/api/v1/idps/{}", self.org_url, id)
    }

    /// URL of a lifecycle transition.
    fn lifecycle_url(&self, id: &str, status: Status) -> String {
        let transition = match status {
            Status::Active => "activate",
            Status::Inactive => "deactivate",
        };
        format!("{}/api/v1/idps/{}/lifecycle/{}", self.org_url, id, transition)
    }
}

impl IdpBackend for HttpBackend {
    fn create(&self, idp: &SamlIdentityProvider) -> Result<SamlIdentityProvider> {
        let url = self.idps_url();
        log::debug!("POST {}", url);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(idp)?;

        read_json(response, None)
    }

    fn read(&self, id: &str) -> Result<SamlIdentityProvider> {
        let url = self.idp_url(id);
        log::debug!("GET {}", url);

        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call()?;

        read_json(response, Some(id))
    }

    fn update(&self, id: &str, idp: &SamlIdentityProvider) -> Result<SamlIdentityProvider> {
        let url = self.idp_url(id);
        log::debug!("PUT {}", url);

        let response = self
            .agent
            .put(&url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(idp)?;

        read_json(response, Some(id))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let url = self.idp_url(id);
        log::debug!("DELETE {}", url);

        let response = self
            .agent
            .delete(&url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call()?;

        expect_success(response, Some(id))
    }

    fn set_status(&self, id: &str, status: Status) -> Result<()> {
        let url = self.lifecycle_url(id, status);
        log::debug!("POST {}", url);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_empty()?;

        expect_success(response, Some(id))
    }
}

fn read_json<T: DeserializeOwned>(mut response: Response, id: Option<&str>) -> Result<T> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        return Err(error_from_status(status, &body, id));
    }
    Ok(response.body_mut().read_json()?)
}

fn expect_success(mut response: Response, id: Option<&str>) -> Result<()> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        return Err(error_from_status(status, &body, id));
    }
    Ok(())
}

// =============================================================================
// Platform error body
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_code: Option<String>,
    error_summary: Option<String>,
    #[serde(default)]
    error_causes: Vec<ApiErrorCause>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorCause {
    error_summary: String,
}

/// Map a non-success status and its body to an error.
fn error_from_status(status: u16, body: &str, id: Option<&str>) -> Error {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let summary = parsed
        .error_summary
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status {
        404 => Error::not_found(id.unwrap_or_default()),
        401 | 403 => Error::Unauthorized { status, summary },
        400 | 409 | 422 => Error::Rejected {
            status,
            code: parsed.error_code,
            summary,
            causes: parsed
                .error_causes
                .into_iter()
                .map(|c| c.error_summary)
                .collect(),
        },
        _ => Error::http(summary, Some(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_urls() {
        let backend = HttpBackend::new("https://example.okta.com/", "token");
        assert_eq!(backend.org_url(), "https://example.okta.com");
        assert_eq!(backend.idps_url(), "https://example.okta.com/api/v1/idps");
        assert_eq!(
            backend.idp_url("0oa1"),
            "https://example.okta.com/api/v1/idps/0oa1"
        );
        assert_eq!(
            backend.lifecycle_url("0oa1", Status::Inactive),
            "https://example.okta.com/api/v1/idps/0oa1/lifecycle/deactivate"
        );
        assert_eq!(
            backend.lifecycle_url("0oa1", Status::Active),
            "https://example.okta.com/api/v1/idps/0oa1/lifecycle/activate"
        );
    }

    #[test]
    fn test_authorization_header() {
        let backend = HttpBackend::new("https://example.okta.com", "00abc");
        assert_eq!(backend.authorization, "SSWS 00abc");
    }

    #[test]
    fn test_not_found_status() {
        let body = r#"{"errorCode":"E0000007","errorSummary":"Not found: Resource not found: 0oa1 (IdentityProvider)","errorCauses":[]}"#;
        let err = error_from_status(404, body, Some("0oa1"));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("0oa1"));
    }

    #[test]
    fn test_validation_error_status() {
        let body = r#"{
            "errorCode": "E0000001",
            "errorSummary": "Api validation failed: protocol",
            "errorCauses": [
                { "errorSummary": "protocol.credentials.trust.kid: The key id is invalid" }
            ]
        }"#;
        match error_from_status(400, body, None) {
            Error::Rejected {
                status,
                code,
                summary,
                causes,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("E0000001"));
                assert_eq!(summary, "Api validation failed: protocol");
                assert_eq!(causes.len(), 1);
                assert!(causes[0].contains("kid"));
            }
            other => panic!("Expected Error::Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_auth_error_status() {
        let body = r#"{"errorCode":"E0000011","errorSummary":"Invalid token provided"}"#;
        let err = error_from_status(401, body, None);
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(err.to_string().contains("Invalid token provided"));
    }

    #[test]
    fn test_unparseable_error_body() {
        let err = error_from_status(503, "<html>down</html>", Some("0oa1"));
        match err {
            Error::HttpError { message, status } => {
                assert_eq!(message, "HTTP 503");
                assert_eq!(status, Some(503));
            }
            other => panic!("Expected Error::HttpError, got {other:?}"),
        }
    }
}
