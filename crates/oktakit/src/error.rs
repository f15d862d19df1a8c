//! Error types for identity-provider API operations.
//!
//! Errors are categorized so callers can tell a resource that no longer
//! exists apart from a request the platform refused, and give the user
//! matching advice.

use std::fmt;

/// Result type alias for oktakit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The identity provider does not exist (deleted out of band).
    NotFound,
    /// The platform refused the submitted object.
    Rejected,
    /// Missing or insufficient credentials.
    Auth,
    /// Transport failure, timeout or unexpected status.
    Network,
    /// The response could not be decoded.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Identity provider not found",
            Self::Rejected => "Request rejected by the platform",
            Self::Auth => "Not authorized",
            Self::Network => "Network or server issue",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "It was probably deleted outside idpsync; run `idpsync refresh`",
            Self::Rejected => "Check the trust credentials and endpoint bindings in your config",
            Self::Auth => "Check the API token and that it belongs to a super admin",
            Self::Network => "Check the org URL and your connection, then try again",
            Self::Format => "The org may run an API version this client does not understand",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors returned by identity-provider API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The identity provider does not exist.
    #[error("identity provider not found: {id}")]
    NotFound {
        /// Identifier that failed to resolve.
        id: String,
    },

    /// The platform rejected the request body.
    #[error("request rejected (HTTP {status}): {summary}{}", format_causes(.causes))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Platform error code, e.g. `E0000001`.
        code: Option<String>,
        /// Platform error summary.
        summary: String,
        /// Per-field causes.
        causes: Vec<String>,
    },

    /// Authentication or authorization failure.
    #[error("not authorized (HTTP {status}): {summary}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Platform error summary.
        summary: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// A string did not name a known enumerated value.
    #[error("unknown {kind} value: {value}")]
    UnknownValue {
        /// Enumeration name.
        kind: &'static str,
        /// Offending value.
        value: String,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

fn format_causes(causes: &[String]) -> String {
    if causes.is_empty() {
        String::new()
    } else {
        format!(" ({})", causes.join("; "))
    }
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error for an identifier.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Rejected { .. } => ErrorCategory::Rejected,
            Error::Unauthorized { .. } => ErrorCategory::Auth,
            Error::HttpError { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::UnknownValue { .. } => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether the error means the identity provider no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
