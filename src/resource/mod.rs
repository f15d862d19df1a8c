//! Identity provider resources
//!
//! The lifecycle controller ([`SamlIdp`]) implements the declarative
//! engine's resource contract on top of an [`oktakit::IdpBackend`]:
//! - `saml_mapper` translates between flat config and the nested object
//! - `status` reconciles the activation status out of band
//! - `saml_idp` sequences create, read, update, delete, exists and import

use oktakit::{ErrorCategory, Status};
use std::fmt;

pub mod saml_idp;
pub mod saml_mapper;
pub mod status;

pub use saml_idp::SamlIdp;

/// Errors from the identity provider lifecycle
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A platform call failed; the error is passed through unchanged
    #[error(transparent)]
    Remote(#[from] oktakit::Error),

    /// The provider was written but its activation status could not be set
    #[error("identity provider {id} was saved but could not be set {desired}: {source}")]
    StatusReconciliation {
        id: String,
        desired: Status,
        #[source]
        source: oktakit::Error,
    },

    /// The platform accepted a create without returning an id, or a
    /// record without an id was used where one is required
    #[error("no identity provider id")]
    MissingId,

    /// The platform returned an id for a record that already had another
    #[error("record already has id {existing}; platform returned {returned}")]
    IdConflict { existing: String, returned: String },
}

impl LifecycleError {
    /// Category of the underlying platform error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Remote(e) | Self::StatusReconciliation { source: e, .. } => e.category(),
            Self::MissingId => ErrorCategory::Format,
            Self::IdConflict { .. } => ErrorCategory::Other,
        }
    }
}

impl declarative::ResourceError for LifecycleError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_not_found())
    }
}

/// Observable state of one managed identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never created (no id)
    Absent,
    /// Exists and is inactive
    PresentInactive,
    /// Exists and is active
    PresentActive,
    /// Had an id, but the platform no longer knows it
    Gone,
}

impl LifecycleState {
    /// Whether the platform holds the object
    pub fn is_present(self) -> bool {
        matches!(self, Self::PresentActive | Self::PresentInactive)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::PresentInactive => "present (inactive)",
            Self::PresentActive => "present (active)",
            Self::Gone => "gone",
        };
        f.write_str(s)
    }
}
