//! # oktakit
//!
//! Typed model and blocking client for SAML identity providers on an
//! Okta-style identity platform.
//!
//! - [`types`]: the nested identity-provider object and its enumerated values
//! - [`backend`]: the [`IdpBackend`] trait, an HTTP implementation and an
//!   in-memory mock
//! - [`error`]: categorized errors (not found, rejected, auth, network)
//!
//! ## Example
//!
//! ```no_run
//! use oktakit::{HttpBackend, IdpBackend, Status};
//!
//! let backend = HttpBackend::new("https://example.okta.com", "00aBcD...");
//!
//! let idp = backend.read("0oa62bfdiumsUndnZ0h7").expect("fetch failed");
//! if idp.status != Some(Status::Inactive) {
//!     backend.set_status("0oa62bfdiumsUndnZ0h7", Status::Inactive).unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::http::HttpBackend;
pub use backend::{IdpBackend, MockBackend, MockCall};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    AccountLink, AccountLinkAction, AccountLinkFilter, AcsEndpoint, AcsType, Algorithms, Binding,
    GroupInclusion, GroupsAction, IssuerMode, LifecycleAction, LifecycleCondition, MatchType,
    ProtocolSettings, Provisioning, ProvisioningAction, ProvisioningConditions,
    ProvisioningGroups, SamlCredentials, SamlEndpoints, SamlIdentityProvider, SamlPolicy,
    SamlProtocol, SamlSubject, Signature, SignatureAlgorithm, SignatureScope, SignatureSettings,
    SsoEndpoint, Status, Trust, UserNameTemplate,
};
