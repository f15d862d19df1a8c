//! Typed model of a SAML 2.0 identity provider.
//!
//! The structs mirror the nesting of the platform's `/api/v1/idps` objects
//! (camelCase on the wire). They carry no behavior; translating to and from
//! a flat configuration is done by the caller.
//!
//! Enumerated wire values live in a small constants table: each enum knows
//! its wire string, and [`defaults`] holds the values used when a
//! configuration leaves a field out.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Type tag of SAML 2.0 identity providers and their protocol object.
pub const SAML2_TYPE: &str = "SAML2";

/// NameID format used when none is configured.
pub const UNSPECIFIED_NAME_FORMAT: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";

/// Username template used when none is configured.
pub const DEFAULT_USERNAME_TEMPLATE: &str = "idpuser.email";

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The value as sent over the wire.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| Error::UnknownValue {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

wire_enum! {
    /// HTTP binding used to convey a SAML message.
    Binding {
        /// HTTP POST binding.
        Post => "HTTP-POST",
        /// HTTP Redirect binding.
        Redirect => "HTTP-REDIRECT",
    }
}

wire_enum! {
    /// Assertion Consumer Service endpoint scope.
    AcsType {
        /// ACS URL specific to this identity provider instance.
        Instance => "INSTANCE",
        /// ACS URL shared by the whole org.
        Org => "ORG",
    }
}

wire_enum! {
    /// Which domain the platform uses as the SAML issuer.
    IssuerMode {
        /// The org's default URL.
        OrgUrl => "ORG_URL",
        /// A custom URL domain.
        CustomUrlDomain => "CUSTOM_URL",
    }
}

wire_enum! {
    /// Activation status of an identity provider.
    Status {
        /// Active.
        Active => "ACTIVE",
        /// Inactive.
        Inactive => "INACTIVE",
    }
}

wire_enum! {
    /// How users are provisioned on first sign-in.
    ProvisioningAction {
        /// Create or update the user automatically.
        Auto => "AUTO",
        /// Delegate to an inline hook.
        Callout => "CALLOUT",
        /// Never provision.
        Disabled => "DISABLED",
    }
}

wire_enum! {
    /// Action applied to a user in a deprovisioned or suspended state.
    LifecycleAction {
        /// Leave the user alone.
        None => "NONE",
        /// Reactivate a deprovisioned user.
        Reactivate => "REACTIVATE",
        /// Unsuspend a suspended user.
        Unsuspend => "UNSUSPEND",
    }
}

wire_enum! {
    /// Group membership handling during provisioning.
    GroupsAction {
        /// Ignore groups.
        None => "NONE",
        /// Sync memberships from a SAML attribute.
        Sync => "SYNC",
        /// Add to the listed groups, keeping existing memberships.
        Append => "APPEND",
        /// Assign to the listed groups.
        Assign => "ASSIGN",
    }
}

wire_enum! {
    /// How an incoming subject is matched against existing users.
    MatchType {
        /// Match on username.
        Username => "USERNAME",
        /// Match on primary email.
        Email => "EMAIL",
        /// Match on username or email.
        UsernameOrEmail => "USERNAME_OR_EMAIL",
        /// Match on a custom profile attribute.
        CustomAttribute => "CUSTOM_ATTRIBUTE",
    }
}

wire_enum! {
    /// Account linking behavior.
    AccountLinkAction {
        /// Link accounts automatically.
        Auto => "AUTO",
        /// Never link.
        Disabled => "DISABLED",
    }
}

wire_enum! {
    /// Signature digest algorithm.
    SignatureAlgorithm {
        /// SHA-1.
        Sha1 => "SHA-1",
        /// SHA-256.
        Sha256 => "SHA-256",
    }
}

wire_enum! {
    /// Which part of a SAML message carries the signature.
    SignatureScope {
        /// The authentication request.
        Request => "REQUEST",
        /// The response envelope.
        Response => "RESPONSE",
        /// The assertion.
        Assertion => "ASSERTION",
        /// Either response or assertion.
        Any => "ANY",
        /// No signature.
        None => "NONE",
    }
}

/// Values applied when a configuration leaves the field unset.
pub mod defaults {
    use super::{
        AccountLinkAction, AcsType, Binding, GroupsAction, IssuerMode, LifecycleAction,
        MatchType, ProvisioningAction, SignatureAlgorithm, SignatureScope, Status,
    };

    /// ACS endpoint type.
    pub const ACS_TYPE: AcsType = AcsType::Instance;
    /// ACS endpoint binding.
    pub const ACS_BINDING: Binding = Binding::Post;
    /// SSO endpoint binding.
    pub const SSO_BINDING: Binding = Binding::Post;
    /// Issuer mode.
    pub const ISSUER_MODE: IssuerMode = IssuerMode::OrgUrl;
    /// Activation status the platform assigns to new identity providers.
    pub const STATUS: Status = Status::Active;
    /// Provisioning action.
    pub const PROVISIONING_ACTION: ProvisioningAction = ProvisioningAction::Auto;
    /// Deprovisioned and suspended lifecycle actions.
    pub const LIFECYCLE_ACTION: LifecycleAction = LifecycleAction::None;
    /// Group sync action.
    pub const GROUPS_ACTION: GroupsAction = GroupsAction::None;
    /// Subject match type.
    pub const MATCH_TYPE: MatchType = MatchType::Username;
    /// Account link action; the platform assigns it when none is submitted.
    pub const ACCOUNT_LINK_ACTION: AccountLinkAction = AccountLinkAction::Auto;
    /// Clock skew in milliseconds the platform assigns when none is submitted.
    pub const MAX_CLOCK_SKEW: u64 = 120_000;
    /// Request signature algorithm.
    pub const REQUEST_SIGNATURE_ALGORITHM: SignatureAlgorithm = SignatureAlgorithm::Sha256;
    /// Request signature scope.
    pub const REQUEST_SIGNATURE_SCOPE: SignatureScope = SignatureScope::Request;
    /// Response signature algorithm.
    pub const RESPONSE_SIGNATURE_ALGORITHM: SignatureAlgorithm = SignatureAlgorithm::Sha256;
    /// Response signature scope.
    pub const RESPONSE_SIGNATURE_SCOPE: SignatureScope = SignatureScope::Any;
}

// =============================================================================
// Identity provider
// =============================================================================

/// A SAML 2.0 identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamlIdentityProvider {
    /// Identifier assigned by the platform on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Type tag, always [`SAML2_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Issuer mode. Older orgs omit it from responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_mode: Option<IssuerMode>,
    /// Activation status. Read-only here: it changes through the lifecycle
    /// endpoints, never through create or update.
    #[serde(default, skip_serializing)]
    pub status: Option<Status>,
    /// Provisioning, subject and account-link policy.
    pub policy: SamlPolicy,
    /// Protocol settings.
    pub protocol: SamlProtocol,
}

/// Identity provider policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamlPolicy {
    /// User provisioning.
    pub provisioning: Provisioning,
    /// Subject matching.
    pub subject: SamlSubject,
    /// Account linking, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_link: Option<AccountLink>,
    /// Allowed clock skew in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clock_skew: Option<u64>,
}

/// User provisioning policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioning {
    /// Provisioning action.
    pub action: ProvisioningAction,
    /// Whether this identity provider is the profile master.
    #[serde(default)]
    pub profile_master: bool,
    /// Lifecycle conditions.
    pub conditions: ProvisioningConditions,
    /// Group handling.
    pub groups: ProvisioningGroups,
}

/// Actions for users in deprovisioned or suspended states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConditions {
    /// Deprovisioned users.
    pub deprovisioned: LifecycleCondition,
    /// Suspended users.
    pub suspended: LifecycleCondition,
}

/// A single lifecycle condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleCondition {
    /// Action to take.
    pub action: LifecycleAction,
}

/// Group handling during provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningGroups {
    /// Group action.
    pub action: GroupsAction,
    /// SAML attribute carrying group names (SYNC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attribute_name: Option<String>,
    /// Group ids to assign (APPEND, ASSIGN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<BTreeSet<String>>,
    /// Group ids allowed to sync (SYNC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeSet<String>>,
}

/// Subject matching policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamlSubject {
    /// Match type.
    pub match_type: MatchType,
    /// Profile attribute used with [`MatchType::CustomAttribute`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_attribute: Option<String>,
    /// Regular expression applied to the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Accepted NameID formats. A set: duplicates collapse and order is
    /// irrelevant, whatever order the platform echoes them back in.
    #[serde(default)]
    pub format: BTreeSet<String>,
    /// Template for the platform username.
    pub user_name_template: UserNameTemplate,
}

/// Username template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNameTemplate {
    /// Expression evaluated against the incoming assertion.
    pub template: String,
}

/// Account linking policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLink {
    /// Link action.
    pub action: AccountLinkAction,
    /// Restrict linking to members of these groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<AccountLinkFilter>,
}

/// Account link filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLinkFilter {
    /// Group restriction.
    pub groups: GroupInclusion,
}

/// Group ids included by a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInclusion {
    /// Included group ids.
    #[serde(default)]
    pub include: BTreeSet<String>,
}

// =============================================================================
// Protocol
// =============================================================================

/// SAML protocol configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlProtocol {
    /// Type tag, always [`SAML2_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Signature algorithms.
    pub algorithms: Algorithms,
    /// ACS and SSO endpoints.
    pub endpoints: SamlEndpoints,
    /// Trust credentials.
    pub credentials: SamlCredentials,
    /// NameID settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ProtocolSettings>,
}

/// Request and response signature settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Algorithms {
    /// Signing of outgoing authentication requests.
    pub request: SignatureSettings,
    /// Verification of incoming responses.
    pub response: SignatureSettings,
}

/// Wrapper matching the wire nesting `{ "signature": { .. } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSettings {
    /// Signature parameters.
    pub signature: Signature,
}

/// Signature parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Digest algorithm.
    pub algorithm: SignatureAlgorithm,
    /// Signed scope.
    pub scope: SignatureScope,
}

/// Protocol endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlEndpoints {
    /// Assertion Consumer Service.
    pub acs: AcsEndpoint,
    /// Single sign-on.
    pub sso: SsoEndpoint,
}

/// Assertion Consumer Service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcsEndpoint {
    /// Binding.
    pub binding: Binding,
    /// Endpoint type.
    #[serde(rename = "type")]
    pub kind: AcsType,
    /// Endpoint URL, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Identity provider SSO endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoEndpoint {
    /// Binding.
    pub binding: Binding,
    /// Destination attribute of the authentication request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// SSO URL.
    pub url: String,
}

/// Trust credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlCredentials {
    /// Trust anchor.
    pub trust: Trust,
}

/// Trust anchor. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trust {
    /// Expected assertion issuer.
    pub issuer: String,
    /// Expected audience.
    pub audience: String,
    /// Key id of the signing certificate.
    pub kid: String,
}

/// NameID settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSettings {
    /// NameID format requested from the identity provider.
    pub name_format: String,
}
