//! Translation between the flat identity provider config and the nested
//! platform object

use crate::schema::SamlIdpConfig;
use oktakit::types::{DEFAULT_USERNAME_TEMPLATE, SAML2_TYPE, UNSPECIFIED_NAME_FORMAT, defaults};
use oktakit::{
    AccountLink, AccountLinkFilter, AcsEndpoint, Algorithms, GroupInclusion, LifecycleCondition,
    ProtocolSettings, Provisioning, ProvisioningConditions, ProvisioningGroups, SamlCredentials,
    SamlEndpoints, SamlIdentityProvider, SamlPolicy, SamlProtocol, SamlSubject, Signature,
    SignatureSettings, SsoEndpoint, Trust, UserNameTemplate,
};
use std::collections::BTreeSet;

/// Build the platform object from a config
///
/// Unset attributes take their platform defaults. The status is never part
/// of the object; it is changed through the lifecycle endpoints.
pub fn build(config: &SamlIdpConfig) -> SamlIdentityProvider {
    SamlIdentityProvider {
        id: None,
        name: config.name.clone(),
        kind: SAML2_TYPE.to_string(),
        issuer_mode: Some(config.issuer_mode.unwrap_or(defaults::ISSUER_MODE)),
        status: None,
        policy: SamlPolicy {
            provisioning: build_provisioning(config),
            subject: SamlSubject {
                match_type: config.subject_match_type.unwrap_or(defaults::MATCH_TYPE),
                match_attribute: config.subject_match_attribute.clone(),
                filter: config.subject_filter.clone(),
                format: config.subject_format.clone(),
                user_name_template: UserNameTemplate {
                    template: config
                        .username_template
                        .clone()
                        .unwrap_or_else(|| DEFAULT_USERNAME_TEMPLATE.to_string()),
                },
            },
            account_link: build_account_link(config),
            max_clock_skew: config.max_clock_skew,
        },
        protocol: SamlProtocol {
            kind: SAML2_TYPE.to_string(),
            algorithms: build_algorithms(config),
            endpoints: SamlEndpoints {
                acs: AcsEndpoint {
                    binding: config.acs_binding.unwrap_or(defaults::ACS_BINDING),
                    kind: config.acs_type.unwrap_or(defaults::ACS_TYPE),
                    url: Some(config.acs_url.clone()),
                },
                sso: SsoEndpoint {
                    binding: config.sso_binding.unwrap_or(defaults::SSO_BINDING),
                    destination: config.sso_destination.clone(),
                    url: config.sso_url.clone(),
                },
            },
            credentials: SamlCredentials {
                trust: Trust {
                    issuer: config.issuer.clone(),
                    audience: config.audience.clone(),
                    kid: config.kid.clone(),
                },
            },
            settings: Some(ProtocolSettings {
                name_format: config
                    .name_format
                    .clone()
                    .unwrap_or_else(|| UNSPECIFIED_NAME_FORMAT.to_string()),
            }),
        },
    }
}

fn build_provisioning(config: &SamlIdpConfig) -> Provisioning {
    Provisioning {
        action: config
            .provisioning_action
            .unwrap_or(defaults::PROVISIONING_ACTION),
        profile_master: config.profile_master.unwrap_or(false),
        conditions: ProvisioningConditions {
            deprovisioned: LifecycleCondition {
                action: config
                    .deprovisioned_action
                    .unwrap_or(defaults::LIFECYCLE_ACTION),
            },
            suspended: LifecycleCondition {
                action: config.suspended_action.unwrap_or(defaults::LIFECYCLE_ACTION),
            },
        },
        groups: ProvisioningGroups {
            action: config.groups_action.unwrap_or(defaults::GROUPS_ACTION),
            source_attribute_name: config.groups_attribute.clone(),
            assignments: non_empty(&config.groups_assignment),
            filter: non_empty(&config.groups_filter),
        },
    }
}

/// Account linking exists only when declared
fn build_account_link(config: &SamlIdpConfig) -> Option<AccountLink> {
    if config.account_link_action.is_none() && config.account_link_group_include.is_empty() {
        return None;
    }

    Some(AccountLink {
        action: config
            .account_link_action
            .unwrap_or(defaults::ACCOUNT_LINK_ACTION),
        filter: non_empty(&config.account_link_group_include).map(|include| AccountLinkFilter {
            groups: GroupInclusion { include },
        }),
    })
}

fn build_algorithms(config: &SamlIdpConfig) -> Algorithms {
    Algorithms {
        request: SignatureSettings {
            signature: Signature {
                algorithm: config
                    .request_signature_algorithm
                    .unwrap_or(defaults::REQUEST_SIGNATURE_ALGORITHM),
                scope: config
                    .request_signature_scope
                    .unwrap_or(defaults::REQUEST_SIGNATURE_SCOPE),
            },
        },
        response: SignatureSettings {
            signature: Signature {
                algorithm: config
                    .response_signature_algorithm
                    .unwrap_or(defaults::RESPONSE_SIGNATURE_ALGORITHM),
                scope: config
                    .response_signature_scope
                    .unwrap_or(defaults::RESPONSE_SIGNATURE_SCOPE),
            },
        },
    }
}

fn non_empty(set: &BTreeSet<String>) -> Option<BTreeSet<String>> {
    (!set.is_empty()).then(|| set.clone())
}

/// Copy the platform object's values into a config
///
/// Parts the platform may omit (account linking, issuer mode, status,
/// optional strings) are copied only when present, so a response that
/// leaves them out never clears a configured value.
pub fn sync(idp: &SamlIdentityProvider, config: &mut SamlIdpConfig) {
    config.name = idp.name.clone();
    config.kind = Some(idp.kind.clone());

    if let Some(mode) = idp.issuer_mode {
        config.issuer_mode = Some(mode);
    }
    if let Some(status) = idp.status {
        config.status = Some(status);
    }

    let policy = &idp.policy;
    let provisioning = &policy.provisioning;
    config.provisioning_action = Some(provisioning.action);
    config.profile_master = Some(provisioning.profile_master);
    config.deprovisioned_action = Some(provisioning.conditions.deprovisioned.action);
    config.suspended_action = Some(provisioning.conditions.suspended.action);
    config.groups_action = Some(provisioning.groups.action);
    if let Some(attribute) = &provisioning.groups.source_attribute_name {
        config.groups_attribute = Some(attribute.clone());
    }
    if let Some(assignments) = &provisioning.groups.assignments {
        config.groups_assignment = assignments.clone();
    }
    if let Some(filter) = &provisioning.groups.filter {
        config.groups_filter = filter.clone();
    }

    let subject = &policy.subject;
    config.subject_match_type = Some(subject.match_type);
    if let Some(attribute) = &subject.match_attribute {
        config.subject_match_attribute = Some(attribute.clone());
    }
    if let Some(filter) = &subject.filter {
        config.subject_filter = Some(filter.clone());
    }
    config.subject_format = subject.format.clone();
    config.username_template = Some(subject.user_name_template.template.clone());

    if let Some(link) = &policy.account_link {
        config.account_link_action = Some(link.action);
        if let Some(filter) = &link.filter {
            config.account_link_group_include = filter.groups.include.clone();
        }
    }
    if let Some(skew) = policy.max_clock_skew {
        config.max_clock_skew = Some(skew);
    }

    let protocol = &idp.protocol;
    sync_algorithms(&protocol.algorithms, config);

    let acs = &protocol.endpoints.acs;
    config.acs_binding = Some(acs.binding);
    config.acs_type = Some(acs.kind);
    // Write-only once declared; the platform may report its own computed URL
    if config.acs_url.is_empty()
        && let Some(url) = &acs.url
    {
        config.acs_url = url.clone();
    }

    let sso = &protocol.endpoints.sso;
    config.sso_binding = Some(sso.binding);
    config.sso_url = sso.url.clone();
    if let Some(destination) = &sso.destination {
        config.sso_destination = Some(destination.clone());
    }

    let trust = &protocol.credentials.trust;
    config.issuer = trust.issuer.clone();
    config.audience = trust.audience.clone();
    config.kid = trust.kid.clone();

    if let Some(settings) = &protocol.settings {
        config.name_format = Some(settings.name_format.clone());
    }
}

/// Write the four signature attributes
pub fn sync_algorithms(algorithms: &Algorithms, config: &mut SamlIdpConfig) {
    config.request_signature_algorithm = Some(algorithms.request.signature.algorithm);
    config.request_signature_scope = Some(algorithms.request.signature.scope);
    config.response_signature_algorithm = Some(algorithms.response.signature.algorithm);
    config.response_signature_scope = Some(algorithms.response.signature.scope);
}

/// The config as it reads back after a write
///
/// Besides the defaults `build` applies, this fills in what the platform
/// assigns on its own: ACTIVE status, an AUTO account link and the default
/// clock skew.
pub fn normalize(config: &SamlIdpConfig) -> SamlIdpConfig {
    let mut normalized = config.clone();
    sync(&build(config), &mut normalized);
    normalized.status.get_or_insert(defaults::STATUS);
    normalized
        .account_link_action
        .get_or_insert(defaults::ACCOUNT_LINK_ACTION);
    normalized.max_clock_skew.get_or_insert(defaults::MAX_CLOCK_SKEW);
    normalized
}
