//! SAML identity provider lifecycle controller

use super::status::reconcile_status;
use super::{LifecycleError, LifecycleState, saml_mapper};
use crate::schema::SamlIdpConfig;
use declarative::{Resource, ResourceData};
use oktakit::types::defaults;
use oktakit::{IdpBackend, Status};

/// Manages SAML identity providers through a platform backend
///
/// Each operation builds a fresh platform object from the record's config;
/// nothing is cached between calls.
pub struct SamlIdp<'a> {
    backend: &'a dyn IdpBackend,
}

impl<'a> SamlIdp<'a> {
    pub fn new(backend: &'a dyn IdpBackend) -> Self {
        Self { backend }
    }

    /// Current lifecycle state of a record
    pub fn observe(&self, data: &ResourceData<SamlIdpConfig>) -> Result<LifecycleState, LifecycleError> {
        let Some(id) = data.id() else {
            return Ok(LifecycleState::Absent);
        };

        match self.backend.read(id) {
            Ok(idp) => Ok(match idp.status.unwrap_or(defaults::STATUS) {
                Status::Active => LifecycleState::PresentActive,
                Status::Inactive => LifecycleState::PresentInactive,
            }),
            Err(e) if e.is_not_found() => Ok(LifecycleState::Gone),
            Err(e) => Err(e.into()),
        }
    }

    fn require_id(data: &ResourceData<SamlIdpConfig>) -> Result<String, LifecycleError> {
        data.id().map(str::to_string).ok_or(LifecycleError::MissingId)
    }
}

impl Resource for SamlIdp<'_> {
    type Config = SamlIdpConfig;
    type Error = LifecycleError;

    fn resource_type(&self) -> &'static str {
        "saml_idp"
    }

    fn create(&self, data: &mut ResourceData<SamlIdpConfig>) -> Result<(), LifecycleError> {
        // Record the defaults as applied so omitted response fields keep them
        data.config = saml_mapper::normalize(&data.config);
        let idp = saml_mapper::build(&data.config);

        let created = self.backend.create(&idp)?;
        let id = created.id.ok_or(LifecycleError::MissingId)?;
        if !data.set_id(id.clone()) {
            return Err(LifecycleError::IdConflict {
                existing: data.id().unwrap_or_default().to_string(),
                returned: id,
            });
        }
        log::info!("Created identity provider {} ({})", data.config.name, id);

        let desired = data.config.status.unwrap_or(defaults::STATUS);
        reconcile_status(self.backend, &id, created.status, desired)?;

        self.read(data)
    }

    fn read(&self, data: &mut ResourceData<SamlIdpConfig>) -> Result<(), LifecycleError> {
        let id = Self::require_id(data)?;
        let idp = self.backend.read(&id)?;
        saml_mapper::sync(&idp, &mut data.config);
        Ok(())
    }

    fn update(&self, data: &mut ResourceData<SamlIdpConfig>) -> Result<(), LifecycleError> {
        let id = Self::require_id(data)?;
        data.config = saml_mapper::normalize(&data.config);
        let idp = saml_mapper::build(&data.config);

        let updated = self.backend.update(&id, &idp)?;
        log::info!("Updated identity provider {} ({})", data.config.name, id);

        let desired = data.config.status.unwrap_or(defaults::STATUS);
        reconcile_status(self.backend, &id, updated.status, desired)?;

        self.read(data)
    }

    fn delete(&self, data: &ResourceData<SamlIdpConfig>) -> Result<(), LifecycleError> {
        let id = Self::require_id(data)?;
        self.backend.delete(&id)?;
        log::info!("Deleted identity provider {}", id);
        Ok(())
    }

    fn exists(&self, data: &ResourceData<SamlIdpConfig>) -> Result<bool, LifecycleError> {
        let id = Self::require_id(data)?;
        match self.backend.read(&id) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn import(&self, id: &str) -> Result<ResourceData<SamlIdpConfig>, LifecycleError> {
        let mut data = ResourceData::with_id(id, SamlIdpConfig::default());
        self.read(&mut data)?;
        log::info!("Imported identity provider {} ({})", data.config.name, id);
        Ok(data)
    }

    fn normalize(&self, config: &SamlIdpConfig) -> SamlIdpConfig {
        saml_mapper::normalize(config)
    }
}
