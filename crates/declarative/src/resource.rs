//! Resource trait for declarative state management
//!
//! A Resource is a kind of remote object the engine can create, read,
//! update, delete, probe and import. The engine owns the local records
//! ([`ResourceData`]); the resource only translates between them and the
//! remote system.

use crate::types::ResourceData;
use serde::Serialize;
use std::fmt;

/// Errors a resource can report to the engine
///
/// The engine needs exactly one distinction: whether the remote object no
/// longer exists. Everything else is reported as a failure.
pub trait ResourceError: std::error::Error + Send + Sync + 'static {
    /// Whether the error means the remote object does not exist
    fn is_not_found(&self) -> bool;
}

/// Core trait for declarative resources
///
/// # Example
///
/// ```ignore
/// use declarative::{Resource, ResourceData};
///
/// struct Bucket { api: BucketApi }
///
/// impl Resource for Bucket {
///     type Config = BucketConfig;
///     type Error = BucketError;
///
///     fn resource_type(&self) -> &'static str { "bucket" }
///
///     fn create(&self, data: &mut ResourceData<BucketConfig>) -> Result<(), BucketError> {
///         let id = self.api.create(&data.config)?;
///         data.set_id(id);
///         self.read(data)
///     }
///     // read, update, delete, exists ...
/// }
/// ```
pub trait Resource: Send + Sync {
    /// Flat attribute set describing one instance
    type Config: Clone + Default + PartialEq + fmt::Debug + Serialize + Send + Sync;

    /// Error returned by every operation
    type Error: ResourceError;

    /// Resource type name, e.g. "saml_idp"
    fn resource_type(&self) -> &'static str;

    /// Create the remote object from `data.config`, assign `data`'s id and
    /// refresh `data.config` from the result
    ///
    /// On failure before the remote object exists, `data` keeps no id.
    fn create(&self, data: &mut ResourceData<Self::Config>) -> Result<(), Self::Error>;

    /// Refresh `data.config` from the remote object identified by `data`'s id
    ///
    /// A missing remote object is reported as a not-found error.
    fn read(&self, data: &mut ResourceData<Self::Config>) -> Result<(), Self::Error>;

    /// Replace the remote object with `data.config` and refresh
    fn update(&self, data: &mut ResourceData<Self::Config>) -> Result<(), Self::Error>;

    /// Delete the remote object
    fn delete(&self, data: &ResourceData<Self::Config>) -> Result<(), Self::Error>;

    /// Whether the remote object exists
    ///
    /// Not-found is `Ok(false)`, never an error.
    fn exists(&self, data: &ResourceData<Self::Config>) -> Result<bool, Self::Error>;

    /// Build a full local record from a bare remote identifier
    fn import(&self, id: &str) -> Result<ResourceData<Self::Config>, Self::Error> {
        let mut data = ResourceData::with_id(id, Self::Config::default());
        self.read(&mut data)?;
        Ok(data)
    }

    /// The attribute values `config` will have after a round-trip through
    /// the remote system
    ///
    /// Planning compares this against the refreshed record, so defaults the
    /// remote fills in do not show up as drift.
    fn normalize(&self, config: &Self::Config) -> Self::Config {
        config.clone()
    }
}
