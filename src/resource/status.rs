//! Activation status reconciliation
//!
//! Status is not part of the object sent on create or update; the platform
//! changes it only through the activate/deactivate lifecycle calls.

use super::LifecycleError;
use oktakit::{IdpBackend, Status};

/// Bring the identity provider `id` to `desired`
///
/// `current` is the status the platform reported after the last write.
/// Nothing is called when it already matches; otherwise exactly one
/// lifecycle call is made. A failure never undoes the preceding write.
///
/// Returns whether a lifecycle call was made.
pub fn reconcile_status(
    backend: &dyn IdpBackend,
    id: &str,
    current: Option<Status>,
    desired: Status,
) -> Result<bool, LifecycleError> {
    if current == Some(desired) {
        log::debug!("Identity provider {} is already {}", id, desired);
        return Ok(false);
    }

    log::info!(
        "Setting identity provider {} from {} to {}",
        id,
        current.map_or("unknown", |s| s.as_str()),
        desired
    );

    backend
        .set_status(id, desired)
        .map_err(|source| LifecycleError::StatusReconciliation {
            id: id.to_string(),
            desired,
            source,
        })?;

    Ok(true)
}
