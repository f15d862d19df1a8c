//! Planner - compares desired records with refreshed remote state

use crate::diff::{AttributeChange, diff_attributes};
use crate::resource::{Resource, ResourceError};
use crate::types::ResourceData;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of refreshing a local record against the remote system
#[derive(Debug, Clone, PartialEq)]
pub enum Refreshed<C> {
    /// The remote object exists; the record holds its current attributes
    Present(ResourceData<C>),
    /// The remote object no longer exists (or never had an id)
    Gone,
}

/// Refresh a record from the remote system
///
/// A not-found read means the object was deleted out of band: it becomes
/// [`Refreshed::Gone`] instead of an error.
pub fn refresh<R: Resource>(
    resource: &R,
    mut data: ResourceData<R::Config>,
) -> Result<Refreshed<R::Config>, R::Error> {
    let Some(id) = data.id().map(str::to_string) else {
        return Ok(Refreshed::Gone);
    };

    match resource.read(&mut data) {
        Ok(()) => Ok(Refreshed::Present(data)),
        Err(e) if e.is_not_found() => {
            log::info!("{} {} no longer exists remotely", resource.resource_type(), id);
            Ok(Refreshed::Gone)
        }
        Err(e) => Err(e),
    }
}

/// What the executor will do to one resource
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction<C> {
    /// Create from the desired attributes
    Create { desired: C },
    /// Replace the remote object with the desired attributes
    Update {
        current: ResourceData<C>,
        desired: C,
        changes: Vec<AttributeChange>,
    },
    /// Delete a remote object no longer declared
    Delete { current: ResourceData<C> },
    /// Already converged (or neither declared nor present)
    NoChange { current: Option<ResourceData<C>> },
}

impl<C> PlannedAction<C> {
    /// Check if the action changes remote state
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange { .. })
    }

    /// Short verb for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::NoChange { .. } => "no change",
        }
    }
}

/// A planned action for a named resource
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange<C> {
    /// Local name of the resource
    pub name: String,
    /// Planned action
    pub action: PlannedAction<C>,
}

/// Plan a single resource
///
/// `desired` is the declared configuration (`None` when the resource is no
/// longer declared); `prior` is the last stored record.
pub fn plan_resource<R: Resource>(
    resource: &R,
    name: &str,
    desired: Option<&R::Config>,
    prior: Option<ResourceData<R::Config>>,
) -> Result<PlannedChange<R::Config>, R::Error> {
    let current = match prior {
        Some(prior) => match refresh(resource, prior)? {
            Refreshed::Present(data) => Some(data),
            Refreshed::Gone => None,
        },
        None => None,
    };

    let action = match (desired, current) {
        (None, None) => PlannedAction::NoChange { current: None },
        (None, Some(current)) => PlannedAction::Delete { current },
        (Some(desired), None) => PlannedAction::Create {
            desired: desired.clone(),
        },
        (Some(desired), Some(current)) => {
            let changes = diff_attributes(&current.config, &resource.normalize(desired));
            if changes.is_empty() {
                PlannedAction::NoChange {
                    current: Some(current),
                }
            } else {
                PlannedAction::Update {
                    current,
                    desired: desired.clone(),
                    changes,
                }
            }
        }
    };

    log::debug!(
        "Planned {} for {}.{}",
        action.label(),
        resource.resource_type(),
        name
    );

    Ok(PlannedChange {
        name: name.to_string(),
        action,
    })
}

/// A plan covering every declared or recorded resource of one type
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<C> {
    /// Changes ordered by resource name
    pub changes: Vec<PlannedChange<C>>,
}

impl<C> Plan<C> {
    /// Build a plan from declared configurations and stored records
    ///
    /// Every name in either map is planned: declared-only names are
    /// created, recorded-only names are deleted.
    pub fn build<R>(
        resource: &R,
        desired: &BTreeMap<String, C>,
        mut prior: BTreeMap<String, ResourceData<C>>,
    ) -> Result<Self, R::Error>
    where
        R: Resource<Config = C>,
    {
        let names: BTreeSet<String> = desired.keys().chain(prior.keys()).cloned().collect();

        let changes = names
            .into_iter()
            .map(|name| {
                let record = prior.remove(&name);
                plan_resource(resource, &name, desired.get(&name), record)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { changes })
    }

    /// Plan a single named resource, refreshing only its record
    pub fn build_one<R>(
        resource: &R,
        name: &str,
        desired: Option<&C>,
        prior: Option<ResourceData<C>>,
    ) -> Result<Self, R::Error>
    where
        R: Resource<Config = C>,
    {
        Ok(Self {
            changes: vec![plan_resource(resource, name, desired, prior)?],
        })
    }

    /// Check if any change touches remote state
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.action.is_change())
    }

    /// Count planned actions
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.action {
                PlannedAction::Create { .. } => summary.creates += 1,
                PlannedAction::Update { .. } => summary.updates += 1,
                PlannedAction::Delete { .. } => summary.deletes += 1,
                PlannedAction::NoChange { .. } => summary.unchanged += 1,
            }
        }
        summary
    }
}

/// Plan summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    /// Resources to create
    pub creates: usize,
    /// Resources to update
    pub updates: usize,
    /// Resources to delete
    pub deletes: usize,
    /// Resources already converged
    pub unchanged: usize,
}

impl PlanSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}
