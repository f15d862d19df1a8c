//! Execution engine - applies a plan with parallelism and callbacks

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::planner::{Plan, PlannedAction, PlannedChange};
use crate::resource::{Resource, ResourceError};
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceData};
use anyhow::Result;
use rayon::prelude::*;

/// Result of executing one planned change
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<C> {
    /// Local name of the resource
    pub name: String,
    /// What happened
    pub result: ApplyResult,
    /// Record to store afterwards; `None` means forget the resource
    pub record: Option<ResourceData<C>>,
}

/// Everything produced by [`execute`]
#[derive(Debug, Clone)]
pub struct ExecuteReport<C> {
    /// Counts by result
    pub summary: ExecuteSummary,
    /// One outcome per planned change, in plan order
    pub outcomes: Vec<Outcome<C>>,
}

impl<C> Default for ExecuteReport<C> {
    fn default() -> Self {
        Self {
            summary: ExecuteSummary::default(),
            outcomes: Vec::new(),
        }
    }
}

impl<C> ExecuteReport<C> {
    fn push(&mut self, outcome: Outcome<C>) {
        self.summary.add_result(&outcome.result);
        self.outcomes.push(outcome);
    }
}

/// Execute a plan with the given options and callbacks
///
/// Unchanged resources pass straight through. Pending changes are skipped
/// on a dry run or when the confirmation is declined; otherwise they run
/// on up to `opts.jobs` threads.
pub fn execute<R, P, K>(
    resource: &R,
    plan: Plan<R::Config>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut K,
) -> Result<ExecuteReport<R::Config>>
where
    R: Resource,
    P: ProgressCallback,
    K: ConfirmCallback,
{
    let mut report = ExecuteReport::default();
    let mut pending = Vec::new();

    for change in plan.changes {
        match change.action {
            PlannedAction::NoChange { current } => report.push(Outcome {
                name: change.name,
                result: ApplyResult::NoChange,
                record: current,
            }),
            action => pending.push(PlannedChange {
                name: change.name,
                action,
            }),
        }
    }

    if pending.is_empty() {
        return Ok(report);
    }

    if opts.dry_run {
        for change in pending {
            report.push(skip(change, "Dry run"));
        }
        return Ok(report);
    }

    let prompt = format!("Apply {} change(s)?", pending.len());
    if !confirm.confirm(&prompt)? {
        for change in pending {
            report.push(skip(change, "Not confirmed"));
        }
        return Ok(report);
    }

    progress.on_batch_start(pending.len());
    let outcomes = if opts.jobs <= 1 || pending.len() == 1 {
        let mut outcomes = Vec::with_capacity(pending.len());
        for change in pending {
            let name = change.name.clone();
            progress.on_resource_start(&name, &describe(resource, &change));
            let outcome = apply_change(resource, change);
            progress.on_resource_complete(&name, &outcome.result);
            outcomes.push(outcome);
        }
        outcomes
    } else {
        execute_parallel(resource, pending, opts.jobs, progress)?
    };
    progress.on_batch_complete();

    for outcome in outcomes {
        report.push(outcome);
    }
    Ok(report)
}

/// Execute changes in parallel using rayon
fn execute_parallel<R, P>(
    resource: &R,
    pending: Vec<PlannedChange<R::Config>>,
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<Outcome<R::Config>>>
where
    R: Resource,
    P: ProgressCallback,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    // The progress callback is not shared across threads; report afterwards
    for change in &pending {
        progress.on_resource_start(&change.name, &describe(resource, change));
    }

    let outcomes: Vec<Outcome<R::Config>> = pool.install(|| {
        pending
            .into_par_iter()
            .map(|change| apply_change(resource, change))
            .collect()
    });

    for outcome in &outcomes {
        progress.on_resource_complete(&outcome.name, &outcome.result);
    }

    Ok(outcomes)
}

fn describe<R: Resource>(resource: &R, change: &PlannedChange<R::Config>) -> String {
    format!(
        "{} {}.{}",
        change.action.label(),
        resource.resource_type(),
        change.name
    )
}

fn skip<C>(change: PlannedChange<C>, reason: &str) -> Outcome<C> {
    let record = match change.action {
        PlannedAction::Update { current, .. } | PlannedAction::Delete { current } => Some(current),
        PlannedAction::NoChange { current } => current,
        PlannedAction::Create { .. } => None,
    };
    Outcome {
        name: change.name,
        result: ApplyResult::Skipped {
            reason: reason.to_string(),
        },
        record,
    }
}

/// Apply a single planned change
fn apply_change<R: Resource>(resource: &R, change: PlannedChange<R::Config>) -> Outcome<R::Config> {
    let name = change.name;
    let (result, record) = match change.action {
        PlannedAction::NoChange { current } => (ApplyResult::NoChange, current),
        PlannedAction::Create { desired } => {
            let mut data = ResourceData::new(desired);
            match resource.create(&mut data) {
                Ok(()) => (ApplyResult::Created, Some(data)),
                // A remote object that was created stays tracked
                Err(e) => (failed(&name, &e), (!data.is_new()).then_some(data)),
            }
        }
        PlannedAction::Update {
            current, desired, ..
        } => {
            let mut data = current.clone();
            data.config = desired;
            match resource.update(&mut data) {
                Ok(()) => (ApplyResult::Modified, Some(data)),
                Err(e) if e.is_not_found() => (failed(&name, &e), None),
                Err(e) => (failed(&name, &e), Some(current)),
            }
        }
        PlannedAction::Delete { current } => match destroy(resource, &current) {
            Ok(result) => (result, None),
            Err(e) => (failed(&name, &e), Some(current)),
        },
    };

    Outcome {
        name,
        result,
        record,
    }
}

fn failed(name: &str, error: &dyn std::error::Error) -> ApplyResult {
    log::warn!("{} failed: {}", name, error);
    ApplyResult::Failed {
        error: error.to_string(),
    }
}

/// Delete a remote object, treating an already-absent one as done
pub fn destroy<R: Resource>(
    resource: &R,
    data: &ResourceData<R::Config>,
) -> std::result::Result<ApplyResult, R::Error> {
    match resource.delete(data) {
        Ok(()) => Ok(ApplyResult::Removed),
        Err(e) if e.is_not_found() => {
            log::info!(
                "{} {} was already deleted",
                resource.resource_type(),
                data.id().unwrap_or("(no id)")
            );
            Ok(ApplyResult::NoChange)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::testing::{MemoryResource, Widget};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingProgress {
        started: Vec<String>,
        completed: Vec<String>,
        batches: usize,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_batch_start(&mut self, _count: usize) {
            self.batches += 1;
        }
        fn on_resource_start(&mut self, name: &str, _description: &str) {
            self.started.push(name.to_string());
        }
        fn on_resource_complete(&mut self, name: &str, _result: &ApplyResult) {
            self.completed.push(name.to_string());
        }
        fn on_batch_complete(&mut self) {}
    }

    fn create_plan(names: &[&str]) -> Plan<Widget> {
        Plan {
            changes: names
                .iter()
                .map(|n| PlannedChange {
                    name: (*n).to_string(),
                    action: PlannedAction::Create {
                        desired: Widget::named(n),
                    },
                })
                .collect(),
        }
    }

    fn sequential() -> ExecuteOptions {
        ExecuteOptions {
            dry_run: false,
            jobs: 1,
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let resource = MemoryResource::default();
        let report = execute(
            &resource,
            Plan { changes: Vec::new() },
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(report.summary.total(), 0);
    }

    #[test]
    fn test_execute_creates_and_records_ids() {
        let resource = MemoryResource::default();
        let mut progress = RecordingProgress::default();
        let report = execute(
            &resource,
            create_plan(&["a", "b"]),
            &sequential(),
            &mut progress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(report.summary.created, 2);
        assert_eq!(progress.started, vec!["a", "b"]);
        assert_eq!(progress.completed, vec!["a", "b"]);
        assert_eq!(progress.batches, 1);

        let record = report.outcomes[0].record.as_ref().unwrap();
        let id = record.id().unwrap();
        assert_eq!(resource.get(id).unwrap().name, "a");
        // Refreshed after create
        assert_eq!(record.config.size, Some(1));
    }

    #[test]
    fn test_execute_parallel() {
        let resource = MemoryResource::default();
        let opts = ExecuteOptions {
            dry_run: false,
            jobs: 4,
        };
        let mut progress = RecordingProgress::default();
        let report = execute(
            &resource,
            create_plan(&["a", "b", "c", "d", "e"]),
            &opts,
            &mut progress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(report.summary.created, 5);
        assert_eq!(resource.len(), 5);
        assert_eq!(progress.completed.len(), 5);
        // Outcomes keep plan order
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let resource = MemoryResource::default();
        let opts = ExecuteOptions {
            dry_run: true,
            jobs: 1,
        };
        let report = execute(
            &resource,
            create_plan(&["a"]),
            &opts,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(report.summary.skipped, 1);
        assert_eq!(resource.len(), 0);
        assert!(report.outcomes[0].record.is_none());
    }

    #[test]
    fn test_declined_confirmation_skips() {
        let resource = MemoryResource::default();
        let id = resource.seed(Widget::named("a"));
        let plan = Plan {
            changes: vec![PlannedChange {
                name: "a".into(),
                action: PlannedAction::Delete {
                    current: ResourceData::with_id(id.clone(), Widget::named("a")),
                },
            }],
        };

        let report = execute(&resource, plan, &sequential(), &mut NoProgress, &mut AutoDecline).unwrap();
        assert_eq!(report.summary.skipped, 1);
        assert!(resource.get(&id).is_some());
        // The record is kept
        assert_eq!(report.outcomes[0].record.as_ref().unwrap().id(), Some(id.as_str()));
    }

    #[test]
    fn test_failed_create_keeps_assigned_id() {
        let resource = MemoryResource::default();
        resource.fail_after_create();
        let report = execute(
            &resource,
            create_plan(&["a"]),
            &sequential(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(report.summary.failed, 1);
        let record = report.outcomes[0].record.as_ref().unwrap();
        assert!(record.id().is_some());
    }

    #[test]
    fn test_failed_update_keeps_current_record() {
        let resource = MemoryResource::default();
        resource.fail_updates();
        let id = resource.seed(Widget::named("a"));
        let current = ResourceData::with_id(id, Widget::named("a"));
        let plan = Plan {
            changes: vec![PlannedChange {
                name: "a".into(),
                action: PlannedAction::Update {
                    current: current.clone(),
                    desired: Widget {
                        name: "a".into(),
                        size: Some(9),
                    },
                    changes: Vec::new(),
                },
            }],
        };

        let report = execute(&resource, plan, &sequential(), &mut NoProgress, &mut AutoConfirm).unwrap();
        assert!(!report.summary.is_success());
        assert_eq!(report.outcomes[0].record, Some(current));
    }

    #[test]
    fn test_unchanged_passes_through() {
        let resource = MemoryResource::default();
        let id = resource.seed(Widget::named("a"));

        let mut desired = BTreeMap::new();
        desired.insert("a".to_string(), Widget::named("a"));
        let mut prior = BTreeMap::new();
        prior.insert("a".to_string(), ResourceData::with_id(id, Widget::default()));

        let plan = Plan::build(&resource, &desired, prior).unwrap();
        let report = execute(&resource, plan, &sequential(), &mut NoProgress, &mut AutoDecline).unwrap();
        assert_eq!(report.summary.no_change, 1);
        assert!(report.outcomes[0].record.is_some());
    }

    #[test]
    fn test_destroy_tolerates_missing() {
        let resource = MemoryResource::default();
        let id = resource.seed(Widget::named("a"));
        let data = ResourceData::with_id(id, Widget::default());

        assert_eq!(destroy(&resource, &data).unwrap(), ApplyResult::Removed);
        assert_eq!(destroy(&resource, &data).unwrap(), ApplyResult::NoChange);
    }
}
