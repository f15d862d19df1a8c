//! # Declarative
//!
//! A framework for declarative management of remote resources.
//!
//! The caller declares the desired attributes of each named resource and
//! keeps a local record (remote id plus last observed attributes) per
//! resource. The engine refreshes records, plans the difference and
//! converges the remote system through a [`Resource`] implementation.
//!
//! ## Core Concepts
//!
//! - **Resource**: A kind of remote object with create, read, update,
//!   delete, exists and import operations
//! - **ResourceData**: Local record of one instance (id + attributes)
//! - **Plan**: Per-name create, update, delete or no-change actions
//! - **Executor**: Applies a plan with parallelism and callbacks
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{AutoConfirm, ExecuteOptions, NoProgress, Plan, execute};
//!
//! let plan = Plan::build(&buckets, &declared, stored_records)?;
//! let report = execute(&buckets, plan, &ExecuteOptions::default(), &mut NoProgress, &mut AutoConfirm)?;
//! for outcome in report.outcomes {
//!     match outcome.record {
//!         Some(record) => state.save(&outcome.name, record),
//!         None => state.forget(&outcome.name),
//!     }
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{AttributeChange, diff_attributes};
pub use executor::{ExecuteReport, Outcome, destroy, execute};
pub use planner::{Plan, PlanSummary, PlannedAction, PlannedChange, Refreshed, plan_resource, refresh};
pub use resource::{Resource, ResourceError};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceData};
