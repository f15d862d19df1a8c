//! Declarative commands
//!
//! - `plan` - Preview what apply would change
//! - `apply` - Make the platform match the config
//! - `refresh` - Re-read managed identity providers into the state
//! - `destroy` - Delete one managed identity provider

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    ApplyResult, ConfirmCallback, ExecuteOptions, ExecuteSummary, Plan, ProgressCallback,
    Refreshed,
};
use oktakit::IdpBackend;

use super::Workspace;
use crate::Context;
use crate::engine::{self, TerminalConfirm, TerminalProgress};
use crate::resource::SamlIdp;
use crate::schema::SamlIdpConfig;
use crate::ui;

// ============================================================================
// Plan
// ============================================================================

pub fn plan(ctx: &Context, name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let backend = workspace.connect(ctx)?;

    let plan = build_plan(&backend, &workspace, name)?;
    engine::display_plan(&plan);
    Ok(())
}

/// Refresh recorded providers and compare them with the config
///
/// With a name, only that provider is read back.
fn build_plan(
    backend: &dyn IdpBackend,
    workspace: &Workspace,
    name: Option<&str>,
) -> Result<Plan<SamlIdpConfig>> {
    let resource = SamlIdp::new(backend);

    let plan = match name {
        Some(name) => {
            let desired = workspace.config.saml_idp.get(name);
            let prior = workspace.state.get(name);
            if desired.is_none() && prior.is_none() {
                bail!("No identity provider named '{}' in config or state", name);
            }
            Plan::build_one(&resource, name, desired, prior)?
        }
        None => Plan::build(&resource, &workspace.config.saml_idp, workspace.state.records())?,
    };
    Ok(plan)
}

// ============================================================================
// Apply
// ============================================================================

pub fn apply(ctx: &Context, name: Option<&str>, dry_run: bool, yes: bool, jobs: usize) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let backend = workspace.connect(ctx)?;

    let opts = ExecuteOptions { dry_run, jobs };
    let mut progress = TerminalProgress::new(ctx.quiet);
    let mut confirm = TerminalConfirm::new(yes);

    let summary = apply_with(&backend, &mut workspace, name, &opts, &mut progress, &mut confirm)?;

    if dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }
    if summary.total_changes() > 0 || summary.failed > 0 {
        engine::print_summary(&summary);
    }
    if !summary.is_success() {
        bail!("{} identity provider(s) failed", summary.failed);
    }
    Ok(())
}

/// Plan, execute and record outcomes in the state
///
/// The state is saved even when some changes fail, so ids of providers
/// that were created stay recorded. Dry runs leave the state untouched.
fn apply_with<P, K>(
    backend: &dyn IdpBackend,
    workspace: &mut Workspace,
    name: Option<&str>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut K,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    K: ConfirmCallback,
{
    let resource = SamlIdp::new(backend);
    let plan = build_plan(backend, workspace, name)?;
    engine::display_plan(&plan);

    let report = declarative::execute(&resource, plan, opts, progress, confirm)?;
    if opts.dry_run {
        return Ok(report.summary);
    }

    for outcome in report.outcomes {
        if let ApplyResult::Failed { error } = &outcome.result {
            log::warn!("{}: {}", outcome.name, error);
        }
        match outcome.record {
            Some(record) => {
                workspace.state.record(&outcome.name, record);
            }
            None => {
                workspace.state.forget(&outcome.name);
            }
        }
    }
    workspace.save()?;

    Ok(report.summary)
}

// ============================================================================
// Refresh
// ============================================================================

pub fn refresh(ctx: &Context, name: Option<&str>) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let backend = workspace.connect(ctx)?;

    let (refreshed, gone) = refresh_with(&backend, &mut workspace, name)?;
    if !ctx.quiet {
        ui::success(&format!("Refreshed {} identity provider(s)", refreshed));
    }
    for name in &gone {
        ui::warn(&format!("{} no longer exists; removed from state", name));
    }
    Ok(())
}

/// Re-read records; returns the refreshed count and names of vanished ones
fn refresh_with(
    backend: &dyn IdpBackend,
    workspace: &mut Workspace,
    name: Option<&str>,
) -> Result<(usize, Vec<String>)> {
    let resource = SamlIdp::new(backend);

    let records = match name {
        Some(name) => match workspace.state.get(name) {
            Some(record) => vec![(name.to_string(), record)],
            None => bail!("No identity provider named '{}' in state", name),
        },
        None => workspace.state.records().into_iter().collect(),
    };

    let mut refreshed = 0;
    let mut gone = Vec::new();
    for (name, record) in records {
        match declarative::refresh(&resource, record)? {
            Refreshed::Present(data) => {
                workspace.state.record(&name, data);
                refreshed += 1;
            }
            Refreshed::Gone => {
                workspace.state.forget(&name);
                gone.push(name);
            }
        }
    }

    workspace.save()?;
    Ok((refreshed, gone))
}

// ============================================================================
// Destroy
// ============================================================================

pub fn destroy(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let backend = workspace.connect(ctx)?;

    let mut confirm = TerminalConfirm::new(yes);
    match destroy_with(&backend, &mut workspace, name, &mut confirm)? {
        ApplyResult::Removed => ui::success(&format!("Deleted {}", name)),
        ApplyResult::NoChange => ui::info(&format!("{} was already gone; removed from state", name)),
        _ => ui::dim("Nothing deleted"),
    }
    Ok(())
}

fn destroy_with<K: ConfirmCallback>(
    backend: &dyn IdpBackend,
    workspace: &mut Workspace,
    name: &str,
    confirm: &mut K,
) -> Result<ApplyResult> {
    let Some(record) = workspace.state.get(name) else {
        bail!("No identity provider named '{}' in state", name);
    };

    let prompt = format!(
        "Delete identity provider {} ({})?",
        name,
        record.id().unwrap_or("?")
    );
    if !confirm.confirm(&prompt)? {
        return Ok(ApplyResult::Skipped {
            reason: "Not confirmed".to_string(),
        });
    }

    let resource = SamlIdp::new(backend);
    let result = declarative::destroy(&resource, &record)?;
    workspace.state.forget(name);
    workspace.save()?;

    if workspace.config.saml_idp.contains_key(name) {
        ui::warn(&format!(
            "{} is still declared in the config; the next apply will recreate it",
            name
        ));
    }
    Ok(result)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::saml_mapper;
    use crate::schema::IdpsyncConfig;
    use crate::schema::tests::minimal;
    use crate::state::IdpsyncState;
    use declarative::{AutoConfirm, AutoDecline, NoProgress, ResourceData};
    use oktakit::{MockBackend, MockCall, Status};
    use tempfile::TempDir;

    fn workspace(dir: &TempDir, declared: &[&str]) -> Workspace {
        let mut config = IdpsyncConfig::default();
        for name in declared {
            config.saml_idp.insert((*name).to_string(), minimal(name));
        }
        Workspace {
            config,
            state: IdpsyncState::default(),
            state_path: dir.path().join("state.toml"),
        }
    }

    fn opts() -> ExecuteOptions {
        ExecuteOptions {
            dry_run: false,
            jobs: 1,
        }
    }

    #[test]
    fn test_apply_creates_and_records() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["corp"]);
        let backend = MockBackend::new().with_next_id("0oa1b2c3");

        let summary =
            apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoConfirm)
                .unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(ws.state.saml_idp["corp"].id, "0oa1b2c3");

        let saved = IdpsyncState::load(&ws.state_path).unwrap();
        assert_eq!(saved.saml_idp["corp"].id, "0oa1b2c3");
        assert_eq!(saved.saml_idp["corp"].attributes.status, Some(Status::Active));
    }

    #[test]
    fn test_second_apply_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["corp"]);
        let backend = MockBackend::new();
        backend.omit_issuer_mode_on_read(true);

        apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoConfirm).unwrap();
        backend.clear_calls();

        let summary =
            apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoConfirm)
                .unwrap();
        assert_eq!(summary.no_change, 1);
        assert_eq!(summary.total_changes(), 0);
        assert!(backend.calls().iter().all(|c| matches!(c, MockCall::Read(_))));
    }

    #[test]
    fn test_apply_deletes_undeclared() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &[]);
        let backend = MockBackend::new();
        backend.insert("0oa9", saml_mapper::build(&minimal("old")));
        ws.state
            .record("old", ResourceData::with_id("0oa9", minimal("old")));

        let summary =
            apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoConfirm)
                .unwrap();

        assert_eq!(summary.removed, 1);
        assert!(ws.state.get("old").is_none());
        assert!(backend.get("0oa9").is_none());
    }

    #[test]
    fn test_apply_dry_run_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["corp"]);
        let backend = MockBackend::new();
        let opts = ExecuteOptions {
            dry_run: true,
            jobs: 1,
        };

        let summary =
            apply_with(&backend, &mut ws, None, &opts, &mut NoProgress, &mut AutoConfirm).unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(backend.calls().is_empty());
        assert!(!ws.state_path.exists());
    }

    #[test]
    fn test_apply_declined_keeps_state() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["corp"]);
        let backend = MockBackend::new();

        let summary =
            apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoDecline)
                .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(ws.state.get("corp").is_none());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_apply_status_failure_keeps_id() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["corp"]);
        ws.config.saml_idp.get_mut("corp").unwrap().status = Some(Status::Inactive);
        let backend = MockBackend::new().with_next_id("0oa1");
        backend.fail_status_calls("lifecycle unavailable");

        let summary =
            apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoConfirm)
                .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(ws.state.saml_idp["corp"].id, "0oa1");
        assert!(IdpsyncState::load(&ws.state_path).unwrap().get("corp").is_some());
    }

    #[test]
    fn test_apply_rejected_create_records_nothing() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["corp"]);
        let backend = MockBackend::new();
        backend.reject_creates("Api validation failed: name");

        let summary =
            apply_with(&backend, &mut ws, None, &opts(), &mut NoProgress, &mut AutoConfirm)
                .unwrap();

        assert_eq!(summary.failed, 1);
        assert!(ws.state.get("corp").is_none());
    }

    #[test]
    fn test_apply_single_name() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &["a", "b"]);
        let backend = MockBackend::new();

        let summary =
            apply_with(&backend, &mut ws, Some("b"), &opts(), &mut NoProgress, &mut AutoConfirm)
                .unwrap();

        assert_eq!(summary.created, 1);
        assert!(ws.state.get("a").is_none());
        assert!(ws.state.get("b").is_some());
    }

    #[test]
    fn test_plan_unknown_name() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, &["corp"]);
        let err = build_plan(&MockBackend::new(), &ws, Some("nope")).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_refresh_forgets_vanished() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &[]);
        let backend = MockBackend::new();
        backend.insert("0oa1", saml_mapper::build(&minimal("kept")));
        ws.state.record("kept", ResourceData::with_id("0oa1", minimal("kept")));
        ws.state.record("lost", ResourceData::with_id("0oa2", minimal("lost")));

        let (refreshed, gone) = refresh_with(&backend, &mut ws, None).unwrap();

        assert_eq!(refreshed, 1);
        assert_eq!(gone, vec!["lost".to_string()]);
        assert!(ws.state.get("lost").is_none());
        assert_eq!(ws.state.saml_idp["kept"].attributes.kind.as_deref(), Some("SAML2"));
    }

    #[test]
    fn test_destroy_removes_and_forgets() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &[]);
        let backend = MockBackend::new();
        backend.insert("0oa1", saml_mapper::build(&minimal("corp")));
        ws.state.record("corp", ResourceData::with_id("0oa1", minimal("corp")));

        let result = destroy_with(&backend, &mut ws, "corp", &mut AutoConfirm).unwrap();

        assert_eq!(result, ApplyResult::Removed);
        assert!(ws.state.get("corp").is_none());
        assert!(backend.get("0oa1").is_none());
    }

    #[test]
    fn test_destroy_already_gone() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &[]);
        ws.state.record("corp", ResourceData::with_id("0oa1", minimal("corp")));

        let result = destroy_with(&MockBackend::new(), &mut ws, "corp", &mut AutoConfirm).unwrap();

        assert_eq!(result, ApplyResult::NoChange);
        assert!(ws.state.get("corp").is_none());
    }

    #[test]
    fn test_destroy_declined() {
        let dir = TempDir::new().unwrap();
        let mut ws = workspace(&dir, &[]);
        let backend = MockBackend::new();
        ws.state.record("corp", ResourceData::with_id("0oa1", minimal("corp")));

        let result = destroy_with(&backend, &mut ws, "corp", &mut AutoDecline).unwrap();

        assert!(matches!(result, ApplyResult::Skipped { .. }));
        assert!(ws.state.get("corp").is_some());
        assert!(backend.calls().is_empty());
    }
}
