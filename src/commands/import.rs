//! Adopting and inspecting individual identity providers

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::Resource;
use oktakit::IdpBackend;
use std::collections::BTreeMap;

use super::Workspace;
use crate::Context;
use crate::resource::{LifecycleState, SamlIdp};
use crate::schema::SamlIdpConfig;
use crate::ui;

// ============================================================================
// Import
// ============================================================================

pub fn import(ctx: &Context, name: &str, id: &str) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let backend = workspace.connect(ctx)?;

    let attributes = import_with(&backend, &mut workspace, name, id)?;
    ui::success(&format!("Imported {} as {}", id, name));

    if !workspace.config.saml_idp.contains_key(name) {
        ui::section("Add this to your config to keep managing it:");
        println!();
        print!("{}", declaration(name, &attributes)?);
    }
    Ok(())
}

/// Read an existing provider and record it under `name`
fn import_with(
    backend: &dyn IdpBackend,
    workspace: &mut Workspace,
    name: &str,
    id: &str,
) -> Result<SamlIdpConfig> {
    if let Some(existing) = workspace.state.get(name) {
        bail!(
            "'{}' is already managed (id {})",
            name,
            existing.id().unwrap_or("?")
        );
    }
    if let Some(other) = workspace.state.name_for_id(id) {
        bail!("{} is already managed as '{}'", id, other);
    }

    let resource = SamlIdp::new(backend);
    let data = resource
        .import(id)
        .with_context(|| format!("Failed to import identity provider {}", id))?;

    let attributes = data.config.clone();
    workspace.state.record(name, data);
    workspace.save()?;
    Ok(attributes)
}

/// TOML block declaring `attributes` under `[saml_idp.<name>]`
fn declaration(name: &str, attributes: &SamlIdpConfig) -> Result<String> {
    let mut idps = BTreeMap::new();
    idps.insert(name.to_string(), attributes.as_declared());

    let mut document = BTreeMap::new();
    document.insert("saml_idp", idps);

    toml::to_string_pretty(&document).context("Failed to render config snippet")
}

// ============================================================================
// Show
// ============================================================================

pub fn show(ctx: &Context, name: &str) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let Some(record) = workspace.state.saml_idp.get(name) else {
        bail!("No identity provider named '{}' in state", name);
    };

    ui::header(&format!("saml_idp.{}", name));
    ui::kv("id", &record.id);
    ui::kv("recorded", &record.last_updated.to_rfc3339());

    // The lifecycle state needs the platform; the record is still useful without it
    match workspace.connect(ctx) {
        Ok(backend) => {
            let state = observe(&backend, &workspace, name)?;
            ui::kv("lifecycle", &state.to_string());
            if !state.is_present() {
                ui::warn("Missing on the platform; run `idpsync refresh` to update the state");
            }
        }
        Err(e) => ui::kv("lifecycle", &format!("unknown ({})", e)),
    }
    if !workspace.config.saml_idp.contains_key(name) {
        ui::warn("Not declared in the config; the next apply will delete it");
    }

    ui::section("Attributes");
    for (key, value) in ui::attribute_lines(&record.attributes) {
        ui::kv(&key, &value);
    }
    Ok(())
}

fn observe(backend: &dyn IdpBackend, workspace: &Workspace, name: &str) -> Result<LifecycleState> {
    let resource = SamlIdp::new(backend);
    let state = match workspace.state.get(name) {
        Some(record) => resource.observe(&record)?,
        None => LifecycleState::Absent,
    };
    Ok(state)
}

// ============================================================================
// Tests
// ============================================================================
