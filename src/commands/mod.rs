//! Command implementations

use anyhow::Result;
use oktakit::HttpBackend;
use std::path::PathBuf;

use crate::Context;
use crate::config::{self, Connection};
use crate::schema::IdpsyncConfig;
use crate::state::IdpsyncState;

pub mod declarative;
pub mod import;

/// Config, state and where the state is saved
pub struct Workspace {
    pub config: IdpsyncConfig,
    pub state: IdpsyncState,
    pub state_path: PathBuf,
}

impl Workspace {
    /// Load config and state from the paths selected on the command line
    pub fn open(ctx: &Context) -> Result<Self> {
        let config_path = config::config_path(ctx.config_path.as_deref())?;
        let state_path = config::state_path(ctx.state_path.as_deref())?;
        log::debug!(
            "Using config {} and state {}",
            config_path.display(),
            state_path.display()
        );

        Ok(Self {
            config: config::load(&config_path)?,
            state: IdpsyncState::load(&state_path)?,
            state_path,
        })
    }

    /// HTTP backend for the configured org
    pub fn connect(&self, ctx: &Context) -> Result<HttpBackend> {
        let connection = Connection::resolve(
            &self.config.provider,
            ctx.org_url.as_deref(),
            ctx.api_token.as_deref(),
        )?;
        Ok(connection.backend())
    }

    pub fn save(&mut self) -> Result<()> {
        self.state.save(&self.state_path)
    }
}
