mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod resource;
mod schema;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use resource::LifecycleError;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub org_url: Option<String>,
    pub api_token: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: cli.config,
        state_path: cli.state,
        org_url: cli.org_url,
        api_token: cli.api_token,
    };
    log::trace!("Verbosity {}", ctx.verbose);

    match cli.command {
        Command::Plan(args) => commands::declarative::plan(&ctx, args.name.as_deref()),
        Command::Apply(args) => commands::declarative::apply(
            &ctx,
            args.name.as_deref(),
            args.dry_run,
            args.yes,
            usize::from(args.jobs),
        ),
        Command::Refresh(args) => commands::declarative::refresh(&ctx, args.name.as_deref()),
        Command::Import { name, id } => commands::import::import(&ctx, &name, &id),
        Command::Show { name } => commands::import::show(&ctx, &name),
        Command::Destroy { name, yes } => commands::declarative::destroy(&ctx, &name, yes),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "idpsync", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print an error chain, with advice when a platform call caused it
fn report(err: &anyhow::Error) {
    let message = format!("{:#}", err);
    match err.chain().find_map(|e| e.downcast_ref::<LifecycleError>()) {
        Some(lifecycle) => ui::error_with_advice(&message, lifecycle.category()),
        None => match err.chain().find_map(|e| e.downcast_ref::<oktakit::Error>()) {
            Some(remote) => ui::error_with_advice(&message, remote.category()),
            None => ui::error(&message),
        },
    }
}
