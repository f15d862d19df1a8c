use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idpsync")]
#[command(version)]
#[command(about = "Declarative management of SAML identity providers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/idpsync/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// State file (default: ~/.local/state/idpsync/state.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub state: Option<PathBuf>,

    /// Organization URL, e.g. https://example.okta.com
    #[arg(long, env = "OKTA_ORG_URL", global = true)]
    pub org_url: Option<String>,

    /// API token
    #[arg(long, env = "OKTA_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(TargetArgs),

    /// Create, update and delete identity providers to match the config
    Apply(ApplyArgs),

    /// Re-read managed identity providers into the state file
    Refresh(TargetArgs),

    /// Adopt an existing identity provider by id
    Import {
        /// Local name to record it under
        name: String,

        /// Platform id of the identity provider
        id: String,
    },

    /// Show the recorded attributes and lifecycle state of one identity provider
    Show {
        /// Local name
        name: String,
    },

    /// Delete a managed identity provider
    Destroy {
        /// Local name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Only consider this identity provider
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only apply changes for this identity provider
    pub name: Option<String>,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of changes to apply in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from(["idpsync", "apply", "corp", "--dry-run", "-j", "2"]).unwrap();
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.name.as_deref(), Some("corp"));
                assert!(args.dry_run);
                assert!(!args.yes);
                assert_eq!(args.jobs, 2);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_parse_import_with_global_flags() {
        let cli = Cli::try_parse_from([
            "idpsync",
            "import",
            "corp",
            "0oa1b2c3",
            "--state",
            "/tmp/state.toml",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.state, Some(PathBuf::from("/tmp/state.toml")));
        match cli.command {
            Command::Import { name, id } => {
                assert_eq!(name, "corp");
                assert_eq!(id, "0oa1b2c3");
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_import_requires_id() {
        assert!(Cli::try_parse_from(["idpsync", "import", "corp"]).is_err());
    }
}
