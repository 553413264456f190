//! CLI command definitions and execution
//!
//! Every command resolves its profile, connects, runs one library operation
//! and maps the outcome to an exit code.

use clap::{Parser, Subcommand};
use sw_core::{
    ColorMode, ConfigManager, Defaults, Error, OutputFormat, ProfileManager, StorageClient,
};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod completions;
mod cp;
mod expire;
#[cfg(test)]
mod fake_swift;
mod ls;
mod mb;
mod meta;
mod pipe;
mod profile;
mod rb;
mod rm;
mod session;
mod stat;

/// swc - Swift object storage client
///
/// A command-line interface for OpenStack Swift compatible object storage.
#[derive(Parser, Debug)]
#[command(name = "swc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage storage account profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List containers or objects
    Ls(ls::LsArgs),

    /// Create a container
    Mb(mb::MbArgs),

    /// Remove a container
    Rb(rb::RbArgs),

    /// Copy objects (local<->remote, remote<->remote)
    Cp(cp::CpArgs),

    /// Display object contents
    Cat(cat::CatArgs),

    /// Show account, container or object details
    Stat(stat::StatArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Stream stdin to an object
    Pipe(pipe::PipeArgs),

    /// Read and write metadata
    #[command(subcommand)]
    Meta(meta::MetaCommands),

    /// Schedule an object for deletion
    Expire(expire::ExpireArgs),

    /// Authenticate and show the negotiated session
    Session(session::SessionArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Combine the global flags with the `[defaults]` table; a flag always wins
fn output_config(cli: &Cli, defaults: &Defaults) -> OutputConfig {
    OutputConfig {
        json: cli.json || defaults.output == OutputFormat::Json,
        no_color: cli.no_color || defaults.color == ColorMode::Never,
        no_progress: cli.no_progress || !defaults.progress,
        quiet: cli.quiet,
    }
}

fn load_defaults() -> Defaults {
    match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            tracing::debug!(error = %e, "Configuration unreadable, using built-in output defaults");
            Defaults::default()
        }
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = output_config(&cli, &load_defaults());

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Mb(args) => mb::execute(args, output_config).await,
        Commands::Rb(args) => rb::execute(args, output_config).await,
        Commands::Cp(args) => cp::execute(args, output_config).await,
        Commands::Cat(args) => cat::execute(args, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Pipe(args) => pipe::execute(args, output_config).await,
        Commands::Meta(cmd) => meta::execute(cmd, output_config).await,
        Commands::Expire(args) => expire::execute(args, output_config).await,
        Commands::Session(args) => session::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Load a profile and authenticate against it
pub(crate) async fn connect(
    profile_name: &str,
    formatter: &Formatter,
) -> Result<StorageClient, ExitCode> {
    let manager = ProfileManager::new().map_err(|e| fail(formatter, "Failed to load profiles", &e))?;
    let profile = manager.get(profile_name).map_err(|e| match e {
        Error::ProfileNotFound(_) => {
            formatter.error(&format!("Profile '{profile_name}' not found"));
            ExitCode::NotFound
        }
        other => fail(formatter, "Failed to load profiles", &other),
    })?;

    sw_http::connect_profile(&profile)
        .await
        .map_err(|e| fail(formatter, &format!("Failed to connect '{profile_name}'"), &e))
}

/// Report an error and pick its exit code
pub(crate) fn fail(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from(error)
}

/// Report a usage error
pub(crate) fn usage(formatter: &Formatter, message: &str) -> ExitCode {
    formatter.error(message);
    ExitCode::UsageError
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["swc", "ls", "ovh", "--json", "--quiet"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Ls(_)));
    }

    #[test]
    fn test_flags_override_config_defaults() {
        let defaults = Defaults {
            output: OutputFormat::Json,
            color: ColorMode::Never,
            progress: false,
        };
        let cli = Cli::try_parse_from(["swc", "ls", "ovh"]).unwrap();
        let config = output_config(&cli, &defaults);
        assert!(config.json);
        assert!(config.no_color);
        assert!(config.no_progress);

        let cli = Cli::try_parse_from(["swc", "--no-progress", "ls", "ovh"]).unwrap();
        let config = output_config(&cli, &Defaults::default());
        assert!(!config.json);
        assert!(!config.no_color);
        assert!(config.no_progress);
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["swc", "mv", "a", "b"]).is_err());
    }
}
