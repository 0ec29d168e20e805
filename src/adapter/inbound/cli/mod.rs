//! Command-line adapter.
//!
//! [`execute`] dispatches a parsed [`Cli`] to its handler. Handlers load
//! their configuration from the `--config` path, install logging, and drive
//! the orchestrator.

pub mod cancel;
pub mod check;
pub mod command;
pub mod files;
pub mod normalize;
pub mod output;
pub mod run;
pub mod track;
pub mod watch;

use command::{CheckCommand, Cli, ColorChoice, Commands, ConfigPathArg};

use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Apply global presentation flags: color override and output mode.
pub fn configure(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));
}

/// Load the configuration and install the tracing subscriber.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn load_config(arg: &ConfigPathArg) -> Result<Config> {
    let config = Config::load(&arg.config)?;
    config.init_logging();
    Ok(config)
}

/// Run the selected command.
///
/// # Errors
///
/// Returns the handler's error.
pub async fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Normalize(args) => normalize::execute(args).await,
        Commands::Run(args) => run::execute(args).await,
        Commands::Watch(args) => watch::execute(args).await,
        Commands::Cancel(args) => cancel::execute(args).await,
        Commands::Check(CheckCommand::Config(args)) => check::config::execute_config(&args.config),
    }
}
