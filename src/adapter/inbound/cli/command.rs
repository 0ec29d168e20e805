//! Command-line interface definitions.
//!
//! Defines the `modelrun` CLI using `clap`: normalizing a node offline,
//! submitting single-node or recipe runs, resuming tracking of existing
//! runs, cancelling, and validating configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Normalize generative-model inputs, submit runs and track them
#[derive(Parser, Debug)]
#[command(name = "modelrun")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the request input a node would submit, without submitting
    Normalize(NormalizeArgs),

    /// Submit a node or recipe run and track it to completion
    Run(RunArgs),

    /// Resume tracking runs that were submitted elsewhere
    Watch(WatchArgs),

    /// Ask the backend to cancel a recipe's active runs
    Cancel(CancelArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file syntax and semantics.
    Config(ConfigPathArg),
}

/// Shared argument for commands that read the configuration file.
#[derive(Args, Debug, Clone)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Node file (JSON) describing the model, handles, inputs and params.
    pub node: PathBuf,

    /// Override the seed parameter.
    #[arg(long)]
    pub seed: Option<i64>,
}

#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("source")
        .required(true)
        .args(["node", "recipe"]),
))]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Node file (JSON) for a single-node run.
    #[arg(long)]
    pub node: Option<PathBuf>,

    /// Recipe form file (JSON) for a whole-recipe run.
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Override the seed parameter of a node run.
    #[arg(long, requires = "node")]
    pub seed: Option<i64>,

    /// Number of runs to start for a recipe.
    #[arg(long, default_value = "1", requires = "recipe")]
    pub runs: u32,

    /// Print the job ids and exit without tracking.
    #[arg(long)]
    pub detach: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Recipe the runs belong to.
    pub recipe_id: String,

    /// Run ids to track.
    #[arg(required = true, num_args = 1..)]
    pub run_ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CancelArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Recipe whose runs should be canceled.
    pub recipe_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["modelrun", "check", "config", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check(CheckCommand::Config(_))));
    }

    #[test]
    fn config_defaults_to_working_directory() {
        let cli = Cli::try_parse_from(["modelrun", "cancel", "recipe-1"]).unwrap();
        let Commands::Cancel(args) = cli.command else {
            panic!("Expected Cancel command");
        };
        assert_eq!(args.config.config, PathBuf::from("config.toml"));
        assert_eq!(args.recipe_id, "recipe-1");
    }

    #[test]
    fn run_requires_a_source() {
        assert!(Cli::try_parse_from(["modelrun", "run"]).is_err());
    }

    #[test]
    fn run_rejects_both_sources() {
        let result = Cli::try_parse_from([
            "modelrun", "run", "--node", "n.json", "--recipe", "r.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn recipe_run_takes_run_count() {
        let cli =
            Cli::try_parse_from(["modelrun", "run", "--recipe", "r.json", "--runs", "4"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.runs, 4);
        assert_eq!(args.recipe, Some(PathBuf::from("r.json")));
        assert!(args.node.is_none());
    }

    #[test]
    fn seed_requires_node_source() {
        let result = Cli::try_parse_from(["modelrun", "run", "--recipe", "r.json", "--seed", "7"]);
        assert!(result.is_err());
    }

    #[test]
    fn watch_requires_run_ids() {
        assert!(Cli::try_parse_from(["modelrun", "watch", "recipe-1"]).is_err());
        let cli = Cli::try_parse_from(["modelrun", "watch", "recipe-1", "a", "b"]).unwrap();
        let Commands::Watch(args) = cli.command else {
            panic!("Expected Watch command");
        };
        assert_eq!(args.run_ids, ["a", "b"]);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
