//! Handler for the `cancel` command.

use crate::adapter::inbound::cli::command::CancelArgs;
use crate::adapter::inbound::cli::{load_config, output};
use crate::error::Result;
use crate::infrastructure::bootstrap::build_orchestrator;

/// Request cancellation of a recipe's active runs.
///
/// Best effort: a backend failure is logged and reported as a warning.
pub async fn execute(args: &CancelArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let orchestrator = build_orchestrator(&config)?;

    let pb = output::spinner(&format!("Canceling runs of {}", args.recipe_id));
    orchestrator.cancel(&args.recipe_id).await;
    output::spinner_success(&pb, "Cancel requested");
    output::note("Runs report as canceled once the backend stops them.");
    Ok(())
}
