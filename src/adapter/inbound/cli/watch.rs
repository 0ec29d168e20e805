//! Handler for the `watch` command.

use crate::adapter::inbound::cli::command::WatchArgs;
use crate::adapter::inbound::cli::track::report;
use crate::adapter::inbound::cli::{load_config, output};
use crate::error::Result;
use crate::infrastructure::bootstrap::build_orchestrator;

/// Resume tracking existing runs until they finish.
pub async fn execute(args: &WatchArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let orchestrator = build_orchestrator(&config)?;

    output::field("Recipe", output::highlight(&args.recipe_id));
    output::field("Runs", args.run_ids.len());

    let pb = output::spinner(&format!("Tracking {} run(s)", args.run_ids.len()));
    orchestrator
        .start_polling(&args.recipe_id, &args.run_ids)
        .await;
    report(&orchestrator, &pb).await
}
