//! Handler for the `run` command.

use std::path::Path;
use std::sync::Arc;

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::files::{read_json, NodeFile, RecipeFile};
use crate::adapter::inbound::cli::track::{report, SpinnerObserver};
use crate::adapter::inbound::cli::{load_config, output};
use crate::application::validation::recipe_request;
use crate::application::RunOrchestrator;
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::build_orchestrator;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let orchestrator = build_orchestrator(&config)?;

    output::header(env!("CARGO_PKG_VERSION"));
    match (&args.node, &args.recipe) {
        (Some(node), _) => run_node(&orchestrator, node, args).await,
        (None, Some(recipe)) => run_recipe(&orchestrator, recipe, args).await,
        (None, None) => Ok(()),
    }
}

async fn run_node(orchestrator: &RunOrchestrator, path: &Path, args: &RunArgs) -> Result<()> {
    let node: NodeFile = read_json(path)?;
    output::field("Model", output::highlight(&node.model.name));
    output::field("Node", &node.node_id);

    let pb = output::spinner("Submitting");
    let observer = Arc::new(SpinnerObserver::new(pb.clone()));
    let prediction_id = match orchestrator
        .run_model(node.snapshot(args.seed), &node.target(), observer)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            output::spinner_fail(&pb, "Submission failed");
            return Err(e);
        }
    };

    if args.detach {
        orchestrator.stop().await;
        output::spinner_success(&pb, "Submitted");
        output::field("Prediction", &prediction_id);
        return Ok(());
    }

    pb.set_message(format!("Tracking {prediction_id}"));
    report(orchestrator, &pb).await
}

async fn run_recipe(orchestrator: &RunOrchestrator, path: &Path, args: &RunArgs) -> Result<()> {
    let recipe: RecipeFile = read_json(path)?;
    output::field("Recipe", output::highlight(&recipe.recipe_id));
    output::field("Runs", args.runs);

    let request = recipe_request(
        &recipe.recipe_id,
        &recipe.inputs,
        args.runs,
        recipe.recipe_version,
    );
    let pb = output::spinner("Submitting");
    let run_ids = match orchestrator.run_recipe(&request, &recipe.inputs).await {
        Ok(ids) => ids,
        Err(Error::Validation(errors)) => {
            output::spinner_fail(&pb, "Form is incomplete");
            for (field, error) in &errors.0 {
                output::field_error(field, &error.to_string());
            }
            return Err(Error::Validation(errors));
        }
        Err(e) => {
            output::spinner_fail(&pb, "Submission failed");
            return Err(e);
        }
    };

    if run_ids.is_empty() {
        output::spinner_success(&pb, "Backend started no runs");
        return Ok(());
    }

    if args.detach {
        orchestrator.stop().await;
        output::spinner_success(&pb, &format!("Submitted {} run(s)", run_ids.len()));
        for id in &run_ids {
            output::field("Run", id);
        }
        output::hint(&format!(
            "resume with: modelrun watch {} {}",
            recipe.recipe_id,
            run_ids.join(" ")
        ));
        return Ok(());
    }

    if output::verbosity() > 0 {
        output::field("Run ids", run_ids.join(", "));
    }
    pb.set_message(format!("Tracking {} run(s)", run_ids.len()));
    let outcome = report(orchestrator, &pb).await;
    if outcome.is_ok() && orchestrator.results().is_empty() {
        output::hint(&format!("cancel with: modelrun cancel {}", recipe.recipe_id));
    }
    outcome
}
