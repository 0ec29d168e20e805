//! Handler for the `normalize` command.

use std::sync::Arc;

use serde_json::Value;

use crate::adapter::inbound::cli::command::NormalizeArgs;
use crate::adapter::inbound::cli::files::{read_json, NodeFile};
use crate::adapter::inbound::cli::{load_config, output};
use crate::adapter::outbound::http::HttpBackend;
use crate::application::normalize::rules::ModelMatch;
use crate::application::normalize::Normalizer;
use crate::error::Result;
use crate::infrastructure::bootstrap::build_rule_registry;

/// Print the request input the node would submit.
///
/// Runs the same side steps as a real submission (dimension probes and
/// visual-id registration) but never submits.
pub async fn execute(args: &NormalizeArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let node: NodeFile = read_json(&args.node)?;

    let assets = Arc::new(HttpBackend::new(&config.backend)?);
    let normalizer = Normalizer::new(assets, build_rule_registry(&config));

    if output::verbosity() > 0 {
        let model = ModelMatch {
            name: &node.model.name,
            model_type: node.model.model_type(),
        };
        let rules = normalizer.rules().matching(&model);
        output::field("Model", output::highlight(&node.model.name));
        output::field("Type", model.model_type.as_str());
        output::field(
            "Rules",
            if rules.is_empty() {
                output::muted("none")
            } else {
                rules.join(", ")
            },
        );
    }

    let input = normalizer.normalize(node.snapshot(args.seed)).await?;
    output::document("input", &Value::Object(input));
    Ok(())
}
