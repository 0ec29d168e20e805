use clap::Parser;

use modelrun::adapter::inbound::cli::{self, command::Cli, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    cli::configure(&cli);

    if let Err(e) = cli::execute(&cli).await {
        tracing::debug!(error = ?e, "Command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
