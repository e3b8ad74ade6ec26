use clap::Parser;
use scripts::{cli::Cli, errors::ScriptError};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let cli = Cli::parse();

    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // Results go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    cli.run().await
}
