use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod render;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    commands::run(cli::Cli::parse()).await
}

/// Logs go to stderr so table and export output on stdout stay clean.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
