use abacus_cli::commands::{Cmd, Command};
use clap::Parser;

/// Abacus CLI
///
/// Abacus drives the on-chain calculator contract through a wallet session: read-only
/// arithmetic is answered by a single call, square roots are submitted as transactions and
/// their value recovered by simulation. Commands run against an in-process devnet.
#[derive(Parser)]
#[command(name = "abacus")]
#[command(about = "Abacus: on-chain calculator client")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Cmd,
}

/// Runs the Abacus CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute().await
}
