//! elsat CLI main entry point

use anyhow::Result;
use clap::Parser;
use elsat_cli::commands::{Cli, CommandExecutor};

fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let executor = CommandExecutor::new(&cli)?;
    let result = executor.execute(&cli)?;

    print!("{}", result.output);
    if !result.message.is_empty() {
        eprint!("{}", result.message);
    }
    Ok(())
}
