use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Tessera permission tooling")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a configuration and resolve every role's permission matrix against the metadata.
    Check {
        /// Path to tessera.yaml
        #[arg(long, short, default_value = "tessera.yaml")]
        config: PathBuf,
    },

    /// Describe a query and show whether a role may run it.
    Explain(commands::explain::ExplainArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Check { config } => commands::check::run(&config),
        Command::Explain(args) => commands::explain::run(&args),
    }
}
