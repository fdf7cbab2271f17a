use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "erk")]
#[command(about = "Error reconciliation kit CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate layered config and report keys nothing reads
    ConfigCheck {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,

        /// Fail (non-zero exit) when unused keys are present
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Replay a scripted sequence of snapshots / acknowledgements / actions
    /// through the reconciliation core and print the state after each step
    Replay {
        /// Path to the replay script (JSON)
        script: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => commands::config::config_hash(&paths)?,
        Commands::ConfigCheck { paths, strict } => commands::config::config_check(&paths, strict)?,
        Commands::Replay { script } => commands::replay::replay_file(&script)?,
    }

    Ok(())
}

/// Diagnostics go to stderr; stdout is reserved for command output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
