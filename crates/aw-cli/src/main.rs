//! CLI frontend for the Abyss Walker narrative turn engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "aw",
    about = "Abyss Walker: a narrative dungeon crawl with an AI companion",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume an interactive session
    Play {
        /// RNG seed for reproducible dice and fallback lines
        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory holding the saved session
        #[arg(long, default_value = ".")]
        save_dir: PathBuf,

        /// Never call the narrative service, even if AW_API_KEY is set
        #[arg(long)]
        offline: bool,

        /// Pause before the enemy turn resolves, in milliseconds
        #[arg(long, default_value = "1000")]
        enemy_delay_ms: u64,
    },

    /// Summarize the saved session
    Status {
        /// Directory holding the saved session
        #[arg(long, default_value = ".")]
        save_dir: PathBuf,
    },

    /// Delete the saved session
    Reset {
        /// Directory holding the saved session
        #[arg(long, default_value = ".")]
        save_dir: PathBuf,
    },

    /// Export the game log of the saved session
    Log {
        /// Output format: markdown, text
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Directory holding the saved session
        #[arg(long, default_value = ".")]
        save_dir: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            seed,
            save_dir,
            offline,
            enemy_delay_ms,
        } => commands::play::run(&save_dir, seed, offline, enemy_delay_ms),
        Commands::Status { save_dir } => commands::status::run(&save_dir),
        Commands::Reset { save_dir } => commands::reset::run(&save_dir),
        Commands::Log { format, save_dir } => commands::log::run(&save_dir, &format),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
