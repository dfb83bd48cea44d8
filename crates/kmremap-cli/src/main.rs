//! kmremap command-line tool
//!
//! Rewrites the class names inside a Kotlin metadata header, read as JSON,
//! using Tiny mappings.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kmremap")]
#[command(about = "Kotlin metadata remapper", long_about = None)]
#[command(version)]
struct Cli {
    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remap a metadata header
    Remap {
        /// Header JSON file (`k`, `mv`, `d1`, `d2`, ...)
        header: PathBuf,
        /// Tiny mapping file
        #[arg(short, long)]
        mappings: PathBuf,
        /// Namespace to map from (defaults to the config)
        #[arg(long)]
        from: Option<String>,
        /// Namespace to map to (defaults to the config)
        #[arg(long)]
        to: Option<String>,
        /// Internal name of the class the header belongs to
        #[arg(long)]
        class_name: Option<String>,
        /// Config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a metadata header and print it as JSON
    Inspect {
        /// Header JSON file
        header: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("KMREMAP_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = output::resolve_color_choice(cli.color.as_deref());

    match cli.command {
        Commands::Remap {
            header,
            mappings,
            from,
            to,
            class_name,
            config,
            output,
        } => commands::remap::execute(
            commands::remap::RemapOptions {
                header,
                mappings,
                from,
                to,
                class_name,
                config,
                output,
            },
            color,
        ),

        Commands::Inspect { header } => commands::inspect::execute(&header),
    }
}
