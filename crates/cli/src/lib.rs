mod args;
mod disk;
mod scan;
mod schema;
mod view;
mod watch;

use args::EngineArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use view::OutputFormat;

#[derive(Parser)]
#[command(
    name = "alphabeta",
    version,
    about = "Find internal, alpha, beta and deprecated API usage in TypeScript sources",
    long_about = "alphabeta asks a TypeScript language server for the documentation of every \
                  identifier in the given files and reports the ones whose docs carry a \
                  lifecycle tag (@internal, @alpha, @beta, @deprecated)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan files once and print the annotations found
    Scan {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Rescan files periodically and print a summary after every change
    #[command(
        long_about = "Re-reads the files from disk on every tick (see --interval) and prints \
                      a one-line summary whenever the annotation index changes."
    )]
    Watch {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Start the Language Server Protocol (LSP) server on stdio
    Lsp {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the JSON schema of the settings file
    Schema,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Lsp { .. } => "lsp",
        _ => "cli",
    };
    // stdout belongs to the protocol in LSP mode
    let _guard = alphabeta_core::logging::init_logging(component, component != "lsp");

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Scan { files, engine, format } => rt.block_on(scan::run(files, engine, format)),
        Commands::Watch { files, engine } => rt.block_on(watch::run(files, engine)),
        Commands::Lsp { engine } => rt.block_on(serve_lsp(engine)),
        Commands::Schema => schema::run(),
    }
}

async fn serve_lsp(engine: EngineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = engine.annotation_config()?;
    let root = std::env::current_dir()?;
    let oracles = engine.spawn_oracles(&root).await?;
    alphabeta_lsp::run_server(oracles.combined.clone(), config).await?;
    oracles.shutdown().await;
    Ok(())
}
