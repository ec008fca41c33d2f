//! sheetquiz CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod console;

#[derive(Parser)]
#[command(
    name = "sheetquiz",
    version,
    about = "Self-study quizzes from spreadsheet question banks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive quiz session
    Run(commands::run::RunArgs),

    /// List the published sheets of a Google Sheets workbook
    Sheets {
        /// Workbook link
        #[arg(long)]
        source: String,
    },

    /// Print a saved JSON session report, optionally re-rendering it
    Report {
        /// Path to a report written with `run --output`
        path: PathBuf,

        /// Formats to write: html, md, json, all
        #[arg(long)]
        format: Option<String>,

        /// Colour theme for HTML output: light or dark
        #[arg(long)]
        theme: Option<sheetquiz_core::model::Theme>,

        /// Output directory (default: next to the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check question banks and report kept/dropped rows
    Validate {
        /// Sheet links, CSV URLs, or local paths
        #[arg(long, required = true, num_args = 1..)]
        source: Vec<String>,

        /// Tabs to check when a source is a whole workbook: "all" or gids
        #[arg(long)]
        sheets: Option<sheetquiz_sources::SheetSelection>,
    },

    /// Create a starter config and example question bank
    Init {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sheetquiz=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Sheets { source } => commands::sheets::execute(source).await,
        Commands::Report {
            path,
            format,
            theme,
            output,
        } => commands::report::execute(path, format, theme, output),
        Commands::Validate { source, sheets } => commands::validate::execute(source, sheets).await,
        Commands::Init { dir } => commands::init::execute(dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
