//! examforge CLI — take and validate timed multiple-choice tests.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examforge", version, about = "Timed multiple-choice tests on the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a test interactively
    Take {
        /// Test identifier (file stem under the tests directory)
        #[arg(long)]
        test: String,

        /// Directory holding test resources (overrides config)
        #[arg(long, conflicts_with = "base_url")]
        tests_dir: Option<PathBuf>,

        /// Base URL serving `/tests/<id>.json` (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Write the JSON result report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate test resource files
    Validate {
        /// Path to a test file or a directory of them
        #[arg(long)]
        test: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and a sample test
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            test,
            tests_dir,
            base_url,
            report,
            config,
        } => commands::take::execute(test, tests_dir, base_url, report, config).await,
        Commands::Validate { test, config } => commands::validate::execute(test, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
