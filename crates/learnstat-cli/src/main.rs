//! learnstat CLI, the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "learnstat",
    version,
    about = "Per-topic learning statistics for quiz platforms"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute learning statistics
    Compute {
        /// Path to a snapshot file (.toml or .json) or directory
        #[arg(long)]
        snapshot: PathBuf,

        /// Learner to compute for (default: every user with answers)
        #[arg(long)]
        user: Option<String>,

        /// Output directory (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, table, all (default: from config)
        #[arg(long)]
        format: Option<String>,

        /// Cohort for frequency_in_depth: depth or siblings
        #[arg(long)]
        frequency_reference: Option<String>,

        /// Max concurrent computations
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two learning reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Grade points a topic must move to count as changed (default: from config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate snapshot files
    Validate {
        /// Path to snapshot file or directory
        #[arg(long)]
        snapshot: PathBuf,
    },

    /// Create starter config and example snapshot
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("learnstat=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compute {
            snapshot,
            user,
            output,
            format,
            frequency_reference,
            parallelism,
            config,
        } => {
            commands::compute::execute(commands::compute::ComputeArgs {
                snapshot,
                user,
                output,
                format,
                frequency_reference,
                parallelism,
                config,
            })
            .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { snapshot } => commands::validate::execute(snapshot),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
