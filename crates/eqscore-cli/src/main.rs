//! eqscore CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "eqscore", version, about = "EQ assessment scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one candidate's answer sheet
    Evaluate {
        /// Path to the .toml question battery
        #[arg(long)]
        battery: PathBuf,

        /// Path to the .json answer sheet
        #[arg(long)]
        answers: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also save the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score every answer sheet in a directory
    Batch {
        /// Path to the .toml question battery
        #[arg(long)]
        battery: PathBuf,

        /// Directory of .json answer sheets
        #[arg(long)]
        submissions: PathBuf,

        /// Max concurrent submissions (default from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory (default from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate battery TOML files
    Validate {
        /// Path to battery file or directory
        #[arg(long)]
        battery: PathBuf,
    },

    /// Compare two evaluation reports of the same candidate
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold in score points
        #[arg(long, default_value = "5.0")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and example battery
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eqscore=info".parse().expect("valid log directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            battery,
            answers,
            format,
            output,
            config,
        } => commands::evaluate::execute(battery, answers, format, output, config),
        Commands::Batch {
            battery,
            submissions,
            parallelism,
            output,
            config,
        } => commands::batch::execute(battery, submissions, parallelism, output, config).await,
        Commands::Validate { battery } => commands::validate::execute(battery),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
