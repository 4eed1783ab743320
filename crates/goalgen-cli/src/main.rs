mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "goalgen",
    about = "Generate a multi-agent conversational system from a goal spec",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a spec and generate the project into an output directory
    Generate {
        /// Path to the goal spec (.json, .yaml, or .yml)
        #[arg(long)]
        spec: PathBuf,

        /// Output directory
        #[arg(long, default_value = "generated")]
        out: PathBuf,

        /// Comma-separated target subset (default: all targets in order)
        #[arg(long)]
        targets: Option<String>,

        /// Report what would be generated without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip unchanged files and preserve user-modified ones
        #[arg(long)]
        incremental: bool,

        /// Regenerate every file, overwriting user modifications
        #[arg(long)]
        force: bool,

        /// Generate even if the spec has validation errors
        #[arg(long)]
        skip_validation: bool,
    },

    /// Validate one or more specs without generating anything
    Validate {
        /// Spec files to validate
        #[arg(required = true)]
        specs: Vec<PathBuf>,

        /// Show only errors
        #[arg(long)]
        errors_only: bool,

        /// Show errors and warnings, suppress info suggestions
        #[arg(long)]
        warnings: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Generate {
            spec,
            out,
            targets,
            dry_run,
            incremental,
            force,
            skip_validation,
        } => cmd::generate::run(
            &spec,
            &out,
            targets.as_deref(),
            cmd::generate::Options {
                dry_run,
                incremental,
                force,
                skip_validation,
                json: cli.json,
            },
        ),
        Commands::Validate {
            specs,
            errors_only,
            warnings,
        } => cmd::validate::run(&specs, errors_only, warnings, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
