use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use suite::{default_registry, Runner, RunnerConfig};
use tracing::error;

#[derive(Parser)]
#[command(name = "suite")]
#[command(about = "Run conformance cases against the reference host runtime")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered conformance cases
    List,
    /// Run cases and print a report
    Run {
        /// Only run cases whose name contains this substring
        #[arg(short, long)]
        filter: Option<String>,
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the per-case timeout, in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Stop at the first case that does not pass
        #[arg(long)]
        fail_fast: bool,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let registry = default_registry();

    match cli.command {
        Commands::List => {
            println!("Registered cases:");
            for case in registry.list() {
                println!("  {:<22} {}", case.name(), case.description());
            }
        }
        Commands::Run {
            filter,
            config,
            timeout_secs,
            fail_fast,
            json,
        } => {
            let mut runner_config = match config {
                Some(path) => RunnerConfig::load(&path)?,
                None => RunnerConfig::default(),
            };
            if let Some(secs) = timeout_secs {
                runner_config = runner_config.with_case_timeout(Duration::from_secs(secs));
            }
            if fail_fast {
                runner_config = runner_config.with_fail_fast(true);
            }
            runner_config.validate()?;

            let runner = Runner::new(runner_config);
            let report = runner.run(&registry, filter.as_deref()).await;

            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report.render());
            }

            if !report.passed() {
                error!(
                    failed = report.summary.failed,
                    errored = report.summary.errored,
                    timed_out = report.summary.timed_out,
                    "suite did not pass"
                );
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
