//! ElasticSim CLI — size a server fleet against a recorded load trace.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use elasticsim_core::config::SimConfig;
use elasticsim_core::trace::{self, DiurnalShape, LoadTrace};
use elasticsim_core::{metrics, ScheduleEngine};
use elasticsim_scheduler::Policy;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "elasticsim",
    about = "Elastic capacity scheduling for server fleets",
    version
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a trace with a single policy.
    Run {
        /// Path to TOML configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Path to trace file.
        #[arg(short, long)]
        trace: Option<PathBuf>,
        /// Scheduling policy name.
        #[arg(short, long, default_value = "transitions")]
        policy: String,
        /// Write the report to a JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare multiple policies on the same trace.
    Compare {
        /// Path to TOML configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Path to trace file.
        #[arg(short, long)]
        trace: Option<PathBuf>,
        /// Comma-separated list of policy names.
        #[arg(short = 'P', long, value_delimiter = ',')]
        policies: Vec<String>,
        /// Write the reports to a JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge `time,count` exports into one raw series, one value per second.
    Aggregate {
        /// Timeseries files to merge.
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,
        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate a synthetic diurnal raw-load trace.
    GenTrace {
        /// Number of steps.
        #[arg(long, default_value = "1440")]
        steps: u64,
        /// Raw load at the daily peak.
        #[arg(long, default_value = "480000")]
        peak: f64,
        /// Steps per day.
        #[arg(long, default_value = "1440")]
        period: u64,
        /// Relative per-step jitter.
        #[arg(long, default_value = "0.05")]
        noise: f64,
        /// RNG seed.
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List available policies.
    ListPolicies,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Run {
            config,
            trace: trace_path,
            policy,
            output,
        } => {
            let sim_config = load_config(&config)?;
            let policy = parse_policy(&policy)?;
            let load = load_load_trace(&sim_config, trace_path.as_deref())?;

            let mut engine = ScheduleEngine::new(sim_config.clone())?;
            let outcome = engine
                .run(policy, &load)
                .with_context(|| format!("Policy {} failed", policy.name()))?;

            let (schedule_lines, transition_lines) =
                elasticsim_core::export_outcome(&sim_config, &outcome)?;
            info!(schedule_lines, transition_lines, "exported schedule");

            println!("{}", metrics::format_table(&outcome.report));
            if let Some(output_path) = output {
                write_json(&output_path, &outcome.report)?;
            }
        }
        Commands::Compare {
            config,
            trace: trace_path,
            policies,
            output,
        } => {
            let sim_config = load_config(&config)?;
            let load = load_load_trace(&sim_config, trace_path.as_deref())?;
            let names: Vec<&str> = if policies.is_empty() {
                elasticsim_scheduler::available_policies()
            } else {
                policies.iter().map(|s| s.as_str()).collect()
            };

            let results = elasticsim_core::compare_policies(&sim_config, &load, &names)?;
            println!("{}", metrics::format_comparison_table(&results));
            for result in &results {
                println!("{}", metrics::format_table(result));
            }

            if let Some(output_path) = output {
                write_json(&output_path, &results)?;
            }
        }
        Commands::Aggregate { input, output } => {
            let series = trace::aggregate_timeseries(&input).context("Error aggregating input")?;
            trace::write_raw_series(&series, &output)
                .with_context(|| format!("Error writing {}", output.display()))?;
            println!(
                "Aggregated {} files into {} seconds at {}",
                input.len(),
                series.len(),
                output.display()
            );
        }
        Commands::GenTrace {
            steps,
            peak,
            period,
            noise,
            seed,
            output,
        } => {
            if !(0.0..1.0).contains(&noise) {
                bail!("noise must be in [0, 1), got {}", noise);
            }
            let shape = DiurnalShape {
                peak,
                period,
                noise,
            };
            let series = trace::generate_diurnal(steps, shape, seed);
            trace::write_raw_series(&series, &output)
                .with_context(|| format!("Error writing {}", output.display()))?;
            println!("Generated {} steps to {}", series.len(), output.display());
        }
        Commands::ListPolicies => {
            println!("Available scheduling policies:");
            for name in elasticsim_scheduler::available_policies() {
                println!("  - {}", name);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<SimConfig> {
    SimConfig::from_file(path).with_context(|| format!("Error loading config {}", path.display()))
}

fn parse_policy(name: &str) -> Result<Policy> {
    match elasticsim_scheduler::policy_by_name(name) {
        Some(policy) => Ok(policy),
        None => bail!(
            "Unknown policy: {}. Available: {:?}",
            name,
            elasticsim_scheduler::available_policies()
        ),
    }
}

fn load_load_trace(config: &SimConfig, trace_path: Option<&Path>) -> Result<LoadTrace> {
    let path = trace_path
        .map(PathBuf::from)
        .or_else(|| config.trace.path.as_ref().map(PathBuf::from));

    let Some(path) = path else {
        bail!("No trace file specified. Use --trace or set trace.path in config.");
    };
    let topology = config.topology()?;
    trace::load_trace(&path, &config.trace.format, &topology)
        .with_context(|| format!("Error loading trace {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Error writing {}", path.display()))?;
    println!("Results written to {}", path.display());
    Ok(())
}
