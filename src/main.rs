//! Pipeline scheduler CLI
//!
//! Entry point for the `pipeline-scheduler` command-line tool.

use clap::{Parser, Subcommand};
use pipeline_scheduler::config::{host_config_path, REPO_CONFIG_PATH};
use pipeline_scheduler::{render, reverse, source, CompileError, EffectiveConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pipeline-scheduler")]
#[command(about = "Compile pipeline Scheduler documents into CI bot configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile Scheduler documents into config.yaml and plugins.yaml
    Compile {
        /// Scheduler files or directories
        #[arg(long, short = 's', required = true, num_args = 1..)]
        schedulers: Vec<PathBuf>,

        /// Output directory
        #[arg(long, short = 'o')]
        out: PathBuf,

        /// Namespace for pods and jobs (overrides config)
        #[arg(long, short = 'n')]
        namespace: Option<String>,

        /// Path to repo config file (default: .pipeline-scheduler/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Print written files and digests as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rebuild Scheduler documents from an existing configuration
    Import {
        /// Compiled job and policy configuration
        #[arg(long, default_value = "config.yaml")]
        config_file: PathBuf,

        /// Compiled plugin configuration
        #[arg(long, default_value = "plugins.yaml")]
        plugins_file: PathBuf,

        /// Output directory for Scheduler resources
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Show the resolved parent chain of every repository
    Chains {
        /// Scheduler files or directories
        #[arg(long, short = 's', required = true, num_args = 1..)]
        schedulers: Vec<PathBuf>,

        /// Path to repo config file (default: .pipeline-scheduler/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            schedulers,
            out,
            namespace,
            config,
            json,
        } => run_compile(&schedulers, &out, namespace, config, json),
        Commands::Import {
            config_file,
            plugins_file,
            out,
        } => run_import(&config_file, &plugins_file, &out),
        Commands::Chains {
            schedulers,
            config,
            json,
        } => run_chains(&schedulers, config, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(
    repo_config: Option<PathBuf>,
    namespace: Option<String>,
) -> Result<EffectiveConfig, CompileError> {
    let host = host_config_path();
    let repo = repo_config.unwrap_or_else(|| PathBuf::from(REPO_CONFIG_PATH));
    let cli = namespace.map(|ns| serde_json::json!({ "namespace": ns }));
    Ok(EffectiveConfig::build(host.as_deref(), Some(&repo), cli)?)
}

fn run_compile(
    schedulers: &[PathBuf],
    out: &Path,
    namespace: Option<String>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<(), CompileError> {
    let effective = load_config(config, namespace)?;
    let docs = source::load_documents(schedulers)?;
    let compiled = pipeline_scheduler::compile(&docs, &effective.config)?;
    for warning in &compiled.warnings {
        eprintln!("Warning: {}", warning);
    }
    for cycle in &compiled.cycles {
        eprintln!("Error: {} (repository skipped)", cycle);
    }

    let rendered = render::render(&compiled.config, &compiled.plugins, &effective.config.output)?;
    let written = rendered.write_to_dir(out)?;

    if json {
        match rendered.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!(
            "Compiled {} repositories from {} schedulers",
            compiled.leaves.len(),
            docs.len()
        );
        for (path, file) in written.iter().zip([&rendered.config, &rendered.plugins]) {
            println!("  {}  sha256:{}", path.display(), file.sha256);
        }
    }
    Ok(())
}

fn run_import(config_file: &Path, plugins_file: &Path, out: &Path) -> Result<(), CompileError> {
    let (config, plugins) = source::load_compiled(config_file, plugins_file)?;
    let docs = reverse::reconstruct(&config.job_config, &config.prow_config, &plugins)?;
    let files = render::render_schedulers(&docs)?;
    let written = render::write_schedulers(&files, out)?;
    println!("Wrote {} schedulers to {}", written.len(), out.display());
    Ok(())
}

#[derive(Serialize)]
struct ChainReport {
    repo: String,
    chain: Vec<String>,
}

#[derive(Serialize)]
struct ChainsReport {
    chains: Vec<ChainReport>,
    warnings: Vec<String>,
    cycles: Vec<String>,
}

fn run_chains(schedulers: &[PathBuf], config: Option<PathBuf>, json: bool) -> Result<(), CompileError> {
    let effective = load_config(config, None)?;
    let docs = source::load_documents(schedulers)?;
    let set = pipeline_scheduler::resolve_chains(&docs, effective.config.team_scheduler())?;

    let report = ChainsReport {
        chains: set
            .chains
            .iter()
            .map(|c| ChainReport {
                repo: format!("{}/{}", c.org, c.repo),
                chain: c.members.clone(),
            })
            .collect(),
        warnings: set.warnings.iter().map(ToString::to_string).collect(),
        cycles: set.cycles.iter().map(ToString::to_string).collect(),
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return Ok(());
    }

    for chain in &report.chains {
        println!("{}: {}", chain.repo, chain.chain.join(" -> "));
    }
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    for cycle in &report.cycles {
        println!("Error: {}", cycle);
    }
    Ok(())
}
