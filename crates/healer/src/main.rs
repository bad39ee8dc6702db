//! Drydock healer CLI
//!
//! Runs the fleet healers on demand, serves them over HTTP for an external
//! scheduler, and collects container status into the unit store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use drydock_config::PlatformConfig;
use provision::{persist_status, DockerProvisioner, FileStore, Provisioner, SystemExecutor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use healer::{healers, CloudEndpoints, HealContext, HealOutcome, HealerRegistry};

/// Self-healing control plane - detects fleet inconsistencies and repairs them
#[derive(Parser)]
#[command(name = "healer")]
#[command(about = "Self-healing control plane - detects fleet inconsistencies and repairs them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the platform configuration file
    #[arg(long, env = "DRYDOCK_CONFIG", default_value = "drydock.json", global = true)]
    config: PathBuf,

    /// Log format
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered healers
    List,
    /// Run one healer by name
    Run {
        /// Healer name (see `list`)
        name: String,
    },
    /// Run every healer, each isolated from the others' failures
    RunAll,
    /// Serve the HTTP trigger
    Serve {
        /// Listen address, overrides `healer.listen`
        #[arg(long)]
        listen: Option<String>,
    },
    /// Collect container status and persist it into the unit store
    Collect,
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default = if verbose {
        "healer=debug,provision=debug"
    } else {
        "healer=info,provision=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
    }
}

fn load_config(path: &Path) -> Result<PlatformConfig> {
    if path.exists() {
        return PlatformConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    warn!(path = %path.display(), "Configuration file not found, using defaults");
    let mut config = PlatformConfig::default();
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

struct Platform {
    config: PlatformConfig,
    provisioner: Arc<DockerProvisioner>,
    store: Arc<FileStore>,
    registry: HealerRegistry,
}

fn build(config: PlatformConfig) -> Result<Platform> {
    let executor = Arc::new(SystemExecutor::new(config.docker.command_timeout()));
    let store = Arc::new(FileStore::new(&config.store.path));
    let provisioner = Arc::new(DockerProvisioner::with_store(
        config.docker.clone(),
        executor.clone(),
        store.clone(),
    ));
    let cloud = CloudEndpoints::from_config(&config.aws).context("Failed to set up cloud endpoints")?;
    let ctx = HealContext::new(
        config.juju.clone(),
        executor,
        cloud,
        store.clone(),
        provisioner.clone(),
    );
    let registry = healers::registry(&ctx);
    Ok(Platform {
        config,
        provisioner,
        store,
        registry,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let platform = build(load_config(&cli.config)?)?;

    match cli.command {
        Commands::List => {
            for name in platform.registry.names() {
                println!("{name}");
            }
        }
        Commands::Run { name } => {
            platform
                .registry
                .heal(&name)
                .await
                .with_context(|| format!("Healer {name} failed"))?;
            println!("{} {name}", "healed".green());
        }
        Commands::RunAll => {
            let reports = platform.registry.heal_all().await;
            let failed = reports.iter().filter(|r| !r.is_healed()).count();
            for report in &reports {
                match &report.outcome {
                    HealOutcome::Healed => println!("{} {}", "healed".green(), report.name),
                    HealOutcome::Failed { error } => {
                        println!("{} {}: {error}", "failed".red(), report.name);
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} healers failed", reports.len());
            }
        }
        Commands::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| platform.config.healer.listen.clone());
            healer::server::serve(Arc::new(platform.registry), &listen)
                .await
                .with_context(|| format!("Failed to serve on {listen}"))?;
        }
        Commands::Collect => {
            let units = platform
                .provisioner
                .collect_status()
                .await
                .context("Failed to collect container status")?;
            let updated = persist_status(platform.store.as_ref(), &units)
                .await
                .context("Failed to persist unit status")?;
            info!(updated, "Persisted unit status");
            for unit in &units {
                println!("{} {} {} {}", unit.app_name.bold(), unit.name, unit.status, unit.ip);
            }
        }
    }
    Ok(())
}
