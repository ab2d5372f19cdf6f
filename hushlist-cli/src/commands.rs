use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use hushlist_config::HushlistConfig;
use hushlist_core::channel::CommandBus;
use hushlist_engine::{replay_scenario, ControlSurface, ReplayReport};
use hushlist_simulator::Scenario;
use hushlist_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser)]
#[command(name = "hushlist", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario against the simulated host
    Replay(ReplayArgs),
    /// List the user apps a scenario installs
    Apps(AppsArgs),
    /// Load and validate configuration, then print it
    CheckConfig(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file; defaults to the layered `config/` lookup
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[arg(short, long)]
    pub scenario: PathBuf,
    /// Expected hex tray hash after the last step
    #[arg(long)]
    pub validate_hash: Option<String>,
    /// Print prometheus metrics after the replay
    #[arg(long)]
    pub metrics: bool,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AppsArgs {
    #[arg(short, long)]
    pub scenario: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Replay(args) => run_replay(args).await,
        Commands::Apps(args) => run_apps(args),
        Commands::CheckConfig(args) => run_check_config(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HushlistConfig> {
    let config = match path {
        Some(path) => HushlistConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HushlistConfig::load().context("loading layered configuration")?,
    };
    EventLogger::init(&config.telemetry);
    Ok(config)
}

fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    Scenario::load_from_file(path).with_context(|| format!("reading scenario {}", path.display()))
}

async fn run_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.config.as_deref())?;
    let scenario = load_scenario(&args.scenario)?;
    let metrics = Arc::new(MetricsRecorder::new()?);

    info!(scenario = %args.scenario.display(), "Starting replay");
    let report = replay_scenario(
        &scenario,
        &config,
        metrics.clone(),
        args.validate_hash.as_deref(),
    )
    .await?;
    print_report(&report);

    if args.metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

fn print_report(report: &ReplayReport) {
    println!("steps:                {}", report.steps);
    println!("suppressed:           {}", report.suppressed);
    println!("suppression failures: {}", report.suppression_failures);
    println!("dropped commands:     {}", report.dropped);
    println!("rejected requests:    {}", report.rejected);
    println!("blocked:              {}", report.blocked.join(", "));
    println!("visible:              {}", report.visible.join(", "));
    println!("tray hash:            {}", report.tray_hash);
}

fn run_apps(args: AppsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.config.as_deref())?;
    let scenario = load_scenario(&args.scenario)?;
    let host = Arc::new(scenario.build_host(config.host.api_level));

    let bus = CommandBus::new(config.channel.action.clone(), config.channel.capacity);
    let control = ControlSurface::new(bus.sender(), host.clone());
    for app in control.installed_apps(host.as_ref())? {
        println!("{}\t{}", app.identifier, app.display_name);
    }
    Ok(())
}

fn run_check_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    println!("{config:#?}");
    Ok(())
}
