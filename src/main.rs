//! loadgraph entry point.

use std::fs::File;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use log::{error, info};
use tokio::signal;

use loadgraph::config::{Config, SnapshotSource};
use loadgraph::poller::Refresh;
use loadgraph::view::Applied;
use loadgraph::{tui, Dashboard, HttpBackend};

#[derive(Parser, Debug)]
#[command(name = "loadgraph", version, about = "Live container load graph for the routing server")]
struct Cli {
    /// Routing server base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Endpoint to read snapshots from
    #[arg(long, global = true, value_enum)]
    source: Option<SourceArg>,

    /// Refresh interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SourceArg {
    Status,
    Graph,
}

impl From<SourceArg> for SnapshotSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Status => SnapshotSource::Status,
            SourceArg::Graph => SnapshotSource::Graph,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal dashboard (default)
    Watch,
    /// Poll and log snapshots until Ctrl+C
    Headless,
    /// Poll once and print the rendered scene as JSON
    Snapshot,
    /// Submit work requests and print the outcome
    Work {
        #[arg(short, long)]
        intensity: Option<u32>,
        /// Number of concurrent requests
        #[arg(
            short,
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        count: u32,
    },
}

fn init_logging(command: &Command, config: &Config) -> anyhow::Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    // The terminal dashboard owns the screen; keep log lines out of it.
    if let (Command::Watch, Some(path)) = (command, &config.log_file) {
        builder.target(Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Watch);

    let mut cfg = Config::load()?;
    if let Some(url) = cli.base_url {
        cfg.base_url = url;
    }
    if let Some(source) = cli.source {
        cfg.source = source.into();
    }
    if let Some(ms) = cli.interval_ms {
        cfg.refresh_interval_ms = ms;
    }
    cfg.normalize()?;

    init_logging(&command, &cfg)?;
    info!("Starting loadgraph with config: {:?}", cfg);

    let backend = Arc::new(HttpBackend::new(&cfg)?);
    let mut dashboard = Dashboard::new(backend, &cfg);

    match command {
        Command::Watch => {
            if cfg.auto_refresh {
                dashboard.start_auto_refresh().await;
            } else {
                dashboard.actions().refresh_now().await;
            }
            tui::run(&mut dashboard).await?;
            dashboard.stop_auto_refresh().await;
        }
        Command::Headless => {
            dashboard.start_auto_refresh().await;
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(err) => error!("Unable to listen for shutdown signal: {}", err),
            }
            dashboard.stop_auto_refresh().await;
        }
        Command::Snapshot => match dashboard.actions().refresh_now().await {
            Refresh::Applied(Applied::Rendered { .. }) => {
                let scene = dashboard.shared().view.read().await.scene();
                println!("{}", serde_json::to_string_pretty(&scene)?);
            }
            Refresh::Applied(Applied::Failed(message)) => {
                anyhow::bail!("Failed to fetch snapshot: {}", message)
            }
            other => anyhow::bail!("No snapshot rendered ({:?})", other),
        },
        Command::Work { intensity, count } => {
            let intensity = intensity.unwrap_or(cfg.default_intensity);
            let actions = dashboard.actions();
            actions.refresh_now().await;
            if count > 1 {
                actions.send_bulk_work(intensity, count as usize).await;
            } else {
                actions.send_work(intensity).await;
            }
            for entry in dashboard.shared().activity.read().await.entries() {
                println!("{} {}", entry.at.format("%H:%M:%S"), entry.message);
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}
