use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use edge_healthchecks::{
    api::{ApiConfig, ApiState, spawn_api_server},
    cluster::Cluster,
    config::{Config, read_config_file},
    storage::open_backend,
    util::get_log_level,
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Periodic HTTP health checks on a durable actor runtime")]
struct Args {
    /// Config file (JSON or TOML); defaults apply when omitted
    #[arg(short)]
    file: Option<PathBuf>,
}

fn init() {
    let level = get_log_level()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::INFO);

    let filter = filter::Targets::new().with_target("edge_healthchecks", level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    };

    let backend = open_backend(&config.storage)
        .await
        .context("failed to open storage backend")?;
    let cluster = Cluster::start(&config, backend).await?;

    let addr = spawn_api_server(
        ApiConfig::from(&config.server),
        ApiState::new(cluster.clone()),
    )
    .await?;
    info!("serving health checks on http://{addr}/api/v1");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    info!("shutting down");
    cluster.shutdown().await;

    Ok(())
}
