use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use bee_city::{
    config::{CityConfig, ConfigLoader},
    session::Session,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Bee City Builder server")]
struct Cli {
    /// Optional YAML file describing the grid, starting wallet and tools
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the client bundle (index.html, app.js, styles.css)
    #[arg(long, default_value = "web")]
    root: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Override the number of tiles
    #[arg(long)]
    grid_size: Option<usize>,

    /// Override the starting wallet
    #[arg(long)]
    starting_wallet: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ConfigLoader::new(".").load(path)?,
        None => CityConfig::default(),
    }
    .with_overrides(cli.grid_size, cli.starting_wallet);

    let city = config.build_city()?;
    info!(
        tiles = city.grid_size(),
        wallet = city.wallet(),
        tools = city.catalog().len(),
        "city ready"
    );

    web::run(WebServerConfig {
        session: Session::new(city),
        asset_root: cli.root,
        host: cli.host,
        port: cli.port,
    })
    .await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    let _ = fmt().with_env_filter(env_filter).try_init();
}
