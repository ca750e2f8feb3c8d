mod cli;
mod watch;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::CliArgs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // .env must be loaded before clap reads `env = ..` defaults
    roster_core::config::load_dotenv();
    let args = CliArgs::parse();

    let mut config = roster_core::Config::from_env();
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }
    config.log_summary();

    watch::run(&config, &args).await
}
