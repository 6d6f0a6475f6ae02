use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::File;
use tracing::info;

use router_connector::config::RouterConfig;
use router_connector::ext::init_logger_with_filter;
use router_connector::router::Router;

#[derive(Parser, Debug)]
struct Args {
    /// Router config in toml format.
    #[arg(short, long)]
    config: PathBuf,
    /// Seconds between two connector queries.
    #[arg(short, long, default_value_t = 5)]
    interval: u64,
    #[arg(long, default_value = "router_connector=info,router=info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger_with_filter(args.log.as_str());
    let config = RouterConfig::builder()
        .add_source(File::from(args.config.as_path()))
        .build()?;
    let router = Router::start(&config).await?;
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                info!("connectors {}", router.publisher().to_json()?);
            }
        }
    }
    router.shutdown().await;
    Ok(())
}
