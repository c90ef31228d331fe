use color_eyre::Result;
use log::info;

mod config;
mod diff;
mod monitor;
mod notify;
mod scraper;
mod storage;

use crate::config::Config;
use crate::monitor::Monitor;
use crate::notify::Sink;
use crate::scraper::StoreClient;
use crate::storage::SnapshotStore;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!(
        "Watching {} every {}s",
        config.home_url,
        config.poll_interval_secs
    );

    let mut monitor = Monitor::new(
        StoreClient::new(&config)?,
        Sink::from_config(&config)?,
        SnapshotStore::new(&config.products_file),
    );
    monitor.run(config.poll_interval(), config.max_cycles);
    Ok(())
}
