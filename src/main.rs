use std::env;
use std::error::Error;

use chrono::Utc;

use windcast_service::config::{self, DEFAULT_CONFIG_PATH};
use windcast_service::ingest::open_meteo::HttpFetcher;
use windcast_service::logging::{self, DEFAULT_LOG_FILTER};
use windcast_service::pipeline;

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    logging::init_logger(DEFAULT_LOG_FILTER);

    let config_path = env::var("WINDCAST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = config::load_config_or_default(&config_path)?;
    if let Ok(output_path) = env::var("WINDCAST_OUTPUT") {
        config.output_path = output_path;
        config.validate()?;
    }

    let fetcher = HttpFetcher::new(config.request.timeout_secs)?;
    let summary = pipeline::run(&config, &fetcher, Utc::now())?;
    log::info!(
        "Wrote {} ({} entries from {} sources)",
        summary.output_path.display(),
        summary.entries,
        summary.sources_used
    );

    Ok(())
}
