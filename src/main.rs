use anyhow::Result;
use tracing::info;

use ikigai_pathway::clients::create_generator;
use ikigai_pathway::config::{Config, DEFAULT_LOG_LEVEL};
use ikigai_pathway::enrich::Enricher;
use ikigai_pathway::http::{HttpState, start_http_server};
use ikigai_pathway::storage::create_store;

#[tokio::main]
async fn main() -> Result<()> {
    ikigai_pathway::load_env();
    ikigai_pathway::init_tracing(DEFAULT_LOG_LEVEL);

    info!("Starting Ikigai Pathway service");

    let config = Config::load()?;
    let store = create_store(&config)?;
    let enricher = Enricher::new(create_generator(&config.ai, &config.runtime));
    info!(
        "Storage backend: {}, AI provider: {}",
        store.backend(),
        enricher.provider().unwrap_or("fallback")
    );

    let state = HttpState::new(config, store, enricher)?;
    start_http_server(state).await
}
