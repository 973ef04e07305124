pub mod chart;
pub mod clients;
pub mod config;
pub mod enrich;
pub mod error;
pub mod http;
pub mod pathway;
pub mod pillar;
pub mod storage;

pub use chart::{
    ChartFormat, ChartOptions, ChartRenderer, ColorScheme, EncodedImage, render_chart,
    render_placeholder_chart,
};
pub use error::{IkigaiError, Result};
pub use pathway::PathwayState;
pub use pillar::{Pillar, PillarResponses};

// Load env with smart fallbacks:
// 1) IKIGAI_ENV_FILE if set
// 2) ./.env, silently ignored when missing
pub fn load_env() {
    if let Ok(env_path) = std::env::var("IKIGAI_ENV_FILE") {
        if let Err(e) = dotenvy::from_path(&env_path) {
            tracing::warn!("Failed to load env file {}: {}", env_path, e);
        }
    } else {
        let _ = dotenvy::dotenv();
    }
}

/// Install the fmt subscriber used by both binaries
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
