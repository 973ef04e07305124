use serde::{Deserialize, Serialize};

use crate::chart::{ChartFormat, ColorScheme, DEFAULT_SIZE_PX, MAX_SIZE_PX, MIN_SIZE_PX};

/// Main configuration structure loaded from ikigai_pathway.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub chart: ChartConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Canvas defaults for the chart renderer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub size_px: u32,
    pub format: ChartFormat,
    /// Palette used when a request carries no color scheme
    pub color_scheme: ColorScheme,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            size_px: DEFAULT_SIZE_PX,
            format: ChartFormat::Png,
            color_scheme: ColorScheme::default(),
        }
    }
}

/// Which response store backs the service
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// "memory" or "supabase"
    pub backend: String,
    pub supabase_url: String,
    pub responses_table: String,
    pub charts_table: String,
    pub profiles_table: String,
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            supabase_url: String::new(),
            responses_table: "ikigai_responses".to_string(),
            charts_table: "charts".to_string(),
            profiles_table: "profiles".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Suggestion and tip provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    /// "groq", "gemini", "none" or "auto"
    pub provider: String,
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub groq_base_url: String,
    pub gemini_base_url: String,
    pub max_retries: u32,
    pub timeout_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            model: None,
            groq_base_url: crate::clients::groq::DEFAULT_BASE_URL.to_string(),
            gemini_base_url: crate::clients::gemini::DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            timeout_ms: 20_000,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub supabase_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub log_level: String,
    pub http_bind: std::net::SocketAddr,
    pub bearer_token: Option<String>,
    pub http_request_timeout_ms: u64,
}

pub const DEFAULT_LOG_LEVEL: &str = "ikigai_pathway=info,tower_http=info";

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            supabase_key: None,
            groq_api_key: None,
            gemini_api_key: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            http_bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8790)),
            bearer_token: None,
            http_request_timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses IKIGAI_CONFIG environment variable or defaults to "ikigai_pathway.toml"
    pub fn load() -> anyhow::Result<Self> {
        crate::load_env();

        let config_path = std::env::var("IKIGAI_CONFIG")
            .unwrap_or_else(|_| "ikigai_pathway.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Env-first: environment variables win over the TOML file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.storage.supabase_url = url;
            // A Supabase URL without an explicit backend means the caller wants it used
            if std::env::var("IKIGAI_STORE").is_err() {
                self.storage.backend = "supabase".to_string();
            }
            tracing::debug!("SUPABASE_URL env override applied");
        }
        if let Ok(store) = std::env::var("IKIGAI_STORE") {
            self.storage.backend = store.trim().to_ascii_lowercase();
        }
        if let Ok(provider) = std::env::var("IKIGAI_AI_PROVIDER") {
            self.ai.provider = provider.trim().to_ascii_lowercase();
        }
        if let Some(model) = std::env::var("IKIGAI_AI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
        {
            self.ai.model = Some(model);
        }
        if let Some(size) = std::env::var("IKIGAI_CHART_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            self.chart.size_px = size;
        }
        if let Some(retries) = std::env::var("IKIGAI_AI_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            self.ai.max_retries = retries;
        }
        if let Some(timeout) = std::env::var("IKIGAI_AI_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.ai.timeout_ms = timeout;
        }
    }

    /// Clamp soft limits and reject settings the service cannot start with
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if !(MIN_SIZE_PX..=MAX_SIZE_PX).contains(&self.chart.size_px) {
            anyhow::bail!(
                "chart.size_px must be between {} and {}, got {}",
                MIN_SIZE_PX,
                MAX_SIZE_PX,
                self.chart.size_px
            );
        }
        self.chart.color_scheme.resolve()?;

        if self.ai.max_retries == 0 {
            self.ai.max_retries = 1;
        } else if self.ai.max_retries > 5 {
            tracing::warn!(
                "ai.max_retries {} exceeds max 5, clamping to 5",
                self.ai.max_retries
            );
            self.ai.max_retries = 5;
        }

        match self.ai.provider.as_str() {
            "groq" | "gemini" | "none" | "auto" => {}
            other => anyhow::bail!(
                "ai.provider must be one of groq, gemini, none, auto; got '{}'",
                other
            ),
        }

        match self.storage.backend.as_str() {
            "memory" => {}
            "supabase" => {
                if self.storage.supabase_url.trim().is_empty() {
                    anyhow::bail!("storage.backend=supabase but SUPABASE_URL is not set");
                }
                if self
                    .runtime
                    .supabase_key
                    .as_deref()
                    .is_none_or(|k| k.trim().is_empty())
                {
                    anyhow::bail!("storage.backend=supabase but SUPABASE_KEY is not set");
                }
                if !self.storage.supabase_url.starts_with("https://")
                    && !self.storage.supabase_url.starts_with("http://")
                {
                    tracing::warn!(
                        "Supabase URL '{}' doesn't start with http:// or https://",
                        self.storage.supabase_url
                    );
                }
            }
            other => anyhow::bail!("storage.backend must be memory or supabase; got '{}'", other),
        }

        Ok(())
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut cfg = Self {
            supabase_key: std::env::var("SUPABASE_KEY").ok(),
            groq_api_key: std::env::var("GROQ_API_KEY").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
            bearer_token: std::env::var("IKIGAI_BEARER_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            http_request_timeout_ms: std::env::var("IKIGAI_HTTP_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            ..Self::default()
        };

        if let Ok(v) = std::env::var("IKIGAI_HTTP_BIND") {
            match v.parse::<std::net::SocketAddr>() {
                Ok(bind) => cfg.http_bind = bind,
                Err(_) => tracing::warn!("Ignoring invalid IKIGAI_HTTP_BIND '{}'", v),
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: &[&str] = &[
        "SUPABASE_URL",
        "SUPABASE_KEY",
        "IKIGAI_STORE",
        "IKIGAI_AI_PROVIDER",
        "IKIGAI_AI_MODEL",
        "IKIGAI_CHART_SIZE",
        "IKIGAI_AI_RETRIES",
        "IKIGAI_AI_TIMEOUT_MS",
        "IKIGAI_HTTP_BIND",
        "IKIGAI_BEARER_TOKEN",
        "IKIGAI_CONFIG",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn toml_sections_are_optional() {
        let config = Config::from_toml_str("[chart]\nsize_px = 600\n").unwrap();
        assert_eq!(config.chart.size_px, 600);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.ai.provider, "auto");
        assert_eq!(config.chart.color_scheme.love, "#F6CECE");
    }

    #[test]
    fn partial_palette_in_toml_keeps_defaults() {
        let config =
            Config::from_toml_str("[chart.color_scheme]\nlove = \"#ff0000\"\n").unwrap();
        assert_eq!(config.chart.color_scheme.love, "#ff0000");
        assert_eq!(config.chart.color_scheme.background, "#F9F5F0");
    }

    #[test]
    #[serial]
    fn env_overrides_win_over_file() {
        clear_env();
        unsafe {
            std::env::set_var("IKIGAI_CHART_SIZE", "1200");
            std::env::set_var("IKIGAI_AI_PROVIDER", "Gemini");
            std::env::set_var("IKIGAI_AI_RETRIES", "9");
        }
        let mut config = Config::from_toml_str("[chart]\nsize_px = 600\n").unwrap();
        config.apply_env_overrides();
        config.validate().unwrap();
        assert_eq!(config.chart.size_px, 1200);
        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.ai.max_retries, 5);
        clear_env();
    }

    #[test]
    #[serial]
    fn supabase_backend_requires_credentials() {
        clear_env();
        unsafe { std::env::set_var("SUPABASE_URL", "https://example.supabase.co") };
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.storage.backend, "supabase");
        config.runtime = RuntimeConfig::load_from_env();
        assert!(config.validate().is_err());

        unsafe { std::env::set_var("SUPABASE_KEY", "anon-key") };
        config.runtime = RuntimeConfig::load_from_env();
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    fn rejects_out_of_range_chart_size() {
        let mut config = Config::default();
        config.chart.size_px = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn runtime_ignores_bad_bind_address() {
        clear_env();
        unsafe {
            std::env::set_var("IKIGAI_HTTP_BIND", "not-an-address");
            std::env::set_var("IKIGAI_BEARER_TOKEN", "  ");
        }
        let runtime = RuntimeConfig::load_from_env();
        assert_eq!(runtime.http_bind, RuntimeConfig::default().http_bind);
        assert!(runtime.bearer_token.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn load_reads_file_named_by_env() {
        use std::io::Write;

        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chart]\nsize_px = 700\n\n[ai]\nprovider = \"none\"").unwrap();
        unsafe { std::env::set_var("IKIGAI_CONFIG", file.path()) };

        let config = Config::load().unwrap();
        assert_eq!(config.chart.size_px, 700);
        assert_eq!(config.ai.provider, "none");
        assert_eq!(config.storage.backend, "memory");
        clear_env();
    }
}
