pub mod gemini;
pub mod groq;
pub mod retry;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{AiConfig, RuntimeConfig};

pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use traits::{CompletionRequest, LlmError, TextGenerator};

/// Keys copied from templates should behave like missing keys
fn is_placeholder(key: &str) -> bool {
    let t = key.trim();
    t.is_empty()
        || t.contains("${")
        || t.eq_ignore_ascii_case("your-api-key-here")
        || t.eq_ignore_ascii_case("changeme")
}

fn usable_key(key: Option<&String>) -> Option<&str> {
    key.map(String::as_str).filter(|k| !is_placeholder(k))
}

/// Build the configured text generator.
///
/// Selection order:
/// 1) `ai.provider` when it names groq or gemini
/// 2) `none` disables generation
/// 3) `auto` prefers Groq, then Gemini, by available key
///
/// `None` means the enrich layer answers from its fallback lists.
pub fn create_generator(
    ai: &AiConfig,
    runtime: &RuntimeConfig,
) -> Option<Arc<dyn TextGenerator>> {
    let groq_key = usable_key(runtime.groq_api_key.as_ref());
    let gemini_key = usable_key(runtime.gemini_api_key.as_ref());

    let choice = match ai.provider.as_str() {
        "none" => {
            info!("AI provider disabled, using fallback suggestions and tips");
            return None;
        }
        "groq" => groq_key.map(|k| ("groq", k)),
        "gemini" => gemini_key.map(|k| ("gemini", k)),
        _ => groq_key
            .map(|k| ("groq", k))
            .or_else(|| gemini_key.map(|k| ("gemini", k))),
    };

    let Some((provider, key)) = choice else {
        warn!(
            "No API key available for AI provider '{}', using fallback suggestions and tips",
            ai.provider
        );
        return None;
    };

    let timeout = Duration::from_millis(ai.timeout_ms);
    let built: Result<Arc<dyn TextGenerator>, LlmError> = match provider {
        "groq" => GroqClient::new(key, timeout).map(|client| {
            let mut client = client
                .with_base_url(&ai.groq_base_url)
                .with_attempts(ai.max_retries);
            if let Some(model) = &ai.model {
                client = client.with_model(model);
            }
            Arc::new(client) as Arc<dyn TextGenerator>
        }),
        _ => GeminiClient::new(key, timeout).map(|client| {
            let mut client = client
                .with_base_url(&ai.gemini_base_url)
                .with_attempts(ai.max_retries);
            if let Some(model) = &ai.model {
                client = client.with_model(model);
            }
            Arc::new(client) as Arc<dyn TextGenerator>
        }),
    };

    match built {
        Ok(generator) => {
            info!(
                "Using {} for suggestions and tips (model override: {:?})",
                provider, ai.model
            );
            Some(generator)
        }
        Err(e) => {
            warn!("Failed to initialize {} client: {}", provider, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(groq: Option<&str>, gemini: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            groq_api_key: groq.map(str::to_string),
            gemini_api_key: gemini.map(str::to_string),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn auto_prefers_groq() {
        let ai = AiConfig::default();
        let generator = create_generator(&ai, &runtime(Some("gsk"), Some("gm"))).unwrap();
        assert_eq!(generator.name(), "groq");
    }

    #[test]
    fn auto_falls_through_placeholder_keys() {
        let ai = AiConfig::default();
        let generator =
            create_generator(&ai, &runtime(Some("${GROQ_API_KEY}"), Some("real"))).unwrap();
        assert_eq!(generator.name(), "gemini");
    }

    #[test]
    fn explicit_provider_without_key_is_disabled() {
        let ai = AiConfig {
            provider: "gemini".into(),
            ..AiConfig::default()
        };
        assert!(create_generator(&ai, &runtime(Some("gsk"), None)).is_none());
    }

    #[test]
    fn none_disables_generation() {
        let ai = AiConfig {
            provider: "none".into(),
            ..AiConfig::default()
        };
        assert!(create_generator(&ai, &runtime(Some("gsk"), Some("gm"))).is_none());
    }
}
