//! Optional AI enrichment of responses.
//!
//! Both operations always produce a value. When no generator is configured,
//! or the provider fails, the fixed fallback lists are returned together
//! with the reason, so callers never branch on errors to get there.

pub mod fallback;
pub mod parse;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::clients::TextGenerator;
use crate::pillar::{Pillar, PillarResponses};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    Unavailable(String),
    EmptyResponse,
    UnknownPillar(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NotConfigured => f.write_str("no AI provider configured"),
            FallbackReason::Unavailable(e) => write!(f, "AI provider unavailable: {}", e),
            FallbackReason::EmptyResponse => f.write_str("AI provider returned nothing usable"),
            FallbackReason::UnknownPillar(key) => write!(f, "unknown pillar '{}'", key),
        }
    }
}

/// Result of an enrichment call: generated text or the static fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment<T> {
    Generated { value: T, provider: String },
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Enrichment<T> {
    pub fn value(&self) -> &T {
        match self {
            Enrichment::Generated { value, .. } | Enrichment::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Enrichment::Generated { value, .. } | Enrichment::Fallback { value, .. } => value,
        }
    }

    /// Provider name, or "fallback"
    pub fn source(&self) -> &str {
        match self {
            Enrichment::Generated { provider, .. } => provider,
            Enrichment::Fallback { .. } => "fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Enrichment::Fallback { .. })
    }
}

#[derive(Clone, Default)]
pub struct Enricher {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl fmt::Debug for Enricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enricher")
            .field("provider", &self.provider())
            .finish()
    }
}

impl Enricher {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Enricher that always answers from the fallback lists
    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn provider(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    /// Up to five short phrases that help the user expand on `text`
    pub async fn suggest(&self, text: &str, pillar: Pillar) -> Enrichment<Vec<String>> {
        let Some(generator) = &self.generator else {
            return Enrichment::Fallback {
                value: fallback::suggestions(pillar),
                reason: FallbackReason::NotConfigured,
            };
        };

        let request = prompts::suggestion_request(text, pillar);
        match generator.complete(&request).await {
            Ok(raw) => {
                let suggestions = parse::parse_suggestions(&raw);
                if suggestions.is_empty() {
                    debug!("Provider {} returned no usable suggestions", generator.name());
                    return Enrichment::Fallback {
                        value: fallback::suggestions(pillar),
                        reason: FallbackReason::EmptyResponse,
                    };
                }
                Enrichment::Generated {
                    value: suggestions,
                    provider: generator.name().to_string(),
                }
            }
            Err(e) => {
                warn!("Suggestion request failed for {}: {}", pillar, e);
                Enrichment::Fallback {
                    value: fallback::suggestions(pillar),
                    reason: FallbackReason::Unavailable(e.to_string()),
                }
            }
        }
    }

    /// Suggestions for a raw pillar key; unrecognized keys get a single hint
    pub async fn suggest_for_key(&self, text: &str, key: &str) -> Enrichment<Vec<String>> {
        match key.parse::<Pillar>() {
            Ok(pillar) => self.suggest(text, pillar).await,
            Err(_) => {
                debug!("Suggestions requested for unknown pillar '{}'", key);
                Enrichment::Fallback {
                    value: fallback::unknown_pillar_suggestions(),
                    reason: FallbackReason::UnknownPillar(key.to_string()),
                }
            }
        }
    }

    /// Five to seven workplace growth tips derived from all responses
    pub async fn tips(&self, responses: &PillarResponses) -> Enrichment<Vec<String>> {
        let Some(generator) = &self.generator else {
            return Enrichment::Fallback {
                value: fallback::tips(),
                reason: FallbackReason::NotConfigured,
            };
        };

        let request = prompts::tips_request(responses);
        match generator.complete(&request).await {
            Ok(raw) => {
                let tips = parse::parse_tips(&raw);
                if tips.is_empty() {
                    debug!("Provider {} returned no numbered tips", generator.name());
                    return Enrichment::Fallback {
                        value: fallback::tips(),
                        reason: FallbackReason::EmptyResponse,
                    };
                }
                Enrichment::Generated {
                    value: tips,
                    provider: generator.name().to_string(),
                }
            }
            Err(e) => {
                warn!("Tips request failed: {}", e);
                Enrichment::Fallback {
                    value: fallback::tips(),
                    reason: FallbackReason::Unavailable(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{CompletionRequest, LlmError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies and records the prompts it saw
    struct ScriptedGenerator {
        reply: std::result::Result<String, u16>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGenerator {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Http {
                    status: *status,
                    body: "boom".into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn without_generator_returns_fixed_lists() {
        let enricher = Enricher::disabled();
        let result = enricher.suggest("music", Pillar::GoodAt).await;
        assert_eq!(result.source(), "fallback");
        assert_eq!(result.value()[0], "Problem solving");
        assert_eq!(enricher.tips(&PillarResponses::new()).await.value().len(), 7);
    }

    #[tokio::test]
    async fn generated_suggestions_are_parsed() {
        let generator = ScriptedGenerator::ok("<think>hmm</think>Songwriting, Choir, Music theory");
        let enricher = Enricher::new(Some(generator.clone() as Arc<dyn TextGenerator>));
        let result = enricher.suggest("music", Pillar::Love).await;
        assert_eq!(result.source(), "scripted");
        assert_eq!(
            result.into_value(),
            vec!["Songwriting", "Choir", "Music theory"]
        );
        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].prompt.contains("'music'"));
    }

    #[tokio::test]
    async fn provider_failure_falls_back_with_reason() {
        let enricher = Enricher::new(Some(ScriptedGenerator::failing(401) as Arc<dyn TextGenerator>));
        let result = enricher.tips(&PillarResponses::new()).await;
        match result {
            Enrichment::Fallback { value, reason } => {
                assert_eq!(value, fallback::tips());
                assert!(matches!(reason, FallbackReason::Unavailable(_)));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unnumbered_tips_count_as_empty() {
        let enricher = Enricher::new(Some(ScriptedGenerator::ok("Just be yourself.") as Arc<dyn TextGenerator>));
        let result = enricher.tips(&PillarResponses::new()).await;
        assert!(matches!(
            result,
            Enrichment::Fallback {
                reason: FallbackReason::EmptyResponse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_key_gets_hint() {
        let enricher = Enricher::new(Some(ScriptedGenerator::ok("a, b") as Arc<dyn TextGenerator>));
        let result = enricher.suggest_for_key("x", "hobbies").await;
        assert_eq!(result.value(), &vec!["Enter more details".to_string()]);
        assert!(matches!(
            result,
            Enrichment::Fallback {
                reason: FallbackReason::UnknownPillar(ref key),
                ..
            } if key == "hobbies"
        ));
    }
}
