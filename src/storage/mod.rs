//! Persistence of responses, charts and profiles.
//!
//! The service never owns durable state: [`SupabaseStore`] delegates to a
//! PostgREST table store, [`MemoryStore`] keeps everything in process for
//! development and tests.

pub mod memory;
pub mod supabase;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::chart::{ChartFormat, ColorScheme};
use crate::config::Config;
use crate::error::{IkigaiError, Result};
use crate::pillar::{Pillar, PillarResponses};

pub use memory::MemoryStore;
pub use supabase::{SupabaseConfig, SupabaseStore};

/// Question id used when a pillar is answered as a single free-text step
pub const DEFAULT_QUESTION_ID: &str = "main";

/// Several answers to one question are stored in one row, joined with this
pub const ANSWER_SEPARATOR: char = '|';

/// PostgREST returns ids as numbers or uuids depending on the table
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected id value: {}",
            other
        ))),
    }
}

/// One stored answer row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub user_id: String,
    /// Kept as text: rows written by other clients may carry keys we do not know
    pub pillar: String,
    pub question_id: String,
    pub response: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ResponseRecord {
    /// Individual answers, split on `|`, trimmed, blanks dropped
    pub fn answers(&self) -> impl Iterator<Item = &str> {
        self.response
            .split(ANSWER_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Answer to be upserted on (user_id, pillar, question_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResponse {
    pub user_id: String,
    pub pillar: Pillar,
    #[serde(default = "default_question_id")]
    pub question_id: String,
    pub response: String,
}

fn default_question_id() -> String {
    DEFAULT_QUESTION_ID.to_string()
}

impl NewResponse {
    pub fn new(user_id: impl Into<String>, pillar: Pillar, response: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            pillar,
            question_id: default_question_id(),
            response: response.into(),
        }
    }

    pub fn with_question(mut self, question_id: impl Into<String>) -> Self {
        self.question_id = question_id.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(IkigaiError::validation("user_id is required"));
        }
        if self.question_id.trim().is_empty() {
            return Err(IkigaiError::validation("question_id is required"));
        }
        Ok(())
    }
}

/// Stored chart row; `chart_data` is opaque to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub user_id: String,
    pub chart_data: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChartRecord {
    pub fn payload(&self) -> Result<ChartPayload> {
        Ok(serde_json::from_value(self.chart_data.clone())?)
    }
}

/// What the service writes into `chart_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub image_base64: String,
    pub format: ChartFormat,
    pub color_scheme: ColorScheme,
    pub responses: PillarResponses,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_id: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.avatar_id.is_none()
    }

    /// Avatar images ship with the frontend under a fixed path
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar_id
            .as_ref()
            .map(|id| format!("/images/avatar images/{}.jpg", id))
    }

    pub fn apply(&self, profile: &mut Profile, now: DateTime<Utc>) {
        if let Some(username) = &self.username {
            profile.username = Some(username.clone());
        }
        if let Some(avatar_id) = &self.avatar_id {
            profile.avatar_id = Some(avatar_id.clone());
            profile.avatar_url = self.avatar_url();
        }
        profile.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    pub all_completed: bool,
    pub completed_pillars: Vec<Pillar>,
    pub total_questions_answered: usize,
}

/// Oldest first, ties broken by question id
pub fn sort_records(records: &mut [ResponseRecord]) {
    records.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.question_id.cmp(&b.question_id))
    });
}

/// Group rows by pillar, splitting multi-answer rows; unknown pillars are skipped
pub fn group_records(records: &[ResponseRecord]) -> PillarResponses {
    let mut sorted = records.to_vec();
    sort_records(&mut sorted);

    let mut grouped = PillarResponses::new();
    for record in &sorted {
        match record.pillar.parse::<Pillar>() {
            Ok(pillar) => {
                for answer in record.answers() {
                    grouped.push(pillar, answer);
                }
            }
            Err(_) => debug!("Skipping stored response with unknown pillar '{}'", record.pillar),
        }
    }
    grouped
}

/// A pillar counts once it has any non-blank answer; questions are counted per pillar
pub fn completion_from(records: &[ResponseRecord]) -> CompletionStatus {
    let mut questions: BTreeMap<Pillar, BTreeSet<&str>> = BTreeMap::new();
    for record in records {
        let Ok(pillar) = record.pillar.parse::<Pillar>() else {
            continue;
        };
        if record.answers().next().is_none() {
            continue;
        }
        questions
            .entry(pillar)
            .or_default()
            .insert(record.question_id.as_str());
    }

    let completed_pillars: Vec<Pillar> = Pillar::ALL
        .into_iter()
        .filter(|p| questions.contains_key(p))
        .collect();
    CompletionStatus {
        all_completed: completed_pillars.len() == Pillar::ALL.len(),
        total_questions_answered: questions.values().map(BTreeSet::len).sum(),
        completed_pillars,
    }
}

/// Question ids used when a whole step is replaced
pub fn step_question_id(pillar: Pillar, index: usize) -> String {
    format!("{}_{}", pillar.key(), index + 1)
}

#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Backend name for logs and `/info`
    fn backend(&self) -> &'static str;

    /// Upsert on (user_id, pillar, question_id)
    async fn save_answer(&self, answer: NewResponse) -> Result<ResponseRecord>;

    /// Rows for a user, oldest first
    async fn list_responses(
        &self,
        user_id: &str,
        pillar: Option<Pillar>,
    ) -> Result<Vec<ResponseRecord>>;

    /// Replace every row of one pillar with one row per answer
    async fn replace_pillar(
        &self,
        user_id: &str,
        pillar: Pillar,
        answers: &[String],
    ) -> Result<Vec<ResponseRecord>>;

    async fn delete_response(&self, id: &str) -> Result<()>;

    /// Remove all of a user's rows; returns how many were removed
    async fn clear_responses(&self, user_id: &str) -> Result<usize>;

    /// Upsert on user_id
    async fn save_chart(&self, user_id: &str, chart_data: Value) -> Result<ChartRecord>;

    async fn get_chart(&self, user_id: &str) -> Result<Option<ChartRecord>>;

    async fn get_profile(&self, user_id: &str) -> Result<Profile>;

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile>;

    async fn get_responses(&self, user_id: &str) -> Result<PillarResponses> {
        let records = self.list_responses(user_id, None).await?;
        Ok(group_records(&records))
    }

    async fn save_response(
        &self,
        user_id: &str,
        pillar: Pillar,
        text: &str,
    ) -> Result<ResponseRecord> {
        self.save_answer(NewResponse::new(user_id, pillar, text))
            .await
    }

    async fn completion(&self, user_id: &str) -> Result<CompletionStatus> {
        let records = self.list_responses(user_id, None).await?;
        Ok(completion_from(&records))
    }
}

/// Build the store selected by `storage.backend`
pub fn create_store(config: &Config) -> Result<Arc<dyn ResponseStore>> {
    match config.storage.backend.as_str() {
        "supabase" => {
            let store = SupabaseStore::new(SupabaseConfig::from_config(config)?)?;
            tracing::info!("Using Supabase store at {}", config.storage.supabase_url);
            Ok(Arc::new(store))
        }
        "memory" => {
            tracing::info!("Using in-memory response store");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(IkigaiError::Config {
            message: format!("unknown storage backend '{}'", other),
        }),
    }
}
