use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{IkigaiError, Result};
use crate::pillar::Pillar;
use crate::storage::{
    ChartRecord, NewResponse, Profile, ProfileUpdate, ResponseRecord, ResponseStore,
    sort_records, step_question_id,
};

#[derive(Debug, Default)]
struct Tables {
    responses: Vec<ResponseRecord>,
    charts: HashMap<String, ChartRecord>,
    profiles: HashMap<String, Profile>,
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles are created by the auth provider, so tests seed them here
    pub async fn insert_profile(&self, profile: Profile) {
        let mut tables = self.tables.write().await;
        tables.profiles.insert(profile.id.clone(), profile);
    }
}

fn new_record(user_id: &str, pillar: Pillar, question_id: String, response: String) -> ResponseRecord {
    ResponseRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        pillar: pillar.key().to_string(),
        question_id,
        response,
        created_at: Some(Utc::now()),
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn save_answer(&self, answer: NewResponse) -> Result<ResponseRecord> {
        answer.validate()?;
        let mut tables = self.tables.write().await;
        let pillar_key = answer.pillar.key();
        if let Some(existing) = tables.responses.iter_mut().find(|r| {
            r.user_id == answer.user_id
                && r.pillar == pillar_key
                && r.question_id == answer.question_id
        }) {
            existing.response = answer.response;
            return Ok(existing.clone());
        }

        let record = new_record(
            &answer.user_id,
            answer.pillar,
            answer.question_id,
            answer.response,
        );
        tables.responses.push(record.clone());
        Ok(record)
    }

    async fn list_responses(
        &self,
        user_id: &str,
        pillar: Option<Pillar>,
    ) -> Result<Vec<ResponseRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<ResponseRecord> = tables
            .responses
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| pillar.is_none_or(|p| r.pillar == p.key()))
            .cloned()
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    async fn replace_pillar(
        &self,
        user_id: &str,
        pillar: Pillar,
        answers: &[String],
    ) -> Result<Vec<ResponseRecord>> {
        let mut tables = self.tables.write().await;
        tables
            .responses
            .retain(|r| !(r.user_id == user_id && r.pillar == pillar.key()));

        let records: Vec<ResponseRecord> = answers
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .enumerate()
            .map(|(i, a)| new_record(user_id, pillar, step_question_id(pillar, i), a.to_string()))
            .collect();
        tables.responses.extend(records.iter().cloned());
        Ok(records)
    }

    async fn delete_response(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.responses.len();
        tables.responses.retain(|r| r.id != id);
        if tables.responses.len() == before {
            return Err(IkigaiError::not_found(format!("response {}", id)));
        }
        Ok(())
    }

    async fn clear_responses(&self, user_id: &str) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.responses.len();
        tables.responses.retain(|r| r.user_id != user_id);
        Ok(before - tables.responses.len())
    }

    async fn save_chart(&self, user_id: &str, chart_data: Value) -> Result<ChartRecord> {
        let mut tables = self.tables.write().await;
        let record = tables
            .charts
            .entry(user_id.to_string())
            .and_modify(|c| c.chart_data = chart_data.clone())
            .or_insert_with(|| ChartRecord {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                chart_data,
                created_at: Some(Utc::now()),
            });
        Ok(record.clone())
    }

    async fn get_chart(&self, user_id: &str) -> Result<Option<ChartRecord>> {
        Ok(self.tables.read().await.charts.get(user_id).cloned())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.tables
            .read()
            .await
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| IkigaiError::not_found(format!("profile {}", user_id)))
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(IkigaiError::validation("No fields to update"));
        }
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| IkigaiError::not_found(format!("profile {}", user_id)))?;
        update.apply(profile, Utc::now());
        Ok(profile.clone())
    }
}
