//! PostgREST (Supabase) backed store

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{IkigaiError, Result};
use crate::pillar::Pillar;
use crate::storage::{
    ChartRecord, NewResponse, Profile, ProfileUpdate, ResponseRecord, ResponseStore,
    step_question_id,
};

/// Connection settings for the Supabase REST endpoint
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub base_url: String,
    pub api_key: String,
    pub responses_table: String,
    pub charts_table: String,
    pub profiles_table: String,
    pub timeout_ms: u64,
}

impl SupabaseConfig {
    /// Create from a Config object
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let api_key = config
            .runtime
            .supabase_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IkigaiError::Config {
                message: "SUPABASE_KEY is not set".to_string(),
            })?;
        let host = config.storage.supabase_url.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(IkigaiError::Config {
                message: "SUPABASE_URL is not set".to_string(),
            });
        }
        let base_url = if host.starts_with("http") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            base_url,
            api_key,
            responses_table: config.storage.responses_table.clone(),
            charts_table: config.storage.charts_table.clone(),
            profiles_table: config.storage.profiles_table.clone(),
            timeout_ms: config.storage.timeout_ms,
        })
    }

    /// Build the REST endpoint URL for a table
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    pub fn user_agent(&self) -> String {
        format!("ikigai-pathway/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn build_client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .user_agent(self.user_agent())
            .build()
    }
}

pub struct SupabaseStore {
    client: Client,
    config: SupabaseConfig,
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
    }

    /// Same as [`Self::request`] but asks PostgREST to echo the affected rows
    fn returning(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", "return=representation")
    }

    async fn rows<T: DeserializeOwned>(&self, context: &str, resp: Response) -> Result<Vec<T>> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IkigaiError::Storage {
                message: format!("{} failed with HTTP {}: {}", context, status.as_u16(), body),
            });
        }
        let rows: Vec<T> = resp.json().await.map_err(|e| IkigaiError::Storage {
            message: format!("{} returned unexpected body: {}", context, e),
        })?;
        debug!("{} -> {} row(s)", context, rows.len());
        Ok(rows)
    }

    async fn first_row<T: DeserializeOwned>(&self, context: &str, resp: Response) -> Result<T> {
        self.rows(context, resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IkigaiError::Storage {
                message: format!("{} returned no rows", context),
            })
    }

    async fn find_answer(&self, answer: &NewResponse) -> Result<Option<ResponseRecord>> {
        let table = &self.config.responses_table;
        let resp = self
            .request(Method::GET, table)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(&answer.user_id)),
                ("pillar", eq(answer.pillar.key())),
                ("question_id", eq(&answer.question_id)),
            ])
            .send()
            .await?;
        Ok(self
            .rows::<ResponseRecord>("select response", resp)
            .await?
            .into_iter()
            .next())
    }
}

#[async_trait]
impl ResponseStore for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn save_answer(&self, answer: NewResponse) -> Result<ResponseRecord> {
        answer.validate()?;
        let table = &self.config.responses_table;
        let resp = match self.find_answer(&answer).await? {
            Some(existing) => {
                self.returning(Method::PATCH, table)
                    .query(&[("id", eq(&existing.id))])
                    .json(&json!({ "response": answer.response }))
                    .send()
                    .await?
            }
            None => {
                self.returning(Method::POST, table)
                    .json(&json!({
                        "user_id": answer.user_id,
                        "pillar": answer.pillar.key(),
                        "question_id": answer.question_id,
                        "response": answer.response,
                    }))
                    .send()
                    .await?
            }
        };
        self.first_row("save response", resp).await
    }

    async fn list_responses(
        &self,
        user_id: &str,
        pillar: Option<Pillar>,
    ) -> Result<Vec<ResponseRecord>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.asc,question_id.asc".to_string()),
        ];
        if let Some(p) = pillar {
            query.push(("pillar", eq(p.key())));
        }
        let resp = self
            .request(Method::GET, &self.config.responses_table)
            .query(&query)
            .send()
            .await?;
        self.rows("list responses", resp).await
    }

    async fn replace_pillar(
        &self,
        user_id: &str,
        pillar: Pillar,
        answers: &[String],
    ) -> Result<Vec<ResponseRecord>> {
        let table = &self.config.responses_table;
        let resp = self
            .request(Method::DELETE, table)
            .query(&[("user_id", eq(user_id)), ("pillar", eq(pillar.key()))])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IkigaiError::Storage {
                message: format!("clear pillar failed with HTTP {}: {}", status.as_u16(), body),
            });
        }

        let rows: Vec<Value> = answers
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .enumerate()
            .map(|(i, a)| {
                json!({
                    "user_id": user_id,
                    "pillar": pillar.key(),
                    "question_id": step_question_id(pillar, i),
                    "response": a,
                })
            })
            .collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .returning(Method::POST, table)
            .json(&rows)
            .send()
            .await?;
        self.rows("insert step answers", resp).await
    }

    async fn delete_response(&self, id: &str) -> Result<()> {
        let resp = self
            .returning(Method::DELETE, &self.config.responses_table)
            .query(&[("id", eq(id))])
            .send()
            .await?;
        let deleted: Vec<Value> = self.rows("delete response", resp).await?;
        if deleted.is_empty() {
            return Err(IkigaiError::not_found(format!("response {}", id)));
        }
        Ok(())
    }

    async fn clear_responses(&self, user_id: &str) -> Result<usize> {
        let resp = self
            .returning(Method::DELETE, &self.config.responses_table)
            .query(&[("user_id", eq(user_id))])
            .send()
            .await?;
        let deleted: Vec<Value> = self.rows("clear responses", resp).await?;
        Ok(deleted.len())
    }

    async fn save_chart(&self, user_id: &str, chart_data: Value) -> Result<ChartRecord> {
        let table = &self.config.charts_table;
        let existing = self.get_chart(user_id).await?;
        let resp = match existing {
            Some(chart) => {
                self.returning(Method::PATCH, table)
                    .query(&[("id", eq(&chart.id))])
                    .json(&json!({ "chart_data": chart_data }))
                    .send()
                    .await?
            }
            None => {
                self.returning(Method::POST, table)
                    .json(&json!({ "user_id": user_id, "chart_data": chart_data }))
                    .send()
                    .await?
            }
        };
        self.first_row("save chart", resp).await
    }

    async fn get_chart(&self, user_id: &str) -> Result<Option<ChartRecord>> {
        let resp = self
            .request(Method::GET, &self.config.charts_table)
            .query(&[("select", "*".to_string()), ("user_id", eq(user_id))])
            .send()
            .await?;
        Ok(self
            .rows::<ChartRecord>("select chart", resp)
            .await?
            .into_iter()
            .next())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let resp = self
            .request(Method::GET, &self.config.profiles_table)
            .query(&[("select", "*".to_string()), ("id", eq(user_id))])
            .send()
            .await?;
        self.rows::<Profile>("select profile", resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IkigaiError::not_found(format!("profile {}", user_id)))
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(IkigaiError::validation("No fields to update"));
        }
        let mut body = serde_json::Map::new();
        if let Some(username) = &update.username {
            body.insert("username".into(), json!(username));
        }
        if let Some(avatar_id) = &update.avatar_id {
            body.insert("avatar_id".into(), json!(avatar_id));
            body.insert("avatar_url".into(), json!(update.avatar_url()));
        }
        body.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));

        let resp = self
            .returning(Method::PATCH, &self.config.profiles_table)
            .query(&[("id", eq(user_id))])
            .json(&Value::Object(body))
            .send()
            .await?;
        self.rows::<Profile>("update profile", resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IkigaiError::not_found(format!("profile {}", user_id)))
    }
}
