//! Hosted table storage over the PostgREST API.
//!
//! Requests go to `{project}/rest/v1/{table}` with the project's anon key in
//! the `apikey` header and the user's access token as bearer, so row-level
//! security sees the signed-in user.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, NewPitch, Pitch, PitchId, Session};
use crate::storage::PitchStore;
use crate::utils::http::{create_async_client, error_message};

/// Pitch store backed by a Supabase table.
pub struct SupabaseStore {
    client: Client,
    table_url: Url,
    anon_key: String,
    access_token: String,
}

impl SupabaseStore {
    /// Build a store for the signed-in session.
    pub fn new(config: &Config, session: &Session) -> Result<Self> {
        let url = config
            .backend
            .url
            .as_deref()
            .ok_or_else(|| AppError::config("backend.url is not set (SUPABASE_URL)"))?;
        let anon_key = config
            .backend
            .anon_key
            .as_deref()
            .ok_or_else(|| AppError::config("backend.anon_key is not set (SUPABASE_ANON_KEY)"))?;
        let client = create_async_client(config.backend.timeout_secs)?;
        Self::with_client(client, url, anon_key, &config.backend.table, session)
    }

    pub fn with_client(
        client: Client,
        project_url: &str,
        anon_key: &str,
        table: &str,
        session: &Session,
    ) -> Result<Self> {
        let table_url = Url::parse(&format!("{}/", project_url.trim_end_matches('/')))?
            .join("rest/v1/")?
            .join(table)?;
        Ok(Self {
            client,
            table_url,
            anon_key: anon_key.to_string(),
            access_token: session.access_token.clone(),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
    }

    fn url_with(&self, query: &[(&str, String)]) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::backend(status.as_u16(), error_message(&body)))
    }
}

#[async_trait]
impl PitchStore for SupabaseStore {
    async fn insert(&self, pitch: NewPitch) -> Result<Pitch> {
        let response = self
            .request(Method::POST, self.table_url.clone())
            .header("Prefer", "return=representation")
            .json(&pitch)
            .send()
            .await?;
        let mut rows: Vec<Pitch> = Self::check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(AppError::backend(200, "insert returned no rows"));
        }
        let row = rows.swap_remove(0);
        log::info!("Saved pitch {} ({})", row.id, row.title);
        Ok(row)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Pitch>> {
        let url = self.url_with(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = self.request(Method::GET, url).send().await?;
        let rows: Vec<Pitch> = Self::check(response).await?.json().await?;
        log::debug!("Fetched {} pitch(es) for user {}", rows.len(), user_id);
        Ok(rows)
    }

    async fn get(&self, user_id: &str, id: &PitchId) -> Result<Pitch> {
        let url = self.url_with(&[
            ("select", "*".to_string()),
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{user_id}")),
            ("limit", "1".to_string()),
        ]);
        let response = self.request(Method::GET, url).send().await?;
        let rows: Vec<Pitch> = Self::check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("pitch {id}")))
    }

    async fn delete(&self, user_id: &str, id: &PitchId) -> Result<()> {
        let url = self.url_with(&[
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{user_id}")),
        ]);
        let response = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        if deleted.is_empty() {
            return Err(AppError::NotFound(format!("pitch {id}")));
        }
        log::info!("Deleted pitch {}", id);
        Ok(())
    }
}
