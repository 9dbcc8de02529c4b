//! Supabase PostgREST table client.

use crate::tables::{Filter, Row, TableStore};
use crate::{SocialError, SocialResult};
use async_trait::async_trait;
use loop_storage::{KeyValueStore, StorageKeys};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// [`TableStore`] over the Supabase REST API.
///
/// Requests carry the signed-in actor's access token when one is stored, so
/// row-level security sees the right user; otherwise the anon key is used.
#[derive(Clone)]
pub struct SupabaseTables {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
    tokens: Arc<dyn KeyValueStore>,
}

impl SupabaseTables {
    /// Create a new table client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `anon_key` - The Supabase anonymous API key
    /// * `tokens` - Store holding the access token written by the auth provider
    pub fn new(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        tokens: Arc<dyn KeyValueStore>,
    ) -> SocialResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            tokens,
        })
    }

    /// Build the REST API URL for a table with a filter.
    fn rest_url(&self, table: &str, filter: &Filter) -> String {
        let query = filter.to_query();
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.api_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.api_url, table, query)
        }
    }

    fn bearer(&self) -> SocialResult<String> {
        let token = self
            .tokens
            .get(StorageKeys::SUPABASE_ACCESS_TOKEN)?
            .unwrap_or_else(|| self.anon_key.clone());
        Ok(format!("Bearer {}", token))
    }

    /// Check HTTP response for errors.
    async fn check_response(&self, response: reqwest::Response) -> SocialResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Supabase request failed: {} - {}", status, body);
            return Err(SocialError::Supabase {
                status,
                message: body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl TableStore for SupabaseTables {
    async fn select(&self, table: &str, filter: &Filter) -> SocialResult<Vec<Row>> {
        let url = self.rest_url(table, filter);
        debug!(url = %url, "Selecting rows");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer()?)
            .send()
            .await?;

        let rows: Vec<Row> = self.check_response(response).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> SocialResult<Vec<Row>> {
        let url = self.rest_url(table, &Filter::new());
        debug!(url = %url, rows = rows.len(), "Inserting rows");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer()?)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;

        let inserted: Vec<Row> = self.check_response(response).await?.json().await?;
        Ok(inserted)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> SocialResult<()> {
        if filter.is_unfiltered() {
            return Err(SocialError::Config(format!(
                "refusing unfiltered delete on {}",
                table
            )));
        }
        let url = self.rest_url(table, filter);
        debug!(url = %url, "Deleting rows");

        let response = self
            .http_client
            .delete(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer()?)
            .send()
            .await?;

        self.check_response(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SupabaseTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseTables")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loop_storage::MemoryStore;

    fn client() -> (Arc<MemoryStore>, SupabaseTables) {
        let store = Arc::new(MemoryStore::new());
        let client =
            SupabaseTables::new("https://test.supabase.co/", "test-key", store.clone()).unwrap();
        (store, client)
    }

    #[test]
    fn test_rest_url() {
        let (_, client) = client();
        assert_eq!(
            client.rest_url("groups", &Filter::new()),
            "https://test.supabase.co/rest/v1/groups"
        );
        assert_eq!(
            client.rest_url("group_members", &Filter::new().eq("user_id", "u1")),
            "https://test.supabase.co/rest/v1/group_members?user_id=eq.u1"
        );
    }

    #[test]
    fn test_bearer_prefers_access_token() {
        let (store, client) = client();
        assert_eq!(client.bearer().unwrap(), "Bearer test-key");

        store
            .set(StorageKeys::SUPABASE_ACCESS_TOKEN, "user-jwt")
            .unwrap();
        assert_eq!(client.bearer().unwrap(), "Bearer user-jwt");
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused_before_request() {
        let (_, client) = client();
        assert!(matches!(
            client.delete("posts", &Filter::new()).await,
            Err(SocialError::Config(_))
        ));
    }
}
