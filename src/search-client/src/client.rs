use common::DocumentRecord;
use reqwest::StatusCode;

use crate::SearchError;
use crate::types::{IndexBatch, SearchRequest, SearchResponse};

/// HTTP client for a single index of the search service
pub struct SearchClient {
    base_url: String,
    index_name: String,
    api_key: String,
    api_version: String,
    http: reqwest::Client,
}

impl SearchClient {
    /// Create a new client for `index_name` on the service at `base_url`
    pub fn new(base_url: &str, index_name: &str, api_key: &str, api_version: &str) -> Self {
        Self::new_with_client(
            base_url,
            index_name,
            api_key,
            api_version,
            reqwest::Client::new(),
        )
    }

    /// Create a client from a pre-configured reqwest client
    pub fn new_with_client(
        base_url: &str,
        index_name: &str,
        api_key: &str,
        api_version: &str,
        http: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            index_name: index_name.to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
            http,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn docs_url(&self, operation: &str) -> String {
        format!(
            "{}/indexes/{}/docs/{operation}?api-version={}",
            self.base_url, self.index_name, self.api_version
        )
    }

    /// Fetch every document the service returns for a wildcard query,
    /// projecting `id` and `content`. No paging is attempted.
    pub async fn search_all(&self) -> Result<Vec<DocumentRecord>, SearchError> {
        let url = self.docs_url("search");
        log::debug!("Searching index '{}' at {url}", self.index_name);

        let resp = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&SearchRequest::all_documents())
            .send()
            .await?;

        let response: SearchResponse = handle_response(resp).await?;
        Ok(response.value.into_iter().map(DocumentRecord::from).collect())
    }

    /// Send a single index batch deleting `ids`. Returns the number of delete
    /// actions sent. Per-document results in the response are not inspected.
    pub async fn delete_documents(&self, ids: &[String]) -> Result<usize, SearchError> {
        let url = self.docs_url("index");
        let batch = IndexBatch::delete(ids.iter().cloned());
        log::debug!(
            "Sending delete batch of {} action(s) to index '{}'",
            batch.len(),
            self.index_name
        );

        let resp = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&batch)
            .send()
            .await?;

        ensure_ok(resp).await?;
        Ok(batch.len())
    }
}

async fn ensure_ok(resp: reqwest::Response) -> Result<String, SearchError> {
    let status = resp.status();

    // 207 Multi-Status means some actions failed; treat it like any other
    // non-OK answer
    if status == StatusCode::OK {
        Ok(resp.text().await?)
    } else {
        let message = resp.text().await.unwrap_or_default();
        Err(SearchError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, SearchError> {
    let body = ensure_ok(resp).await?;
    Ok(serde_json::from_str(&body)?)
}
