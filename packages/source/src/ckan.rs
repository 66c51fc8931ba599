//! Minimal CKAN `datastore_search` client.
//!
//! Handles the wrapped `{"success": ..., "result": {"records": [...]}}`
//! response envelope and offset-based pagination. Used for the
//! data.gov.il portal but carries no portal-specific assumptions.

use serde_json::Value;

use crate::SourceError;

/// Base `datastore_search` endpoint of the data.gov.il portal.
pub const DEFAULT_API_URL: &str = "https://data.gov.il/api/3/action/datastore_search";

/// Records per page. CKAN caps page sizes well above this; 10k keeps
/// individual responses small enough to parse without a streaming
/// decoder.
const PAGE_SIZE: u64 = 10_000;

/// One page of datastore records.
#[derive(Debug)]
pub struct Page {
    /// Raw record objects from the `records` array.
    pub records: Vec<Value>,
    /// Total record count reported by the datastore, when present.
    pub total: Option<u64>,
}

/// CKAN datastore client for a single portal.
#[derive(Debug, Clone)]
pub struct CkanClient {
    client: reqwest::Client,
    api_url: String,
}

impl CkanClient {
    /// Creates a client against the data.gov.il portal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }

    /// Creates a client against a custom `datastore_search` endpoint.
    #[must_use]
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    /// Fetches a single page of records for a resource.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the envelope is
    /// malformed.
    pub async fn fetch_page(
        &self,
        resource_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Page, SourceError> {
        let url = format!(
            "{}?resource_id={resource_id}&limit={limit}&offset={offset}",
            self.api_url
        );

        let response = self.client.get(&url).send().await?;
        let body: Value = response.json().await?;

        parse_envelope(&body)
    }

    /// Fetches every record of a resource with offset pagination.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if any page fetch fails.
    pub async fn fetch_all(&self, resource_id: &str) -> Result<Vec<Value>, SourceError> {
        let mut all_records: Vec<Value> = Vec::new();
        let mut offset: u64 = 0;

        loop {
            log::info!("Fetching datastore resource {resource_id}: offset={offset}");
            let page = self.fetch_page(resource_id, offset, PAGE_SIZE).await?;

            let count = page.records.len() as u64;
            all_records.extend(page.records);
            offset += count;

            if !should_continue(count, offset, page.total) {
                break;
            }
        }

        log::info!(
            "Downloaded {} records from resource {resource_id}",
            all_records.len()
        );

        Ok(all_records)
    }
}

impl Default for CkanClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides whether another page should be requested after one of
/// `count` records, with the cursor now at `offset`.
///
/// Pagination stops on an empty page, on a short page, or once the
/// cursor reaches the datastore's reported total.
const fn should_continue(count: u64, offset: u64, total: Option<u64>) -> bool {
    if count == 0 || count < PAGE_SIZE {
        return false;
    }
    match total {
        Some(total) => offset < total,
        None => true,
    }
}

/// Parses the CKAN response envelope into a [`Page`].
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] when the envelope reports
/// failure or the `records` array is missing.
pub fn parse_envelope(body: &Value) -> Result<Page, SourceError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(SourceError::Malformed {
            reason: "datastore_search reported success=false".to_string(),
        });
    }

    let result = body.get("result").ok_or_else(|| SourceError::Malformed {
        reason: "response envelope missing `result`".to_string(),
    })?;

    let records = result
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Malformed {
            reason: "response envelope missing `result.records`".to_string(),
        })?
        .clone();

    let total = result.get("total").and_then(Value::as_u64);

    Ok(Page { records, total })
}
