//! Store client and pagination
//!
//! `fetch_all` walks a collection in fixed-size pages until a short page
//! signals the end. A failed page aborts the whole fetch: downstream
//! hierarchy resolution assumes the collection is complete, so a partial
//! result is worse than no result. There are no retries.

use async_trait::async_trait;
use common::{Error, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StoreConfig;

/// Default number of rows per ranged query
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One page of one collection. Implementations must return rows in a
/// stable order so that successive offsets never overlap.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_page(&self, collection: &str, offset: usize, limit: usize)
        -> Result<Vec<Value>>;
}

/// Fetch an entire collection via fixed-size range pagination.
///
/// Terminates when a page comes back shorter than `page_size`. Any page
/// failure fails the whole fetch.
pub async fn fetch_all(
    store: &dyn Store,
    collection: &str,
    page_size: usize,
) -> Result<Vec<Value>> {
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        let page = match store.fetch_page(collection, offset, page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!(collection, offset, "page fetch failed: {}", e);
                return Err(Error::Store(format!(
                    "failed to fetch '{}' at offset {}: {}",
                    collection, offset, e
                )));
            }
        };

        let count = page.len();
        all.extend(page);

        if count < page_size {
            break;
        }
        offset += page_size;
    }

    debug!(collection, rows = all.len(), "collection fetched");
    Ok(all)
}

/// PostgREST-style HTTP store
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Create a client from config. Fails if the URL or key is missing.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let base_url = config
            .url
            .clone()
            .ok_or_else(|| Error::Setup("store config is missing 'url'".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Setup("store config is missing 'api_key'".to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Store for RestStore {
    async fn fetch_page(
        &self,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/rest/v1/{}", self.base_url, collection);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("select", "*".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::Store(format!("request to '{}' failed: {}", collection, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!(
                "'{}' returned HTTP {}",
                collection, status
            )));
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| Error::Store(format!("invalid response body from '{}': {}", collection, e)))
    }
}
