//! Store configuration

use serde::{Deserialize, Serialize};

/// Remote store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store (e.g. "https://xyz.supabase.co")
    pub url: Option<String>,

    /// API key; also used as the bearer token
    pub api_key: Option<String>,

    /// Page size for ranged queries
    pub page_size: Option<usize>,
}

impl StoreConfig {
    /// Create config for a remote store
    pub fn remote(url: String, api_key: String) -> Self {
        Self {
            url: Some(url),
            api_key: Some(api_key),
            page_size: None,
        }
    }

    /// Get the page size (defaults to [`crate::DEFAULT_PAGE_SIZE`])
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(crate::DEFAULT_PAGE_SIZE)
    }
}
