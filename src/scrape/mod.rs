//! Listing page retrieval.
//!
//! `ListingProvider` is the seam between the reconciler and the web:
//! the production implementation fetches the configured listing URL
//! over HTTP and extracts records with CSS selectors, tests substitute
//! a canned provider.

pub mod parser;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::{Page, Selectors};
use crate::error::FetchError;
use parser::CompiledSelectors;

/// Fallback name when the name element is missing from a product block.
pub const NAME_PLACEHOLDER: &str = "Name not found";

/// Fallback price when no price element is found. A record carrying
/// this value never fires a price-change event.
pub const PRICE_PLACEHOLDER: &str = "Price not found";

/// One product as observed on the listing page. The link doubles as
/// the product's identity; the price is kept as display text and
/// compared by string equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub link: String,
    pub name: String,
    pub price: String,
}

#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Fetch the listing page and return the products found on it, in
    /// page order. An empty vec means no product containers at all.
    async fn fetch_listing(&self) -> Result<Vec<ProductRecord>, FetchError>;
}

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the listing page over HTTP and parses it with the
/// configured selectors.
pub struct HttpListingProvider {
    client: Client,
    listing_url: Url,
    base_url: Url,
    selectors: CompiledSelectors,
}

impl HttpListingProvider {
    pub fn new(page: &Page, selectors: &Selectors) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;

        // selectors were validated at config load, compiling again here
        // keeps the provider usable without a Config in tests
        let selectors =
            CompiledSelectors::compile(selectors).map_err(|_| FetchError::Selectors)?;

        Ok(HttpListingProvider {
            client,
            listing_url: page.listing_url.clone(),
            base_url: page.base_url.clone(),
            selectors,
        })
    }
}

#[async_trait]
impl ListingProvider for HttpListingProvider {
    async fn fetch_listing(&self) -> Result<Vec<ProductRecord>, FetchError> {
        let url = self.listing_url.as_str();
        debug!(url, "fetching listing page");

        let response = self
            .client
            .get(self.listing_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        Ok(parser::parse_listing(&body, &self.base_url, &self.selectors))
    }
}
