//! Pure HTML-to-record extraction, no I/O.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::config::Selectors;
use crate::error::ConfigError;

use super::{ProductRecord, NAME_PLACEHOLDER, PRICE_PLACEHOLDER};

/// Selector set compiled from config strings. Compilation happens once
/// at startup so parse passes never deal with selector syntax errors.
pub struct CompiledSelectors {
    container: Selector,
    link: Selector,
    link_substring: String,
    name: Selector,
    price_sale: Selector,
    price_regular_wrap: Selector,
    price_regular: Selector,
}

impl CompiledSelectors {
    pub fn compile(raw: &Selectors) -> Result<Self, ConfigError> {
        Ok(CompiledSelectors {
            container: compile_one(&raw.container, "container")?,
            link: compile_one(&raw.link, "link")?,
            link_substring: raw.link_substring.clone(),
            name: compile_one(&raw.name, "name")?,
            price_sale: compile_one(&raw.price_sale, "price_sale")?,
            price_regular_wrap: compile_one(&raw.price_regular_wrap, "price_regular_wrap")?,
            price_regular: compile_one(&raw.price_regular, "price_regular")?,
        })
    }
}

fn compile_one(text: &str, field: &'static str) -> Result<Selector, ConfigError> {
    Selector::parse(text).map_err(|_| ConfigError::Selector { field })
}

/// Extract product records from a listing page, in page order.
///
/// A container without a product link is skipped entirely; a missing
/// name or price falls back to its placeholder string. Returns an
/// empty vec only when no product containers exist at all, which the
/// caller treats as a failed observation rather than an empty shop.
pub fn parse_listing(
    html: &str,
    base_url: &Url,
    selectors: &CompiledSelectors,
) -> Vec<ProductRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for container in document.select(&selectors.container) {
        let Some(link) = product_link(&container, selectors, base_url) else {
            continue;
        };

        let name = container
            .select(&selectors.name)
            .next()
            .map(element_text)
            .unwrap_or_else(|| NAME_PLACEHOLDER.to_string());

        let price = price_text(&container, selectors)
            .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string());

        records.push(ProductRecord { link, name, price });
    }

    records
}

fn product_link(
    container: &ElementRef,
    selectors: &CompiledSelectors,
    base_url: &Url,
) -> Option<String> {
    let href = container
        .select(&selectors.link)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(&selectors.link_substring))?;

    match base_url.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            warn!(href, error = %e, "skipping product with unjoinable href");
            None
        }
    }
}

/// Sale price wins; otherwise the regular price inside its wrapper.
fn price_text(container: &ElementRef, selectors: &CompiledSelectors) -> Option<String> {
    container
        .select(&selectors.price_sale)
        .next()
        .or_else(|| {
            container
                .select(&selectors.price_regular_wrap)
                .next()
                .and_then(|wrap| wrap.select(&selectors.price_regular).next())
        })
        .map(element_text)
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
