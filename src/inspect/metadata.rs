//! Page title and favicon retrieval.
//!
//! A fallback for when the embedded web view has not reported its own title
//! and favicon. Fetches the page once and scrapes the capped markup.

use super::types::PageMetadata;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::shared::body::CappedText;
use crate::shared::markup::{extract_favicon_href, extract_title, resolve_favicon};
use crate::shared::page_url::PageTarget;

/// Fetches `page_url` and scrapes its title and favicon.
pub async fn fetch_metadata(
    page_url: &str,
    config: &FetchConfig,
) -> Result<PageMetadata, FetchError> {
    let target = PageTarget::parse(page_url)?;
    match target.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedProtocol(other.to_string())),
    }

    tracing::debug!(url = %target.url(), "Fetching metadata");

    let client = build_client(config)?;
    let response = client.get(target.url().clone()).send().await?;

    tracing::debug!(
        status = response.status().as_u16(),
        final_url = %response.url(),
        "Metadata response received"
    );

    let html = read_capped_text(response, config.max_body_chars).await?;
    Ok(scrape_metadata(&html, &target))
}

/// Builds a client for a single fetch. No pool is shared between calls, so
/// the connection goes away with the response.
fn build_client(config: &FetchConfig) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .no_proxy()
        .build()
        .map_err(|e| FetchError::transport(&e))
}

/// Streams the body as text, decoded per the declared charset, until it ends
/// or exceeds `limit` characters.
/// Dropping the response on the early exit aborts the transfer.
async fn read_capped_text(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<String, FetchError> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let mut body = CappedText::for_content_type(content_type.as_deref(), limit);
    while let Some(chunk) = response.chunk().await? {
        if body.push(&chunk) {
            tracing::debug!(limit, "Body exceeded limit, aborting transfer");
            break;
        }
    }
    drop(response);
    Ok(body.finish())
}

/// Scrapes title and favicon from (possibly truncated) markup.
///
/// The title falls back to the hostname; the favicon is resolved against the
/// requested page's origin, not a redirect target.
pub fn scrape_metadata(html: &str, target: &PageTarget) -> PageMetadata {
    let title = extract_title(html).unwrap_or_else(|| target.hostname().to_string());
    let favicon = extract_favicon_href(html)
        .map(|href| resolve_favicon(href, target))
        .unwrap_or_default();

    PageMetadata { title, favicon }
}
