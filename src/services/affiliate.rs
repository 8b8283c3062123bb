//! Amazon link enrichment: ASIN extraction, price-tracking and affiliate URLs.
//!
//! DESIGN
//! ======
//! Product pages carry the ASIN in one of a handful of path shapes. Short
//! links (`amzn.to`, `a.co`, ...) carry nothing, so the resolver follows
//! their redirects first. A URL without a recognizable ASIN passes through
//! unchanged with no price-tracking link.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use url::Url;

const KEEPA_SEARCH_PREFIX: &str = "https://keepa.com/#!search/1-";
const SHORT_LINK_HOSTS: &[&str] = &["amzn.to", "amzn.eu", "amzn.asia", "a.co"];
const RESOLVE_TIMEOUT_SECS: u64 = 10;
const ASIN_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum AffiliateError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("link resolution failed: {0}")]
    Request(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateLinks {
    /// Empty when no ASIN was found.
    pub keepa_url: String,
    pub affiliate_url: String,
}

// =============================================================================
// PURE HELPERS
// =============================================================================

fn host_of(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().map(str::to_ascii_lowercase)
}

fn is_short_link_host(host: &str) -> bool {
    SHORT_LINK_HOSTS.contains(&host)
}

/// `amazon.<tld>` or a subdomain of one, e.g. `www.amazon.co.uk`.
fn is_amazon_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    let Some(pos) = labels.iter().rposition(|l| *l == "amazon") else {
        return false;
    };
    let suffix = &labels[pos + 1..];
    matches!(suffix.len(), 1 | 2) && suffix.iter().all(|l| (2..=3).contains(&l.len()))
}

/// Whether `raw` points at an Amazon storefront or one of its short-link hosts.
#[must_use]
pub fn is_amazon_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| host_of(&u))
        .is_some_and(|h| is_amazon_host(&h) || is_short_link_host(&h))
}

fn as_asin(segment: &str) -> Option<String> {
    (segment.len() == ASIN_LEN && segment.bytes().all(|b| b.is_ascii_alphanumeric()))
        .then(|| segment.to_ascii_uppercase())
}

/// Pull the ASIN out of a product URL path.
#[must_use]
pub fn extract_asin(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    (0..segments.len()).find_map(|i| {
        let candidate = match &segments[i..] {
            ["dp", asin, ..]
            | ["gp", "product", asin, ..]
            | ["gp", "aw", "d", asin, ..]
            | ["exec", "obidos", "ASIN", asin, ..]
            | ["o", "ASIN", asin, ..] => *asin,
            _ => return None,
        };
        as_asin(candidate)
    })
}

/// Links for a product. Without an ASIN the input URL is passed through.
#[must_use]
pub fn links_for(asin: Option<&str>, original_url: &str, tag: Option<&str>) -> AffiliateLinks {
    match asin {
        Some(asin) => AffiliateLinks {
            keepa_url: format!("{KEEPA_SEARCH_PREFIX}{asin}"),
            affiliate_url: match tag {
                Some(tag) => format!("http://www.amazon.com/dp/{asin}/ref=nosim?tag={tag}"),
                None => format!("http://www.amazon.com/dp/{asin}"),
            },
        },
        None => AffiliateLinks { keepa_url: String::new(), affiliate_url: original_url.to_string() },
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Turns a product URL into [`AffiliateLinks`]. Mocked in tests.
#[async_trait::async_trait]
pub trait LinkResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or a short link cannot be
    /// followed.
    async fn resolve(&self, url: &str) -> Result<AffiliateLinks, AffiliateError>;
}

pub struct AffiliateResolver {
    http: reqwest::Client,
    tag: Option<String>,
}

impl AffiliateResolver {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(tag: Option<String>) -> Result<Self, AffiliateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(RESOLVE_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| AffiliateError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, tag })
    }

    async fn follow_redirects(&self, url: Url) -> Result<Url, AffiliateError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AffiliateError::Request(e.to_string()))?;
        Ok(response.url().clone())
    }
}

#[async_trait::async_trait]
impl LinkResolver for AffiliateResolver {
    async fn resolve(&self, raw: &str) -> Result<AffiliateLinks, AffiliateError> {
        let raw = raw.trim();
        let mut url = Url::parse(raw).map_err(|e| AffiliateError::InvalidUrl(e.to_string()))?;
        if host_of(&url).is_some_and(|h| is_short_link_host(&h)) {
            url = self.follow_redirects(url).await?;
            debug!(resolved = %url, "short link expanded");
        }
        let asin = extract_asin(&url);
        Ok(links_for(asin.as_deref(), raw, self.tag.as_deref()))
    }
}

#[cfg(test)]
#[path = "affiliate_test.rs"]
mod tests;
