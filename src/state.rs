//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Every field is an `Arc` or cheap to clone. The store, LLM and link
//! resolver sit behind traits so tests swap in in-memory or mock versions.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::LlmChat;
use crate::rate_limit::RateLimiter;
use crate::services::affiliate::LinkResolver;
use crate::services::users::UserDirectory;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Find-or-create front for users; shares `store`.
    pub users: UserDirectory,
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub links: Arc<dyn LinkResolver>,
    /// Guards the suggestion endpoint.
    pub rate_limiter: RateLimiter,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        llm: Option<Arc<dyn LlmChat>>,
        links: Arc<dyn LinkResolver>,
        config: AppConfig,
    ) -> Self {
        Self {
            users: UserDirectory::new(Arc::clone(&store)),
            store,
            llm,
            links,
            rate_limiter: RateLimiter::new(config.rate_limit),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::config::{DEFAULT_SUGGESTION_MAX_TOKENS, StoreBackend};
    use crate::rate_limit::RateLimitConfig;
    use crate::services::affiliate::{AffiliateError, AffiliateLinks, links_for};
    use crate::store::MemoryStore;

    /// Resolves without network: the ASIN is taken from the last path segment.
    pub struct OfflineResolver;

    #[async_trait::async_trait]
    impl LinkResolver for OfflineResolver {
        async fn resolve(&self, url: &str) -> Result<AffiliateLinks, AffiliateError> {
            let asin = url.rsplit('/').next().filter(|s| s.len() == 10);
            Ok(links_for(asin, url, Some("test-20")))
        }
    }

    #[must_use]
    pub fn test_config() -> AppConfig {
        AppConfig {
            port: 0,
            store: StoreBackend::Memory,
            public_base_url: Some("https://wish.test".into()),
            affiliate_tag: Some("test-20".into()),
            suggestion_max_tokens: DEFAULT_SUGGESTION_MAX_TOKENS,
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// `AppState` over a fresh in-memory store, returned alongside it.
    #[must_use]
    pub fn test_app_state() -> (AppState, Arc<MemoryStore>) {
        test_app_state_with(None, test_config())
    }

    #[must_use]
    pub fn test_app_state_with(llm: Option<Arc<dyn LlmChat>>, config: AppConfig) -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), llm, Arc::new(OfflineResolver), config);
        (state, store)
    }
}
