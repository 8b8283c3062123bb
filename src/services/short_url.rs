//! Short-URL allocator: three-character base-36 codes mapped to list ids.
//!
//! DESIGN
//! ======
//! The code space is only 36^3 (46 656) wide, so collisions are expected.
//! Allocation probes for an existing mapping before writing, and the write
//! itself reports a lost race, in which case a fresh code is drawn.
//! Attempts are bounded so a saturated space surfaces as an error.

use rand::Rng;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::store::{DocumentStore, StoreError};

pub const SHORT_CODE_LEN: usize = 3;
pub const MAX_ALLOCATION_ATTEMPTS: usize = 64;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, thiserror::Error)]
pub enum ShortUrlError {
    #[error("list not found: {0}")]
    ListNotFound(Uuid),
    #[error("no free short code after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Draw a fresh code uniformly from `[0-9a-z]{3}`.
#[must_use]
pub fn generate_short_code() -> String {
    let mut rng = rand::rng();
    (0..SHORT_CODE_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Canonical form of a user-supplied code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Public link for a code, e.g. `https://wish.example/s/k3x`.
#[must_use]
pub fn share_url(base_url: &str, code: &str) -> String {
    format!("{}/s/{code}", base_url.trim_end_matches('/'))
}

/// Return the list's short code, allocating and attaching one if needed.
///
/// # Errors
///
/// Returns [`ShortUrlError::ListNotFound`] for unknown lists and
/// [`ShortUrlError::Exhausted`] if no free code was found.
pub async fn create_and_add_short_url(store: &dyn DocumentStore, list_id: Uuid) -> Result<String, ShortUrlError> {
    let list = store
        .get_list(list_id)
        .await?
        .ok_or(ShortUrlError::ListNotFound(list_id))?;
    if let Some(code) = list.short_url {
        return Ok(code);
    }

    for _ in 0..MAX_ALLOCATION_ATTEMPTS {
        let code = generate_short_code();
        if store.short_url_exists(&code).await? {
            debug!(%code, "short code taken, redrawing");
            continue;
        }
        if !store.insert_short_url(&code, list_id).await? {
            debug!(%code, "short code claimed concurrently, redrawing");
            continue;
        }
        if let Err(e) = store.set_list_short_url(list_id, &code).await {
            if let Err(cleanup) = store.delete_short_url(&code).await {
                warn!(error = %cleanup, %code, "orphaned short url left behind");
            }
            return Err(e.into());
        }
        info!(%list_id, %code, "short url allocated");
        return Ok(code);
    }

    Err(ShortUrlError::Exhausted { attempts: MAX_ALLOCATION_ATTEMPTS })
}

/// Resolve a code to its list id. Unknown codes and store failures yield `None`.
pub async fn check_short_url(store: &dyn DocumentStore, code: &str) -> Option<Uuid> {
    let code = normalize_code(code);
    if code.is_empty() {
        return None;
    }
    match store.get_short_url(&code).await {
        Ok(found) => found,
        Err(e) => {
            error!(error = %e, %code, "short url lookup failed");
            None
        }
    }
}

#[cfg(test)]
#[path = "short_url_test.rs"]
mod tests;
