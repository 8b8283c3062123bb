//! Document access layer.
//!
//! DESIGN
//! ======
//! `DocumentStore` is the seam between services and persistence. It speaks
//! in whole documents and single-field updates, the way a document
//! database does, and makes no promises across documents: callers that
//! touch several documents issue independent writes.
//!
//! Batch reads accept at most [`MAX_BATCH_IDS`] ids per call. Services split
//! larger requests with [`fetch_in_batches`].

pub mod memory;
pub mod postgres;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use crate::models::{List, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Largest id set a single batch read may carry.
pub const MAX_BATCH_IDS: usize = 30;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(Arc<sqlx::Error>),
    #[error("batch of {len} ids exceeds limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(Arc::new(e))
    }
}

pub(crate) fn check_batch(ids: &[Uuid]) -> Result<(), StoreError> {
    if ids.len() > MAX_BATCH_IDS {
        return Err(StoreError::BatchTooLarge { len: ids.len(), max: MAX_BATCH_IDS });
    }
    Ok(())
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    // -- users ---------------------------------------------------------------

    /// Id of the user with this (already normalized) email, if any.
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>, StoreError>;
    /// Insert a user and return its new id.
    async fn insert_user(&self, email: &str, name: &str) -> Result<Uuid, StoreError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fetch the users that exist among `ids` (at most [`MAX_BATCH_IDS`]).
    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
    async fn set_user_name(&self, id: Uuid, name: &str) -> Result<bool, StoreError>;

    async fn add_owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError>;
    async fn remove_owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError>;
    async fn add_saved_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError>;
    async fn remove_saved_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError>;
    /// Drop `list_id` from every user's saved lists. Returns the number of users touched.
    async fn remove_saved_list_everywhere(&self, list_id: Uuid) -> Result<u64, StoreError>;

    // -- lists ---------------------------------------------------------------

    async fn insert_list(&self, name: &str, creator_id: Uuid) -> Result<List, StoreError>;
    async fn get_list(&self, id: Uuid) -> Result<Option<List>, StoreError>;
    /// Fetch the lists that exist among `ids` (at most [`MAX_BATCH_IDS`]).
    async fn get_lists(&self, ids: &[Uuid]) -> Result<Vec<List>, StoreError>;
    /// Overwrite name and items. Returns `false` if the list does not exist.
    async fn update_list(&self, list: &List) -> Result<bool, StoreError>;
    async fn set_list_short_url(&self, list_id: Uuid, code: &str) -> Result<(), StoreError>;
    async fn delete_list(&self, id: Uuid) -> Result<(), StoreError>;

    // -- short urls ----------------------------------------------------------

    async fn short_url_exists(&self, code: &str) -> Result<bool, StoreError>;
    /// Insert a mapping. Returns `false` if the code was taken in the meantime.
    async fn insert_short_url(&self, code: &str, list_id: Uuid) -> Result<bool, StoreError>;
    async fn get_short_url(&self, code: &str) -> Result<Option<Uuid>, StoreError>;
    async fn delete_short_url(&self, code: &str) -> Result<(), StoreError>;
}

/// Split `ids` into groups of at most [`MAX_BATCH_IDS`], fetch the groups
/// concurrently and merge the results. Duplicate ids are fetched once.
///
/// # Errors
///
/// Returns the first error reported by any group.
pub async fn fetch_in_batches<T, F, Fut>(ids: &[Uuid], fetch: F) -> Result<Vec<T>, StoreError>
where
    F: Fn(Vec<Uuid>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StoreError>>,
{
    let mut seen = HashSet::new();
    let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let groups = try_join_all(unique.chunks(MAX_BATCH_IDS).map(|chunk| fetch(chunk.to_vec()))).await?;
    Ok(groups.into_iter().flatten().collect())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
