//! List service: creation, reads, saves, deletion and saved-list bookkeeping.
//!
//! DESIGN
//! ======
//! A list touches up to three kinds of documents: the list itself, the
//! creator's `lists` array (plus any savers' `savedLists`), and its
//! short-URL mapping. Each is written independently, in an order that
//! leaves at worst a dangling id behind if a later step fails. Readers
//! tolerate dangling ids because batch reads only return what exists.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{List, User};
use crate::services::short_url::{self, ShortUrlError};
use crate::services::users;
use crate::store::{DocumentStore, StoreError, fetch_in_batches};

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("invalid list name")]
    InvalidName,
    #[error("list not found: {0}")]
    NotFound(Uuid),
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("user {user_id} did not create list {list_id}")]
    NotOwner { user_id: Uuid, list_id: Uuid },
    #[error("short url: {0}")]
    ShortUrl(#[from] ShortUrlError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A list paired with its creator. `creator` is `None` when that user no
/// longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListWithCreator {
    pub list: List,
    pub creator: Option<User>,
}

async fn require_user(store: &dyn DocumentStore, user_id: Uuid) -> Result<User, ListError> {
    store
        .get_user(user_id)
        .await?
        .ok_or(ListError::UserNotFound(user_id))
}

async fn require_list(store: &dyn DocumentStore, list_id: Uuid) -> Result<List, ListError> {
    store
        .get_list(list_id)
        .await?
        .ok_or(ListError::NotFound(list_id))
}

/// Create a list owned by `user_id` and give it a short URL.
///
/// Failing to allocate the short URL does not undo the list; it is logged
/// and the list is returned without a code.
///
/// # Errors
///
/// Returns [`ListError::InvalidName`] for blank names and
/// [`ListError::UserNotFound`] for unknown users.
pub async fn add_list(store: &dyn DocumentStore, user_id: Uuid, name: &str) -> Result<List, ListError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ListError::InvalidName);
    }
    require_user(store, user_id).await?;

    let mut list = store.insert_list(name, user_id).await?;
    store.add_owned_list(user_id, list.id).await?;
    info!(list_id = %list.id, %user_id, "list created");

    match short_url::create_and_add_short_url(store, list.id).await {
        Ok(code) => list.short_url = Some(code),
        Err(e) => warn!(error = %e, list_id = %list.id, "short url allocation failed"),
    }
    Ok(list)
}

/// Fetch a list. Store failures are logged and reported as absence.
pub async fn get_list(store: &dyn DocumentStore, list_id: Uuid) -> Option<List> {
    match store.get_list(list_id).await {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, %list_id, "list read failed");
            None
        }
    }
}

/// Overwrite a list's name and items. Returns `false` when nothing was saved.
pub async fn save_list(store: &dyn DocumentStore, list: &List) -> bool {
    match store.update_list(list).await {
        Ok(true) => true,
        Ok(false) => {
            warn!(list_id = %list.id, "save of missing list ignored");
            false
        }
        Err(e) => {
            error!(error = %e, list_id = %list.id, "list save failed");
            false
        }
    }
}

/// Delete a list and every reference to it. Only the creator may do this.
///
/// # Errors
///
/// Returns [`ListError::NotOwner`] if `user_id` did not create the list.
pub async fn delete_list(store: &dyn DocumentStore, user_id: Uuid, list_id: Uuid) -> Result<(), ListError> {
    let list = require_list(store, list_id).await?;
    if list.creator_id != user_id {
        return Err(ListError::NotOwner { user_id, list_id });
    }

    store.remove_owned_list(user_id, list_id).await?;
    let savers = store.remove_saved_list_everywhere(list_id).await?;
    if let Some(code) = &list.short_url {
        store.delete_short_url(code).await?;
    }
    store.delete_list(list_id).await?;

    info!(%list_id, %user_id, savers, "list deleted");
    Ok(())
}

/// The user's own lists, or the lists they saved.
pub async fn get_lists(store: &dyn DocumentStore, user: &User, saved: bool) -> Vec<List> {
    let ids = if saved { &user.saved_lists } else { &user.lists };
    get_lists_from_ids(store, ids).await
}

/// Fetch every existing list among `ids`, in input order. Store failures are
/// logged and reported as an empty result.
pub async fn get_lists_from_ids(store: &dyn DocumentStore, ids: &[Uuid]) -> Vec<List> {
    match fetch_in_batches(ids, |chunk| async move { store.get_lists(&chunk).await }).await {
        Ok(lists) => order_by_ids(lists, ids, |l| l.id),
        Err(e) => {
            error!(error = %e, count = ids.len(), "batch list read failed");
            Vec::new()
        }
    }
}

/// Lists plus their creators, in input order.
pub async fn get_lists_with_creators(store: &dyn DocumentStore, ids: &[Uuid]) -> Vec<ListWithCreator> {
    let lists = get_lists_from_ids(store, ids).await;
    let creator_ids: Vec<Uuid> = lists.iter().map(|l| l.creator_id).collect();
    let creators: HashMap<Uuid, User> = users::get_users_from_ids(store, &creator_ids)
        .await
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    lists
        .into_iter()
        .map(|list| {
            let creator = creators.get(&list.creator_id).cloned();
            ListWithCreator { list, creator }
        })
        .collect()
}

/// Bookmark someone else's list. Already saved or owned lists are left alone.
///
/// # Errors
///
/// Returns [`ListError::NotFound`] if the list does not exist.
pub async fn add_to_saved_lists(store: &dyn DocumentStore, user_id: Uuid, list_id: Uuid) -> Result<(), ListError> {
    let user = require_user(store, user_id).await?;
    let list = require_list(store, list_id).await?;
    if user.has_saved(list_id) || user.owns(list_id) || list.creator_id == user_id {
        return Ok(());
    }
    store.add_saved_list(user_id, list_id).await?;
    info!(%list_id, %user_id, "list saved");
    Ok(())
}

/// Drop a bookmark. Absent bookmarks are a no-op.
///
/// # Errors
///
/// Returns [`ListError::UserNotFound`] for unknown users.
pub async fn remove_from_saved_lists(
    store: &dyn DocumentStore,
    user_id: Uuid,
    list_id: Uuid,
) -> Result<(), ListError> {
    let user = require_user(store, user_id).await?;
    if !user.has_saved(list_id) {
        return Ok(());
    }
    store.remove_saved_list(user_id, list_id).await?;
    info!(%list_id, %user_id, "list unsaved");
    Ok(())
}

/// Reorder `docs` to follow the first occurrence of each id in `ids`.
fn order_by_ids<T>(docs: Vec<T>, ids: &[Uuid], id_of: impl Fn(&T) -> Uuid) -> Vec<T> {
    let mut by_id: HashMap<Uuid, T> = docs.into_iter().map(|d| (id_of(&d), d)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[cfg(test)]
#[path = "lists_test.rs"]
mod tests;
