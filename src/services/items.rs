//! Item operations. Items live inside their list, so each operation loads
//! the list, edits it in place and saves it back.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{Item, ItemIndexError, List, MoveDirection};
use crate::services::affiliate::{AffiliateError, LinkResolver, is_amazon_url};
use crate::services::lists;
use crate::store::DocumentStore;

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("item name is required")]
    InvalidName,
    #[error("item url must start with http")]
    InvalidUrl,
    #[error("shared content has no title, text or url")]
    EmptyShare,
    #[error("list not found: {0}")]
    ListNotFound(Uuid),
    #[error(transparent)]
    Index(#[from] ItemIndexError),
    #[error("link enrichment failed: {0}")]
    Enrichment(#[from] AffiliateError),
    #[error("saving list {0} failed")]
    SaveFailed(Uuid),
}

/// User-editable item fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemDraft {
    pub name: String,
    pub url: String,
    pub details: String,
}

/// Validate a draft and attach affiliate links for Amazon URLs.
async fn prepare(links: &dyn LinkResolver, draft: ItemDraft) -> Result<Item, ItemError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ItemError::InvalidName);
    }
    let url = draft.url.trim();
    if !url.is_empty() && !url.starts_with("http") {
        return Err(ItemError::InvalidUrl);
    }

    let mut item = Item { name: name.to_string(), url: url.to_string(), details: draft.details, ..Item::default() };
    if is_amazon_url(url) {
        let resolved = links.resolve(url).await?;
        item.price_tracking_url = Some(resolved.keepa_url).filter(|u| !u.is_empty());
        item.affiliate_url = Some(resolved.affiliate_url);
    }
    Ok(item)
}

async fn load(store: &dyn DocumentStore, list_id: Uuid) -> Result<List, ItemError> {
    lists::get_list(store, list_id)
        .await
        .ok_or(ItemError::ListNotFound(list_id))
}

async fn save(store: &dyn DocumentStore, list: List) -> Result<List, ItemError> {
    if lists::save_list(store, &list).await {
        Ok(list)
    } else {
        Err(ItemError::SaveFailed(list.id))
    }
}

/// Append a new item. Returns the saved list.
///
/// # Errors
///
/// Validation, enrichment and save failures all abort without writing.
pub async fn add_item(
    store: &dyn DocumentStore,
    links: &dyn LinkResolver,
    list_id: Uuid,
    draft: ItemDraft,
) -> Result<List, ItemError> {
    let item = prepare(links, draft).await?;
    let mut list = load(store, list_id).await?;
    list.items.push(item);
    let list = save(store, list).await?;
    info!(%list_id, items = list.items.len(), "item added");
    Ok(list)
}

/// Replace an item's editable fields, keeping its purchased flag.
///
/// # Errors
///
/// Returns [`ItemError::Index`] when `index` is out of range.
pub async fn update_item(
    store: &dyn DocumentStore,
    links: &dyn LinkResolver,
    list_id: Uuid,
    index: usize,
    draft: ItemDraft,
) -> Result<List, ItemError> {
    let mut list = load(store, list_id).await?;
    list.item_mut(index)?;
    let mut updated = prepare(links, draft).await?;

    let slot = list.item_mut(index)?;
    updated.purchased = slot.purchased;
    *slot = updated;
    save(store, list).await
}

/// # Errors
///
/// Returns [`ItemError::Index`] when `index` is out of range.
pub async fn delete_item(store: &dyn DocumentStore, list_id: Uuid, index: usize) -> Result<List, ItemError> {
    let mut list = load(store, list_id).await?;
    let removed = list.remove_item(index)?;
    info!(%list_id, item = %removed.name, "item deleted");
    save(store, list).await
}

/// # Errors
///
/// Returns [`ItemError::Index`] when `index` is out of range.
pub async fn toggle_purchased(store: &dyn DocumentStore, list_id: Uuid, index: usize) -> Result<List, ItemError> {
    let mut list = load(store, list_id).await?;
    list.toggle_purchased(index)?;
    save(store, list).await
}

/// # Errors
///
/// Returns [`ItemError::Index`] when `index` is out of range or the move
/// would leave the list.
pub async fn move_item(
    store: &dyn DocumentStore,
    list_id: Uuid,
    index: usize,
    direction: MoveDirection,
) -> Result<List, ItemError> {
    let mut list = load(store, list_id).await?;
    list.move_item(index, direction)?;
    save(store, list).await
}

/// Append an unpurchased copy of an item to another list. Returns the
/// target list.
///
/// # Errors
///
/// Returns [`ItemError::ListNotFound`] if either list is missing.
pub async fn copy_item(
    store: &dyn DocumentStore,
    from_list: Uuid,
    index: usize,
    to_list: Uuid,
) -> Result<List, ItemError> {
    let mut source = load(store, from_list).await?;
    let copy = source.item_mut(index)?.copy_unpurchased();
    let mut target = load(store, to_list).await?;
    target.items.push(copy);
    save(store, target).await
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// First `http://` or `https://` token in free text.
fn first_url(text: &str) -> Option<&str> {
    let start = ["https://", "http://"]
        .iter()
        .filter_map(|scheme| text.find(scheme))
        .min()?;
    let rest = &text[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Build a draft from share-sheet fields. A missing `url` is recovered from
/// `text`; a missing `title` falls back to the url, then the text.
///
/// # Errors
///
/// Returns [`ItemError::EmptyShare`] if all three fields are blank.
pub fn item_from_share(title: Option<&str>, text: Option<&str>, url: Option<&str>) -> Result<ItemDraft, ItemError> {
    let (title, text, url) = (non_blank(title), non_blank(text), non_blank(url));
    if title.is_none() && text.is_none() && url.is_none() {
        return Err(ItemError::EmptyShare);
    }

    let url = url.or_else(|| text.and_then(first_url)).unwrap_or_default();
    let name = title
        .or_else(|| (!url.is_empty()).then_some(url))
        .or(text)
        .unwrap_or_default();
    Ok(ItemDraft { name: name.to_string(), url: url.to_string(), details: String::new() })
}

#[cfg(test)]
#[path = "items_test.rs"]
mod tests;
