//! Document shapes shared by the store, services and routes.
//!
//! DESIGN
//! ======
//! These mirror the three collections (`users`, `lists`, `short_urls`).
//! Items have no identity of their own: they live inside a list and are
//! addressed by position, so every item mutation is a list mutation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Normalized (trimmed, lowercase) address.
    pub email: String,
    pub name: String,
    /// Ids of lists this user created.
    #[serde(default)]
    pub lists: Vec<Uuid>,
    /// Ids of other users' lists bookmarked by this user.
    #[serde(default)]
    pub saved_lists: Vec<Uuid>,
}

impl User {
    #[must_use]
    pub fn owns(&self, list_id: Uuid) -> bool {
        self.lists.contains(&list_id)
    }

    #[must_use]
    pub fn has_saved(&self, list_id: Uuid) -> bool {
        self.saved_lists.contains(&list_id)
    }
}

// =============================================================================
// LIST + ITEM
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "creatorID")]
    pub creator_id: Uuid,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default)]
    pub details: String,
    /// Price-history page for the product (Keepa). Older clients call this `camelUrl`.
    #[serde(default, alias = "camelUrl", skip_serializing_if = "Option::is_none")]
    pub price_tracking_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,
}

impl Item {
    /// Copy of this item for another list. Purchase state does not travel.
    #[must_use]
    pub fn copy_unpurchased(&self) -> Self {
        Self { purchased: false, ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemIndexError {
    #[error("item index {index} out of range for list of {len}")]
    OutOfRange { index: usize, len: usize },
}

impl List {
    fn check_index(&self, index: usize) -> Result<(), ItemIndexError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ItemIndexError::OutOfRange { index, len: self.items.len() })
        }
    }

    /// Mutable access to the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ItemIndexError::OutOfRange`] if there is no such item.
    pub fn item_mut(&mut self, index: usize) -> Result<&mut Item, ItemIndexError> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(ItemIndexError::OutOfRange { index, len })
    }

    /// Remove and return the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ItemIndexError::OutOfRange`] if there is no such item.
    pub fn remove_item(&mut self, index: usize) -> Result<Item, ItemIndexError> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Flip the purchased flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ItemIndexError::OutOfRange`] if there is no such item.
    pub fn toggle_purchased(&mut self, index: usize) -> Result<bool, ItemIndexError> {
        let item = self.item_mut(index)?;
        item.purchased = !item.purchased;
        Ok(item.purchased)
    }

    /// Swap the item at `index` with its neighbour. Returns the item's new index.
    ///
    /// # Errors
    ///
    /// Returns [`ItemIndexError::OutOfRange`] if `index` is invalid or the
    /// move would push the item past either end of the list.
    pub fn move_item(&mut self, index: usize, direction: MoveDirection) -> Result<usize, ItemIndexError> {
        self.check_index(index)?;
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1),
        }
        .ok_or(ItemIndexError::OutOfRange { index, len: self.items.len() })?;
        self.check_index(target)?;
        self.items.swap(index, target);
        Ok(target)
    }
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
