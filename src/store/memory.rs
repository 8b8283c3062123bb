//! In-memory document store.
//!
//! Used for local development (`STORE_BACKEND=memory`) and tests. Every
//! operation yields to the scheduler once before touching state so that
//! concurrent callers interleave the way they would against a remote store.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, check_batch};
use crate::models::{List, User};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    lists: HashMap<Uuid, List>,
    short_urls: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    /// Sizes of every batch read served, in call order.
    batch_sizes: Mutex<Vec<usize>>,
    #[cfg(test)]
    fail_short_url_attach: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes of the batch reads served so far.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub async fn user_count(&self) -> usize {
        self.data.read().await.users.len()
    }

    pub async fn short_url_codes(&self) -> Vec<String> {
        self.data.read().await.short_urls.keys().cloned().collect()
    }

    /// Reserve a short code without a backing list.
    pub async fn reserve_short_url(&self, code: &str) {
        self.data
            .write()
            .await
            .short_urls
            .insert(code.to_owned(), Uuid::nil());
    }

    /// Make every later `set_list_short_url` fail.
    #[cfg(test)]
    pub fn fail_short_url_attach(&self) {
        self.fail_short_url_attach
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn record_batch(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        check_batch(ids)?;
        self.batch_sizes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(ids.len());
        Ok(())
    }
}

async fn hop() {
    tokio::task::yield_now().await;
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>, StoreError> {
        hop().await;
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|u| u.email == email)
            .map(|u| u.id))
    }

    async fn insert_user(&self, email: &str, name: &str) -> Result<Uuid, StoreError> {
        hop().await;
        let id = Uuid::new_v4();
        let user = User { id, email: email.to_owned(), name: name.to_owned(), lists: Vec::new(), saved_lists: Vec::new() };
        self.data.write().await.users.insert(id, user);
        Ok(id)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        hop().await;
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        self.record_batch(ids)?;
        hop().await;
        let data = self.data.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| data.users.get(id).cloned())
            .collect())
    }

    async fn set_user_name(&self, id: Uuid, name: &str) -> Result<bool, StoreError> {
        hop().await;
        let mut data = self.data.write().await;
        let Some(user) = data.users.get_mut(&id) else {
            return Ok(false);
        };
        name.clone_into(&mut user.name);
        Ok(true)
    }

    async fn add_owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        hop().await;
        if let Some(user) = self.data.write().await.users.get_mut(&user_id) {
            if !user.lists.contains(&list_id) {
                user.lists.push(list_id);
            }
        }
        Ok(())
    }

    async fn remove_owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        hop().await;
        if let Some(user) = self.data.write().await.users.get_mut(&user_id) {
            user.lists.retain(|id| *id != list_id);
        }
        Ok(())
    }

    async fn add_saved_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        hop().await;
        if let Some(user) = self.data.write().await.users.get_mut(&user_id) {
            if !user.saved_lists.contains(&list_id) {
                user.saved_lists.push(list_id);
            }
        }
        Ok(())
    }

    async fn remove_saved_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        hop().await;
        if let Some(user) = self.data.write().await.users.get_mut(&user_id) {
            user.saved_lists.retain(|id| *id != list_id);
        }
        Ok(())
    }

    async fn remove_saved_list_everywhere(&self, list_id: Uuid) -> Result<u64, StoreError> {
        hop().await;
        let mut data = self.data.write().await;
        let mut touched = 0;
        for user in data.users.values_mut() {
            if user.saved_lists.contains(&list_id) {
                user.saved_lists.retain(|id| *id != list_id);
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn insert_list(&self, name: &str, creator_id: Uuid) -> Result<List, StoreError> {
        hop().await;
        let list = List { id: Uuid::new_v4(), name: name.to_owned(), creator_id, items: Vec::new(), short_url: None };
        self.data.write().await.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn get_list(&self, id: Uuid) -> Result<Option<List>, StoreError> {
        hop().await;
        Ok(self.data.read().await.lists.get(&id).cloned())
    }

    async fn get_lists(&self, ids: &[Uuid]) -> Result<Vec<List>, StoreError> {
        self.record_batch(ids)?;
        hop().await;
        let data = self.data.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| data.lists.get(id).cloned())
            .collect())
    }

    async fn update_list(&self, list: &List) -> Result<bool, StoreError> {
        hop().await;
        let mut data = self.data.write().await;
        let Some(stored) = data.lists.get_mut(&list.id) else {
            return Ok(false);
        };
        stored.name.clone_from(&list.name);
        stored.items.clone_from(&list.items);
        Ok(true)
    }

    async fn set_list_short_url(&self, list_id: Uuid, code: &str) -> Result<(), StoreError> {
        hop().await;
        #[cfg(test)]
        if self.fail_short_url_attach.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        if let Some(list) = self.data.write().await.lists.get_mut(&list_id) {
            list.short_url = Some(code.to_owned());
        }
        Ok(())
    }

    async fn delete_list(&self, id: Uuid) -> Result<(), StoreError> {
        hop().await;
        self.data.write().await.lists.remove(&id);
        Ok(())
    }

    async fn short_url_exists(&self, code: &str) -> Result<bool, StoreError> {
        hop().await;
        Ok(self.data.read().await.short_urls.contains_key(code))
    }

    async fn insert_short_url(&self, code: &str, list_id: Uuid) -> Result<bool, StoreError> {
        hop().await;
        let mut data = self.data.write().await;
        if data.short_urls.contains_key(code) {
            return Ok(false);
        }
        data.short_urls.insert(code.to_owned(), list_id);
        Ok(true)
    }

    async fn get_short_url(&self, code: &str) -> Result<Option<Uuid>, StoreError> {
        hop().await;
        Ok(self.data.read().await.short_urls.get(code).copied())
    }

    async fn delete_short_url(&self, code: &str) -> Result<(), StoreError> {
        hop().await;
        self.data.write().await.short_urls.remove(code);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
