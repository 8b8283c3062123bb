//! User service: find-or-create by email, plus profile reads and renames.
//!
//! DESIGN
//! ======
//! Users are keyed by normalized email but the store only offers
//! query-then-insert. Concurrent `create_user_if_needed` calls for the same
//! email inside this process share one in-flight future, so a burst of
//! first visits produces a single user. Across processes the Postgres
//! store's unique index closes the remaining window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::User;
use crate::store::{DocumentStore, StoreError, fetch_in_batches};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UserError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid name")]
    InvalidName,
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Trim and lowercase an email address. Returns `None` unless the result has
/// exactly one `@` with text on both sides and a dot in the domain.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || normalized.contains(char::is_whitespace) {
        return None;
    }
    let (host, tld) = domain.rsplit_once('.')?;
    if host.is_empty() || tld.is_empty() {
        return None;
    }
    Some(normalized)
}

type PendingUser = Shared<BoxFuture<'static, Result<User, UserError>>>;

/// Entry point for user lookups that need creation de-duplication.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
    inflight: Arc<Mutex<HashMap<String, PendingUser>>>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, inflight: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Return the user for `email`, creating it on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidEmail`] for malformed addresses and
    /// [`UserError::Store`] if the store fails.
    pub async fn create_user_if_needed(&self, email: &str) -> Result<User, UserError> {
        let email = normalize_email(email).ok_or(UserError::InvalidEmail)?;

        let pending = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            inflight
                .entry(email.clone())
                .or_insert_with(|| find_or_create(Arc::clone(&self.store), email.clone()).boxed().shared())
                .clone()
        };

        let guard = InflightGuard { inflight: Arc::clone(&self.inflight), email, pending };
        // Declared after `guard` so it is released first on cancellation.
        let mut waiter = guard.pending.clone();
        (&mut waiter).await
    }

    #[cfg(test)]
    pub(crate) fn inflight_len(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Clears a map entry once its future settles, or once its last waiter is
/// dropped before that.
struct InflightGuard {
    inflight: Arc<Mutex<HashMap<String, PendingUser>>>,
    email: String,
    pending: PendingUser,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let settled = self.pending.peek().is_some();
        // Only the map entry and this guard still hold it: no waiter is left.
        let abandoned = self.pending.strong_count().is_some_and(|n| n <= 2);
        if !settled && !abandoned {
            return;
        }
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if inflight.get(&self.email).is_some_and(|p| p.ptr_eq(&self.pending)) {
            inflight.remove(&self.email);
        }
    }
}

async fn find_or_create(store: Arc<dyn DocumentStore>, email: String) -> Result<User, UserError> {
    let id = match store.find_user_id_by_email(&email).await? {
        Some(id) => id,
        None => {
            let id = store.insert_user(&email, &email).await?;
            info!(%id, "created user");
            id
        }
    };
    store.get_user(id).await?.ok_or(UserError::NotFound(id))
}

/// Fetch a user. Store failures are logged and reported as absence.
pub async fn get_user_by_id(store: &dyn DocumentStore, id: Uuid) -> Option<User> {
    match store.get_user(id).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, %id, "user read failed");
            None
        }
    }
}

/// Change a user's display name.
///
/// # Errors
///
/// Returns [`UserError::InvalidName`] for blank names and
/// [`UserError::NotFound`] if the user does not exist.
pub async fn change_name(store: &dyn DocumentStore, id: Uuid, name: &str) -> Result<(), UserError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::InvalidName);
    }
    if !store.set_user_name(id, name).await? {
        return Err(UserError::NotFound(id));
    }
    Ok(())
}

/// Fetch every existing user among `ids`, in batches the store accepts.
pub async fn get_users_from_ids(store: &dyn DocumentStore, ids: &[Uuid]) -> Vec<User> {
    match fetch_in_batches(ids, |chunk| async move { store.get_users(&chunk).await }).await {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, count = ids.len(), "batch user read failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
