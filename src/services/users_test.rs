use super::*;
use crate::store::MemoryStore;
use futures::future::join_all;

fn directory() -> (Arc<MemoryStore>, UserDirectory) {
    let store = Arc::new(MemoryStore::new());
    let dir = UserDirectory::new(store.clone());
    (store, dir)
}

// =============================================================================
// normalize_email
// =============================================================================

#[test]
fn normalize_trims_and_lowercases() {
    assert_eq!(normalize_email("  Ann.Lee@Example.COM \n").as_deref(), Some("ann.lee@example.com"));
}

#[test]
fn normalize_rejects_malformed_addresses() {
    for bad in ["", "   ", "ann", "@example.com", "ann@", "a@b@c.com", "ann@example", "ann lee@example.com", "ann@.com"] {
        assert!(normalize_email(bad).is_none(), "{bad:?} should be rejected");
    }
}

// =============================================================================
// create_user_if_needed
// =============================================================================

#[tokio::test]
async fn first_call_creates_user_named_after_email() {
    let (store, dir) = directory();
    let user = dir.create_user_if_needed("Ann@Example.com").await.unwrap();

    assert_eq!(user.email, "ann@example.com");
    assert_eq!(user.name, "ann@example.com");
    assert!(user.lists.is_empty());
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn email_variants_resolve_to_the_same_user() {
    let (store, dir) = directory();
    let a = dir.create_user_if_needed("ann@example.com").await.unwrap();
    let b = dir.create_user_if_needed("  ANN@example.com").await.unwrap();
    let c = dir.create_user_if_needed("Ann@Example.Com  ").await.unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(b.id, c.id);
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn concurrent_first_visits_create_one_user() {
    let (store, dir) = directory();
    let calls = (0..16).map(|i| {
        let dir = dir.clone();
        let email = if i % 2 == 0 { "bob@example.com" } else { " BOB@example.com" };
        async move { dir.create_user_if_needed(email).await }
    });

    let users: Vec<User> = join_all(calls)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(store.user_count().await, 1);
    assert!(users.iter().all(|u| u.id == users[0].id));
    assert_eq!(dir.inflight_len(), 0);
}

#[tokio::test]
async fn concurrent_creation_across_tasks_creates_one_user() {
    let (store, dir) = directory();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dir = dir.clone();
            tokio::spawn(async move { dir.create_user_if_needed("cara@example.com").await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn abandoned_creation_clears_inflight_entry() {
    let (_, dir) = directory();
    let mut first = Box::pin(dir.create_user_if_needed("dan@example.com"));
    let mut second = Box::pin(dir.create_user_if_needed("dan@example.com"));
    assert!(futures::poll!(&mut first).is_pending());
    assert!(futures::poll!(&mut second).is_pending());
    assert_eq!(dir.inflight_len(), 1);

    // One waiter left: the entry stays for it.
    drop(first);
    assert_eq!(dir.inflight_len(), 1);

    drop(second);
    assert_eq!(dir.inflight_len(), 0);
}

#[tokio::test]
async fn distinct_emails_create_distinct_users() {
    let (store, dir) = directory();
    let (a, b) = tokio::join!(dir.create_user_if_needed("a@x.io"), dir.create_user_if_needed("b@x.io"));
    assert_ne!(a.unwrap().id, b.unwrap().id);
    assert_eq!(store.user_count().await, 2);
}

#[tokio::test]
async fn invalid_email_touches_nothing() {
    let (store, dir) = directory();
    assert!(matches!(dir.create_user_if_needed("not-an-email").await, Err(UserError::InvalidEmail)));
    assert_eq!(store.user_count().await, 0);
    assert_eq!(dir.inflight_len(), 0);
}

// =============================================================================
// reads and renames
// =============================================================================

#[tokio::test]
async fn change_name_trims_and_persists() {
    let (store, dir) = directory();
    let user = dir.create_user_if_needed("dee@example.com").await.unwrap();

    change_name(store.as_ref(), user.id, "  Dee  ").await.unwrap();
    assert_eq!(get_user_by_id(store.as_ref(), user.id).await.unwrap().name, "Dee");

    assert!(matches!(change_name(store.as_ref(), user.id, "   ").await, Err(UserError::InvalidName)));
    assert!(matches!(change_name(store.as_ref(), Uuid::new_v4(), "X").await, Err(UserError::NotFound(_))));
}

#[tokio::test]
async fn get_user_by_id_missing_is_none() {
    let store = MemoryStore::new();
    assert!(get_user_by_id(&store, Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn get_users_from_ids_chunks_and_skips_missing() {
    let store = MemoryStore::new();
    let mut ids = Vec::new();
    for i in 0..31 {
        let email = format!("u{i}@example.com");
        ids.push(store.insert_user(&email, &email).await.unwrap());
    }
    ids.push(Uuid::new_v4());

    let users = get_users_from_ids(&store, &ids).await;
    assert_eq!(users.len(), 31);

    let mut sizes = store.batch_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 30]);
}
