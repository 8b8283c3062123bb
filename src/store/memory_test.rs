use super::*;

#[tokio::test]
async fn user_round_trip_and_email_lookup() {
    let store = MemoryStore::new();
    let id = store.insert_user("ann@example.com", "Ann").await.unwrap();

    assert_eq!(store.find_user_id_by_email("ann@example.com").await.unwrap(), Some(id));
    assert_eq!(store.find_user_id_by_email("bob@example.com").await.unwrap(), None);

    let user = store.get_user(id).await.unwrap().unwrap();
    assert_eq!(user.name, "Ann");
    assert!(user.lists.is_empty());
}

#[tokio::test]
async fn batch_reads_reject_more_than_thirty_ids() {
    let store = MemoryStore::new();
    let ids: Vec<Uuid> = (0..31).map(|_| Uuid::new_v4()).collect();
    assert!(matches!(store.get_lists(&ids).await, Err(StoreError::BatchTooLarge { len: 31, .. })));
    assert!(store.get_users(&ids[..30]).await.unwrap().is_empty());
    assert_eq!(store.batch_sizes(), vec![30]);
}

#[tokio::test]
async fn saved_list_membership_is_set_like() {
    let store = MemoryStore::new();
    let user = store.insert_user("a@b.c", "a").await.unwrap();
    let list = Uuid::new_v4();

    store.add_saved_list(user, list).await.unwrap();
    store.add_saved_list(user, list).await.unwrap();
    assert_eq!(store.get_user(user).await.unwrap().unwrap().saved_lists, vec![list]);

    store.remove_saved_list(user, list).await.unwrap();
    store.remove_saved_list(user, list).await.unwrap();
    assert!(store.get_user(user).await.unwrap().unwrap().saved_lists.is_empty());
}

#[tokio::test]
async fn remove_saved_list_everywhere_counts_touched_users() {
    let store = MemoryStore::new();
    let list = Uuid::new_v4();
    let other = Uuid::new_v4();
    let a = store.insert_user("a@x.y", "a").await.unwrap();
    let b = store.insert_user("b@x.y", "b").await.unwrap();
    let c = store.insert_user("c@x.y", "c").await.unwrap();
    store.add_saved_list(a, list).await.unwrap();
    store.add_saved_list(b, list).await.unwrap();
    store.add_saved_list(b, other).await.unwrap();
    store.add_saved_list(c, other).await.unwrap();

    assert_eq!(store.remove_saved_list_everywhere(list).await.unwrap(), 2);
    assert_eq!(store.get_user(b).await.unwrap().unwrap().saved_lists, vec![other]);
    assert_eq!(store.get_user(c).await.unwrap().unwrap().saved_lists, vec![other]);
}

#[tokio::test]
async fn update_list_only_touches_name_and_items() {
    let store = MemoryStore::new();
    let creator = Uuid::new_v4();
    let list = store.insert_list("Xmas", creator).await.unwrap();
    store.set_list_short_url(list.id, "abc").await.unwrap();

    let mut edited = list.clone();
    edited.name = "Christmas".into();
    edited.creator_id = Uuid::new_v4();
    edited.items.push(crate::models::Item { name: "scarf".into(), ..Default::default() });
    assert!(store.update_list(&edited).await.unwrap());

    let stored = store.get_list(list.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Christmas");
    assert_eq!(stored.creator_id, creator);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.short_url.as_deref(), Some("abc"));
}

#[tokio::test]
async fn update_missing_list_reports_false() {
    let store = MemoryStore::new();
    let ghost = List { id: Uuid::new_v4(), name: "x".into(), creator_id: Uuid::new_v4(), items: vec![], short_url: None };
    assert!(!store.update_list(&ghost).await.unwrap());
}

#[tokio::test]
async fn short_url_insert_is_first_writer_wins() {
    let store = MemoryStore::new();
    let first = Uuid::new_v4();
    assert!(store.insert_short_url("k9z", first).await.unwrap());
    assert!(!store.insert_short_url("k9z", Uuid::new_v4()).await.unwrap());
    assert_eq!(store.get_short_url("k9z").await.unwrap(), Some(first));

    store.delete_short_url("k9z").await.unwrap();
    assert!(!store.short_url_exists("k9z").await.unwrap());
}
