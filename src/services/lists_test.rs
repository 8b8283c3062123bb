use super::*;
use crate::models::Item;
use crate::store::MemoryStore;

async fn user(store: &MemoryStore, email: &str) -> Uuid {
    store.insert_user(email, email).await.unwrap()
}

async fn fetch_user(store: &MemoryStore, id: Uuid) -> User {
    store.get_user(id).await.unwrap().unwrap()
}

// =============================================================================
// add_list / delete_list
// =============================================================================

#[tokio::test]
async fn add_list_links_owner_and_allocates_short_url() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;

    let list = add_list(&store, ann, "  Birthday ").await.unwrap();

    assert_eq!(list.name, "Birthday");
    assert_eq!(list.creator_id, ann);
    let code = list.short_url.clone().unwrap();
    assert_eq!(store.get_short_url(&code).await.unwrap(), Some(list.id));
    assert_eq!(fetch_user(&store, ann).await.lists, vec![list.id]);
    assert_eq!(get_list(&store, list.id).await, Some(list));
}

#[tokio::test]
async fn add_list_validates_name_and_user() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    assert!(matches!(add_list(&store, ann, "  ").await, Err(ListError::InvalidName)));
    assert!(matches!(add_list(&store, Uuid::new_v4(), "X").await, Err(ListError::UserNotFound(_))));
}

#[tokio::test]
async fn delete_list_removes_every_reference() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let bob = user(&store, "bob@x.io").await;
    let cy = user(&store, "cy@x.io").await;
    let list = add_list(&store, ann, "Xmas").await.unwrap();
    let keep = add_list(&store, ann, "Keep").await.unwrap();
    add_to_saved_lists(&store, bob, list.id).await.unwrap();
    add_to_saved_lists(&store, cy, list.id).await.unwrap();
    add_to_saved_lists(&store, cy, keep.id).await.unwrap();

    delete_list(&store, ann, list.id).await.unwrap();

    assert!(get_list(&store, list.id).await.is_none());
    assert_eq!(fetch_user(&store, ann).await.lists, vec![keep.id]);
    assert!(fetch_user(&store, bob).await.saved_lists.is_empty());
    // Other saved lists of a saver are untouched.
    assert_eq!(fetch_user(&store, cy).await.saved_lists, vec![keep.id]);
    let code = list.short_url.unwrap();
    assert_eq!(store.get_short_url(&code).await.unwrap(), None);
}

#[tokio::test]
async fn only_the_creator_may_delete() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let bob = user(&store, "bob@x.io").await;
    let list = add_list(&store, ann, "Xmas").await.unwrap();

    assert!(matches!(delete_list(&store, bob, list.id).await, Err(ListError::NotOwner { .. })));
    assert!(get_list(&store, list.id).await.is_some());
    assert!(matches!(delete_list(&store, ann, Uuid::new_v4()).await, Err(ListError::NotFound(_))));
}

// =============================================================================
// save_list
// =============================================================================

#[tokio::test]
async fn save_list_reports_success_and_missing_lists() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let mut list = add_list(&store, ann, "Xmas").await.unwrap();
    list.items.push(Item { name: "socks".into(), ..Item::default() });

    assert!(save_list(&store, &list).await);
    assert_eq!(get_list(&store, list.id).await.unwrap().items.len(), 1);

    list.id = Uuid::new_v4();
    assert!(!save_list(&store, &list).await);
}

// =============================================================================
// batch reads
// =============================================================================

#[tokio::test]
async fn empty_id_set_never_reaches_the_store() {
    let store = MemoryStore::new();
    assert!(get_lists_from_ids(&store, &[]).await.is_empty());
    assert!(store.batch_sizes().is_empty());
}

#[tokio::test]
async fn batch_reads_return_exactly_the_existing_ids() {
    for n in [1usize, 30, 31] {
        let store = MemoryStore::new();
        let creator = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..n {
            ids.push(store.insert_list(&format!("l{i}"), creator).await.unwrap().id);
        }
        let mut request = ids.clone();
        request.insert(0, Uuid::new_v4());

        let lists = get_lists_from_ids(&store, &request).await;

        let got: Vec<Uuid> = lists.iter().map(|l| l.id).collect();
        assert_eq!(got, ids, "n = {n}");
        assert!(store.batch_sizes().iter().all(|&s| s <= 30), "n = {n}");
        assert_eq!(store.batch_sizes().iter().sum::<usize>(), n + 1, "n = {n}");
    }
}

#[tokio::test]
async fn get_lists_picks_owned_or_saved() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let bob = user(&store, "bob@x.io").await;
    let own = add_list(&store, ann, "Mine").await.unwrap();
    let theirs = add_list(&store, bob, "Theirs").await.unwrap();
    add_to_saved_lists(&store, ann, theirs.id).await.unwrap();

    let ann_user = fetch_user(&store, ann).await;
    assert_eq!(get_lists(&store, &ann_user, false).await, vec![own]);
    let saved = get_lists(&store, &ann_user, true).await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, theirs.id);
}

#[tokio::test]
async fn lists_with_creators_follow_input_order() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let bob = user(&store, "bob@x.io").await;
    let a = add_list(&store, ann, "A").await.unwrap();
    let b = add_list(&store, bob, "B").await.unwrap();
    let orphan = store.insert_list("Orphan", Uuid::new_v4()).await.unwrap();

    let out = get_lists_with_creators(&store, &[orphan.id, b.id, a.id]).await;

    let names: Vec<&str> = out.iter().map(|lc| lc.list.name.as_str()).collect();
    assert_eq!(names, ["Orphan", "B", "A"]);
    assert!(out[0].creator.is_none());
    assert_eq!(out[1].creator.as_ref().map(|u| u.id), Some(bob));
    assert_eq!(out[2].creator.as_ref().map(|u| u.id), Some(ann));
}

// =============================================================================
// saved lists
// =============================================================================

#[tokio::test]
async fn saving_is_idempotent_and_skips_own_lists() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let bob = user(&store, "bob@x.io").await;
    let list = add_list(&store, ann, "Xmas").await.unwrap();

    add_to_saved_lists(&store, bob, list.id).await.unwrap();
    add_to_saved_lists(&store, bob, list.id).await.unwrap();
    add_to_saved_lists(&store, ann, list.id).await.unwrap();

    assert_eq!(fetch_user(&store, bob).await.saved_lists, vec![list.id]);
    assert!(fetch_user(&store, ann).await.saved_lists.is_empty());
    assert!(matches!(add_to_saved_lists(&store, bob, Uuid::new_v4()).await, Err(ListError::NotFound(_))));
}

#[tokio::test]
async fn removing_an_absent_saved_list_is_a_noop() {
    let store = MemoryStore::new();
    let ann = user(&store, "ann@x.io").await;
    let bob = user(&store, "bob@x.io").await;
    let list = add_list(&store, ann, "Xmas").await.unwrap();
    add_to_saved_lists(&store, bob, list.id).await.unwrap();
    let before = fetch_user(&store, bob).await;

    remove_from_saved_lists(&store, bob, Uuid::new_v4()).await.unwrap();
    assert_eq!(fetch_user(&store, bob).await, before);

    remove_from_saved_lists(&store, bob, list.id).await.unwrap();
    assert!(fetch_user(&store, bob).await.saved_lists.is_empty());
    remove_from_saved_lists(&store, bob, list.id).await.unwrap();
}
