use super::*;
use crate::services::affiliate::AffiliateLinks;
use crate::store::MemoryStore;
use std::sync::Mutex;

// =========================================================================
// MockResolver
// =========================================================================

struct MockResolver {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl MockResolver {
    fn ok() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail: false }
    }

    fn failing() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail: true }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LinkResolver for MockResolver {
    async fn resolve(&self, url: &str) -> Result<AffiliateLinks, AffiliateError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(AffiliateError::Request("connection reset".into()));
        }
        Ok(AffiliateLinks {
            keepa_url: "https://keepa.com/#!search/1-B08N5WRWNW".into(),
            affiliate_url: "http://www.amazon.com/dp/B08N5WRWNW/ref=nosim?tag=t-20".into(),
        })
    }
}

fn draft(name: &str, url: &str) -> ItemDraft {
    ItemDraft { name: name.into(), url: url.into(), details: String::new() }
}

async fn list_with(store: &MemoryStore, names: &[&str]) -> Uuid {
    let mut list = store.insert_list("Xmas", Uuid::new_v4()).await.unwrap();
    list.items = names
        .iter()
        .map(|n| Item { name: (*n).into(), ..Item::default() })
        .collect();
    store.update_list(&list).await.unwrap();
    list.id
}

fn names(list: &List) -> Vec<&str> {
    list.items.iter().map(|i| i.name.as_str()).collect()
}

// =========================================================================
// add / update
// =========================================================================

#[tokio::test]
async fn add_plain_item_skips_enrichment() {
    let store = MemoryStore::new();
    let links = MockResolver::ok();
    let id = list_with(&store, &[]).await;

    let list = add_item(&store, &links, id, draft("  Scarf ", "https://shop.example/scarf"))
        .await
        .unwrap();

    assert_eq!(names(&list), ["Scarf"]);
    assert!(list.items[0].affiliate_url.is_none());
    assert!(links.calls().is_empty());
    assert_eq!(store.get_list(id).await.unwrap().unwrap(), list);
}

#[tokio::test]
async fn add_amazon_item_is_enriched() {
    let store = MemoryStore::new();
    let links = MockResolver::ok();
    let id = list_with(&store, &[]).await;

    let list = add_item(&store, &links, id, draft("Echo", "https://www.amazon.com/dp/B08N5WRWNW"))
        .await
        .unwrap();

    let item = &list.items[0];
    assert_eq!(item.price_tracking_url.as_deref(), Some("https://keepa.com/#!search/1-B08N5WRWNW"));
    assert!(item.affiliate_url.as_deref().unwrap().contains("tag=t-20"));
    assert_eq!(links.calls(), ["https://www.amazon.com/dp/B08N5WRWNW"]);
}

#[tokio::test]
async fn enrichment_failure_aborts_the_add() {
    let store = MemoryStore::new();
    let id = list_with(&store, &["keep"]).await;

    let err = add_item(&store, &MockResolver::failing(), id, draft("Echo", "https://amzn.to/abc"))
        .await
        .unwrap_err();

    assert!(matches!(err, ItemError::Enrichment(_)));
    assert_eq!(names(&store.get_list(id).await.unwrap().unwrap()), ["keep"]);
}

#[tokio::test]
async fn drafts_are_validated() {
    let store = MemoryStore::new();
    let links = MockResolver::ok();
    let id = list_with(&store, &[]).await;

    assert!(matches!(add_item(&store, &links, id, draft(" ", "")).await, Err(ItemError::InvalidName)));
    assert!(matches!(add_item(&store, &links, id, draft("x", "www.x.com")).await, Err(ItemError::InvalidUrl)));
    assert!(matches!(
        add_item(&store, &links, Uuid::new_v4(), draft("x", "")).await,
        Err(ItemError::ListNotFound(_))
    ));
}

#[tokio::test]
async fn update_keeps_purchased_flag() {
    let store = MemoryStore::new();
    let links = MockResolver::ok();
    let id = list_with(&store, &["a", "b"]).await;
    toggle_purchased(&store, id, 1).await.unwrap();

    let list = update_item(&store, &links, id, 1, ItemDraft { name: "B!".into(), url: String::new(), details: "blue".into() })
        .await
        .unwrap();

    assert_eq!(list.items[1].name, "B!");
    assert_eq!(list.items[1].details, "blue");
    assert!(list.items[1].purchased);
    assert!(matches!(
        update_item(&store, &links, id, 2, draft("c", "")).await,
        Err(ItemError::Index(ItemIndexError::OutOfRange { index: 2, len: 2 }))
    ));
}

// =========================================================================
// index-based mutations
// =========================================================================

#[tokio::test]
async fn delete_toggle_and_move() {
    let store = MemoryStore::new();
    let id = list_with(&store, &["a", "b", "c"]).await;

    let list = move_item(&store, id, 2, MoveDirection::Up).await.unwrap();
    assert_eq!(names(&list), ["a", "c", "b"]);

    let list = toggle_purchased(&store, id, 0).await.unwrap();
    assert!(list.items[0].purchased);

    let list = delete_item(&store, id, 1).await.unwrap();
    assert_eq!(names(&list), ["a", "b"]);
    assert_eq!(store.get_list(id).await.unwrap().unwrap(), list);

    assert!(matches!(move_item(&store, id, 0, MoveDirection::Up).await, Err(ItemError::Index(_))));
    assert!(matches!(delete_item(&store, id, 5).await, Err(ItemError::Index(_))));
}

#[tokio::test]
async fn copy_resets_purchased_on_target() {
    let store = MemoryStore::new();
    let from = list_with(&store, &["a", "b"]).await;
    let to = list_with(&store, &["z"]).await;
    toggle_purchased(&store, from, 1).await.unwrap();

    let target = copy_item(&store, from, 1, to).await.unwrap();

    assert_eq!(names(&target), ["z", "b"]);
    assert!(!target.items[1].purchased);
    // Source untouched.
    assert!(store.get_list(from).await.unwrap().unwrap().items[1].purchased);
}

// =========================================================================
// share intake
// =========================================================================

#[test]
fn share_prefers_explicit_fields() {
    let d = item_from_share(Some("Lamp"), Some("look https://x.io/a"), Some("https://shop.io/lamp")).unwrap();
    assert_eq!(d, draft("Lamp", "https://shop.io/lamp"));
}

#[test]
fn share_recovers_url_from_text() {
    let d = item_from_share(Some("Lamp"), Some("Check this out: https://shop.io/lamp?id=1 so nice"), None).unwrap();
    assert_eq!(d.url, "https://shop.io/lamp?id=1");

    let d = item_from_share(None, Some("see http://a.io/x and https://b.io/y"), None).unwrap();
    assert_eq!(d.url, "http://a.io/x");
    assert_eq!(d.name, "http://a.io/x");
}

#[test]
fn share_without_url_uses_text_as_name() {
    let d = item_from_share(None, Some("  a red bike "), None).unwrap();
    assert_eq!(d, draft("a red bike", ""));
}

#[test]
fn empty_share_is_rejected() {
    assert!(matches!(item_from_share(None, Some("  "), Some("")), Err(ItemError::EmptyShare)));
}
