use super::*;

fn prefs() -> Preferences<MemoryKv> {
    Preferences::new(MemoryKv::default())
}

fn at(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap()
}

#[test]
fn last_email_round_trips() {
    let mut prefs = prefs();
    assert_eq!(prefs.get_last_email(), None);
    prefs.set_last_email("ann@example.com").unwrap();
    assert_eq!(prefs.get_last_email().as_deref(), Some("ann@example.com"));
}

#[test]
fn recent_lists_sort_newest_first() {
    let mut prefs = prefs();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    prefs.add_recent_list_at(a, at(1_000)).unwrap();
    prefs.add_recent_list_at(b, at(2_000)).unwrap();
    prefs.add_recent_list_at(c, at(3_000)).unwrap();

    assert_eq!(prefs.get_sorted_recent_list_ids(), vec![c, b, a]);

    // Revisiting moves a list to the front.
    prefs.add_recent_list_at(a, at(4_000)).unwrap();
    assert_eq!(prefs.get_sorted_recent_list_ids(), vec![a, c, b]);
}

#[test]
fn unparseable_timestamps_sort_last() {
    let mut prefs = prefs();
    let (good, bad) = (Uuid::new_v4(), Uuid::new_v4());
    let mut raw = BTreeMap::new();
    raw.insert(bad.to_string(), "yesterday".to_owned());
    prefs.write_blob(RECENT_LISTS_KEY, &raw).unwrap();
    prefs.add_recent_list_at(good, at(10)).unwrap();

    assert_eq!(prefs.get_sorted_recent_list_ids(), vec![good, bad]);
}

#[test]
fn foreign_keys_survive_updates() {
    let mut kv = MemoryKv::default();
    let kept = Uuid::new_v4();
    kv.set(
        RECENT_LISTS_KEY,
        format!(r#"{{"{kept}":"2024-01-01T00:00:00Z","legacy-id":"2024-01-02T00:00:00Z"}}"#),
    )
    .unwrap();
    kv.set(SPOILER_CHOICES_KEY, r#"{"legacy-id":true}"#.to_owned()).unwrap();
    let mut prefs = Preferences::new(kv);
    assert_eq!(prefs.get_recent_lists().len(), 2);

    let fresh = Uuid::new_v4();
    prefs.add_recent_list_at(fresh, at(2_000_000_000)).unwrap();
    prefs.set_spoiler_choice(fresh, false).unwrap();

    let recent = prefs.get_recent_lists();
    assert!(recent.contains_key(&kept.to_string()));
    assert!(recent.contains_key("legacy-id"));
    assert_eq!(prefs.get_sorted_recent_list_ids(), vec![fresh, kept]);
    assert_eq!(prefs.get_spoiler_choices().get("legacy-id"), Some(&true));
}

#[test]
fn removing_last_recent_list_leaves_empty_map() {
    let mut prefs = prefs();
    let id = Uuid::new_v4();
    prefs.add_recent_list(id).unwrap();
    prefs.remove_recent_list(id).unwrap();

    assert!(prefs.get_recent_lists().is_empty());
    assert!(prefs.get_sorted_recent_list_ids().is_empty());
}

#[test]
fn removing_absent_entries_does_not_write() {
    let mut prefs = prefs();
    prefs.remove_recent_list(Uuid::new_v4()).unwrap();
    prefs.remove_spoiler_choice(Uuid::new_v4()).unwrap();
    assert_eq!(prefs.kv().writes(), 0);
}

#[test]
fn spoiler_choices() {
    let mut prefs = prefs();
    let id = Uuid::new_v4();
    assert!(!prefs.has_spoiler_choice(id));
    assert_eq!(prefs.get_spoiler_choice(id), None);

    prefs.set_spoiler_choice(id, false).unwrap();
    assert!(prefs.has_spoiler_choice(id));
    assert_eq!(prefs.get_spoiler_choice(id), Some(false));

    prefs.set_spoiler_choice(id, true).unwrap();
    assert_eq!(prefs.get_spoiler_choices().len(), 1);
    assert_eq!(prefs.get_spoiler_choice(id), Some(true));

    prefs.remove_spoiler_choice(id).unwrap();
    assert!(!prefs.has_spoiler_choice(id));
}

#[test]
fn corrupt_blobs_read_as_empty() {
    let mut kv = MemoryKv::default();
    kv.set(RECENT_LISTS_KEY, "{not json".to_owned()).unwrap();
    kv.set(SPOILER_CHOICES_KEY, "[1,2]".to_owned()).unwrap();
    let mut prefs = Preferences::new(kv);

    assert!(prefs.get_recent_lists().is_empty());
    assert!(prefs.get_spoiler_choices().is_empty());

    // A write over a corrupt blob replaces it.
    let id = Uuid::new_v4();
    prefs.set_spoiler_choice(id, true).unwrap();
    assert_eq!(prefs.get_spoiler_choice(id), Some(true));
}

#[test]
fn file_store_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("prefs.json");
    let id = Uuid::new_v4();

    let mut prefs = Preferences::new(FileKv::open(&path));
    prefs.set_last_email("ann@example.com").unwrap();
    prefs.set_spoiler_choice(id, true).unwrap();

    let reopened = Preferences::new(FileKv::open(&path));
    assert_eq!(reopened.get_last_email().as_deref(), Some("ann@example.com"));
    assert_eq!(reopened.get_spoiler_choice(id), Some(true));
}

#[test]
fn file_store_tolerates_garbage_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    fs::write(&path, "garbage").unwrap();

    let prefs = Preferences::new(FileKv::open(&path));
    assert_eq!(prefs.get_last_email(), None);
    assert!(prefs.get_recent_lists().is_empty());
}
