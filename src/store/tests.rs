use std::collections::BTreeSet;

use super::*;

/// Both implementations, so shared behavior is checked against each.
fn stores() -> Vec<(&'static str, Box<dyn ItemStore>)> {
    let sqlite: Box<dyn ItemStore> =
        Box::new(SqliteItemStore::in_memory().expect("failed to create in-memory store"));
    let memory: Box<dyn ItemStore> = Box::new(MemoryItemStore::new());
    vec![("sqlite", sqlite), ("memory", memory)]
}

fn tag_set(item: &Item) -> BTreeSet<String> {
    item.tags.iter().map(|t| t.to_ascii_lowercase()).collect()
}

fn set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_ascii_lowercase()).collect()
}

fn count(store: &SqliteItemStore, sql: &str) -> i64 {
    store
        .database()
        .connection()
        .unwrap()
        .query_row(sql, [], |row| row.get(0))
        .unwrap()
}

// --- Shared behavior ---

#[test]
fn write_assigns_new_id_and_timestamp() {
    for (name, mut store) in stores() {
        let first = store.write(Item::new("one", "body", ["a"])).unwrap();
        let second = store.write(Item::new("two", "body", ["a"])).unwrap();

        let first_id = first.id.expect("id should be assigned");
        let second_id = second.id.expect("id should be assigned");
        assert_ne!(first_id, second_id, "{name}");
        assert!(first.timestamp.is_some(), "{name}");
    }
}

#[test]
fn rewriting_an_item_updates_instead_of_duplicating() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("draft", "v1", ["notes"])).unwrap();

        let mut edited = item.clone();
        edited.title = "final".to_string();
        edited.content = "v2".to_string();
        let edited = store.write(edited).unwrap();

        assert_eq!(edited.id, item.id, "{name}");
        let found = store.read(&["notes"]).unwrap();
        assert_eq!(found.len(), 1, "{name}");
        assert_eq!(found[0].title, "final", "{name}");
        assert_eq!(found[0].content, "v2", "{name}");
    }
}

#[test]
fn read_returns_full_tag_set_whichever_tag_matched() {
    for (name, mut store) in stores() {
        store.write(Item::new("t", "c", ["a", "b"])).unwrap();

        for query in ["a", "b"] {
            let found = store.read(&[query]).unwrap();
            assert_eq!(found.len(), 1, "{name} query {query}");
            assert_eq!(tag_set(&found[0]), set(&["a", "b"]), "{name} query {query}");
        }
    }
}

#[test]
fn tag_identity_ignores_case() {
    for (name, mut store) in stores() {
        store.write(Item::new("first", "c", ["Work"])).unwrap();
        store.write(Item::new("second", "c", ["work"])).unwrap();

        store.write(Item::new("third", "c", ["Über"])).unwrap();
        store.write(Item::new("fourth", "c", ["über"])).unwrap();

        assert_eq!(store.tags().unwrap(), vec!["Work", "Über"], "{name}");
        assert_eq!(store.read(&["WORK"]).unwrap().len(), 2, "{name}");
        assert_eq!(store.read(&["ÜBER"]).unwrap().len(), 2, "{name}");
    }
}

#[test]
fn multi_word_tags_survive_the_trash_snapshot() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("chores", "c", ["to do", "home"])).unwrap();
        assert_eq!(item.tags, vec!["to-do", "home"], "{name}");
        assert_eq!(store.read(&["To Do"]).unwrap().len(), 1, "{name}");

        let snapshot = store.trash(&item).unwrap();
        assert_eq!(snapshot.tags, "to-do home", "{name}");
        assert_eq!(snapshot.tag_list(), vec!["to-do", "home"], "{name}");
    }
}

#[test]
fn update_reconciles_tag_set() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("t", "c", ["a", "b", "c"])).unwrap();

        let mut edited = item.clone();
        edited.tags = vec!["b".into(), "c".into(), "d".into()];
        let id = store.write(edited).unwrap().id.unwrap();

        let stored = store.get(id).unwrap().expect("item should exist");
        assert_eq!(tag_set(&stored), set(&["b", "c", "d"]), "{name}");
        assert!(store.read(&["a"]).unwrap().is_empty(), "{name}");
        assert_eq!(store.read(&["d"]).unwrap().len(), 1, "{name}");
    }
}

#[test]
fn update_with_different_case_keeps_existing_link() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("t", "c", ["Rust"])).unwrap();

        let mut edited = item.clone();
        edited.tags = vec!["RUST".into()];
        let id = store.write(edited).unwrap().id.unwrap();

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.tags, vec!["Rust"], "{name}");
    }
}

#[test]
fn update_to_no_tags_removes_every_link() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("t", "c", ["a", "b"])).unwrap();

        let mut edited = item.clone();
        edited.tags.clear();
        let id = store.write(edited).unwrap().id.unwrap();

        assert!(store.get(id).unwrap().unwrap().tags.is_empty(), "{name}");
        assert!(store.read(&["a", "b"]).unwrap().is_empty(), "{name}");
        // Tag rows are never deleted.
        assert_eq!(store.tags().unwrap().len(), 2, "{name}");
    }
}

#[test]
fn empty_tag_query_returns_nothing() {
    for (name, mut store) in stores() {
        store.write(Item::new("t", "c", ["a"])).unwrap();

        assert!(store.read(&[]).unwrap().is_empty(), "{name}");
        assert!(store.read(&["  "]).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn read_deduplicates_items_matching_several_tags() {
    for (name, mut store) in stores() {
        store.write(Item::new("t", "c", ["a", "b"])).unwrap();
        store.write(Item::new("u", "c", ["b"])).unwrap();
        store.write(Item::new("v", "c", ["z"])).unwrap();

        let found = store.read(&["a", "b"]).unwrap();
        let titles: BTreeSet<&str> = found.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(found.len(), 2, "{name}");
        assert_eq!(titles, BTreeSet::from(["t", "u"]), "{name}");
    }
}

#[test]
fn duplicate_tags_in_input_are_tolerated() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("t", "c", ["a", "A", " a ", ""])).unwrap();

        assert_eq!(item.tags, vec!["a"], "{name}");
        let stored = store.get(item.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.tags, vec!["a"], "{name}");
    }
}

#[test]
fn trashed_item_is_never_read_again() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("gone", "c", ["a", "b"])).unwrap();
        let kept = store.write(Item::new("kept", "c", ["b"])).unwrap();

        let snapshot = store.trash(&item).unwrap();
        assert_eq!(snapshot.title, "gone", "{name}");
        assert_eq!(snapshot.tags, "a b", "{name}");

        assert!(store.read(&["a"]).unwrap().is_empty(), "{name}");
        let found = store.read(&["b"]).unwrap();
        assert_eq!(found.len(), 1, "{name}");
        assert_eq!(found[0].id, kept.id, "{name}");
        assert_eq!(store.get(item.id.unwrap()).unwrap(), None, "{name}");

        // Tags outlive the items that used them.
        assert_eq!(store.tags().unwrap(), vec!["a", "b"], "{name}");
    }
}

#[test]
fn trash_keeps_snapshot_of_encrypted_flag() {
    for (name, mut store) in stores() {
        let mut item = Item::new("secret", "ciphertext", ["vault"]);
        item.encrypted = true;
        let item = store.write(item).unwrap();

        store.trash(&item).unwrap();

        let trashed = store.trashed().unwrap();
        assert_eq!(trashed.len(), 1, "{name}");
        assert!(trashed[0].encrypted, "{name}");
        assert_eq!(trashed[0].tag_list(), vec!["vault"], "{name}");
    }
}

#[test]
fn trashed_lists_newest_first() {
    for (name, mut store) in stores() {
        let first = store.write(Item::new("first", "c", ["a"])).unwrap();
        let second = store.write(Item::new("second", "c", ["a"])).unwrap();

        store.trash(&first).unwrap();
        store.trash(&second).unwrap();

        let titles: Vec<String> = store
            .trashed()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"], "{name}");
    }
}

#[test]
fn trash_twice_is_not_found() {
    for (name, mut store) in stores() {
        let item = store.write(Item::new("t", "c", ["a"])).unwrap();
        store.trash(&item).unwrap();

        let err = store.trash(&item).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{name}: {err}");
    }
}

#[test]
fn trash_of_unsaved_item_is_rejected() {
    for (name, mut store) in stores() {
        let err = store.trash(&Item::new("t", "c", ["a"])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidItem(_)), "{name}: {err}");
    }
}

#[test]
fn blank_title_or_content_is_rejected() {
    for (name, mut store) in stores() {
        let err = store.write(Item::new("  ", "c", ["a"])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidItem(_)), "{name}");

        let err = store.write(Item::new("t", "", ["a"])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidItem(_)), "{name}");

        assert!(store.tags().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn updating_missing_item_is_not_found() {
    for (name, mut store) in stores() {
        let ghost = ItemBuilder::new()
            .id(ItemId::new(404))
            .title("t")
            .content("c")
            .tags(vec!["a".into()])
            .build();

        let err = store.write(ghost).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == ItemId::new(404)), "{name}");
        assert!(store.tags().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn ids_are_not_reused_after_trash() {
    for (name, mut store) in stores() {
        let first = store.write(Item::new("t", "c", ["a"])).unwrap();
        store.trash(&first).unwrap();

        let second = store.write(Item::new("u", "c", ["a"])).unwrap();
        assert_ne!(second.id, first.id, "{name}");
    }
}

#[test]
fn encrypted_flag_round_trips() {
    for (name, mut store) in stores() {
        let mut item = Item::new("t", "ciphertext", ["a"]);
        item.encrypted = true;
        let id = store.write(item).unwrap().id.unwrap();

        assert!(store.get(id).unwrap().unwrap().encrypted, "{name}");
    }
}

// --- SQLite storage details ---

#[test]
fn case_variants_share_one_tag_row() {
    let mut store = SqliteItemStore::in_memory().unwrap();
    store.write(Item::new("one", "c", ["Work"])).unwrap();
    store.write(Item::new("two", "c", ["work"])).unwrap();

    store.write(Item::new("three", "c", ["Ärger"])).unwrap();
    store.write(Item::new("four", "c", ["ÄRGER"])).unwrap();

    assert_eq!(count(&store, "SELECT COUNT(*) FROM tags"), 2);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM item_tags"), 4);
}

#[test]
fn update_keeps_unchanged_links_and_creates_no_duplicates() {
    let mut store = SqliteItemStore::in_memory().unwrap();
    let item = store.write(Item::new("t", "c", ["a", "b", "c"])).unwrap();

    let link_ids = |store: &SqliteItemStore| -> Vec<(String, i64)> {
        let conn = store.database().connection().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT t.title, it.id FROM item_tags it JOIN tags t ON t.id = it.tag_id
                 ORDER BY t.title",
            )
            .unwrap();
        stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    };
    let before = link_ids(&store);

    let mut edited = item.clone();
    edited.tags = vec!["b".into(), "c".into(), "d".into()];
    store.write(edited).unwrap();
    let after = link_ids(&store);

    let titles: Vec<&str> = after.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(titles, vec!["b", "c", "d"]);
    assert_eq!(after[0], before[1], "link to b should be untouched");
    assert_eq!(after[1], before[2], "link to c should be untouched");
}

#[test]
fn trash_removes_links_but_keeps_tags() {
    let mut store = SqliteItemStore::in_memory().unwrap();
    let item = store.write(Item::new("t", "c", ["a", "b"])).unwrap();

    store.trash(&item).unwrap();

    assert_eq!(count(&store, "SELECT COUNT(*) FROM items"), 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM item_tags"), 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM tags"), 2);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM trash_items"), 1);
}

#[test]
fn failed_update_leaves_previous_state() {
    let mut store = SqliteItemStore::in_memory().unwrap();
    let item = store.write(Item::new("original", "first body", ["a", "b"])).unwrap();

    // Fail during tag reconciliation, after the item row has been updated.
    store
        .database()
        .connection()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER fail_on_boom BEFORE INSERT ON tags
             WHEN NEW.title = 'boom'
             BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
        )
        .unwrap();

    let mut edited = item.clone();
    edited.title = "changed".to_string();
    edited.content = "second body".to_string();
    edited.tags = vec!["b".into(), "c".into(), "boom".into()];

    let err = store.write(edited).unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)));
    assert!(err.to_string().contains("simulated failure"));

    let stored = store.get(item.id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.title, "original");
    assert_eq!(stored.content, "first body");
    assert_eq!(tag_set(&stored), set(&["a", "b"]));
    assert_eq!(store.tags().unwrap(), vec!["a", "b"]);
}

#[test]
fn closed_store_reports_storage_unavailable() {
    let mut store = SqliteItemStore::in_memory().unwrap();
    store.close().unwrap();
    store.close().unwrap();

    let err = store.read(&["a"]).unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));
    let err = store.write(Item::new("t", "c", ["a"])).unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));
}
