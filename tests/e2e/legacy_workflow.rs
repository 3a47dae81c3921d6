//! A state database written in the old flat layout is upgraded on first use.

use grove::core::make_group_id;
use grove::storage::{KeyValueStore, SqliteStore};
use serde_json::json;

use super::fixture::{E2EFixture, names};

fn seed_legacy(fixture: &E2EFixture) {
    let readme = fixture.write("README.md", "# legacy\n");
    let notes = fixture.write("notes/todo.txt", "- migrate\n");
    let mut store = SqliteStore::open(fixture.grove_root().join("grove.db")).unwrap();
    store
        .set("groupstore", json!({ "g1": "Docs", "g2": "Todo" }))
        .unwrap();
    store
        .set("A-g1", json!([readme.display().to_string()]))
        .unwrap();
    store
        .set("A-g2", json!([notes.display().to_string()]))
        .unwrap();
    store.set("A-orphan", json!(["/gone"])).unwrap();
}

#[test]
fn legacy_groups_are_migrated_once() {
    let fixture = E2EFixture::new();
    seed_legacy(&fixture);

    let shown = fixture.data(&["show"]);
    assert_eq!(names(&shown), ["Docs", "Todo"]);
    assert_eq!(shown["groups"][0]["id"], make_group_id("Docs").as_str());
    let docs = shown["groups"][0]["resources"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert!(docs[0].as_str().unwrap().ends_with("README.md"));

    let store = SqliteStore::open(fixture.grove_root().join("grove.db")).unwrap();
    let keys = store.keys().unwrap();
    assert!(!keys.iter().any(|k| k.starts_with("A-")));
    assert!(!keys.contains(&"groupstore".to_string()));
    assert_eq!(store.get("storeversion").unwrap(), Some(json!(1)));
    drop(store);

    // Edits after the upgrade are not undone by a second start.
    fixture.data(&["group", "remove", "Todo"]);
    let shown = fixture.data(&["show"]);
    assert_eq!(names(&shown), ["Docs"]);
}
