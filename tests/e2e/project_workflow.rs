//! Groups kept in the project file travel with the project directory.

use serde_json::Value;

use super::fixture::{E2EFixture, names};

#[test]
fn project_groups_are_shared_through_the_file() {
    let fixture = E2EFixture::new();
    fixture.write("src/lib.rs", "");
    fixture.write("docs/guide.md", "");

    fixture.data(&["group", "new", "Team", "--provider", "project"]);
    fixture.data(&["group", "new", "Code", "--parent", "Team"]);
    fixture.data(&["add", "Code", "src/lib.rs"]);
    fixture.data(&["group", "new", "Mine"]);
    fixture.data(&["add", "Mine", "docs/guide.md"]);

    let raw = std::fs::read_to_string(fixture.root().join(".grove/groups.json")).unwrap();
    let file: Value = serde_json::from_str(&raw).unwrap();
    let records = file["groups"].as_object().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.values().any(|r| r["name"] == "Code" && r["parentId"].is_string()));

    // Moving a personal group into the shared tree moves its record too.
    fixture.data(&["group", "move", "Mine", "--to", "Team"]);
    let raw = std::fs::read_to_string(fixture.root().join(".grove/groups.json")).unwrap();
    let file: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(file["groups"].as_object().unwrap().len(), 3);

    // Dropping the state database leaves the project groups intact.
    for file in ["grove.db", "grove.db-wal", "grove.db-shm"] {
        let _ = std::fs::remove_file(fixture.grove_root().join(file));
    }
    let shown = fixture.data(&["show", "Team"]);
    let team = &shown["groups"][0];
    assert_eq!(team["provider"], "project");
    assert_eq!(names(&serde_json::json!({ "groups": team["children"] })), ["Code", "Mine"]);
    let mine = &team["children"][1];
    assert!(mine["resources"][0].as_str().unwrap().ends_with("guide.md"));

    let listing = fixture.data(&["group", "list"]);
    assert_eq!(names(&listing), ["Code", "Mine", "Team"]);
}
