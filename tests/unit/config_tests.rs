use std::fs;
use std::path::PathBuf;

use grove::config::{Config, SortOrder, StateBackend};
use grove::test_utils::fixtures::UnitTestFixture;
use grove::test_utils::{TestCase, run_table_tests};

#[test]
fn config_sections_from_toml() -> Result<(), String> {
    let cases = vec![
        TestCase::new(
            "empty",
            "",
            (
                vec!["state".to_string(), "project".to_string()],
                StateBackend::Sqlite,
                SortOrder::FullPath,
                0usize,
            ),
        ),
        TestCase::new(
            "memory with dynamic rules",
            r#"
            [storage]
            providers = ["state", "dynamic", "state"]
            state_backend = "memory"

            [view]
            sort_order = "base_name"

            [[dynamic.groups]]
            name = "Docs"
            pattern = "**/*.md"

            [[dynamic.groups]]
            name = "Tests"
            pattern = "tests/**/*.rs"
            "#,
            (
                vec!["state".to_string(), "dynamic".to_string()],
                StateBackend::Memory,
                SortOrder::BaseName,
                2usize,
            ),
        ),
    ];

    run_table_tests(cases, |raw| {
        let config = Config::from_toml(raw).expect("parse config");
        (
            config.storage.providers,
            config.storage.state_backend,
            config.view.sort_order,
            config.dynamic.groups.len(),
        )
    })
}

#[test]
fn explicit_config_file_is_loaded() {
    let fixture = UnitTestFixture::new();
    let path = fixture.create_file(
        "custom.toml",
        "[storage]\nproviders = [\"project\"]\nproject_file = \"groups.json\"\n",
    );
    let config = Config::load(Some(&path), fixture.path()).unwrap();
    assert_eq!(config.storage.providers, ["project"]);
    assert_eq!(config.storage.project_file, PathBuf::from("groups.json"));
    assert_eq!(config.storage.default_target(), Some("project"));
}

#[test]
fn invalid_values_are_config_errors() {
    for raw in [
        "[view]\nsort_order = \"random\"\n",
        "[storage]\nproviders = []\n",
        "[storage]\nstate_backend = \"redis\"\n",
        "[[dynamic.groups]]\nname = \"\"\npattern = \"*\"\n",
        "not toml at all [",
    ] {
        let err = Config::from_toml(raw).unwrap_err();
        assert_eq!(err.code(), "config", "accepted: {raw}");
    }
}

#[test]
fn broken_explicit_file_names_the_path() {
    let fixture = UnitTestFixture::new();
    let path = fixture.path().join("broken.toml");
    fs::write(&path, "[storage\n").unwrap();
    let err = Config::load(Some(&path), fixture.path()).unwrap_err();
    assert!(err.to_string().contains("broken.toml"));
}
