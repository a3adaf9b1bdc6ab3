//! Configuration resolution tests
//!
//! Tests that touch FESTSYNC_ROOT are marked #[serial] so they never race
//! on the process environment.

use fest_common::config::{
    load_toml_config, CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig,
    DEFAULT_DATABASE_FILE, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("festsync"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_cli_arg_wins_over_env() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/festsync-env");

    let resolver = RootFolderResolver::new("test")
        .with_cli_arg(Some(PathBuf::from("/tmp/festsync-cli")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/festsync-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_wins_over_toml() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("festsync.toml");
    std::fs::write(&config_path, "root_folder = \"/tmp/festsync-toml\"\n").unwrap();

    env::set_var(ROOT_FOLDER_ENV, "/tmp/festsync-env");
    let resolver = RootFolderResolver::new("test").with_config_path(Some(config_path.clone()));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/festsync-env"));

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/festsync-toml"));
}

#[test]
#[serial]
fn test_missing_config_falls_back_to_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new("test")
        .with_config_path(Some(PathBuf::from("/nonexistent/festsync.toml")));

    assert_eq!(resolver.load_config(), TomlConfig::default());
    assert_eq!(
        resolver.resolve(),
        CompiledDefaults::for_current_platform().root_folder
    );
}

#[test]
#[serial]
fn test_resolve_with_uses_loaded_config() {
    env::remove_var(ROOT_FOLDER_ENV);
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("festsync.toml");
    std::fs::write(&config_path, "root_folder = \"/tmp/festsync-toml\"\n").unwrap();

    let resolver = RootFolderResolver::new("test").with_config_path(Some(config_path.clone()));
    let config = resolver.load_config();

    // Later edits to the file are not re-read
    std::fs::write(&config_path, "root_folder = [not toml").unwrap();
    assert_eq!(resolver.resolve_with(&config), PathBuf::from("/tmp/festsync-toml"));

    let resolver = resolver.with_cli_arg(Some(PathBuf::from("/tmp/festsync-cli")));
    assert_eq!(resolver.resolve_with(&config), PathBuf::from("/tmp/festsync-cli"));
}

#[test]
fn test_toml_config_parses_logging_and_database_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("festsync.toml");
    std::fs::write(
        &config_path,
        r#"
database_file = "listings.db"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(&config_path).unwrap();
    assert_eq!(config.database_file(), "listings.db");
    assert_eq!(config.logging.level, "debug");
    assert!(config.root_folder.is_none());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("festsync.toml");
    std::fs::write(&config_path, "root_folder = [unclosed").unwrap();

    let result = load_toml_config(&config_path);
    assert!(matches!(result, Err(fest_common::Error::Config(_))));
}

#[test]
fn test_initializer_creates_folder_and_database_path() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join(DEFAULT_DATABASE_FILE));
    assert_eq!(
        initializer.with_database_file("other.db").database_path(),
        root.join("other.db")
    );
}
