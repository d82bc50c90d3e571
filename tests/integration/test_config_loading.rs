use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use switchyard::core::config::ConfigLoader;
use switchyard::logging::{ConsoleOutput, LoggingConfig};
use tempfile::TempDir;

fn clear_switchyard_env() {
    for v in &[
        "SWITCHYARD_STATE_DIR",
        "SWITCHYARD_DEFINITIONS_DIR",
        "SWITCHYARD_LOG_LEVEL",
        "SWITCHYARD_LOG_DIR",
        "SWITCHYARD_LOG_CONSOLE",
    ] {
        env::remove_var(v);
    }
}

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_loading_integration() {
    clear_switchyard_env();
    let temp_dir = TempDir::new().unwrap();
    let workspace_path = temp_dir.path();

    let config_content = r#"
[engine]
state_dir = "var/state"
definitions_dir = "/etc/switchyard/workflows"

[logging]
default_level = "switchyard=debug"
log_dir = "var/log"
console_output = "none"
"#;
    fs::write(workspace_path.join("switchyard.toml"), config_content).unwrap();

    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();

    assert_eq!(
        config.resolve_state_dir(workspace_path),
        workspace_path.join("var/state")
    );
    assert_eq!(
        config.resolve_definitions_dir(workspace_path),
        PathBuf::from("/etc/switchyard/workflows")
    );

    let logging = LoggingConfig::from_settings(&config.logging, Some(workspace_path)).unwrap();
    assert_eq!(logging.default_level, "switchyard=debug");
    assert_eq!(logging.log_dir, Some(workspace_path.join("var/log")));
    assert_eq!(logging.console_output, ConsoleOutput::None);
}

#[test]
#[serial]
fn test_env_overrides_take_precedence_over_file() {
    clear_switchyard_env();
    let temp_dir = TempDir::new().unwrap();
    let workspace_path = temp_dir.path();
    fs::write(
        workspace_path.join("switchyard.toml"),
        "[engine]\nstate_dir = \"from-file\"\n",
    )
    .unwrap();

    env::set_var("SWITCHYARD_STATE_DIR", "/tmp/from-env");
    env::set_var("SWITCHYARD_DEFINITIONS_DIR", "flows");
    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();
    clear_switchyard_env();

    assert_eq!(config.engine.state_dir, PathBuf::from("/tmp/from-env"));
    assert_eq!(
        config.resolve_definitions_dir(workspace_path),
        workspace_path.join("flows")
    );
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_switchyard_env();
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();

    assert_eq!(config.engine.state_dir, PathBuf::from(".switchyard/state"));
    assert_eq!(
        config.engine.definitions_dir,
        PathBuf::from(".switchyard/workflows")
    );
    let logging = LoggingConfig::from_settings(&config.logging, Some(temp_dir.path())).unwrap();
    assert_eq!(logging, LoggingConfig::default());
}

#[test]
#[serial]
fn test_empty_state_dir_is_rejected() {
    clear_switchyard_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("switchyard.toml"),
        "[engine]\nstate_dir = \"\"\n",
    )
    .unwrap();

    assert!(ConfigLoader::load_from_workspace(temp_dir.path()).is_err());
}

#[test]
#[serial]
fn test_invalid_console_output_in_env_is_rejected() {
    clear_switchyard_env();
    env::set_var("SWITCHYARD_LOG_CONSOLE", "syslog");
    let result = LoggingConfig::from_settings(&Default::default(), None);
    clear_switchyard_env();

    assert!(result.is_err());
}
