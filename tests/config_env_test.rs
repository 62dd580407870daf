use docpipe::Settings;
use docpipe::config::Transport;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_env_override_with_nested_keys() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    fs::write(
        &config_path,
        r#"
[bridge]
transport = "unix"
socket_path = "/run/host.sock"

[watch]
debounce_ms = 250
"#,
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("DOCPIPE_BRIDGE__TRANSPORT", "none");
        env::set_var("DOCPIPE_CONVERSION__PROGRAM", "pandoc");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("DOCPIPE_BRIDGE__TRANSPORT");
        env::remove_var("DOCPIPE_CONVERSION__PROGRAM");
    }

    assert_eq!(settings.bridge.transport, Transport::None);
    assert_eq!(
        settings.bridge.socket_path.as_deref(),
        Some(std::path::Path::new("/run/host.sock"))
    );
    assert_eq!(settings.conversion.program, "pandoc");
    assert_eq!(settings.watch.debounce_ms, 250);
    // Untouched sections keep their defaults
    assert_eq!(settings.chunking.threshold_chars, 12_000);
}

#[test]
fn test_init_writes_loadable_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
    assert!(path.ends_with(".docpipe/settings.toml"));
    assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
    assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.conversion.extensions, vec!["pdf", "docx", "xlsx", "pptx"]);
    assert!(settings.chunking.validate().is_ok());
}
