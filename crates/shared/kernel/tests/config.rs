use cmesh_domain::config::CoreConfig;
use cmesh_kernel::config::load_config;
use std::fs;

#[test]
fn load_config_reads_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.toml");
    fs::write(
        &path,
        r#"
[registry]
url = "ws://localhost:8000"
namespace = "cmesh_test"
timeout_secs = 2

[sync]
key_poll_secs = 20
"#,
    )
    .unwrap();

    let cfg: CoreConfig = load_config(Some(path.with_extension(""))).unwrap();
    assert_eq!(cfg.registry.url, "ws://localhost:8000");
    assert_eq!(cfg.registry.namespace, "cmesh_test");
    assert_eq!(cfg.registry.timeout_secs, 2);
    // Unset sections fall back to defaults.
    assert_eq!(cfg.registry.database, "core");
    assert_eq!(cfg.sync.key_poll_secs, 20);
    assert_eq!(cfg.sync.message_poll_secs, 3);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result: Result<CoreConfig, _> = load_config(Some(dir.path().join("absent")));
    assert!(result.is_err());
}
