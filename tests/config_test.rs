//! Configuration loading and validation.

use std::time::Duration;

use camhd::config::{load_config, load_config_or_default, validate_config, Config};

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camhd.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.http.timeout(), Duration::from_secs(30));
    assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
    assert!(!config.http.accept_invalid_certs);
    assert!(config.http.user_agent.starts_with("camhd/"));
    assert_eq!(config.index.samples_per_chunk, 5);
    assert_eq!(config.batch.workers, 0);
    assert!(config.batch.worker_count() >= 1);
    validate_config(&config).unwrap();
}

#[test]
fn test_load_full_config() {
    let (_dir, path) = write_config(
        r#"
[http]
timeout_secs = 120
connect_timeout_secs = 5
accept_invalid_certs = true
user_agent = "camhd-test"

[index]
samples_per_chunk = 6

[batch]
workers = 3
"#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(config.http.timeout(), Duration::from_secs(120));
    assert_eq!(config.http.connect_timeout_secs, 5);
    assert!(config.http.accept_invalid_certs);
    assert_eq!(config.http.user_agent, "camhd-test");
    assert_eq!(config.index.samples_per_chunk, 6);
    assert_eq!(config.batch.worker_count(), 3);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let (_dir, path) = write_config("[http]\ntimeout_secs = 45\n");

    let config = load_config_or_default(Some(&path)).unwrap();
    assert_eq!(config.http.timeout_secs, 45);
    assert_eq!(config.http.connect_timeout_secs, 10);
    assert_eq!(config.index.samples_per_chunk, 5);
}

#[test]
fn test_rejects_invalid_values() {
    let (_dir, path) = write_config("[index]\nsamples_per_chunk = 0\n");
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("samples_per_chunk"));

    let (_dir, path) = write_config("[http]\ntimeout_secs = 0\n");
    assert!(load_config(&path).is_err());
}

#[test]
fn test_load_errors_carry_path() {
    let (_dir, path) = write_config("[http\ntimeout_secs = ");
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));

    let missing = std::path::Path::new("/nonexistent/camhd.toml");
    let err = load_config(missing).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
