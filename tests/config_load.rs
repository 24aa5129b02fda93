// tests/config_load.rs
//! Config discovery and merge. Env/cwd mutation => serial.

use std::fs;
use std::path::PathBuf;

use changelog_monitor::config::{load_config, ENV_CONFIG_PATH};
use changelog_monitor::{merge_config, validate_config, MonitorConfig, MonitorError};
use serial_test::serial;

struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &std::path::Path) -> Self {
        let prev = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        CwdGuard(prev)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}

const JSON_CFG: &str = r#"{
  "webhooks": {
    "slack": ["https://hooks.slack.test/file"],
    "generic": [{ "url": "https://api.test/hook", "method": "PUT", "headers": { "X-Key": "k" } }]
  },
  "checkInterval": 30,
  "filters": { "categories": ["API"], "excludeKeywords": ["beta"] }
}"#;

const TOML_CFG: &str = r#"
checkInterval = 5
stateFile = "state/monitor.json"

[webhooks]
teams = ["https://teams.test/hook"]

[webhooks.email]
host = "smtp.test"
port = 465
secure = true
from = "monitor@test"
to = ["ops@test"]

[webhooks.email.auth]
user = "u"
pass = "p"
"#;

#[test]
#[serial]
fn explicit_json_path() {
    std::env::remove_var(ENV_CONFIG_PATH);
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("cfg.json");
    fs::write(&p, JSON_CFG).unwrap();

    let cfg = load_config(Some(p.as_path())).unwrap().unwrap();
    assert_eq!(cfg.check_interval, Some(30));
    assert_eq!(cfg.webhooks.slack, vec!["https://hooks.slack.test/file"]);
    assert_eq!(cfg.webhooks.generic[0].headers["X-Key"], "k");
    assert_eq!(
        cfg.filters.unwrap().exclude_keywords,
        Some(vec!["beta".to_string()])
    );
}

#[test]
#[serial]
fn env_var_points_at_toml() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("monitor.toml");
    fs::write(&p, TOML_CFG).unwrap();
    std::env::set_var(ENV_CONFIG_PATH, &p);

    let cfg = load_config(None).unwrap().unwrap();
    std::env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(cfg.interval_minutes(), 5);
    assert_eq!(cfg.state_file, Some(PathBuf::from("state/monitor.json")));
    let email = cfg.webhooks.email.as_ref().unwrap();
    assert!(email.secure);
    assert_eq!(email.auth.as_ref().unwrap().user, "u");
    validate_config(&cfg).unwrap();
}

#[test]
#[serial]
fn env_var_to_missing_file_is_config_error() {
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let err = load_config(None).unwrap_err();
    std::env::remove_var(ENV_CONFIG_PATH);
    assert!(matches!(err, MonitorError::Config(_)));
}

#[test]
#[serial]
fn rc_file_in_cwd_is_discovered() {
    std::env::remove_var(ENV_CONFIG_PATH);
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".changelogmonitorrc"), JSON_CFG).unwrap();
    let _cwd = CwdGuard::enter(dir.path());

    let cfg = load_config(None).unwrap().unwrap();
    assert_eq!(cfg.check_interval, Some(30));
}

#[test]
#[serial]
fn no_config_anywhere_is_none() {
    std::env::remove_var(ENV_CONFIG_PATH);
    let dir = tempfile::tempdir().unwrap();
    let _cwd = CwdGuard::enter(dir.path());
    assert!(load_config(None).unwrap().is_none());
}

#[test]
#[serial]
fn garbage_file_is_config_error() {
    std::env::remove_var(ENV_CONFIG_PATH);
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("cfg.json");
    fs::write(&p, "{ not json").unwrap();
    assert!(matches!(
        load_config(Some(p.as_path())).unwrap_err(),
        MonitorError::Config(_)
    ));
}

#[test]
#[serial]
fn cli_values_merge_over_loaded_file() {
    std::env::remove_var(ENV_CONFIG_PATH);
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("cfg.json");
    fs::write(&p, JSON_CFG).unwrap();
    let file = load_config(Some(p.as_path())).unwrap();

    let mut cli = MonitorConfig::default();
    cli.webhooks.slack = vec!["https://hooks.slack.test/cli".into()];
    cli.dry_run = Some(true);

    let cfg = merge_config(file, cli);
    assert_eq!(
        cfg.webhooks.slack,
        vec!["https://hooks.slack.test/file", "https://hooks.slack.test/cli"]
    );
    // untouched scalars keep the file value
    assert_eq!(cfg.check_interval, Some(30));
    assert!(cfg.is_dry_run());
    assert_eq!(cfg.filters.unwrap().categories, Some(vec!["API".to_string()]));
}
