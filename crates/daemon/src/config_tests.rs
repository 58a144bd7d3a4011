// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jr_core::Capability;
use serial_test::serial;
use tempfile::tempdir;

const ALL_VARS: &[&str] = &[
    env::ROOT,
    env::CONFIG,
    env::INTAKE_DIR,
    env::RESULTS_DIR,
    env::ARCHIVE_DIR,
    env::ENDPOINTS,
    env::CORE_URL,
    env::WORKER_ID,
    env::ENDPOINT,
    env::BACKEND,
    env::DEBOUNCE_MS,
];

fn clear_env() {
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::from_file(dir.path().to_path_buf(), &dir.path().join(CONFIG_FILE)).unwrap();

    assert_eq!(config.root, dir.path());
    assert_eq!(config.sessions.endpoints, vec![DEFAULT_SESSION_ENDPOINT.to_string()]);
    assert_eq!(config.orchestrator.core_url, DEFAULT_CORE_URL);
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(20));
    assert_eq!(config.relay.worker_id, DEFAULT_WORKER_ID);
    assert_eq!(config.relay.debounce_ms, 300);
    assert_eq!(config.relay.capabilities, CapabilitySet::default());
    assert_eq!(config.pool_config(), PoolConfig::default());
}

#[test]
fn file_sections_override_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(
        &path,
        r####"
[paths]
intake = "/srv/jobs"

[sessions]
endpoints = ["http://10.0.0.2:9222", "http://10.0.0.3:9222"]
dispatch_timeout_secs = 60

[orchestrator]
core_url = "http://core:8001"
heartbeat_interval_secs = 5

[relay]
llm_backend = "gemini"
capabilities = [{ kind = "llm_call", cost = 10 }]

[relay.parser]
sentinel = "### RESULT"
"####,
    )
    .unwrap();

    let config = Config::from_file(dir.path().to_path_buf(), &path).unwrap();

    let paths = config.paths();
    assert_eq!(paths.intake, PathBuf::from("/srv/jobs"));
    assert_eq!(paths.results, dir.path().join("out"));
    let endpoints = config.endpoints();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[1], Endpoint::new("browser-2", "http://10.0.0.3:9222"));
    assert_eq!(config.pool_config().dispatch_timeout, Duration::from_secs(60));
    assert_eq!(config.orchestrator_config().base_url, "http://core:8001");
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(5));

    let relay = config.relay_config();
    assert_eq!(relay.llm_backend, "gemini");
    assert_eq!(relay.capabilities, CapabilitySet::new(vec![Capability::new("llm_call", 10)]));
    assert_eq!(relay.parser.sentinel.as_deref(), Some("### RESULT"));
    assert!(relay.parser.auto_detect_lcp);
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(&path, "[relay]\nworkers = 4\n").unwrap();

    let err = Config::from_file(dir.path().to_path_buf(), &path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[yare::parameterized(
    zero = { 0, 1 },
    one = { 1, 1 },
    default = { 20, 20 },
)]
fn intervals_and_timeouts_are_at_least_one_second(secs: u64, expected: u64) {
    let mut config = Config::default();
    config.sessions.health_interval_secs = secs;
    config.sessions.probe_timeout_secs = secs;
    config.sessions.dispatch_timeout_secs = secs;
    config.orchestrator.heartbeat_interval_secs = secs;

    let pool = config.pool_config();
    assert_eq!(pool.health_interval, Duration::from_secs(expected));
    assert_eq!(pool.probe_timeout, Duration::from_secs(expected));
    assert_eq!(pool.dispatch_timeout, Duration::from_secs(expected));
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(expected));
}

#[test]
#[serial]
fn environment_wins_over_file() {
    clear_env();
    std::env::set_var(env::ENDPOINTS, "http://a:9222, ,http://b:9222,");
    std::env::set_var(env::WORKER_ID, "relay-7");
    std::env::set_var(env::BACKEND, "claude");
    std::env::set_var(env::DEBOUNCE_MS, "50");
    std::env::set_var(env::RESULTS_DIR, "/srv/results");

    let mut config = Config::default();
    config.apply_env();
    clear_env();

    assert_eq!(config.sessions.endpoints, vec!["http://a:9222", "http://b:9222"]);
    assert_eq!(config.relay.worker_id, "relay-7");
    assert_eq!(config.relay.llm_backend, "claude");
    assert_eq!(config.relay.debounce_ms, 50);
    assert_eq!(config.paths().results, PathBuf::from("/srv/results"));
}

#[test]
#[serial]
fn unparseable_debounce_is_ignored() {
    clear_env();
    std::env::set_var(env::DEBOUNCE_MS, "soon");

    let mut config = Config::default();
    config.apply_env();
    clear_env();

    assert_eq!(config.relay.debounce_ms, 300);
}

#[test]
#[serial]
fn load_resolves_root_and_config_from_env() {
    clear_env();
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("custom.toml");
    std::fs::write(&config_path, "[orchestrator]\nendpoint = \"http://relay:3000\"\n").unwrap();
    std::env::set_var(env::ROOT, dir.path());
    std::env::set_var(env::CONFIG, &config_path);
    std::env::set_var(env::CORE_URL, "http://core:9000");

    let config = Config::load();
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.root, dir.path());
    assert_eq!(config.orchestrator.endpoint, "http://relay:3000");
    assert_eq!(config.orchestrator.core_url, "http://core:9000");
}
