// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay configuration: `relay.toml` with defaults, then environment
//! overrides.
//!
//! ```toml
//! [sessions]
//! endpoints = ["http://127.0.0.1:9222", "http://127.0.0.1:9223"]
//!
//! [orchestrator]
//! core_url = "http://localhost:8001"
//!
//! [relay]
//! worker_id = "webrelay_worker"
//! debounce_ms = 300
//! capabilities = [{ kind = "llm_call", cost = 25 }]
//! ```

use crate::env;
use jr_adapters::{CdpConfig, Endpoint, OrchestratorConfig, PoolConfig, DEFAULT_BRIDGE};
use jr_core::{CapabilitySet, ParserConfig, WorkerId};
use jr_engine::{IntakeConfig, RelayConfig, DEFAULT_LLM_BACKEND, DEFAULT_WORKER_ID};
use jr_storage::RelayPaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "relay.toml";
pub const DEFAULT_SESSION_ENDPOINT: &str = "http://127.0.0.1:9222";
pub const DEFAULT_CORE_URL: &str = "http://localhost:8001";
pub const DEFAULT_ADVERTISED_ENDPOINT: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine relay root directory; set {}", env::ROOT)]
    NoRoot,
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Relay root; every path not overridden below lives under it.
    #[serde(skip)]
    pub root: PathBuf,
    pub paths: PathsSection,
    pub sessions: SessionsSection,
    pub orchestrator: OrchestratorSection,
    pub relay: RelaySection,
}

/// Overrides for directories that default to the relay root layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub intake: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionsSection {
    pub endpoints: Vec<String>,
    pub bridge: String,
    pub connect_timeout_secs: u64,
    pub dispatch_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub health_interval_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            endpoints: vec![DEFAULT_SESSION_ENDPOINT.to_string()],
            bridge: DEFAULT_BRIDGE.to_string(),
            connect_timeout_secs: CdpConfig::default().connect_timeout.as_secs(),
            dispatch_timeout_secs: pool.dispatch_timeout.as_secs(),
            probe_timeout_secs: pool.probe_timeout.as_secs(),
            health_interval_secs: pool.health_interval.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorSection {
    pub core_url: String,
    /// Address this relay advertises when registering.
    pub endpoint: String,
    pub heartbeat_interval_secs: u64,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            core_url: DEFAULT_CORE_URL.to_string(),
            endpoint: DEFAULT_ADVERTISED_ENDPOINT.to_string(),
            heartbeat_interval_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaySection {
    pub worker_id: String,
    pub llm_backend: String,
    pub debounce_ms: u64,
    pub capabilities: CapabilitySet,
    pub parser: ParserConfig,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            worker_id: DEFAULT_WORKER_ID.to_string(),
            llm_backend: DEFAULT_LLM_BACKEND.to_string(),
            debounce_ms: jr_engine::DEFAULT_DEBOUNCE.as_millis() as u64,
            capabilities: CapabilitySet::default(),
            parser: ParserConfig::default(),
        }
    }
}

impl Config {
    /// Load from `JR_CONFIG` (default `<root>/relay.toml`) and apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let root = env::root_dir().ok_or(ConfigError::NoRoot)?;
        let path = env::config_file().unwrap_or_else(|| root.join(CONFIG_FILE));
        let mut config = Self::from_file(root, &path)?;
        config.apply_env();
        Ok(config)
    }

    /// Read `path` if it exists; a missing file means all defaults.
    pub fn from_file(root: PathBuf, path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str::<Self>(&text)
                .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        config.root = root;
        Ok(config)
    }

    /// Environment variables win over the file.
    pub fn apply_env(&mut self) {
        if let Some(dir) = env::intake_dir() {
            self.paths.intake = Some(dir);
        }
        if let Some(dir) = env::results_dir() {
            self.paths.results = Some(dir);
        }
        if let Some(dir) = env::archive_dir() {
            self.paths.archive = Some(dir);
        }
        if let Some(endpoints) = env::endpoints() {
            self.sessions.endpoints = endpoints;
        }
        if let Some(url) = env::core_url() {
            self.orchestrator.core_url = url;
        }
        if let Some(endpoint) = env::advertised_endpoint() {
            self.orchestrator.endpoint = endpoint;
        }
        if let Some(worker_id) = env::worker_id() {
            self.relay.worker_id = worker_id;
        }
        if let Some(backend) = env::backend() {
            self.relay.llm_backend = backend;
        }
        if let Some(debounce) = env::debounce() {
            self.relay.debounce_ms = debounce.as_millis() as u64;
        }
    }

    /// Directory layout with overrides applied.
    pub fn paths(&self) -> RelayPaths {
        let mut paths = RelayPaths::new(&self.root);
        if let Some(dir) = &self.paths.intake {
            paths.intake = dir.clone();
        }
        if let Some(dir) = &self.paths.results {
            paths.results = dir.clone();
        }
        if let Some(dir) = &self.paths.archive {
            paths.archive = dir.clone();
        }
        paths
    }

    /// Session endpoints, named `browser-N` in list order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        Endpoint::numbered(&self.sessions.endpoints)
    }

    pub fn cdp_config(&self) -> CdpConfig {
        CdpConfig {
            bridge: self.sessions.bridge.clone(),
            connect_timeout: Duration::from_secs(self.sessions.connect_timeout_secs),
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            dispatch_timeout: Duration::from_secs(self.sessions.dispatch_timeout_secs.max(1)),
            probe_timeout: Duration::from_secs(self.sessions.probe_timeout_secs.max(1)),
            health_interval: Duration::from_secs(self.sessions.health_interval_secs.max(1)),
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            worker_id: WorkerId::new(self.relay.worker_id.as_str()),
            llm_backend: self.relay.llm_backend.clone(),
            capabilities: self.relay.capabilities.clone(),
            parser: self.relay.parser.clone(),
        }
    }

    pub fn intake_config(&self, paths: &RelayPaths) -> IntakeConfig {
        IntakeConfig {
            dir: paths.intake.clone(),
            debounce: Duration::from_millis(self.relay.debounce_ms),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(self.orchestrator.core_url.as_str())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.orchestrator.heartbeat_interval_secs.max(1))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
