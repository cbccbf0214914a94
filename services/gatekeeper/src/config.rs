use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

// Gatekeeper configuration sourced from environment variables, with an
// optional YAML override file for deployments that prefer config objects.
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub region_id: String,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    /// Policy evaluation budget in milliseconds. Overrunning it is engine
    /// unavailability, never an implicit allow.
    pub policy_budget_ms: u64,
    /// Audit ledger append timeout in milliseconds.
    pub ledger_timeout_ms: u64,
    /// Cap on entries returned per audit query.
    pub audit_query_limit: u64,
    /// Optional YAML file with a rule set to seed an empty store at startup.
    pub bootstrap_rules_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct GatekeeperConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    region_id: Option<String>,
    policy_budget_ms: Option<u64>,
    ledger_timeout_ms: Option<u64>,
    audit_query_limit: Option<u64>,
    bootstrap_rules_path: Option<String>,
}

impl GatekeeperConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("ARGUS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8443".to_string())
            .parse()
            .with_context(|| "parse ARGUS_BIND")?;
        let metrics_bind = std::env::var("ARGUS_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse ARGUS_METRICS_BIND")?;
        let region_id = std::env::var("ARGUS_REGION_ID").unwrap_or_else(|_| "local".to_string());

        let storage = match std::env::var("ARGUS_STORAGE").as_deref() {
            Ok("postgres") => StorageBackend::Postgres,
            Ok("memory") | Err(_) => StorageBackend::Memory,
            Ok(other) => anyhow::bail!("unknown ARGUS_STORAGE backend: {other}"),
        };
        let postgres = match std::env::var("ARGUS_PG_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_u64("ARGUS_PG_MAX_CONNECTIONS", 16)? as u32,
                acquire_timeout_ms: env_u64("ARGUS_PG_ACQUIRE_TIMEOUT_MS", 2_000)?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            bind_addr,
            metrics_bind,
            region_id,
            storage,
            postgres,
            policy_budget_ms: env_u64("ARGUS_POLICY_BUDGET_MS", 25)?,
            ledger_timeout_ms: env_u64("ARGUS_LEDGER_TIMEOUT_MS", 2_000)?,
            audit_query_limit: env_u64("ARGUS_AUDIT_QUERY_LIMIT", 500)?,
            bootstrap_rules_path: std::env::var("ARGUS_BOOTSTRAP_RULES").ok(),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("ARGUS_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read ARGUS_CONFIG: {path}"))?;
            let override_cfg: GatekeeperConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse gatekeeper config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.region_id {
                config.region_id = value;
            }
            if let Some(value) = override_cfg.policy_budget_ms {
                config.policy_budget_ms = value;
            }
            if let Some(value) = override_cfg.ledger_timeout_ms {
                config.ledger_timeout_ms = value;
            }
            if let Some(value) = override_cfg.audit_query_limit {
                config.audit_query_limit = value;
            }
            if let Some(value) = override_cfg.bootstrap_rules_path {
                config.bootstrap_rules_path = Some(value);
            }
        }
        Ok(config)
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) => value.parse().with_context(|| format!("parse {name}")),
        Err(_) => Ok(default),
    }
}
