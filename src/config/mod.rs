pub mod fixtures;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Env var naming the active environment, overriding the file default.
pub const ENV_VAR: &str = "BOOKWRIGHT_ENV";

/// One target environment from the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_timeout() -> u64 {
    10_000
}

fn default_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2_000
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    default_environment: String,
    environments: HashMap<String, Environment>,
}

/// Environment-specific settings, loaded once at startup and passed by
/// reference to whatever builds page objects. Mutable only through
/// [`Settings::switch_environment`].
#[derive(Debug, Clone)]
pub struct Settings {
    environments: HashMap<String, Environment>,
    active: String,
}

impl Settings {
    /// Load from a JSON file. The active environment is taken from
    /// `BOOKWRIGHT_ENV` when set, else the file's `defaultEnvironment`.
    /// Load failure is fatal; the suite cannot run without configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: SettingsFile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        let active = std::env::var(ENV_VAR).unwrap_or_else(|_| file.default_environment.clone());
        Self::from_parts(file.environments, &active)
    }

    pub fn from_parts(environments: HashMap<String, Environment>, active: &str) -> Result<Self> {
        if !environments.contains_key(active) {
            bail!(
                "Unknown environment '{}'; known: {}",
                active,
                known_names(&environments)
            );
        }
        Ok(Self {
            environments,
            active: active.to_string(),
        })
    }

    /// Switch the active environment; errors if the name is unknown and
    /// leaves the current selection in place.
    pub fn switch_environment(&mut self, name: &str) -> Result<()> {
        if !self.environments.contains_key(name) {
            bail!(
                "Unknown environment '{}'; known: {}",
                name,
                known_names(&self.environments)
            );
        }
        self.active = name.to_string();
        Ok(())
    }

    pub fn environment(&self) -> &str {
        &self.active
    }

    fn current(&self) -> &Environment {
        // Guarded by construction: `active` always exists in the map.
        &self.environments[&self.active]
    }

    pub fn base_url(&self) -> &str {
        &self.current().base_url
    }

    pub fn default_timeout_ms(&self) -> u64 {
        self.current().default_timeout_ms
    }

    pub fn retry_attempts(&self) -> u32 {
        self.current().retry_attempts
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.current().retry_delay_ms
    }
}

fn known_names(environments: &HashMap<String, Environment>) -> String {
    let mut names: Vec<&str> = environments.keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names.join(", ")
}
