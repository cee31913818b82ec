//! Configuration system for warden.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};
use crate::heat::HeatConfig;
use crate::patterns::PatternConfig;
use crate::rule::ParseOptions;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Whether rules may use the `periodic` event.
    pub periodic_allowed: bool,
    /// Heat-point store configuration.
    pub heat: HeatConfig,
    /// Default avatar, invite and media patterns.
    pub patterns: PatternConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            periodic_allowed: true,
            heat: HeatConfig::default(),
            patterns: PatternConfig::default(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> WardenResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| WardenError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| WardenError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| WardenError::Configuration(e.to_string())),
            _ => Err(WardenError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are an
    /// error.
    pub fn from_env() -> WardenResult<Self> {
        let mut config = Self::default();

        if let Some(allowed) = env_var("WARDEN_PERIODIC_ALLOWED")? {
            config.periodic_allowed = allowed;
        }

        // Heat store
        if let Ok(ttl) = std::env::var("WARDEN_HEAT_DEFAULT_TTL_SECS") {
            config.heat.default_ttl_secs = if ttl.trim().is_empty() {
                None
            } else {
                Some(parse_env("WARDEN_HEAT_DEFAULT_TTL_SECS", &ttl)?)
            };
        }
        if let Some(max) = env_var("WARDEN_HEAT_MAX_POINTS")? {
            config.heat.max_points_per_key = max;
        }

        // Patterns
        if let Ok(pattern) = std::env::var("WARDEN_DEFAULT_AVATAR_PATTERN") {
            config.patterns.default_avatar = pattern;
        }
        if let Ok(pattern) = std::env::var("WARDEN_INVITE_PATTERN") {
            config.patterns.invite = pattern;
        }
        if let Ok(extensions) = std::env::var("WARDEN_MEDIA_EXTENSIONS") {
            config.patterns.media_extensions = extensions
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    /// `warden/warden.toml` under the platform config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("warden")
            .join("warden.toml")
    }

    /// Parse options for rules reloaded from storage.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            authored: false,
            periodic_allowed: self.periodic_allowed,
        }
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> WardenConfigBuilder {
        WardenConfigBuilder::default()
    }
}

fn env_var<T: std::str::FromStr>(name: &str) -> WardenResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => parse_env(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> WardenResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| WardenError::Configuration(format!("{name} has an invalid value: {raw}")))
}

/// Builder for WardenConfig.
#[derive(Default)]
pub struct WardenConfigBuilder {
    config: WardenConfig,
}

impl WardenConfigBuilder {
    /// Allow or forbid periodic rules.
    pub fn periodic_allowed(mut self, allowed: bool) -> Self {
        self.config.periodic_allowed = allowed;
        self
    }

    /// Set heat store configuration.
    pub fn heat(mut self, config: HeatConfig) -> Self {
        self.config.heat = config;
        self
    }

    /// Expire points added without a duration after `secs` seconds.
    pub fn heat_default_ttl_secs(mut self, secs: u64) -> Self {
        self.config.heat.default_ttl_secs = Some(secs);
        self
    }

    pub fn max_points_per_key(mut self, max: usize) -> Self {
        self.config.heat.max_points_per_key = max;
        self
    }

    /// Set pattern configuration.
    pub fn patterns(mut self, config: PatternConfig) -> Self {
        self.config.patterns = config;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WardenConfig {
        self.config
    }
}
