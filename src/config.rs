//! Configuration management for Peerpool

use crate::schedule::WeekendPolicy;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "peerpool.db".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed browser origin for the front end, if it is served elsewhere
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Settings for the availability windowing
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Zone that "today", midnight and the day periods are computed in
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default)]
    pub weekend: WeekendPolicy,
    /// Cards shown under "Happening around you"
    #[serde(default = "default_happening_limit")]
    pub happening_limit: usize,
    /// Avatars shown per group before collapsing into "+N"
    #[serde(default = "default_avatar_limit")]
    pub avatar_limit: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            weekend: WeekendPolicy::default(),
            happening_limit: default_happening_limit(),
            avatar_limit: default_avatar_limit(),
        }
    }
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_happening_limit() -> usize {
    4
}

fn default_avatar_limit() -> usize {
    6
}

impl Config {
    /// Load configuration from `PEERPOOL_CONFIG` or peerpool.toml
    pub fn load() -> Result<Self> {
        let path = std::env::var("PEERPOOL_CONFIG").unwrap_or_else(|_| "peerpool.toml".to_string());
        Self::load_from(path)
    }

    /// Load configuration from a specific path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Try to load from file first
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;

            let mut config = Self::parse(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?;

            config.expand_env_vars();
            return Ok(config);
        }

        // Fall back to environment variables only
        Self::from_env()
    }

    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration entirely from environment variables
    pub fn from_env() -> Result<Self> {
        let timezone = match std::env::var("PEERPOOL_TIMEZONE") {
            Ok(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Invalid PEERPOOL_TIMEZONE {}: {}", name, e))?,
            Err(_) => default_timezone(),
        };

        let weekend = match std::env::var("PEERPOOL_WEEKEND").ok().as_deref().map(str::trim) {
            None | Some("") | Some("next") => WeekendPolicy::Next,
            Some("current") => WeekendPolicy::Current,
            Some(other) => anyhow::bail!("Invalid PEERPOOL_WEEKEND {}: expected next or current", other),
        };

        Ok(Config {
            database: DatabaseConfig {
                path: std::env::var("PEERPOOL_DATABASE_PATH").unwrap_or_else(|_| default_db_path()),
            },
            server: ServerConfig {
                host: std::env::var("PEERPOOL_HOST").unwrap_or_else(|_| default_host()),
                port: std::env::var("PEERPOOL_PORT")
                    .unwrap_or_else(|_| default_port().to_string())
                    .parse()
                    .unwrap_or(default_port()),
                cors_origin: std::env::var("PEERPOOL_CORS_ORIGIN").ok(),
            },
            schedule: ScheduleConfig {
                timezone,
                weekend,
                happening_limit: std::env::var("PEERPOOL_HAPPENING_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default_happening_limit()),
                avatar_limit: std::env::var("PEERPOOL_AVATAR_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default_avatar_limit()),
            },
        })
    }

    /// Expand ${VAR} patterns in string fields
    fn expand_env_vars(&mut self) {
        self.database.path = expand_env(&self.database.path);
        if let Some(ref mut origin) = self.server.cors_origin {
            *origin = expand_env(origin);
        }
    }
}

/// Expand ${VAR} patterns in a string
fn expand_env(s: &str) -> String {
    let mut result = s.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let replacement = std::env::var(var_name).unwrap_or_default();
            result = format!("{}{}{}", &result[..start], replacement, &result[start + end + 1..]);
        } else {
            break;
        }
    }

    result
}
