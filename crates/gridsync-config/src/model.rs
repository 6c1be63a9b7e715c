// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for gridsync.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level gridsync configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GridsyncConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// CAS ticket authentication and credential caching.
    #[serde(default)]
    pub auth: AuthConfig,

    /// EPİAŞ transparency platform endpoints.
    #[serde(default)]
    pub epias: EpiasConfig,

    /// Electricity Maps endpoints.
    #[serde(default)]
    pub emaps: EmapsConfig,

    /// Record store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scheduled pull settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name used in log output.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "gridsync".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Authentication configuration for the CAS ticket endpoint.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// CAS ticket-granting endpoint.
    #[serde(default = "default_cas_url")]
    pub cas_url: String,

    /// Account user name. `None` requires `GRIDSYNC_AUTH_USERNAME`.
    #[serde(default)]
    pub username: Option<String>,

    /// Account password. `None` requires `GRIDSYNC_AUTH_PASSWORD`.
    #[serde(default)]
    pub password: Option<String>,

    /// Where the current credential is persisted between runs.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// How long an issued ticket is treated as valid.
    #[serde(default = "default_validity_window_secs")]
    pub validity_window_secs: u64,

    /// Margin subtracted from the validity window.
    #[serde(default = "default_safety_buffer_secs")]
    pub safety_buffer_secs: u64,

    /// Timeout for a single ticket request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cas_url: default_cas_url(),
            username: None,
            password: None,
            cache_path: default_cache_path(),
            validity_window_secs: default_validity_window_secs(),
            safety_buffer_secs: default_safety_buffer_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("cas_url", &self.cas_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("cache_path", &self.cache_path)
            .field("validity_window_secs", &self.validity_window_secs)
            .field("safety_buffer_secs", &self.safety_buffer_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_cas_url() -> String {
    "https://giris.epias.com.tr/cas/v1/tickets".to_string()
}

fn default_cache_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("gridsync").join("credential.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("gridsync-credential.json"))
        .to_string_lossy()
        .into_owned()
}

fn default_validity_window_secs() -> u64 {
    7200
}

fn default_safety_buffer_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// EPİAŞ transparency platform configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EpiasConfig {
    /// Real-time consumption export endpoint.
    #[serde(default = "default_consumption_url")]
    pub consumption_url: String,

    /// Region code sent with each request.
    #[serde(default = "default_region_code")]
    pub region_code: String,

    /// Offset used to render request windows, e.g. `+03:00`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for EpiasConfig {
    fn default() -> Self {
        Self {
            consumption_url: default_consumption_url(),
            region_code: default_region_code(),
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_consumption_url() -> String {
    "https://seffaflik.epias.com.tr/electricity-service/v1/consumption/data/realtime-consumption"
        .to_string()
}

fn default_region_code() -> String {
    "TR".to_string()
}

fn default_utc_offset() -> String {
    "+03:00".to_string()
}

/// Electricity Maps configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmapsConfig {
    /// Power breakdown history endpoint (zone query included).
    #[serde(default = "default_power_breakdown_url")]
    pub power_breakdown_url: String,

    /// Carbon intensity history endpoint (zone query included).
    #[serde(default = "default_carbon_history_url")]
    pub carbon_history_url: String,

    /// API token sent as the `auth-token` header. `None` disables both sources.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for EmapsConfig {
    fn default() -> Self {
        Self {
            power_breakdown_url: default_power_breakdown_url(),
            carbon_history_url: default_carbon_history_url(),
            auth_token: None,
        }
    }
}

impl fmt::Debug for EmapsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmapsConfig")
            .field("power_breakdown_url", &self.power_breakdown_url)
            .field("carbon_history_url", &self.carbon_history_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_power_breakdown_url() -> String {
    "https://api.electricitymap.org/v3/power-breakdown/history?zone=TR".to_string()
}

fn default_carbon_history_url() -> String {
    "https://api.electricitymap.org/v3/carbon-intensity/history?zone=TR".to_string()
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("gridsync").join("gridsync.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("gridsync.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Scheduled pull configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Cron expression for `gridsync schedule`.
    #[serde(default = "default_cron")]
    pub cron: String,

    /// Run once immediately when the scheduler starts.
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            run_on_start: default_run_on_start(),
        }
    }
}

fn default_cron() -> String {
    "5 * * * *".to_string()
}

fn default_run_on_start() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GridsyncConfig::default();
        assert_eq!(config.service.name, "gridsync");
        assert_eq!(config.auth.validity_window_secs, 7200);
        assert_eq!(config.auth.safety_buffer_secs, 300);
        assert_eq!(config.epias.region_code, "TR");
        assert_eq!(config.epias.utc_offset, "+03:00");
        assert_eq!(config.schedule.cron, "5 * * * *");
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = GridsyncConfig::default();
        config.auth.password = Some("hunter2".into());
        config.emaps.auth_token = Some("token-123".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("token-123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
