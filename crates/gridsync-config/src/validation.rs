// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, cron syntax, and the credential timing relationship.

use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::GridsyncConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &GridsyncConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` is not one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    for (key, value) in [
        ("auth.cache_path", &config.auth.cache_path),
        ("storage.database_path", &config.storage.database_path),
        ("epias.region_code", &config.epias.region_code),
    ] {
        if value.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        }
    }

    for (key, value) in [
        ("auth.cas_url", &config.auth.cas_url),
        ("epias.consumption_url", &config.epias.consumption_url),
        ("emaps.power_breakdown_url", &config.emaps.power_breakdown_url),
        ("emaps.carbon_history_url", &config.emaps.carbon_history_url),
    ] {
        if !is_http_url(value) {
            fail(format!("{key} `{value}` must be an http:// or https:// URL"));
        }
    }

    if config.auth.validity_window_secs == 0 {
        fail("auth.validity_window_secs must be greater than zero".to_string());
    }

    if config.auth.safety_buffer_secs >= config.auth.validity_window_secs {
        fail(format!(
            "auth.safety_buffer_secs ({}) must be less than auth.validity_window_secs ({})",
            config.auth.safety_buffer_secs, config.auth.validity_window_secs
        ));
    }

    if config.auth.request_timeout_secs == 0 {
        fail("auth.request_timeout_secs must be greater than zero".to_string());
    }

    if offset_is_invalid(&config.epias.utc_offset) {
        fail(format!(
            "epias.utc_offset `{}` must look like +03:00",
            config.epias.utc_offset
        ));
    }

    if let Err(err) = croner::Cron::from_str(&config.schedule.cron) {
        fail(format!(
            "schedule.cron `{}` is not a valid cron expression: {err}",
            config.schedule.cron
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

/// Accepts `+HH:MM` / `-HH:MM` with hours below 24 and minutes below 60.
fn offset_is_invalid(offset: &str) -> bool {
    let bytes = offset.as_bytes();
    if bytes.len() != 6 || !(bytes[0] == b'+' || bytes[0] == b'-') || bytes[3] != b':' {
        return true;
    }
    let hours = offset.get(1..3).and_then(|h| h.parse::<u8>().ok());
    let minutes = offset.get(4..6).and_then(|m| m.parse::<u8>().ok());
    !matches!((hours, minutes), (Some(h), Some(m)) if h < 24 && m < 60)
}
