// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./gridsync.toml` > `~/.config/gridsync/gridsync.toml` > `/etc/gridsync/gridsync.toml`
//! with environment variable overrides via `GRIDSYNC_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GridsyncConfig;

/// Config sections addressable through `GRIDSYNC_<SECTION>_<KEY>`.
const SECTIONS: &[&str] = &["service", "auth", "epias", "emaps", "storage", "schedule"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/gridsync/gridsync.toml` (system-wide)
/// 3. `~/.config/gridsync/gridsync.toml` (user XDG config)
/// 4. `./gridsync.toml` (local directory)
/// 5. `GRIDSYNC_*` environment variables
pub fn load_config() -> Result<GridsyncConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<GridsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GridsyncConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GridsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GridsyncConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GridsyncConfig::default()))
        .merge(Toml::file("/etc/gridsync/gridsync.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("gridsync/gridsync.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("gridsync.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with an explicit section-to-dot mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `GRIDSYNC_EMAPS_AUTH_TOKEN` maps to `emaps.auth_token`, not `emaps.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("GRIDSYNC_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
