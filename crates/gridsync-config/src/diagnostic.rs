// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment failures rendered as miette diagnostics.
//!
//! Every config struct has defaults, so a parse can only fail on an unknown
//! key or a value of the wrong type. Both point at the offending line of the
//! TOML file when it can be found.

#![allow(unused_assignments)] // emitted by the miette derive

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score above which a valid key is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(gridsync::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same section.
        valid_keys: String,
        #[label("not a gridsync setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// `key` is dotted, e.g. `auth.validity_window_secs`.
    #[error("invalid type for key `{key}`: found {found}")]
    #[diagnostic(code(gridsync::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A parsed value that breaks a cross-field or range rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(gridsync::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(gridsync::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// One diagnostic per failure carried by `err`.
///
/// `toml_sources` holds `(path, content)` for every TOML layer that was
/// merged; spans resolve against the layer figment names, or against the
/// only layer when figment names none.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let mut path: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &path, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    let key = path.join(".");
                    let (span, src) = match path.pop() {
                        Some(field) => locate(&error, &path, &field, toml_sources),
                        None => (None, None),
                    };
                    ConfigError::InvalidType {
                        key,
                        found: actual.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn locate(
    error: &figment::error::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let named_file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = match named_file {
        Some(file) => toml_sources.iter().find(|(path, _)| *path == file),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    source
        .and_then(|(path, content)| {
            let offset = find_key_offset(content, section, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(path, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` inside the `[section]` named by `path[0]`, or
/// before the first header when `path` is empty.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content.get(start..)?.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            break;
        }
        let follows_key = trimmed
            .strip_prefix(field)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c == '=' || c.is_whitespace());
        if follows_key {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }

    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["cas_url", "username", "password", "cache_path"];
        assert_eq!(suggest_key("usrname", valid), Some("username".to_string()));
        assert_eq!(suggest_key("cache_pth", valid), Some("cache_path".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["database_path", "wal_mode"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn key_offset_is_found_within_its_section() {
        let content = "[service]\nusrname = \"a\"\n[auth]\nusrname = \"b\"\n";
        let path = vec!["auth".to_string()];
        let offset = find_key_offset(content, &path, "usrname").unwrap();
        assert_eq!(&content[offset..offset + 7], "usrname");
        assert!(offset > content.find("[auth]").unwrap());
    }

    #[test]
    fn unknown_key_help_lists_valid_keys() {
        let error = ConfigError::UnknownKey {
            key: "cronn".into(),
            suggestion: None,
            valid_keys: "cron, run_on_start".into(),
            span: None,
            src: None,
        };
        assert_eq!(
            error.help().map(|h| h.to_string()).as_deref(),
            Some("valid keys: cron, run_on_start")
        );
    }

    #[test]
    fn invalid_type_shows_found_and_expected() {
        let error = ConfigError::InvalidType {
            key: "auth.validity_window_secs".into(),
            found: "string \"two hours\"".into(),
            expected: "u64".into(),
            span: None,
            src: None,
        };
        assert_eq!(
            error.to_string(),
            "invalid type for key `auth.validity_window_secs`: found string \"two hours\""
        );
        assert_eq!(error.help().map(|h| h.to_string()).as_deref(), Some("expected u64"));
    }
}
