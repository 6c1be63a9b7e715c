// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Target collection handle.

/// Fields that stores attach to records and that never take part in equality.
pub const DEFAULT_METADATA_FIELDS: &[&str] = &["_id", "created_at", "updated_at"];

/// Describes where a batch goes and how its records are keyed and compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    key_fields: Vec<String>,
    timestamp_fields: Vec<String>,
    metadata_fields: Vec<String>,
}

impl Collection {
    /// A collection keyed by `key_fields`, in order.
    ///
    /// Key fields are treated as timestamps only if also passed to
    /// [`with_timestamp_fields`](Self::with_timestamp_fields).
    pub fn new<I, S>(name: impl Into<String>, key_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            timestamp_fields: Vec::new(),
            metadata_fields: DEFAULT_METADATA_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn with_timestamp_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamp_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the default metadata fields.
    pub fn with_metadata_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    pub fn is_timestamp_field(&self, field: &str) -> bool {
        self.timestamp_fields.iter().any(|f| f == field)
    }

    pub fn is_metadata_field(&self, field: &str) -> bool {
        self.metadata_fields.iter().any(|f| f == field)
    }
}
