// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EPIAS transparency platform: real-time consumption.
//!
//! Data calls carry the CAS ticket in a `TGT` header. A `401` is reported as
//! [`GridsyncError::CredentialRejected`] so [`with_credential_retry`] can
//! refresh the ticket and try once more.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use gridsync_auth::{CredentialManager, with_credential_retry};
use gridsync_core::{Credential, FieldValue, GridsyncError, Record, parse_timestamp};
use gridsync_upsert::Collection;

use crate::window::FetchWindow;

pub const CONSUMPTION_COLLECTION: &str = "epias_power_consumption";

/// `epias_power_consumption`, keyed by `datetime`.
pub fn consumption_collection() -> Collection {
    Collection::new(CONSUMPTION_COLLECTION, ["datetime"]).with_timestamp_fields(["datetime"])
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConsumptionRequest<'a> {
    start_date: String,
    end_date: String,
    region_code: &'a str,
}

/// Client for the real-time consumption endpoint.
#[derive(Debug, Clone)]
pub struct EpiasConsumptionClient {
    client: reqwest::Client,
    url: String,
    region_code: String,
}

impl EpiasConsumptionClient {
    pub fn new(
        url: impl Into<String>,
        region_code: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GridsyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("accept-language", HeaderValue::from_static("en"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GridsyncError::Fetch {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: url.into(),
            region_code: region_code.into(),
        })
    }

    /// One POST for `window` using `credential`. No retry.
    pub async fn fetch(
        &self,
        credential: &Credential,
        window: &FetchWindow,
    ) -> Result<Value, GridsyncError> {
        let body = ConsumptionRequest {
            start_date: window.start_text(),
            end_date: window.end_text(),
            region_code: &self.region_code,
        };
        debug!(start = %body.start_date, end = %body.end_date, "requesting consumption");

        let response = self
            .client
            .post(&self.url)
            .header("TGT", credential.token.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| GridsyncError::Fetch {
                message: format!("consumption request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "consumption response received");

        if status == StatusCode::UNAUTHORIZED {
            return Err(GridsyncError::CredentialRejected {
                status: status.as_u16(),
            });
        }
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(GridsyncError::Fetch {
                message: format!("consumption endpoint returned {status}: {}", text.trim()),
                source: None,
            });
        }

        response.json::<Value>().await.map_err(|e| GridsyncError::Fetch {
            message: format!("consumption response is not JSON: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// [`fetch`](Self::fetch) with a ticket from `manager`, refreshing it once
    /// if the endpoint rejects it.
    pub async fn fetch_with_retry(
        &self,
        manager: &CredentialManager,
        window: &FetchWindow,
    ) -> Result<Value, GridsyncError> {
        with_credential_retry(manager, |credential| async move {
            self.fetch(&credential, window).await
        })
        .await
    }
}

/// Turn a consumption payload into records sorted by `datetime`.
///
/// `items[].date` becomes `datetime` and `items[].consumption` becomes
/// `consumption_mwh`; other item fields are dropped. Items that are not
/// objects are skipped.
pub fn normalize_consumption(payload: &Value) -> Result<Vec<Record>, GridsyncError> {
    let items = payload
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| GridsyncError::Normalize("consumption payload has no `items` array".into()))?;

    let mut records: Vec<Record> = Vec::with_capacity(items.len());
    for item in items {
        let Some(object) = item.as_object() else {
            warn!(item = %item, "skipping non-object consumption item");
            continue;
        };

        let mut record = Record::new();
        if let Some(date) = object.get("date") {
            record.insert("datetime", date_value(date));
        }
        if let Some(consumption) = object.get("consumption") {
            record.insert("consumption_mwh", FieldValue::from_json(consumption));
        }
        records.push(record);
    }

    records.sort_by_key(|r| match r.get("datetime") {
        Some(FieldValue::Timestamp(ts)) => Some(*ts),
        _ => None,
    });

    info!(records = records.len(), "normalized consumption payload");
    Ok(records)
}

fn date_value(value: &Value) -> FieldValue {
    match value.as_str().and_then(parse_timestamp) {
        Some(ts) => FieldValue::Timestamp(ts),
        None => FieldValue::from_json(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn items_map_to_datetime_and_consumption() {
        let payload = json!({
            "items": [
                {"date": "2025-01-01T01:00:00+03:00", "time": "01:00", "consumption": 31250.5},
                {"date": "2025-01-01T00:00:00+03:00", "time": "00:00", "consumption": 32000}
            ],
            "page": {"total": 2}
        });

        let records = normalize_consumption(&payload).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.get("datetime"),
            Some(&FieldValue::Timestamp(
                Utc.with_ymd_and_hms(2024, 12, 31, 21, 0, 0).unwrap()
            ))
        );
        assert_eq!(first.get("consumption_mwh"), Some(&FieldValue::Integer(32000)));
        assert!(first.get("time").is_none());
        assert_eq!(records[1].get("consumption_mwh"), Some(&FieldValue::Float(31250.5)));
    }

    #[test]
    fn missing_items_is_a_normalize_error() {
        let err = normalize_consumption(&json!({"page": {}})).unwrap_err();
        assert!(matches!(err, GridsyncError::Normalize(_)));
    }

    #[test]
    fn item_without_date_is_left_for_the_engine_to_reject() {
        let records = normalize_consumption(&json!({"items": [{"consumption": 1}, 7]})).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].get("datetime").is_none());
    }

    #[test]
    fn collection_is_keyed_by_datetime() {
        let collection = consumption_collection();
        assert_eq!(collection.name(), CONSUMPTION_COLLECTION);
        assert_eq!(collection.key_fields(), ["datetime".to_string()]);
        assert!(collection.is_timestamp_field("datetime"));
    }
}
