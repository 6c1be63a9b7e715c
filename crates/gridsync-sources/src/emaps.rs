// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Electricity Maps: power breakdown and carbon intensity history.
//!
//! These endpoints use a static `auth-token` header, so there is no ticket to
//! refresh and every non-success status is a plain fetch failure.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use gridsync_core::{FieldValue, GridsyncError, Record, parse_timestamp};
use gridsync_upsert::Collection;

pub const POWER_COLLECTION: &str = "power_data";
pub const CARBON_COLLECTION: &str = "carbon_intensity";

const FOSSIL_SOURCES: &[&str] = &["coal", "gas", "oil"];
const RENEWABLE_SOURCES: &[&str] = &["wind", "solar", "hydro", "biomass", "geothermal"];

/// `power_data`, keyed by `(datetime, zone)`.
pub fn power_collection() -> Collection {
    Collection::new(POWER_COLLECTION, ["datetime", "zone"]).with_timestamp_fields(["datetime"])
}

/// `carbon_intensity`, keyed by `(datetime, zone)`.
pub fn carbon_collection() -> Collection {
    Collection::new(CARBON_COLLECTION, ["datetime", "zone"])
        .with_timestamp_fields(["datetime", "updatedAt", "createdAt"])
}

/// Client for the two history endpoints.
#[derive(Clone)]
pub struct EmapsClient {
    client: reqwest::Client,
    power_breakdown_url: String,
    carbon_history_url: String,
}

impl EmapsClient {
    pub fn new(
        power_breakdown_url: impl Into<String>,
        carbon_history_url: impl Into<String>,
        auth_token: Option<&SecretString>,
        timeout: Duration,
    ) -> Result<Self, GridsyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = auth_token {
            let mut value = HeaderValue::from_str(token.expose_secret())
                .map_err(|e| GridsyncError::Config(format!("invalid auth token header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert("auth-token", value);
        }

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
            power_breakdown_url: power_breakdown_url.into(),
            carbon_history_url: carbon_history_url.into(),
        })
    }

    pub async fn fetch_power_breakdown(&self) -> Result<Value, GridsyncError> {
        self.get(&self.power_breakdown_url).await
    }

    pub async fn fetch_carbon_intensity(&self) -> Result<Value, GridsyncError> {
        self.get(&self.carbon_history_url).await
    }

    async fn get(&self, url: &str) -> Result<Value, GridsyncError> {
        let response = self.client.get(url).send().await.map_err(|e| GridsyncError::Fetch {
            message: format!("request to {url} failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(status = %status, url, "history response received");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GridsyncError::Fetch {
                message: format!("{url} returned {status}: {}", text.trim()),
                source: None,
            });
        }

        response.json::<Value>().await.map_err(|e| GridsyncError::Fetch {
            message: format!("response from {url} is not JSON: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

impl std::fmt::Debug for EmapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmapsClient")
            .field("power_breakdown_url", &self.power_breakdown_url)
            .field("carbon_history_url", &self.carbon_history_url)
            .finish_non_exhaustive()
    }
}

fn history(payload: &Value) -> Result<&Vec<Value>, GridsyncError> {
    payload
        .get("history")
        .and_then(Value::as_array)
        .ok_or_else(|| GridsyncError::Normalize("payload has no `history` array".into()))
}

fn entries(payload: &Value) -> Result<impl Iterator<Item = &Map<String, Value>>, GridsyncError> {
    Ok(history(payload)?.iter().filter_map(|entry| {
        let object = entry.as_object();
        if object.is_none() {
            warn!(entry = %entry, "skipping non-object history entry");
        }
        object
    }))
}

fn copy_field(record: &mut Record, entry: &Map<String, Value>, field: &str) {
    record.insert(field, entry.get(field).map(FieldValue::from_json).unwrap_or(FieldValue::Null));
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn number_or_zero(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

/// Flatten a power breakdown payload.
///
/// Each `history[]` entry becomes one record with `production_<source>` for
/// every source in `powerProductionBreakdown` (null becomes 0), the fossil
/// and renewable totals, total generation, and the two shares rounded to two
/// decimals (0 when nothing was generated).
pub fn normalize_power_breakdown(payload: &Value) -> Result<Vec<Record>, GridsyncError> {
    let empty = Map::new();
    let mut records = Vec::new();

    for entry in entries(payload)? {
        let mut record = Record::new();
        copy_field(&mut record, entry, "datetime");
        copy_field(&mut record, entry, "zone");
        copy_field(&mut record, entry, "powerConsumptionTotal");

        let breakdown = entry
            .get("powerProductionBreakdown")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        for (source, value) in breakdown {
            let value = match value {
                Value::Null => FieldValue::Integer(0),
                other => FieldValue::from_json(other),
            };
            record.insert(format!("production_{source}"), value);
        }

        let fossil: f64 = FOSSIL_SOURCES.iter().map(|s| number_or_zero(breakdown.get(*s))).sum();
        let renewable: f64 = RENEWABLE_SOURCES
            .iter()
            .map(|s| number_or_zero(breakdown.get(*s)))
            .sum();
        let total: f64 = breakdown.values().map(|v| number_or_zero(Some(v))).sum();

        record.insert("fossil_total", fossil);
        record.insert("renewable_total", renewable);
        record.insert("total_generation", total);
        let (percent_renewable, percent_fossil) = if total > 0.0 {
            (round2(100.0 * renewable / total), round2(100.0 * fossil / total))
        } else {
            (0.0, 0.0)
        };
        record.insert("percent_renewable", percent_renewable);
        record.insert("percent_fossil", percent_fossil);

        records.push(record);
    }

    info!(records = records.len(), "normalized power breakdown payload");
    Ok(records)
}

/// Intensity band in gCO2eq/kWh.
pub fn carbon_level(intensity: f64) -> &'static str {
    if intensity < 200.0 {
        "Low"
    } else if intensity < 400.0 {
        "Medium"
    } else if intensity < 600.0 {
        "High"
    } else {
        "Very High"
    }
}

/// Flatten a carbon intensity payload.
///
/// The top-level `zone` and `temporalGranularity` are copied into every
/// entry. Adds `carbon_level` and `hours_since_update` (`updatedAt` minus
/// `datetime`, two decimals, null unless both parse).
pub fn normalize_carbon_intensity(payload: &Value) -> Result<Vec<Record>, GridsyncError> {
    let zone = payload.get("zone").cloned().unwrap_or(Value::Null);
    let granularity = payload.get("temporalGranularity").cloned().unwrap_or(Value::Null);
    let mut records = Vec::new();

    for entry in entries(payload)? {
        let mut record = Record::new();
        for field in [
            "datetime",
            "carbonIntensity",
            "updatedAt",
            "createdAt",
            "emissionFactorType",
            "isEstimated",
            "estimationMethod",
        ] {
            copy_field(&mut record, entry, field);
        }
        record.insert("zone", FieldValue::from_json(&zone));
        record.insert("temporalGranularity", FieldValue::from_json(&granularity));

        let intensity = number_or_zero(entry.get("carbonIntensity"));
        record.insert("carbon_level", carbon_level(intensity));
        record.insert("hours_since_update", hours_since_update(entry));

        records.push(record);
    }

    info!(records = records.len(), "normalized carbon intensity payload");
    Ok(records)
}

fn hours_since_update(entry: &Map<String, Value>) -> Option<f64> {
    let parse = |field: &str| entry.get(field).and_then(Value::as_str).and_then(parse_timestamp);
    let updated = parse("updatedAt")?;
    let measured = parse("datetime")?;
    let millis = (updated - measured).num_milliseconds() as f64;
    Some(round2(millis / 3_600_000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn breakdown_totals_and_shares() {
        let payload = json!({
            "zone": "TR",
            "history": [{
                "datetime": "2025-01-01T00:00:00.000Z",
                "zone": "TR",
                "powerConsumptionTotal": 30000,
                "powerProductionBreakdown": {
                    "coal": 10000, "gas": 5000, "oil": null,
                    "wind": 3000, "solar": 0, "hydro": 2000,
                    "nuclear": 0, "unknown": 1000
                }
            }]
        });

        let records = normalize_power_breakdown(&payload).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.get("production_coal"), Some(&FieldValue::Integer(10000)));
        assert_eq!(r.get("production_oil"), Some(&FieldValue::Integer(0)));
        assert_eq!(r.get("fossil_total"), Some(&FieldValue::Float(15000.0)));
        assert_eq!(r.get("renewable_total"), Some(&FieldValue::Float(5000.0)));
        assert_eq!(r.get("total_generation"), Some(&FieldValue::Float(21000.0)));
        assert_eq!(r.get("percent_renewable"), Some(&FieldValue::Float(23.81)));
        assert_eq!(r.get("percent_fossil"), Some(&FieldValue::Float(71.43)));
        assert_eq!(r.get("zone"), Some(&FieldValue::Text("TR".into())));
    }

    #[test]
    fn breakdown_without_generation_has_zero_shares() {
        let payload = json!({"history": [{
            "datetime": "2025-01-01T00:00:00Z",
            "zone": "TR",
            "powerProductionBreakdown": {"coal": null, "wind": null}
        }]});
        let r = &normalize_power_breakdown(&payload).unwrap()[0];
        assert_eq!(r.get("total_generation"), Some(&FieldValue::Float(0.0)));
        assert_eq!(r.get("percent_renewable"), Some(&FieldValue::Float(0.0)));
        assert_eq!(r.get("percent_fossil"), Some(&FieldValue::Float(0.0)));
    }

    #[test]
    fn carbon_entries_inherit_zone_and_granularity() {
        let payload = json!({
            "zone": "TR",
            "temporalGranularity": "hourly",
            "history": [
                {
                    "datetime": "2025-01-01T00:00:00.000Z",
                    "carbonIntensity": 412,
                    "updatedAt": "2025-01-01T01:30:00.000Z",
                    "createdAt": "2024-12-29T00:00:00.000Z",
                    "emissionFactorType": "lifecycle",
                    "isEstimated": true,
                    "estimationMethod": "TIME_SLICER_AVERAGE"
                },
                {"datetime": "2025-01-01T01:00:00.000Z", "carbonIntensity": 150}
            ]
        });

        let records = normalize_carbon_intensity(&payload).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.get("zone"), Some(&FieldValue::Text("TR".into())));
        assert_eq!(first.get("temporalGranularity"), Some(&FieldValue::Text("hourly".into())));
        assert_eq!(first.get("carbon_level"), Some(&FieldValue::Text("High".into())));
        assert_eq!(first.get("hours_since_update"), Some(&FieldValue::Float(1.5)));
        assert_eq!(first.get("isEstimated"), Some(&FieldValue::Bool(true)));

        let second = &records[1];
        assert_eq!(second.get("carbon_level"), Some(&FieldValue::Text("Low".into())));
        assert_eq!(second.get("hours_since_update"), Some(&FieldValue::Null));
        assert_eq!(second.get("zone"), Some(&FieldValue::Text("TR".into())));
    }

    #[test]
    fn carbon_level_bands() {
        assert_eq!(carbon_level(0.0), "Low");
        assert_eq!(carbon_level(199.9), "Low");
        assert_eq!(carbon_level(200.0), "Medium");
        assert_eq!(carbon_level(599.0), "High");
        assert_eq!(carbon_level(600.0), "Very High");
    }

    #[test]
    fn missing_history_is_a_normalize_error() {
        assert!(matches!(
            normalize_power_breakdown(&json!({"zone": "TR"})),
            Err(GridsyncError::Normalize(_))
        ));
        assert!(matches!(
            normalize_carbon_intensity(&json!({"history": "nope"})),
            Err(GridsyncError::Normalize(_))
        ));
    }

    #[test]
    fn collections_are_keyed_by_datetime_and_zone() {
        let keys = ["datetime".to_string(), "zone".to_string()];
        assert_eq!(power_collection().key_fields(), keys);
        assert_eq!(carbon_collection().key_fields(), keys);
        assert!(carbon_collection().is_timestamp_field("updatedAt"));
        assert!(!power_collection().is_timestamp_field("zone"));
    }
}
