//! Record normalization
//!
//! This module maps raw provider rows onto canonical records.
//! - Steps, heart rate and body mass get typed payloads
//! - Every other record type keeps its raw fields as the payload
//! - Absent numeric fields default to zero; malformed ones are errors

use crate::error::ExtractError;
use crate::types::{
    CanonicalRecord, DataType, HeartRateValue, MassUnit, MassValue, RawFieldMap, RecordMetadata,
    RecordSource, RecordValue, StepsValue,
};
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Measurement method reported when a heart rate row carries none
pub const UNKNOWN_MEASUREMENT_METHOD: &str = "UNKNOWN";

/// Normalizer for converting raw field maps to canonical records
pub struct Normalizer;

impl Normalizer {
    /// Normalize one raw row queried as `data_type`
    pub fn normalize(
        raw: RawFieldMap,
        data_type: &DataType,
        extracted_at: DateTime<Utc>,
    ) -> Result<CanonicalRecord, ExtractError> {
        let value = match data_type {
            DataType::Steps => RecordValue::Steps(StepsValue {
                count: numeric_field(&raw, "count", data_type)?.unwrap_or(0),
                start_time: text_field(&raw, "start_time", ""),
                end_time: text_field(&raw, "end_time", ""),
            }),
            DataType::HeartRate => RecordValue::HeartRate(HeartRateValue {
                beats_per_minute: numeric_field(&raw, "bpm", data_type)?.unwrap_or(0),
                measurement_method: text_field(
                    &raw,
                    "measurement_method",
                    UNKNOWN_MEASUREMENT_METHOD,
                ),
            }),
            DataType::Weight => RecordValue::Mass(MassValue {
                mass: float_field(&raw, "weight", data_type)?.unwrap_or(0.0),
                unit: MassUnit::Kilogram,
            }),
            DataType::BloodPressure
            | DataType::Height
            | DataType::BodyFat
            | DataType::SleepSession
            | DataType::ExerciseSession
            | DataType::Distance
            | DataType::TotalCaloriesBurned
            | DataType::ActiveCaloriesBurned
            | DataType::RestingHeartRate
            | DataType::BloodGlucose
            | DataType::OxygenSaturation
            | DataType::BodyTemperature
            | DataType::Other(_) => RecordValue::Raw(raw.clone()),
        };

        Ok(CanonicalRecord {
            data_type: data_type.clone(),
            timestamp: record_timestamp(&raw),
            value,
            raw_data: raw,
            source: RecordSource::HealthConnectDirect,
            extracted_at,
            metadata: RecordMetadata::default(),
        })
    }
}

/// `start_time` if present, else `time`, else empty
fn record_timestamp(raw: &RawFieldMap) -> String {
    raw.get("start_time")
        .or_else(|| raw.get("time"))
        .cloned()
        .unwrap_or_default()
}

fn text_field(raw: &RawFieldMap, field: &str, default: &str) -> String {
    raw.get(field)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Parse a numeric field. `Ok(None)` when absent, error when present but malformed.
fn numeric_field<T: FromStr>(
    raw: &RawFieldMap,
    field: &str,
    data_type: &DataType,
) -> Result<Option<T>, ExtractError> {
    match raw.get(field) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ExtractError::MalformedNumber {
                data_type: data_type.clone(),
                field: field.to_string(),
                value: value.clone(),
            }),
    }
}

/// Like [`numeric_field`], but NaN and infinities count as malformed
fn float_field(
    raw: &RawFieldMap,
    field: &str,
    data_type: &DataType,
) -> Result<Option<f64>, ExtractError> {
    match numeric_field::<f64>(raw, field, data_type)? {
        Some(value) if !value.is_finite() => Err(ExtractError::MalformedNumber {
            data_type: data_type.clone(),
            field: field.to_string(),
            value: raw.get(field).cloned().unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}
