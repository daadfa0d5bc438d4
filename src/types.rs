//! Core types for the extractor
//!
//! This module defines the data structures that flow through each stage of an
//! extraction run: raw field maps, data type tags, and canonical records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to field value mapping parsed from one content-provider row
pub type RawFieldMap = BTreeMap<String, String>;

/// Health Connect record type.
///
/// Variant order is the fixed extraction order; it also drives the key order of
/// every per-type map in a report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Steps,
    HeartRate,
    BloodPressure,
    Weight,
    Height,
    BodyFat,
    SleepSession,
    ExerciseSession,
    Distance,
    TotalCaloriesBurned,
    ActiveCaloriesBurned,
    RestingHeartRate,
    BloodGlucose,
    OxygenSaturation,
    BodyTemperature,
    /// Record type this crate has no dedicated handling for
    Other(String),
}

impl DataType {
    /// Every supported record type, in extraction order
    pub const SUPPORTED: [DataType; 15] = [
        DataType::Steps,
        DataType::HeartRate,
        DataType::BloodPressure,
        DataType::Weight,
        DataType::Height,
        DataType::BodyFat,
        DataType::SleepSession,
        DataType::ExerciseSession,
        DataType::Distance,
        DataType::TotalCaloriesBurned,
        DataType::ActiveCaloriesBurned,
        DataType::RestingHeartRate,
        DataType::BloodGlucose,
        DataType::OxygenSaturation,
        DataType::BodyTemperature,
    ];

    /// Health Connect record name, also used as the provider URI path segment
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Steps => "Steps",
            DataType::HeartRate => "HeartRate",
            DataType::BloodPressure => "BloodPressure",
            DataType::Weight => "Weight",
            DataType::Height => "Height",
            DataType::BodyFat => "BodyFat",
            DataType::SleepSession => "SleepSession",
            DataType::ExerciseSession => "ExerciseSession",
            DataType::Distance => "Distance",
            DataType::TotalCaloriesBurned => "TotalCaloriesBurned",
            DataType::ActiveCaloriesBurned => "ActiveCaloriesBurned",
            DataType::RestingHeartRate => "RestingHeartRate",
            DataType::BloodGlucose => "BloodGlucose",
            DataType::OxygenSaturation => "OxygenSaturation",
            DataType::BodyTemperature => "BodyTemperature",
            DataType::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        DataType::SUPPORTED
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or_else(|| DataType::Other(name.to_string()))
    }
}

impl From<String> for DataType {
    fn from(name: String) -> Self {
        DataType::from(name.as_str())
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Provenance marker for records read straight off the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordSource {
    HealthConnectDirect,
}

/// How records were pulled from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMethod {
    AdbContentProvider,
}

/// Mass unit reported for body mass records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MassUnit {
    Kilogram,
}

/// Step count interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsValue {
    pub count: i64,
    pub start_time: String,
    pub end_time: String,
}

/// Instantaneous heart rate reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateValue {
    pub beats_per_minute: i64,
    pub measurement_method: String,
}

/// Body mass reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassValue {
    pub mass: f64,
    pub unit: MassUnit,
}

/// Type-specific record payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Steps(StepsValue),
    HeartRate(HeartRateValue),
    Mass(MassValue),
    /// Record types without a dedicated shape keep their raw fields
    Raw(RawFieldMap),
}

/// Extraction provenance attached to every device record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub extraction_method: ExtractionMethod,
    pub is_real_data: bool,
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self {
            extraction_method: ExtractionMethod::AdbContentProvider,
            is_real_data: true,
        }
    }
}

/// Canonical, schema-uniform representation of one Health Connect record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// Record type this record was queried as
    pub data_type: DataType,
    /// Raw `start_time`, else `time`, else empty. Not guaranteed to be parseable.
    pub timestamp: String,
    /// Normalized payload
    pub value: RecordValue,
    /// Fields exactly as parsed from the provider row
    pub raw_data: RawFieldMap,
    pub source: RecordSource,
    /// When the record was normalized
    pub extracted_at: DateTime<Utc>,
    pub metadata: RecordMetadata,
}

/// Extraction parameters shared by every query of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionContext {
    pub device_id: String,
    pub days_back: u32,
}

impl ExtractionContext {
    pub fn new(device_id: impl Into<String>, days_back: u32) -> Self {
        Self {
            device_id: device_id.into(),
            days_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_names_round_trip() {
        for data_type in DataType::SUPPORTED {
            let name: String = data_type.clone().into();
            assert_eq!(DataType::from(name), data_type);
        }
    }

    #[test]
    fn test_unknown_data_type_kept_as_other() {
        let data_type = DataType::from("MenstruationFlow");
        assert_eq!(data_type, DataType::Other("MenstruationFlow".to_string()));
        assert_eq!(data_type.to_string(), "MenstruationFlow");
    }

    #[test]
    fn test_supported_order_matches_ord() {
        let mut sorted = DataType::SUPPORTED.to_vec();
        sorted.sort();
        assert_eq!(sorted, DataType::SUPPORTED.to_vec());
        assert!(DataType::BodyTemperature < DataType::Other("Aaa".to_string()));
    }

    #[test]
    fn test_data_type_serializes_as_record_name() {
        let json = serde_json::to_string(&DataType::TotalCaloriesBurned).unwrap();
        assert_eq!(json, "\"TotalCaloriesBurned\"");
    }

    #[test]
    fn test_record_value_untagged_shapes() {
        let mass: RecordValue = serde_json::from_str(r#"{"mass": 64.2, "unit": "KILOGRAM"}"#).unwrap();
        assert_eq!(
            mass,
            RecordValue::Mass(MassValue {
                mass: 64.2,
                unit: MassUnit::Kilogram
            })
        );

        let raw: RecordValue = serde_json::from_str(r#"{"systolic": "120"}"#).unwrap();
        assert!(matches!(raw, RecordValue::Raw(ref m) if m["systolic"] == "120"));
    }
}
