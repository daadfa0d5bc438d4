//! Report building
//!
//! This module aggregates the per-type record lists of one extraction run into
//! the persisted report: run metadata, per-type statistics and the records.

use crate::error::ExtractError;
use crate::extractor::CollectedRecords;
use crate::types::{CanonicalRecord, DataType, ExtractionContext, ExtractionMethod};
use crate::EXTRACTOR_VERSION;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Prefix of report file names
pub const REPORT_FILE_PREFIX: &str = "health_connect_raw_data";

/// Run-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionInfo {
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub extraction_method: ExtractionMethod,
    /// Data types queried, in order
    pub data_types: Vec<DataType>,
    pub total_records: usize,
    pub days_back: u32,
    pub run_id: String,
    pub extractor_version: String,
}

/// Earliest and latest record timestamps of one data type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Per-type statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeStatistics {
    pub count: usize,
    pub has_data: bool,
    pub date_range: DateRange,
}

/// Persisted result of one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub extraction_info: ExtractionInfo,
    pub statistics: BTreeMap<DataType, DataTypeStatistics>,
    pub raw_data: CollectedRecords,
}

/// Console summary line for one data type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary<'a> {
    pub data_type: &'a DataType,
    pub count: usize,
    pub latest: Option<&'a CanonicalRecord>,
}

/// Builds a [`Report`] from collected records
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(ctx: &ExtractionContext, records: CollectedRecords) -> Report {
        Self::build_at(ctx, records, Utc::now())
    }

    /// Build with an explicit report timestamp
    pub fn build_at(
        ctx: &ExtractionContext,
        records: CollectedRecords,
        generated_at: DateTime<Utc>,
    ) -> Report {
        let statistics = records
            .iter()
            .map(|(data_type, list)| (data_type.clone(), statistics_for(list)))
            .collect();

        let extraction_info = ExtractionInfo {
            timestamp: generated_at,
            device_id: ctx.device_id.clone(),
            extraction_method: ExtractionMethod::AdbContentProvider,
            data_types: records.keys().cloned().collect(),
            total_records: records.values().map(Vec::len).sum(),
            days_back: ctx.days_back,
            run_id: Uuid::new_v4().to_string(),
            extractor_version: EXTRACTOR_VERSION.to_string(),
        };

        Report {
            extraction_info,
            statistics,
            raw_data: records,
        }
    }
}

impl Report {
    pub fn total_records(&self) -> usize {
        self.extraction_info.total_records
    }

    /// Number of data types that returned at least one record
    pub fn successful_types(&self) -> usize {
        self.statistics.values().filter(|s| s.has_data).count()
    }

    /// Count and latest record per data type, in report order
    pub fn summary(&self) -> Vec<TypeSummary<'_>> {
        self.raw_data
            .iter()
            .map(|(data_type, records)| TypeSummary {
                data_type,
                count: records.len(),
                latest: latest_record(records),
            })
            .collect()
    }

    /// Pretty-printed JSON; non-ASCII characters are written as-is
    pub fn to_json_pretty(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize in memory, then write the whole document with a single call
    pub fn write_to(&self, path: &Path) -> Result<u64, ExtractError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json.as_bytes())?;
        Ok(json.len() as u64)
    }

    /// `health_connect_raw_data_<YYYYMMDD_HHMMSS>.json` for the given local time
    pub fn file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        stamped_file_name(REPORT_FILE_PREFIX, now)
    }

    /// File name stamped with the current local time
    pub fn default_file_name() -> String {
        Self::file_name(&Local::now())
    }
}

pub(crate) fn stamped_file_name<Tz: TimeZone>(prefix: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.json", prefix, now.format("%Y%m%d_%H%M%S"))
}

fn statistics_for(records: &[CanonicalRecord]) -> DataTypeStatistics {
    let timestamps: Vec<&str> = records.iter().map(|r| r.timestamp.as_str()).collect();
    let order = TimestampOrder::for_timestamps(&timestamps);

    let date_range = DateRange {
        earliest: timestamps
            .iter()
            .copied()
            .min_by(|a, b| order.compare(a, b))
            .map(str::to_string),
        latest: timestamps
            .iter()
            .copied()
            .max_by(|a, b| order.compare(a, b))
            .map(str::to_string),
    };

    DataTypeStatistics {
        count: records.len(),
        has_data: !records.is_empty(),
        date_range,
    }
}

fn latest_record(records: &[CanonicalRecord]) -> Option<&CanonicalRecord> {
    let timestamps: Vec<&str> = records.iter().map(|r| r.timestamp.as_str()).collect();
    let order = TimestampOrder::for_timestamps(&timestamps);
    records
        .iter()
        .max_by(|a, b| order.compare(&a.timestamp, &b.timestamp))
}

/// How timestamps of one data type are compared.
///
/// Device timestamps are opaque strings. When every one of them parses as an
/// instant they are compared chronologically; a single unparseable value drops
/// the whole type back to lexical comparison so the ordering stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimestampOrder {
    Chronological,
    Lexical,
}

impl TimestampOrder {
    fn for_timestamps(timestamps: &[&str]) -> Self {
        if !timestamps.is_empty() && timestamps.iter().all(|t| parse_instant_millis(t).is_some())
        {
            TimestampOrder::Chronological
        } else {
            TimestampOrder::Lexical
        }
    }

    fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            TimestampOrder::Chronological => {
                match (parse_instant_millis(a), parse_instant_millis(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    _ => a.cmp(b),
                }
            }
            TimestampOrder::Lexical => a.cmp(b),
        }
    }
}

/// Epoch milliseconds for an integer epoch value or an RFC 3339 instant
fn parse_instant_millis(timestamp: &str) -> Option<i64> {
    let trimmed = timestamp.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Some(millis);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;
    use crate::types::{RawFieldMap, RecordValue};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(data_type: DataType, fields: &[(&str, &str)]) -> CanonicalRecord {
        let raw: RawFieldMap = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Normalizer::normalize(raw, &data_type, Utc::now()).unwrap()
    }

    fn at(data_type: DataType, timestamp: &str) -> CanonicalRecord {
        record(data_type, &[("start_time", timestamp)])
    }

    fn ctx() -> ExtractionContext {
        ExtractionContext::new("emulator-5554", 30)
    }

    fn sample_records() -> CollectedRecords {
        let mut records = CollectedRecords::new();
        for data_type in DataType::SUPPORTED {
            records.insert(data_type, Vec::new());
        }
        records.insert(
            DataType::Steps,
            vec![
                record(
                    DataType::Steps,
                    &[("count", "42"), ("start_time", "5"), ("end_time", "6")],
                ),
                record(
                    DataType::Steps,
                    &[("count", "7"), ("start_time", "9"), ("end_time", "10")],
                ),
                record(
                    DataType::Steps,
                    &[("count", "1"), ("start_time", "2"), ("end_time", "3")],
                ),
            ],
        );
        records.insert(
            DataType::Weight,
            vec![record(DataType::Weight, &[("weight", "64.5"), ("time", "4")])],
        );
        records
    }

    #[test]
    fn test_statistics_for_populated_and_empty_types() {
        let report = ReportBuilder::build(&ctx(), sample_records());

        let steps = &report.statistics[&DataType::Steps];
        assert_eq!(steps.count, 3);
        assert!(steps.has_data);
        assert_eq!(steps.date_range.earliest.as_deref(), Some("2"));
        assert_eq!(steps.date_range.latest.as_deref(), Some("9"));

        let height = &report.statistics[&DataType::Height];
        assert_eq!(
            height,
            &DataTypeStatistics {
                count: 0,
                has_data: false,
                date_range: DateRange::default(),
            }
        );
    }

    #[test]
    fn test_total_records_is_sum_of_lists() {
        let report = ReportBuilder::build(&ctx(), sample_records());
        assert_eq!(report.total_records(), 4);
        assert_eq!(report.successful_types(), 2);

        let empty = ReportBuilder::build(&ctx(), CollectedRecords::new());
        assert_eq!(empty.total_records(), 0);
        assert!(empty.statistics.is_empty());
    }

    #[test]
    fn test_numeric_timestamps_compare_chronologically() {
        let records = vec![
            at(DataType::Distance, "999"),
            at(DataType::Distance, "1000"),
            at(DataType::Distance, "20"),
        ];
        let stats = statistics_for(&records);
        assert_eq!(stats.date_range.earliest.as_deref(), Some("20"));
        assert_eq!(stats.date_range.latest.as_deref(), Some("1000"));
    }

    #[test]
    fn test_rfc3339_timestamps_compare_chronologically() {
        let records = vec![
            at(DataType::Distance, "2024-01-15T10:00:00+09:00"),
            at(DataType::Distance, "2024-01-15T02:00:00Z"),
        ];
        let stats = statistics_for(&records);
        // 10:00+09:00 is 01:00Z, earlier than 02:00Z
        assert_eq!(
            stats.date_range.earliest.as_deref(),
            Some("2024-01-15T10:00:00+09:00")
        );
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_lexical() {
        let records = vec![
            at(DataType::Distance, "999"),
            at(DataType::Distance, "1000"),
            record(DataType::Distance, &[("distance", "5")]),
        ];
        let stats = statistics_for(&records);
        assert_eq!(stats.date_range.earliest.as_deref(), Some(""));
        assert_eq!(stats.date_range.latest.as_deref(), Some("999"));
    }

    #[test]
    fn test_report_key_order_follows_data_types() {
        let report = ReportBuilder::build(&ctx(), sample_records());
        let json = report.to_json_pretty().unwrap();
        let steps = json.find("\"Steps\"").unwrap();
        let heart_rate = json.find("\"HeartRate\"").unwrap();
        let body_temperature = json.find("\"BodyTemperature\"").unwrap();
        assert!(steps < heart_rate && heart_rate < body_temperature);
        assert_eq!(report.extraction_info.data_types, DataType::SUPPORTED.to_vec());
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = ReportBuilder::build(&ctx(), sample_records());
        let json = report.to_json_pretty().unwrap();
        let parsed = Report::from_json(&json).unwrap();

        assert_eq!(parsed.total_records(), report.total_records());
        for (data_type, stats) in &report.statistics {
            assert_eq!(parsed.statistics[data_type].count, stats.count);
        }
        for (data_type, records) in &report.raw_data {
            let values: Vec<_> = records.iter().map(|r| &r.value).collect();
            let parsed_values: Vec<_> = parsed.raw_data[data_type].iter().map(|r| &r.value).collect();
            assert_eq!(parsed_values, values);
        }
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_round_trip_preserves_every_payload_shape() {
        let mut records = sample_records();
        records.insert(
            DataType::HeartRate,
            vec![
                record(
                    DataType::HeartRate,
                    &[("bpm", "72"), ("time", "11"), ("measurement_method", "MANUAL")],
                ),
                record(DataType::HeartRate, &[("bpm", "64"), ("time", "12")]),
            ],
        );
        records.insert(
            DataType::BloodPressure,
            vec![record(
                DataType::BloodPressure,
                &[("systolic", "121"), ("diastolic", "79"), ("time", "13")],
            )],
        );
        records.insert(DataType::Distance, vec![record(DataType::Distance, &[])]);

        let report = ReportBuilder::build(&ctx(), records);
        let parsed = Report::from_json(&report.to_json_pretty().unwrap()).unwrap();

        assert!(matches!(
            parsed.raw_data[&DataType::HeartRate][0].value,
            RecordValue::HeartRate(_)
        ));
        assert!(matches!(
            parsed.raw_data[&DataType::BloodPressure][0].value,
            RecordValue::Raw(_)
        ));
        assert_eq!(parsed.total_records(), 8);
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_non_finite_weight_never_reaches_the_report() {
        let raw: RawFieldMap = [("weight", "NaN"), ("time", "1")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(Normalizer::normalize(raw, &DataType::Weight, Utc::now()).is_err());

        let report = ReportBuilder::build(&ctx(), sample_records());
        let json = report.to_json_pretty().unwrap();
        assert!(!json.contains("\"mass\": null"));
        assert_eq!(Report::from_json(&json).unwrap(), report);
    }

    #[test]
    fn test_report_top_level_keys() {
        let report = ReportBuilder::build(&ctx(), sample_records());
        let value: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["extractionInfo"]["deviceId"], "emulator-5554");
        assert_eq!(value["extractionInfo"]["extractionMethod"], "ADB_CONTENT_PROVIDER");
        assert_eq!(value["extractionInfo"]["totalRecords"], 4);
        assert_eq!(value["statistics"]["Height"]["dateRange"]["earliest"], serde_json::Value::Null);
        assert_eq!(value["statistics"]["Steps"]["hasData"], true);
        assert_eq!(value["rawData"]["Weight"][0]["value"]["unit"], "KILOGRAM");
    }

    #[test]
    fn test_non_ascii_is_written_literally() {
        let mut records = CollectedRecords::new();
        records.insert(
            DataType::ExerciseSession,
            vec![record(DataType::ExerciseSession, &[("title", "朝のランニング")])],
        );
        let json = ReportBuilder::build(&ctx(), records).to_json_pretty().unwrap();
        assert!(json.contains("朝のランニング"));
    }

    #[test]
    fn test_summary_latest_record() {
        let report = ReportBuilder::build(&ctx(), sample_records());
        let summary = report.summary();
        assert_eq!(summary.len(), 15);
        assert_eq!(summary[0].data_type, &DataType::Steps);
        assert_eq!(summary[0].count, 3);
        assert_eq!(summary[0].latest.map(|r| r.timestamp.as_str()), Some("9"));
        assert!(summary[1].latest.is_none());
    }

    #[test]
    fn test_file_name_pattern() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            Report::file_name(&now),
            "health_connect_raw_data_20240309_070501.json"
        );
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = ReportBuilder::build(&ctx(), sample_records());

        let written = report.write_to(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(written, contents.len() as u64);
        assert_eq!(Report::from_json(&contents).unwrap().total_records(), 4);
    }
}
