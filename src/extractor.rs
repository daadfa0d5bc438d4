//! Extraction orchestration
//!
//! This module drives one extraction run against a device: connection and
//! precondition checks, then one bounded time-range query per supported data
//! type, each fed through the row parser and the normalizer.
//!
//! Failures are isolated per data type. A query that times out, fails or returns
//! nothing contributes an empty list and the run moves on to the next type.

use crate::bridge::{BridgeError, DeviceBridge, DEFAULT_COMMAND_TIMEOUT};
use crate::error::ExtractError;
use crate::normalizer::Normalizer;
use crate::parser::RowParser;
use crate::types::{CanonicalRecord, DataType, ExtractionContext};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

/// Package id of the Health Connect application
pub const HEALTH_CONNECT_PACKAGE: &str = "com.google.android.apps.healthdata";

/// Content provider authority serving Health Connect records
pub const HEALTH_CONNECT_AUTHORITY: &str = "com.google.android.apps.healthdata.provider";

/// Per-type query timeout
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default look-back window in days
pub const DEFAULT_DAYS_BACK: u32 = 30;

/// Records collected per data type, keyed in extraction order
pub type CollectedRecords = BTreeMap<DataType, Vec<CanonicalRecord>>;

/// Extractor settings
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Package that must be installed before extraction starts
    pub package: String,
    /// Provider authority used to build record URIs
    pub authority: String,
    /// Timeout for each per-type content query
    pub query_timeout: Duration,
    /// Data types to query, in order
    pub data_types: Vec<DataType>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            package: HEALTH_CONNECT_PACKAGE.to_string(),
            authority: HEALTH_CONNECT_AUTHORITY.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            data_types: DataType::SUPPORTED.to_vec(),
        }
    }
}

/// How one data type's query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Query succeeded; number of records kept
    Records(usize),
    /// Non-zero exit or empty output (no data, or permission denied)
    NoData,
    TimedOut,
    Failed(String),
}

/// Result of querying every configured data type
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    pub records: CollectedRecords,
    /// Per-type outcome, in query order
    pub outcomes: Vec<(DataType, QueryOutcome)>,
}

impl ExtractionRun {
    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// Drives extraction over a [`DeviceBridge`]
pub struct Extractor<B: DeviceBridge> {
    bridge: B,
    config: ExtractorConfig,
}

impl<B: DeviceBridge> Extractor<B> {
    /// Create an extractor with default settings
    pub fn new(bridge: B) -> Self {
        Self::with_config(bridge, ExtractorConfig::default())
    }

    pub fn with_config(bridge: B, config: ExtractorConfig) -> Self {
        Self { bridge, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Select the first attached device
    pub fn connect(&self) -> Result<String, ExtractError> {
        let devices = self.bridge.list_devices()?;
        let device_id = devices.into_iter().next().ok_or(ExtractError::NoDevice)?;
        info!("Device connected: {}", device_id);
        Ok(device_id)
    }

    /// Fail unless the Health Connect package is installed on `device_id`
    pub fn check_health_connect(&self, device_id: &str) -> Result<(), ExtractError> {
        let args: Vec<String> = ["pm", "list", "packages", self.config.package.as_str()]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = self
            .bridge
            .shell(device_id, &args, DEFAULT_COMMAND_TIMEOUT)?;

        if !output.success() {
            return Err(BridgeError::CommandFailed {
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }
            .into());
        }

        if output.stdout.contains(&self.config.package) {
            info!("Health Connect found ({})", self.config.package);
            Ok(())
        } else {
            Err(ExtractError::HealthConnectMissing(self.config.package.clone()))
        }
    }

    /// Query every configured data type over the last `ctx.days_back` days
    pub fn extract_all(&self, ctx: &ExtractionContext) -> ExtractionRun {
        self.extract_all_at(ctx, Utc::now())
    }

    /// Same as [`Extractor::extract_all`] with the window ending at `now`
    pub fn extract_all_at(&self, ctx: &ExtractionContext, now: DateTime<Utc>) -> ExtractionRun {
        info!(
            "Extracting Health Connect records for the last {} days from {}",
            ctx.days_back, ctx.device_id
        );

        let mut run = ExtractionRun::default();
        for data_type in &self.config.data_types {
            let (records, outcome) = self.query_data_type(ctx, data_type, now);
            run.records.insert(data_type.clone(), records);
            run.outcomes.push((data_type.clone(), outcome));
        }

        info!(
            "Extraction finished: {} data types, {} records",
            self.config.data_types.len(),
            run.total_records()
        );
        run
    }

    /// Query one data type and normalize whatever comes back
    pub fn query_data_type(
        &self,
        ctx: &ExtractionContext,
        data_type: &DataType,
        now: DateTime<Utc>,
    ) -> (Vec<CanonicalRecord>, QueryOutcome) {
        info!("Querying {}...", data_type);
        let (window_start, window_end) = query_window(now, ctx.days_back);
        let args = self.query_args(data_type, window_start, window_end);

        let output = match self
            .bridge
            .shell(&ctx.device_id, &args, self.config.query_timeout)
        {
            Ok(output) => output,
            Err(BridgeError::Timeout(after)) => {
                warn!("{}: query timed out after {:?}", data_type, after);
                return (Vec::new(), QueryOutcome::TimedOut);
            }
            Err(e) => {
                warn!("{}: query failed: {}", data_type, e);
                return (Vec::new(), QueryOutcome::Failed(e.to_string()));
            }
        };

        if !output.success() || output.stdout.trim().is_empty() {
            warn!("{}: no data or no permission", data_type);
            return (Vec::new(), QueryOutcome::NoData);
        }

        let extracted_at = Utc::now();
        let mut records = Vec::new();
        for raw in RowParser::parse_output(&output.stdout) {
            match Normalizer::normalize(raw, data_type, extracted_at) {
                Ok(record) => records.push(record),
                Err(e) => warn!("{}: skipping record: {}", data_type, e),
            }
        }

        info!("{}: {} records", data_type, records.len());
        let count = records.len();
        (records, QueryOutcome::Records(count))
    }

    fn query_args(&self, data_type: &DataType, window_start: i64, window_end: i64) -> Vec<String> {
        vec![
            "content".to_string(),
            "query".to_string(),
            "--uri".to_string(),
            format!("content://{}/records/{}", self.config.authority, data_type),
            "--where".to_string(),
            // Quoted so the device shell passes the clause as one argument
            "'start_time >= ? AND end_time <= ?'".to_string(),
            "--bind".to_string(),
            window_start.to_string(),
            "--bind".to_string(),
            window_end.to_string(),
        ]
    }
}

/// `[now - days_back, now]` as epoch milliseconds
pub fn query_window(now: DateTime<Utc>, days_back: u32) -> (i64, i64) {
    let start = now - ChronoDuration::days(i64::from(days_back));
    (start.timestamp_millis(), now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ShellOutput;
    use crate::types::RecordValue;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted bridge: replies per record type, records every shell call
    struct FakeBridge {
        devices: Vec<String>,
        packages: String,
        replies: HashMap<String, Result<ShellOutput, BridgeError>>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeBridge {
        fn new() -> Self {
            Self {
                devices: vec!["emulator-5554".to_string()],
                packages: format!("package:{}\n", HEALTH_CONNECT_PACKAGE),
                replies: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn reply(mut self, data_type: &str, reply: Result<ShellOutput, BridgeError>) -> Self {
            self.replies.insert(data_type.to_string(), reply);
            self
        }
    }

    fn ok(stdout: &str) -> Result<ShellOutput, BridgeError> {
        Ok(ShellOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    impl DeviceBridge for FakeBridge {
        fn list_devices(&self) -> Result<Vec<String>, BridgeError> {
            Ok(self.devices.clone())
        }

        fn shell(
            &self,
            _device_id: &str,
            args: &[String],
            _timeout: Duration,
        ) -> Result<ShellOutput, BridgeError> {
            self.calls.borrow_mut().push(args.to_vec());
            if args.first().map(String::as_str) == Some("pm") {
                return ok(&self.packages);
            }
            let uri = &args[3];
            let data_type = uri.rsplit('/').next().unwrap_or_default();
            match self.replies.get(data_type) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(BridgeError::Timeout(d))) => Err(BridgeError::Timeout(*d)),
                Some(Err(e)) => Err(BridgeError::CommandFailed {
                    code: 255,
                    stderr: e.to_string(),
                }),
                None => Ok(ShellOutput {
                    exit_code: 1,
                    ..Default::default()
                }),
            }
        }
    }

    fn ctx() -> ExtractionContext {
        ExtractionContext::new("emulator-5554", 7)
    }

    #[test]
    fn test_connect_picks_first_device() {
        let mut bridge = FakeBridge::new();
        bridge.devices.push("second".to_string());
        let extractor = Extractor::new(bridge);
        assert_eq!(extractor.connect().unwrap(), "emulator-5554");
    }

    #[test]
    fn test_connect_without_device_fails() {
        let mut bridge = FakeBridge::new();
        bridge.devices.clear();
        let extractor = Extractor::new(bridge);
        assert!(matches!(extractor.connect(), Err(ExtractError::NoDevice)));
    }

    #[test]
    fn test_health_connect_presence() {
        let extractor = Extractor::new(FakeBridge::new());
        assert!(extractor.check_health_connect("emulator-5554").is_ok());

        let mut bridge = FakeBridge::new();
        bridge.packages = String::new();
        let extractor = Extractor::new(bridge);
        assert!(matches!(
            extractor.check_health_connect("emulator-5554"),
            Err(ExtractError::HealthConnectMissing(_))
        ));
    }

    #[test]
    fn test_query_window_in_millis() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let (start, end) = query_window(now, 30);
        assert_eq!(end - start, 30 * 24 * 60 * 60 * 1000);
        assert_eq!(end, now.timestamp_millis());
    }

    #[test]
    fn test_query_arguments() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let extractor = Extractor::new(FakeBridge::new());
        extractor.query_data_type(&ctx(), &DataType::HeartRate, now);

        let calls = extractor.bridge().calls.borrow();
        let args = &calls[0];
        assert_eq!(args[0], "content");
        assert_eq!(
            args[3],
            "content://com.google.android.apps.healthdata.provider/records/HeartRate"
        );
        let (start, end) = query_window(now, 7);
        assert_eq!(args[7], start.to_string());
        assert_eq!(args[9], end.to_string());
    }

    #[test]
    fn test_extract_all_isolates_failures() {
        let bridge = FakeBridge::new()
            .reply(
                "Steps",
                ok("Row: header\ncount=42, start_time=100, end_time=200\ncount=7, start_time=300, end_time=400\n"),
            )
            .reply("HeartRate", Err(BridgeError::Timeout(DEFAULT_QUERY_TIMEOUT)))
            .reply(
                "BloodPressure",
                Err(BridgeError::CommandFailed {
                    code: 1,
                    stderr: "boom".to_string(),
                }),
            )
            .reply("Weight", ok("   \n"))
            .reply("BodyTemperature", ok("temperature=36.6, time=9\n"));
        let extractor = Extractor::new(bridge);
        let run = extractor.extract_all(&ctx());

        assert_eq!(run.records.len(), 15);
        assert_eq!(run.outcomes.len(), 15);
        assert_eq!(run.records[&DataType::Steps].len(), 2);
        assert_eq!(run.records[&DataType::BodyTemperature].len(), 1);
        assert_eq!(run.total_records(), 3);

        let outcome = |t: DataType| {
            run.outcomes
                .iter()
                .find(|(dt, _)| *dt == t)
                .map(|(_, o)| o.clone())
                .unwrap()
        };
        assert_eq!(outcome(DataType::Steps), QueryOutcome::Records(2));
        assert_eq!(outcome(DataType::HeartRate), QueryOutcome::TimedOut);
        assert!(matches!(outcome(DataType::BloodPressure), QueryOutcome::Failed(_)));
        assert_eq!(outcome(DataType::Weight), QueryOutcome::NoData);
        assert_eq!(outcome(DataType::Height), QueryOutcome::NoData);

        // Fixed order regardless of outcome
        let order: Vec<DataType> = run.outcomes.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(order, DataType::SUPPORTED.to_vec());
    }

    #[test]
    fn test_malformed_record_skips_only_that_line() {
        let bridge = FakeBridge::new().reply(
            "Steps",
            ok("count=1, start_time=1\ncount=many, start_time=2\ncount=3, start_time=3\n"),
        );
        let extractor = Extractor::new(bridge);
        let (records, outcome) =
            extractor.query_data_type(&ctx(), &DataType::Steps, Utc::now());

        assert_eq!(outcome, QueryOutcome::Records(2));
        let counts: Vec<i64> = records
            .iter()
            .map(|r| match &r.value {
                RecordValue::Steps(s) => s.count,
                _ => -1,
            })
            .collect();
        assert_eq!(counts, vec![1, 3]);
    }

    #[test]
    fn test_lines_without_fields_emit_no_record() {
        let bridge = FakeBridge::new().reply("Distance", ok("No result found.\n"));
        let extractor = Extractor::new(bridge);
        let (records, outcome) =
            extractor.query_data_type(&ctx(), &DataType::Distance, Utc::now());
        assert!(records.is_empty());
        assert_eq!(outcome, QueryOutcome::Records(0));
    }

    #[test]
    fn test_custom_data_type_list() {
        let config = ExtractorConfig {
            data_types: vec![DataType::Weight, DataType::Other("Vo2Max".to_string())],
            ..Default::default()
        };
        let bridge = FakeBridge::new().reply("Vo2Max", ok("vo2=45, time=1\n"));
        let extractor = Extractor::with_config(bridge, config);
        let run = extractor.extract_all(&ctx());

        assert_eq!(run.records.len(), 2);
        assert_eq!(run.records[&DataType::Other("Vo2Max".to_string())].len(), 1);
    }
}
