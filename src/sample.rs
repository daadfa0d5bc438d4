//! Sample record fabrication
//!
//! Builds synthetic, schema-faithful Health Connect records so the expected
//! output shape can be documented without a device. Values are random within
//! fixed per-type bounds. Every timestamp is an offset back from one reference
//! instant captured when the fabricator is created, so the records of one
//! manifest are chronologically consistent with each other.

use crate::error::ExtractError;
use crate::report::stamped_file_name;
use crate::types::DataType;
use chrono::{DateTime, Duration, Local, SecondsFormat, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Prefix of sample manifest file names
pub const SAMPLE_FILE_PREFIX: &str = "health_connect_sample_data";

/// Samples kept per point-in-time data type
pub const SAMPLES_PER_TYPE: usize = 3;

/// Samples kept per session data type (sleep, exercise)
pub const SESSION_SAMPLES_PER_TYPE: usize = 2;

const MANIFEST_DESCRIPTION: &str =
    "Health Connect API data structure samples (synthetic, not real data)";

const EXAMPLE_DATA_ORIGINS: [&str; 6] = [
    "com.google.android.apps.fitness (Google Fit)",
    "com.samsung.health (Samsung Health)",
    "com.withings.wiscale2 (Withings)",
    "com.omron.connect (OMRON Connect)",
    "com.strava.app (Strava)",
    "com.fitbit.FitbitMobile (Fitbit)",
];

const EXERCISE_TYPES: [&str; 4] = ["RUNNING", "WALKING", "CYCLING", "SWIMMING"];

/// Kind of device that produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Phone,
    Watch,
    Scale,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleDevice {
    pub manufacturer: String,
    pub model: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
}

/// Record provenance as Health Connect reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleMetadata {
    pub data_origin: String,
    pub device: SampleDevice,
    pub client_record_id: String,
    pub last_modified_time: String,
}

/// Unit attached to a [`Measurement`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementUnit {
    MillimeterOfMercury,
    Kilogram,
    Meter,
    Celsius,
    Percent,
    Kilocalorie,
    MillimolesPerLiter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: MeasurementUnit,
}

impl Measurement {
    fn new(value: f64, unit: MeasurementUnit) -> Self {
        Self { value, unit }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepStage {
    pub stage: String,
    pub start_time: String,
    pub end_time: String,
}

/// Single-value reading, keyed by its Health Connect field name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reading {
    Height(Measurement),
    Percentage(Measurement),
    Distance(Measurement),
    Energy(Measurement),
    BeatsPerMinute(u32),
    Level(Measurement),
}

/// Type-specific fields of a sample
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SampleBody {
    #[serde(rename_all = "camelCase")]
    Steps {
        count: u32,
        start_time: String,
        end_time: String,
    },
    #[serde(rename_all = "camelCase")]
    HeartRate {
        beats_per_minute: u32,
        time: String,
        measurement_method: String,
    },
    #[serde(rename_all = "camelCase")]
    BloodPressure {
        systolic: Measurement,
        diastolic: Measurement,
        time: String,
        measurement_location: String,
        body_position: String,
    },
    Weight {
        weight: Measurement,
        time: String,
    },
    #[serde(rename_all = "camelCase")]
    SleepSession {
        start_time: String,
        end_time: String,
        /// Milliseconds
        duration: i64,
        stages: Vec<SleepStage>,
    },
    #[serde(rename_all = "camelCase")]
    BodyTemperature {
        temperature: Measurement,
        time: String,
        measurement_location: String,
    },
    #[serde(rename_all = "camelCase")]
    ExerciseSession {
        exercise_type: String,
        start_time: String,
        end_time: String,
        /// Milliseconds
        duration: i64,
        calories: u32,
        /// Meters; null for non-distance activities
        distance: Option<u32>,
    },
    Instant(InstantReading),
    Interval(IntervalReading),
}

/// Reading taken at a single point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstantReading {
    #[serde(flatten)]
    pub reading: Reading,
    pub time: String,
}

/// Reading accumulated over a time span
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalReading {
    #[serde(flatten)]
    pub reading: Reading,
    pub start_time: String,
    pub end_time: String,
}

/// One fabricated record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: String,
    pub data_type: DataType,
    #[serde(flatten)]
    pub body: SampleBody,
    pub metadata: SampleMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSet {
    pub description: String,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Permissions {
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataOrigins {
    pub description: String,
    pub apps: Vec<String>,
}

/// Documentation payload describing every supported record shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleManifest {
    pub generated_at: String,
    pub description: String,
    pub data_types: BTreeMap<DataType, SampleSet>,
    pub permissions: Permissions,
    pub data_origins: DataOrigins,
}

impl SampleManifest {
    pub fn to_json_pretty(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize in memory, then write the whole document with a single call
    pub fn write_to(&self, path: &Path) -> Result<u64, ExtractError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json.as_bytes())?;
        Ok(json.len() as u64)
    }

    /// `health_connect_sample_data_<YYYYMMDD_HHMMSS>.json`
    pub fn file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        stamped_file_name(SAMPLE_FILE_PREFIX, now)
    }

    pub fn default_file_name() -> String {
        Self::file_name(&Local::now())
    }
}

/// Health Connect read permission for a record type
pub fn read_permission(data_type: &DataType) -> Option<&'static str> {
    let permission = match data_type {
        DataType::Steps => "android.permission.health.READ_STEPS",
        DataType::HeartRate => "android.permission.health.READ_HEART_RATE",
        DataType::BloodPressure => "android.permission.health.READ_BLOOD_PRESSURE",
        DataType::Weight => "android.permission.health.READ_WEIGHT",
        DataType::Height => "android.permission.health.READ_HEIGHT",
        DataType::BodyFat => "android.permission.health.READ_BODY_FAT",
        DataType::SleepSession => "android.permission.health.READ_SLEEP",
        DataType::ExerciseSession => "android.permission.health.READ_EXERCISE",
        DataType::Distance => "android.permission.health.READ_DISTANCE",
        DataType::TotalCaloriesBurned => "android.permission.health.READ_TOTAL_CALORIES_BURNED",
        DataType::ActiveCaloriesBurned => "android.permission.health.READ_ACTIVE_CALORIES_BURNED",
        DataType::RestingHeartRate => "android.permission.health.READ_RESTING_HEART_RATE",
        DataType::BloodGlucose => "android.permission.health.READ_BLOOD_GLUCOSE",
        DataType::OxygenSaturation => "android.permission.health.READ_OXYGEN_SATURATION",
        DataType::BodyTemperature => "android.permission.health.READ_BODY_TEMPERATURE",
        DataType::Other(_) => return None,
    };
    Some(permission)
}

/// Static description of the app and device a sample claims to come from
struct Origin {
    package: &'static str,
    manufacturer: &'static str,
    model: &'static str,
    device_type: DeviceType,
}

const GOOGLE_FIT_PHONE: Origin = Origin {
    package: "com.google.android.apps.fitness",
    manufacturer: "Google",
    model: "Pixel 7",
    device_type: DeviceType::Phone,
};

const GOOGLE_FIT_WATCH: Origin = Origin {
    package: "com.google.android.apps.fitness",
    manufacturer: "Google",
    model: "Pixel Watch",
    device_type: DeviceType::Watch,
};

const SAMSUNG_WATCH: Origin = Origin {
    package: "com.samsung.health",
    manufacturer: "Samsung",
    model: "Galaxy Watch 5",
    device_type: DeviceType::Watch,
};

const OMRON_CUFF: Origin = Origin {
    package: "com.omron.connect",
    manufacturer: "OMRON",
    model: "HEM-7281T",
    device_type: DeviceType::Unknown,
};

const WITHINGS_SCALE: Origin = Origin {
    package: "com.withings.wiscale2",
    manufacturer: "Withings",
    model: "Body+",
    device_type: DeviceType::Scale,
};

const OMRON_THERMOMETER: Origin = Origin {
    package: "com.healthcare.thermometer",
    manufacturer: "OMRON",
    model: "MC-681",
    device_type: DeviceType::Unknown,
};

const STRAVA_GARMIN: Origin = Origin {
    package: "com.strava.app",
    manufacturer: "Garmin",
    model: "Forerunner 255",
    device_type: DeviceType::Watch,
};

const FITBIT_TRACKER: Origin = Origin {
    package: "com.fitbit.FitbitMobile",
    manufacturer: "Google",
    model: "Fitbit Charge 6",
    device_type: DeviceType::Watch,
};

const GLUCOSE_METER: Origin = Origin {
    package: "com.samsung.health",
    manufacturer: "Roche",
    model: "Accu-Chek Guide",
    device_type: DeviceType::Unknown,
};

/// Fabricates sample records relative to a fixed reference instant
pub struct SampleFabricator<R: Rng = StdRng> {
    reference: DateTime<Utc>,
    rng: R,
}

impl SampleFabricator<StdRng> {
    /// Fabricator anchored at the current time with an OS-seeded generator
    pub fn new() -> Self {
        Self::with_rng(Utc::now(), StdRng::from_os_rng())
    }
}

impl Default for SampleFabricator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SampleFabricator<R> {
    pub fn with_rng(reference: DateTime<Utc>, rng: R) -> Self {
        Self { reference, rng }
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    /// Reference instant minus the given offset, as fixed-width RFC 3339
    pub fn timestamp(&self, days_ago: i64, hours_ago: f64) -> String {
        let offset = Duration::days(days_ago)
            + Duration::milliseconds((hours_ago * 3_600_000.0).round() as i64);
        (self.reference - offset).to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn metadata(&self, origin: &Origin, client_record_id: String, days_ago: i64) -> SampleMetadata {
        SampleMetadata {
            data_origin: origin.package.to_string(),
            device: SampleDevice {
                manufacturer: origin.manufacturer.to_string(),
                model: origin.model.to_string(),
                device_type: origin.device_type,
            },
            client_record_id,
            last_modified_time: self.timestamp(days_ago, 0.0),
        }
    }

    fn sample(
        &self,
        id: String,
        data_type: DataType,
        body: SampleBody,
        origin: &Origin,
        days_ago: i64,
    ) -> Sample {
        let metadata = self.metadata(origin, format!("client_{id}"), days_ago);
        Sample {
            id,
            data_type,
            body,
            metadata,
        }
    }

    /// Hourly step counts, 06:00-22:00, for the past 7 days
    pub fn steps(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..7 {
            for hour in 6..=22u32 {
                let count = if matches!(hour, 7 | 12 | 18) {
                    self.rng.random_range(50..=500)
                } else {
                    self.rng.random_range(10..=100)
                };
                let body = SampleBody::Steps {
                    count,
                    start_time: self.timestamp(day, f64::from(24 - hour)),
                    end_time: self.timestamp(day, f64::from(23 - hour)),
                };
                samples.push(self.sample(
                    format!("steps_{day}_{hour}"),
                    DataType::Steps,
                    body,
                    &GOOGLE_FIT_PHONE,
                    day,
                ));
            }
        }
        samples
    }

    /// Five manual readings a day, four hours apart, for 3 days
    pub fn heart_rate(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..3 {
            for measurement in 0..5u32 {
                let body = SampleBody::HeartRate {
                    beats_per_minute: self.rng.random_range(60..=100),
                    time: self.timestamp(day, f64::from(measurement * 4)),
                    measurement_method: "MEASUREMENT_METHOD_MANUAL".to_string(),
                };
                samples.push(self.sample(
                    format!("hr_{day}_{measurement}"),
                    DataType::HeartRate,
                    body,
                    &SAMSUNG_WATCH,
                    day,
                ));
            }
        }
        samples
    }

    /// Morning and evening cuff readings for 7 days
    pub fn blood_pressure(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..7 {
            for (time_of_day, hour) in [("morning", 7u32), ("evening", 19)] {
                let systolic = f64::from(self.rng.random_range(110..=130u32));
                let diastolic = f64::from(self.rng.random_range(70..=85u32));
                let body = SampleBody::BloodPressure {
                    systolic: Measurement::new(systolic, MeasurementUnit::MillimeterOfMercury),
                    diastolic: Measurement::new(diastolic, MeasurementUnit::MillimeterOfMercury),
                    time: self.timestamp(day, f64::from(24 - hour)),
                    measurement_location: "MEASUREMENT_LOCATION_LEFT_UPPER_ARM".to_string(),
                    body_position: "BODY_POSITION_SITTING".to_string(),
                };
                samples.push(self.sample(
                    format!("bp_{day}_{time_of_day}"),
                    DataType::BloodPressure,
                    body,
                    &OMRON_CUFF,
                    day,
                ));
            }
        }
        samples
    }

    /// Daily scale readings around 65.0 kg for 14 days
    pub fn weight(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..14 {
            let weight = round_to(65.0 + self.rng.random_range(-0.5..=0.5), 1);
            let body = SampleBody::Weight {
                weight: Measurement::new(weight, MeasurementUnit::Kilogram),
                time: self.timestamp(day, 16.0),
            };
            samples.push(self.sample(
                format!("weight_{day}"),
                DataType::Weight,
                body,
                &WITHINGS_SCALE,
                day,
            ));
        }
        samples
    }

    /// One 6-8 hour night with four stages for each of the past 7 days
    pub fn sleep(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..7i64 {
            let hours = f64::from(self.rng.random_range(6..=8u32));
            let end_ago = (day * 24) as f64 + 17.0;
            let start_ago = end_ago + hours;
            // Awake for 6 minutes, then light/deep/rem splitting the rest
            let boundaries = [
                ("STAGE_TYPE_AWAKE", start_ago, start_ago - 0.1),
                ("STAGE_TYPE_LIGHT", start_ago - 0.1, start_ago - hours * 0.4),
                ("STAGE_TYPE_DEEP", start_ago - hours * 0.4, start_ago - hours * 0.65),
                ("STAGE_TYPE_REM", start_ago - hours * 0.65, end_ago),
            ];
            let stages = boundaries
                .iter()
                .map(|(stage, from, to)| SleepStage {
                    stage: stage.to_string(),
                    start_time: self.timestamp(0, *from),
                    end_time: self.timestamp(0, *to),
                })
                .collect();
            let body = SampleBody::SleepSession {
                start_time: self.timestamp(0, start_ago),
                end_time: self.timestamp(0, end_ago),
                duration: (hours * 3_600_000.0) as i64,
                stages,
            };
            samples.push(self.sample(
                format!("sleep_{day}"),
                DataType::SleepSession,
                body,
                &GOOGLE_FIT_WATCH,
                day,
            ));
        }
        samples
    }

    /// Morning armpit readings between 36.2 and 37.0 C for 7 days
    pub fn body_temperature(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..7 {
            let temperature = round_to(36.5 + self.rng.random_range(-0.3..=0.5), 1);
            let body = SampleBody::BodyTemperature {
                temperature: Measurement::new(temperature, MeasurementUnit::Celsius),
                time: self.timestamp(day, 16.0),
                measurement_location: "MEASUREMENT_LOCATION_ARMPIT".to_string(),
            };
            samples.push(self.sample(
                format!("temp_{day}"),
                DataType::BodyTemperature,
                body,
                &OMRON_THERMOMETER,
                day,
            ));
        }
        samples
    }

    /// One 20-60 minute workout for each of the past 5 days
    pub fn exercise(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for day in 0..5 {
            let exercise = EXERCISE_TYPES[self.rng.random_range(0..EXERCISE_TYPES.len())];
            let minutes: u32 = self.rng.random_range(20..=60);
            let calories = minutes * self.rng.random_range(5..=10u32);
            let body = SampleBody::ExerciseSession {
                exercise_type: format!("EXERCISE_TYPE_{exercise}"),
                start_time: self.timestamp(day, 8.0),
                end_time: self.timestamp(day, 8.0 - f64::from(minutes) / 60.0),
                duration: i64::from(minutes) * 60 * 1000,
                calories,
                distance: (exercise != "SWIMMING").then_some(minutes * 100),
            };
            samples.push(self.sample(
                format!("exercise_{day}"),
                DataType::ExerciseSession,
                body,
                &STRAVA_GARMIN,
                day,
            ));
        }
        samples
    }

    pub fn height(&mut self) -> Vec<Sample> {
        self.daily_instant(DataType::Height, "height", 16.0, &GOOGLE_FIT_PHONE, |rng| {
            Reading::Height(Measurement::new(
                round_to(1.70 + rng.random_range(-0.005..=0.005), 3),
                MeasurementUnit::Meter,
            ))
        })
    }

    pub fn body_fat(&mut self) -> Vec<Sample> {
        self.daily_instant(DataType::BodyFat, "body_fat", 16.0, &WITHINGS_SCALE, |rng| {
            Reading::Percentage(Measurement::new(
                round_to(rng.random_range(18.0..=25.0), 1),
                MeasurementUnit::Percent,
            ))
        })
    }

    pub fn resting_heart_rate(&mut self) -> Vec<Sample> {
        self.daily_instant(
            DataType::RestingHeartRate,
            "resting_hr",
            17.0,
            &SAMSUNG_WATCH,
            |rng| Reading::BeatsPerMinute(rng.random_range(50..=70)),
        )
    }

    pub fn blood_glucose(&mut self) -> Vec<Sample> {
        self.daily_instant(DataType::BloodGlucose, "glucose", 14.0, &GLUCOSE_METER, |rng| {
            Reading::Level(Measurement::new(
                round_to(rng.random_range(4.0..=7.0), 1),
                MeasurementUnit::MillimolesPerLiter,
            ))
        })
    }

    pub fn oxygen_saturation(&mut self) -> Vec<Sample> {
        self.daily_instant(
            DataType::OxygenSaturation,
            "spo2",
            18.0,
            &SAMSUNG_WATCH,
            |rng| {
                Reading::Percentage(Measurement::new(
                    f64::from(rng.random_range(95..=100u32)),
                    MeasurementUnit::Percent,
                ))
            },
        )
    }

    /// Afternoon walk distance, 500-5000 m
    pub fn distance(&mut self) -> Vec<Sample> {
        self.daily_interval(DataType::Distance, "distance", 12.0, 11.0, &GOOGLE_FIT_PHONE, |rng| {
            Reading::Distance(Measurement::new(
                f64::from(rng.random_range(500..=5000u32)),
                MeasurementUnit::Meter,
            ))
        })
    }

    pub fn total_calories(&mut self) -> Vec<Sample> {
        self.daily_interval(
            DataType::TotalCaloriesBurned,
            "total_calories",
            24.0,
            0.0,
            &SAMSUNG_WATCH,
            |rng| {
                Reading::Energy(Measurement::new(
                    f64::from(rng.random_range(1800..=2600u32)),
                    MeasurementUnit::Kilocalorie,
                ))
            },
        )
    }

    pub fn active_calories(&mut self) -> Vec<Sample> {
        self.daily_interval(
            DataType::ActiveCaloriesBurned,
            "active_calories",
            24.0,
            0.0,
            &FITBIT_TRACKER,
            |rng| {
                Reading::Energy(Measurement::new(
                    f64::from(rng.random_range(200..=800u32)),
                    MeasurementUnit::Kilocalorie,
                ))
            },
        )
    }

    fn daily_instant(
        &mut self,
        data_type: DataType,
        id_prefix: &str,
        hours_ago: f64,
        origin: &Origin,
        mut reading: impl FnMut(&mut R) -> Reading,
    ) -> Vec<Sample> {
        (0..7)
            .map(|day| {
                let body = SampleBody::Instant(InstantReading {
                    reading: reading(&mut self.rng),
                    time: self.timestamp(day, hours_ago),
                });
                self.sample(
                    format!("{id_prefix}_{day}"),
                    data_type.clone(),
                    body,
                    origin,
                    day,
                )
            })
            .collect()
    }

    fn daily_interval(
        &mut self,
        data_type: DataType,
        id_prefix: &str,
        start_hours_ago: f64,
        end_hours_ago: f64,
        origin: &Origin,
        mut reading: impl FnMut(&mut R) -> Reading,
    ) -> Vec<Sample> {
        (0..7)
            .map(|day| {
                let body = SampleBody::Interval(IntervalReading {
                    reading: reading(&mut self.rng),
                    start_time: self.timestamp(day, start_hours_ago),
                    end_time: self.timestamp(day, end_hours_ago),
                });
                self.sample(
                    format!("{id_prefix}_{day}"),
                    data_type.clone(),
                    body,
                    origin,
                    day,
                )
            })
            .collect()
    }

    /// Every fabricated sample of one data type, before truncation
    pub fn samples_for(&mut self, data_type: &DataType) -> Vec<Sample> {
        match data_type {
            DataType::Steps => self.steps(),
            DataType::HeartRate => self.heart_rate(),
            DataType::BloodPressure => self.blood_pressure(),
            DataType::Weight => self.weight(),
            DataType::Height => self.height(),
            DataType::BodyFat => self.body_fat(),
            DataType::SleepSession => self.sleep(),
            DataType::ExerciseSession => self.exercise(),
            DataType::Distance => self.distance(),
            DataType::TotalCaloriesBurned => self.total_calories(),
            DataType::ActiveCaloriesBurned => self.active_calories(),
            DataType::RestingHeartRate => self.resting_heart_rate(),
            DataType::BloodGlucose => self.blood_glucose(),
            DataType::OxygenSaturation => self.oxygen_saturation(),
            DataType::BodyTemperature => self.body_temperature(),
            DataType::Other(_) => Vec::new(),
        }
    }

    /// Build the full documentation manifest
    pub fn manifest(&mut self) -> SampleManifest {
        let mut data_types = BTreeMap::new();
        for data_type in DataType::SUPPORTED {
            let limit = match data_type {
                DataType::SleepSession | DataType::ExerciseSession => SESSION_SAMPLES_PER_TYPE,
                _ => SAMPLES_PER_TYPE,
            };
            let mut samples = self.samples_for(&data_type);
            samples.truncate(limit);
            data_types.insert(
                data_type.clone(),
                SampleSet {
                    description: describe(&data_type),
                    samples,
                },
            );
        }

        SampleManifest {
            generated_at: self.timestamp(0, 0.0),
            description: MANIFEST_DESCRIPTION.to_string(),
            data_types,
            permissions: Permissions {
                required: DataType::SUPPORTED
                    .iter()
                    .filter_map(read_permission)
                    .map(str::to_string)
                    .collect(),
            },
            data_origins: DataOrigins {
                description: "Example apps that write to Health Connect".to_string(),
                apps: EXAMPLE_DATA_ORIGINS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

/// Fabricator with a fixed reference and seed, for reproducible manifests
pub fn seeded_fabricator(reference: DateTime<Utc>, seed: u64) -> SampleFabricator<StdRng> {
    SampleFabricator::with_rng(reference, StdRng::seed_from_u64(seed))
}

fn describe(data_type: &DataType) -> String {
    let description = match data_type {
        DataType::Steps => "Step count",
        DataType::HeartRate => "Heart rate",
        DataType::BloodPressure => "Blood pressure",
        DataType::Weight => "Body weight",
        DataType::Height => "Height",
        DataType::BodyFat => "Body fat percentage",
        DataType::SleepSession => "Sleep session",
        DataType::ExerciseSession => "Exercise session",
        DataType::Distance => "Distance",
        DataType::TotalCaloriesBurned => "Total calories burned",
        DataType::ActiveCaloriesBurned => "Active calories burned",
        DataType::RestingHeartRate => "Resting heart rate",
        DataType::BloodGlucose => "Blood glucose",
        DataType::OxygenSaturation => "Oxygen saturation",
        DataType::BodyTemperature => "Body temperature",
        DataType::Other(name) => return format!("{name} data"),
    };
    format!("{description} data")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
