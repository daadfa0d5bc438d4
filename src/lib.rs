//! Health Connect Extractor - Pull Android Health Connect records over adb
//!
//! The extractor queries the Health Connect content provider on a connected
//! device through a shell bridge, one data type at a time, and turns the textual
//! rows into canonical records: bridge query → row parsing → normalization →
//! report.
//!
//! ## Modules
//!
//! - **Extraction**: [`extractor::Extractor`] over any [`bridge::DeviceBridge`]
//! - **Reports**: [`report::ReportBuilder`] for the persisted JSON document
//! - **Samples**: [`sample::SampleFabricator`] for synthetic, schema-faithful records

pub mod bridge;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod sample;
pub mod types;

pub use bridge::{AdbBridge, BridgeError, DeviceBridge, ShellOutput};
pub use error::ExtractError;
pub use extractor::{ExtractionRun, Extractor, ExtractorConfig, QueryOutcome};
pub use report::{Report, ReportBuilder};
pub use sample::{SampleFabricator, SampleManifest};
pub use types::{CanonicalRecord, DataType, ExtractionContext, RawFieldMap};

/// Extractor version recorded in every report
pub const EXTRACTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name shown by diagnostics
pub const PRODUCER_NAME: &str = "health-connect-extractor";
