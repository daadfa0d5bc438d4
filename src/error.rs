//! Error types for the Health Connect extractor

use thiserror::Error;

use crate::bridge::BridgeError;
use crate::types::DataType;

/// Errors that can occur while extracting, normalizing or persisting records
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No Android device is connected")]
    NoDevice,

    #[error("Health Connect ({0}) is not installed on the device")]
    HealthConnectMissing(String),

    #[error("Device bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Malformed {field} value {value:?} in {data_type} record")]
    MalformedNumber {
        data_type: DataType,
        field: String,
        value: String,
    },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
