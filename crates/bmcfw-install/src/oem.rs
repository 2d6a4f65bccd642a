//! Vendor OEM job descriptor decoding
//!
//! Some vendors embed their own job record inside the `Oem` block of a
//! generic Redfish task:
//!
//! ```json
//! { "Oem": { "Dell": { "JobType": "FirmwareUpdate", "JobState": "Scheduled", ... } } }
//! ```
//!
//! Decoding is pure. It validates the envelope, the required descriptive
//! fields and the job type, and never fills in missing values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Reasons an OEM block cannot be turned into a [`JobDescriptor`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OemError {
    /// The block is absent, `null`, or `{}`
    #[error("empty OEM data")]
    EmptyOemData,

    /// The block is not valid JSON, not an object, or has fields of the wrong type
    #[error("unparseable OEM data: {0}")]
    UnparseableOemData(String),

    /// The block lacks the vendor object, or the job record lacks a
    /// description or a state
    #[error("invalid OEM data: {0}")]
    InvalidOemData(String),

    /// The job record describes some other kind of job
    #[error("unexpected job type: expected {expected}, got {actual:?}")]
    UnexpectedJobType {
        /// Job type the decoder accepts
        expected: &'static str,
        /// Job type found in the payload
        actual: String,
    },
}

/// Where a vendor keeps its job record and which job type it must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OemEnvelope {
    /// Key of the vendor object inside `Oem`
    pub vendor_key: &'static str,
    /// Job type accepted for firmware installs
    pub expected_job_type: &'static str,
}

/// Dell iDRAC job record embedded in task `Oem.Dell`
pub const DELL_ENVELOPE: OemEnvelope = OemEnvelope {
    vendor_key: "Dell",
    expected_job_type: "FirmwareUpdate",
};

/// Vendor job record carried inside a task's OEM block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobDescriptor {
    /// Vendor job id
    #[serde(rename = "Id", default)]
    pub id: String,

    /// Job name
    #[serde(default)]
    pub name: String,

    /// Human description
    #[serde(default)]
    pub description: String,

    /// Raw vendor job state
    #[serde(default)]
    pub job_state: String,

    /// Vendor job type
    #[serde(default)]
    pub job_type: String,

    /// Latest human-readable message
    #[serde(default)]
    pub message: String,

    /// Vendor message registry id
    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Progress reported by the vendor
    #[serde(default)]
    pub percent_complete: u8,

    /// Start timestamp as reported by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// End timestamp as reported by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Whether an extension block is the absent/empty sentinel
pub fn is_empty_extension(oem: &Value) -> bool {
    match oem {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Decode a vendor job descriptor from a task's OEM block
///
/// # Errors
///
/// See [`OemError`]; each failure mode maps to one variant.
pub fn decode(envelope: &OemEnvelope, oem: &Value) -> Result<JobDescriptor, OemError> {
    if is_empty_extension(oem) {
        return Err(OemError::EmptyOemData);
    }

    let Value::Object(map) = oem else {
        return Err(OemError::UnparseableOemData(format!(
            "expected an object, got {}",
            json_kind(oem)
        )));
    };

    let vendor = map.get(envelope.vendor_key).ok_or_else(|| {
        OemError::InvalidOemData(format!("missing {} object", envelope.vendor_key))
    })?;

    let descriptor: JobDescriptor = serde_json::from_value(vendor.clone())
        .map_err(|e| OemError::UnparseableOemData(e.to_string()))?;

    validate(envelope, descriptor)
}

/// Decode a vendor job descriptor from raw OEM bytes
///
/// # Errors
///
/// Syntax errors are reported as [`OemError::UnparseableOemData`]; all other
/// failures are those of [`decode`].
pub fn decode_slice(envelope: &OemEnvelope, raw: &[u8]) -> Result<JobDescriptor, OemError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(OemError::EmptyOemData);
    }
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| OemError::UnparseableOemData(e.to_string()))?;
    decode(envelope, &value)
}

fn validate(envelope: &OemEnvelope, descriptor: JobDescriptor) -> Result<JobDescriptor, OemError> {
    if descriptor.description.trim().is_empty() {
        return Err(OemError::InvalidOemData("missing Description".to_string()));
    }
    if descriptor.job_state.trim().is_empty() {
        return Err(OemError::InvalidOemData("missing JobState".to_string()));
    }
    if descriptor.job_type != envelope.expected_job_type {
        return Err(OemError::UnexpectedJobType {
            expected: envelope.expected_job_type,
            actual: descriptor.job_type,
        });
    }
    Ok(descriptor)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
