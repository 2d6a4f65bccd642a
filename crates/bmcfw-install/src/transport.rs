//! Transport boundary consumed by the installer
//!
//! The installer never opens connections. It is handed a [`Transport`] that
//! already knows how to reach and authenticate against one BMC, which keeps
//! admission and reconciliation testable against a fake with no network.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// Opaque task identifier returned by the device when an install is initiated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Wrap a device-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Generic Redfish task resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    /// Task id
    #[serde(rename = "Id")]
    pub id: String,

    /// Task name; vendors encode the target component here
    #[serde(default)]
    pub name: String,

    /// Raw task state
    #[serde(default)]
    pub task_state: String,

    /// Raw health status (`OK`, `Warning`, `Critical`)
    #[serde(default)]
    pub task_status: String,

    /// Progress, when the device reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u8>,

    /// Messages attached to the task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<TaskMessage>,

    /// Vendor extension block; `{}` when the device sends none
    #[serde(default = "empty_object", deserialize_with = "deserialize_oem")]
    pub oem: Value,
}

fn deserialize_oem<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => empty_object(),
        other => other,
    })
}

impl Task {
    /// Most recent message text, if any
    pub fn latest_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .map(|m| m.message.as_str())
            .find(|m| !m.is_empty())
    }
}

/// Message entry attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskMessage {
    /// Message registry id
    #[serde(rename = "MessageId", default)]
    pub message_id: String,
    /// Message text
    #[serde(default)]
    pub message: String,
}

/// Vendor job record that outlives the generic task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobRecord {
    /// Job id, equal to the task handle
    #[serde(rename = "Id")]
    pub id: String,

    /// Job name
    #[serde(default)]
    pub name: String,

    /// Raw vendor job state
    pub job_state: String,

    /// Vendor job type
    #[serde(default)]
    pub job_type: String,

    /// Latest message
    #[serde(default)]
    pub message: String,

    /// Progress
    #[serde(default)]
    pub percent_complete: Option<u8>,
}

/// When the device should apply an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyTime {
    /// Apply as soon as the upload is verified
    Immediate,
    /// Stage the image and apply it on the next reset
    OnReset,
    /// Stage the image until an explicit start request
    OnStartUpdateRequest,
}

impl std::fmt::Display for ApplyTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyTime::Immediate => write!(f, "Immediate"),
            ApplyTime::OnReset => write!(f, "OnReset"),
            ApplyTime::OnStartUpdateRequest => write!(f, "OnStartUpdateRequest"),
        }
    }
}

/// Parameter object sent alongside the image in a multipart update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParameters {
    /// Resources to update; empty lets the device pick from the image
    #[serde(rename = "Targets", default)]
    pub targets: Vec<String>,

    /// When to apply the update
    #[serde(rename = "@Redfish.OperationApplyTime")]
    pub apply_time: ApplyTime,

    /// Vendor extension block
    #[serde(rename = "Oem", default = "empty_object")]
    pub oem: Value,
}

impl UpdateParameters {
    /// Parameters with no targets and an empty OEM block
    pub fn new(apply_time: ApplyTime) -> Self {
        Self {
            targets: Vec::new(),
            apply_time,
            oem: empty_object(),
        }
    }

    /// Set the target resources
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }
}

/// Firmware image to upload
#[derive(Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    /// File name presented to the device
    pub file_name: String,
    /// Image bytes
    pub data: Vec<u8>,
}

impl std::fmt::Debug for FirmwareImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirmwareImage")
            .field("file_name", &self.file_name)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

impl FirmwareImage {
    /// Wrap in-memory image bytes
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Read an image from disk
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "firmware.bin".to_string());
        Ok(Self { file_name, data })
    }

    /// Image size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Hex SHA-256 of the image, logged so operators can match uploads to artifacts
    pub fn sha256_hex(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        hex::encode(hasher.finalize())
    }
}

/// Authenticated access to one BMC's task, job and update endpoints
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// List every task currently known to the device
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError>;

    /// Fetch one task; [`TransportError::NotFound`] when the device has no such task
    async fn get_task(&self, id: &str) -> Result<Task, TransportError>;

    /// Upload an image and start the install, returning the task handle
    async fn upload_firmware(
        &self,
        image: &FirmwareImage,
        params: &UpdateParameters,
    ) -> Result<TaskHandle, TransportError>;

    /// Fetch the vendor job mirror for a handle
    async fn get_job(&self, id: &str) -> Result<JobRecord, TransportError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        (**self).list_tasks().await
    }

    async fn get_task(&self, id: &str) -> Result<Task, TransportError> {
        (**self).get_task(id).await
    }

    async fn upload_firmware(
        &self,
        image: &FirmwareImage,
        params: &UpdateParameters,
    ) -> Result<TaskHandle, TransportError> {
        (**self).upload_firmware(image, params).await
    }

    async fn get_job(&self, id: &str) -> Result<JobRecord, TransportError> {
        (**self).get_job(id).await
    }
}
