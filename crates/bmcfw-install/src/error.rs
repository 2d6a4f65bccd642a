//! Error types for firmware install operations
//!
//! Every variant carries enough context (component, task id, raw vendor state)
//! to be logged verbatim by an operator.

use std::time::Duration;

use thiserror::Error;

use crate::component::FirmwareComponent;
use crate::oem::OemError;
use crate::provider::Provider;
use crate::state::TaskState;

/// Errors returned by a [`Transport`](crate::transport::Transport) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The requested resource does not exist on the device
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The device rejected the credentials
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The request never produced a response
    #[error("connection failed: {0}")]
    Connection(String),

    /// The device answered with an unexpected HTTP status
    #[error("unexpected status {status} from {url}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
        /// Response body, possibly truncated
        body: String,
    },

    /// The response body could not be decoded
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL
        url: String,
        /// Decoder message
        message: String,
    },

    /// The transport does not offer this capability
    #[error("operation not supported by transport: {0}")]
    Unsupported(String),
}

impl TransportError {
    /// Whether the device reported the resource as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound(_))
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        TransportError::NotFound(resource.into())
    }
}

/// Coarse classification of a [`FirmwareInstallError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition refused the operation before anything was sent to the device
    Precondition,
    /// The transport failed while talking to the device
    Transport,
    /// Neither the task nor its job mirror exists
    NotFound,
    /// Vendor data could not be interpreted
    Decode,
    /// The operation was cut short by its deadline or by cancellation
    Interrupted,
    /// A local file could not be read
    Io,
}

/// Errors that can occur while installing firmware or tracking an install
#[derive(Error, Debug)]
pub enum FirmwareInstallError {
    /// Not enough time left on the caller's deadline to start an upload
    #[error(
        "insufficient deadline: {remaining:?} remaining, at least {required:?} required to start a firmware upload"
    )]
    InsufficientDeadline {
        /// Minimum budget required before an upload may begin
        required: Duration,
        /// Time left on the caller's deadline
        remaining: Duration,
    },

    /// A firmware task for the same component is still occupying the install slot
    #[error(
        "a firmware task is already active for component {component}: id: {task_id}, state: {state}, status: {status}"
    )]
    TaskActive {
        /// Requested component
        component: FirmwareComponent,
        /// Conflicting task id
        task_id: String,
        /// Raw vendor state of the conflicting task
        state: String,
        /// Raw status of the conflicting task
        status: String,
    },

    /// A matching task reports a state that cannot be classified as active or terminal
    #[error(
        "cannot determine whether task {task_id} blocks component {component}: state {state} is ambiguous"
    )]
    TaskStateAmbiguous {
        /// Requested component
        component: FirmwareComponent,
        /// Task id
        task_id: String,
        /// Raw vendor state
        state: String,
    },

    /// A matching task carries a vendor job record that cannot be read
    #[error("cannot determine whether task {task_id} blocks component {component}: {source}")]
    TaskOemUnreadable {
        /// Requested component
        component: FirmwareComponent,
        /// Task id
        task_id: String,
        /// Decoder failure
        #[source]
        source: OemError,
    },

    /// The provider does not support firmware installs for this component
    #[error("unsupported hardware: provider {provider} cannot install firmware on {component}")]
    UnsupportedHardware {
        /// Provider
        provider: Provider,
        /// Component
        component: FirmwareComponent,
    },

    /// A vendor state string is missing from the provider's state table
    #[error("task {task_id}: state {raw_state:?} is not in the {table} state table")]
    UnmappedTaskState {
        /// Task id
        task_id: String,
        /// Name of the state table consulted
        table: &'static str,
        /// Raw vendor state
        raw_state: String,
    },

    /// The firmware image cannot be uploaded as given
    #[error("invalid firmware image: {0}")]
    InvalidFirmware(String),

    /// The vendor OEM block attached to a task could not be decoded
    #[error("task {task_id}: {source}")]
    Oem {
        /// Task id
        task_id: String,
        /// Decoder failure
        #[source]
        source: OemError,
    },

    /// Neither the generic task nor its job mirror exists on the device
    #[error("task {task_id} not found on the device (checked: {checked})")]
    TaskNotFound {
        /// Task id
        task_id: String,
        /// Sources that were consulted
        checked: &'static str,
    },

    /// The transport failed
    #[error("{operation} failed: {source}")]
    Transport {
        /// Transport operation that failed
        operation: &'static str,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// The caller's deadline expired while an operation was in flight
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded {
        /// Operation in flight
        operation: &'static str,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled: {operation}")]
    Cancelled {
        /// Operation in flight
        operation: &'static str,
    },

    /// The polled task kept reporting the vendor's unknown state
    #[error("task {task_id}: state {raw_state:?} stayed unknown for {polls} consecutive polls")]
    TaskStateUnresolved {
        /// Task id
        task_id: String,
        /// Raw vendor state
        raw_state: String,
        /// Consecutive polls that reported it
        polls: u32,
    },

    /// The polled task finished in a state other than success
    #[error("task {task_id} finished as {state}: {status}")]
    TaskFailed {
        /// Task id
        task_id: String,
        /// Terminal canonical state
        state: TaskState,
        /// Human status line
        status: String,
    },

    /// I/O error while reading a firmware image
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FirmwareInstallError {
    /// Classify the error per the propagation policy
    pub fn kind(&self) -> ErrorKind {
        match self {
            FirmwareInstallError::InsufficientDeadline { .. }
            | FirmwareInstallError::TaskActive { .. }
            | FirmwareInstallError::TaskStateAmbiguous { .. }
            | FirmwareInstallError::TaskOemUnreadable { .. }
            | FirmwareInstallError::UnsupportedHardware { .. }
            | FirmwareInstallError::InvalidFirmware(_) => ErrorKind::Precondition,
            FirmwareInstallError::Transport { .. } => ErrorKind::Transport,
            FirmwareInstallError::TaskNotFound { .. } => ErrorKind::NotFound,
            FirmwareInstallError::UnmappedTaskState { .. }
            | FirmwareInstallError::Oem { .. }
            | FirmwareInstallError::TaskStateUnresolved { .. }
            | FirmwareInstallError::TaskFailed { .. } => ErrorKind::Decode,
            FirmwareInstallError::DeadlineExceeded { .. }
            | FirmwareInstallError::Cancelled { .. } => ErrorKind::Interrupted,
            FirmwareInstallError::IoError(_) => ErrorKind::Io,
        }
    }

    /// Whether the operation was refused before anything reached the device
    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }

    /// Whether the task is unknown to the device
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn transport(operation: &'static str, source: TransportError) -> Self {
        FirmwareInstallError::Transport { operation, source }
    }
}

/// Result type for firmware install operations
pub type Result<T> = std::result::Result<T, FirmwareInstallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_task_context() {
        let err = FirmwareInstallError::TaskActive {
            component: FirmwareComponent::Bios,
            task_id: "JID_467696020275".to_string(),
            state: "Running".to_string(),
            status: "OK".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "a firmware task is already active for component bios: id: JID_467696020275, state: Running, status: OK"
        );
    }

    #[test]
    fn test_error_kind_classification() {
        let precondition = FirmwareInstallError::InsufficientDeadline {
            required: Duration::from_secs(600),
            remaining: Duration::from_secs(60),
        };
        assert!(precondition.is_precondition());

        let not_found = FirmwareInstallError::TaskNotFound {
            task_id: "JID_1".to_string(),
            checked: "task, job mirror",
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_precondition());

        let transport = FirmwareInstallError::transport(
            "get task",
            TransportError::Connection("reset by peer".to_string()),
        );
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert!(!transport.is_not_found());

        let io = FirmwareInstallError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(!io.is_precondition());
        assert!(!io.is_not_found());

        let unreadable = FirmwareInstallError::TaskOemUnreadable {
            component: FirmwareComponent::Bios,
            task_id: "JID_1".to_string(),
            source: OemError::InvalidOemData("missing Description".to_string()),
        };
        assert!(unreadable.is_precondition());
    }

    #[test]
    fn test_transport_not_found() {
        assert!(TransportError::not_found("Tasks/JID_1").is_not_found());
        assert!(!TransportError::Unauthorized("bad credentials".into()).is_not_found());
    }
}
