//! Convenience re-exports for common firmware install types

pub use crate::admission::check_queueable;
pub use crate::component::FirmwareComponent;
pub use crate::config::InstallerConfig;
pub use crate::context::OperationContext;
pub use crate::error::{ErrorKind, FirmwareInstallError, TransportError};
pub use crate::installer::FirmwareInstaller;
pub use crate::oem::{JobDescriptor, OemError};
pub use crate::provider::{InstallStep, Provider};
pub use crate::reconcile::{StatusSource, TaskStatus};
pub use crate::state::TaskState;
pub use crate::transport::{
    ApplyTime, FirmwareImage, JobRecord, Task, TaskHandle, Transport, UpdateParameters,
};
