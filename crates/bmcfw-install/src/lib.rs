//! Firmware install orchestration for baseboard management controllers
//!
//! This crate drives asynchronous firmware installs on a BMC and reconciles
//! their progress across two device-side records: the generic Redfish task
//! and, for vendors that purge finished tasks, a vendor job mirror.
//!
//! # Architecture
//!
//! - [`state`]: canonical task states and per-vendor translation tables
//! - [`oem`]: decoding of vendor job records embedded in task OEM blocks
//! - [`provider`]: per-vendor capability profiles and install steps
//! - [`admission`]: refuses an install while a conflicting task is active
//! - [`installer`]: precondition-ordered upload and initiate
//! - [`reconcile`]: status polling with job-mirror fallback
//! - [`context`]: deadline and cancellation carried by every device call
//! - [`transport`]: the boundary a concrete BMC client implements
//! - [`error`]: error types
//!
//! The crate holds no state between calls. Connections, sessions and
//! credentials belong to the [`Transport`] handed to [`FirmwareInstaller`].
//!
//! # Example
//!
//! ```ignore
//! use bmcfw_install::prelude::*;
//!
//! # async fn example(transport: impl Transport) -> Result<(), FirmwareInstallError> {
//! let installer = FirmwareInstaller::new(transport, Provider::Dell);
//! let ctx = OperationContext::with_timeout(std::time::Duration::from_secs(30 * 60));
//!
//! let image = FirmwareImage::from_file("BIOS_0JK2R_WN64_2.19.0.EXE").await?;
//! let handle = installer
//!     .upload_and_initiate(&ctx, FirmwareComponent::Bios, &image)
//!     .await?;
//!
//! let status = installer
//!     .status(&ctx, &handle, FirmwareComponent::Bios, Some("2.19.0"))
//!     .await?;
//! println!("{}", status.status_line());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod admission;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod installer;
pub mod oem;
pub mod prelude;
pub mod provider;
pub mod reconcile;
pub mod state;
pub mod transport;

pub use admission::check_queueable;
pub use component::{FirmwareComponent, UnknownComponent};
pub use config::{DEFAULT_POLL_INTERVAL, InstallerConfig, MIN_UPLOAD_BUDGET};
pub use context::OperationContext;
pub use error::{ErrorKind, FirmwareInstallError, Result, TransportError};
pub use installer::FirmwareInstaller;
pub use oem::{DELL_ENVELOPE, JobDescriptor, OemEnvelope, OemError};
pub use provider::{InstallStep, NameMatch, Provider, TaskNaming, UnknownProvider};
pub use reconcile::{NOT_FOUND_GRACE_POLLS, StatusSource, TaskStatus, UNKNOWN_STATE_GRACE_POLLS};
pub use state::{DELL_JOB_STATES, REDFISH_TASK_STATES, StateTable, TaskState, UnmappedState};
pub use transport::{
    ApplyTime, FirmwareImage, JobRecord, Task, TaskHandle, TaskMessage, Transport,
    UpdateParameters,
};
