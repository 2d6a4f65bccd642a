//! Redfish HTTP transport for BMC firmware installs
//!
//! [`RedfishTransport`] implements [`bmcfw_install::Transport`] over
//! `reqwest`. It lists and fetches generic tasks, pushes images through the
//! update service's multipart endpoint, and reads vendor job mirrors when the
//! configuration names one.
//!
//! # Example
//!
//! ```ignore
//! use bmcfw_install::{FirmwareInstaller, Provider};
//! use bmcfw_redfish::{RedfishConfig, RedfishTransport};
//!
//! let config = RedfishConfig::new("https://10.0.0.12", "root", "calvin")
//!     .for_provider(Provider::Dell)
//!     .with_insecure(true);
//! let installer = FirmwareInstaller::new(RedfishTransport::new(config)?, Provider::Dell);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod transport;

pub use config::{DELL_JOB_MIRROR_PATH, RedfishConfig, TASK_SERVICE_PATH, UPDATE_SERVICE_PATH};
pub use error::RedfishError;
pub use transport::RedfishTransport;
