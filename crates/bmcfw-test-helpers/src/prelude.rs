//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use bmcfw_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_err};

#[cfg(feature = "fake")]
pub use crate::fake::{FakeCall, FakeTransport};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{
    DELL_JOB_ID, dell_oem, dell_task, firmware_image, job_record, redfish_task,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
