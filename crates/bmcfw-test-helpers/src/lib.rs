//! Shared test utilities for the BMC firmware install crates.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fake`] - Scripted in-memory [`Transport`](bmcfw_install::Transport)
//! - [`fixtures`] - Task, job and image fixtures shaped like real device payloads
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! bmcfw-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use bmcfw_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod must;
pub mod prelude;

#[cfg(feature = "fake")]
#[cfg_attr(docsrs, doc(cfg(feature = "fake")))]
pub mod fake;

#[cfg(feature = "fixtures")]
#[cfg_attr(docsrs, doc(cfg(feature = "fixtures")))]
pub mod fixtures;

pub use must::*;
