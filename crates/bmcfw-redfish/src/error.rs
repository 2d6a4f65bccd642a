//! Errors raised while building a Redfish client

use thiserror::Error;

/// Reasons a [`RedfishTransport`](crate::RedfishTransport) cannot be built
#[derive(Error, Debug)]
pub enum RedfishError {
    /// The configured base URL is not an absolute http(s) URL
    #[error("invalid BMC base URL {url}: {message}")]
    InvalidBaseUrl {
        /// URL as configured
        url: String,
        /// Parser message
        message: String,
    },

    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
