//! Error types for bmcfwctl CLI

use bmcfw_install::{ErrorKind, FirmwareInstallError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Install failed: {0}")]
    Install(#[from] FirmwareInstallError),

    #[error("Invalid BMC connection settings: {0}")]
    Connection(#[from] bmcfw_redfish::RedfishError),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::MissingArgument(_) | CliError::Connection(_) => 2,
            CliError::Install(e) => install_exit_code(e),
        }
    }
}

fn install_exit_code(error: &FirmwareInstallError) -> i32 {
    match error.kind() {
        ErrorKind::Precondition => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Transport => 4,
        ErrorKind::Decode | ErrorKind::Interrupted | ErrorKind::Io => 1,
    }
}

/// Exit code for any error surfaced by a command
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(cli) = error.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    error
        .downcast_ref::<FirmwareInstallError>()
        .map_or(1, install_exit_code)
}
