//! `install`: upload an image, start the install and optionally wait for it
//!
//! The command is the caller of the install library: it picks the deadline,
//! owns the poll cadence and decides whether to retry. It never retries an
//! upload on its own.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use bmcfw_install::{FirmwareComponent, FirmwareImage, FirmwareInstallError, InstallerConfig};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::client::BmcArgs;
use crate::commands::operation_context;
use crate::error::CliError;
use crate::output;

/// Options for `install`
#[derive(Debug, Clone)]
pub struct InstallOptions<'a> {
    pub component: FirmwareComponent,
    pub file: &'a Path,
    pub deadline_mins: Option<u64>,
    pub wait: bool,
    pub poll_secs: Option<u64>,
    pub expected_version: Option<&'a str>,
}

/// Installer tunables for this run; `--poll-secs` overrides the default cadence
fn installer_config(poll_secs: Option<u64>) -> InstallerConfig {
    let config = InstallerConfig::default();
    match poll_secs {
        Some(secs) => config.with_poll_interval(Duration::from_secs(secs.max(1))),
        None => config,
    }
}

fn spinner(message: String, json: bool) -> Result<ProgressBar> {
    if json {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

/// Execute install command
pub async fn execute(bmc: &BmcArgs, opts: &InstallOptions<'_>, json: bool) -> Result<()> {
    let image = FirmwareImage::from_file(opts.file)
        .await
        .map_err(|e| CliError::from(FirmwareInstallError::from(e)))?;
    let installer = bmc.connect_with(installer_config(opts.poll_secs))?;
    let ctx = operation_context(opts.deadline_mins);

    let pb = spinner(
        format!("Uploading {} ({} bytes)", image.file_name, image.size_bytes()),
        json,
    )?;
    let handle = installer
        .upload_and_initiate(&ctx, opts.component, &image)
        .await;
    pb.finish_and_clear();
    let handle = handle.map_err(CliError::from)?;
    output::print_handle(&handle, opts.component, json);

    if !opts.wait {
        return Ok(());
    }

    info!(
        task_id = %handle,
        poll_interval = ?installer.config().poll_interval,
        "waiting for install to finish"
    );
    let pb = spinner(format!("Waiting for task {handle}"), json)?;
    let status = installer
        .wait_for_completion(&ctx, &handle, opts.component, opts.expected_version)
        .await;
    pb.finish_and_clear();
    let status = status.map_err(CliError::from)?;
    output::print_status(&status, json);
    Ok(())
}
