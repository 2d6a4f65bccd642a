//! Read-only commands: `steps`, `tasks` and `status`

use anyhow::Result;
use bmcfw_install::{FirmwareComponent, TaskHandle, Transport};

use crate::client::BmcArgs;
use crate::commands::operation_context;
use crate::error::CliError;
use crate::output;

/// Show the install plan the provider follows for a component
pub fn steps(bmc: &BmcArgs, component: FirmwareComponent, json: bool) -> Result<()> {
    let steps = bmc
        .provider
        .install_steps(component)
        .map_err(CliError::from)?;
    output::print_steps(bmc.provider, component, &steps, json);
    Ok(())
}

/// List the tasks currently on the BMC
pub async fn tasks(bmc: &BmcArgs, json: bool) -> Result<()> {
    let installer = bmc.connect()?;
    let ctx = operation_context(None);
    let tasks = ctx
        .run("list tasks", installer.transport().list_tasks())
        .await
        .map_err(CliError::from)?;
    output::print_tasks(&tasks, json);
    Ok(())
}

/// Poll one install once
pub async fn status(
    bmc: &BmcArgs,
    component: FirmwareComponent,
    task_id: &str,
    expected_version: Option<&str>,
    json: bool,
) -> Result<()> {
    let installer = bmc.connect()?;
    let ctx = operation_context(None);
    let status = installer
        .status(&ctx, &TaskHandle::new(task_id), component, expected_version)
        .await
        .map_err(CliError::from)?;
    output::print_status(&status, json);
    Ok(())
}
