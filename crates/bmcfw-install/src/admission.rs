//! Admission control for firmware installs
//!
//! Installing twice onto the same component can brick it, so a new install
//! is only queued when no firmware task for that component is still active on
//! the device. The check is optimistic: it re-reads live device state on every
//! attempt and holds no lock, so two callers racing on the same component can
//! both pass before either task becomes visible.

use tracing::{debug, warn};

use crate::component::FirmwareComponent;
use crate::error::{FirmwareInstallError, Result};
use crate::oem;
use crate::provider::{NameMatch, Provider};
use crate::state::TaskState;
use crate::transport::Task;

/// Decide whether a firmware install for `component` may be queued
///
/// Tasks whose name identifies another component never block. Tasks that
/// match, or whose name cannot tell, block while their state is in the active
/// set, and also when their state cannot be classified.
///
/// # Errors
///
/// - [`FirmwareInstallError::TaskActive`] for a conflicting active task
/// - [`FirmwareInstallError::TaskStateAmbiguous`] for a matching task the
///   vendor reports as unknown
/// - [`FirmwareInstallError::TaskOemUnreadable`] for a matching task whose
///   vendor job record does not decode
/// - [`FirmwareInstallError::UnmappedTaskState`] for a matching task whose
///   state string is not in the provider's table
pub fn check_queueable(
    provider: Provider,
    component: FirmwareComponent,
    tasks: &[Task],
) -> Result<()> {
    let naming = provider.task_naming();

    for task in tasks {
        match naming.classify(&task.name, component) {
            NameMatch::Mismatch => continue,
            NameMatch::Match | NameMatch::Ambiguous => {}
        }

        let (raw_state, state) = admission_state(provider, component, task)?;

        debug!(
            task_id = %task.id,
            task_name = %task.name,
            %raw_state,
            %state,
            "evaluating task for admission"
        );

        if state == TaskState::Unknown {
            warn!(task_id = %task.id, %component, "task state is unknown, refusing install");
            return Err(FirmwareInstallError::TaskStateAmbiguous {
                component,
                task_id: task.id.clone(),
                state: raw_state,
            });
        }

        if state.is_active() {
            warn!(
                task_id = %task.id,
                %component,
                %raw_state,
                "firmware task already active"
            );
            return Err(FirmwareInstallError::TaskActive {
                component,
                task_id: task.id.clone(),
                state: raw_state,
                status: task.task_status.clone(),
            });
        }
    }

    Ok(())
}

/// Canonical state of a task as seen by admission control
///
/// For providers that embed a job record, that record's state wins over the
/// coarser generic state, the same precedence the reconciler applies. A record
/// that cannot be decoded leaves the task's state unknown, so the install is
/// refused rather than judged from the generic state.
fn admission_state(
    provider: Provider,
    component: FirmwareComponent,
    task: &Task,
) -> Result<(String, TaskState)> {
    let (raw, table) = match provider.oem_envelope().zip(provider.job_states()) {
        Some((envelope, table)) => {
            let descriptor = oem::decode(envelope, &task.oem).map_err(|source| {
                warn!(
                    task_id = %task.id,
                    %component,
                    error = %source,
                    "unreadable job record, refusing install"
                );
                FirmwareInstallError::TaskOemUnreadable {
                    component,
                    task_id: task.id.clone(),
                    source,
                }
            })?;
            (descriptor.job_state, table)
        }
        None => (task.task_state.clone(), provider.task_states()),
    };

    let state = table
        .translate(&raw)
        .map_err(|e| FirmwareInstallError::UnmappedTaskState {
            task_id: task.id.clone(),
            table: e.table,
            raw_state: e.raw,
        })?;
    Ok((raw, state))
}
