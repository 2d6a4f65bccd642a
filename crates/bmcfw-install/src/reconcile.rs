//! Task reconciliation
//!
//! A status poll reconstructs the install state from scratch on every call.
//! The generic task is consulted first. Vendors that purge finished tasks keep
//! a job mirror keyed by the same handle, and a task that is missing, whether
//! not yet visible or already purged, is looked up there.
//!
//! When a task carries a vendor OEM job record, that record's state is
//! authoritative over the task's own coarser `TaskState`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::component::FirmwareComponent;
use crate::context::OperationContext;
use crate::error::{FirmwareInstallError, Result, TransportError};
use crate::installer::FirmwareInstaller;
use crate::oem;
use crate::state::{StateTable, TaskState};
use crate::transport::{JobRecord, Task, TaskHandle, Transport};

/// Consecutive not-found polls tolerated by [`FirmwareInstaller::wait_for_completion`]
///
/// A task polled right after initiation may not be visible yet.
pub const NOT_FOUND_GRACE_POLLS: u32 = 3;

/// Consecutive polls in the vendor's unknown state tolerated by
/// [`FirmwareInstaller::wait_for_completion`]
pub const UNKNOWN_STATE_GRACE_POLLS: u32 = 3;

/// Which device record a status was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// The generic task, or the OEM job record embedded in it
    Task,
    /// The vendor job mirror
    JobMirror,
}

impl std::fmt::Display for StatusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusSource::Task => write!(f, "task"),
            StatusSource::JobMirror => write!(f, "job mirror"),
        }
    }
}

/// Result of one status poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Handle that was polled
    pub handle: TaskHandle,
    /// Component being installed
    pub component: FirmwareComponent,
    /// Canonical state
    pub state: TaskState,
    /// State string as reported by the device
    pub raw_state: String,
    /// Latest human-readable message
    pub message: String,
    /// Progress, when reported
    pub percent_complete: Option<u8>,
    /// Record the status came from
    pub source: StatusSource,
    /// Version the caller expects once the install finishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,
}

impl TaskStatus {
    /// One-line summary for operators
    pub fn status_line(&self) -> String {
        let progress = self
            .percent_complete
            .map_or_else(|| "n/a".to_string(), |p| format!("{p}%"));
        format!(
            "id: {}, state: {} ({}), status: {}, progress: {}",
            self.handle, self.raw_state, self.state, self.message, progress
        )
    }

    /// Whether the install has finished
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.status_line())
    }
}

impl<T: Transport> FirmwareInstaller<T> {
    /// Poll the install identified by `handle`
    ///
    /// # Errors
    ///
    /// - [`FirmwareInstallError::Oem`] when the task's OEM job record is
    ///   empty or malformed
    /// - [`FirmwareInstallError::UnmappedTaskState`] when the device reports
    ///   a state missing from the provider's table
    /// - [`FirmwareInstallError::TaskNotFound`] when neither the task nor its
    ///   job mirror exists
    /// - [`FirmwareInstallError::Transport`] for every other device failure
    #[instrument(skip(self, ctx), fields(provider = %self.provider))]
    pub async fn status(
        &self,
        ctx: &OperationContext,
        handle: &TaskHandle,
        component: FirmwareComponent,
        expected_version: Option<&str>,
    ) -> Result<TaskStatus> {
        let (state, raw_state, message, percent_complete, source) = match ctx
            .run("get task", self.transport.get_task(handle.as_str()))
            .await
        {
            Ok(task) => {
                debug!("reading status from task");
                let (state, raw, message, percent) = self.read_task(&task)?;
                (state, raw, message, percent, StatusSource::Task)
            }
            Err(FirmwareInstallError::Transport {
                source: TransportError::NotFound(_),
                ..
            }) => {
                let job = self.find_job(ctx, handle).await?;
                debug!("task not found, reading status from job mirror");
                let state = translate(self.mirror_table(), &job.id, &job.job_state)?;
                (
                    state,
                    job.job_state,
                    job.message,
                    job.percent_complete,
                    StatusSource::JobMirror,
                )
            }
            Err(e) => return Err(e),
        };

        let status = TaskStatus {
            handle: handle.clone(),
            component,
            state,
            raw_state,
            message,
            percent_complete,
            source,
            expected_version: expected_version.map(str::to_string),
        };
        debug!(status = %status, %source, "polled firmware task");
        Ok(status)
    }

    /// Poll until the install reaches a terminal state
    ///
    /// Polls are spaced by the configured
    /// [`poll_interval`](crate::config::InstallerConfig::poll_interval).
    /// The device may not list a task immediately after initiation, so up to
    /// [`NOT_FOUND_GRACE_POLLS`] consecutive not-found polls are tolerated.
    /// Likewise up to [`UNKNOWN_STATE_GRACE_POLLS`] consecutive polls in the
    /// vendor's unknown state are tolerated before giving up.
    ///
    /// # Errors
    ///
    /// [`FirmwareInstallError::TaskFailed`] when the task ends unsuccessfully,
    /// [`FirmwareInstallError::TaskStateUnresolved`] when the state stays
    /// unknown, otherwise any error from [`FirmwareInstaller::status`] or the
    /// context.
    pub async fn wait_for_completion(
        &self,
        ctx: &OperationContext,
        handle: &TaskHandle,
        component: FirmwareComponent,
        expected_version: Option<&str>,
    ) -> Result<TaskStatus> {
        let interval = self.config.poll_interval;
        let mut misses = 0u32;
        let mut unknown = 0u32;
        loop {
            match self.status(ctx, handle, component, expected_version).await {
                Ok(status) if status.state == TaskState::Succeeded => {
                    info!(task_id = %handle, "firmware install completed");
                    return Ok(status);
                }
                Ok(status) if status.state == TaskState::Failed => {
                    warn!(task_id = %handle, status = %status, "firmware install failed");
                    return Err(FirmwareInstallError::TaskFailed {
                        task_id: handle.to_string(),
                        state: status.state,
                        status: status.status_line(),
                    });
                }
                Ok(status) if status.state == TaskState::Unknown => {
                    misses = 0;
                    unknown = unknown.saturating_add(1);
                    if unknown > UNKNOWN_STATE_GRACE_POLLS {
                        warn!(task_id = %handle, polls = unknown, "task state stayed unknown");
                        return Err(FirmwareInstallError::TaskStateUnresolved {
                            task_id: handle.to_string(),
                            raw_state: status.raw_state,
                            polls: unknown,
                        });
                    }
                    debug!(status = %status, unknown, "task state unknown");
                }
                Ok(status) => {
                    misses = 0;
                    unknown = 0;
                    debug!(status = %status, "firmware install in progress");
                }
                Err(e) if e.is_not_found() && misses < NOT_FOUND_GRACE_POLLS => {
                    misses = misses.saturating_add(1);
                    debug!(task_id = %handle, misses, "task not visible yet");
                }
                Err(e) => return Err(e),
            }
            ctx.sleep("wait for completion", interval).await?;
        }
    }

    fn read_task(&self, task: &Task) -> Result<(TaskState, String, String, Option<u8>)> {
        if let Some((envelope, table)) = self.provider.oem_envelope().zip(self.provider.job_states())
        {
            let descriptor =
                oem::decode(envelope, &task.oem).map_err(|source| FirmwareInstallError::Oem {
                    task_id: task.id.clone(),
                    source,
                })?;
            let state = translate(table, &task.id, &descriptor.job_state)?;
            return Ok((
                state,
                descriptor.job_state,
                descriptor.message,
                Some(descriptor.percent_complete),
            ));
        }

        let state = translate(self.provider.task_states(), &task.id, &task.task_state)?;
        let message = task
            .latest_message()
            .unwrap_or(task.task_status.as_str())
            .to_string();
        Ok((state, task.task_state.clone(), message, task.percent_complete))
    }

    async fn find_job(&self, ctx: &OperationContext, handle: &TaskHandle) -> Result<JobRecord> {
        if !self.provider.has_job_mirror() {
            return Err(FirmwareInstallError::TaskNotFound {
                task_id: handle.to_string(),
                checked: "task",
            });
        }

        match ctx
            .run("get job", self.transport.get_job(handle.as_str()))
            .await
        {
            Err(FirmwareInstallError::Transport {
                source: TransportError::NotFound(_),
                ..
            }) => Err(FirmwareInstallError::TaskNotFound {
                task_id: handle.to_string(),
                checked: "task, job mirror",
            }),
            other => other,
        }
    }

    fn mirror_table(&self) -> &'static StateTable {
        self.provider
            .job_states()
            .unwrap_or_else(|| self.provider.task_states())
    }
}

fn translate(table: &StateTable, task_id: &str, raw: &str) -> Result<TaskState> {
    table
        .translate(raw)
        .map_err(|e| FirmwareInstallError::UnmappedTaskState {
            task_id: task_id.to_string(),
            table: e.table,
            raw_state: e.raw,
        })
}
