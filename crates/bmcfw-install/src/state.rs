//! Canonical task states and per-vendor translation tables
//!
//! Vendors report task progress with their own vocabularies. Each provider
//! owns an explicit [`StateTable`] mapping every raw string it can emit to one
//! canonical [`TaskState`]. Strings missing from a table are reported as
//! [`UnmappedState`] and never coerced to a default, so vendor contract drift
//! surfaces instead of being hidden.

use serde::{Deserialize, Serialize};

/// Canonical task state shared by all providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Accepted by the device but not yet executing
    Pending,
    /// Executing
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished unsuccessfully
    Failed,
    /// The vendor itself reports the state as unknown
    Unknown,
}

impl TaskState {
    /// Whether a task in this state occupies the install slot for its component
    ///
    /// This is the only definition of the active set; admission control goes
    /// through it.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Running)
    }

    /// Whether the task has finished, successfully or not
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Running => write!(f, "running"),
            TaskState::Succeeded => write!(f, "succeeded"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Unknown => write!(f, "unknown"),
        }
    }
}

/// A raw state string that has no entry in the consulted table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("state {raw:?} is not in the {table} state table")]
pub struct UnmappedState {
    /// Table that was consulted
    pub table: &'static str,
    /// Raw state string
    pub raw: String,
}

/// Explicit mapping from raw vendor state strings to canonical states
#[derive(Debug)]
pub struct StateTable {
    name: &'static str,
    entries: &'static [(&'static str, TaskState)],
}

impl StateTable {
    /// Build a table from a static entry list
    pub const fn new(name: &'static str, entries: &'static [(&'static str, TaskState)]) -> Self {
        Self { name, entries }
    }

    /// Table name used in error messages
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Every `(raw, canonical)` pair in the table
    pub fn entries(&self) -> &'static [(&'static str, TaskState)] {
        self.entries
    }

    /// Translate a raw vendor state
    ///
    /// Matching ignores ASCII case: iDRAC reports `Scheduled` on the task OEM
    /// block while tooling often lower-cases the same value.
    ///
    /// # Errors
    ///
    /// Returns [`UnmappedState`] when `raw` is not in the table.
    pub fn translate(&self, raw: &str) -> Result<TaskState, UnmappedState> {
        let raw_trimmed = raw.trim();
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(raw_trimmed))
            .map(|(_, state)| *state)
            .ok_or_else(|| UnmappedState {
                table: self.name,
                raw: raw.to_string(),
            })
    }
}

/// DMTF Redfish `TaskState` enumeration
pub static REDFISH_TASK_STATES: StateTable = StateTable::new(
    "redfish task",
    &[
        ("New", TaskState::Pending),
        ("Pending", TaskState::Pending),
        ("Starting", TaskState::Running),
        ("Running", TaskState::Running),
        ("Stopping", TaskState::Running),
        ("Cancelling", TaskState::Running),
        ("Service", TaskState::Running),
        ("Suspended", TaskState::Failed),
        ("Interrupted", TaskState::Failed),
        ("Killed", TaskState::Failed),
        ("Exception", TaskState::Failed),
        ("Cancelled", TaskState::Failed),
        ("Completed", TaskState::Succeeded),
    ],
);

/// Dell iDRAC `DellJob.JobState` enumeration
pub static DELL_JOB_STATES: StateTable = StateTable::new(
    "dell job",
    &[
        ("New", TaskState::Pending),
        ("Scheduling", TaskState::Pending),
        ("Scheduled", TaskState::Pending),
        ("Waiting", TaskState::Pending),
        ("ReadyForExecution", TaskState::Pending),
        ("Downloaded", TaskState::Pending),
        ("Paused", TaskState::Pending),
        ("RebootPending", TaskState::Pending),
        ("PendingActivation", TaskState::Pending),
        ("Downloading", TaskState::Running),
        ("Running", TaskState::Running),
        ("RebootCompleted", TaskState::Running),
        ("Completed", TaskState::Succeeded),
        ("CompletedWithErrors", TaskState::Failed),
        ("Failed", TaskState::Failed),
        ("RebootFailed", TaskState::Failed),
        ("Unknown", TaskState::Unknown),
    ],
);

/// All tables shipped with the crate
pub static ALL_TABLES: [&StateTable; 2] = [&REDFISH_TASK_STATES, &DELL_JOB_STATES];
