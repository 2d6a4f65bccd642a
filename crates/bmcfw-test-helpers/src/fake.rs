//! Scripted in-memory transport.
//!
//! [`FakeTransport`] stands in for a BMC. Tests seed it with tasks and job
//! mirror records, inject failures per operation, and inspect the calls the
//! installer made afterwards.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bmcfw_install::{
    FirmwareImage, JobRecord, Task, TaskHandle, Transport, TransportError, UpdateParameters,
};
use parking_lot::Mutex;

/// A transport call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    /// `list_tasks`
    ListTasks,
    /// `get_task(id)`
    GetTask(String),
    /// `upload_firmware` with the image file name
    UploadFirmware(String),
    /// `get_job(id)`
    GetJob(String),
}

/// An upload accepted by the fake
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// File name of the image
    pub file_name: String,
    /// Image size in bytes
    pub size_bytes: u64,
    /// Parameters sent with the image
    pub params: UpdateParameters,
}

#[derive(Default)]
struct FakeState {
    tasks: BTreeMap<String, VecDeque<Task>>,
    jobs: BTreeMap<String, JobRecord>,
    list_error: Option<TransportError>,
    get_task_error: Option<TransportError>,
    upload_error: Option<TransportError>,
    get_job_error: Option<TransportError>,
    calls: Vec<FakeCall>,
    uploads: Vec<RecordedUpload>,
    next_handle: Option<String>,
    latency: Option<Duration>,
}

/// In-memory [`Transport`] driven by test scripts
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    /// Device with no tasks and no jobs
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a task
    pub fn with_task(self, task: Task) -> Self {
        self.insert_task(task);
        self
    }

    /// Seed a job mirror record
    pub fn with_job(self, job: JobRecord) -> Self {
        self.insert_job(job);
        self
    }

    /// Handle returned by the next successful upload
    pub fn with_next_handle(self, handle: &str) -> Self {
        self.state.lock().next_handle = Some(handle.to_string());
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Add or replace a task
    pub fn insert_task(&self, task: Task) {
        self.state
            .lock()
            .tasks
            .insert(task.id.clone(), VecDeque::from([task]));
    }

    /// Script successive snapshots of one task
    ///
    /// Each `get_task` consumes one snapshot; the last one is returned forever.
    pub fn script_task(&self, snapshots: impl IntoIterator<Item = Task>) {
        let snapshots: VecDeque<Task> = snapshots.into_iter().collect();
        if let Some(first) = snapshots.front() {
            let id = first.id.clone();
            self.state.lock().tasks.insert(id, snapshots);
        }
    }

    /// Remove a task, as a device does when it purges finished tasks
    pub fn purge_task(&self, id: &str) {
        self.state.lock().tasks.remove(id);
    }

    /// Add or replace a job mirror record
    pub fn insert_job(&self, job: JobRecord) {
        self.state.lock().jobs.insert(job.id.clone(), job);
    }

    /// Fail every `list_tasks` with `error`
    pub fn fail_list_tasks(&self, error: TransportError) {
        self.state.lock().list_error = Some(error);
    }

    /// Fail every `get_task` with `error`
    pub fn fail_get_task(&self, error: TransportError) {
        self.state.lock().get_task_error = Some(error);
    }

    /// Fail every `upload_firmware` with `error`
    pub fn fail_upload(&self, error: TransportError) {
        self.state.lock().upload_error = Some(error);
    }

    /// Fail every `get_job` with `error`
    pub fn fail_get_job(&self, error: TransportError) {
        self.state.lock().get_job_error = Some(error);
    }

    /// Every call observed so far, in order
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.lock().calls.clone()
    }

    /// Whether any observed call satisfies `predicate`
    pub fn called(&self, predicate: impl Fn(&FakeCall) -> bool) -> bool {
        self.state.lock().calls.iter().any(predicate)
    }

    /// Uploads accepted so far
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().uploads.clone()
    }

    async fn enter(&self, call: FakeCall) {
        let latency = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        self.enter(FakeCall::ListTasks).await;
        let state = self.state.lock();
        if let Some(error) = &state.list_error {
            return Err(error.clone());
        }
        Ok(state
            .tasks
            .values()
            .filter_map(|snapshots| snapshots.front().cloned())
            .collect())
    }

    async fn get_task(&self, id: &str) -> Result<Task, TransportError> {
        self.enter(FakeCall::GetTask(id.to_string())).await;
        let mut state = self.state.lock();
        if let Some(error) = &state.get_task_error {
            return Err(error.clone());
        }
        let snapshots = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| TransportError::not_found(format!("/redfish/v1/TaskService/Tasks/{id}")))?;
        let task = if snapshots.len() > 1 {
            snapshots.pop_front()
        } else {
            snapshots.front().cloned()
        };
        task.ok_or_else(|| TransportError::not_found(id))
    }

    async fn upload_firmware(
        &self,
        image: &FirmwareImage,
        params: &UpdateParameters,
    ) -> Result<TaskHandle, TransportError> {
        self.enter(FakeCall::UploadFirmware(image.file_name.clone()))
            .await;
        let mut state = self.state.lock();
        if let Some(error) = &state.upload_error {
            return Err(error.clone());
        }
        state.uploads.push(RecordedUpload {
            file_name: image.file_name.clone(),
            size_bytes: image.size_bytes(),
            params: params.clone(),
        });
        let handle = state
            .next_handle
            .clone()
            .unwrap_or_else(|| format!("JID_{:012}", state.uploads.len()));
        Ok(TaskHandle::new(handle))
    }

    async fn get_job(&self, id: &str) -> Result<JobRecord, TransportError> {
        self.enter(FakeCall::GetJob(id.to_string())).await;
        let state = self.state.lock();
        if let Some(error) = &state.get_job_error {
            return Err(error.clone());
        }
        state.jobs.get(id).cloned().ok_or_else(|| {
            TransportError::not_found(format!(
                "/redfish/v1/Managers/iDRAC.Embedded.1/Oem/Dell/Jobs/{id}"
            ))
        })
    }
}
