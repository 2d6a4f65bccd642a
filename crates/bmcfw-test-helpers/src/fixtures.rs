//! Fixtures shaped like real device payloads.
//!
//! The Dell payloads follow what an iDRAC 9 returns for a BIOS update queued
//! with `@Redfish.OperationApplyTime: OnReset`.

use bmcfw_install::{FirmwareComponent, FirmwareImage, JobRecord, Task, TaskMessage};
use serde_json::{Value, json};

/// Job id used by the Dell fixtures
pub const DELL_JOB_ID: &str = "JID_467696020275";

/// `Oem` block of a Dell firmware task with the given job state
pub fn dell_oem(job_state: &str, percent_complete: u8) -> Value {
    json!({
        "Dell": {
            "@odata.type": "#DellJob.v1_5_0.DellJob",
            "Id": DELL_JOB_ID,
            "Name": "Firmware Update: BIOS",
            "Description": "Job Instance",
            "JobState": job_state,
            "JobType": "FirmwareUpdate",
            "Message": "Task successfully scheduled.",
            "MessageId": "IDRAC.2.8.JCP001",
            "PercentComplete": percent_complete,
            "StartTime": "TIME_NOW",
            "EndTime": "TIME_NA"
        }
    })
}

/// Dell firmware task for `component` whose OEM job record is in `job_state`
pub fn dell_task(id: &str, component: FirmwareComponent, job_state: &str) -> Task {
    Task {
        id: id.to_string(),
        name: format!("Firmware Update: {}", component.task_label()),
        task_state: "Running".to_string(),
        task_status: "OK".to_string(),
        percent_complete: Some(0),
        messages: vec![TaskMessage {
            message_id: "IDRAC.2.8.JCP001".to_string(),
            message: "Task successfully scheduled.".to_string(),
        }],
        oem: dell_oem(job_state, 0),
    }
}

/// Vendor-neutral task with no OEM block
pub fn redfish_task(id: &str, name: &str, task_state: &str) -> Task {
    Task {
        id: id.to_string(),
        name: name.to_string(),
        task_state: task_state.to_string(),
        task_status: "OK".to_string(),
        percent_complete: None,
        messages: Vec::new(),
        oem: json!({}),
    }
}

/// Dell job mirror record
pub fn job_record(id: &str, job_state: &str, percent_complete: u8) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        name: "Firmware Update: BIOS".to_string(),
        job_state: job_state.to_string(),
        job_type: "FirmwareUpdate".to_string(),
        message: match job_state {
            "Completed" => "Job completed successfully.".to_string(),
            "Failed" => "Unable to complete the firmware update.".to_string(),
            _ => "Task successfully scheduled.".to_string(),
        },
        percent_complete: Some(percent_complete),
    }
}

/// Small non-empty image
pub fn firmware_image() -> FirmwareImage {
    FirmwareImage::new("BIOS_0JK2R_WN64_2.19.0.EXE", b"MZ\x90\x00firmware".to_vec())
}
