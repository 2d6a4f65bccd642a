//! Connection settings for a Redfish BMC

use std::time::Duration;

use bmcfw_install::Provider;
use serde::{Deserialize, Serialize};

/// Generic task collection
pub const TASK_SERVICE_PATH: &str = "/redfish/v1/TaskService/Tasks";

/// Update service resource advertising the multipart push URI
pub const UPDATE_SERVICE_PATH: &str = "/redfish/v1/UpdateService";

/// iDRAC job collection that outlives purged tasks
pub const DELL_JOB_MIRROR_PATH: &str = "/redfish/v1/Managers/iDRAC.Embedded.1/Oem/Dell/Jobs";

/// How to reach and authenticate against one BMC
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedfishConfig {
    /// Scheme and authority, e.g. `https://10.0.0.12`
    pub base_url: String,

    /// Basic auth user
    pub username: String,

    /// Basic auth password
    #[serde(skip_serializing)]
    pub password: String,

    /// Accept self-signed BMC certificates
    pub insecure: bool,

    /// Timeout for ordinary requests
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Timeout for the image upload request
    #[serde(with = "duration_secs")]
    pub upload_timeout: Duration,

    /// Task collection path
    pub task_service_path: String,

    /// Update service path
    pub update_service_path: String,

    /// Vendor job collection, when the BMC keeps one
    pub job_mirror_path: Option<String>,
}

impl std::fmt::Debug for RedfishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedfishConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("request_timeout", &self.request_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("job_mirror_path", &self.job_mirror_path)
            .finish()
    }
}

impl Default for RedfishConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            username: String::new(),
            password: String::new(),
            insecure: false,
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(30 * 60),
            task_service_path: TASK_SERVICE_PATH.to_string(),
            update_service_path: UPDATE_SERVICE_PATH.to_string(),
            job_mirror_path: None,
        }
    }
}

impl RedfishConfig {
    /// Settings for `base_url` with basic auth credentials
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Apply the vendor paths a provider needs
    pub fn for_provider(mut self, provider: Provider) -> Self {
        self.job_mirror_path = match provider {
            Provider::Dell => Some(DELL_JOB_MIRROR_PATH.to_string()),
            Provider::Supermicro | Provider::Generic => None,
        };
        self
    }

    /// Accept self-signed certificates
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Timeout for ordinary requests
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Timeout for the upload request
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Override the vendor job collection
    pub fn with_job_mirror_path(mut self, path: Option<String>) -> Self {
        self.job_mirror_path = path;
        self
    }

    /// Override the update service path
    pub fn with_update_service_path(mut self, path: impl Into<String>) -> Self {
        self.update_service_path = path.into();
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
