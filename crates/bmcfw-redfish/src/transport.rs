//! Redfish implementation of the install transport

use async_trait::async_trait;
use bmcfw_install::{
    FirmwareImage, JobRecord, Task, TaskHandle, Transport, TransportError, UpdateParameters,
};
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::RedfishConfig;
use crate::error::RedfishError;

/// Longest response body kept in a [`TransportError::Status`]
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(rename = "Members", default)]
    members: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@odata.id")]
    odata_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateService {
    #[serde(rename = "MultipartHttpPushUri")]
    multipart_http_push_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    #[serde(rename = "Id")]
    id: String,
}

/// Authenticated Redfish client for one BMC
///
/// Every request carries HTTP basic auth; no session is created, so there is
/// no token to refresh or leak.
#[derive(Debug, Clone)]
pub struct RedfishTransport {
    client: Client,
    config: RedfishConfig,
}

impl RedfishTransport {
    /// Build a client for `config`
    ///
    /// # Errors
    ///
    /// [`RedfishError::InvalidBaseUrl`] for an unusable base URL and
    /// [`RedfishError::Client`] when the HTTP client cannot be built.
    pub fn new(config: RedfishConfig) -> Result<Self, RedfishError> {
        let parsed =
            reqwest::Url::parse(&config.base_url).map_err(|e| RedfishError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RedfishError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("bmcfw-redfish/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(RedfishError::Client)?;

        Ok(Self { client, config })
    }

    /// Settings in use
    pub fn config(&self) -> &RedfishConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(ACCEPT, "application/json")
    }

    async fn get_json<D: DeserializeOwned>(&self, path: &str) -> Result<D, TransportError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| connection_error(&url, &e))?;
        let response = check_status(&url, response).await?;
        decode_body(&url, response).await
    }
}

#[async_trait]
impl Transport for RedfishTransport {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        let collection: Collection = self.get_json(&self.config.task_service_path).await?;
        let mut tasks = Vec::with_capacity(collection.members.len());
        for member in collection.members {
            match self.get_json::<Task>(&member.odata_id).await {
                Ok(task) => tasks.push(task),
                Err(TransportError::NotFound(_)) => {
                    debug!(member = %member.odata_id, "task purged while listing");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(tasks)
    }

    async fn get_task(&self, id: &str) -> Result<Task, TransportError> {
        let path = format!("{}/{id}", self.config.task_service_path.trim_end_matches('/'));
        self.get_json(&path).await
    }

    async fn upload_firmware(
        &self,
        image: &FirmwareImage,
        params: &UpdateParameters,
    ) -> Result<TaskHandle, TransportError> {
        let service: UpdateService = self.get_json(&self.config.update_service_path).await?;
        let push_uri = service.multipart_http_push_uri.ok_or_else(|| {
            TransportError::Unsupported(
                "update service does not advertise MultipartHttpPushUri".to_string(),
            )
        })?;
        let url = self.url(&push_uri);

        let parameters = serde_json::to_string(params).map_err(|e| TransportError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let form = Form::new()
            .part(
                "UpdateParameters",
                Part::text(parameters)
                    .mime_str("application/json")
                    .map_err(|e| connection_error(&url, &e))?,
            )
            .part(
                "UpdateFile",
                Part::bytes(image.data.clone())
                    .file_name(image.file_name.clone())
                    .mime_str("application/octet-stream")
                    .map_err(|e| connection_error(&url, &e))?,
            );

        info!(%url, file = %image.file_name, size_bytes = image.size_bytes(), "POST multipart update");
        let response = self
            .authorized(self.client.post(&url))
            .timeout(self.config.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| connection_error(&url, &e))?;
        let response = check_status(&url, response).await?;

        if let Some(handle) = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(last_segment)
        {
            return Ok(TaskHandle::new(handle));
        }

        let created: CreatedTask = decode_body(&url, response).await?;
        Ok(TaskHandle::new(created.id))
    }

    async fn get_job(&self, id: &str) -> Result<JobRecord, TransportError> {
        let Some(mirror) = &self.config.job_mirror_path else {
            return Err(TransportError::Unsupported(
                "no job mirror configured for this BMC".to_string(),
            ));
        };
        let path = format!("{}/{id}", mirror.trim_end_matches('/'));
        self.get_json(&path).await
    }
}

fn last_segment(location: &str) -> Option<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn connection_error(url: &str, error: &reqwest::Error) -> TransportError {
    TransportError::Connection(format!("{url}: {error}"))
}

async fn check_status(url: &str, response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TransportError::Unauthorized(
            format!("{status} from {url}"),
        )),
        StatusCode::NOT_FOUND => Err(TransportError::NotFound(url.to_string())),
        _ => {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut = cut.saturating_sub(1);
                }
                body.truncate(cut);
            }
            Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            })
        }
    }
}

async fn decode_body<D: DeserializeOwned>(url: &str, response: Response) -> Result<D, TransportError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| connection_error(url, &e))?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(
            last_segment("/redfish/v1/TaskService/Tasks/JID_467696020275"),
            Some("JID_467696020275".to_string())
        );
        assert_eq!(last_segment("https://bmc/redfish/v1/TaskService/Tasks/7/"), Some("7".to_string()));
        assert_eq!(last_segment("/"), None);
    }

    #[test]
    fn test_url_joins_paths() -> Result<(), RedfishError> {
        let transport = RedfishTransport::new(RedfishConfig::new("https://bmc.example/", "u", "p"))?;
        assert_eq!(
            transport.url("/redfish/v1/TaskService/Tasks"),
            "https://bmc.example/redfish/v1/TaskService/Tasks"
        );
        assert_eq!(transport.url("https://other/x"), "https://other/x");
        Ok(())
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = RedfishTransport::new(RedfishConfig::new("ftp://bmc", "u", "p"));
        assert!(matches!(result, Err(RedfishError::InvalidBaseUrl { .. })));
    }
}
