//! Upload and initiate orchestration
//!
//! [`FirmwareInstaller`] is handed a transport, a provider profile and a
//! configuration at construction time. It keeps no state between calls; the
//! device is the only source of truth for what is installing.

use tracing::{debug, info, instrument};

use crate::admission::check_queueable;
use crate::component::FirmwareComponent;
use crate::config::InstallerConfig;
use crate::context::OperationContext;
use crate::error::{FirmwareInstallError, Result};
use crate::provider::{InstallStep, Provider};
use crate::transport::{FirmwareImage, TaskHandle, Transport, UpdateParameters};

/// Drives firmware installs against one BMC
#[derive(Debug)]
pub struct FirmwareInstaller<T> {
    pub(crate) transport: T,
    pub(crate) provider: Provider,
    pub(crate) config: InstallerConfig,
}

impl<T: Transport> FirmwareInstaller<T> {
    /// Installer with the default configuration
    pub fn new(transport: T, provider: Provider) -> Self {
        Self::with_config(transport, provider, InstallerConfig::default())
    }

    /// Installer with an explicit configuration
    pub fn with_config(transport: T, provider: Provider, config: InstallerConfig) -> Self {
        Self {
            transport,
            provider,
            config,
        }
    }

    /// Provider profile in use
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Active configuration
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Steps the caller must drive for `component`
    ///
    /// # Errors
    ///
    /// [`FirmwareInstallError::UnsupportedHardware`] when the provider cannot
    /// update the component.
    pub fn install_steps(&self, component: FirmwareComponent) -> Result<Vec<InstallStep>> {
        self.provider.install_steps(component)
    }

    /// Upload an image and start the install
    ///
    /// Preconditions are checked in order and the first failure wins:
    /// remaining deadline budget, component support, non-empty image, task
    /// enumeration, admission. Nothing is retried; a second upload could
    /// create a second conflicting task, so retry policy stays with the caller.
    ///
    /// If `ctx` is cancelled while the upload is in flight the device may
    /// already have started installing. Re-poll or re-check admission before
    /// trying again.
    ///
    /// # Errors
    ///
    /// Precondition errors ([`FirmwareInstallError::InsufficientDeadline`],
    /// [`FirmwareInstallError::UnsupportedHardware`],
    /// [`FirmwareInstallError::InvalidFirmware`], admission errors), transport
    /// errors, and deadline/cancellation errors.
    #[instrument(
        skip(self, ctx, image),
        fields(provider = %self.provider, file = %image.file_name)
    )]
    pub async fn upload_and_initiate(
        &self,
        ctx: &OperationContext,
        component: FirmwareComponent,
        image: &FirmwareImage,
    ) -> Result<TaskHandle> {
        if let Some(remaining) = ctx.remaining()
            && remaining < self.config.min_upload_budget
        {
            return Err(FirmwareInstallError::InsufficientDeadline {
                required: self.config.min_upload_budget,
                remaining,
            });
        }

        self.provider.install_steps(component)?;

        if image.data.is_empty() {
            return Err(FirmwareInstallError::InvalidFirmware(format!(
                "{} is empty",
                image.file_name
            )));
        }

        let tasks = ctx.run("list tasks", self.transport.list_tasks()).await?;
        debug!(count = tasks.len(), "enumerated device tasks");

        check_queueable(self.provider, component, &tasks)?;

        let params = self.update_parameters();
        info!(
            size_bytes = image.size_bytes(),
            sha256 = %image.sha256_hex(),
            apply_time = %params.apply_time,
            "uploading firmware image"
        );

        let handle = ctx
            .run(
                "upload firmware",
                self.transport.upload_firmware(image, &params),
            )
            .await?;

        info!(task_id = %handle, "firmware install initiated");
        Ok(handle)
    }

    fn update_parameters(&self) -> UpdateParameters {
        let apply_time = self
            .config
            .apply_time
            .unwrap_or_else(|| self.provider.default_apply_time());
        UpdateParameters::new(apply_time).with_targets(self.config.targets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::{ApplyTime, JobRecord, Task};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingTransport {
        uploads: Mutex<Vec<UpdateParameters>>,
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn list_tasks(&self) -> std::result::Result<Vec<Task>, TransportError> {
            Ok(Vec::new())
        }

        async fn get_task(&self, id: &str) -> std::result::Result<Task, TransportError> {
            Err(TransportError::not_found(id))
        }

        async fn upload_firmware(
            &self,
            _image: &FirmwareImage,
            params: &UpdateParameters,
        ) -> std::result::Result<TaskHandle, TransportError> {
            if let Ok(mut uploads) = self.uploads.lock() {
                uploads.push(params.clone());
            }
            Ok(TaskHandle::new("JID_1"))
        }

        async fn get_job(&self, id: &str) -> std::result::Result<JobRecord, TransportError> {
            Err(TransportError::not_found(id))
        }
    }

    fn image() -> FirmwareImage {
        FirmwareImage::new("BIOS_1.2.3.exe", vec![0x4d, 0x5a, 0x90, 0x00])
    }

    #[tokio::test]
    async fn test_provider_default_apply_time() -> Result<()> {
        let installer = FirmwareInstaller::new(RecordingTransport::default(), Provider::Dell);
        let handle = installer
            .upload_and_initiate(&OperationContext::unbounded(), FirmwareComponent::Bios, &image())
            .await?;
        assert_eq!(handle.as_str(), "JID_1");

        let uploads = installer.transport().uploads.lock().map(|u| u.clone());
        assert_eq!(
            uploads.ok().and_then(|u| u.first().map(|p| p.apply_time)),
            Some(ApplyTime::OnReset)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_apply_time_and_targets() -> Result<()> {
        let config = InstallerConfig::default()
            .with_apply_time(ApplyTime::Immediate)
            .with_targets(vec!["/redfish/v1/UpdateService/FirmwareInventory/BMC".to_string()]);
        let installer =
            FirmwareInstaller::with_config(RecordingTransport::default(), Provider::Dell, config);
        installer
            .upload_and_initiate(&OperationContext::unbounded(), FirmwareComponent::Bmc, &image())
            .await?;

        let params = installer
            .transport()
            .uploads
            .lock()
            .ok()
            .and_then(|u| u.first().cloned());
        let Some(params) = params else {
            return Err(FirmwareInstallError::InvalidFirmware("no upload recorded".into()));
        };
        assert_eq!(params.apply_time, ApplyTime::Immediate);
        assert_eq!(params.targets.len(), 1);
        Ok(())
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_upload_logs_image_digest() -> Result<()> {
        let installer = FirmwareInstaller::new(RecordingTransport::default(), Provider::Generic);
        installer
            .upload_and_initiate(&OperationContext::unbounded(), FirmwareComponent::Bios, &image())
            .await?;
        assert!(logs_contain("uploading firmware image"));
        assert!(logs_contain("sha256="));
        assert!(logs_contain("firmware install initiated"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_deadline_is_refused() {
        let installer = FirmwareInstaller::new(RecordingTransport::default(), Provider::Generic);
        let ctx = OperationContext::with_timeout(Duration::from_secs(9 * 60));
        let result = installer
            .upload_and_initiate(&ctx, FirmwareComponent::Bios, &image())
            .await;
        assert!(matches!(
            result,
            Err(FirmwareInstallError::InsufficientDeadline { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_image_is_refused() {
        let installer = FirmwareInstaller::new(RecordingTransport::default(), Provider::Generic);
        let empty = FirmwareImage::new("empty.bin", Vec::new());
        let result = installer
            .upload_and_initiate(&OperationContext::unbounded(), FirmwareComponent::Nic, &empty)
            .await;
        assert!(matches!(result, Err(FirmwareInstallError::InvalidFirmware(_))));
    }
}
