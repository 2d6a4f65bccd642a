//! BMC connection settings shared by every command

use anyhow::Result;
use bmcfw_install::{FirmwareInstaller, InstallerConfig, Provider};
use bmcfw_redfish::{RedfishConfig, RedfishTransport};
use clap::Args;
use tracing::debug;

use crate::error::CliError;

/// Where the BMC lives and how to log in
#[derive(Args, Debug, Clone)]
pub struct BmcArgs {
    /// BMC address or base URL (https is assumed without a scheme)
    #[arg(long, global = true, env = "BMCFW_HOST")]
    pub host: Option<String>,

    /// BMC user
    #[arg(long, global = true, env = "BMCFW_USERNAME", default_value = "root")]
    pub username: String,

    /// BMC password
    #[arg(long, global = true, env = "BMCFW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Hardware vendor behind the BMC
    #[arg(long, global = true, default_value_t = Provider::Generic)]
    pub provider: Provider,

    /// Accept self-signed BMC certificates
    #[arg(long, global = true)]
    pub insecure: bool,
}

impl BmcArgs {
    /// Base URL of the BMC's Redfish service
    pub fn base_url(&self) -> Result<String, CliError> {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| CliError::MissingArgument("--host (or BMCFW_HOST)".to_string()))?;

        if host.contains("://") {
            Ok(host.trim_end_matches('/').to_string())
        } else {
            Ok(format!("https://{host}"))
        }
    }

    /// Redfish settings for the selected provider
    pub fn redfish_config(&self) -> Result<RedfishConfig, CliError> {
        Ok(RedfishConfig::new(
            self.base_url()?,
            self.username.as_str(),
            self.password.clone().unwrap_or_default(),
        )
        .for_provider(self.provider)
        .with_insecure(self.insecure))
    }

    /// Installer bound to a Redfish transport for this BMC
    pub fn connect(&self) -> Result<FirmwareInstaller<RedfishTransport>> {
        self.connect_with(InstallerConfig::default())
    }

    /// Like [`BmcArgs::connect`], with explicit installer tunables
    pub fn connect_with(
        &self,
        installer: InstallerConfig,
    ) -> Result<FirmwareInstaller<RedfishTransport>> {
        let config = self.redfish_config()?;
        debug!(base_url = %config.base_url, provider = %self.provider, "connecting to BMC");
        let transport = RedfishTransport::new(config).map_err(CliError::from)?;
        Ok(FirmwareInstaller::with_config(transport, self.provider, installer))
    }
}
