//! Provider profiles
//!
//! A provider bundles everything vendor-specific the installer needs: which
//! state tables apply, where the OEM job record lives, whether a job mirror
//! outlives purged tasks, how firmware tasks are named, and which install
//! steps each component requires. Profiles are plain data so callers can
//! inspect them before driving an install.

use serde::{Deserialize, Serialize};

use crate::component::FirmwareComponent;
use crate::error::{FirmwareInstallError, Result};
use crate::oem::{DELL_ENVELOPE, OemEnvelope};
use crate::state::{DELL_JOB_STATES, REDFISH_TASK_STATES, StateTable};
use crate::transport::ApplyTime;

/// Phase of an install a caller must drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallStep {
    /// Upload the image and start the install
    UploadAndInitiate,
    /// Poll the install task until it is terminal
    PollStatus,
    /// Reset the BMC or power-cycle the host so a staged image takes effect
    Activate,
}

impl std::fmt::Display for InstallStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallStep::UploadAndInitiate => write!(f, "upload-and-initiate"),
            InstallStep::PollStatus => write!(f, "poll-status"),
            InstallStep::Activate => write!(f, "activate"),
        }
    }
}

/// How a provider names firmware tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskNaming {
    /// Task names are `<prefix><component label>`, e.g. `Firmware Update: BIOS`
    Prefixed(&'static str),
    /// Task names do not identify the component
    Opaque,
}

/// Outcome of comparing a task name with a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// The task targets the component
    Match,
    /// The task targets something else
    Mismatch,
    /// The name cannot tell
    Ambiguous,
}

impl TaskNaming {
    /// Compare a task name against a component
    ///
    /// Only a name whose suffix is another component's label is a
    /// [`NameMatch::Mismatch`] among prefixed names. A bare prefix, or a
    /// suffix no component claims (`Firmware Update: iDRAC with Lifecycle
    /// Controller`), is [`NameMatch::Ambiguous`]. Names without the prefix
    /// belong to other job kinds and never match.
    pub fn classify(&self, task_name: &str, component: FirmwareComponent) -> NameMatch {
        let TaskNaming::Prefixed(prefix) = self else {
            return NameMatch::Ambiguous;
        };
        let name = task_name.trim();
        if name.is_empty() {
            return NameMatch::Ambiguous;
        }
        let Some(suffix) = strip_prefix_loose(name, prefix) else {
            return NameMatch::Mismatch;
        };

        if suffix.eq_ignore_ascii_case(component.task_label()) {
            NameMatch::Match
        } else if FirmwareComponent::ALL
            .iter()
            .any(|other| suffix.eq_ignore_ascii_case(other.task_label()))
        {
            NameMatch::Mismatch
        } else {
            NameMatch::Ambiguous
        }
    }
}

/// Strip `prefix` ignoring ASCII case, with its trailing colon optional
fn strip_prefix_loose<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let stem = prefix.trim_end().trim_end_matches(':');
    let head = name.get(..stem.len())?;
    if !head.eq_ignore_ascii_case(stem) {
        return None;
    }
    let rest = name.get(stem.len()..)?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    Some(rest.trim())
}

/// BMC vendor family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Dell iDRAC
    Dell,
    /// Supermicro X11/X12/X13 BMC
    Supermicro,
    /// Any DMTF-conformant Redfish service
    Generic,
}

impl Provider {
    /// Every provider
    pub const ALL: [Provider; 3] = [Provider::Dell, Provider::Supermicro, Provider::Generic];

    /// Table for the generic task's `TaskState`
    pub fn task_states(&self) -> &'static StateTable {
        &REDFISH_TASK_STATES
    }

    /// OEM envelope embedded in tasks, if the provider uses one
    pub fn oem_envelope(&self) -> Option<&'static OemEnvelope> {
        match self {
            Provider::Dell => Some(&DELL_ENVELOPE),
            Provider::Supermicro | Provider::Generic => None,
        }
    }

    /// Table for OEM descriptor and job mirror states
    pub fn job_states(&self) -> Option<&'static StateTable> {
        match self {
            Provider::Dell => Some(&DELL_JOB_STATES),
            Provider::Supermicro | Provider::Generic => None,
        }
    }

    /// Whether a vendor job record outlives the purged generic task
    pub fn has_job_mirror(&self) -> bool {
        matches!(self, Provider::Dell)
    }

    /// Naming convention of firmware tasks
    pub fn task_naming(&self) -> TaskNaming {
        match self {
            Provider::Dell => TaskNaming::Prefixed("Firmware Update: "),
            Provider::Supermicro | Provider::Generic => TaskNaming::Opaque,
        }
    }

    /// Apply time sent with uploads unless the caller overrides it
    pub fn default_apply_time(&self) -> ApplyTime {
        match self {
            Provider::Dell | Provider::Supermicro => ApplyTime::OnReset,
            Provider::Generic => ApplyTime::Immediate,
        }
    }

    /// Steps a caller must drive to install firmware on `component`
    ///
    /// # Errors
    ///
    /// Returns [`FirmwareInstallError::UnsupportedHardware`] when the provider
    /// cannot update the component.
    pub fn install_steps(&self, component: FirmwareComponent) -> Result<Vec<InstallStep>> {
        match (self, component) {
            (Provider::Dell | Provider::Generic, _) => {
                Ok(vec![InstallStep::UploadAndInitiate, InstallStep::PollStatus])
            }
            (Provider::Supermicro, FirmwareComponent::Bios | FirmwareComponent::Bmc) => Ok(vec![
                InstallStep::UploadAndInitiate,
                InstallStep::PollStatus,
                InstallStep::Activate,
            ]),
            (Provider::Supermicro, _) => Err(FirmwareInstallError::UnsupportedHardware {
                provider: *self,
                component,
            }),
        }
    }

    /// Whether the provider can update `component` at all
    pub fn supports(&self, component: FirmwareComponent) -> bool {
        self.install_steps(component).is_ok()
    }

    /// Lower-case provider name
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Dell => "dell",
            Provider::Supermicro => "supermicro",
            Provider::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl std::str::FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dell" | "idrac" => Ok(Provider::Dell),
            "supermicro" | "smc" => Ok(Provider::Supermicro),
            "generic" | "redfish" => Ok(Provider::Generic),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dell_steps() -> Result<()> {
        assert_eq!(
            Provider::Dell.install_steps(FirmwareComponent::Nic)?,
            vec![InstallStep::UploadAndInitiate, InstallStep::PollStatus]
        );
        Ok(())
    }

    #[test]
    fn test_supermicro_requires_activation() -> Result<()> {
        let steps = Provider::Supermicro.install_steps(FirmwareComponent::Bmc)?;
        assert_eq!(steps.last(), Some(&InstallStep::Activate));
        Ok(())
    }

    #[test]
    fn test_supermicro_rejects_drive_firmware() {
        let result = Provider::Supermicro.install_steps(FirmwareComponent::Drive);
        assert!(matches!(
            result,
            Err(FirmwareInstallError::UnsupportedHardware {
                provider: Provider::Supermicro,
                component: FirmwareComponent::Drive
            })
        ));
        assert!(!Provider::Supermicro.supports(FirmwareComponent::Drive));
    }

    #[test]
    fn test_prefixed_naming() {
        let naming = Provider::Dell.task_naming();
        assert_eq!(
            naming.classify("Firmware Update: BIOS", FirmwareComponent::Bios),
            NameMatch::Match
        );
        assert_eq!(
            naming.classify("Firmware Update: NIC", FirmwareComponent::Bios),
            NameMatch::Mismatch
        );
        assert_eq!(
            naming.classify("Configure: BIOS", FirmwareComponent::Bios),
            NameMatch::Mismatch
        );
        assert_eq!(naming.classify("  ", FirmwareComponent::Bios), NameMatch::Ambiguous);
    }

    #[test]
    fn test_prefixed_naming_is_lenient_about_case_and_colon() {
        let naming = Provider::Dell.task_naming();
        for name in ["firmware update: bios", "FIRMWARE UPDATE BIOS", "Firmware Update:BIOS"] {
            assert_eq!(
                naming.classify(name, FirmwareComponent::Bios),
                NameMatch::Match,
                "{name}"
            );
        }
        assert_eq!(
            naming.classify("firmware update nic", FirmwareComponent::Bios),
            NameMatch::Mismatch
        );
    }

    #[test]
    fn test_unrecognised_suffix_is_ambiguous() {
        let naming = Provider::Dell.task_naming();
        for name in [
            "Firmware Update: iDRAC with Lifecycle Controller",
            "Firmware Update: Integrated Dell Remote Access Controller",
            "Firmware Update",
            "Firmware Update:",
        ] {
            assert_eq!(
                naming.classify(name, FirmwareComponent::Bmc),
                NameMatch::Ambiguous,
                "{name}"
            );
        }
    }

    #[test]
    fn test_opaque_naming_is_always_ambiguous() {
        assert_eq!(
            TaskNaming::Opaque.classify("BIOS Update", FirmwareComponent::Bmc),
            NameMatch::Ambiguous
        );
    }

    #[test]
    fn test_only_dell_has_job_mirror() {
        assert!(Provider::Dell.has_job_mirror());
        assert!(Provider::Dell.oem_envelope().is_some());
        assert!(!Provider::Generic.has_job_mirror());
        assert!(Provider::Supermicro.job_states().is_none());
    }

    #[test]
    fn test_provider_from_str() -> std::result::Result<(), UnknownProvider> {
        assert_eq!("iDRAC".parse::<Provider>()?, Provider::Dell);
        assert_eq!("redfish".parse::<Provider>()?, Provider::Generic);
        assert_eq!(
            "hpe".parse::<Provider>(),
            Err(UnknownProvider("hpe".to_string()))
        );
        Ok(())
    }
}
