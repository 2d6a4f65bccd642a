//! Firmware components addressed by an install

use serde::{Deserialize, Serialize};

/// Hardware element whose firmware is being updated
///
/// This is the admission-control key: two installs conflict only when they
/// target the same component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmwareComponent {
    /// System BIOS / UEFI
    Bios,
    /// The BMC itself
    Bmc,
    /// Network interface controller
    Nic,
    /// Disk drive
    Drive,
    /// Storage (RAID/HBA) controller
    StorageController,
    /// Complex programmable logic device
    Cpld,
    /// Power supply unit
    PowerSupply,
}

impl FirmwareComponent {
    /// Every component, in declaration order
    pub const ALL: [FirmwareComponent; 7] = [
        FirmwareComponent::Bios,
        FirmwareComponent::Bmc,
        FirmwareComponent::Nic,
        FirmwareComponent::Drive,
        FirmwareComponent::StorageController,
        FirmwareComponent::Cpld,
        FirmwareComponent::PowerSupply,
    ];

    /// Lower-case slug
    pub fn as_str(&self) -> &'static str {
        match self {
            FirmwareComponent::Bios => "bios",
            FirmwareComponent::Bmc => "bmc",
            FirmwareComponent::Nic => "nic",
            FirmwareComponent::Drive => "drive",
            FirmwareComponent::StorageController => "storage_controller",
            FirmwareComponent::Cpld => "cpld",
            FirmwareComponent::PowerSupply => "power_supply",
        }
    }

    /// Label vendors embed in firmware task names, e.g. `Firmware Update: BIOS`
    pub fn task_label(&self) -> &'static str {
        match self {
            FirmwareComponent::Bios => "BIOS",
            FirmwareComponent::Bmc => "BMC",
            FirmwareComponent::Nic => "NIC",
            FirmwareComponent::Drive => "DRIVE",
            FirmwareComponent::StorageController => "STORAGECONTROLLER",
            FirmwareComponent::Cpld => "CPLD",
            FirmwareComponent::PowerSupply => "PSU",
        }
    }
}

impl std::fmt::Display for FirmwareComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown component name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown firmware component: {0}")]
pub struct UnknownComponent(pub String);

impl std::str::FromStr for FirmwareComponent {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        FirmwareComponent::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized || c.task_label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownComponent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_display() {
        assert_eq!(FirmwareComponent::Bios.to_string(), "bios");
        assert_eq!(
            FirmwareComponent::StorageController.to_string(),
            "storage_controller"
        );
    }

    #[test]
    fn test_component_from_str() -> Result<(), UnknownComponent> {
        assert_eq!("BIOS".parse::<FirmwareComponent>()?, FirmwareComponent::Bios);
        assert_eq!(
            "storage-controller".parse::<FirmwareComponent>()?,
            FirmwareComponent::StorageController
        );
        assert_eq!("psu".parse::<FirmwareComponent>()?, FirmwareComponent::PowerSupply);
        assert_eq!(
            "gpu".parse::<FirmwareComponent>(),
            Err(UnknownComponent("gpu".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_component_round_trips_through_slug() -> Result<(), UnknownComponent> {
        for component in FirmwareComponent::ALL {
            assert_eq!(component.as_str().parse::<FirmwareComponent>()?, component);
        }
        Ok(())
    }
}
