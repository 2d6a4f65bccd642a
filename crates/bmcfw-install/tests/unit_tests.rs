//! Unit tests for the public surface of the install crate

mod provider_tests {
    use bmcfw_install::prelude::*;
    use bmcfw_install::{NameMatch, TaskNaming};
    use bmcfw_test_helpers::prelude::*;

    #[test]
    fn test_every_provider_polls_after_upload() -> TestResult {
        for provider in Provider::ALL {
            for component in FirmwareComponent::ALL {
                let Ok(steps) = provider.install_steps(component) else {
                    continue;
                };
                assert_eq!(
                    steps.first(),
                    Some(&InstallStep::UploadAndInitiate),
                    "{provider}/{component}"
                );
                assert!(steps.contains(&InstallStep::PollStatus));
            }
        }
        Ok(())
    }

    #[test]
    fn test_installer_exposes_provider_steps() -> TestResult {
        let installer = FirmwareInstaller::new(FakeTransport::new(), Provider::Supermicro);
        assert_eq!(
            installer.install_steps(FirmwareComponent::Bios)?,
            vec![
                InstallStep::UploadAndInitiate,
                InstallStep::PollStatus,
                InstallStep::Activate
            ]
        );
        let err = must_err(installer.install_steps(FirmwareComponent::Nic));
        assert_eq!(
            err.to_string(),
            "unsupported hardware: provider supermicro cannot install firmware on nic"
        );
        Ok(())
    }

    #[test]
    fn test_dell_naming_is_case_insensitive() {
        let naming = Provider::Dell.task_naming();
        assert_eq!(naming, TaskNaming::Prefixed("Firmware Update: "));
        assert_eq!(
            naming.classify("firmware update: bios", FirmwareComponent::Bios),
            NameMatch::Match
        );
    }

    #[test]
    fn test_step_display() {
        let steps = must(Provider::Supermicro.install_steps(FirmwareComponent::Bmc));
        let rendered: Vec<String> = steps.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["upload-and-initiate", "poll-status", "activate"]);
    }
}

mod oem_tests {
    use bmcfw_install::oem::{decode, decode_slice};
    use bmcfw_install::{DELL_ENVELOPE, OemError};
    use bmcfw_test_helpers::prelude::*;

    #[test]
    fn test_fixture_round_trips() -> TestResult {
        let descriptor = decode(&DELL_ENVELOPE, &dell_oem("Running", 42))?;
        assert_eq!(descriptor.id, DELL_JOB_ID);
        assert_eq!(descriptor.description, "Job Instance");
        assert_eq!(descriptor.job_state, "Running");
        assert_eq!(descriptor.job_type, "FirmwareUpdate");
        assert_eq!(descriptor.percent_complete, 42);
        assert_eq!(descriptor.start_time.as_deref(), Some("TIME_NOW"));
        Ok(())
    }

    #[test]
    fn test_other_job_type_is_rejected() {
        let raw = br#"{"Dell": {"JobType": "Other", "Description": "Job Instance", "JobState": "Completed"}}"#;
        assert!(matches!(
            decode_slice(&DELL_ENVELOPE, raw),
            Err(OemError::UnexpectedJobType { .. })
        ));
    }

    #[test]
    fn test_empty_object_is_empty() {
        assert_eq!(
            decode_slice(&DELL_ENVELOPE, b"{}"),
            Err(OemError::EmptyOemData)
        );
    }
}

mod image_tests {
    use bmcfw_install::prelude::*;
    use bmcfw_test_helpers::prelude::*;

    #[tokio::test]
    async fn test_image_from_missing_file_is_io_error() {
        let result = FirmwareImage::from_file("/nonexistent/bios.exe").await;
        let err: FirmwareInstallError = must_err(result).into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_image_debug_hides_bytes() {
        let rendered = format!("{:?}", firmware_image());
        assert!(rendered.contains("BIOS_0JK2R_WN64_2.19.0.EXE"));
        assert!(!rendered.contains("data"));
    }
}
