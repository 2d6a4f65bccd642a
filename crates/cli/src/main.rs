//! bmcfwctl - BMC firmware install CLI
//!
//! Uploads firmware images to a baseboard management controller over Redfish,
//! starts the install and tracks it to completion.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod client;
mod commands;
mod error;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use bmcfw_install::FirmwareComponent;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::BmcArgs;
use crate::commands::install::InstallOptions;

#[derive(Parser)]
#[command(name = "bmcfwctl")]
#[command(about = "BMC firmware install CLI - upload, install and track firmware updates")]
#[command(version)]
#[command(long_about = "
bmcfwctl drives firmware installs on baseboard management controllers over
Redfish. It refuses to start an install while another one is active for the
same component, and reconciles vendor task and job records when polling.

Use --json for machine-readable output. Exit codes: 0 ok, 2 refused before
anything reached the BMC, 3 task not found, 4 transport failure, 1 other.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    bmc: BmcArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the install steps the provider follows for a component
    Steps {
        /// Component to install
        component: FirmwareComponent,
    },

    /// List tasks currently on the BMC
    Tasks,

    /// Upload an image and start the install
    Install {
        /// Component the image targets
        component: FirmwareComponent,
        /// Firmware image file
        file: PathBuf,
        /// Give up after this many minutes (no limit when omitted)
        #[arg(long)]
        deadline_mins: Option<u64>,
        /// Poll until the install finishes
        #[arg(short, long)]
        wait: bool,
        /// Seconds between polls with --wait (installer default when omitted)
        #[arg(long)]
        poll_secs: Option<u64>,
        /// Version expected once the install finishes
        #[arg(long)]
        expected_version: Option<String>,
    },

    /// Poll an install once
    Status {
        /// Component the install targets
        component: FirmwareComponent,
        /// Task id returned by `install`
        task_id: String,
        /// Version expected once the install finishes
        #[arg(long)]
        expected_version: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("bmcfwctl={log_level},bmcfw_install={log_level},bmcfw_redfish={log_level}")
                    .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli).await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            std::process::exit(error::exit_code(&e));
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Steps { component } => commands::inspect::steps(&cli.bmc, *component, cli.json),
        Commands::Tasks => commands::inspect::tasks(&cli.bmc, cli.json).await,
        Commands::Install {
            component,
            file,
            deadline_mins,
            wait,
            poll_secs,
            expected_version,
        } => {
            let opts = InstallOptions {
                component: *component,
                file,
                deadline_mins: *deadline_mins,
                wait: *wait,
                poll_secs: *poll_secs,
                expected_version: expected_version.as_deref(),
            };
            commands::install::execute(&cli.bmc, &opts, cli.json).await
        }
        Commands::Status {
            component,
            task_id,
            expected_version,
        } => {
            commands::inspect::status(
                &cli.bmc,
                *component,
                task_id,
                expected_version.as_deref(),
                cli.json,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmcfw_install::Provider;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    // --- Global flag parsing ---

    #[test]
    fn parse_tasks_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["bmcfwctl", "--host", "10.0.0.12", "tasks"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.bmc.host.as_deref(), Some("10.0.0.12"));
        assert_eq!(cli.bmc.username, "root");
        assert_eq!(cli.bmc.provider, Provider::Generic);
        assert!(!cli.bmc.insecure);
        assert!(matches!(cli.command, Commands::Tasks));
        Ok(())
    }

    #[test]
    fn parse_global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from([
            "bmcfwctl",
            "tasks",
            "--json",
            "--provider",
            "idrac",
            "--insecure",
            "-vv",
        ])?;
        assert!(cli.json);
        assert!(cli.bmc.insecure);
        assert_eq!(cli.bmc.provider, Provider::Dell);
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    #[test]
    fn parse_steps_component() -> TestResult {
        let cli = Cli::try_parse_from(["bmcfwctl", "steps", "BIOS"])?;
        match &cli.command {
            Commands::Steps { component } => assert_eq!(*component, FirmwareComponent::Bios),
            _ => return Err("expected Steps command".into()),
        }
        Ok(())
    }

    // --- Install parsing ---

    #[test]
    fn parse_install_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["bmcfwctl", "install", "bmc", "bmc.bin"])?;
        match &cli.command {
            Commands::Install {
                component,
                file,
                deadline_mins,
                wait,
                poll_secs,
                expected_version,
            } => {
                assert_eq!(*component, FirmwareComponent::Bmc);
                assert_eq!(file, &PathBuf::from("bmc.bin"));
                assert_eq!(*deadline_mins, None);
                assert!(!wait);
                assert_eq!(*poll_secs, None);
                assert!(expected_version.is_none());
            }
            _ => return Err("expected Install command".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_install_with_wait() -> TestResult {
        let cli = Cli::try_parse_from([
            "bmcfwctl",
            "install",
            "bios",
            "BIOS_0JK2R_WN64_2.19.0.EXE",
            "--deadline-mins",
            "45",
            "--wait",
            "--poll-secs",
            "30",
            "--expected-version",
            "2.19.0",
        ])?;
        match &cli.command {
            Commands::Install {
                deadline_mins,
                wait,
                poll_secs,
                expected_version,
                ..
            } => {
                assert_eq!(*deadline_mins, Some(45));
                assert!(wait);
                assert_eq!(*poll_secs, Some(30));
                assert_eq!(expected_version.as_deref(), Some("2.19.0"));
            }
            _ => return Err("expected Install command".into()),
        }
        Ok(())
    }

    // --- Status parsing ---

    #[test]
    fn parse_status() -> TestResult {
        let cli = Cli::try_parse_from(["bmcfwctl", "status", "bios", "JID_467696020275"])?;
        match &cli.command {
            Commands::Status {
                component,
                task_id,
                expected_version,
            } => {
                assert_eq!(*component, FirmwareComponent::Bios);
                assert_eq!(task_id, "JID_467696020275");
                assert!(expected_version.is_none());
            }
            _ => return Err("expected Status command".into()),
        }
        Ok(())
    }

    // --- Rejection / error cases ---

    #[test]
    fn reject_no_subcommand() {
        assert!(matches!(Cli::try_parse_from(["bmcfwctl"]), Err(_)));
    }

    #[test]
    fn reject_unknown_component() {
        assert!(matches!(
            Cli::try_parse_from(["bmcfwctl", "steps", "gpu"]),
            Err(_)
        ));
    }

    #[test]
    fn reject_unknown_provider() {
        assert!(matches!(
            Cli::try_parse_from(["bmcfwctl", "--provider", "hpe", "tasks"]),
            Err(_)
        ));
    }

    #[test]
    fn reject_install_without_file() {
        assert!(matches!(
            Cli::try_parse_from(["bmcfwctl", "install", "bios"]),
            Err(_)
        ));
    }

    #[test]
    fn reject_non_numeric_deadline() {
        assert!(matches!(
            Cli::try_parse_from(["bmcfwctl", "install", "bios", "f.bin", "--deadline-mins", "soon"]),
            Err(_)
        ));
    }
}
