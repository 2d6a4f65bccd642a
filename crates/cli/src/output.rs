//! Output formatting for CLI responses

use anyhow::Error;
use bmcfw_install::{FirmwareComponent, InstallStep, Provider, Task, TaskHandle, TaskState, TaskStatus};
use colored::*;
use serde_json::{Value, json};

fn emit_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    emit_json(&json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "exit_code": crate::error::exit_code(error)
        }
    }));
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Print the install plan for a component
pub fn print_steps(
    provider: Provider,
    component: FirmwareComponent,
    steps: &[InstallStep],
    json: bool,
) {
    if json {
        let steps: Vec<String> = steps.iter().map(ToString::to_string).collect();
        emit_json(&json!({
            "success": true,
            "provider": provider,
            "component": component,
            "steps": steps
        }));
        return;
    }

    println!("{} {} on {}", "Install plan:".bold(), component, provider);
    for (n, step) in steps.iter().enumerate() {
        println!("  {}. {}", n.saturating_add(1), step);
    }
}

/// Print the tasks currently known to the BMC
pub fn print_tasks(tasks: &[Task], json: bool) {
    if json {
        emit_json(&json!({ "success": true, "tasks": tasks }));
        return;
    }

    if tasks.is_empty() {
        println!("{}", "No tasks on the BMC".yellow());
        return;
    }

    println!("{}", "BMC Tasks:".bold());
    for task in tasks {
        println!(
            "  {} {} [{}] {}",
            "●".cyan(),
            task.id.bold(),
            task.task_state,
            task.name.dimmed()
        );
    }
}

/// Print the handle of a freshly initiated install
pub fn print_handle(handle: &TaskHandle, component: FirmwareComponent, json: bool) {
    if json {
        emit_json(&json!({
            "success": true,
            "component": component,
            "task_id": handle
        }));
    } else {
        println!(
            "{} {} install started as task {}",
            "✓".green(),
            component,
            handle.as_str().bold()
        );
    }
}

/// Print one status poll
pub fn print_status(status: &TaskStatus, json: bool) {
    if json {
        emit_json(&json!({ "success": true, "status": status }));
        return;
    }

    let line = status.status_line();
    let line = match status.state {
        TaskState::Succeeded => line.green(),
        TaskState::Failed => line.red(),
        TaskState::Unknown => line.yellow(),
        TaskState::Pending | TaskState::Running => line.normal(),
    };
    println!("{line}");
    println!("  {} {}", "source:".dimmed(), status.source);
    if let Some(version) = &status.expected_version {
        println!("  {} {}", "expected version:".dimmed(), version);
    }
}
