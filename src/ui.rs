//! Console output helpers for the CLI.

use crate::error::MonoverError;
use crate::resolver::VersionResult;
use console::style;

/// One line per resolved project, with the essentials.
pub fn display_result(result: &VersionResult) {
    let marker = if result.changed {
        style("↑").green().to_string()
    } else {
        style("=").dim().to_string()
    };

    let mut line = format!(
        "{} {} {} ({}, {} branch '{}')",
        marker,
        style(&result.project).bold(),
        style(&result.version_string).cyan(),
        result.reason,
        result.scheme,
        result.branch_name,
    );

    if let Some(group) = &result.group {
        line.push_str(&format!(" [group {}]", group));
    }
    println!("{}", line);

    if let Some(validation) = &result.validation {
        for error in &validation.errors {
            println!("  {} {}", style("validation:").red(), error);
        }
    }
    for warning in &result.warnings {
        println!("  {} {}", style("warning:").yellow(), warning);
    }
}

pub fn display_failure(project: &str, error: &MonoverError) {
    eprintln!(
        "{} {}: {}",
        style("✗").red(),
        style(project).bold(),
        error
    );
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}
