//! Display formatting for CLI output
//!
//! State and schemas go to stdout as JSON (or YAML for manifests) so they
//! can be piped; diagnostics go to stderr.

use console::style;
use crdform_kube::{Diagnostic, Diagnostics, Severity, TypeListing};
use serde::Serialize;

use crate::error::Result;

/// One diagnostic line, plus its detail as a hint
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let icon = match diagnostic.severity {
        Severity::Error => style("✗").red(),
        Severity::Warning => style("⚠").yellow(),
    };

    let path_display = match &diagnostic.attribute {
        Some(path) if !path.is_empty() => format!(" at {}", style(path).dim()),
        _ => String::new(),
    };

    let mut line = format!("  {} {}{}", icon, diagnostic.summary, path_display);
    if let Some(detail) = &diagnostic.detail {
        line.push_str(&format!("\n    {} {}", style("hint:").blue(), detail));
    }
    line
}

/// Print diagnostics to stderr
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
}

/// Error and warning counts
pub fn summary(diagnostics: &Diagnostics) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    (errors, diagnostics.len() - errors)
}

/// Print summary line for a validation run
pub fn print_validation_summary(diagnostics: &Diagnostics) {
    let (errors, warnings) = summary(diagnostics);
    if errors > 0 {
        eprintln!(
            "{} Validation failed: {}, {}",
            style("✗").red().bold(),
            pluralize(errors, "error", "errors"),
            pluralize(warnings, "warning", "warnings")
        );
    } else if warnings > 0 {
        eprintln!(
            "{} Validation passed with {}",
            style("⚠").yellow().bold(),
            pluralize(warnings, "warning", "warnings")
        );
    } else {
        eprintln!("{} Validation passed!", style("✓").green().bold());
    }
}

/// Pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Type names grouped by mode
pub fn print_types(listing: &TypeListing) {
    for (title, names) in [
        ("Resources", &listing.resources),
        ("Data sources", &listing.data_sources),
        ("Manifests", &listing.manifests),
    ] {
        println!("{} ({})", style(title).cyan().bold(), names.len());
        for name in names {
            println!("  {}", name);
        }
    }
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
