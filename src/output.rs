//! Report formatting for the command line.

use std::time::Duration;

use serde::Serialize;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::finding::{Finding, Severity};
use crate::orchestrator::{FileValidation, ValidationResult};
use crate::svrl::{self, SvrlMetadata};
use crate::version::FormatEntry;

/// Output formatter for batch results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: format == OutputFormat::Text && atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(
        &self,
        outcomes: &[FileValidation],
        elapsed: Duration,
    ) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Text => Ok(self.format_text(outcomes, elapsed)),
            OutputFormat::Json => match outcomes {
                [single] => serde_json::to_string_pretty(&single.result),
                _ => serde_json::to_string_pretty(outcomes),
            },
            OutputFormat::Svrl => Ok(outcomes
                .iter()
                .map(|o| Self::format_svrl(&o.result))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// The attached report, or positive evidence when nothing was found.
    pub fn format_svrl(result: &ValidationResult) -> String {
        let metadata = SvrlMetadata::from(&result.metadata);
        if result.errors.is_empty() && result.warnings.is_empty() {
            return svrl::render_fired_rules(&result.fired_rules, &metadata);
        }
        result
            .svrl
            .clone()
            .unwrap_or_else(|| svrl::render(result, &metadata))
    }

    fn format_text(&self, outcomes: &[FileValidation], elapsed: Duration) -> String {
        let mut output = String::new();

        for outcome in outcomes {
            if self.verbosity == VerbosityLevel::Quiet && outcome.result.valid {
                continue;
            }
            output.push_str(&self.format_file_result(outcome));
            output.push('\n');
        }

        if self.verbosity > VerbosityLevel::Quiet {
            output.push_str(&self.format_summary(outcomes, elapsed));
        }
        output
    }

    pub fn format_file_result(&self, outcome: &FileValidation) -> String {
        let result = &outcome.result;
        let duration = format_duration(Duration::from_millis(result.metadata.processing_time));
        let mut output = if result.valid {
            format!(
                "{}  {} ({})",
                self.colorize("✓ VALID", "32"),
                outcome.path.display(),
                duration
            )
        } else {
            format!(
                "{}  {} ({}) - {} error{}",
                self.colorize("✗ INVALID", "31"),
                outcome.path.display(),
                duration,
                result.errors.len(),
                if result.errors.len() == 1 { "" } else { "s" }
            )
        };
        if !result.warnings.is_empty() {
            output.push_str(&format!(
                ", {} warning{}",
                result.warnings.len(),
                if result.warnings.len() == 1 { "" } else { "s" }
            ));
        }

        if self.verbosity == VerbosityLevel::Quiet {
            return output;
        }
        for finding in result.findings() {
            output.push_str("\n    ");
            output.push_str(&self.format_finding(finding));
        }

        if self.verbosity >= VerbosityLevel::Verbose {
            let steps: Vec<String> = result
                .metadata
                .validation_steps
                .iter()
                .map(|s| format!("{:?} {}ms", s.stage, s.duration))
                .collect();
            output.push_str(&format!("\n    stages: {}", steps.join(", ")));
        }
        if self.verbosity == VerbosityLevel::Debug {
            output.push_str(&format!("\n    rules passed: {}", result.fired_rules.len()));
        }
        output
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let label = match finding.severity {
            Severity::Error => self.colorize("error", "31"),
            Severity::Warning => self.colorize("warning", "33"),
            Severity::Info => self.colorize("info", "36"),
        };
        let mut line = if finding.line == 0 {
            format!("{} [{}] {}", label, finding.rule, finding.message)
        } else {
            format!(
                "{} {}:{} [{}] {}",
                label, finding.line, finding.column, finding.rule, finding.message
            )
        };
        if self.verbosity >= VerbosityLevel::Verbose
            && let Some(suggestion) = &finding.suggestion
        {
            line.push_str(&format!("\n      suggestion: {}", suggestion));
        }
        line
    }

    fn format_summary(&self, outcomes: &[FileValidation], elapsed: Duration) -> String {
        let valid = outcomes.iter().filter(|o| o.result.valid).count();
        let invalid = outcomes.len() - valid;

        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", outcomes.len()));
        output.push_str(&format!("  {} {}\n", self.colorize("Valid:", "32"), valid));
        if invalid > 0 {
            output.push_str(&format!("  {} {}\n", self.colorize("Invalid:", "31"), invalid));
        }
        output.push_str(&format!("  Duration: {}\n", format_duration(elapsed)));
        output
    }
}

/// Renders the supported versions listing.
pub fn format_formats(entries: &[FormatEntry], format: OutputFormat) -> serde_json::Result<String> {
    format_listing(entries, format, |entry| {
        format!(
            "ERN {}{}\n  namespace: {}\n  profiles: {}",
            entry.version,
            if entry.recommended { " (recommended)" } else { "" },
            entry.namespace,
            entry.profiles.join(", ")
        )
    })
}

/// Pretty JSON for `--format json`, one text block per item otherwise.
pub fn format_listing<T: Serialize>(
    items: &[T],
    format: OutputFormat,
    text: impl Fn(&T) -> String,
) -> serde_json::Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(items);
    }
    Ok(items.iter().map(|item| text(item) + "\n").collect())
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
