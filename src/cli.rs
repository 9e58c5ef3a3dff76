use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    /// Only show invalid files
    Quiet,
    /// Show findings and the summary
    #[default]
    Normal,
    /// Also show suggestions and stage timings
    Verbose,
    /// Also show rule evidence
    Debug,
}

/// Report format written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Svrl,
}

/// DDEX ERN validator
#[derive(Parser, Debug, Clone)]
#[command(name = "ern-validate")]
#[command(about = "Validate DDEX ERN messages: XSD structure, business rules and profile conformance")]
#[command(version)]
pub struct Cli {
    /// ERN XML files to validate
    pub files: Vec<PathBuf>,

    /// ERN version (4.3, 4.2 or 3.8.2)
    #[arg(short = 'e', long = "ern-version")]
    pub ern_version: Option<String>,

    /// Release profile (e.g. AudioAlbum)
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<String>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Attach an SVRL report to every result
    #[arg(long = "svrl")]
    pub svrl: bool,

    /// Root of the per-version schema directories
    #[arg(long = "schema-dir")]
    pub schema_dir: Option<PathBuf>,

    /// Fetch missing schemas from ddex.net
    #[arg(long = "bootstrap")]
    pub bootstrap: bool,

    /// Skip XSD validation
    #[arg(long = "no-structural")]
    pub no_structural: bool,

    /// Maximum number of files validated concurrently
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<usize>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// List supported versions and profiles, then exit
    #[arg(long = "formats")]
    pub formats: bool,

    /// Check schema assets of every version, then exit
    #[arg(long = "verify-schemas")]
    pub verify_schemas: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report invalid files
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long = "json-logs")]
    pub json_logs: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() && !self.formats && !self.verify_schemas {
            return Err("No input files given".to_string());
        }
        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err("Number of jobs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// `None` when no verbosity flag was given.
    pub fn verbosity(&self) -> Option<VerbosityLevel> {
        match (self.quiet, self.verbose) {
            (true, _) => Some(VerbosityLevel::Quiet),
            (false, 0) => None,
            (false, 1) => Some(VerbosityLevel::Verbose),
            (false, _) => Some(VerbosityLevel::Debug),
        }
    }
}
