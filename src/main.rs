use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use ern_validate::cli::{Cli, VerbosityLevel};
use ern_validate::config::{Config, ConfigManager, OutputConfig};
use ern_validate::orchestrator::Orchestrator;
use ern_validate::output::{self, Output};
use ern_validate::schema_registry::{SchemaHealth, SchemaRegistry};
use ern_validate::version;

const EXIT_INVALID: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = cli.validate() {
        eprintln!("error: {}", e);
        return ExitCode::from(EXIT_USAGE);
    }

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    init_tracing(&config.output);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "ern-validate starting");

    match run(&cli, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn init_tracing(output: &OutputConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match output.verbosity {
        VerbosityLevel::Quiet => EnvFilter::new("error"),
        VerbosityLevel::Normal => EnvFilter::new("warn"),
        VerbosityLevel::Verbose => EnvFilter::new("info"),
        VerbosityLevel::Debug => EnvFilter::new("debug"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if output.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Returns whether every validated file was valid.
async fn run(cli: &Cli, config: &Config) -> Result<bool> {
    let format = config.output.format;

    if cli.formats {
        println!("{}", output::format_formats(&version::formats(), format)?);
        return Ok(true);
    }

    let registry = Arc::new(SchemaRegistry::new(config.registry_config()));

    if cli.verify_schemas {
        let statuses = registry.verify().await;
        let healthy = statuses.iter().all(|s| s.status == SchemaHealth::Ok);
        let listing = output::format_listing(&statuses, format, |s| match &s.error {
            None => format!("ERN {}: ok", s.version),
            Some(error) => format!("ERN {}: failed - {}", s.version, error),
        })?;
        println!("{}", listing);
        return Ok(healthy);
    }

    let orchestrator = Orchestrator::new(registry, config.orchestrator_options());
    let generate_svrl = config.validation.generate_svrl
        || format == ern_validate::cli::OutputFormat::Svrl;

    let started = Instant::now();
    let outcomes = orchestrator
        .validate_files(
            cli.files.clone(),
            &config.validation.default_version,
            cli.profile.as_deref(),
            generate_svrl,
        )
        .await
        .context("batch validation failed")?;

    let report = Output::new(config.output.verbosity, format)
        .format_results(&outcomes, started.elapsed())
        .context("failed to render report")?;
    print!("{}", report);
    if !report.ends_with('\n') {
        println!();
    }

    Ok(outcomes.iter().all(|o| o.result.valid))
}
