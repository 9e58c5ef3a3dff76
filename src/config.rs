use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::error::{ConfigError, ConfigResult};
use crate::http_client::HttpClientConfig;
use crate::orchestrator::OrchestratorOptions;
use crate::schema_registry::{RegistryConfig, SchemaMode};
use crate::version::ErnVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = "ern-validate";
const ENV_PREFIX: &str = "ERN_VALIDATE_";

/// Trait for abstracting environment variable access
#[cfg_attr(test, mockall::automock)]
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub schemas: SchemaConfig,
    pub validation: ValidationConfig,
    pub network: NetworkConfig,
    pub output: OutputConfig,
}

/// Schema asset configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchemaConfig {
    /// Root holding one directory per version
    pub directory: PathBuf,
    pub mode: SchemaMode,
    /// Compiled schemas kept in memory
    pub cache_capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run XSD validation
    pub structural: bool,
    pub generate_svrl: bool,
    pub max_concurrent_validations: usize,
    /// Version used when none is given on the command line
    pub default_version: String,
}

/// Network configuration (bootstrap fetch only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Number of retry attempts for failed downloads
    pub retry_attempts: u32,
    /// Retry delay in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: VerbosityLevel,
    pub json_logs: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let registry = RegistryConfig::default();
        Self {
            directory: registry.directory,
            mode: registry.mode,
            cache_capacity: registry.cache_capacity,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            structural: true,
            generate_svrl: false,
            max_concurrent_validations: num_cpus::get(),
            default_version: ErnVersion::V43.as_str().to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Config {
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            directory: self.schemas.directory.clone(),
            mode: self.schemas.mode,
            cache_capacity: self.schemas.cache_capacity,
            http: HttpClientConfig {
                timeout_seconds: self.network.timeout_seconds,
                retry_attempts: self.network.retry_attempts,
                retry_delay_ms: self.network.retry_delay_ms,
                ..HttpClientConfig::default()
            },
        }
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            structural: self.validation.structural,
            max_concurrent_validations: self.validation.max_concurrent_validations,
        }
    }
}

/// Configuration manager for loading and layering configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> ConfigResult<Config> {
        let mut config = match &cli.config {
            Some(path) => Self::load_from_file(path).await?,
            None => match Self::find_config_file().await {
                Some(path) => Self::load_from_file(&path).await?,
                None => Config::default(),
            },
        };

        config = Self::apply_environment_overrides(config)?;
        config = Self::merge_with_cli(config, cli);
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON). Missing keys keep their defaults.
    pub async fn load_from_file(path: &Path) -> ConfigResult<Config> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let invalid = |details: String| ConfigError::InvalidFormat { details };
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| invalid(e.to_string())),
            Some("json") => serde_json::from_str(&content).map_err(|e| invalid(e.to_string())),
            Some(ext) => Err(invalid(format!("unsupported configuration file type: {}", ext))),
            None => toml::from_str(&content)
                .or_else(|_| serde_json::from_str(&content))
                .map_err(|e| invalid(e.to_string())),
        }
    }

    /// Looks in the working directory, then `<config dir>/ern-validate/config.toml`.
    pub async fn find_config_file() -> Option<PathBuf> {
        let mut candidates = vec![
            PathBuf::from("ern-validate.toml"),
            PathBuf::from(".ern-validate.toml"),
            PathBuf::from("ern-validate.json"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(APP_DIR).join("config.toml"));
            candidates.push(config_dir.join(APP_DIR).join("config.json"));
        }

        for path in candidates {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> ConfigResult<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply `ERN_VALIDATE_*` overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> ConfigResult<Config> {
        if let Some(dir) = env.get(&var("SCHEMA_DIR")) {
            config.schemas.directory = PathBuf::from(dir);
        }
        if let Some(mode) = env.get(&var("SCHEMA_MODE")) {
            config.schemas.mode = match mode.to_lowercase().as_str() {
                "serving" => SchemaMode::Serving,
                "bootstrap" => SchemaMode::Bootstrap,
                _ => return Err(invalid_env("SCHEMA_MODE", &mode, "expected serving or bootstrap")),
            };
        }
        if let Some(capacity) = parse_env(env, "CACHE_CAPACITY")? {
            config.schemas.cache_capacity = capacity;
        }

        if let Some(structural) = parse_env(env, "STRUCTURAL")? {
            config.validation.structural = structural;
        }
        if let Some(svrl) = parse_env(env, "SVRL")? {
            config.validation.generate_svrl = svrl;
        }
        if let Some(max) = parse_env(env, "MAX_CONCURRENT")? {
            config.validation.max_concurrent_validations = max;
        }
        if let Some(version) = env.get(&var("DEFAULT_VERSION")) {
            config.validation.default_version = version;
        }

        if let Some(timeout) = parse_env(env, "TIMEOUT")? {
            config.network.timeout_seconds = timeout;
        }
        if let Some(attempts) = parse_env(env, "RETRY_ATTEMPTS")? {
            config.network.retry_attempts = attempts;
        }
        if let Some(delay) = parse_env(env, "RETRY_DELAY_MS")? {
            config.network.retry_delay_ms = delay;
        }

        if let Some(format) = env.get(&var("FORMAT")) {
            config.output.format = match format.to_lowercase().as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                "svrl" => OutputFormat::Svrl,
                _ => return Err(invalid_env("FORMAT", &format, "expected text, json or svrl")),
            };
        }
        if let Some(json_logs) = parse_env(env, "JSON_LOGS")? {
            config.output.json_logs = json_logs;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(dir) = &cli.schema_dir {
            config.schemas.directory = dir.clone();
        }
        if cli.bootstrap {
            config.schemas.mode = SchemaMode::Bootstrap;
        }

        if cli.no_structural {
            config.validation.structural = false;
        }
        if cli.svrl {
            config.validation.generate_svrl = true;
        }
        if let Some(jobs) = cli.jobs {
            config.validation.max_concurrent_validations = jobs;
        }
        if let Some(version) = &cli.ern_version {
            config.validation.default_version = version.clone();
        }

        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if let Some(verbosity) = cli.verbosity() {
            config.output.verbosity = verbosity;
        }
        if cli.json_logs {
            config.output.json_logs = true;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> ConfigResult<()> {
        if config.schemas.directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "schemas.directory".to_string(),
            });
        }

        if config.schemas.cache_capacity == 0 {
            return Err(invalid_value(
                "schemas.cache_capacity",
                "0",
                "must be greater than 0",
            ));
        }

        if config.validation.max_concurrent_validations == 0 {
            return Err(invalid_value(
                "validation.max_concurrent_validations",
                "0",
                "must be greater than 0",
            ));
        }

        if config.validation.default_version.parse::<ErnVersion>().is_err() {
            return Err(invalid_value(
                "validation.default_version",
                &config.validation.default_version,
                "supported versions are 4.3, 4.2 and 3.8.2",
            ));
        }

        if config.network.timeout_seconds == 0 {
            return Err(invalid_value(
                "network.timeout_seconds",
                "0",
                "must be greater than 0",
            ));
        }

        if config.network.retry_attempts > 10 {
            return Err(invalid_value(
                "network.retry_attempts",
                &config.network.retry_attempts.to_string(),
                "cannot exceed 10",
            ));
        }

        Ok(())
    }
}

fn var(name: &str) -> String {
    format!("{}{}", ENV_PREFIX, name)
}

fn parse_env<T: FromStr>(env: &impl EnvProvider, name: &str) -> ConfigResult<Option<T>> {
    match env.get(&var(name)) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid_env(name, &raw, "could not be parsed")),
        None => Ok(None),
    }
}

fn invalid_env(name: &str, value: &str, reason: &str) -> ConfigError {
    invalid_value(&var(name), value, reason)
}

fn invalid_value(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
