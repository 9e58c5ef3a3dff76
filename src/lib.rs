//! # ern-validate
//!
//! Validation core for DDEX ERN (Electronic Release Notification) messages.
//!
//! A document is canonicalized, checked against the compiled XSD of its ERN version, then run
//! through the version's business rules and optional profile rules. Every finding lands in one
//! [`ValidationResult`], which can also be rendered as an SVRL report.
//!
//! ```no_run
//! # async fn demo() {
//! use std::sync::Arc;
//! use ern_validate::{Orchestrator, OrchestratorOptions, RegistryConfig, SchemaRegistry, ValidationRequest};
//!
//! let registry = Arc::new(SchemaRegistry::new(RegistryConfig::default()));
//! let orchestrator = Orchestrator::new(registry, OrchestratorOptions::default());
//! let request = ValidationRequest::new(std::fs::read("release.xml").unwrap(), "4.3")
//!     .with_profile(Some("AudioAlbum"));
//! let result = orchestrator.validate(&request).await;
//! println!("valid: {}", result.valid);
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod finding;
pub mod http_client;
pub mod libxml2;
pub mod orchestrator;
pub mod output;
pub mod rules;
pub mod schema_registry;
pub mod svrl;
pub mod version;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigManager, EnvProvider, SystemEnvProvider};
pub use document::{Element, ParsedDocument, Position};
pub use error::{ConfigError, RuleError, SchemaError, ValidationError};
pub use finding::{Finding, Severity};
pub use http_client::{AsyncHttpClient, HttpClientConfig};
pub use libxml2::{LibXml2Wrapper, XmlSchemaPtr};
pub use orchestrator::{
    FileValidation, Orchestrator, OrchestratorOptions, ResultMetadata, Stage, StepRecord,
    ValidationRequest, ValidationResult,
};
pub use rules::profile_report::ProfileReport;
pub use rules::{FiredRule, RuleEngine};
pub use schema_registry::{
    RegistryConfig, SchemaDescriptor, SchemaHealth, SchemaMode, SchemaRegistry, SchemaStatus,
};
pub use svrl::SvrlMetadata;
pub use version::{ErnVersion, Profile};
