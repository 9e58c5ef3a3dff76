//! Validation pipeline.
//!
//! One request flows through `Canonicalize → XSD → BusinessRules → (Schematron) → Aggregate`.
//! Only a well-formedness failure stops the pipeline early; schema errors never prevent rule
//! evaluation, so a single response carries every finding. Whatever happens inside a stage,
//! [`Orchestrator::validate`] returns a complete [`ValidationResult`]: unexpected failures,
//! panics included, surface as a `System-Error` finding.
//!
//! ```text
//! Start -> Canonicalize -> StructuralValidate -> RuleEvaluate -> [ProfileReportMerge] -> Aggregate -> Done
//!               |                                                                          ^
//!               +---------------------- wellformedness failure ----------------------------+
//! ```

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::document::{self, Position};
use crate::error::{Result, ValidationError};
use crate::finding::{Finding, Severity};
use crate::rules::profile_report::{ProfileReport, RULE_PREFIX};
use crate::rules::{FiredRule, RuleEngine};
use crate::schema_registry::{SchemaRegistry, XSD_RULE};
use crate::svrl::{self, SvrlMetadata};
use crate::version::ErnVersion;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Canonicalize,
    #[serde(rename = "XSD")]
    Xsd,
    BusinessRules,
    Schematron,
    Aggregate,
}

/// Timing and finding count of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(rename = "type")]
    pub stage: Stage,
    /// Milliseconds
    pub duration: u64,
    /// Findings produced by the stage, whatever their severity.
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Version string as requested.
    pub version: String,
    /// Milliseconds
    pub processing_time: u64,
    /// `ERN <version>`
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub validated_at: DateTime<Utc>,
    pub error_count: usize,
    pub warning_count: usize,
    pub validation_steps: Vec<StepRecord>,
}

/// Aggregated outcome of one request. `valid` holds exactly when `errors` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Finding>,
    /// Warning and info findings.
    pub warnings: Vec<Finding>,
    pub metadata: ResultMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svrl: Option<String>,
    /// Rules that passed, for positive-evidence reports.
    #[serde(skip)]
    pub fired_rules: Vec<FiredRule>,
}

impl ValidationResult {
    /// Findings in aggregation order: errors, then warnings.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// One validation request.
#[derive(Debug, Clone, Default)]
pub struct ValidationRequest {
    pub content: Vec<u8>,
    pub version: String,
    pub profile: Option<String>,
    pub generate_svrl: bool,
}

impl ValidationRequest {
    pub fn new(content: impl Into<Vec<u8>>, version: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: Option<impl Into<String>>) -> Self {
        self.profile = profile.map(Into::into);
        self
    }

    pub fn with_svrl(mut self, generate: bool) -> Self {
        self.generate_svrl = generate;
        self
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Run XSD validation.
    pub structural: bool,
    /// Upper bound on concurrently validated files in batch mode.
    pub max_concurrent_validations: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            structural: true,
            max_concurrent_validations: num_cpus::get(),
        }
    }
}

/// Result of validating one file in batch mode.
#[derive(Debug, Clone, Serialize)]
pub struct FileValidation {
    pub path: PathBuf,
    pub result: ValidationResult,
}

/// Per-request accumulator.
#[derive(Default)]
struct Pipeline {
    findings: Vec<Finding>,
    steps: Vec<StepRecord>,
    fired: Vec<FiredRule>,
    message_id: Option<String>,
}

impl Pipeline {
    fn record(&mut self, stage: Stage, started: Instant, findings: Vec<Finding>) {
        debug!(stage = ?stage, findings = findings.len(), "stage complete");
        self.steps.push(StepRecord {
            stage,
            duration: started.elapsed().as_millis() as u64,
            error_count: findings.len(),
        });
        self.findings.extend(findings);
    }
}

/// Sequences the validation stages. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<SchemaRegistry>,
    engine: Arc<RuleEngine>,
    report: Arc<ProfileReport>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(registry: Arc<SchemaRegistry>, options: OrchestratorOptions) -> Self {
        Self {
            registry,
            engine: Arc::new(RuleEngine::new()),
            report: Arc::new(ProfileReport::new()),
            options,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Runs the full pipeline. Never fails; failures are findings.
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "validate",
            %request_id,
            version = %request.version,
            profile = request.profile.as_deref().unwrap_or("-"),
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ValidationRequest) -> ValidationResult {
        let started = Instant::now();
        let started_at = Utc::now();
        let mut pipeline = Pipeline::default();

        let outcome = AssertUnwindSafe(self.execute(request, &mut pipeline))
            .catch_unwind()
            .await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(payload) => Some(
                payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "internal failure".to_string()),
            ),
        };
        if let Some(message) = failure {
            warn!(error = %message, "validation pipeline failed");
            pipeline.findings.push(Finding::error(
                "System-Error",
                format!("Validation system error: {}", message),
            ));
        }

        let result = self.aggregate(request, pipeline, started, started_at);
        info!(
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            ms = result.metadata.processing_time,
            "validation finished"
        );
        result
    }

    async fn execute(&self, request: &ValidationRequest, pipeline: &mut Pipeline) -> Result<()> {
        let version: ErnVersion = match request.version.parse() {
            Ok(version) => version,
            Err(err) => {
                pipeline.findings.push(Finding::error("Unsupported-Version", err.to_string()));
                return Ok(());
            }
        };

        let started = Instant::now();
        let doc = match document::parse(&request.content) {
            Ok(doc) => {
                pipeline.record(Stage::Canonicalize, started, Vec::new());
                doc
            }
            Err(ValidationError::Wellformedness {
                line,
                column,
                message,
            }) => {
                let finding = Finding::new(
                    "XML-Wellformedness",
                    Severity::Error,
                    message,
                    Position { line, column },
                );
                pipeline.record(Stage::Canonicalize, started, vec![finding]);
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        pipeline.message_id = doc.message_id().map(str::to_string);

        if self.options.structural {
            let started = Instant::now();
            let findings = match self.registry.ensure_version(version).await {
                Ok(descriptor) => self.registry.validate_structure(&descriptor, &request.content),
                Err(err) => {
                    let err = ValidationError::from(err);
                    warn!(error = %err, "schema unavailable, document not structurally validated");
                    vec![Finding::error(XSD_RULE, format!("XSD validation error: {}", err))]
                }
            };
            pipeline.record(Stage::Xsd, started, findings);
        }

        let started = Instant::now();
        let evaluation = self
            .engine
            .evaluate_with_evidence(&doc, version, request.profile.as_deref());
        pipeline.fired.extend(evaluation.fired);
        pipeline.record(Stage::BusinessRules, started, evaluation.findings);

        if let Some(profile) = request.profile.as_deref() {
            let started = Instant::now();
            let report = self.report.evaluate(&doc, version, profile);
            let merged = merge_profile_findings(&pipeline.findings, report.findings);
            pipeline.fired.extend(report.fired);
            pipeline.record(Stage::Schematron, started, merged);
        }

        Ok(())
    }

    fn aggregate(
        &self,
        request: &ValidationRequest,
        mut pipeline: Pipeline,
        started: Instant,
        started_at: DateTime<Utc>,
    ) -> ValidationResult {
        let aggregate_started = Instant::now();
        let mut findings = std::mem::take(&mut pipeline.findings);
        findings.sort_by_key(|f| (f.line, f.column));
        let total = findings.len();
        let (errors, warnings): (Vec<Finding>, Vec<Finding>) =
            findings.into_iter().partition(Finding::is_error);
        pipeline.steps.push(StepRecord {
            stage: Stage::Aggregate,
            duration: aggregate_started.elapsed().as_millis() as u64,
            error_count: total,
        });

        let metadata = ResultMetadata {
            version: request.version.clone(),
            processing_time: started.elapsed().as_millis() as u64,
            schema_version: format!("ERN {}", request.version),
            profile: request.profile.clone(),
            message_id: pipeline.message_id,
            started_at,
            validated_at: Utc::now(),
            error_count: errors.len(),
            warning_count: warnings.len(),
            validation_steps: pipeline.steps,
        };

        let mut result = ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
            metadata,
            svrl: None,
            fired_rules: pipeline.fired,
        };
        if request.generate_svrl {
            result.svrl = Some(svrl::render(&result, &SvrlMetadata::from(&result.metadata)));
        }
        result
    }

    /// Validates many files with at most `max_concurrent_validations` in flight.
    pub async fn validate_files(
        &self,
        files: Vec<PathBuf>,
        version: &str,
        profile: Option<&str>,
        generate_svrl: bool,
    ) -> Result<Vec<FileValidation>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_validations.max(1)));
        let tasks: Vec<_> = files
            .into_iter()
            .map(|path| {
                let orchestrator = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let version = version.to_string();
                let profile = profile.map(str::to_string);

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        ValidationError::Concurrency {
                            details: "validation semaphore closed".to_string(),
                        }
                    })?;

                    let result = match tokio::fs::read(&path).await {
                        Ok(content) => {
                            let request = ValidationRequest {
                                content,
                                version,
                                profile,
                                generate_svrl,
                            };
                            orchestrator.validate(&request).await
                        }
                        Err(err) => {
                            let request = ValidationRequest {
                                version,
                                profile,
                                ..ValidationRequest::default()
                            };
                            orchestrator.unreadable(&request, &ValidationError::Io(err))
                        }
                    };
                    Ok::<FileValidation, ValidationError>(FileValidation { path, result })
                })
            })
            .collect();

        let outcomes = try_join_all(tasks)
            .await
            .map_err(|e| ValidationError::Concurrency {
                details: format!("Task join error: {}", e),
            })?;
        outcomes.into_iter().collect()
    }

    fn unreadable(&self, request: &ValidationRequest, err: &ValidationError) -> ValidationResult {
        let pipeline = Pipeline {
            findings: vec![Finding::error(
                "System-Error",
                format!("Validation system error: {}", err),
            )],
            ..Pipeline::default()
        };
        self.aggregate(request, pipeline, Instant::now(), Utc::now())
    }
}

/// Profile-report findings not already present under the same `Schematron-` rule id.
pub fn merge_profile_findings(existing: &[Finding], incoming: Vec<Finding>) -> Vec<Finding> {
    let present: HashSet<&str> = existing
        .iter()
        .map(|f| f.rule.as_str())
        .filter(|rule| rule.starts_with(RULE_PREFIX))
        .collect();
    incoming
        .into_iter()
        .filter(|f| !present.contains(f.rule.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_registry::RegistryConfig;
    use tempfile::TempDir;

    const MINIMAL_43: &str = r#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" AvsVersionId="1" LanguageAndScriptCode="en">
  <MessageHeader><MessageId>1</MessageId></MessageHeader>
  <ResourceList/>
  <ReleaseList/>
  <DealList/>
</ern:NewReleaseMessage>"#;

    fn orchestrator(structural: bool) -> (TempDir, Orchestrator) {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(SchemaRegistry::new(RegistryConfig {
            directory: dir.path().to_path_buf(),
            ..RegistryConfig::default()
        }));
        let options = OrchestratorOptions {
            structural,
            max_concurrent_validations: 2,
        };
        (dir, Orchestrator::new(registry, options))
    }

    fn rules(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule.as_str()).collect()
    }

    #[tokio::test]
    async fn test_missing_party_list_is_single_error() {
        let (_dir, orchestrator) = orchestrator(false);
        let result = orchestrator
            .validate(&ValidationRequest::new(MINIMAL_43, "4.3"))
            .await;

        assert!(!result.valid);
        assert_eq!(rules(&result.errors), vec!["ERN43-PartyList-Required"]);
        assert_eq!(result.metadata.schema_version, "ERN 4.3");
        assert_eq!(result.metadata.error_count, 1);
        let stages: Vec<Stage> = result.metadata.validation_steps.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![Stage::Canonicalize, Stage::BusinessRules, Stage::Aggregate]
        );
    }

    #[tokio::test]
    async fn test_wellformedness_short_circuits() {
        let (_dir, orchestrator) = orchestrator(true);
        let result = orchestrator
            .validate(&ValidationRequest::new("<NewReleaseMessage>", "4.3"))
            .await;

        assert!(!result.valid);
        assert_eq!(rules(&result.errors), vec!["XML-Wellformedness"]);
        assert!(result.warnings.is_empty());
        assert_eq!(result.metadata.validation_steps[0].stage, Stage::Canonicalize);
        assert_eq!(result.metadata.validation_steps.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_is_wellformedness_error() {
        let (_dir, orchestrator) = orchestrator(false);
        let result = orchestrator.validate(&ValidationRequest::new("", "4.3")).await;
        assert_eq!(rules(&result.errors), vec!["XML-Wellformedness"]);
    }

    #[tokio::test]
    async fn test_unsupported_version_runs_no_stage() {
        let (_dir, orchestrator) = orchestrator(true);
        let result = orchestrator
            .validate(&ValidationRequest::new(MINIMAL_43, "5.0"))
            .await;

        assert_eq!(rules(&result.errors), vec!["Unsupported-Version"]);
        assert_eq!(result.errors[0].message, "Unsupported ERN version: 5.0");
        assert_eq!(result.metadata.validation_steps.len(), 1);
        assert_eq!(result.metadata.validation_steps[0].stage, Stage::Aggregate);
    }

    #[tokio::test]
    async fn test_missing_schema_is_error_and_rules_still_run() {
        let (_dir, orchestrator) = orchestrator(true);
        let result = orchestrator
            .validate(&ValidationRequest::new(MINIMAL_43, "4.3"))
            .await;

        assert!(!result.valid);
        assert!(result.warnings.is_empty());
        assert_eq!(rules(&result.errors), vec!["XSD-Schema", "ERN43-PartyList-Required"]);
        assert!(result.errors[0].message.starts_with("XSD validation error: Schema unavailable for ERN 4.3"));
        assert_eq!(result.metadata.validation_steps[1].stage, Stage::Xsd);
        assert_eq!(result.metadata.validation_steps[1].error_count, 1);
    }

    #[tokio::test]
    async fn test_results_are_idempotent() {
        let (_dir, orchestrator) = orchestrator(false);
        let request = ValidationRequest::new(MINIMAL_43, "4.3").with_profile(Some("AudioAlbum"));
        let first = orchestrator.validate(&request).await;
        let second = orchestrator.validate(&request).await;
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.warnings, second.warnings);
    }

    #[tokio::test]
    async fn test_findings_are_ordered_by_position() {
        let (_dir, orchestrator) = orchestrator(false);
        let request = ValidationRequest::new(MINIMAL_43, "4.3").with_profile(Some("AudioAlbum"));
        let result = orchestrator.validate(&request).await;
        for findings in [&result.errors, &result.warnings] {
            assert!(
                findings
                    .windows(2)
                    .all(|w| (w[0].line, w[0].column) <= (w[1].line, w[1].column))
            );
        }
        assert!(result.errors.iter().any(|f| f.rule.starts_with("Schematron-")));
        assert!(result.metadata.validation_steps.iter().any(|s| s.stage == Stage::Schematron));
    }

    #[tokio::test]
    async fn test_svrl_attached_on_request() {
        let (_dir, orchestrator) = orchestrator(false);
        let request = ValidationRequest::new(MINIMAL_43, "4.3").with_svrl(true);
        let result = orchestrator.validate(&request).await;
        let svrl = result.svrl.as_deref().unwrap();
        assert_eq!(svrl.matches("<svrl:failed-assert").count(), result.errors.len());
        assert!(svrl.contains("<svrl:text>Errors: 1</svrl:text>"));
    }

    #[test]
    fn test_merge_skips_duplicate_schematron_ids() {
        let existing = vec![
            Finding::error("Schematron-MessageHeader-Required", "MessageHeader is required"),
            Finding::error("ERN43-PartyList-Required", "PartyList is required in ERN 4.3"),
        ];
        let incoming = vec![
            Finding::error("Schematron-MessageHeader-Required", "MessageHeader is required"),
            Finding::error("Schematron-ReleaseList-Required", "ReleaseList is required"),
        ];
        let merged = merge_profile_findings(&existing, incoming);
        assert_eq!(rules(&merged), vec!["Schematron-ReleaseList-Required"]);
    }

    #[test]
    fn test_metadata_serializes_wire_names() {
        let step = StepRecord {
            stage: Stage::Xsd,
            duration: 3,
            error_count: 2,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "XSD");
        assert_eq!(json["errorCount"], 2);
    }

    #[tokio::test]
    async fn test_validate_files_reports_unreadable_paths() {
        let (dir, orchestrator) = orchestrator(false);
        let good = dir.path().join("release.xml");
        std::fs::write(&good, MINIMAL_43).unwrap();
        let missing = dir.path().join("missing.xml");

        let outcomes = orchestrator
            .validate_files(vec![good.clone(), missing.clone()], "4.3", None, false)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].path, good);
        assert_eq!(rules(&outcomes[0].result.errors), vec!["ERN43-PartyList-Required"]);
        assert_eq!(rules(&outcomes[1].result.errors), vec!["System-Error"]);
        assert!(outcomes[1].result.errors[0]
            .message
            .starts_with("Validation system error: "));
    }
}
