//! Business-rule engine.
//!
//! Rules are native predicates over a [`RuleContext`]. Each version owns one ordered
//! [`RuleSet`]; each `(version, profile)` pair may add another. Sets are built once in
//! [`RuleEngine::new`] and shared read-only afterwards.
//!
//! A predicate that returns an error or panics never aborts the pass: it becomes a
//! `<rule id>-ExecutionError` finding and evaluation continues with the next rule.

pub mod common;
pub mod context;
pub mod ern382;
pub mod ern42;
pub mod ern43;
pub mod profile_report;
pub mod profiles;
pub mod vocab;

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{Element, ParsedDocument, Position};
use crate::error::RuleError;
use crate::finding::{Finding, Severity};
use crate::version::{ErnVersion, Profile};

pub use context::RuleContext;

/// Local name every ERN message root must carry.
pub const ROOT_ELEMENT: &str = "NewReleaseMessage";

/// Rule groups, evaluated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Structural,
    ReferenceSyntax,
    ReferentialIntegrity,
    IdentifierFormat,
    DisplayMetadata,
    DealTerms,
    Territory,
    ResourceGrouping,
    Consistency,
    BestPractice,
    ProfileMapping,
    Profile,
}

/// Outcome of one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Failed at the first offending element, or at 0:0 for a document-level absence.
    Fail(Position),
}

impl Verdict {
    /// Passes when `condition` holds, otherwise fails at document level.
    pub fn require(condition: bool) -> Verdict {
        if condition {
            Verdict::Pass
        } else {
            Verdict::Fail(Position::default())
        }
    }

    pub fn fail_at(element: &Element) -> Verdict {
        Verdict::Fail(element.position())
    }

    /// Fails at the first element for which `ok` is false.
    pub fn all<'e>(
        elements: impl IntoIterator<Item = &'e Element>,
        mut ok: impl FnMut(&'e Element) -> bool,
    ) -> Verdict {
        elements
            .into_iter()
            .find(|e| !ok(*e))
            .map_or(Verdict::Pass, Verdict::fail_at)
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

type Predicate = Box<dyn Fn(&RuleContext<'_>) -> Result<Verdict, RuleError> + Send + Sync>;

/// A single business rule.
pub struct Rule {
    id: String,
    category: Category,
    severity: Severity,
    message: String,
    suggestion: Option<String>,
    predicate: Predicate,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .finish()
    }
}

impl Rule {
    pub fn new<F>(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&RuleContext<'_>) -> Verdict + Send + Sync + 'static,
    {
        Rule::fallible(id, category, severity, message, move |ctx| Ok(predicate(ctx)))
    }

    /// Like [`Rule::new`], for predicates that can fail.
    pub fn fallible<F>(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&RuleContext<'_>) -> Result<Verdict, RuleError> + Send + Sync + 'static,
    {
        Rule {
            id: id.into(),
            category,
            severity,
            message: message.into(),
            suggestion: None,
            predicate: Box::new(predicate),
        }
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Runs the predicate in isolation. `None` means the rule passed.
    pub fn apply(&self, ctx: &RuleContext<'_>) -> Option<Finding> {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.predicate)(ctx)));
        let failure = match outcome {
            Ok(Ok(Verdict::Pass)) => return None,
            Ok(Ok(Verdict::Fail(position))) => {
                return Some(
                    Finding::new(&self.id, self.severity, &self.message, position)
                        .with_suggestion(self.suggestion.as_deref()),
                );
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        warn!(rule = %self.id, error = %failure, "rule execution failed");
        Some(Finding::error(format!("{}-ExecutionError", self.id), failure))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}

/// A rule that passed, kept as positive evidence for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredRule {
    pub id: String,
    pub context: Option<String>,
    pub severity: Severity,
    pub description: String,
}

/// Findings and passed rules from one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
    pub fired: Vec<FiredRule>,
}

impl Evaluation {
    fn absorb(&mut self, other: Evaluation) {
        self.findings.extend(other.findings);
        self.fired.extend(other.fired);
    }
}

/// Ordered rule list, kept sorted by [`Category`].
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Builds a set; rules are stably ordered by category.
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(Rule::category);
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Evaluation {
        let mut evaluation = Evaluation::default();
        for rule in &self.rules {
            match rule.apply(ctx) {
                Some(finding) => evaluation.findings.push(finding),
                None => evaluation.fired.push(FiredRule {
                    id: rule.id.clone(),
                    context: None,
                    severity: rule.severity,
                    description: rule.message.clone(),
                }),
            }
        }
        evaluation
    }
}

/// Version and profile rule sets, built once per process.
#[derive(Debug)]
pub struct RuleEngine {
    versions: HashMap<ErnVersion, RuleSet>,
    profiles: HashMap<(ErnVersion, Profile), RuleSet>,
}

impl RuleEngine {
    pub fn new() -> Self {
        let mut versions = HashMap::new();
        let mut profiles = HashMap::new();

        for version in ErnVersion::ALL {
            let rules = match version {
                ErnVersion::V43 => ern43::rules(),
                ErnVersion::V42 => ern42::rules(),
                ErnVersion::V382 => ern382::rules(),
            };
            versions.insert(version, RuleSet::new(rules));

            for profile in version.profiles() {
                let rules = profiles::rules(version, *profile);
                if !rules.is_empty() {
                    profiles.insert((version, *profile), RuleSet::new(rules));
                }
            }
        }

        debug!(
            versions = versions.len(),
            profile_sets = profiles.len(),
            "rule engine initialised"
        );
        RuleEngine { versions, profiles }
    }

    pub fn rule_set(&self, version: ErnVersion) -> Option<&RuleSet> {
        self.versions.get(&version)
    }

    pub fn profile_rule_set(&self, version: ErnVersion, profile: Profile) -> Option<&RuleSet> {
        self.profiles.get(&(version, profile))
    }

    /// Runs the version's rules, then the profile's, returning every finding.
    pub fn evaluate(
        &self,
        doc: &ParsedDocument,
        version: ErnVersion,
        profile: Option<&str>,
    ) -> Vec<Finding> {
        self.evaluate_with_evidence(doc, version, profile).findings
    }

    /// As [`RuleEngine::evaluate`], also reporting which rules passed.
    pub fn evaluate_with_evidence(
        &self,
        doc: &ParsedDocument,
        version: ErnVersion,
        profile: Option<&str>,
    ) -> Evaluation {
        let root = doc.root();
        if root.name() != ROOT_ELEMENT {
            return Evaluation {
                findings: vec![Finding::new(
                    "Root-Element",
                    Severity::Error,
                    format!(
                        "Invalid root element. Expected '{}', found '{}'",
                        ROOT_ELEMENT,
                        root.name()
                    ),
                    Position { line: 1, column: 1 },
                )],
                fired: Vec::new(),
            };
        }

        let ctx = RuleContext::new(doc, version);
        let mut evaluation = self
            .versions
            .get(&version)
            .map(|set| set.evaluate(&ctx))
            .unwrap_or_default();

        if let Some(name) = profile {
            evaluation.absorb(self.evaluate_profile(&ctx, version, name));
        }
        evaluation
    }

    fn evaluate_profile(&self, ctx: &RuleContext<'_>, version: ErnVersion, name: &str) -> Evaluation {
        let Some(profile) = Profile::parse(name) else {
            return Evaluation {
                findings: vec![Finding::new(
                    "Profile-Unsupported",
                    Severity::Warning,
                    format!("Profile \"{}\" is not supported; profile rules were skipped", name),
                    Position::default(),
                )],
                fired: Vec::new(),
            };
        };

        if !version.profiles().contains(&profile) {
            return Evaluation {
                findings: vec![Finding::error(
                    "Profile-Version-Mismatch",
                    format!("Profile {} is not defined for ERN {}", profile, version),
                )],
                fired: Vec::new(),
            };
        }

        self.profiles
            .get(&(version, profile))
            .map(|set| set.evaluate(ctx))
            .unwrap_or_default()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
