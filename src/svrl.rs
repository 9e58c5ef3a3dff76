//! SVRL (Schematron Validation Report Language) rendering.
//!
//! Error findings become `svrl:failed-assert`, warning and info findings become
//! `svrl:successful-report`, interleaved in one list ordered by line. The output is pretty-printed by
//! breaking every `><` onto its own line, which downstream consumers match byte for byte.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::finding::{Finding, Severity};
use crate::orchestrator::{ResultMetadata, ValidationResult};
use crate::rules::FiredRule;

pub const SVRL_NAMESPACE: &str = "http://purl.oclc.org/dsdl/svrl";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const TITLE: &str = "DDEX ERN Validation Report";
const ROOT_CLOSE: &str = "</svrl:schematron-output>";

/// Header fields shown in the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvrlMetadata {
    pub version: Option<String>,
    pub profile: Option<String>,
    pub message_id: Option<String>,
}

impl From<&ResultMetadata> for SvrlMetadata {
    fn from(metadata: &ResultMetadata) -> Self {
        SvrlMetadata {
            version: Some(metadata.version.clone()),
            profile: metadata.profile.clone(),
            message_id: metadata.message_id.clone(),
        }
    }
}

/// Renders a validation result, stamped with the current time.
pub fn render(result: &ValidationResult, metadata: &SvrlMetadata) -> String {
    render_at(result, metadata, Utc::now())
}

pub fn render_at(
    result: &ValidationResult,
    metadata: &SvrlMetadata,
    generated: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><svrl:schematron-output xmlns:svrl=\"{}\" xmlns:xsi=\"{}\" title=\"{}\" phase=\"#ALL\" schemaVersion=\"{}\">\n",
        SVRL_NAMESPACE,
        XSI_NAMESPACE,
        TITLE,
        escape(metadata.version.as_deref().unwrap_or("unknown")),
    ));
    push_metadata(&mut out, metadata, generated);

    let pattern = metadata
        .profile
        .as_deref()
        .map(|p| format!("{}-Profile", p))
        .unwrap_or_else(|| "ERN-Validation".to_string());
    let pattern = escape(&pattern);
    out.push_str(&format!(
        "  <svrl:active-pattern document=\"\" id=\"{}\" name=\"{}\"/>\n",
        pattern, pattern
    ));

    for (kind, finding) in assertions(result) {
        push_assertion(&mut out, kind, finding);
    }

    let errors = result.errors.len();
    let warnings = result.warnings.len();
    out.push_str("  <!-- Validation Summary -->\n");
    out.push_str("  <svrl:text>====== VALIDATION SUMMARY ======</svrl:text>\n");
    out.push_str(&format!(
        "  <svrl:text>Status: {}</svrl:text>\n",
        if result.valid { "VALID" } else { "INVALID" }
    ));
    out.push_str(&format!("  <svrl:text>Errors: {}</svrl:text>\n", errors));
    out.push_str(&format!("  <svrl:text>Warnings: {}</svrl:text>\n", warnings));
    out.push_str(&format!(
        "  <svrl:text>Total Issues: {}</svrl:text>\n",
        errors + warnings
    ));
    out.push_str(ROOT_CLOSE);

    format_xml(&out)
}

/// Renders the rules that passed, for reports on clean documents.
pub fn render_fired_rules(rules: &[FiredRule], metadata: &SvrlMetadata) -> String {
    render_fired_rules_at(rules, metadata, Utc::now())
}

pub fn render_fired_rules_at(
    rules: &[FiredRule],
    metadata: &SvrlMetadata,
    generated: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><svrl:schematron-output xmlns:svrl=\"{}\">\n",
        SVRL_NAMESPACE
    ));
    push_metadata(&mut out, metadata, generated);

    for rule in rules {
        out.push_str(&format!(
            "  <svrl:fired-rule context=\"{}\" id=\"{}\" role=\"{}\">\n",
            escape(rule.context.as_deref().unwrap_or("document")),
            escape(&rule.id),
            rule.severity,
        ));
        let text = if rule.description.is_empty() {
            &rule.id
        } else {
            &rule.description
        };
        out.push_str(&format!("    <svrl:text>{}</svrl:text>\n", escape(text)));
        out.push_str("  </svrl:fired-rule>\n");
    }
    out.push_str(ROOT_CLOSE);

    format_xml(&out)
}

fn push_metadata(out: &mut String, metadata: &SvrlMetadata, generated: DateTime<Utc>) {
    out.push_str("  <!-- Validation Metadata -->\n");
    out.push_str(&format!("  <svrl:text>{}</svrl:text>\n", TITLE));
    out.push_str(&format!(
        "  <svrl:text>Generated: {}</svrl:text>\n",
        generated.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    if let Some(version) = &metadata.version {
        out.push_str(&format!("  <svrl:text>ERN Version: {}</svrl:text>\n", escape(version)));
    }
    if let Some(profile) = &metadata.profile {
        out.push_str(&format!("  <svrl:text>Profile: {}</svrl:text>\n", escape(profile)));
    }
    if let Some(id) = &metadata.message_id {
        out.push_str(&format!("  <svrl:text>Message ID: {}</svrl:text>\n", escape(id)));
    }
}

/// Errors and warnings merged into one list and sorted by line. The sort is stable, so
/// findings on one line keep their aggregation order.
fn assertions(result: &ValidationResult) -> Vec<(&'static str, &Finding)> {
    let mut merged: Vec<(&'static str, &Finding)> = result
        .errors
        .iter()
        .map(|f| ("failed-assert", f))
        .chain(result.warnings.iter().map(|f| ("successful-report", f)))
        .collect();
    merged.sort_by_key(|(_, f)| f.line);
    merged
}

fn push_assertion(out: &mut String, kind: &str, finding: &Finding) {
    let rule = if finding.rule.is_empty() {
        "unknown"
    } else {
        finding.rule.as_str()
    };
    out.push_str(&format!("  <svrl:{} test=\"{}\"", kind, escape(rule)));
    if finding.line != 0 {
        out.push_str(&format!(" location=\"line:{}", finding.line));
        if finding.column != 0 {
            out.push_str(&format!(",column:{}", finding.column));
        }
        out.push('"');
    }
    out.push_str(&format!(" role=\"{}\">\n", role(finding.severity)));

    if let Some(context) = &finding.context {
        out.push_str(&format!(
            "    <svrl:diagnostic-reference diagnostic=\"{}\">\n      {}\n    </svrl:diagnostic-reference>\n",
            diagnostic_id(rule),
            escape(context)
        ));
    }
    out.push_str(&format!("    <svrl:text>{}</svrl:text>\n", escape(&finding.message)));
    if let Some(suggestion) = &finding.suggestion {
        out.push_str(&format!(
            "    <svrl:text>Suggestion: {}</svrl:text>\n",
            escape(suggestion)
        ));
    }
    out.push_str(&format!("  </svrl:{}>\n", kind));
}

fn role(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warn",
        Severity::Info => "info",
    }
}

/// `diag-` plus the rule id with every non-alphanumeric character replaced by `-`, lowercased.
fn diagnostic_id(rule: &str) -> String {
    let slug: String = rule
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("diag-{}", slug)
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_xml(xml: &str) -> String {
    xml.replace("><", ">\n<")
        .replacen(ROOT_CLOSE, &format!("\n{}", ROOT_CLOSE), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Position;
    use crate::orchestrator::{ResultMetadata, ValidationResult};
    use chrono::TimeZone;

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn result(errors: Vec<Finding>, warnings: Vec<Finding>) -> ValidationResult {
        let now = generated();
        ValidationResult {
            valid: errors.is_empty(),
            metadata: ResultMetadata {
                version: "4.3".to_string(),
                processing_time: 1,
                schema_version: "ERN 4.3".to_string(),
                profile: None,
                message_id: None,
                started_at: now,
                validated_at: now,
                error_count: errors.len(),
                warning_count: warnings.len(),
                validation_steps: Vec::new(),
            },
            errors,
            warnings,
            svrl: None,
            fired_rules: Vec::new(),
        }
    }

    fn metadata() -> SvrlMetadata {
        SvrlMetadata {
            version: Some("4.3".to_string()),
            profile: Some("AudioAlbum".to_string()),
            message_id: Some("MSG-1".to_string()),
        }
    }

    #[test]
    fn test_clean_report_layout() {
        let svrl = render_at(&result(Vec::new(), Vec::new()), &SvrlMetadata::default(), generated());
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<svrl:schematron-output xmlns:svrl=\"http://purl.oclc.org/dsdl/svrl\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" title=\"DDEX ERN Validation Report\" phase=\"#ALL\" schemaVersion=\"unknown\">\n",
            "  <!-- Validation Metadata -->\n",
            "  <svrl:text>DDEX ERN Validation Report</svrl:text>\n",
            "  <svrl:text>Generated: 2024-01-15T10:30:00.000Z</svrl:text>\n",
            "  <svrl:active-pattern document=\"\" id=\"ERN-Validation\" name=\"ERN-Validation\"/>\n",
            "  <!-- Validation Summary -->\n",
            "  <svrl:text>====== VALIDATION SUMMARY ======</svrl:text>\n",
            "  <svrl:text>Status: VALID</svrl:text>\n",
            "  <svrl:text>Errors: 0</svrl:text>\n",
            "  <svrl:text>Warnings: 0</svrl:text>\n",
            "  <svrl:text>Total Issues: 0</svrl:text>\n",
            "\n",
            "</svrl:schematron-output>",
        );
        assert_eq!(svrl, expected);
    }

    #[test]
    fn test_failed_assert_with_context_and_suggestion() {
        let error = Finding::new(
            "Schematron-AudioAlbum-MinTracks",
            Severity::Error,
            "Album must have at least 2 tracks & a title",
            Position { line: 12, column: 5 },
        )
        .with_context("Profile: AudioAlbum")
        .with_suggestion(Some("Add a second <SoundRecording>"));
        let svrl = render_at(&result(vec![error], Vec::new()), &metadata(), generated());

        assert!(svrl.contains(
            "  <svrl:failed-assert test=\"Schematron-AudioAlbum-MinTracks\" location=\"line:12,column:5\" role=\"error\">\n"
        ));
        assert!(svrl.contains(
            "    <svrl:diagnostic-reference diagnostic=\"diag-schematron-audioalbum-mintracks\">\n      Profile: AudioAlbum\n    </svrl:diagnostic-reference>\n"
        ));
        assert!(svrl.contains("<svrl:text>Album must have at least 2 tracks &amp; a title</svrl:text>"));
        assert!(svrl.contains("<svrl:text>Suggestion: Add a second &lt;SoundRecording&gt;</svrl:text>"));
        assert!(svrl.contains("id=\"AudioAlbum-Profile\""));
        assert!(svrl.contains("<svrl:text>Message ID: MSG-1</svrl:text>"));
        assert!(svrl.contains("<svrl:text>Status: INVALID</svrl:text>"));
    }

    #[test]
    fn test_location_omits_zero_parts() {
        let at_line = Finding::new("A", Severity::Warning, "w", Position { line: 4, column: 0 });
        let nowhere = Finding::new("B", Severity::Info, "i", Position::default());
        let svrl = render_at(&result(Vec::new(), vec![at_line, nowhere]), &metadata(), generated());

        assert!(svrl.contains("<svrl:successful-report test=\"B\" role=\"info\">"));
        assert!(svrl.contains("<svrl:successful-report test=\"A\" location=\"line:4\" role=\"warn\">"));
        // line 0 sorts first
        assert!(svrl.find("test=\"B\"").unwrap() < svrl.find("test=\"A\"").unwrap());
    }

    #[test]
    fn test_warnings_and_errors_interleave_by_line() {
        let late_error = Finding::new("E9", Severity::Error, "e", Position { line: 9, column: 3 });
        let early_warning = Finding::new("W2", Severity::Warning, "w", Position { line: 2, column: 1 });
        let same_line_warning = Finding::new("W9", Severity::Warning, "w", Position { line: 9, column: 1 });
        let svrl = render_at(
            &result(vec![late_error], vec![early_warning, same_line_warning]),
            &metadata(),
            generated(),
        );

        let at = |rule: &str| svrl.find(&format!("test=\"{}\"", rule)).unwrap();
        assert!(at("W2") < at("E9"));
        // same line keeps aggregation order: errors before warnings
        assert!(at("E9") < at("W9"));
        assert!(svrl.contains("<svrl:successful-report test=\"W2\" location=\"line:2,column:1\" role=\"warn\">"));
    }

    #[test]
    fn test_counts_match_findings() {
        let errors = vec![Finding::error("E1", "one"), Finding::error("E2", "two")];
        let warnings = vec![Finding::new("W1", Severity::Warning, "w", Position::default())];
        let svrl = render_at(&result(errors, warnings), &metadata(), generated());

        assert_eq!(svrl.matches("<svrl:failed-assert ").count(), 2);
        assert_eq!(svrl.matches("<svrl:successful-report ").count(), 1);
        assert!(svrl.contains("<svrl:text>Errors: 2</svrl:text>"));
        assert!(svrl.contains("<svrl:text>Warnings: 1</svrl:text>"));
        assert!(svrl.contains("<svrl:text>Total Issues: 3</svrl:text>"));
        assert!(roxmltree::Document::parse(&svrl).is_ok());
    }

    #[test]
    fn test_fired_rules_report() {
        let rules = vec![
            FiredRule {
                id: "ERN43-PartyList-Required".to_string(),
                context: None,
                severity: Severity::Error,
                description: "PartyList is required in ERN 4.3".to_string(),
            },
            FiredRule {
                id: "Schematron-ReleaseList-Required".to_string(),
                context: Some("Profile: AudioAlbum".to_string()),
                severity: Severity::Warning,
                description: String::new(),
            },
        ];
        let svrl = render_fired_rules_at(&rules, &metadata(), generated());

        assert!(svrl.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svrl:schematron-output xmlns:svrl=\"http://purl.oclc.org/dsdl/svrl\">\n"
        ));
        assert!(svrl.contains(
            "  <svrl:fired-rule context=\"document\" id=\"ERN43-PartyList-Required\" role=\"error\">\n    <svrl:text>PartyList is required in ERN 4.3</svrl:text>\n  </svrl:fired-rule>\n"
        ));
        assert!(svrl.contains("<svrl:text>Schematron-ReleaseList-Required</svrl:text>"));
        assert!(svrl.ends_with("\n</svrl:schematron-output>"));
        assert!(roxmltree::Document::parse(&svrl).is_ok());
    }

    #[test]
    fn test_escape_covers_xml_specials() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }
}
