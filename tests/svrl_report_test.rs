mod common;

use common::{MINIMAL_43, VALID_43, orchestrator, schema_root};
use ern_validate::output::Output;
use ern_validate::svrl::{self, SvrlMetadata};
use ern_validate::ValidationRequest;

fn summary_count(svrl: &str, label: &str) -> usize {
    let prefix = format!("<svrl:text>{}: ", label);
    let start = svrl.find(&prefix).unwrap() + prefix.len();
    let end = start + svrl[start..].find('<').unwrap();
    svrl[start..end].parse().unwrap()
}

#[tokio::test]
async fn test_summary_counts_match_result() {
    let schemas = schema_root();
    let orchestrator = orchestrator(schemas.path(), true);
    let inputs = [
        (MINIMAL_43.to_string(), Some("AudioAlbum")),
        (VALID_43.to_string(), None),
        (VALID_43.replace("<UseType>OnDemandStream</UseType>", "<UseType>Stream</UseType>"), Some("AudioSingle")),
        (String::new(), None),
    ];

    for (xml, profile) in inputs {
        let request = ValidationRequest::new(xml, "4.3")
            .with_profile(profile)
            .with_svrl(true);
        let result = orchestrator.validate(&request).await;
        let report = result.svrl.as_deref().unwrap();

        assert_eq!(summary_count(report, "Errors"), result.errors.len());
        assert_eq!(summary_count(report, "Warnings"), result.warnings.len());
        assert_eq!(
            summary_count(report, "Total Issues"),
            result.errors.len() + result.warnings.len()
        );
        assert_eq!(report.matches("<svrl:failed-assert ").count(), result.errors.len());
        assert_eq!(report.matches("<svrl:successful-report ").count(), result.warnings.len());
        let document = roxmltree::Document::parse(report).unwrap();
        assert_eq!(document.root_element().tag_name().name(), "schematron-output");
        assert_eq!(document.root_element().tag_name().namespace(), Some(svrl::SVRL_NAMESPACE));
    }
}

#[tokio::test]
async fn test_report_header_reflects_request() {
    let schemas = schema_root();
    let orchestrator = orchestrator(schemas.path(), false);
    let request = ValidationRequest::new(MINIMAL_43, "4.3")
        .with_profile(Some("AudioAlbum"))
        .with_svrl(true);

    let result = orchestrator.validate(&request).await;
    let report = result.svrl.unwrap();

    assert!(report.contains("schemaVersion=\"4.3\""));
    assert!(report.contains("<svrl:text>ERN Version: 4.3</svrl:text>"));
    assert!(report.contains("<svrl:text>Profile: AudioAlbum</svrl:text>"));
    assert!(report.contains("<svrl:text>Message ID: 1</svrl:text>"));
    assert!(report.contains("<svrl:active-pattern document=\"\" id=\"AudioAlbum-Profile\" name=\"AudioAlbum-Profile\"/>"));
    assert!(report.contains("<svrl:text>Status: INVALID</svrl:text>"));
    assert!(report.contains("diagnostic=\"diag-schematron-"));
}

#[tokio::test]
async fn test_clean_document_reports_fired_rules() {
    let schemas = schema_root();
    let orchestrator = orchestrator(schemas.path(), true);

    let result = orchestrator.validate(&ValidationRequest::new(VALID_43, "4.3")).await;
    assert!(result.errors.is_empty() && result.warnings.is_empty());
    assert!(!result.fired_rules.is_empty());

    let report = Output::format_svrl(&result);
    assert_eq!(report.matches("<svrl:fired-rule ").count(), result.fired_rules.len());
    assert!(report.contains("id=\"ERN43-PartyList-Required\""));
    assert!(report.contains("context=\"document\""));

    let direct = svrl::render_fired_rules(&result.fired_rules, &SvrlMetadata::from(&result.metadata));
    assert_eq!(
        direct.lines().filter(|l| !l.contains("Generated:")).collect::<Vec<_>>(),
        report.lines().filter(|l| !l.contains("Generated:")).collect::<Vec<_>>()
    );
}
