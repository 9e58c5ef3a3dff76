//! ERN 4.3 rule set.

use super::common::{self, rule_id};
use super::vocab;
use super::{Category, Rule, Verdict};
use crate::finding::Severity;
use crate::version::ErnVersion;

const VERSION: ErnVersion = ErnVersion::V43;

pub fn rules() -> Vec<Rule> {
    vec![
        common::required_child(VERSION, "MessageHeader", "MessageHeader is required in ERN 4.3"),
        common::required_child(
            VERSION,
            "PartyList",
            "PartyList is required in ERN 4.3 (contains all party information)",
        )
        .suggest("Add PartyList element after MessageHeader/ReleaseAdmin elements"),
        common::required_child(VERSION, "ResourceList", "ResourceList is required in ERN 4.3"),
        common::required_child(VERSION, "ReleaseList", "ReleaseList is required in ERN 4.3"),
        Rule::new(
            rule_id(VERSION, "DealList-Recommended"),
            Category::Structural,
            Severity::Warning,
            "DealList is recommended but not required in ERN 4.3",
            |ctx| Verdict::require(ctx.root().has("DealList")),
        )
        .suggest("Consider adding DealList with commercial terms"),
        Rule::new(
            rule_id(VERSION, "Required-Attributes"),
            Category::Structural,
            Severity::Error,
            "NewReleaseMessage must have AvsVersionId and LanguageAndScriptCode attributes",
            |ctx| {
                let root = ctx.root();
                Verdict::all([root], |r| {
                    r.attribute("AvsVersionId").is_some()
                        && r.attribute("LanguageAndScriptCode").is_some()
                })
            },
        )
        .suggest("Add AvsVersionId=\"2024\" LanguageAndScriptCode=\"en\" to NewReleaseMessage"),
        common::release_reference_pattern(
            VERSION,
            Severity::Error,
            "ReleaseReference must start with \"R\" and contain only alphanumeric, dash, underscore",
        ),
        common::resource_reference_pattern(VERSION),
        common::party_reference_pattern(VERSION),
        common::party_reference_integrity(VERSION),
        common::resource_group_reference_integrity(VERSION),
        common::isrc_format(VERSION),
        common::main_release_id(VERSION),
        Rule::new(
            rule_id(VERSION, "Release-DisplayTitle"),
            Category::DisplayMetadata,
            Severity::Error,
            "Each Release must have both DisplayTitleText and DisplayTitle elements",
            |ctx| {
                Verdict::all(ctx.main_releases(), |release| {
                    release.has("DisplayTitleText") && release.has("DisplayTitle")
                })
            },
        )
        .suggest("DisplayTitleText contains the full title string, DisplayTitle contains structured title parts"),
        Rule::new(
            rule_id(VERSION, "Release-DisplayArtist"),
            Category::DisplayMetadata,
            Severity::Error,
            "Each Release must have both DisplayArtistName and DisplayArtist elements",
            |ctx| {
                Verdict::all(ctx.main_releases(), |release| {
                    release.has("DisplayArtistName") && release.has("DisplayArtist")
                })
            },
        ),
        common::display_artist_structure(VERSION),
        common::display_artist_role_valid(VERSION),
        common::contributor_role_valid(VERSION),
        common::deal_terms_territory(VERSION),
        common::deal_terms_validity_period(
            VERSION,
            "Use StartDateTime for precise timing, StartDate is deprecated",
        ),
        common::use_type_valid(
            VERSION,
            "UseType-Valid",
            vocab::USE_TYPES_4X,
            "UseType must be a valid ERN 4.3 use type",
        ),
        common::use_type_deprecated(VERSION),
        common::use_type_parent_child_conflict(VERSION),
        common::commercial_model_type(
            VERSION,
            "CommercialModelType-Valid",
            Severity::Error,
            vocab::COMMERCIAL_MODELS_4X,
            "CommercialModelType must be a valid ERN 4.3 commercial model",
        ),
        common::deal_start_after_release_date(VERSION),
        common::territory_code_valid(
            VERSION,
            vocab::TERRITORY_CODES_43,
            "Invalid territory code. Must be ISO 3166-1 code or \"Worldwide\"",
        ),
        common::resource_group_required(VERSION),
        common::resource_group_content_items(VERSION),
        common::sequence_number_order(VERSION, Severity::Error),
        common::main_release_unique(VERSION),
        common::explicit_content_propagation(VERSION),
        common::track_count_reconcile(VERSION),
        common::release_type_valid(VERSION, vocab::RELEASE_TYPES_4X),
        common::release_profile_mapping(VERSION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;
    use crate::finding::Finding;
    use crate::rules::{RuleContext, RuleSet};

    const VALID: &str = r#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" AvsVersionId="2024" LanguageAndScriptCode="en">
  <MessageHeader>
    <MessageId>MSG-1</MessageId>
    <MessageSender><PartyId>PADPIDA0000000001</PartyId></MessageSender>
    <MessageRecipient><PartyId>PADPIDA0000000002</PartyId></MessageRecipient>
    <MessageCreatedDateTime>2024-01-15T10:30:00</MessageCreatedDateTime>
  </MessageHeader>
  <PartyList>
    <Party><PartyReference>PArtist</PartyReference><PartyName><FullName>Artist</FullName></PartyName></Party>
    <Party><PartyReference>PSender</PartyReference><PartyId><DPID>PADPIDA0000000001</DPID></PartyId></Party>
    <Party><PartyReference>PRecipient</PartyReference><PartyId><DPID>PADPIDA0000000002</DPID></PartyId></Party>
  </PartyList>
  <ResourceList>
    <SoundRecording>
      <ResourceReference>A1</ResourceReference>
      <Type>MusicalWorkSoundRecording</Type>
      <SoundRecordingEdition><ResourceId><ISRC>USRC17607839</ISRC></ResourceId></SoundRecordingEdition>
    </SoundRecording>
  </ResourceList>
  <ReleaseList>
    <Release>
      <ReleaseReference>R0</ReleaseReference>
      <ReleaseType>Single</ReleaseType>
      <ReleaseId><ICPN>0123456789012</ICPN></ReleaseId>
      <DisplayTitleText>Song</DisplayTitleText>
      <DisplayTitle><TitleText>Song</TitleText></DisplayTitle>
      <DisplayArtistName>Artist</DisplayArtistName>
      <DisplayArtist>
        <ArtistPartyReference>PArtist</ArtistPartyReference>
        <DisplayArtistRole>MainArtist</DisplayArtistRole>
      </DisplayArtist>
      <ResourceGroup>
        <ResourceGroupContentItem>
          <SequenceNumber>1</SequenceNumber>
          <ReleaseResourceReference>A1</ReleaseResourceReference>
        </ResourceGroupContentItem>
      </ResourceGroup>
    </Release>
  </ReleaseList>
  <DealList>
    <ReleaseDeal>
      <DealReleaseReference>R0</DealReleaseReference>
      <Deal>
        <DealTerms>
          <TerritoryCode>Worldwide</TerritoryCode>
          <ValidityPeriod><StartDate>2024-01-01</StartDate></ValidityPeriod>
          <CommercialModelType>SubscriptionModel</CommercialModelType>
          <UseType>OnDemandStream</UseType>
        </DealTerms>
      </Deal>
    </ReleaseDeal>
  </DealList>
</ern:NewReleaseMessage>"#;

    fn run(xml: &str) -> Vec<Finding> {
        let doc = parse(xml.as_bytes()).unwrap();
        let ctx = RuleContext::new(&doc, VERSION);
        RuleSet::new(rules()).evaluate(&ctx).findings
    }

    fn rule_ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule.as_str()).collect()
    }

    #[test]
    fn test_valid_message_has_no_findings() {
        let findings = run(VALID);
        assert!(findings.is_empty(), "unexpected findings: {:?}", rule_ids(&findings));
    }

    #[test]
    fn test_minimal_message_without_party_list() {
        let findings = run(
            r#"<NewReleaseMessage AvsVersionId="2024" LanguageAndScriptCode="en">
  <MessageHeader><MessageId>1</MessageId></MessageHeader>
  <ResourceList/>
  <ReleaseList/>
  <DealList/>
</NewReleaseMessage>"#,
        );
        assert_eq!(rule_ids(&findings), vec!["ERN43-PartyList-Required"]);
        assert_eq!((findings[0].line, findings[0].column), (0, 0));
        assert!(findings[0].suggestion.is_some());
    }

    #[test]
    fn test_bad_release_reference_is_positioned() {
        let xml = VALID
            .replace("<ReleaseReference>R0</ReleaseReference>", "<ReleaseReference>X1</ReleaseReference>")
            .replace("<DealReleaseReference>R0", "<DealReleaseReference>X1");
        let findings = run(&xml);
        assert_eq!(rule_ids(&findings), vec!["ERN43-ReleaseReference-Pattern"]);
        assert_eq!(findings[0].line, 21);
    }

    #[test]
    fn test_territory_and_excluded_territory_together() {
        let xml = VALID.replace(
            "<TerritoryCode>Worldwide</TerritoryCode>",
            "<TerritoryCode>US</TerritoryCode><ExcludedTerritoryCode>CA</ExcludedTerritoryCode>",
        );
        let findings = run(&xml);
        let errors: Vec<&str> = findings
            .iter()
            .filter(|f| f.is_error())
            .map(|f| f.rule.as_str())
            .collect();
        assert_eq!(errors, vec!["ERN43-DealTerms-Territory"]);
    }

    #[test]
    fn test_stream_with_on_demand_stream_conflicts() {
        let xml = VALID.replace(
            "<UseType>OnDemandStream</UseType>",
            "<UseType>Stream</UseType><UseType>OnDemandStream</UseType>",
        );
        let findings = run(&xml);
        let errors: Vec<&str> = findings
            .iter()
            .filter(|f| f.is_error())
            .map(|f| f.rule.as_str())
            .collect();
        assert_eq!(errors, vec!["ERN43-UseType-ParentChild-Conflict"]);
        assert!(findings.iter().any(|f| f.rule == "ERN43-UseType-Deprecated"
            && f.severity == Severity::Warning));
    }

    #[test]
    fn test_unknown_party_reference() {
        let xml = VALID.replace(
            "<ArtistPartyReference>PArtist</ArtistPartyReference>",
            "<ArtistPartyReference>PGhost</ArtistPartyReference>",
        );
        assert_eq!(rule_ids(&run(&xml)), vec!["ERN43-PartyReference-Integrity"]);
    }

    #[test]
    fn test_dangling_resource_group_reference() {
        let xml = VALID.replace(
            "<ReleaseResourceReference>A1</ReleaseResourceReference>",
            "<ReleaseResourceReference>A9</ReleaseResourceReference>",
        );
        assert_eq!(
            rule_ids(&run(&xml)),
            vec!["ERN43-ResourceGroup-ReferenceIntegrity"]
        );
    }

    #[test]
    fn test_deal_starting_before_release_date() {
        let xml = VALID.replace(
            "<ReleaseType>Single</ReleaseType>",
            "<ReleaseType>Single</ReleaseType><ReleaseDate>2024-06-01</ReleaseDate>",
        );
        assert_eq!(
            rule_ids(&run(&xml)),
            vec!["ERN43-Deal-StartDate-After-ReleaseDate"]
        );
    }

    #[test]
    fn test_sequence_numbers_must_increase() {
        let xml = VALID.replace(
            "</ResourceGroupContentItem>\n      </ResourceGroup>",
            "</ResourceGroupContentItem>\n<ResourceGroupContentItem><SequenceNumber>1</SequenceNumber><ReleaseResourceReference>A1</ReleaseResourceReference></ResourceGroupContentItem></ResourceGroup>",
        );
        assert_eq!(rule_ids(&run(&xml)), vec!["ERN43-SequenceNumber-Order"]);
    }

    #[test]
    fn test_profile_mapping_warns_on_unexpected_type() {
        let xml = VALID.replace(
            "LanguageAndScriptCode=\"en\">",
            "LanguageAndScriptCode=\"en\" ReleaseProfileVersionId=\"Video\">",
        );
        let findings = run(&xml);
        assert_eq!(rule_ids(&findings), vec!["ERN43-ReleaseProfile-Mapping"]);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_explicit_resource_requires_explicit_release() {
        let xml = VALID.replace(
            "<Type>MusicalWorkSoundRecording</Type>",
            "<Type>MusicalWorkSoundRecording</Type><ParentalWarningType>Explicit</ParentalWarningType>",
        );
        let findings = run(&xml);
        assert_eq!(rule_ids(&findings), vec!["ERN43-ExplicitContent-Propagation"]);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_display_title_structure() {
        let xml = VALID.replace("<DisplayTitle><TitleText>Song</TitleText></DisplayTitle>", "");
        assert_eq!(rule_ids(&run(&xml)), vec!["ERN43-Release-DisplayTitle"]);
    }
}
