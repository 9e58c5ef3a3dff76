//! ERN 4.2 rule set.
//!
//! Close to 4.3, with looser display rules (either form is accepted, main releases only),
//! explicit MessageHeader content checks and the wider 4.2 territory vocabulary.

use super::common::{self, rule_id};
use super::vocab;
use super::{Category, Rule, Verdict};
use crate::finding::Severity;
use crate::version::ErnVersion;

const VERSION: ErnVersion = ErnVersion::V42;

pub fn rules() -> Vec<Rule> {
    let mut rules = vec![
        common::required_child(VERSION, "MessageHeader", "MessageHeader is required in ERN 4.2"),
        common::required_child(VERSION, "PartyList", "PartyList is required in ERN 4.2")
            .suggest("Add PartyList element after MessageHeader/ReleaseAdmin elements"),
        common::required_child(VERSION, "ResourceList", "ResourceList is required in ERN 4.2"),
        common::required_child(VERSION, "ReleaseList", "ReleaseList is required in ERN 4.2"),
        Rule::new(
            rule_id(VERSION, "DealList-Recommended"),
            Category::Structural,
            Severity::Warning,
            "DealList is recommended but not required in ERN 4.2",
            |ctx| Verdict::require(ctx.root().has("DealList")),
        )
        .suggest("Consider adding DealList with commercial terms"),
        Rule::new(
            rule_id(VERSION, "Required-Attributes"),
            Category::Structural,
            Severity::Error,
            "NewReleaseMessage must have LanguageAndScriptCode attribute",
            |ctx| {
                Verdict::all([ctx.root()], |root| {
                    root.attribute("LanguageAndScriptCode").is_some()
                })
            },
        )
        .suggest("Add LanguageAndScriptCode=\"en\" to NewReleaseMessage"),
        Rule::new(
            rule_id(VERSION, "ReleaseProfile-Recommended"),
            Category::BestPractice,
            Severity::Info,
            "ReleaseProfileVersionId attribute is recommended for profile validation",
            |ctx| {
                Verdict::all([ctx.root()], |root| {
                    root.attribute("ReleaseProfileVersionId").is_some()
                })
            },
        )
        .suggest("Add ReleaseProfileVersionId to specify the release profile"),
    ];

    rules.extend(common::message_header_rules(VERSION));

    rules.extend([
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
            "Each Release must have DisplayTitleText and/or DisplayTitle elements",
            |ctx| {
                Verdict::all(ctx.flagged_main_releases(), |release| {
                    release.has("DisplayTitleText") || release.has("DisplayTitle")
                })
            },
        )
        .suggest("Add either DisplayTitleText (simple string) or DisplayTitle (structured) or both"),
        Rule::new(
            rule_id(VERSION, "Release-DisplayArtist"),
            Category::DisplayMetadata,
            Severity::Error,
            "Each Release must have DisplayArtistName and/or DisplayArtist elements",
            |ctx| {
                Verdict::all(ctx.flagged_main_releases(), |release| {
                    release.has("DisplayArtistName") || release.has("DisplayArtist")
                })
            },
        ),
        common::display_artist_structure(VERSION),
        common::display_artist_role_valid(VERSION),
        common::contributor_role_valid(VERSION),
        common::deal_terms_territory(VERSION),
        common::deal_terms_validity_period(
            VERSION,
            "Use StartDateTime for precise timing (StartDate is deprecated)",
        ),
        common::use_type_valid(
            VERSION,
            "UseType-Valid",
            vocab::USE_TYPES_4X,
            "UseType must be a valid ERN 4.2 use type",
        ),
        common::use_type_deprecated(VERSION),
        common::use_type_parent_child_conflict(VERSION),
        common::commercial_model_type(
            VERSION,
            "CommercialModelType-Valid",
            Severity::Error,
            vocab::COMMERCIAL_MODELS_4X,
            "CommercialModelType must be a valid ERN 4.2 commercial model",
        ),
        common::deal_start_after_release_date(VERSION),
        common::territory_code_valid(
            VERSION,
            vocab::TERRITORY_CODES_42,
            "Invalid territory code. Must be ISO 3166-1, TIS numeric code, or \"Worldwide\"",
        ),
        common::resource_group_required(VERSION),
        common::resource_group_content_items(VERSION),
        common::sequence_number_order(VERSION, Severity::Error),
        common::main_release_unique(VERSION),
        common::explicit_content_propagation(VERSION),
        common::track_count_reconcile(VERSION),
        common::release_type_valid(VERSION, vocab::RELEASE_TYPES_4X),
        common::release_profile_mapping(VERSION),
    ]);
    rules
}
