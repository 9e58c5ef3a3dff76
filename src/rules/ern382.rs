//! ERN 3.8.2 rule set.
//!
//! 3.8.2 carries titles, artists and resource groups inside `ReleaseDetailsByTerritory`
//! and has no `PartyList`, so several checks differ in shape from the 4.x sets.

use super::common::{self, resource_reference_regex, rule_id};
use super::context::is_flagged_main;
use super::vocab;
use super::{Category, Rule, Verdict};
use crate::document::Element;
use crate::finding::Severity;
use crate::version::ErnVersion;

const VERSION: ErnVersion = ErnVersion::V382;

const UPDATE_INDICATORS: &[&str] = &["OriginalMessage", "UpdateMessage"];

/// Exactly one of `TerritoryCode` and `ExcludedTerritoryCode`.
fn single_territory_form(details: &Element) -> bool {
    details.has("TerritoryCode") != details.has("ExcludedTerritoryCode")
}

/// Territory details element of a resource, e.g. `SoundRecordingDetailsByTerritory`.
fn resource_details<'a>(kind: &str, resource: &'a Element) -> Option<&'a [Element]> {
    match kind {
        "SoundRecording" | "Video" | "Image" | "Text" => {
            Some(resource.children(&format!("{}DetailsByTerritory", kind)))
        }
        _ => None,
    }
}

fn is_valid_group(group: &Element) -> bool {
    let items = group.children("ResourceGroupContentItem");
    if items.is_empty() && !group.has("ResourceGroup") {
        return false;
    }
    items.iter().all(|item| {
        item.value_of("ReleaseResourceReference")
            .is_some_and(|r| resource_reference_regex().is_match(r))
    }) && group.children("ResourceGroup").iter().all(is_valid_group)
}

pub fn rules() -> Vec<Rule> {
    let mut rules = vec![
        common::required_child(VERSION, "MessageHeader", "MessageHeader is required in ERN 3.8.2"),
        common::required_child(VERSION, "ResourceList", "ResourceList is required in ERN 3.8.2"),
        common::required_child(VERSION, "ReleaseList", "ReleaseList is required in ERN 3.8.2"),
        Rule::new(
            rule_id(VERSION, "UpdateIndicator"),
            Category::Structural,
            Severity::Warning,
            "UpdateIndicator is recommended but not required in ERN 3.8.2",
            |ctx| Verdict::require(ctx.root().has("UpdateIndicator")),
        ),
        Rule::new(
            rule_id(VERSION, "UpdateIndicator-Deprecated"),
            Category::Structural,
            Severity::Warning,
            "UpdateIndicator should be \"OriginalMessage\" or \"UpdateMessage\" (deprecated element)",
            |ctx| match ctx.root().child("UpdateIndicator") {
                None => Verdict::Pass,
                Some(indicator) => Verdict::all([indicator], |i| {
                    i.text().is_some_and(|v| UPDATE_INDICATORS.contains(&v))
                }),
            },
        )
        .suggest("UpdateIndicator is deprecated and may be removed in future versions"),
        Rule::new(
            rule_id(VERSION, "DealList-Optional"),
            Category::Structural,
            Severity::Info,
            "DealList is optional in ERN 3.8.2",
            |_| Verdict::Pass,
        ),
        Rule::new(
            rule_id(VERSION, "Required-Attributes"),
            Category::Structural,
            Severity::Error,
            "NewReleaseMessage must have MessageSchemaVersionId attribute",
            |ctx| {
                Verdict::all([ctx.root()], |root| {
                    root.attribute("MessageSchemaVersionId").is_some()
                })
            },
        )
        .suggest("Add MessageSchemaVersionId=\"ern/382\" to NewReleaseMessage"),
        Rule::new(
            rule_id(VERSION, "No-PartyList"),
            Category::Structural,
            Severity::Error,
            "PartyList should not be present in ERN 3.8.2 (introduced in ERN 4.x)",
            |ctx| match ctx.root().child("PartyList") {
                Some(list) => Verdict::fail_at(list),
                None => Verdict::Pass,
            },
        ),
    ];

    rules.extend(common::message_header_rules(VERSION));

    rules.extend([
        Rule::new(
            rule_id(VERSION, "ReleaseDetailsByTerritory-Required"),
            Category::Territory,
            Severity::Error,
            "Each Release must have at least one ReleaseDetailsByTerritory in ERN 3.8.2",
            |ctx| {
                Verdict::all(ctx.main_releases(), |release| {
                    release.has("ReleaseDetailsByTerritory")
                })
            },
        ),
        Rule::new(
            rule_id(VERSION, "Territory-Specification"),
            Category::Territory,
            Severity::Error,
            "ReleaseDetailsByTerritory must have either TerritoryCode OR ExcludedTerritoryCode (not both)",
            |ctx| {
                let details = ctx
                    .main_releases()
                    .flat_map(|release| release.children("ReleaseDetailsByTerritory"));
                Verdict::all(details, single_territory_form)
            },
        ),
        Rule::new(
            rule_id(VERSION, "DisplayArtistName-In-Territory"),
            Category::Territory,
            Severity::Warning,
            "At least one ReleaseDetailsByTerritory should include DisplayArtistName",
            |ctx| {
                let with_details = ctx
                    .main_releases()
                    .filter(|release| release.has("ReleaseDetailsByTerritory"));
                Verdict::all(with_details, |release| {
                    release
                        .children("ReleaseDetailsByTerritory")
                        .iter()
                        .any(|d| d.has("DisplayArtistName"))
                })
            },
        )
        .suggest("Add DisplayArtistName within ReleaseDetailsByTerritory elements"),
        Rule::new(
            rule_id(VERSION, "Title-In-Territory"),
            Category::Territory,
            Severity::Warning,
            "At least one ReleaseDetailsByTerritory should include Title",
            |ctx| {
                let with_details = ctx
                    .main_releases()
                    .filter(|release| release.has("ReleaseDetailsByTerritory"));
                Verdict::all(with_details, |release| {
                    release
                        .children("ReleaseDetailsByTerritory")
                        .iter()
                        .any(|d| d.has("Title"))
                })
            },
        ),
        Rule::new(
            rule_id(VERSION, "Resource-TerritoryDetails"),
            Category::Territory,
            Severity::Warning,
            "Each Resource should have its corresponding DetailsByTerritory element in ERN 3.8.2",
            |ctx| {
                let missing = ctx.resources().iter().find(|r| {
                    resource_details(r.kind, r.element).is_some_and(<[Element]>::is_empty)
                });
                missing.map_or(Verdict::Pass, |r| Verdict::fail_at(r.element))
            },
        ),
        Rule::new(
            rule_id(VERSION, "Resource-Territory-Specification"),
            Category::Territory,
            Severity::Error,
            "Resource DetailsByTerritory must have either TerritoryCode OR ExcludedTerritoryCode (not both)",
            |ctx| {
                let details = ctx
                    .resources()
                    .iter()
                    .filter_map(|r| resource_details(r.kind, r.element))
                    .flatten();
                Verdict::all(details, single_territory_form)
            },
        ),
        common::release_reference_pattern(
            VERSION,
            Severity::Warning,
            "ReleaseReference should start with \"R\" and contain only alphanumeric, dash, underscore",
        ),
        common::resource_reference_pattern(VERSION),
        common::isrc_format(VERSION),
        Rule::new(
            rule_id(VERSION, "ProprietaryId"),
            Category::IdentifierFormat,
            Severity::Warning,
            "ProprietaryId must have a value when present",
            |ctx| {
                let ids = ctx
                    .resources()
                    .iter()
                    .flat_map(|r| r.element.descendants("ProprietaryId"));
                Verdict::all(ids, |id| id.text().is_some())
            },
        ),
        Rule::new(
            rule_id(VERSION, "Deal-Structure"),
            Category::DealTerms,
            Severity::Error,
            "Each ReleaseDeal must have DealReleaseReference and Deal with DealTerms or DealReference",
            |ctx| {
                Verdict::all(ctx.release_deals(), |release_deal| {
                    let deals = release_deal.children("Deal");
                    release_deal.has("DealReleaseReference")
                        && !deals.is_empty()
                        && deals
                            .iter()
                            .all(|deal| deal.has("DealTerms") || deal.has("DealReference"))
                })
            },
        ),
        common::deal_terms_territory(VERSION),
        common::territory_code_valid(
            VERSION,
            vocab::TERRITORY_CODES_42,
            "Invalid territory code. Must be ISO 3166-1, TIS numeric code, or \"Worldwide\"",
        ),
        common::deal_start_after_release_date(VERSION),
        common::use_type_valid(
            VERSION,
            "UseType",
            vocab::USE_TYPES_382,
            "UseType must be a valid ERN 3.8.2 use type",
        ),
        common::use_type_deprecated(VERSION),
        common::use_type_parent_child_conflict(VERSION),
        common::commercial_model_type(
            VERSION,
            "CommercialModelType",
            Severity::Warning,
            vocab::COMMERCIAL_MODELS_382,
            "CommercialModelType must be a valid ERN 3.8.2 commercial model",
        ),
        Rule::new(
            rule_id(VERSION, "ResourceGroup-Structure"),
            Category::ResourceGrouping,
            Severity::Error,
            "ResourceGroup must contain ResourceGroupContentItem with valid ReleaseResourceReference",
            |ctx| {
                let groups = ctx
                    .main_releases()
                    .flat_map(|release| release.children("ReleaseDetailsByTerritory"))
                    .flat_map(|details| details.children("ResourceGroup"));
                Verdict::all(groups, is_valid_group)
            },
        ),
        common::sequence_number_order(VERSION, Severity::Warning),
        Rule::new(
            rule_id(VERSION, "Main-Release"),
            Category::Consistency,
            Severity::Warning,
            "There should be exactly one Release with IsMainRelease=\"true\"",
            |ctx| {
                if ctx.main_releases().next().is_none() {
                    return Verdict::Pass;
                }
                let flagged: Vec<&Element> =
                    ctx.main_releases().filter(|r| is_flagged_main(r)).collect();
                match flagged.as_slice() {
                    [_] => Verdict::Pass,
                    [_, second, ..] => Verdict::fail_at(second),
                    [] => ctx
                        .root()
                        .child("ReleaseList")
                        .map_or(Verdict::require(false), Verdict::fail_at),
                }
            },
        ),
        Rule::new(
            rule_id(VERSION, "ReleaseResourceReferenceList"),
            Category::Consistency,
            Severity::Error,
            "Each Release must have ReleaseResourceReferenceList with valid resource references",
            |ctx| {
                Verdict::all(ctx.main_releases(), |release| {
                    let references = release
                        .child("ReleaseResourceReferenceList")
                        .map(|list| list.children("ReleaseResourceReference"))
                        .unwrap_or(&[]);
                    !references.is_empty()
                        && references.iter().all(|r| {
                            r.text()
                                .is_some_and(|v| resource_reference_regex().is_match(v))
                        })
                })
            },
        ),
        common::resource_group_reference_integrity(VERSION),
        common::release_profile_mapping(VERSION),
    ]);
    rules
}
