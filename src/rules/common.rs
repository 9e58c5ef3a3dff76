//! Rule builders shared between version rule sets.
//!
//! Each builder takes the version it is instantiated for, so ids and messages carry the
//! right prefix (`ERN43-…`, `ERN42-…`, `ERN382-…`).

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::context::{date_prefix, release_reference, use_types};
use super::profiles;
use super::vocab::{self, contains};
use super::{Category, Rule, RuleContext, Verdict};
use crate::document::Element;
use crate::finding::Severity;
use crate::version::ErnVersion;

static RELEASE_REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static RESOURCE_REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static PARTY_REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static ISRC_REGEX: OnceLock<Regex> = OnceLock::new();
static DATE_TIME_REGEX: OnceLock<Regex> = OnceLock::new();

pub fn release_reference_regex() -> &'static Regex {
    RELEASE_REFERENCE_REGEX.get_or_init(|| {
        Regex::new(r"^R[\d\-_a-zA-Z]+$").expect("Failed to compile release reference regex")
    })
}

pub fn resource_reference_regex() -> &'static Regex {
    RESOURCE_REFERENCE_REGEX.get_or_init(|| {
        Regex::new(r"^A[\d\-_a-zA-Z]+$").expect("Failed to compile resource reference regex")
    })
}

fn party_reference_regex() -> &'static Regex {
    PARTY_REFERENCE_REGEX.get_or_init(|| {
        Regex::new(r"^P[\d\-_a-zA-Z]+$").expect("Failed to compile party reference regex")
    })
}

fn isrc_regex() -> &'static Regex {
    ISRC_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z]{2}[a-zA-Z0-9]{3}[0-9]{7}$").expect("Failed to compile ISRC regex")
    })
}

fn date_time_regex() -> &'static Regex {
    DATE_TIME_REGEX.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}")
            .expect("Failed to compile date-time regex")
    })
}

pub fn rule_id(version: ErnVersion, name: &str) -> String {
    format!("{}-{}", version.rule_prefix(), name)
}

fn is_resource_reference(value: Option<&str>) -> bool {
    value.is_some_and(|v| resource_reference_regex().is_match(v))
}

fn fail_at_or_document(element: Option<&Element>) -> Verdict {
    element.map_or(Verdict::require(false), Verdict::fail_at)
}

// Structural

/// Fails when the root lacks `child`.
pub fn required_child(
    version: ErnVersion,
    child: &'static str,
    message: impl Into<String>,
) -> Rule {
    Rule::new(
        rule_id(version, &format!("{}-Required", child)),
        Category::Structural,
        Severity::Error,
        message,
        move |ctx| Verdict::require(ctx.root().has(child)),
    )
}

/// MessageHeader content checks shared by 4.2 and 3.8.2.
pub fn message_header_rules(version: ErnVersion) -> Vec<Rule> {
    fn header<'a>(ctx: &RuleContext<'a>) -> Option<&'a Element> {
        ctx.root().child("MessageHeader")
    }

    vec![
        Rule::new(
            rule_id(version, "MessageHeader-MessageId"),
            Category::Structural,
            Severity::Error,
            "MessageHeader must contain MessageId",
            |ctx| match header(ctx) {
                Some(h) if h.has("MessageId") => Verdict::Pass,
                other => fail_at_or_document(other),
            },
        ),
        Rule::new(
            rule_id(version, "MessageHeader-MessageSender"),
            Category::Structural,
            Severity::Error,
            "MessageHeader must contain MessageSender",
            |ctx| match header(ctx) {
                Some(h) if h.has("MessageSender") => Verdict::Pass,
                other => fail_at_or_document(other),
            },
        ),
        Rule::new(
            rule_id(version, "MessageHeader-MessageRecipient"),
            Category::Structural,
            Severity::Error,
            "MessageHeader must contain at least one MessageRecipient",
            |ctx| match header(ctx) {
                Some(h) if h.has("MessageRecipient") => Verdict::Pass,
                other => fail_at_or_document(other),
            },
        ),
        Rule::new(
            rule_id(version, "MessageHeader-MessageCreatedDateTime"),
            Category::Structural,
            Severity::Error,
            "MessageCreatedDateTime must be in ISO 8601 format (YYYY-MM-DDThh:mm:ss)",
            |ctx| {
                let Some(h) = header(ctx) else {
                    return Verdict::require(false);
                };
                match h.value_of("MessageCreatedDateTime") {
                    Some(value) if date_time_regex().is_match(value) => Verdict::Pass,
                    _ => fail_at_or_document(h.child("MessageCreatedDateTime").or(Some(h))),
                }
            },
        ),
        Rule::new(
            rule_id(version, "MessageControlType"),
            Category::Structural,
            Severity::Warning,
            "MessageControlType must be \"TestMessage\" or \"LiveMessage\" when present",
            |ctx| {
                let Some(control) = header(ctx).and_then(|h| h.child("MessageControlType")) else {
                    return Verdict::Pass;
                };
                Verdict::all([control], |c| {
                    c.text()
                        .is_some_and(|v| contains(vocab::MESSAGE_CONTROL_TYPES, v))
                })
            },
        ),
    ]
}

// Reference syntax

pub fn release_reference_pattern(
    version: ErnVersion,
    severity: Severity,
    message: &'static str,
) -> Rule {
    Rule::new(
        rule_id(version, "ReleaseReference-Pattern"),
        Category::ReferenceSyntax,
        severity,
        message,
        |ctx| {
            Verdict::all(ctx.release_elements(), |release| {
                release_reference(release).is_some_and(|r| release_reference_regex().is_match(r))
            })
        },
    )
    .suggest("Use format like \"R0\", \"R1\", \"R-main\", etc.")
}

pub fn resource_reference_pattern(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ResourceReference-Pattern"),
        Category::ReferenceSyntax,
        Severity::Error,
        "ResourceReference must start with \"A\" and contain only alphanumeric, dash, underscore",
        |ctx| {
            Verdict::all(ctx.resources().iter().map(|r| r.element), |resource| {
                is_resource_reference(resource.value_of("ResourceReference"))
            })
        },
    )
    .suggest("Use format like \"A1\", \"A2\", \"A-cover\", etc.")
}

pub fn party_reference_pattern(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "PartyReference-Pattern"),
        Category::ReferenceSyntax,
        Severity::Error,
        "PartyReference values must start with \"P\" and contain only alphanumeric, dash, underscore",
        |ctx| {
            let root = ctx.root();
            let declared = root
                .child("PartyList")
                .map(|list| list.children("Party"))
                .unwrap_or(&[])
                .iter()
                .flat_map(|p| p.children("PartyReference"));
            let referenced = ["ArtistPartyReference", "ContributorPartyReference"]
                .into_iter()
                .flat_map(|name| root.descendants(name));
            Verdict::all(declared.chain(referenced), |e| {
                e.text().is_some_and(|v| party_reference_regex().is_match(v))
            })
        },
    )
}

// Referential integrity

pub fn party_reference_integrity(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "PartyReference-Integrity"),
        Category::ReferentialIntegrity,
        Severity::Error,
        "Every party referenced from MessageHeader, DisplayArtist or Contributor must exist in PartyList",
        |ctx| {
            // a missing PartyList is reported by the required-element rule
            if !ctx.has_party_list() {
                return Verdict::Pass;
            }
            let root = ctx.root();
            let header_ids = root
                .child("MessageHeader")
                .into_iter()
                .flat_map(|h| {
                    h.children("MessageSender")
                        .iter()
                        .chain(h.children("MessageRecipient"))
                })
                .flat_map(|party| party.children("PartyId"));
            let references = ["ArtistPartyReference", "ContributorPartyReference"]
                .into_iter()
                .flat_map(|name| root.descendants(name));
            Verdict::all(header_ids.chain(references), |e| {
                e.text().is_some_and(|id| ctx.has_party(id))
            })
        },
    )
}

pub fn resource_group_reference_integrity(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ResourceGroup-ReferenceIntegrity"),
        Category::ReferentialIntegrity,
        Severity::Error,
        "Every ReleaseResourceReference in a ResourceGroup must refer to a resource in ResourceList",
        |ctx| {
            if !ctx.root().has("ResourceList") {
                return Verdict::Pass;
            }
            let items = ctx
                .release_elements()
                .flat_map(|release| release.descendants("ResourceGroupContentItem"));
            Verdict::all(items, |item| match item.value_of("ReleaseResourceReference") {
                Some(reference) => ctx.has_resource(reference),
                None => true,
            })
        },
    )
}

// Identifier format

pub fn isrc_format(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ISRC-Format"),
        Category::IdentifierFormat,
        Severity::Error,
        "ISRC must match format: 2 letters, 3 alphanumeric, 7 digits (e.g., USRC17607839)",
        |ctx| {
            let codes = ctx
                .resources_of("SoundRecording")
                .flat_map(|sr| sr.descendants("ISRC"));
            Verdict::all(codes, |isrc| {
                isrc.text().is_some_and(|v| isrc_regex().is_match(v))
            })
        },
    )
}

pub fn main_release_id(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "Release-ReleaseId"),
        Category::IdentifierFormat,
        Severity::Error,
        "Main Release must have a ReleaseId with GRid, ICPN or ProprietaryId",
        |ctx| {
            Verdict::all(ctx.main_releases(), |release| {
                release.children("ReleaseId").iter().any(|id| {
                    id.has("GRid") || id.has("ICPN") || id.has("ProprietaryId")
                })
            })
        },
    )
}

// Display metadata

pub fn display_artist_structure(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "DisplayArtist-Structure"),
        Category::DisplayMetadata,
        Severity::Error,
        "Each DisplayArtist must have ArtistPartyReference and DisplayArtistRole",
        |ctx| {
            let artists = ctx
                .release_elements()
                .flat_map(|release| release.children("DisplayArtist"));
            Verdict::all(artists, |artist| {
                artist.has("ArtistPartyReference") && artist.has("DisplayArtistRole")
            })
        },
    )
}

pub fn display_artist_role_valid(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "DisplayArtistRole-Valid"),
        Category::DisplayMetadata,
        Severity::Error,
        "DisplayArtistRole must be a recognised display artist role",
        |ctx| {
            Verdict::all(ctx.root().descendants("DisplayArtistRole"), |role| {
                role.text()
                    .is_some_and(|v| contains(vocab::DISPLAY_ARTIST_ROLES, v))
            })
        },
    )
}

pub fn contributor_role_valid(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ContributorRole-Valid"),
        Category::DisplayMetadata,
        Severity::Error,
        "Contributor roles must be recognised contributor role values",
        |ctx| {
            let root = ctx.root();
            let roles = root
                .descendants("Contributor")
                .into_iter()
                .flat_map(|c| c.children("Role"))
                .chain(
                    root.descendants("ResourceContributor")
                        .into_iter()
                        .flat_map(|c| c.children("ResourceContributorRole")),
                );
            Verdict::all(roles, |role| {
                role.text()
                    .is_some_and(|v| contains(vocab::CONTRIBUTOR_ROLES, v))
            })
        },
    )
}

// Deal terms

pub fn deal_terms_territory(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "DealTerms-Territory"),
        Category::DealTerms,
        Severity::Error,
        "DealTerms must have either TerritoryCode OR ExcludedTerritoryCode (not both)",
        |ctx| {
            Verdict::all(ctx.deal_terms(), |terms| {
                terms.has("TerritoryCode") != terms.has("ExcludedTerritoryCode")
            })
        },
    )
}

pub fn deal_terms_validity_period(version: ErnVersion, suggestion: &'static str) -> Rule {
    Rule::new(
        rule_id(version, "DealTerms-ValidityPeriod"),
        Category::DealTerms,
        Severity::Error,
        "Each DealTerms must have ValidityPeriod with StartDate or StartDateTime",
        |ctx| {
            Verdict::all(ctx.deal_terms(), |terms| {
                let periods = terms.children("ValidityPeriod");
                !periods.is_empty()
                    && periods
                        .iter()
                        .all(|p| p.has("StartDate") || p.has("StartDateTime"))
            })
        },
    )
    .suggest(suggestion)
}

/// Every deal-terms `UseType` must belong to `table`.
pub fn use_type_valid(
    version: ErnVersion,
    name: &str,
    table: &'static [&'static str],
    message: impl Into<String>,
) -> Rule {
    Rule::new(
        rule_id(version, name),
        Category::DealTerms,
        Severity::Error,
        message,
        move |ctx| {
            Verdict::all(ctx.deal_terms().flat_map(use_types), |use_type| {
                use_type.text().is_some_and(|v| contains(table, v))
            })
        },
    )
}

pub fn use_type_deprecated(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "UseType-Deprecated"),
        Category::DealTerms,
        Severity::Warning,
        "UseType Stream, Download and Broadcast are deprecated umbrella values",
        |ctx| {
            Verdict::all(ctx.deal_terms().flat_map(use_types), |use_type| {
                !use_type
                    .text()
                    .is_some_and(|v| contains(vocab::DEPRECATED_USE_TYPES, v))
            })
        },
    )
    .suggest("Replace them with specific use types such as OnDemandStream or PermanentDownload")
}

pub fn use_type_parent_child_conflict(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "UseType-ParentChild-Conflict"),
        Category::DealTerms,
        Severity::Error,
        "A UseType must not appear in the same DealTerms as one of its child use types (e.g. Stream with OnDemandStream)",
        |ctx| {
            Verdict::all(ctx.deal_terms(), |terms| {
                let values: HashSet<&str> = use_types(terms).filter_map(Element::text).collect();
                !values.iter().any(|parent| {
                    vocab::use_type_children(parent)
                        .iter()
                        .any(|child| values.contains(child))
                })
            })
        },
    )
}

pub fn commercial_model_type(
    version: ErnVersion,
    name: &str,
    severity: Severity,
    table: &'static [&'static str],
    message: impl Into<String>,
) -> Rule {
    Rule::new(
        rule_id(version, name),
        Category::DealTerms,
        severity,
        message,
        move |ctx| {
            let models = ctx
                .deal_terms()
                .flat_map(|terms| terms.children("CommercialModelType"));
            Verdict::all(models, |model| {
                model.text().is_some_and(|v| contains(table, v))
            })
        },
    )
}

/// Release date used when comparing against deal start dates.
fn release_date(release: &Element) -> Option<chrono::NaiveDate> {
    ["ReleaseDate", "OriginalReleaseDate", "GlobalOriginalReleaseDate"]
        .into_iter()
        .find_map(|name| release.value_of(name))
        .or_else(|| {
            release
                .children("ReleaseDetailsByTerritory")
                .iter()
                .find_map(|d| d.value_of("ReleaseDate"))
        })
        .and_then(date_prefix)
}

pub fn deal_start_after_release_date(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "Deal-StartDate-After-ReleaseDate"),
        Category::DealTerms,
        Severity::Error,
        "A deal must not start before the release date of the release it covers",
        |ctx| {
            for release_deal in ctx.release_deals() {
                let Some(released) = release_deal
                    .values_of("DealReleaseReference")
                    .filter_map(|r| ctx.release_by_reference(r))
                    .filter_map(release_date)
                    .max()
                else {
                    continue;
                };
                let terms = release_deal
                    .children("Deal")
                    .iter()
                    .flat_map(|deal| deal.children("DealTerms"));
                let verdict = Verdict::all(terms, |terms| {
                    terms.children("ValidityPeriod").iter().all(|period| {
                        period
                            .value_of("StartDate")
                            .or_else(|| period.value_of("StartDateTime"))
                            .and_then(date_prefix)
                            .is_none_or(|start| start >= released)
                    })
                });
                if !verdict.passed() {
                    return verdict;
                }
            }
            Verdict::Pass
        },
    )
}

// Territory

pub fn territory_code_valid(
    version: ErnVersion,
    table: &'static [&'static str],
    message: impl Into<String>,
) -> Rule {
    Rule::new(
        rule_id(version, "TerritoryCode-Valid"),
        Category::Territory,
        Severity::Error,
        message,
        move |ctx| {
            let codes = ctx.deal_terms().flat_map(|terms| {
                terms
                    .children("TerritoryCode")
                    .iter()
                    .chain(terms.children("ExcludedTerritoryCode"))
            });
            Verdict::all(codes, |code| code.text().is_some_and(|v| contains(table, v)))
        },
    )
}

// Resource grouping

pub fn resource_group_required(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ResourceGroup-Required"),
        Category::ResourceGrouping,
        Severity::Warning,
        "Main Release should have ResourceGroup to define resource sequencing",
        |ctx| Verdict::all(ctx.main_releases(), |release| release.has("ResourceGroup")),
    )
    .suggest("Add ResourceGroup with ResourceGroupContentItem elements to define track order")
}

pub fn resource_group_content_items(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ResourceGroup-ContentItems"),
        Category::ResourceGrouping,
        Severity::Error,
        "ResourceGroup must contain ResourceGroupContentItem elements with valid references",
        |ctx| {
            let groups = ctx
                .release_elements()
                .flat_map(|release| release.children("ResourceGroup"));
            for group in groups {
                let items = group.descendants("ResourceGroupContentItem");
                if items.is_empty() {
                    return Verdict::fail_at(group);
                }
                let verdict = Verdict::all(items, |item| {
                    is_resource_reference(item.value_of("ReleaseResourceReference"))
                });
                if !verdict.passed() {
                    return verdict;
                }
            }
            Verdict::Pass
        },
    )
}

/// Sequence numbers of the direct content items of each group must strictly increase.
pub fn sequence_number_order(version: ErnVersion, severity: Severity) -> Rule {
    Rule::new(
        rule_id(version, "SequenceNumber-Order"),
        Category::ResourceGrouping,
        severity,
        "SequenceNumber values must be unique and increasing within a ResourceGroup",
        |ctx| {
            let groups = ctx
                .release_elements()
                .flat_map(|release| release.descendants("ResourceGroup"));
            for group in groups {
                let mut previous: Option<u64> = None;
                for item in group.children("ResourceGroupContentItem") {
                    let Some(number) = item
                        .value_of("SequenceNumber")
                        .and_then(|v| v.parse::<u64>().ok())
                    else {
                        continue;
                    };
                    if previous.is_some_and(|p| number <= p) {
                        return Verdict::fail_at(item);
                    }
                    previous = Some(number);
                }
            }
            Verdict::Pass
        },
    )
}

// Consistency

pub fn main_release_unique(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "MainRelease-Unique"),
        Category::Consistency,
        Severity::Error,
        "Exactly one Release must be the main release when ReleaseProfileVersionId is declared",
        |ctx| {
            if ctx.root().attribute("ReleaseProfileVersionId").is_none() {
                return Verdict::Pass;
            }
            let main = ctx.flagged_main_releases();
            match main.as_slice() {
                [_] => Verdict::Pass,
                [_, second, ..] => Verdict::fail_at(second),
                [] => fail_at_or_document(ctx.root().child("ReleaseList")),
            }
        },
    )
}

fn is_explicit(element: &Element) -> bool {
    element
        .descendants("ParentalWarningType")
        .iter()
        .any(|w| w.text() == Some("Explicit"))
}

pub fn explicit_content_propagation(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ExplicitContent-Propagation"),
        Category::Consistency,
        Severity::Warning,
        "Release should be marked Explicit when one of its primary resources is explicit",
        |ctx| {
            let explicit_resource = ctx
                .resources_of("SoundRecording")
                .chain(ctx.resources_of("Video"))
                .any(is_explicit);
            if !explicit_resource {
                return Verdict::Pass;
            }
            Verdict::all(ctx.main_releases(), is_explicit)
        },
    )
    .suggest("Add ParentalWarningType Explicit to the main Release")
}

pub fn track_count_reconcile(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "TrackCount-Reconcile"),
        Category::Consistency,
        Severity::Warning,
        "Track releases should match the tracks listed in the main release's ResourceGroup",
        |ctx| {
            let grouped: HashSet<&str> = ctx
                .main_releases()
                .flat_map(|release| release.children("ResourceGroup"))
                .flat_map(|group| group.descendants("ReleaseResourceReference"))
                .filter_map(Element::text)
                .collect();
            if grouped.is_empty() {
                return Verdict::Pass;
            }
            Verdict::all(ctx.track_releases(), |track| {
                track
                    .values_of("ReleaseResourceReference")
                    .all(|r| grouped.contains(r))
            })
        },
    )
}

// Best practice

pub fn release_type_valid(version: ErnVersion, table: &'static [&'static str]) -> Rule {
    Rule::new(
        rule_id(version, "ReleaseType-Valid"),
        Category::BestPractice,
        Severity::Error,
        format!("ReleaseType must be a valid ERN {} release type", version),
        move |ctx| {
            let types = ctx
                .release_elements()
                .flat_map(|release| release.children("ReleaseType"));
            Verdict::all(types, |t| t.text().is_some_and(|v| contains(table, v)))
        },
    )
}

// Profile mapping

/// Release types declared on a release or, for 3.8.2, on its territory details.
pub fn declared_release_type(release: &Element) -> Option<&str> {
    release.value_of("ReleaseType").or_else(|| {
        release
            .children("ReleaseDetailsByTerritory")
            .iter()
            .find_map(|d| d.value_of("ReleaseType"))
    })
}

pub fn release_profile_mapping(version: ErnVersion) -> Rule {
    Rule::new(
        rule_id(version, "ReleaseProfile-Mapping"),
        Category::ProfileMapping,
        Severity::Warning,
        "ReleaseType is not among the types expected for the declared release profile",
        move |ctx| {
            let Some(profile) = ctx
                .root()
                .attribute("ReleaseProfileVersionId")
                .and_then(profiles::declared_profile)
            else {
                return Verdict::Pass;
            };
            let allowed = profiles::release_types(version, profile);
            if allowed.is_empty() {
                return Verdict::Pass;
            }
            let releases: Vec<&Element> = if version.is_4x() {
                ctx.main_releases().collect()
            } else {
                ctx.flagged_main_releases()
            };
            Verdict::all(releases, |release| {
                declared_release_type(release).is_none_or(|t| contains(allowed, t))
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_patterns() {
        assert!(release_reference_regex().is_match("R0"));
        assert!(release_reference_regex().is_match("R-main_1"));
        assert!(!release_reference_regex().is_match("X1"));
        assert!(!release_reference_regex().is_match("R"));
        assert!(resource_reference_regex().is_match("A1"));
        assert!(!resource_reference_regex().is_match("A 1"));
        assert!(party_reference_regex().is_match("PADPIDA2014"));
    }

    #[test]
    fn test_isrc_pattern() {
        assert!(isrc_regex().is_match("USRC17607839"));
        assert!(isrc_regex().is_match("usrc17607839"));
        assert!(!isrc_regex().is_match("US-RC1-76-07839"));
        assert!(!isrc_regex().is_match("USRC1760783"));
    }

    #[test]
    fn test_date_time_pattern() {
        assert!(date_time_regex().is_match("2024-01-15T10:30:00"));
        assert!(date_time_regex().is_match("2024-01-15T10:30:00.000Z"));
        assert!(!date_time_regex().is_match("2024-01-15"));
    }

    #[test]
    fn test_rule_id_prefix() {
        assert_eq!(rule_id(ErnVersion::V43, "ISRC-Format"), "ERN43-ISRC-Format");
        assert_eq!(rule_id(ErnVersion::V382, "UseType"), "ERN382-UseType");
    }
}
