//! Profile conformance report merged into results when a profile is requested.
//!
//! These checks overlap the version rule sets on purpose: they describe what a
//! complete delivery for a release profile looks like, independent of the schema
//! generation, and are reported under `Schematron-` ids with a `Profile:` context.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use super::common::declared_release_type;
use super::{Category, Evaluation, FiredRule, Rule, RuleContext, RuleSet, Verdict};
use crate::document::{Element, ParsedDocument, Position};
use crate::finding::{Finding, Severity};
use crate::version::{ErnVersion, Profile};

/// Prefix of every rule id produced by the profile report.
pub const RULE_PREFIX: &str = "Schematron-";

/// Maximum ringtone length, in seconds.
const RINGTONE_MAX_SECONDS: f64 = 40.0;

static DURATION_REGEX: OnceLock<Regex> = OnceLock::new();

fn duration_regex() -> &'static Regex {
    DURATION_REGEX.get_or_init(|| {
        Regex::new(r"PT(?:(\d+)M)?(\d+(?:\.\d+)?)S").expect("Failed to compile duration regex")
    })
}

/// Seconds of an ISO 8601 `PT[nM]n[.n]S` duration.
pub fn duration_seconds(value: &str) -> Option<f64> {
    let caps = duration_regex().captures(value)?;
    let minutes: f64 = caps
        .get(1)
        .map_or(Ok(0.0), |m| m.as_str().parse::<f64>())
        .ok()?;
    let seconds: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some(minutes * 60.0 + seconds)
}

fn check<F>(name: &str, severity: Severity, message: impl Into<String>, predicate: F) -> Rule
where
    F: Fn(&RuleContext<'_>) -> Verdict + Send + Sync + 'static,
{
    Rule::new(
        format!("{}{}", RULE_PREFIX, name),
        Category::Profile,
        severity,
        message,
        predicate,
    )
}

/// First `Release` of the message.
fn first_release<'a>(ctx: &RuleContext<'a>) -> Option<&'a Element> {
    ctx.main_releases().next()
}

/// Territory or global detail blocks of a release; a flat 4.3 release is its own detail block.
fn release_details(release: &Element) -> Vec<&Element> {
    let mut details: Vec<&Element> = release.children("ReleaseDetailsByTerritory").iter().collect();
    details.extend(release.child("GlobalReleaseDetails"));
    if details.is_empty() {
        details.push(release);
    }
    details
}

/// Resource references listed by a release, directly or through its resource groups.
fn referenced_resources(release: &Element) -> HashSet<&str> {
    release
        .descendants("ReleaseResourceReference")
        .into_iter()
        .filter_map(Element::text)
        .collect()
}

/// Every child of `ResourceList`, in document order.
fn all_resources<'a>(ctx: &RuleContext<'a>) -> Vec<&'a Element> {
    let mut resources: Vec<&'a Element> = ctx
        .root()
        .child("ResourceList")
        .map(|list| {
            list.fields()
                .flat_map(|(_, field)| field.as_slice().iter())
                .collect()
        })
        .unwrap_or_default();
    resources.sort_by_key(|r| (r.position().line, r.position().column));
    resources
}

fn complete_party(party: &Element) -> bool {
    party.has("PartyId") && party.children("PartyName").iter().any(|n| n.has("FullName"))
}

fn role_of(contributor: &Element) -> impl Iterator<Item = &str> {
    ["ArtistRole", "Role", "ResourceContributorRole"]
        .into_iter()
        .filter_map(|name| contributor.value_of(name))
}

fn has_role(contributors: &[Element], roles: &[&str]) -> bool {
    contributors
        .iter()
        .any(|c| role_of(c).any(|r| roles.iter().any(|role| *role == r)))
}

fn release_type_in(ctx: &RuleContext<'_>, allowed: &[&str]) -> bool {
    first_release(ctx)
        .and_then(declared_release_type)
        .is_some_and(|t| allowed.iter().any(|a| *a == t))
}

fn release_type_contains(ctx: &RuleContext<'_>, needles: &[&str]) -> bool {
    first_release(ctx)
        .and_then(declared_release_type)
        .is_some_and(|t| needles.iter().any(|n| t.contains(n)))
}

fn base_rules(version: ErnVersion) -> Vec<Rule> {
    let mut rules = vec![
        check(
            "MessageHeader-Required",
            Severity::Error,
            "MessageHeader is required",
            |ctx| Verdict::require(ctx.root().has("MessageHeader")),
        ),
        check(
            "MessageHeader-MessageId",
            Severity::Error,
            "MessageHeader must contain MessageId",
            |ctx| {
                Verdict::require(
                    ctx.root()
                        .path(&["MessageHeader", "MessageId"])
                        .and_then(Element::text)
                        .is_some(),
                )
            },
        ),
        check(
            "MessageHeader-MessageSender",
            Severity::Error,
            "MessageHeader must contain complete MessageSender information (PartyId and PartyName)",
            |ctx| {
                Verdict::require(
                    ctx.root()
                        .path(&["MessageHeader", "MessageSender"])
                        .is_some_and(complete_party),
                )
            },
        ),
        check(
            "MessageHeader-MessageRecipient",
            Severity::Error,
            "MessageHeader must contain complete MessageRecipient information (PartyId and PartyName)",
            |ctx| {
                let recipients = ctx
                    .root()
                    .child("MessageHeader")
                    .map(|h| h.children("MessageRecipient"))
                    .unwrap_or(&[]);
                Verdict::require(!recipients.is_empty() && recipients.iter().all(complete_party))
            },
        ),
        check(
            "MessageHeader-MessageCreatedDateTime",
            Severity::Error,
            "MessageHeader must contain MessageCreatedDateTime",
            |ctx| {
                Verdict::require(
                    ctx.root()
                        .path(&["MessageHeader", "MessageCreatedDateTime"])
                        .and_then(Element::text)
                        .is_some(),
                )
            },
        ),
        check(
            "ReleaseList-Required",
            Severity::Error,
            "ReleaseList is required",
            |ctx| Verdict::require(ctx.root().has("ReleaseList")),
        ),
        check(
            "ReleaseList-NotEmpty",
            Severity::Error,
            "ReleaseList must contain at least one Release",
            |ctx| Verdict::require(first_release(ctx).is_some()),
        ),
        check(
            "ResourceList-Required",
            Severity::Error,
            "ResourceList is required",
            |ctx| Verdict::require(ctx.root().has("ResourceList")),
        ),
        check(
            "Release-ReleaseId",
            Severity::Error,
            "Each Release must have a ReleaseId (GRid, ICPN, or ProprietaryId)",
            |ctx| {
                Verdict::all(ctx.main_releases(), |release| {
                    release.children("ReleaseId").iter().any(|id| {
                        id.has("GRid") || id.has("ICPN") || id.has("ProprietaryId")
                    })
                })
            },
        ),
        check(
            "Release-ReleaseReference",
            Severity::Error,
            "Each Release must have a ReleaseReference",
            |ctx| {
                Verdict::all(ctx.main_releases(), |release| {
                    super::context::release_reference(release).is_some()
                })
            },
        ),
        check(
            "Resource-ResourceReference",
            Severity::Error,
            "Each Resource must have a ResourceReference",
            |ctx| {
                Verdict::all(all_resources(ctx), |resource| {
                    resource.value_of("ResourceReference").is_some()
                })
            },
        ),
        check(
            "ResourceReference-Uniqueness",
            Severity::Error,
            "ResourceReference values must be unique within the message",
            |ctx| {
                let mut seen = HashSet::new();
                Verdict::all(all_resources(ctx), |resource| {
                    resource
                        .value_of("ResourceReference")
                        .is_none_or(|r| seen.insert(r))
                })
            },
        ),
    ];

    if version.is_4x() {
        rules.extend([
            check(
                "DealList-Required",
                Severity::Error,
                format!("DealList is required in ERN {}", version),
                |ctx| Verdict::require(ctx.root().has("DealList")),
            ),
            check(
                "Deal-ValidityPeriod",
                Severity::Error,
                "Each Deal must have a ValidityPeriod with StartDate",
                |ctx| {
                    Verdict::all(ctx.deal_terms(), |terms| {
                        terms
                            .children("ValidityPeriod")
                            .iter()
                            .any(|p| p.has("StartDate") || p.has("StartDateTime"))
                    })
                },
            ),
            check(
                "ReleaseDetailsByTerritory",
                Severity::Error,
                "ERN 4.x requires either GlobalReleaseDetails or ReleaseDetailsByTerritory",
                |ctx| {
                    Verdict::all(ctx.main_releases(), |release| {
                        release.has("GlobalReleaseDetails")
                            || release.has("ReleaseDetailsByTerritory")
                            || release.has("DisplayTitleText")
                            || release.has("DisplayTitle")
                    })
                },
            ),
        ]);
    } else {
        rules.extend([
            check(
                "UpdateIndicator-Recommended",
                Severity::Info,
                "UpdateIndicator is recommended in ERN 3.8.2",
                |ctx| Verdict::require(ctx.root().has("UpdateIndicator")),
            ),
            check(
                "ReleaseDetailsByTerritory",
                Severity::Error,
                "ERN 3.8.2 requires ReleaseDetailsByTerritory",
                |ctx| {
                    Verdict::all(ctx.main_releases(), |release| {
                        release.has("ReleaseDetailsByTerritory")
                    })
                },
            ),
        ]);
    }
    rules
}

fn profile_rules(profile: Profile) -> Vec<Rule> {
    match profile {
        Profile::AudioAlbum => vec![
            check(
                "AudioAlbum-MinTracks",
                Severity::Error,
                "AudioAlbum profile requires at least 2 SoundRecording resources",
                |ctx| Verdict::require(ctx.resources_of("SoundRecording").count() >= 2),
            ),
            check(
                "AudioAlbum-ReleaseType",
                Severity::Warning,
                "AudioAlbum ReleaseType should be \"Album\", \"EP\", or \"LongFormRelease\"",
                |ctx| {
                    Verdict::require(release_type_in(
                        ctx,
                        &["Album", "EP", "LongFormRelease", "AudioAlbumMusicOnly"],
                    ))
                },
            ),
            check(
                "AudioAlbum-PrimaryResource",
                Severity::Error,
                "AudioAlbum must specify primary resources in ReleaseResourceReferenceList",
                |ctx| {
                    Verdict::require(first_release(ctx).is_some_and(|r| {
                        r.has("ReleaseResourceReferenceList") || r.has("ResourceGroup")
                    }))
                },
            ),
            check(
                "AudioAlbum-TrackListComplete",
                Severity::Error,
                "All SoundRecording resources must be referenced in the Release",
                |ctx| {
                    let referenced = first_release(ctx)
                        .map(referenced_resources)
                        .unwrap_or_default();
                    Verdict::all(ctx.resources_of("SoundRecording"), |recording| {
                        recording
                            .value_of("ResourceReference")
                            .is_some_and(|r| referenced.contains(r))
                    })
                },
            ),
            check(
                "AudioAlbum-DisplayArtist",
                Severity::Warning,
                "AudioAlbum should specify DisplayArtist",
                |ctx| {
                    Verdict::require(first_release(ctx).is_some_and(|release| {
                        release_details(release)
                            .iter()
                            .any(|d| d.has("DisplayArtist") || d.has("DisplayArtistName"))
                    }))
                },
            ),
        ],
        Profile::AudioSingle => vec![
            check(
                "AudioSingle-MaxTracks",
                Severity::Error,
                "AudioSingle profile should contain 1-3 SoundRecording resources",
                |ctx| {
                    let count = ctx.resources_of("SoundRecording").count();
                    Verdict::require((1..=3).contains(&count))
                },
            ),
            check(
                "AudioSingle-ReleaseType",
                Severity::Warning,
                "AudioSingle ReleaseType should be \"Single\" or equivalent",
                |ctx| {
                    Verdict::require(release_type_in(
                        ctx,
                        &["Single", "AudioSingle", "ShortFormRelease", "AudioSingleMusicOnly"],
                    ))
                },
            ),
            check(
                "AudioSingle-MainResource",
                Severity::Error,
                "AudioSingle must have at least one primary track",
                |ctx| {
                    Verdict::require(
                        first_release(ctx).is_some_and(|r| !referenced_resources(r).is_empty()),
                    )
                },
            ),
        ],
        Profile::Video => vec![
            check(
                "Video-Required",
                Severity::Error,
                "Video profile must contain at least one Video resource",
                |ctx| Verdict::require(ctx.resources_of("Video").next().is_some()),
            ),
            check(
                "Video-TechnicalDetails",
                Severity::Error,
                "All Video resources must include technical details",
                |ctx| Verdict::all(ctx.resources_of("Video"), |v| video_details(v).is_some()),
            ),
            check(
                "Video-Duration",
                Severity::Error,
                "All Video resources must specify duration",
                |ctx| {
                    Verdict::all(ctx.resources_of("Video"), |video| {
                        video.has("Duration")
                            || video_details(video)
                                .is_some_and(|d| d.has("Duration") || d.has("PlayingTime"))
                    })
                },
            ),
            check(
                "Video-ImageResources",
                Severity::Warning,
                "Video profile should include at least one Image resource (cover art)",
                |ctx| Verdict::require(ctx.resources_of("Image").next().is_some()),
            ),
        ],
        Profile::Mixed => vec![
            check(
                "Mixed-MultipleResourceTypes",
                Severity::Warning,
                "Mixed profile should contain at least 2 different resource types",
                |ctx| {
                    let kinds = ["SoundRecording", "Video", "Image", "Text"]
                        .into_iter()
                        .filter(|kind| ctx.resources_of(kind).next().is_some())
                        .count();
                    Verdict::require(kinds >= 2)
                },
            ),
            check(
                "Mixed-BundleComplete",
                Severity::Info,
                "Mixed profile should use appropriate ReleaseType (e.g., \"Bundle\")",
                |ctx| Verdict::require(release_type_contains(ctx, &["Bundle", "Mixed"])),
            ),
        ],
        Profile::Classical => vec![
            check(
                "Classical-Composer",
                Severity::Error,
                "Classical recordings must credit composer(s)",
                |ctx| {
                    Verdict::all(ctx.resources_of("SoundRecording"), |recording| {
                        ["Contributor", "IndirectContributor", "ResourceContributor"]
                            .into_iter()
                            .any(|name| {
                                has_role(recording.children(name), &["Composer", "ComposerLyricist"])
                            })
                    })
                },
            ),
            check(
                "Classical-WorkInformation",
                Severity::Warning,
                "Classical recordings should include work information",
                |ctx| {
                    Verdict::all(ctx.resources_of("SoundRecording"), |recording| {
                        recording.has("IndirectResourceContributor")
                    })
                },
            ),
            check(
                "Classical-Movement",
                Severity::Info,
                "Classical recordings should indicate movement information in titles",
                |ctx| {
                    Verdict::require(ctx.resources_of("SoundRecording").any(|recording| {
                        recording_title(recording).is_some_and(|title| {
                            ["Movement", "mvt", "No."].iter().any(|m| title.contains(m))
                        })
                    }))
                },
            ),
        ],
        Profile::Ringtone => vec![
            check(
                "Ringtone-Duration",
                Severity::Error,
                "Ringtone duration should not exceed 40 seconds",
                |ctx| {
                    Verdict::all(ctx.resources_of("SoundRecording"), |recording| {
                        recording_duration(recording)
                            .is_some_and(|s| s > 0.0 && s <= RINGTONE_MAX_SECONDS)
                    })
                },
            ),
            check(
                "Ringtone-TechnicalDetails",
                Severity::Warning,
                "Ringtone should be marked as Preview or Clip",
                |ctx| {
                    Verdict::all(ctx.resources_of("SoundRecording"), |recording| {
                        sound_details(recording).is_some_and(|d| {
                            d.value_of("IsPreview") == Some("true")
                                || d.value_of("IsClip") == Some("true")
                        })
                    })
                },
            ),
        ],
        Profile::Dj => vec![
            check(
                "DJ-MixType",
                Severity::Warning,
                "DJ Mix should use appropriate ReleaseType",
                |ctx| Verdict::require(release_type_contains(ctx, &["DJ", "Mix"])),
            ),
            check(
                "DJ-Compiler",
                Severity::Error,
                "DJ Mix should credit the DJ/Compiler",
                |ctx| {
                    Verdict::require(first_release(ctx).is_some_and(|release| {
                        release_details(release).iter().any(|d| {
                            has_role(d.children("ResourceContributor"), &["Compiler", "DJ", "Mixer"])
                        })
                    }))
                },
            ),
        ],
        Profile::ReleaseByRelease => Vec::new(),
    }
}

fn video_details(video: &Element) -> Option<&Element> {
    video
        .child("TechnicalVideoDetails")
        .or_else(|| video.child("TechnicalDetails"))
        .or_else(|| {
            video
                .children("VideoDetailsByTerritory")
                .iter()
                .find_map(|t| t.child("TechnicalVideoDetails"))
        })
}

fn sound_details(recording: &Element) -> Option<&Element> {
    recording
        .child("TechnicalSoundRecordingDetails")
        .or_else(|| recording.child("TechnicalDetails"))
}

fn recording_duration(recording: &Element) -> Option<f64> {
    let value = sound_details(recording)
        .and_then(|d| d.value_of("Duration").or_else(|| d.value_of("PlayingTime")))
        .or_else(|| recording.value_of("Duration"))?;
    duration_seconds(value)
}

fn recording_title(recording: &Element) -> Option<&str> {
    recording
        .path(&["ReferenceTitle", "TitleText"])
        .and_then(Element::text)
        .or_else(|| recording.value_of("DisplayTitleText"))
}

/// Base and per-profile check sets, built once.
#[derive(Debug)]
pub struct ProfileReport {
    base: HashMap<ErnVersion, RuleSet>,
    profiles: HashMap<Profile, RuleSet>,
}

impl ProfileReport {
    pub fn new() -> Self {
        let base = ErnVersion::ALL
            .into_iter()
            .map(|v| (v, RuleSet::new(base_rules(v))))
            .collect();

        let mut profiles = HashMap::new();
        for version in ErnVersion::ALL {
            for profile in version.profiles() {
                profiles
                    .entry(*profile)
                    .or_insert_with(|| RuleSet::new(profile_rules(*profile)));
            }
        }

        ProfileReport { base, profiles }
    }

    /// Runs the report for `profile`; unknown profile names get the base checks only.
    pub fn evaluate(&self, doc: &ParsedDocument, version: ErnVersion, profile: &str) -> Evaluation {
        let context = format!("Profile: {}", profile);
        let mut evaluation = Evaluation::default();

        if let Some(declared) = doc.root().attribute("ReleaseProfileVersionId") {
            if !declared.contains(profile) {
                evaluation.findings.push(Finding::new(
                    format!("{}ProfileMismatch", RULE_PREFIX),
                    Severity::Warning,
                    format!(
                        "Message profile \"{}\" does not match requested profile \"{}\"",
                        declared, profile
                    ),
                    Position::default(),
                ));
            }
        }

        let ctx = RuleContext::new(doc, version);
        let sets = self
            .base
            .get(&version)
            .into_iter()
            .chain(Profile::parse(profile).and_then(|p| self.profiles.get(&p)));
        for set in sets {
            let Evaluation { findings, fired } = set.evaluate(&ctx);
            evaluation
                .findings
                .extend(findings.into_iter().map(|f| f.with_context(context.clone())));
            evaluation.fired.extend(fired.into_iter().map(|rule| FiredRule {
                context: Some(context.clone()),
                ..rule
            }));
        }
        evaluation
    }
}

impl Default for ProfileReport {
    fn default() -> Self {
        Self::new()
    }
}
