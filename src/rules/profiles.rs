//! Profile-scoped rules and the release types each profile expects.

use super::context::is_flagged_main;
use super::vocab;
use super::{Category, Rule, RuleContext, Verdict};
use crate::document::Element;
use crate::finding::Severity;
use crate::version::{ErnVersion, Profile};

const AUDIO_ALBUM_4X: &[&str] = &["Album", "ClassicalAlbum", "DigitalBoxSetRelease", "MultimediaAlbum"];
const AUDIO_SINGLE_4X: &[&str] = &["Single", "EP", "SingleResourceRelease"];
const VIDEO_43: &[&str] = &[
    "VideoAlbum",
    "VideoSingle",
    "ConcertVideo",
    "FeatureFilm",
    "Documentary",
    "Episode",
];
const VIDEO_42: &[&str] = &[
    "VideoAlbum",
    "VideoSingle",
    "ConcertVideo",
    "FeatureFilm",
    "Documentary",
    "Episode",
    "ShortFilm",
];
const CLASSICAL: &[&str] = &["ClassicalAlbum", "ClassicalDigitalBoxedSet", "ClassicalMultimediaAlbum"];
const RINGTONE: &[&str] = &["RingtoneRelease", "RingbackToneRelease", "AlertToneRelease"];
const MIXED: &[&str] = &["Bundle", "MultimediaAlbum", "MultimediaSingle", "MultimediaDigitalBoxedSet"];
const DJ: &[&str] = &["DjMix"];
const AUDIO_ALBUM_382: &[&str] = &["Album", "ClassicalAlbum", "DigitalBoxSetRelease"];
const AUDIO_SINGLE_382: &[&str] = &["Single", "EP", "SingleResourceRelease", "TrackRelease"];

/// Release types a profile expects; empty when the profile has no mapping for the version.
pub fn release_types(version: ErnVersion, profile: Profile) -> &'static [&'static str] {
    match (version, profile) {
        (ErnVersion::V382, Profile::AudioAlbum) => AUDIO_ALBUM_382,
        (ErnVersion::V382, Profile::AudioSingle) => AUDIO_SINGLE_382,
        (ErnVersion::V382, _) => &[],
        (_, Profile::AudioAlbum) => AUDIO_ALBUM_4X,
        (_, Profile::AudioSingle) => AUDIO_SINGLE_4X,
        (ErnVersion::V42, Profile::Video) => VIDEO_42,
        (_, Profile::Video) => VIDEO_43,
        (_, Profile::Classical) => CLASSICAL,
        (_, Profile::Ringtone) => RINGTONE,
        (_, Profile::Mixed) => MIXED,
        (_, Profile::Dj) => DJ,
        (_, Profile::ReleaseByRelease) => &[],
    }
}

/// Maps a `ReleaseProfileVersionId` such as `CommonReleaseTypes/14/AudioAlbumMusicOnly`
/// to the profile it names.
pub fn declared_profile(profile_version_id: &str) -> Option<Profile> {
    let id = profile_version_id;
    if id.contains("Classical") {
        Some(Profile::Classical)
    } else if id.contains("Ringtone") {
        Some(Profile::Ringtone)
    } else if id.contains("DJ") || id.contains("DjMix") {
        Some(Profile::Dj)
    } else if id.contains("AudioAlbum") {
        Some(Profile::AudioAlbum)
    } else if id.contains("AudioSingle") || id.contains("Single") {
        Some(Profile::AudioSingle)
    } else if id.contains("Video") {
        Some(Profile::Video)
    } else if id.contains("Mixed") {
        Some(Profile::Mixed)
    } else {
        None
    }
}

/// Extra rules for a `(version, profile)` pair.
pub fn rules(version: ErnVersion, profile: Profile) -> Vec<Rule> {
    match (version, profile) {
        (ErnVersion::V382, Profile::AudioAlbum) => vec![
            Rule::new(
                "AudioAlbum-ReleaseType-382",
                Category::Profile,
                Severity::Warning,
                "AudioAlbum profile expects ReleaseType of Album or similar",
                |ctx| {
                    let main = ctx
                        .main_releases()
                        .find(|r| is_flagged_main(r));
                    Verdict::require(main.is_some_and(|release| {
                        has_release_type_in(release, AUDIO_ALBUM_382)
                    }))
                },
            ),
            Rule::new(
                "AudioAlbum-TrackReleases",
                Category::Profile,
                Severity::Info,
                "AudioAlbum typically includes main album release plus individual track releases",
                |ctx| Verdict::require(ctx.releases().len() >= 2),
            ),
        ],
        (ErnVersion::V382, Profile::AudioSingle) => vec![Rule::new(
            "AudioSingle-ReleaseType-382",
            Category::Profile,
            Severity::Warning,
            "AudioSingle profile expects ReleaseType of Single, EP, or TrackRelease",
            |ctx| {
                Verdict::require(
                    ctx.main_releases()
                        .any(|release| has_release_type_in(release, AUDIO_SINGLE_382)),
                )
            },
        )],
        (ErnVersion::V382, Profile::ReleaseByRelease) => vec![Rule::new(
            "ReleaseByRelease-MultipleReleases",
            Category::Profile,
            Severity::Info,
            "ReleaseByRelease profile typically contains multiple Release elements",
            |ctx| Verdict::require(!ctx.releases().is_empty()),
        )],
        (_, Profile::AudioAlbum) => {
            let mut rules = vec![
                release_type_rule(
                    "AudioAlbum-ReleaseType",
                    AUDIO_ALBUM_4X,
                    "AudioAlbum profile expects ReleaseType of Album or similar",
                ),
                Rule::new(
                    "AudioAlbum-MinimumSoundRecordings",
                    Category::Profile,
                    Severity::Error,
                    "AudioAlbum requires at least 2 MusicalWorkSoundRecording resources",
                    |ctx| {
                        let musical = ctx
                            .resources_of("SoundRecording")
                            .filter(|sr| {
                                sr.value_of("Type")
                                    .or_else(|| sr.value_of("SoundRecordingType"))
                                    .is_none_or(|t| {
                                        t == "MusicalWorkSoundRecording" || t == "Unknown"
                                    })
                            })
                            .count();
                        Verdict::require(musical >= 2)
                    },
                ),
                Rule::new(
                    "AudioAlbum-FrontCoverImage",
                    Category::Profile,
                    Severity::Warning,
                    "AudioAlbum should have at least one FrontCoverImage",
                    |ctx| {
                        Verdict::require(ctx.resources_of("Image").any(|image| {
                            image.value_of("Type").or_else(|| image.value_of("ImageType"))
                                == Some("FrontCoverImage")
                        }))
                    },
                ),
            ];
            if version == ErnVersion::V43 {
                rules.push(Rule::new(
                    "AudioAlbum-ImageCodec",
                    Category::Profile,
                    Severity::Info,
                    "Images should use standard codecs: JPEG, PNG, GIF, or TIFF",
                    |ctx| {
                        Verdict::all(ctx.resources_of("Image"), |image| {
                            let details = image.children("TechnicalDetails");
                            details.is_empty()
                                || details.iter().any(|td| {
                                    td.value_of("ImageCodecType").is_some_and(|codec| {
                                        vocab::contains(vocab::IMAGE_CODECS, codec)
                                    })
                                })
                        })
                    },
                ));
            }
            rules
        }
        (_, Profile::AudioSingle) => vec![
            release_type_rule(
                "AudioSingle-ReleaseType",
                AUDIO_SINGLE_4X,
                "AudioSingle profile expects ReleaseType of Single or EP",
            ),
            Rule::new(
                "AudioSingle-MaximumSoundRecordings",
                Category::Profile,
                Severity::Warning,
                "AudioSingle should have no more than 4 SoundRecording resources",
                |ctx| Verdict::require(ctx.resources_of("SoundRecording").count() <= 4),
            ),
        ],
        (_, Profile::Video) => {
            let mut rules = Vec::new();
            if version.is_4x() {
                rules.push(release_type_rule(
                    "Video-ReleaseType",
                    release_types(version, Profile::Video),
                    "Video profile expects video-related ReleaseType",
                ));
            }
            rules.push(Rule::new(
                "Video-RequiredVideoResource",
                Category::Profile,
                Severity::Error,
                "Video profile requires at least one Video resource",
                |ctx| Verdict::require(ctx.resources_of("Video").next().is_some()),
            ));
            rules
        }
        (_, Profile::Mixed) => vec![Rule::new(
            "Mixed-ResourceList",
            Category::Profile,
            Severity::Error,
            "ResourceList is required for Mixed profile",
            |ctx| Verdict::require(ctx.root().has("ResourceList")),
        )],
        (ErnVersion::V382, _) => Vec::new(),
        (_, Profile::Classical) => vec![release_type_rule(
            "Classical-ReleaseType",
            CLASSICAL,
            "Classical profile expects ClassicalAlbum or similar ReleaseType",
        )],
        (_, Profile::Ringtone) => vec![release_type_rule(
            "Ringtone-ReleaseType",
            RINGTONE,
            "Ringtone profile expects RingtoneRelease or similar ReleaseType",
        )],
        _ => Vec::new(),
    }
}

fn has_release_type_in(release: &Element, allowed: &[&str]) -> bool {
    let direct = release.values_of("ReleaseType");
    let by_territory = release
        .children("ReleaseDetailsByTerritory")
        .iter()
        .flat_map(|d| d.values_of("ReleaseType"));
    direct.chain(by_territory).any(|t| allowed.contains(&t))
}

/// Passes when any release (track releases included) declares one of `allowed`.
fn release_type_rule(id: &str, allowed: &'static [&'static str], message: &str) -> Rule {
    Rule::new(
        id,
        Category::Profile,
        Severity::Warning,
        message,
        move |ctx: &RuleContext<'_>| {
            let matched = ctx
                .release_elements()
                .flat_map(|release| release.values_of("ReleaseType"))
                .any(|t| allowed.contains(&t));
            if matched {
                Verdict::Pass
            } else {
                ctx.root()
                    .child("ReleaseList")
                    .map_or(Verdict::require(false), Verdict::fail_at)
            }
        },
    )
}
