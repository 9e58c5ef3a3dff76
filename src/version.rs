//! Catalogue of supported ERN versions and release profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Main schema file name, identical for every version.
pub const MAIN_SCHEMA_FILE: &str = "release-notification.xsd";

/// A supported DDEX ERN message version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErnVersion {
    #[serde(rename = "3.8.2")]
    V382,
    #[serde(rename = "4.2")]
    V42,
    #[serde(rename = "4.3")]
    V43,
}

impl ErnVersion {
    pub const ALL: [ErnVersion; 3] = [ErnVersion::V382, ErnVersion::V42, ErnVersion::V43];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErnVersion::V382 => "3.8.2",
            ErnVersion::V42 => "4.2",
            ErnVersion::V43 => "4.3",
        }
    }

    pub fn namespace_uri(&self) -> &'static str {
        match self {
            ErnVersion::V382 => "http://ddex.net/xml/ern/382",
            ErnVersion::V42 => "http://ddex.net/xml/ern/42",
            ErnVersion::V43 => "http://ddex.net/xml/ern/43",
        }
    }

    /// Prefix used for the ids of version-scoped rules, e.g. `ERN43`.
    pub fn rule_prefix(&self) -> &'static str {
        match self {
            ErnVersion::V382 => "ERN382",
            ErnVersion::V42 => "ERN42",
            ErnVersion::V43 => "ERN43",
        }
    }

    /// File name of the allowed-value-set schema imported by the main XSD.
    pub fn avs_file(&self) -> &'static str {
        match self {
            ErnVersion::V382 => "avs_20161006.xsd",
            ErnVersion::V42 => "avs20200518.xsd",
            ErnVersion::V43 => "allowed-value-sets.xsd",
        }
    }

    pub fn main_schema_url(&self) -> &'static str {
        match self {
            ErnVersion::V382 => "http://ddex.net/xml/ern/382/release-notification.xsd",
            ErnVersion::V42 => "http://ddex.net/xml/ern/42/release-notification.xsd",
            ErnVersion::V43 => "http://ddex.net/xml/ern/43/release-notification.xsd",
        }
    }

    pub fn avs_schema_url(&self) -> &'static str {
        match self {
            ErnVersion::V382 => "http://ddex.net/xml/avs/avs382.xsd",
            ErnVersion::V42 => "http://ddex.net/xml/avs/avs42.xsd",
            ErnVersion::V43 => "http://ddex.net/xml/avs/avs43.xsd",
        }
    }

    pub fn is_4x(&self) -> bool {
        matches!(self, ErnVersion::V42 | ErnVersion::V43)
    }

    pub fn is_recommended(&self) -> bool {
        matches!(self, ErnVersion::V43)
    }

    /// Profiles accepted for this version.
    pub fn profiles(&self) -> &'static [Profile] {
        const FOUR_X: &[Profile] = &[
            Profile::AudioAlbum,
            Profile::AudioSingle,
            Profile::Video,
            Profile::Mixed,
            Profile::Classical,
            Profile::Ringtone,
            Profile::Dj,
        ];
        const THREE_X: &[Profile] = &[
            Profile::AudioAlbum,
            Profile::AudioSingle,
            Profile::Video,
            Profile::Mixed,
            Profile::Classical,
            Profile::Ringtone,
            Profile::Dj,
            Profile::ReleaseByRelease,
        ];
        if self.is_4x() { FOUR_X } else { THREE_X }
    }
}

impl fmt::Display for ErnVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErnVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3.8.2" | "382" => Ok(ErnVersion::V382),
            "4.2" | "42" => Ok(ErnVersion::V42),
            "4.3" | "43" => Ok(ErnVersion::V43),
            other => Err(SchemaError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// A named release profile narrowing a base ERN version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    AudioAlbum,
    AudioSingle,
    Video,
    Mixed,
    Classical,
    Ringtone,
    #[serde(rename = "DJ")]
    Dj,
    ReleaseByRelease,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::AudioAlbum => "AudioAlbum",
            Profile::AudioSingle => "AudioSingle",
            Profile::Video => "Video",
            Profile::Mixed => "Mixed",
            Profile::Classical => "Classical",
            Profile::Ringtone => "Ringtone",
            Profile::Dj => "DJ",
            Profile::ReleaseByRelease => "ReleaseByRelease",
        }
    }

    /// Parses a profile name, returning `None` for names outside the catalogue.
    pub fn parse(name: &str) -> Option<Profile> {
        match name.trim() {
            "AudioAlbum" => Some(Profile::AudioAlbum),
            "AudioSingle" => Some(Profile::AudioSingle),
            "Video" => Some(Profile::Video),
            "Mixed" => Some(Profile::Mixed),
            "Classical" => Some(Profile::Classical),
            "Ringtone" => Some(Profile::Ringtone),
            "DJ" | "Dj" => Some(Profile::Dj),
            "ReleaseByRelease" => Some(Profile::ReleaseByRelease),
            _ => None,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the supported-formats listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatEntry {
    pub version: ErnVersion,
    pub namespace: &'static str,
    pub profiles: Vec<&'static str>,
    pub recommended: bool,
}

/// Lists every supported version with its profiles.
pub fn formats() -> Vec<FormatEntry> {
    ErnVersion::ALL
        .iter()
        .rev()
        .map(|v| FormatEntry {
            version: *v,
            namespace: v.namespace_uri(),
            profiles: v.profiles().iter().map(Profile::as_str).collect(),
            recommended: v.is_recommended(),
        })
        .collect()
}
