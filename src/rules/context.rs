//! Per-document view shared by every rule of one evaluation.
//!
//! Release, resource and party indices are built once here so that cross-reference
//! rules are lookups rather than document-wide rescans.

use std::collections::{HashMap, HashSet};

use crate::document::{Element, ParsedDocument};
use crate::version::ErnVersion;

const RESOURCE_KINDS_43: &[&str] = &["SoundRecording", "Video", "Image", "Text"];
const RESOURCE_KINDS_42: &[&str] = &[
    "SoundRecording",
    "Video",
    "Image",
    "Text",
    "SheetMusic",
    "Software",
];
const RESOURCE_KINDS_382: &[&str] = &["SoundRecording", "Video", "Image", "Text", "SheetMusic"];

/// Resource element names for a version.
pub fn resource_kinds(version: ErnVersion) -> &'static [&'static str] {
    match version {
        ErnVersion::V43 => RESOURCE_KINDS_43,
        ErnVersion::V42 => RESOURCE_KINDS_42,
        ErnVersion::V382 => RESOURCE_KINDS_382,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReleaseEntry<'a> {
    pub element: &'a Element,
    pub is_track_release: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceEntry<'a> {
    pub kind: &'static str,
    pub element: &'a Element,
}

pub struct RuleContext<'a> {
    root: &'a Element,
    version: ErnVersion,
    releases: Vec<ReleaseEntry<'a>>,
    resources: Vec<ResourceEntry<'a>>,
    releases_by_reference: HashMap<&'a str, &'a Element>,
    resource_references: HashSet<&'a str>,
    party_ids: HashSet<&'a str>,
}

impl<'a> RuleContext<'a> {
    pub fn new(doc: &'a ParsedDocument, version: ErnVersion) -> Self {
        let root = doc.root();

        let mut releases = Vec::new();
        if let Some(list) = root.child("ReleaseList") {
            releases.extend(list.children("Release").iter().map(|element| ReleaseEntry {
                element,
                is_track_release: false,
            }));
            // 3.8.2 has no TrackRelease
            if version.is_4x() {
                releases.extend(list.children("TrackRelease").iter().map(|element| {
                    ReleaseEntry {
                        element,
                        is_track_release: true,
                    }
                }));
            }
        }

        let mut resources = Vec::new();
        if let Some(list) = root.child("ResourceList") {
            for &kind in resource_kinds(version) {
                resources.extend(
                    list.children(kind)
                        .iter()
                        .map(|element| ResourceEntry { kind, element }),
                );
            }
        }

        let releases_by_reference = releases
            .iter()
            .filter_map(|r| release_reference(r.element).map(|id| (id, r.element)))
            .collect();

        let resource_references = resources
            .iter()
            .filter_map(|r| r.element.value_of("ResourceReference"))
            .collect();

        let mut party_ids = HashSet::new();
        if let Some(list) = root.child("PartyList") {
            for party in list.children("Party") {
                party_ids.extend(party.values_of("PartyReference"));
                for id in party.children("PartyId") {
                    party_ids.extend(id.text());
                    for (_, field) in id.fields() {
                        party_ids.extend(field.as_slice().iter().filter_map(Element::text));
                    }
                }
            }
        }

        RuleContext {
            root,
            version,
            releases,
            resources,
            releases_by_reference,
            resource_references,
            party_ids,
        }
    }

    pub fn root(&self) -> &'a Element {
        self.root
    }

    pub fn version(&self) -> ErnVersion {
        self.version
    }

    /// `Release` entries followed by `TrackRelease` entries (4.x only).
    pub fn releases(&self) -> &[ReleaseEntry<'a>] {
        &self.releases
    }

    pub fn release_elements(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.releases.iter().map(|r| r.element)
    }

    /// Every `Release`, excluding track releases.
    pub fn main_releases(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.releases
            .iter()
            .filter(|r| !r.is_track_release)
            .map(|r| r.element)
    }

    pub fn track_releases(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.releases
            .iter()
            .filter(|r| r.is_track_release)
            .map(|r| r.element)
    }

    /// Releases flagged `IsMainRelease="true"`; when no release carries the flag,
    /// every non-track `Release`.
    pub fn flagged_main_releases(&self) -> Vec<&'a Element> {
        let flagged: Vec<&'a Element> = self
            .main_releases()
            .filter(|r| is_flagged_main(r))
            .collect();
        if flagged.is_empty() && self.main_releases().all(|r| r.attribute("IsMainRelease").is_none())
        {
            self.main_releases().collect()
        } else {
            flagged
        }
    }

    pub fn resources(&self) -> &[ResourceEntry<'a>] {
        &self.resources
    }

    pub fn resources_of(&self, kind: &'static str) -> impl Iterator<Item = &'a Element> + '_ {
        self.resources
            .iter()
            .filter(move |r| r.kind == kind)
            .map(|r| r.element)
    }

    pub fn release_deals(&self) -> &'a [Element] {
        self.root
            .child("DealList")
            .map(|list| list.children("ReleaseDeal"))
            .unwrap_or(&[])
    }

    pub fn deals(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.release_deals().iter().flat_map(|rd| rd.children("Deal"))
    }

    pub fn deal_terms(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.deals().flat_map(|d| d.children("DealTerms"))
    }

    pub fn has_party_list(&self) -> bool {
        self.root.has("PartyList")
    }

    pub fn has_party(&self, id: &str) -> bool {
        self.party_ids.contains(id)
    }

    pub fn has_resource(&self, reference: &str) -> bool {
        self.resource_references.contains(reference)
    }

    pub fn release_by_reference(&self, reference: &str) -> Option<&'a Element> {
        self.releases_by_reference.get(reference).copied()
    }
}

/// `ReleaseReference` child text, or the attribute form used by some 3.8.2 senders.
pub fn release_reference(release: &Element) -> Option<&str> {
    release
        .value_of("ReleaseReference")
        .or_else(|| release.attribute("ReleaseReference"))
}

pub fn is_flagged_main(release: &Element) -> bool {
    release.attribute("IsMainRelease") == Some("true")
}

/// `UseType` entries of a deal-terms block, direct or under `Usage`.
pub fn use_types(deal_terms: &Element) -> impl Iterator<Item = &Element> {
    deal_terms.children("UseType").iter().chain(
        deal_terms
            .children("Usage")
            .iter()
            .flat_map(|usage| usage.children("UseType")),
    )
}

/// First `YYYY-MM-DD` prefix of a date or date-time value.
pub fn date_prefix(value: &str) -> Option<chrono::NaiveDate> {
    let prefix = value.get(..10)?;
    chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;

    const DOC: &str = r#"<NewReleaseMessage>
  <PartyList>
    <Party><PartyReference>P1</PartyReference><PartyId><DPID>PADPIDA0001</DPID></PartyId></Party>
  </PartyList>
  <ResourceList>
    <SoundRecording><ResourceReference>A1</ResourceReference></SoundRecording>
    <Image><ResourceReference>A2</ResourceReference></Image>
  </ResourceList>
  <ReleaseList>
    <Release><ReleaseReference>R0</ReleaseReference></Release>
    <TrackRelease><ReleaseReference>R1</ReleaseReference></TrackRelease>
  </ReleaseList>
  <DealList>
    <ReleaseDeal>
      <Deal><DealTerms><UseType>Stream</UseType></DealTerms></Deal>
      <Deal><DealTerms><Usage><UseType>OnDemandStream</UseType></Usage></DealTerms></Deal>
    </ReleaseDeal>
  </DealList>
</NewReleaseMessage>"#;

    #[test]
    fn test_indices() {
        let doc = parse(DOC.as_bytes()).unwrap();
        let ctx = RuleContext::new(&doc, ErnVersion::V43);

        assert_eq!(ctx.releases().len(), 2);
        assert_eq!(ctx.main_releases().count(), 1);
        assert_eq!(ctx.track_releases().count(), 1);
        assert!(ctx.release_by_reference("R1").is_some());
        assert!(ctx.has_resource("A2"));
        assert!(!ctx.has_resource("A3"));
        assert!(ctx.has_party("P1"));
        assert!(ctx.has_party("PADPIDA0001"));
        assert_eq!(ctx.resources_of("SoundRecording").count(), 1);
    }

    #[test]
    fn test_track_releases_ignored_for_382() {
        let doc = parse(DOC.as_bytes()).unwrap();
        let ctx = RuleContext::new(&doc, ErnVersion::V382);
        assert_eq!(ctx.releases().len(), 1);
    }

    #[test]
    fn test_use_types_cover_both_layouts() {
        let doc = parse(DOC.as_bytes()).unwrap();
        let ctx = RuleContext::new(&doc, ErnVersion::V43);
        let values: Vec<&str> = ctx
            .deal_terms()
            .flat_map(use_types)
            .filter_map(Element::text)
            .collect();
        assert_eq!(values, vec!["Stream", "OnDemandStream"]);
    }

    #[test]
    fn test_flagged_main_release_fallback() {
        let doc = parse(DOC.as_bytes()).unwrap();
        let ctx = RuleContext::new(&doc, ErnVersion::V43);
        assert_eq!(ctx.flagged_main_releases().len(), 1);

        let flagged = parse(
            br#"<NewReleaseMessage><ReleaseList>
                <Release IsMainRelease="false"><ReleaseReference>R0</ReleaseReference></Release>
                <Release IsMainRelease="false"><ReleaseReference>R1</ReleaseReference></Release>
            </ReleaseList></NewReleaseMessage>"#,
        )
        .unwrap();
        let ctx = RuleContext::new(&flagged, ErnVersion::V382);
        assert!(ctx.flagged_main_releases().is_empty());
    }

    #[test]
    fn test_date_prefix() {
        assert_eq!(
            date_prefix("2024-03-01T00:00:00Z"),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(date_prefix("2024"), None);
        assert_eq!(date_prefix("not-a-date"), None);
    }
}
