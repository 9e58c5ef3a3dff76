//! Document canonicalization.
//!
//! Raw XML is parsed with `roxmltree` and copied into an owned tree whose shape does
//! not depend on how many instances of an element a particular document happens to
//! carry. Every element name listed in [`REPEATABLE_ELEMENTS`] is stored as an ordered
//! sequence, every other name as an optional scalar. Attributes live in their own map,
//! so an attribute and a child element with the same local name never collide.
//!
//! The parser fails closed: DTDs are rejected, invalid UTF-8 and truncated input are
//! reported as [`ValidationError::Wellformedness`], and nesting deeper than
//! [`MAX_DEPTH`] is refused instead of recursing without bound.

use std::collections::BTreeMap;

use crate::error::{Result, ValidationError};

/// Maximum element nesting accepted by the canonicalizer.
pub const MAX_DEPTH: usize = 512;

/// Sentinel value skipped by [`Element::value_of`] when a concrete entry exists.
pub const USER_DEFINED: &str = "UserDefined";

/// Element names that may repeat anywhere in the ERN 3.8.2, 4.2 or 4.3 grammars.
///
/// Kept sorted; lookups use binary search.
pub const REPEATABLE_ELEMENTS: &[&str] = &[
    "ArtistRole",
    "CLine",
    "CommercialModelType",
    "Contributor",
    "Deal",
    "DealReleaseReference",
    "DealTerms",
    "DisplayArtist",
    "DisplayArtistName",
    "DisplayTitle",
    "DisplayTitleText",
    "ExcludedTerritoryCode",
    "Genre",
    "ISNI",
    "Image",
    "ImageDetailsByTerritory",
    "IndirectContributor",
    "IndirectResourceContributor",
    "IndirectResourceContributorRole",
    "Keywords",
    "MessageRecipient",
    "PLine",
    "ParentalWarningType",
    "Party",
    "PartyId",
    "PartyName",
    "ProprietaryId",
    "RelatedRelease",
    "RelatedResource",
    "Release",
    "ReleaseDeal",
    "ReleaseDetailsByTerritory",
    "ReleaseId",
    "ReleaseResourceReference",
    "ReleaseType",
    "ResourceContributor",
    "ResourceContributorRole",
    "ResourceGroup",
    "ResourceGroupContentItem",
    "ResourceId",
    "Role",
    "SheetMusic",
    "SheetMusicDetailsByTerritory",
    "Software",
    "SoftwareDetailsByTerritory",
    "SoundRecording",
    "SoundRecordingDetailsByTerritory",
    "SoundRecordingId",
    "Synopsis",
    "TechnicalDetails",
    "TechnicalImageDetails",
    "TechnicalSoundRecordingDetails",
    "TechnicalVideoDetails",
    "TerritoryCode",
    "Text",
    "TextDetailsByTerritory",
    "Title",
    "TrackRelease",
    "Usage",
    "UseType",
    "ValidityPeriod",
    "Video",
    "VideoDetailsByTerritory",
    "VideoId",
];

/// Whether an element name is exposed as a sequence.
pub fn is_repeatable(name: &str) -> bool {
    REPEATABLE_ELEMENTS.binary_search(&name).is_ok()
}

/// 1-based line and column of an element's start tag. Orders by line, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Storage slot for the children sharing one local name.
#[derive(Debug, Clone)]
pub enum Field {
    Scalar(Element),
    Sequence(Vec<Element>),
}

impl Field {
    pub fn as_slice(&self) -> &[Element] {
        match self {
            Field::Scalar(element) => std::slice::from_ref(element),
            Field::Sequence(elements) => elements,
        }
    }
}

/// One canonical element.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    position: Position,
    attributes: BTreeMap<String, String>,
    fields: BTreeMap<String, Field>,
    text: Option<String>,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Attribute without a namespace, by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Namespaced attribute, stored under its `{uri}local` key.
    pub fn attribute_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .get(&format!("{{{}}}{}", namespace, name))
            .map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Scalar accessor. For a repeatable name this is the first entry.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.fields.get(name).and_then(|f| f.as_slice().first())
    }

    /// Sequence accessor; empty when the element is absent.
    pub fn children(&self, name: &str) -> &[Element] {
        self.fields.get(name).map(Field::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Follows a chain of scalar accessors.
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names
            .iter()
            .try_fold(self, |element, name| element.child(name))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Resolves the value of a possibly multi-valued child field.
    ///
    /// Returns the text of the first entry that is not `UserDefined`, falling
    /// back to the first entry when every entry is `UserDefined`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        let entries = self.children(name);
        entries
            .iter()
            .find(|e| e.text() != Some(USER_DEFINED))
            .or_else(|| entries.first())
            .and_then(Element::text)
    }

    /// Texts of every entry of a child field, skipping empty ones.
    pub fn values_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.children(name).iter().filter_map(Element::text)
    }

    /// All descendants (excluding `self`) with the given local name, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut stack: Vec<&Element> = vec![self];
        while let Some(element) = stack.pop() {
            for (field_name, field) in &element.fields {
                if field_name == name {
                    found.extend(field.as_slice());
                }
                stack.extend(field.as_slice());
            }
        }
        // Children are stored grouped by name, not in source order
        found.sort_by_key(|element| element.position);
        found
    }
}

/// Canonical representation of one input message.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    root: Element,
}

impl ParsedDocument {
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// `MessageHeader/MessageId`, when present.
    pub fn message_id(&self) -> Option<&str> {
        self.root
            .path(&["MessageHeader", "MessageId"])
            .and_then(Element::text)
    }
}

/// Parses raw bytes into a [`ParsedDocument`].
pub fn parse(input: &[u8]) -> Result<ParsedDocument> {
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let text = std::str::from_utf8(input).map_err(|e| {
        let valid = &input[..e.valid_up_to()];
        let prefix = String::from_utf8_lossy(valid);
        let index = LineIndex::new(&prefix);
        let position = index.position(&prefix, prefix.len());
        ValidationError::Wellformedness {
            line: position.line,
            column: position.column,
            message: format!("invalid UTF-8 sequence at byte {}", e.valid_up_to()),
        }
    })?;

    let options = roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    };
    let tree = roxmltree::Document::parse_with_options(text, options).map_err(|e| {
        let pos = e.pos();
        ValidationError::Wellformedness {
            line: pos.row,
            column: pos.col,
            message: e.to_string(),
        }
    })?;

    let index = LineIndex::new(text);
    let root = convert(tree.root_element(), text, &index, 0)?;
    Ok(ParsedDocument { root })
}

fn convert(
    node: roxmltree::Node<'_, '_>,
    source: &str,
    index: &LineIndex,
    depth: usize,
) -> Result<Element> {
    let position = index.position(source, node.range().start);
    if depth >= MAX_DEPTH {
        return Err(ValidationError::Wellformedness {
            line: position.line,
            column: position.column,
            message: format!("element nesting exceeds {} levels", MAX_DEPTH),
        });
    }

    let attributes = node
        .attributes()
        .map(|a| {
            let key = match a.namespace() {
                Some(ns) => format!("{{{}}}{}", ns, a.name()),
                None => a.name().to_string(),
            };
            (key, a.value().to_string())
        })
        .collect();

    let mut fields: BTreeMap<String, Field> = BTreeMap::new();
    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let element = convert(child, source, index, depth + 1)?;
            let name = element.name.clone();
            if is_repeatable(&name) {
                match fields.entry(name).or_insert_with(|| Field::Sequence(Vec::new())) {
                    Field::Sequence(items) => items.push(element),
                    Field::Scalar(_) => {}
                }
            } else {
                // A duplicated scalar keeps its first occurrence; the schema stage reports it.
                fields.entry(name).or_insert(Field::Scalar(element));
            }
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }

    let trimmed = text.trim();
    Ok(Element {
        name: node.tag_name().name().to_string(),
        namespace: node.tag_name().namespace().map(str::to_string),
        position,
        attributes,
        fields,
        text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
    })
}

/// Byte offsets of line starts, for O(log n) position lookups.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn position(&self, text: &str, offset: usize) -> Position {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.starts[line];
        let column = text
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        Position {
            line: (line + 1) as u32,
            column: (column + 1) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" LanguageAndScriptCode="en" xsi:schemaLocation="x y">
  <MessageHeader>
    <MessageId>MSG-1</MessageId>
  </MessageHeader>
  <ReleaseList>
    <Release ReleaseReference="attr">
      <ReleaseReference>R0</ReleaseReference>
      <ReleaseType>UserDefined</ReleaseType>
      <ReleaseType>Album</ReleaseType>
    </Release>
  </ReleaseList>
</ern:NewReleaseMessage>"#;

    #[test]
    fn test_repeatable_table_is_sorted() {
        let mut sorted = REPEATABLE_ELEMENTS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, REPEATABLE_ELEMENTS);
    }

    #[test]
    fn test_single_release_is_still_a_sequence() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        let releases = doc.root().child("ReleaseList").unwrap().children("Release");
        assert_eq!(releases.len(), 1);
        assert!(matches!(
            doc.root().child("ReleaseList").unwrap().fields().next(),
            Some(("Release", Field::Sequence(_)))
        ));
    }

    #[test]
    fn test_attribute_and_child_do_not_collide() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        let release = &doc.root().child("ReleaseList").unwrap().children("Release")[0];
        assert_eq!(release.attribute("ReleaseReference"), Some("attr"));
        assert_eq!(
            release.child("ReleaseReference").and_then(Element::text),
            Some("R0")
        );
    }

    #[test]
    fn test_value_of_prefers_concrete_entry() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        let release = &doc.root().child("ReleaseList").unwrap().children("Release")[0];
        assert_eq!(release.value_of("ReleaseType"), Some("Album"));
    }

    #[test]
    fn test_value_of_falls_back_to_first_user_defined() {
        let doc = parse(b"<Root><ReleaseType>UserDefined</ReleaseType></Root>").unwrap();
        assert_eq!(doc.root().value_of("ReleaseType"), Some("UserDefined"));
    }

    #[test]
    fn test_root_namespace_and_positions() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.root().name(), "NewReleaseMessage");
        assert_eq!(doc.root().namespace(), Some("http://ddex.net/xml/ern/43"));
        assert_eq!(doc.root().position(), Position { line: 2, column: 1 });
        let header = doc.root().child("MessageHeader").unwrap();
        assert_eq!(header.position(), Position { line: 3, column: 3 });
        assert_eq!(doc.message_id(), Some("MSG-1"));
    }

    #[test]
    fn test_namespaced_attribute_keyed_separately() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            doc.root()
                .attribute_ns("http://www.w3.org/2001/XMLSchema-instance", "schemaLocation"),
            Some("x y")
        );
        assert_eq!(doc.root().attribute("schemaLocation"), None);
    }

    #[test]
    fn test_empty_input_is_wellformedness_error() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, ValidationError::Wellformedness { .. }));
    }

    #[test]
    fn test_unclosed_tag_reports_position() {
        let err = parse(b"<Root>\n  <Child>\n</Root>").unwrap_err();
        match err {
            ValidationError::Wellformedness { line, .. } => assert!(line >= 2),
            other => panic!("Expected Wellformedness, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = parse(b"<Root>\n\xff</Root>").unwrap_err();
        match err {
            ValidationError::Wellformedness { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("UTF-8"));
            }
            other => panic!("Expected Wellformedness, got {:?}", other),
        }
    }

    #[test]
    fn test_dtd_is_rejected() {
        let input = br#"<?xml version="1.0"?>
<!DOCTYPE lolz [<!ENTITY lol "lol"><!ENTITY lol2 "&lol;&lol;&lol;">]>
<lolz>&lol2;</lolz>"#;
        assert!(parse(input).is_err());
    }

    #[test]
    fn test_excessive_nesting_fails_closed() {
        let depth = MAX_DEPTH + 10;
        let mut input = String::new();
        for _ in 0..depth {
            input.push_str("<a>");
        }
        for _ in 0..depth {
            input.push_str("</a>");
        }
        let err = parse(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ValidationError::Wellformedness { .. }));
    }

    #[test]
    fn test_descendants_collects_nested_groups() {
        let doc = parse(
            b"<R><ResourceGroup><ResourceGroup><SequenceNumber>1</SequenceNumber></ResourceGroup></ResourceGroup></R>",
        )
        .unwrap();
        assert_eq!(doc.root().descendants("ResourceGroup").len(), 2);
        assert_eq!(doc.root().descendants("SequenceNumber").len(), 1);
    }

    #[test]
    fn test_descendants_follow_document_order() {
        let doc = parse(
            b"<R>\n<SoundRecording><ProprietaryId>1</ProprietaryId></SoundRecording>\n<Image><ProprietaryId>2</ProprietaryId><ResourceId><ProprietaryId>3</ProprietaryId></ResourceId></Image>\n<SoundRecording><ProprietaryId>4</ProprietaryId></SoundRecording>\n</R>",
        )
        .unwrap();
        let ids: Vec<&str> = doc
            .root()
            .descendants("ProprietaryId")
            .into_iter()
            .filter_map(Element::text)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);

        let lines: Vec<u32> = doc
            .root()
            .descendants("ProprietaryId")
            .into_iter()
            .map(|e| e.position().line)
            .collect();
        assert_eq!(lines, vec![2, 3, 3, 4]);
    }

    #[test]
    fn test_bom_is_accepted() {
        let doc = parse(b"\xEF\xBB\xBF<Root/>").unwrap();
        assert_eq!(doc.root().name(), "Root");
    }
}
