#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use ern_validate::schema_registry::sha256_hex;
use ern_validate::version::MAIN_SCHEMA_FILE;
use ern_validate::{
    ErnVersion, Finding, Orchestrator, OrchestratorOptions, RegistryConfig, SchemaRegistry,
};
use tempfile::TempDir;

/// Accepts any ERN message whose first child is `MessageHeader`; the language code is typed
/// through the allowed-value-set import.
const MAIN_XSD: &str = r###"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:avs="http://ddex.net/xml/avs/avs" targetNamespace="{namespace}">
  <xs:import namespace="http://ddex.net/xml/avs/avs" schemaLocation="http://ddex.net/xml/avs/avs.xsd"/>
  <xs:element name="NewReleaseMessage">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="MessageHeader" type="xs:anyType"/>
        <xs:any namespace="##local" processContents="skip" minOccurs="0" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="LanguageAndScriptCode" type="avs:LanguageCode"/>
      <xs:anyAttribute processContents="skip"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"###;

const AVS_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="http://ddex.net/xml/avs/avs">
  <xs:simpleType name="LanguageCode">
    <xs:restriction base="xs:string">
      <xs:pattern value="[a-z]{2}"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

pub fn main_xsd(version: ErnVersion) -> String {
    MAIN_XSD.replace("{namespace}", version.namespace_uri())
}

/// Writes both schema files of `version`, with `.sha256` sidecars when `sidecars` is set.
pub fn write_schemas(root: &Path, version: ErnVersion, sidecars: bool) {
    let dir = root.join(version.as_str());
    std::fs::create_dir_all(&dir).unwrap();
    let main = main_xsd(version);
    for (name, content) in [(MAIN_SCHEMA_FILE, main.as_str()), (version.avs_file(), AVS_XSD)] {
        std::fs::write(dir.join(name), content).unwrap();
        if sidecars {
            std::fs::write(
                dir.join(format!("{}.sha256", name)),
                format!("{}  {}\n", sha256_hex(content.as_bytes()), name),
            )
            .unwrap();
        }
    }
}

/// A schema root holding every supported version.
pub fn schema_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    for version in ErnVersion::ALL {
        write_schemas(dir.path(), version, true);
    }
    dir
}

pub fn registry(root: &Path) -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new(RegistryConfig {
        directory: root.to_path_buf(),
        ..RegistryConfig::default()
    }))
}

pub fn orchestrator(root: &Path, structural: bool) -> Orchestrator {
    Orchestrator::new(
        registry(root),
        OrchestratorOptions {
            structural,
            max_concurrent_validations: 4,
        },
    )
}

pub fn rule_ids(findings: &[Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.rule.as_str()).collect()
}

pub const VALID_43: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" AvsVersionId="2024" LanguageAndScriptCode="en">
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

pub const MINIMAL_43: &str = r#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/43" AvsVersionId="2024" LanguageAndScriptCode="en">
  <MessageHeader><MessageId>1</MessageId></MessageHeader>
  <ResourceList/>
  <ReleaseList/>
  <DealList/>
</ern:NewReleaseMessage>"#;

pub const VALID_382: &str = r#"<ern:NewReleaseMessage xmlns:ern="http://ddex.net/xml/ern/382" MessageSchemaVersionId="ern/382">
  <MessageHeader>
    <MessageId>MSG-382</MessageId>
    <MessageSender><PartyId>PADPIDA0000000001</PartyId></MessageSender>
    <MessageRecipient><PartyId>PADPIDA0000000002</PartyId></MessageRecipient>
    <MessageCreatedDateTime>2016-10-06T09:00:00</MessageCreatedDateTime>
  </MessageHeader>
  <UpdateIndicator>OriginalMessage</UpdateIndicator>
  <ResourceList>
    <SoundRecording>
      <ResourceReference>A1</ResourceReference>
      <SoundRecordingId><ISRC>GBAYE0601498</ISRC></SoundRecordingId>
      <SoundRecordingDetailsByTerritory><TerritoryCode>Worldwide</TerritoryCode></SoundRecordingDetailsByTerritory>
    </SoundRecording>
  </ResourceList>
  <ReleaseList>
    <Release IsMainRelease="true">
      <ReleaseReference>R0</ReleaseReference>
      <ReleaseResourceReferenceList><ReleaseResourceReference>A1</ReleaseResourceReference></ReleaseResourceReferenceList>
      <ReleaseDetailsByTerritory>
        <TerritoryCode>Worldwide</TerritoryCode>
        <DisplayArtistName>Artist</DisplayArtistName>
        <Title><TitleText>Song</TitleText></Title>
        <ReleaseType>Single</ReleaseType>
        <ResourceGroup>
          <ResourceGroupContentItem><SequenceNumber>1</SequenceNumber><ReleaseResourceReference>A1</ReleaseResourceReference></ResourceGroupContentItem>
        </ResourceGroup>
      </ReleaseDetailsByTerritory>
    </Release>
  </ReleaseList>
  <DealList>
    <ReleaseDeal>
      <DealReleaseReference>R0</DealReleaseReference>
      <Deal><DealTerms>
        <CommercialModelType>PayAsYouGoModel</CommercialModelType>
        <Usage><UseType>PermanentDownload</UseType></Usage>
        <TerritoryCode>Worldwide</TerritoryCode>
        <ValidityPeriod><StartDate>2016-10-01</StartDate></ValidityPeriod>
      </DealTerms></Deal>
    </ReleaseDeal>
  </DealList>
</ern:NewReleaseMessage>"#;
