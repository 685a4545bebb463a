//! Canned device responses shared by the codec and session tests.

use super::profile::NamespaceProfile;
use shared::protocol::{ONVIF_NETWORK_NS, SOAP_ENVELOPE_NS};

pub struct Response<'a> {
    pub profile: NamespaceProfile,
    pub relates_to: Option<&'a str>,
    pub address: &'a str,
    pub xaddrs: &'a str,
    pub scopes: &'a str,
    pub metadata_version: &'a str,
}

impl<'a> Response<'a> {
    pub fn new(profile: NamespaceProfile, address: &'a str, xaddrs: &'a str) -> Self {
        Self {
            profile,
            relates_to: None,
            address,
            xaddrs,
            scopes: "onvif://www.onvif.org/type/video_encoder onvif://www.onvif.org/name/cam1",
            metadata_version: "1",
        }
    }

    pub fn relates_to(mut self, id: &'a str) -> Self {
        self.relates_to = Some(id);
        self
    }

    fn body(&self) -> String {
        format!(
            r#"<a:EndpointReference><a:Address>{address}</a:Address></a:EndpointReference>
        <d:Types>dn:NetworkVideoTransmitter</d:Types>
        <d:Scopes>{scopes}</d:Scopes>
        <d:XAddrs>{xaddrs}</d:XAddrs>
        <d:MetadataVersion>{version}</d:MetadataVersion>"#,
            address = self.address,
            scopes = self.scopes,
            xaddrs = self.xaddrs,
            version = self.metadata_version,
        )
    }

    fn envelope(&self, action: &str, relates_to: &str, body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="{SOAP_ENVELOPE_NS}" xmlns:a="{wsa}" xmlns:d="{wsd}" xmlns:dn="{ONVIF_NETWORK_NS}">
  <s:Header>
    <a:MessageID>urn:uuid:7f0c1d8e-reply</a:MessageID>
    {relates_to}
    <a:Action>{action}</a:Action>
  </s:Header>
  <s:Body>{body}</s:Body>
</s:Envelope>"#,
            wsa = self.profile.addressing,
            wsd = self.profile.discovery,
        )
        .into_bytes()
    }

    pub fn probe_match(&self) -> Vec<u8> {
        let relates_to = self
            .relates_to
            .map(|id| format!("<a:RelatesTo>{id}</a:RelatesTo>"))
            .unwrap_or_default();
        let action = format!("{}/ProbeMatches", self.profile.discovery);
        let body = format!(
            "<d:ProbeMatches><d:ProbeMatch>{}</d:ProbeMatch></d:ProbeMatches>",
            self.body()
        );
        self.envelope(&action, &relates_to, &body)
    }

    pub fn hello(&self) -> Vec<u8> {
        let action = format!("{}/Hello", self.profile.discovery);
        let body = format!("<d:Hello>{}</d:Hello>", self.body());
        self.envelope(&action, "", &body)
    }
}

/// Extract the MessageID from a Probe, as a responder would.
pub fn message_id_of(probe: &[u8]) -> String {
    let xml = std::str::from_utf8(probe).unwrap();
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.descendants()
        .find(|n| n.tag_name().name() == "MessageID")
        .and_then(|n| n.text())
        .unwrap()
        .to_string()
}
