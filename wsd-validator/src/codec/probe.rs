use shared::protocol::{
    ACTION_PROBE, DISCOVERY_TO, NVT_TYPE, ONVIF_NETWORK_NS, SOAP_ENVELOPE_NS, WSA_2004_NS,
    WSA_ANONYMOUS, WSD_2005_NS,
};
use uuid::Uuid;

/// An outbound Probe. Built once per run and consumed into exactly one wire message.
#[derive(Debug)]
pub struct ProbeRequest {
    correlation_id: String,
}

impl ProbeRequest {
    pub fn new() -> Self {
        Self {
            correlation_id: format!("uuid:{}", Uuid::new_v4()),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Render the 2005/04 envelope. Returns the MessageID alongside the bytes.
    pub fn into_wire(self) -> (String, Vec<u8>) {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="{SOAP_ENVELOPE_NS}" xmlns:a="{WSA_2004_NS}">
  <s:Header>
    <a:Action s:mustUnderstand="1">{ACTION_PROBE}</a:Action>
    <a:MessageID>{id}</a:MessageID>
    <a:ReplyTo>
      <a:Address>{WSA_ANONYMOUS}</a:Address>
    </a:ReplyTo>
    <a:To s:mustUnderstand="1">{DISCOVERY_TO}</a:To>
  </s:Header>
  <s:Body>
    <Probe xmlns="{WSD_2005_NS}">
      <d:Types xmlns:d="{WSD_2005_NS}" xmlns:dp0="{ONVIF_NETWORK_NS}">dp0:{NVT_TYPE}</d:Types>
    </Probe>
  </s:Body>
</s:Envelope>"#,
            id = self.correlation_id,
        );
        (self.correlation_id, xml.into_bytes())
    }
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a fresh Probe, returning its correlation id and wire bytes.
pub fn build_probe() -> (String, Vec<u8>) {
    let request = ProbeRequest::new();
    tracing::debug!("Building Probe {}", request.correlation_id());
    request.into_wire()
}
