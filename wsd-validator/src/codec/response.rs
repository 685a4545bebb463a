use std::borrow::Cow;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::time::Instant;
use chrono::Utc;
use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node};
use shared::protocol::{ACTION_HELLO_MARKER, ACTION_PROBE_MATCHES_MARKER};
use shared::types::{DiscoveredDevice, MessageKind};
use thiserror::Error;
use super::profile::{self, Field, NamespaceProfile};

/// Why a datagram did not yield a device record. Never fatal to a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotRecognized {
    #[error("datagram is not valid {0}")]
    Encoding(&'static str),
    #[error("XML parse error: {0}")]
    Malformed(String),
    #[error("no Action header in any known namespace")]
    MissingAction,
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("no {0} element in response")]
    MissingBody(MessageKind),
}

fn classify(action: &str) -> Option<MessageKind> {
    if action.contains(ACTION_PROBE_MATCHES_MARKER) {
        Some(MessageKind::ProbeMatch)
    } else if action.contains(ACTION_HELLO_MARKER) {
        Some(MessageKind::Hello)
    } else {
        None
    }
}

fn trimmed_text<'a>(node: Option<Node<'a, '_>>) -> Option<&'a str> {
    node.and_then(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn tokens<'a>(node: Option<Node<'a, '_>>) -> impl Iterator<Item = String> + 'a {
    trimmed_text(node)
        .into_iter()
        .flat_map(str::split_whitespace)
        .map(str::to_owned)
}

/// Encoding named by a leading `<?xml ... encoding="..."?>` declaration.
fn declared_encoding(data: &[u8]) -> Option<&'static Encoding> {
    if !data.starts_with(b"<?xml") {
        return None;
    }
    let end = data.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&data[..end]).ok()?;
    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let label = rest[1..].split(quote).next()?;
    Encoding::for_label(label.trim().as_bytes())
}

/// Decode a datagram the way an XML processor would: byte order mark first,
/// then the declared encoding, then UTF-8.
fn decode(data: &[u8]) -> Result<Cow<'_, str>, NotRecognized> {
    let (encoding, body) = match Encoding::for_bom(data) {
        Some((encoding, bom_len)) => (encoding, &data[bom_len..]),
        None => (declared_encoding(data).unwrap_or(UTF_8), data),
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(NotRecognized::Encoding(encoding.name()));
    }
    Ok(text)
}

/// Drop the XML declaration; its encoding label no longer describes the decoded text.
fn strip_declaration(text: &str) -> &str {
    match text.strip_prefix("<?xml") {
        Some(rest) if rest.starts_with(char::is_whitespace) => {
            rest.split_once("?>").map_or(text, |(_, body)| body)
        }
        _ => text,
    }
}

/// Parse a ProbeMatch or Hello datagram into a device record.
///
/// The Action header fixes the active namespace profile; every other element is
/// looked up under that profile first and then under the raw URIs of both known
/// profiles, so devices mixing 2005/04 and 2009/01 vocabulary still parse.
pub fn parse_response(
    data: &[u8],
    source: SocketAddr,
    sent_at: Instant,
) -> Result<DiscoveredDevice, NotRecognized> {
    let response_latency = sent_at.elapsed();

    let text = decode(data)?;
    let doc = Document::parse(strip_declaration(&text)).map_err(|e| NotRecognized::Malformed(e.to_string()))?;
    let root = doc.root_element();

    let (active, action_node) = profile::locate_action(root).ok_or(NotRecognized::MissingAction)?;
    let action = action_node.text().map(str::trim).unwrap_or_default();
    tracing::trace!("Action {} under {} profile", action, active.label);

    let message_kind =
        classify(action).ok_or_else(|| NotRecognized::UnknownAction(action.to_string()))?;
    let body_field = match message_kind {
        MessageKind::ProbeMatch => Field::ProbeMatch,
        MessageKind::Hello => Field::Hello,
    };
    let body = profile::find(root, active, body_field)
        .ok_or(NotRecognized::MissingBody(message_kind))?;

    let correlates_to = match message_kind {
        MessageKind::ProbeMatch => {
            trimmed_text(profile::find(root, active, Field::RelatesTo)).map(str::to_owned)
        }
        MessageKind::Hello => None,
    };

    Ok(DiscoveredDevice {
        endpoint_identity: extract_text(body, active, Field::EndpointAddress),
        service_addresses: tokens(profile::find(body, active, Field::XAddrs)).collect(),
        device_types: extract_set(body, active, Field::Types),
        scopes: extract_set(body, active, Field::Scopes),
        metadata_version: trimmed_text(profile::find(body, active, Field::MetadataVersion))
            .and_then(|v| v.parse().ok()),
        source_address: source.ip(),
        source_port: source.port(),
        response_latency,
        received_at: Utc::now(),
        message_kind,
        correlates_to,
    })
}

fn extract_text(scope: Node, active: NamespaceProfile, field: Field) -> String {
    trimmed_text(profile::find(scope, active, field))
        .unwrap_or_default()
        .to_string()
}

fn extract_set(scope: Node, active: NamespaceProfile, field: Field) -> BTreeSet<String> {
    tokens(profile::find(scope, active, field)).collect()
}
