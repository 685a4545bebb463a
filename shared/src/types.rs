use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// Which WS-Discovery message a device record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Directed reply to our Probe
    ProbeMatch,
    /// Unsolicited announcement
    Hello,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::ProbeMatch => f.write_str("ProbeMatch"),
            MessageKind::Hello => f.write_str("Hello"),
        }
    }
}

/// A device extracted from one inbound WS-Discovery datagram.
/// This is the canonical record used by the codec, the session, and the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Endpoint reference address, e.g. "urn:uuid:...". Empty if the device omitted it.
    pub endpoint_identity: String,

    /// XAddrs in wire order
    pub service_addresses: Vec<String>,

    /// Advertised types, e.g. "dn:NetworkVideoTransmitter"
    pub device_types: BTreeSet<String>,

    /// Advertised scopes, e.g. "onvif://www.onvif.org/name/cam1"
    pub scopes: BTreeSet<String>,

    pub metadata_version: Option<u32>,

    /// Network origin of the datagram
    pub source_address: IpAddr,
    pub source_port: u16,

    /// Time from Probe transmission to receipt
    #[serde(rename = "response_time_ms", with = "crate::duration::millis")]
    pub response_latency: Duration,

    /// Wall-clock receipt time
    pub received_at: DateTime<Utc>,

    pub message_kind: MessageKind,

    /// RelatesTo header, ProbeMatch only
    pub correlates_to: Option<String>,
}

impl DiscoveredDevice {
    /// Key used to collapse repeated responses from one device.
    ///
    /// The device's own identity when it reported one, its network origin otherwise.
    pub fn dedup_key(&self) -> String {
        if self.endpoint_identity.is_empty() {
            format!("{}:{}", self.source_address, self.source_port)
        } else {
            self.endpoint_identity.clone()
        }
    }
}

/// Outcome of a single discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// True iff at least one device was accepted
    pub succeeded: bool,

    /// Human readable summary
    pub message: String,

    /// MessageID of the Probe sent by this run. Empty if setup failed first.
    pub correlation_id: String,

    /// Accepted devices keyed by dedup key
    pub devices: BTreeMap<String, DiscoveredDevice>,

    pub total_devices: usize,

    #[serde(rename = "elapsed_time_seconds", with = "crate::duration::seconds")]
    pub elapsed: Duration,

    /// Setup failure or accumulated receive errors
    pub errors: Vec<String>,
}
