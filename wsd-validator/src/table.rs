use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use shared::types::{DiscoveredDevice, MessageKind};

/// What the result table did with an offered device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted { key: String, kind: MessageKind },
    Duplicate { key: String },
    /// A ProbeMatch answering someone else's Probe
    CorrelationMismatch { expected: String, got: Option<String> },
    /// Hello received while Hello collection was off
    HelloNotRequested,
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Admission::Accepted { key, kind } => write!(f, "Found {}: {}", kind, key),
            Admission::Duplicate { key } => write!(f, "Already discovered: {}", key),
            Admission::CorrelationMismatch { expected, got } => write!(
                f,
                "ProbeMatch RelatesTo mismatch: expected {}, got {}",
                expected,
                got.as_deref().unwrap_or("none")
            ),
            Admission::HelloNotRequested => f.write_str("Skipping Hello (Hello collection disabled)"),
        }
    }
}

/// Accepted devices for one run, keyed by dedup key. First record per key wins.
#[derive(Debug)]
pub struct ResultTable {
    correlation_id: String,
    include_hello: bool,
    devices: BTreeMap<String, DiscoveredDevice>,
}

impl ResultTable {
    pub fn new(correlation_id: impl Into<String>, include_hello: bool) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            include_hello,
            devices: BTreeMap::new(),
        }
    }

    /// Apply the acceptance policy and merge `device` if it passes.
    pub fn offer(&mut self, device: DiscoveredDevice) -> Admission {
        match device.message_kind {
            MessageKind::ProbeMatch => {
                if device.correlates_to.as_deref() != Some(self.correlation_id.as_str()) {
                    return Admission::CorrelationMismatch {
                        expected: self.correlation_id.clone(),
                        got: device.correlates_to,
                    };
                }
            }
            MessageKind::Hello => {
                if !self.include_hello {
                    return Admission::HelloNotRequested;
                }
            }
        }

        let key = device.dedup_key();
        match self.devices.entry(key) {
            Entry::Occupied(entry) => Admission::Duplicate { key: entry.key().clone() },
            Entry::Vacant(entry) => {
                let kind = device.message_kind;
                let key = entry.key().clone();
                entry.insert(device);
                Admission::Accepted { key, kind }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn into_devices(self) -> BTreeMap<String, DiscoveredDevice> {
        self.devices
    }
}
