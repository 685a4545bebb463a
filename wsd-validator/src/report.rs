use std::collections::BTreeMap;
use std::time::Duration;
use shared::types::{DiscoveredDevice, DiscoveryReport};

/// Report for a run that reached the end of its listen window.
pub fn assemble(
    correlation_id: String,
    devices: BTreeMap<String, DiscoveredDevice>,
    elapsed: Duration,
    errors: Vec<String>,
) -> DiscoveryReport {
    let total_devices = devices.len();
    let message = if total_devices > 0 {
        format!("Discovered {} ONVIF device(s)", total_devices)
    } else {
        "No ONVIF devices discovered".to_string()
    };

    DiscoveryReport {
        succeeded: total_devices > 0,
        message,
        correlation_id,
        devices,
        total_devices,
        elapsed,
        errors,
    }
}

/// Report for a run aborted before it could listen.
pub fn failed(correlation_id: String, elapsed: Duration, error: String) -> DiscoveryReport {
    DiscoveryReport {
        succeeded: false,
        message: format!("Discovery failed: {}", error),
        correlation_id,
        devices: BTreeMap::new(),
        total_devices: 0,
        elapsed,
        errors: vec![error],
    }
}
