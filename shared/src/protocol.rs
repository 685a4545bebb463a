use std::net::Ipv4Addr;

/// WS-Discovery multicast group and port
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
pub const DISCOVERY_PORT: u16 = 3702;

/// Probes stay on the local segment
pub const MULTICAST_TTL: u32 = 1;

pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// WS-Addressing as used by the 2005/04 discovery profile
pub const WSA_2004_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
/// WS-Addressing as used by the 2009/01 discovery profile
pub const WSA_2005_NS: &str = "http://www.w3.org/2005/08/addressing";

pub const WSD_2005_NS: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery";
pub const WSD_2009_NS: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01";

pub const ONVIF_NETWORK_NS: &str = "http://www.onvif.org/ver10/network/wsdl";

/// Device type every Probe narrows the search to
pub const NVT_TYPE: &str = "NetworkVideoTransmitter";

/// Probe header values (2005/04 profile only, for compatibility)
pub const ACTION_PROBE: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe";
pub const DISCOVERY_TO: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";
pub const WSA_ANONYMOUS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Action substrings used to classify inbound messages
pub const ACTION_PROBE_MATCHES_MARKER: &str = "ProbeMatches";
pub const ACTION_HELLO_MARKER: &str = "Hello";
