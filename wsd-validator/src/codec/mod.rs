//! WS-Discovery message codec: Probe construction and ProbeMatch/Hello parsing.

pub mod probe;
pub mod profile;
pub mod response;

#[cfg(test)]
pub mod fixtures;

pub use probe::build_probe;
pub use response::{parse_response, NotRecognized};
