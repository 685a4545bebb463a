use std::fmt;
use std::net::SocketAddr;
use crate::codec::NotRecognized;
use crate::table::Admission;

/// Lifecycle of a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Listening,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Sending => "sending",
            SessionState::Listening => "listening",
            SessionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Something observable that happened during a session.
/// Borrowed payloads keep recording cheap when nobody looks at them.
#[derive(Debug)]
pub enum DiagnosticEvent<'a> {
    StateChanged(SessionState),
    SetupFailed(&'a str),
    SocketReady { local: SocketAddr },
    ProbeSent { correlation_id: &'a str, target: SocketAddr, payload: &'a [u8] },
    Datagram { from: SocketAddr, payload: &'a [u8] },
    NotRecognized { from: SocketAddr, reason: &'a NotRecognized },
    Admission { from: SocketAddr, admission: &'a Admission },
    ReceiveError(&'a str),
    Cancelled,
}

/// Receiver of session diagnostics. Injected into the session; never consulted
/// for control flow.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent<'_>);
}

/// One-line summary; payload bytes are counted, not printed.
impl fmt::Display for DiagnosticEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::StateChanged(state) => write!(f, "Session {}", state),
            DiagnosticEvent::SetupFailed(error) => write!(f, "Discovery setup failed: {}", error),
            DiagnosticEvent::SocketReady { local } => write!(f, "Socket bound to {}", local),
            DiagnosticEvent::ProbeSent { correlation_id, target, payload } => {
                write!(f, "Sent Probe {} to {} ({} bytes)", correlation_id, target, payload.len())
            }
            DiagnosticEvent::Datagram { from, payload } => {
                write!(f, "Received {} bytes from {}", payload.len(), from)
            }
            DiagnosticEvent::NotRecognized { from, reason } => {
                write!(f, "Ignoring datagram from {}: {}", from, reason)
            }
            DiagnosticEvent::Admission { from, admission } => write!(f, "{} from {}", admission, from),
            // Session already prefixes receive errors
            DiagnosticEvent::ReceiveError(error) => f.write_str(error),
            DiagnosticEvent::Cancelled => f.write_str("Discovery cancelled before deadline"),
        }
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: DiagnosticEvent<'_>) {
        match &event {
            DiagnosticEvent::SetupFailed(_) => tracing::error!("{}", event),
            DiagnosticEvent::ReceiveError(_) => tracing::warn!("{}", event),
            DiagnosticEvent::ProbeSent { payload, .. } => {
                tracing::info!("{}", event);
                tracing::debug!("Probe payload:\n{}", String::from_utf8_lossy(payload));
            }
            DiagnosticEvent::Datagram { payload, .. } => {
                tracing::debug!("{}", event);
                tracing::debug!("Raw response:\n{}", String::from_utf8_lossy(payload));
            }
            DiagnosticEvent::Admission { admission: Admission::Accepted { .. }, .. }
            | DiagnosticEvent::Cancelled => tracing::info!("{}", event),
            _ => tracing::debug!("{}", event),
        }
    }
}
