use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use shared::protocol::{DISCOVERY_PORT, MULTICAST_GROUP};
use shared::types::DiscoveryReport;
use crate::codec;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, SessionState};
use crate::report;
use crate::table::ResultTable;
use crate::transport;

/// Stand-in deadline for timeouts too large to add to an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Parameters of one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Listen window, measured from Probe transmission
    pub timeout: Duration,
    /// Also accept unsolicited Hello announcements
    pub include_hello: bool,
    /// Local interface address; all interfaces when absent
    pub interface: Option<Ipv4Addr>,
    /// Where the Probe is sent
    pub target: SocketAddr,
    pub recv_buffer_size: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            include_hello: false,
            interface: None,
            target: SocketAddr::from((MULTICAST_GROUP, DISCOVERY_PORT)),
            recv_buffer_size: 65535,
        }
    }
}

/// One Probe, one listen window, one report.
pub struct DiscoverySession {
    options: DiscoveryOptions,
    sink: Arc<dyn DiagnosticSink>,
}

impl DiscoverySession {
    pub fn new(options: DiscoveryOptions, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { options, sink }
    }

    fn enter(&self, state: SessionState) {
        self.sink.record(DiagnosticEvent::StateChanged(state));
    }

    /// Open the multicast socket and run discovery on it.
    ///
    /// Socket setup failure is the only way to get a report without listening.
    pub async fn run(&self, cancel: &CancellationToken) -> DiscoveryReport {
        let started = Instant::now();
        self.enter(SessionState::Idle);

        let socket = match transport::open_multicast_socket(self.options.interface, MULTICAST_GROUP) {
            Ok(socket) => socket,
            Err(e) => {
                let error = format!("{:#}", e);
                self.sink.record(DiagnosticEvent::SetupFailed(&error));
                self.enter(SessionState::Completed);
                return report::failed(String::new(), started.elapsed(), error);
            }
        };

        self.run_from(socket, cancel, started).await
    }

    /// Send the Probe from an already bound `socket` and collect responses
    /// until the deadline passes or `cancel` fires. The socket is closed on return.
    pub async fn run_on(&self, socket: UdpSocket, cancel: &CancellationToken) -> DiscoveryReport {
        self.run_from(socket, cancel, Instant::now()).await
    }

    /// `started` is when the run began, so the report's elapsed time includes setup.
    async fn run_from(
        &self,
        socket: UdpSocket,
        cancel: &CancellationToken,
        started: Instant,
    ) -> DiscoveryReport {
        if let Ok(local) = socket.local_addr() {
            self.sink.record(DiagnosticEvent::SocketReady { local });
        }

        self.enter(SessionState::Sending);
        let (correlation_id, probe) = codec::build_probe();
        let target = self.options.target;
        if let Err(e) = socket.send_to(&probe, target).await {
            let error = format!("Failed to send Probe to {}: {}", target, e);
            self.sink.record(DiagnosticEvent::SetupFailed(&error));
            self.enter(SessionState::Completed);
            return report::failed(correlation_id, started.elapsed(), error);
        }
        let sent_at = Instant::now();
        self.sink.record(DiagnosticEvent::ProbeSent {
            correlation_id: &correlation_id,
            target,
            payload: &probe,
        });

        self.enter(SessionState::Listening);
        let mut table = ResultTable::new(correlation_id.as_str(), self.options.include_hello);
        let mut errors = Vec::new();
        let mut buf = vec![0u8; self.options.recv_buffer_size];

        let deadline = sent_at
            .checked_add(self.options.timeout)
            .or_else(|| sent_at.checked_add(FAR_FUTURE))
            .unwrap_or(sent_at);
        let deadline = tokio::time::sleep_until(deadline.into());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => break,

                _ = cancel.cancelled() => {
                    self.sink.record(DiagnosticEvent::Cancelled);
                    break;
                }

                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => self.handle_datagram(&buf[..len], from, sent_at, &mut table),
                    Err(e) => {
                        let error = format!("Receive error: {}", e);
                        self.sink.record(DiagnosticEvent::ReceiveError(&error));
                        errors.push(error);
                    }
                },
            }
        }

        drop(socket);
        self.enter(SessionState::Completed);
        tracing::debug!("Listen window closed with {} device(s)", table.len());

        report::assemble(correlation_id, table.into_devices(), started.elapsed(), errors)
    }

    fn handle_datagram(&self, data: &[u8], from: SocketAddr, sent_at: Instant, table: &mut ResultTable) {
        self.sink.record(DiagnosticEvent::Datagram { from, payload: data });

        match codec::parse_response(data, from, sent_at) {
            Ok(device) => {
                let admission = table.offer(device);
                self.sink.record(DiagnosticEvent::Admission { from, admission: &admission });
            }
            Err(reason) => {
                self.sink.record(DiagnosticEvent::NotRecognized { from, reason: &reason });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use shared::types::MessageKind;
    use crate::codec::fixtures::{message_id_of, Response};
    use crate::codec::profile::{PROFILE_2005, PROFILE_2009};
    use crate::table::Admission;

    const XADDR: &str = "http://10.0.0.5/onvif/device_service";

    #[derive(Default)]
    struct RecordingSink {
        states: Mutex<Vec<SessionState>>,
        admissions: Mutex<Vec<Admission>>,
        unrecognized: Mutex<usize>,
    }

    impl DiagnosticSink for RecordingSink {
        fn record(&self, event: DiagnosticEvent<'_>) {
            match event {
                DiagnosticEvent::StateChanged(state) => self.states.lock().unwrap().push(state),
                DiagnosticEvent::Admission { admission, .. } => {
                    self.admissions.lock().unwrap().push(admission.clone())
                }
                DiagnosticEvent::NotRecognized { .. } => *self.unrecognized.lock().unwrap() += 1,
                _ => {}
            }
        }
    }

    struct Harness {
        session: DiscoverySession,
        sink: Arc<RecordingSink>,
        client: UdpSocket,
        device: UdpSocket,
    }

    async fn harness(timeout: Duration, include_hello: bool) -> Harness {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let options = DiscoveryOptions {
            timeout,
            include_hello,
            target: device.local_addr().unwrap(),
            ..DiscoveryOptions::default()
        };
        let sink = Arc::new(RecordingSink::default());
        let session = DiscoverySession::new(options, sink.clone());
        Harness { session, sink, client, device }
    }

    /// Answer the first Probe with whatever `replies` builds from its MessageID.
    fn respond(device: UdpSocket, replies: impl FnOnce(&str) -> Vec<Vec<u8>> + Send + 'static) {
        tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            let (len, from) = device.recv_from(&mut buf).await.unwrap();
            let id = message_id_of(&buf[..len]);
            for reply in replies(&id) {
                device.send_to(&reply, from).await.unwrap();
            }
        });
    }

    #[tokio::test]
    async fn test_matching_probe_match_is_reported() {
        let h = harness(Duration::from_millis(300), false).await;
        respond(h.device, |id| {
            vec![Response::new(PROFILE_2005, "urn:uuid:dev1", XADDR).relates_to(id).probe_match()]
        });

        let report = h.session.run_on(h.client, &CancellationToken::new()).await;

        assert!(report.succeeded);
        assert_eq!(report.total_devices, 1);
        let device = &report.devices["urn:uuid:dev1"];
        assert_eq!(device.endpoint_identity, "urn:uuid:dev1");
        assert_eq!(device.service_addresses, vec![XADDR.to_string()]);
        assert_eq!(device.correlates_to.as_deref(), Some(report.correlation_id.as_str()));
        assert!(report.errors.is_empty());
        assert_eq!(
            *h.sink.states.lock().unwrap(),
            vec![SessionState::Sending, SessionState::Listening, SessionState::Completed]
        );
    }

    #[tokio::test]
    async fn test_foreign_probe_match_is_rejected() {
        let h = harness(Duration::from_millis(300), false).await;
        respond(h.device, |_| {
            vec![Response::new(PROFILE_2005, "urn:uuid:dev1", XADDR).relates_to("uuid:other").probe_match()]
        });

        let report = h.session.run_on(h.client, &CancellationToken::new()).await;

        assert!(!report.succeeded);
        assert!(report.devices.is_empty());
        let admissions = h.sink.admissions.lock().unwrap();
        assert!(matches!(admissions.as_slice(), [Admission::CorrelationMismatch { .. }]));
    }

    #[tokio::test]
    async fn test_repeated_and_noisy_responses() {
        let h = harness(Duration::from_millis(400), false).await;
        respond(h.device, |id| {
            let ours = Response::new(PROFILE_2009, "urn:uuid:dev1", XADDR).relates_to(id).probe_match();
            vec![
                b"\x00\x01garbage".to_vec(),
                ours.clone(),
                b"<s:Envelope><unterminated".to_vec(),
                Response::new(PROFILE_2005, "urn:uuid:dev2", XADDR).hello(),
                ours.clone(),
                ours,
            ]
        });

        let report = h.session.run_on(h.client, &CancellationToken::new()).await;

        assert!(report.succeeded);
        assert_eq!(report.devices.keys().collect::<Vec<_>>(), vec!["urn:uuid:dev1"]);
        assert!(report.devices.values().all(|d| d.message_kind != MessageKind::Hello));
        assert!(report.errors.is_empty());
        assert_eq!(*h.sink.unrecognized.lock().unwrap(), 2);

        let admissions = h.sink.admissions.lock().unwrap();
        let duplicates = admissions
            .iter()
            .filter(|a| matches!(a, Admission::Duplicate { .. }))
            .count();
        assert_eq!(duplicates, 2);
        assert!(admissions.contains(&Admission::HelloNotRequested));
    }

    #[tokio::test]
    async fn test_hello_accepted_when_requested() {
        let h = harness(Duration::from_millis(300), true).await;
        respond(h.device, |_| vec![Response::new(PROFILE_2009, "urn:uuid:dev2", XADDR).hello()]);

        let report = h.session.run_on(h.client, &CancellationToken::new()).await;

        assert!(report.succeeded);
        assert_eq!(report.devices["urn:uuid:dev2"].message_kind, MessageKind::Hello);
    }

    #[tokio::test]
    async fn test_silent_network_returns_at_deadline() {
        let timeout = Duration::from_millis(250);
        let h = harness(timeout, true).await;
        let _device = h.device;

        let started = Instant::now();
        let report = h.session.run_on(h.client, &CancellationToken::new()).await;
        let elapsed = started.elapsed();

        assert!(!report.succeeded);
        assert_eq!(report.message, "No ONVIF devices discovered");
        assert!(report.correlation_id.starts_with("uuid:"));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(500), "run took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_cancellation_ends_run_early() {
        let h = harness(Duration::from_secs(30), false).await;
        let _device = h.device;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let report = h.session.run_on(h.client, &cancel).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!report.succeeded);
    }

    #[tokio::test]
    async fn test_setup_failure_yields_failed_report() {
        let options = DiscoveryOptions {
            timeout: Duration::from_secs(30),
            interface: Some(Ipv4Addr::new(192, 0, 2, 123)),
            ..DiscoveryOptions::default()
        };
        let sink = Arc::new(RecordingSink::default());
        let session = DiscoverySession::new(options, sink.clone());

        let started = Instant::now();
        let report = session.run(&CancellationToken::new()).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!report.succeeded);
        assert!(report.correlation_id.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.message.starts_with("Discovery failed: "));
        assert!(!sink.states.lock().unwrap().contains(&SessionState::Listening));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_does_not_panic() {
        let h = harness(Duration::MAX, false).await;
        let _device = h.device;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let report = h.session.run_on(h.client, &cancel).await;

        assert!(!report.succeeded);
        assert!(report.correlation_id.starts_with("uuid:"));
    }

    #[tokio::test]
    async fn test_elapsed_counts_from_run_start() {
        let h = harness(Duration::from_millis(50), false).await;
        let _device = h.device;
        let started = Instant::now() - Duration::from_millis(200);

        let report = h.session.run_from(h.client, &CancellationToken::new(), started).await;

        assert!(report.elapsed >= Duration::from_millis(250), "elapsed {:?}", report.elapsed);
    }
}
