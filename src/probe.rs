use crate::packet::{self, IpFamily};
use crate::socket::ProbeSocket;
use crate::stats::BurstStats;
use crate::transport::{Received, Transport};
use crate::{resolve, OpenError, ProbeSummary, ResolveError};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Default per-probe reply timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default number of probes per burst.
const DEFAULT_COUNT: u16 = 3;
/// Default echo payload size in bytes.
const DEFAULT_PAYLOAD_SIZE: usize = 64;
/// Pacing ceiling: each probe slot occupies at least this long, so a burst
/// runs at roughly one probe per second.
const DEFAULT_PACE: Duration = Duration::from_millis(1000);

/// Configuration of one monitoring job.
pub struct ProbeConfig {
    /// Destination hostname or IP literal. Resolved once per burst.
    pub host: String,
    pub family: IpFamily,
    /// Reply timeout per probe.
    pub timeout: Duration,
    /// Probes per burst.
    pub count: u16,
    /// Echo payload size in bytes.
    pub payload_size: usize,
    /// Minimum duration of one probe slot.
    pub pace: Duration,
    /// Discard replies whose ICMP checksum does not verify (IPv4 only).
    pub verify_checksum: bool,
}

impl ProbeConfig {
    pub fn new(host: impl Into<String>, family: IpFamily) -> Self {
        ProbeConfig {
            host: host.into(),
            family,
            timeout: DEFAULT_TIMEOUT,
            count: DEFAULT_COUNT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            pace: DEFAULT_PACE,
            verify_checksum: false,
        }
    }
}

/// The ICMP identifier for this engine: process id XOR thread id, masked to
/// 16 bits, so engines running concurrently (e.g. one per address family) do
/// not cross-match each other's replies.
fn burst_identifier() -> u16 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    (u64::from(std::process::id()) ^ hasher.finish()) as u16
}

/// Drives probe bursts against one destination. Owns one raw socket for its
/// lifetime; the identifier/sequence reception filter keeps concurrent
/// engines from stealing each other's replies.
pub struct ProbeEngine<S> {
    config: ProbeConfig,
    transport: Transport<S>,
    identifier: u16,
}

/// Opens a probe engine on a raw socket for the configured family. Fails with
/// `OpenError::PermissionDenied` without raw-socket privilege; that is fatal
/// to the job, not retried.
pub fn open(config: ProbeConfig) -> Result<ProbeEngine<impl ProbeSocket>, OpenError> {
    let transport = Transport::open(config.family, config.verify_checksum)?;
    Ok(ProbeEngine { config, transport, identifier: burst_identifier() })
}

impl<S> ProbeEngine<S>
where
    S: ProbeSocket,
{
    pub(crate) fn with_socket(config: ProbeConfig, socket: S) -> ProbeEngine<S> {
        let transport = Transport::with_socket(socket, config.family, config.verify_checksum);
        ProbeEngine { config, transport, identifier: burst_identifier() }
    }

    /// Runs one burst: `count` serial echo probes, each a send followed by a
    /// timeout-bounded wait, paced to at most one probe per `pace`.
    ///
    /// Per-probe failures (send error, timeout, malformed replies) are
    /// absorbed into the counters and never abort the burst. Only a failed
    /// hostname resolution aborts, before any probe is sent.
    pub fn run_burst(&mut self) -> Result<ProbeSummary, ResolveError> {
        let target = resolve::lookup_host(&self.config.host, self.config.family)?;
        tracing::debug!(
            "starting burst to {} ({}) with {} data bytes",
            self.config.host,
            target,
            self.config.payload_size
        );

        let mut stats = BurstStats::new(target);
        for sequence in 0..self.config.count {
            let delay_ms = self.probe_once(target, sequence, &mut stats);
            // Pause for the remainder of the pacing period. A timed-out probe
            // counts as zero delay here.
            let slot_used = Duration::from_secs_f64(delay_ms / 1000.0);
            std::thread::sleep(self.config.pace.saturating_sub(slot_used));
        }
        Ok(stats.finalize())
    }

    /// One send/receive exchange. Returns the measured delay in ms, or 0.0
    /// when no reply was obtained.
    fn probe_once(&self, target: std::net::IpAddr, sequence: u16, stats: &mut BurstStats) -> f64 {
        let echo_request = packet::encode_echo_request(
            self.config.family,
            self.identifier,
            sequence,
            self.config.payload_size,
        );

        let send_time = match self.transport.send_echo(target, &echo_request) {
            Ok(send_time) => send_time,
            Err(e) => {
                tracing::warn!("send failed for icmp_seq={sequence}: {e}");
                return 0.0;
            }
        };
        stats.record_sent();

        match self.transport.receive_matching(self.identifier, sequence, self.config.timeout) {
            Ok(Received::Reply { reply, receive_time }) => {
                let delay_ms = receive_time.duration_since(send_time).as_secs_f64() * 1000.0;
                stats.record_received(delay_ms);
                tracing::debug!(
                    "{} bytes from {}: icmp_seq={} ttl={} time={:.2} ms",
                    reply.data_size,
                    reply.source,
                    reply.sequence,
                    reply.ttl.map_or_else(|| "-".to_string(), |ttl| ttl.to_string()),
                    delay_ms
                );
                delay_ms
            }
            Ok(Received::Timeout) => {
                tracing::debug!("no reply for icmp_seq={sequence} within {:?}", self.config.timeout);
                0.0
            }
            Err(e) => {
                tracing::warn!("receive failed for icmp_seq={sequence}: {e}");
                0.0
            }
        }
    }
}
