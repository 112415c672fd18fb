use crate::packet::{self, EchoReply, IpFamily, IPV4_HEADER_SIZE, MAX_RECV};
use crate::socket::{ProbeSocket, RawSocket};
use crate::{checksum, DecodeError, OpenError, SendError};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

/// Outcome of one bounded wait for a matching reply.
#[derive(Debug)]
pub(crate) enum Received {
    Reply { reply: EchoReply, receive_time: Instant },
    Timeout,
}

/// Owns one raw socket for an address family and performs the per-probe
/// send / wait-for-reply exchanges on it.
pub(crate) struct Transport<S> {
    socket: S,
    family: IpFamily,
    verify_checksum: bool,
}

impl Transport<RawSocket> {
    pub(crate) fn open(family: IpFamily, verify_checksum: bool) -> Result<Self, OpenError> {
        let socket = RawSocket::open(family)?;
        Ok(Transport::with_socket(socket, family, verify_checksum))
    }
}

impl<S> Transport<S>
where
    S: ProbeSocket,
{
    pub(crate) fn with_socket(socket: S, family: IpFamily, verify_checksum: bool) -> Self {
        Transport { socket, family, verify_checksum }
    }

    /// Transmits an encoded echo request. The port is irrelevant for ICMP.
    /// Returns the send timestamp; on failure the caller treats the probe as
    /// not-sent.
    pub(crate) fn send_echo(&self, dest: IpAddr, echo_request: &[u8]) -> Result<Instant, SendError> {
        let addr: socket2::SockAddr = SocketAddr::new(dest, 0).into();
        let send_time = Instant::now();
        self.socket.send_to(echo_request, &addr)?;
        Ok(send_time)
    }

    /// Waits for an echo reply carrying `identifier` and `sequence`, for at
    /// most `budget`.
    ///
    /// A raw ICMP socket receives all ICMP traffic on the host, including our
    /// own outbound echo requests looped back on some platforms. Unrelated
    /// datagrams are filtered out and the elapsed wait is subtracted from the
    /// remaining budget, so a stream of foreign traffic cannot postpone the
    /// timeout.
    pub(crate) fn receive_matching(
        &self,
        identifier: u16,
        sequence: u16,
        budget: Duration,
    ) -> io::Result<Received> {
        let mut remaining = budget;
        let mut buf = [0u8; MAX_RECV];

        loop {
            if remaining.is_zero() {
                return Ok(Received::Timeout);
            }
            self.socket.set_read_timeout(remaining)?;

            let wait_start = Instant::now();
            let (size, peer) = match self.socket.recv_from(&mut buf) {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
                {
                    return Ok(Received::Timeout);
                }
                Err(e) => return Err(e),
                Ok(ok) => ok,
            };
            let receive_time = Instant::now();

            match packet::decode(self.family, &buf[..size], peer) {
                Err(DecodeError::Truncated { expected, actual }) => {
                    tracing::trace!("discarding truncated datagram ({actual} < {expected} bytes)");
                }
                Ok(reply) => {
                    if self.matches(&reply, identifier, sequence)
                        && self.checksum_ok(&buf[..size])
                    {
                        return Ok(Received::Reply { reply, receive_time });
                    }
                    tracing::trace!(
                        "ignoring ICMP type {} id {} seq {}",
                        reply.icmp_type,
                        reply.identifier,
                        reply.sequence
                    );
                }
            }
            remaining = remaining.saturating_sub(wait_start.elapsed());
        }
    }

    /// A match is anything that is not an echo request (both requests and
    /// replies arrive on the same raw socket) and carries our identifier and
    /// sequence number.
    fn matches(&self, reply: &EchoReply, identifier: u16, sequence: u16) -> bool {
        reply.icmp_type != self.family.echo_request_type()
            && reply.identifier == identifier
            && reply.sequence == sequence
    }

    /// Optional defensive validation, off by default to stay compatible with
    /// peers that do not checksum correctly. Only possible for IPv4: the
    /// ICMPv6 checksum covers a pseudo-header the delivered buffer does not
    /// contain.
    fn checksum_ok(&self, buf: &[u8]) -> bool {
        if !self.verify_checksum || self.family == IpFamily::V6 {
            return true;
        }
        if checksum::verify(&buf[IPV4_HEADER_SIZE..]) {
            true
        } else {
            tracing::trace!("discarding reply with bad checksum");
            false
        }
    }
}
