use crate::checksum::internet_checksum;
use crate::DecodeError;
use pnet_packet::ipv4::Ipv4Packet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub(crate) const ICMP_HEADER_SIZE: usize = 8;
pub(crate) const IPV4_HEADER_SIZE: usize = 20;
/// Max size of an incoming buffer.
pub(crate) const MAX_RECV: usize = 2048;

/// First byte of the deterministic echo payload pattern.
const PAYLOAD_START: u8 = 0x41;

/// Address family of one probe engine. Selects the raw-socket domain and the
/// ICMP message types (RFC 792 for V4, RFC 4443 for V6).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub(crate) fn echo_request_type(self) -> u8 {
        match self {
            IpFamily::V4 => 8,
            IpFamily::V6 => 128,
        }
    }

    pub(crate) fn echo_reply_type(self) -> u8 {
        match self {
            IpFamily::V4 => 0,
            IpFamily::V6 => 129,
        }
    }

    /// Minimum length of a buffer delivered by the kernel for this family.
    /// A raw IPv4 socket delivers the IP header, a raw IPv6 socket does not.
    fn min_reply_size(self) -> usize {
        match self {
            IpFamily::V4 => IPV4_HEADER_SIZE + ICMP_HEADER_SIZE,
            IpFamily::V6 => ICMP_HEADER_SIZE,
        }
    }

    fn unspecified(self) -> IpAddr {
        match self {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// The payload bytes carried by every echo request: 0x41, 0x42, ...
/// wrapping at 0xFF.
pub(crate) fn echo_payload(size: usize) -> impl Iterator<Item = u8> {
    (0..size).map(|i| ((usize::from(PAYLOAD_START) + i) & 0xFF) as u8)
}

/// Builds a ready-to-send echo request: big-endian header
/// `{type, code, checksum, identifier, sequence}` followed by the
/// deterministic payload. The checksum is computed with the checksum field
/// zeroed and patched in afterwards.
pub(crate) fn encode_echo_request(
    family: IpFamily,
    identifier: u16,
    sequence: u16,
    payload_size: usize,
) -> Vec<u8> {
    let mut packet = Vec::with_capacity(ICMP_HEADER_SIZE + payload_size);
    packet.push(family.echo_request_type());
    packet.push(0); // code
    packet.extend_from_slice(&[0, 0]); // checksum placeholder
    packet.extend_from_slice(&identifier.to_be_bytes());
    packet.extend_from_slice(&sequence.to_be_bytes());
    packet.extend(echo_payload(payload_size));

    let checksum = internet_checksum(&packet);
    packet[2..4].copy_from_slice(&checksum.to_be_bytes());
    packet
}

/// A decoded inbound ICMP message. Decoding does not verify the embedded
/// checksum; that is the transport's (optional) concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
    /// Size of the ICMP message (header + data), excluding any IP header.
    pub data_size: usize,
    pub source: IpAddr,
    /// From the IPv4 header. Not available on IPv6, where the kernel strips
    /// the IP header before delivery.
    pub ttl: Option<u8>,
}

/// Decodes a buffer received on a raw ICMP socket. `peer` is the socket-level
/// source address, used for IPv6 where the buffer carries no IP header.
pub(crate) fn decode(
    family: IpFamily,
    buf: &[u8],
    peer: Option<IpAddr>,
) -> Result<EchoReply, DecodeError> {
    let min = family.min_reply_size();
    if buf.len() < min {
        return Err(DecodeError::Truncated { expected: min, actual: buf.len() });
    }

    let (icmp, source, ttl) = match family {
        IpFamily::V4 => {
            let ip_header = Ipv4Packet::new(buf).ok_or(DecodeError::Truncated {
                expected: min,
                actual: buf.len(),
            })?;
            (
                &buf[IPV4_HEADER_SIZE..],
                IpAddr::V4(ip_header.get_source()),
                Some(ip_header.get_ttl()),
            )
        }
        IpFamily::V6 => (buf, peer.unwrap_or_else(|| family.unspecified()), None),
    };

    Ok(EchoReply {
        icmp_type: icmp[0],
        code: icmp[1],
        checksum: u16::from_be_bytes([icmp[2], icmp[3]]),
        identifier: u16::from_be_bytes([icmp[4], icmp[5]]),
        sequence: u16::from_be_bytes([icmp[6], icmp[7]]),
        data_size: icmp.len(),
        source,
        ttl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::verify;

    fn prepend_ipv4_header(icmp: &[u8], source: Ipv4Addr, ttl: u8) -> Vec<u8> {
        use pnet_packet::ip::IpNextHeaderProtocols;
        use pnet_packet::ipv4::MutableIpv4Packet;

        let mut buf = vec![0u8; IPV4_HEADER_SIZE + icmp.len()];
        let mut ip_header = MutableIpv4Packet::new(&mut buf).unwrap();
        ip_header.set_version(4);
        ip_header.set_header_length(5);
        ip_header.set_total_length((IPV4_HEADER_SIZE + icmp.len()) as u16);
        ip_header.set_ttl(ttl);
        ip_header.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        ip_header.set_source(source);
        ip_header.set_destination(Ipv4Addr::new(127, 0, 0, 1));
        ip_header.set_payload(icmp);
        buf
    }

    #[test]
    fn encoded_request_checksums_to_zero() {
        for size in [0usize, 1, 64, 1024] {
            let packet = encode_echo_request(IpFamily::V4, 0xABCD, 7, size);
            assert_eq!(ICMP_HEADER_SIZE + size, packet.len());
            assert!(verify(&packet));
        }
    }

    #[test]
    fn encoded_v6_request_checksums_to_zero() {
        for size in [0usize, 1, 64, 1024] {
            assert!(verify(&encode_echo_request(IpFamily::V6, 0x1234, 0, size)));
        }
    }

    #[test]
    fn payload_pattern_starts_at_0x41_and_wraps() {
        let payload: Vec<u8> = echo_payload(256).collect();
        assert_eq!(0x41, payload[0]);
        assert_eq!(0x42, payload[1]);
        assert_eq!(0xFF, payload[0xFF - 0x41]);
        assert_eq!(0x00, payload[0xFF - 0x41 + 1]);
    }

    #[test]
    fn decode_v4_roundtrip() {
        for size in [0usize, 1, 64, 1024] {
            let request = encode_echo_request(IpFamily::V4, 0x1001, 3, size);
            let source = Ipv4Addr::new(192, 0, 2, 17);
            let buf = prepend_ipv4_header(&request, source, 52);

            let reply = decode(IpFamily::V4, &buf, None).unwrap();
            assert_eq!(IpFamily::V4.echo_request_type(), reply.icmp_type);
            assert_eq!(0, reply.code);
            assert_eq!(0x1001, reply.identifier);
            assert_eq!(3, reply.sequence);
            assert_eq!(ICMP_HEADER_SIZE + size, reply.data_size);
            assert_eq!(IpAddr::V4(source), reply.source);
            assert_eq!(Some(52), reply.ttl);
        }
    }

    #[test]
    fn decode_v6_roundtrip() {
        let peer: IpAddr = "2001:db8::1".parse().unwrap();
        for size in [0usize, 1, 64, 1024] {
            let request = encode_echo_request(IpFamily::V6, 0x2002, 9, size);

            let reply = decode(IpFamily::V6, &request, Some(peer)).unwrap();
            assert_eq!(IpFamily::V6.echo_request_type(), reply.icmp_type);
            assert_eq!(0x2002, reply.identifier);
            assert_eq!(9, reply.sequence);
            assert_eq!(ICMP_HEADER_SIZE + size, reply.data_size);
            assert_eq!(peer, reply.source);
            assert_eq!(None, reply.ttl);
        }
    }

    #[test]
    fn decode_v4_truncated() {
        let buf = [0u8; IPV4_HEADER_SIZE + ICMP_HEADER_SIZE - 1];
        assert_eq!(
            Err(DecodeError::Truncated { expected: 28, actual: 27 }),
            decode(IpFamily::V4, &buf, None)
        );
    }

    #[test]
    fn decode_v6_truncated() {
        let buf = [0u8; ICMP_HEADER_SIZE - 1];
        assert_eq!(
            Err(DecodeError::Truncated { expected: 8, actual: 7 }),
            decode(IpFamily::V6, &buf, None)
        );
    }

    #[test]
    fn decode_does_not_fail_on_checksum_mismatch() {
        let mut request = encode_echo_request(IpFamily::V6, 1, 1, 8);
        request[2] ^= 0xFF; // corrupt the checksum
        assert!(decode(IpFamily::V6, &request, None).is_ok());
    }
}
