use crate::packet::IpFamily;
use crate::OpenError;
use socket2::{Domain, Protocol, Type};
use std::net::IpAddr;
use std::{io, time::Duration};

/// The seam between the transport and the operating system. Production code
/// uses `RawSocket`; tests substitute a scripted mock.
pub trait ProbeSocket: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    /// Receives one datagram, returning its length and the peer address when
    /// the platform provides one.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Option<IpAddr>)>;
    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()>;
}

/// A raw ICMP socket. Requires root or CAP_NET_RAW on most platforms.
pub(crate) struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub(crate) fn open(family: IpFamily) -> Result<RawSocket, OpenError> {
        let (domain, protocol) = match family {
            IpFamily::V4 => (Domain::IPV4, Protocol::ICMPV4),
            IpFamily::V6 => (Domain::IPV6, Protocol::ICMPV6),
        };
        let socket = socket2::Socket::new(domain, Type::RAW, Some(protocol))?;
        socket.set_broadcast(true)?;
        Ok(RawSocket { socket })
    }
}

impl ProbeSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Option<IpAddr>)> {
        // Socket2 gives a safety guaranty which allows us to do an unsafe cast
        // from `&mut [u8]` to `&mut [std::mem::MaybeUninit<u8>]`. In fact, even
        // if we used MaybeUninit here we would need unsafe somewhere to copy
        // the data out of MaybeUninit.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        let (size, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(buf as *mut [u8] as *mut [std::mem::MaybeUninit<u8>])
        })?;
        Ok((size, socket_addr.as_socket().map(|addr| addr.ip())))
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.socket.set_read_timeout(Some(timeout))
    }
}
