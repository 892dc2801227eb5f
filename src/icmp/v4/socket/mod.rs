use crate::Ttl;
use std::{io, net::IpAddr, time::Duration};

pub(crate) mod raw_socket;

pub(crate) trait TSocket: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    fn set_ttl(&self, ttl: Ttl) -> io::Result<()>;
    /// Receives one ICMP message into `buf` (IP header stripped). Returns the message length, the
    /// address of the sender and the TTL the message arrived with.
    fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, IpAddr, u8)>;
}

/// Every probe needs its own socket, so sockets are handed out by a factory.
pub(crate) trait SocketFactory: Send + Sync + 'static {
    type Socket: TSocket + 'static;

    fn open(&self) -> io::Result<Self::Socket>;
}
