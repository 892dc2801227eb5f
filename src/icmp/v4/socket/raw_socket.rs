use super::{SocketFactory, TSocket};
use crate::Ttl;
use pnet_packet::ipv4::Ipv4Packet;
use socket2::{Domain, Protocol, Type};
use std::{
    io,
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

// Large enough for a full Ethernet frame.
const RECV_BUFFER_SIZE: usize = 1500;

// socket2 passes read timeouts on with microsecond resolution and a zero timeout blocks forever.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

pub(crate) struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub(crate) fn new() -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn set_ttl(&self, ttl: Ttl) -> io::Result<()> {
        self.socket.set_ttl(ttl.into())
    }

    fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, IpAddr, u8)> {
        self.socket.set_read_timeout(Some(read_timeout(timeout)))?;

        let mut recv_buf = [0u8; RECV_BUFFER_SIZE];
        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get the whole IP packet.
        let (n, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(recv_buf) as *mut [u8] as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let (len, source, ttl) = strip_ipv4_header(&recv_buf[..n], buf)?;

        let ip = socket_addr
            .as_socket_ipv4()
            .map(|addr| *addr.ip())
            .or(source)
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        Ok((len, IpAddr::V4(ip), ttl))
    }
}

fn read_timeout(timeout: Duration) -> Duration {
    timeout.max(MIN_READ_TIMEOUT)
}

/// Copies the ICMP part of `packet` into `buf` and returns its length, the source address and the
/// TTL from the IPv4 header. A packet whose header cannot be read gives an empty message, which the
/// ICMP parser then rejects.
fn strip_ipv4_header(packet: &[u8], buf: &mut [u8]) -> io::Result<(usize, Option<Ipv4Addr>, u8)> {
    let Some(ipv4_packet) = Ipv4Packet::new(packet) else {
        tracing::debug!("IPv4 packet too short ({} bytes)", packet.len());
        return Ok((0, None, 0));
    };
    let header_len = usize::from(ipv4_packet.get_header_length()) * 4;
    let Some(icmp) = packet.get(header_len..) else {
        tracing::debug!("IPv4 header length {} exceeds packet ({} bytes)", header_len, packet.len());
        return Ok((0, Some(ipv4_packet.get_source()), ipv4_packet.get_ttl()));
    };
    if buf.len() < icmp.len() {
        return Err(io::Error::new(io::ErrorKind::Other, "buffer too small"));
    }
    buf[..icmp.len()].copy_from_slice(icmp);
    Ok((icmp.len(), Some(ipv4_packet.get_source()), ipv4_packet.get_ttl()))
}

pub(crate) struct RawSocketFactory;

impl SocketFactory for RawSocketFactory {
    type Socket = RawSocket;

    fn open(&self) -> io::Result<RawSocket> {
        RawSocket::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet_packet::ip::IpNextHeaderProtocols;
    use pnet_packet::ipv4::MutableIpv4Packet;

    const SOURCE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    fn ipv4_packet(payload: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; 20 + payload.len()];
        let mut ipv4_packet = MutableIpv4Packet::new(&mut packet).unwrap();
        ipv4_packet.set_version(4);
        ipv4_packet.set_header_length(5);
        ipv4_packet.set_total_length(u16::try_from(20 + payload.len()).unwrap());
        ipv4_packet.set_ttl(61);
        ipv4_packet.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        ipv4_packet.set_source(SOURCE);
        ipv4_packet.set_payload(payload);
        packet
    }

    #[test]
    fn sub_microsecond_timeout_is_raised() {
        assert_eq!(MIN_READ_TIMEOUT, read_timeout(Duration::from_nanos(500)));
        assert_eq!(MIN_READ_TIMEOUT, read_timeout(Duration::ZERO));
        assert_eq!(Duration::from_secs(2), read_timeout(Duration::from_secs(2)));
    }

    #[test]
    fn strips_ipv4_header() {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let (len, source, ttl) = strip_ipv4_header(&ipv4_packet(&[11, 0, 1, 2]), &mut buf).unwrap();

        assert_eq!(&[11, 0, 1, 2], &buf[..len]);
        assert_eq!(Some(SOURCE), source);
        assert_eq!(61, ttl);
    }

    #[test]
    fn malformed_packet_gives_empty_message() {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        assert_eq!(0, strip_ipv4_header(&[0x45, 0, 0], &mut buf).unwrap().0);

        let mut packet = ipv4_packet(&[]);
        packet[0] = 0x4f; // IHL of 60 bytes
        let (len, source, _) = strip_ipv4_header(&packet, &mut buf).unwrap();
        assert_eq!(0, len);
        assert_eq!(Some(SOURCE), source);
    }

    /*
    * Note: Raw sockets work only with root privileges.
    */
    #[test]
    #[ignore = "needs raw socket privileges"]
    fn sub_microsecond_timeout_does_not_block() {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = [0u8; RECV_BUFFER_SIZE];
            let result = RawSocket::new().and_then(|socket| socket.recv_from(&mut buf, Duration::from_nanos(500)));
            let _ = tx.send(result.map(|_| ()));
        });

        let result = rx.recv_timeout(Duration::from_secs(3)).expect("recv_from blocked past its timeout");
        if let Err(e) = result {
            assert!(matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut));
        }
    }
}
