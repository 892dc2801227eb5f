use super::TSocket;
use crate::{Identifier, SortError, Ttl};
use pnet_packet::icmp::{
    echo_reply::EchoReplyPacket,
    echo_request::{EchoRequestPacket, MutableEchoRequestPacket},
    time_exceeded::TimeExceededPacket,
    IcmpPacket, IcmpTypes,
};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::Packet;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const PAYLOAD: &[u8] = b"ttl-sort probe";
const RECV_BUFFER_SIZE: usize = 1500;
const MIN_IPV4_HEADER_LEN: usize = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum IcmpReply {
    /// The destination answered the probe itself.
    EchoReply(Identifier),
    /// A router on the way dropped the probe because its TTL ran out.
    TimeExceeded(Identifier),
}

impl IcmpReply {
    pub(crate) fn identifier(self) -> Identifier {
        match self {
            IcmpReply::EchoReply(identifier) | IcmpReply::TimeExceeded(identifier) => identifier,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ReceivedMessage {
    pub reply: Result<IcmpReply, SortError>,
    pub ip_addr: IpAddr,
    pub ttl: u8,
}

pub(crate) struct IcmpV4<S> {
    socket: S,
}

impl<S> IcmpV4<S>
where
    S: TSocket + 'static,
{
    pub(crate) fn new(socket: S) -> IcmpV4<S> {
        IcmpV4 { socket }
    }

    /// Sends one echo request that expires after `ttl` hops and carries `ttl` in its identifier.
    pub(crate) fn send_probe(&self, destination: Ipv4Addr, ttl: Ttl) -> Result<usize, SortError> {
        let package = new_echo_request(Identifier::encode(ttl), PAYLOAD)
            .ok_or_else(|| SortError::new("could not create ICMP package"))?;

        self.socket.set_ttl(ttl)?;
        let addr: socket2::SockAddr = SocketAddr::new(IpAddr::V4(destination), 0).into();
        let n = self.socket.send_to(package.packet(), &addr)?;
        tracing::trace!("sent echo request with ttl {} to {}", ttl, destination);
        Ok(n)
    }

    /// Waits up to `timeout` for the next ICMP message. `Ok(None)` means the wait timed out.
    pub(crate) fn try_receive(&self, timeout: Duration) -> Result<Option<ReceivedMessage>, io::Error> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        match self.socket.recv_from(&mut buf, timeout) {
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e),
            Ok((n, ip_addr, ttl)) => Ok(Some(ReceivedMessage { reply: parse_reply(&buf[..n]), ip_addr, ttl })),
        }
    }
}

pub(crate) fn new_echo_request(identifier: Identifier, payload: &[u8]) -> Option<MutableEchoRequestPacket<'static>> {
    let buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + payload.len()];
    let mut package = MutableEchoRequestPacket::owned(buf)?;
    package.set_icmp_type(IcmpTypes::EchoRequest);
    package.set_identifier(identifier.into());
    package.set_sequence_number(0);
    package.set_payload(payload);

    package.set_checksum(0_u16);
    let checksum = pnet_packet::icmp::checksum(&IcmpPacket::new(package.packet())?);
    package.set_checksum(checksum);
    Some(package)
}

/// Parses an ICMP message (without IP header) into the identifier of the probe it answers.
pub(crate) fn parse_reply(buf: &[u8]) -> Result<IcmpReply, SortError> {
    let too_short = || SortError::new(format!("ICMP message too short ({} bytes)", buf.len()));
    let icmp_packet = IcmpPacket::new(buf).ok_or_else(too_short)?;
    match icmp_packet.get_icmp_type() {
        IcmpTypes::EchoReply => {
            let echo_reply = EchoReplyPacket::new(buf).ok_or_else(too_short)?;
            Ok(IcmpReply::EchoReply(echo_reply.get_identifier().into()))
        }
        IcmpTypes::TimeExceeded => {
            let time_exceeded = TimeExceededPacket::new(buf).ok_or_else(too_short)?;
            Ok(IcmpReply::TimeExceeded(quoted_echo_identifier(time_exceeded.payload())?))
        }
        icmp_type => Err(SortError::new(format!("unexpected ICMP message type {}", icmp_type.0))),
    }
}

// A time exceeded message quotes the IP header of the dropped packet and the first 8 bytes of
// its payload, which is where the echo identifier sits.
fn quoted_echo_identifier(quoted: &[u8]) -> Result<Identifier, SortError> {
    let ipv4_packet = Ipv4Packet::new(quoted)
        .ok_or_else(|| SortError::new(format!("quoted IPv4 header too short ({} bytes)", quoted.len())))?;
    if ipv4_packet.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return Err(SortError::new(format!(
            "quoted packet is not ICMP (protocol {})",
            ipv4_packet.get_next_level_protocol().0
        )));
    }
    let header_len = usize::from(ipv4_packet.get_header_length()) * 4;
    if header_len < MIN_IPV4_HEADER_LEN {
        return Err(SortError::new(format!("quoted IPv4 header length {header_len} is invalid")));
    }
    let echo_request = quoted
        .get(header_len..)
        .and_then(EchoRequestPacket::new)
        .ok_or_else(|| SortError::new("quoted ICMP header is truncated"))?;
    if echo_request.get_icmp_type() != IcmpTypes::EchoRequest {
        return Err(SortError::new(format!(
            "quoted ICMP message is not an echo request (type {})",
            echo_request.get_icmp_type().0
        )));
    }
    Ok(echo_request.get_identifier().into())
}
