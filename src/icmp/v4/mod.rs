mod icmpv4;
pub(crate) use icmpv4::{IcmpReply, IcmpV4, ReceivedMessage};

mod socket;
pub(crate) use socket::raw_socket::RawSocketFactory;
pub(crate) use socket::{SocketFactory, TSocket};
