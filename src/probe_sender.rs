use crate::icmp::v4::SocketFactory;
use crate::IcmpV4;
use crate::SortError;
use crate::Ttl;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Sends one probe over a socket of its own. Failures are only logged; the missing reply shows up
/// as a shorter round.
pub(crate) struct ProbeSender<F> {
    socket_factory: Arc<F>,
    destination: Ipv4Addr,
}

impl<F> ProbeSender<F>
where
    F: SocketFactory,
{
    pub(crate) fn new(socket_factory: Arc<F>, destination: Ipv4Addr) -> Self {
        ProbeSender { socket_factory, destination }
    }

    fn send(&self, ttl: Ttl) -> Result<(), SortError> {
        let socket = self.socket_factory.open()?;
        IcmpV4::new(socket).send_probe(self.destination, ttl)?;
        Ok(())
    }

    pub(crate) fn spawn(self, ttl: Ttl) -> JoinHandle<()> {
        std::thread::spawn(move || {
            if let Err(e) = self.send(ttl) {
                tracing::error!("could not send probe with ttl {} to {}: {}", ttl, self.destination, e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::v4::tests::{OnOpen, SocketMock, SocketMockFactory};
    use crate::Identifier;
    use pnet_packet::icmp::echo_request::EchoRequestPacket;
    use std::net::IpAddr;

    #[test]
    fn send_probe_opens_own_socket_and_sets_ttl() {
        let socket_mock = SocketMock::new();
        let factory = Arc::new(SocketMockFactory::new(OnOpen::ReturnDefault, socket_mock.clone()));
        let destination = Ipv4Addr::new(192, 0, 2, 7);

        let ttl = Ttl::try_from(4u32).unwrap();
        ProbeSender::new(factory.clone(), destination).spawn(ttl).join().unwrap();

        factory.should_open_number_of_sockets(1);
        socket_mock.should_send_number_of_messages(1).should_send_to_address(&IpAddr::V4(destination));
        assert_eq!(vec![Some(ttl)], socket_mock.sent_ttls());
    }

    #[test]
    fn concurrent_probes_each_use_their_own_ttl() {
        let socket_mock = SocketMock::new();
        let factory = Arc::new(SocketMockFactory::new(OnOpen::ReturnDefault, socket_mock.clone()));
        let destination = Ipv4Addr::new(192, 0, 2, 7);

        let handles: Vec<_> = crate::ttl::ttls(&[30, 10, 20])
            .into_iter()
            .map(|ttl| ProbeSender::new(factory.clone(), destination).spawn(ttl))
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        factory.should_open_number_of_sockets(3);
        let mut sent_ttls: Vec<_> = socket_mock.sent_ttls().into_iter().flatten().collect();
        sent_ttls.sort();
        assert_eq!(crate::ttl::ttls(&[10, 20, 30]), sent_ttls);

        let mut carried: Vec<_> = socket_mock
            .sent_messages()
            .iter()
            .filter_map(|message| EchoRequestPacket::new(message))
            .filter_map(|echo_request| Identifier::from(echo_request.get_identifier()).decode())
            .collect();
        carried.sort();
        assert_eq!(sent_ttls, carried);
    }

    #[test]
    fn when_socket_cannot_be_opened_then_nothing_is_sent() {
        let socket_mock = SocketMock::new();
        let factory = Arc::new(SocketMockFactory::new(OnOpen::ReturnErr, socket_mock.clone()));

        let ttl = Ttl::try_from(4u32).unwrap();
        let sender = ProbeSender::new(factory, Ipv4Addr::new(192, 0, 2, 7));
        assert!(sender.send(ttl).is_err());
        socket_mock.should_send_number_of_messages(0);
    }
}
