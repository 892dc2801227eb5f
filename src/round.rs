use crate::event::{reply_event_channel, ReplyEventReceiver};
use crate::icmp::v4::SocketFactory;
use crate::IcmpV4;
use crate::ProbeSender;
use crate::ReplyListener;
use crate::SortError;
use crate::SortResult;
use crate::Ttl;
use crate::UnexpectedMessagePolicy;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

/// Values in the order their replies arrived, plus the distance to the destination if the
/// destination itself answered one of the probes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoundResult {
    pub values: Vec<Ttl>,
    pub hops_to_destination: Option<Ttl>,
}

/// One full send-and-collect cycle over the current values.
pub(crate) trait Round {
    fn run(&self, values: &[Ttl]) -> SortResult<RoundResult>;
}

pub(crate) struct RoundCoordinator<F> {
    socket_factory: Arc<F>,
    destination: Ipv4Addr,
    read_timeout: Duration,
    unexpected_message: UnexpectedMessagePolicy,
}

impl<F> RoundCoordinator<F>
where
    F: SocketFactory,
{
    pub(crate) fn new(
        socket_factory: Arc<F>,
        destination: Ipv4Addr,
        read_timeout: Duration,
        unexpected_message: UnexpectedMessagePolicy,
    ) -> Self {
        RoundCoordinator { socket_factory, destination, read_timeout, unexpected_message }
    }
}

impl<F> Round for RoundCoordinator<F>
where
    F: SocketFactory,
{
    fn run(&self, values: &[Ttl]) -> SortResult<RoundResult> {
        // (1) Open the receiving socket before any probe leaves.
        let socket = self.socket_factory.open()?;
        let listener = ReplyListener::new(IcmpV4::new(socket), self.read_timeout, self.unexpected_message);

        // (2) Start listening.
        let expected = values.len();
        let (reply_event_tx, reply_event_rx) = reply_event_channel(expected.max(1));
        let outstanding = values.to_vec();
        let listener_thread = std::thread::spawn(move || listener.listen(&outstanding, &reply_event_tx));

        // (3) Fire one probe per value.
        for &ttl in values {
            let _ = ProbeSender::new(self.socket_factory.clone(), self.destination).spawn(ttl);
        }

        // (4) Collect replies in arrival order until the listener hangs up.
        let result = collect_replies(&reply_event_rx, IpAddr::V4(self.destination), expected);

        match listener_thread.join() {
            Ok(Ok(_)) => Ok(result),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(SortError::new("reply listener thread panicked").into()),
        }
    }
}

fn collect_replies(reply_event_rx: &ReplyEventReceiver, destination: IpAddr, expected: usize) -> RoundResult {
    let mut result = RoundResult::default();
    for event in reply_event_rx.iter().take(expected) {
        result.values.push(event.ttl);
        let is_destination = event.ip_addr == destination;
        tracing::debug!(
            "{:?} for ttl {}, is_destination={} ({}, {})",
            event.kind,
            event.ttl,
            is_destination,
            destination,
            event.ip_addr
        );
        if is_destination {
            result.hops_to_destination = Some(event.ttl);
        }
        tracing::trace!("{} of {} replies received", result.values.len(), expected);
    }
    result
}
