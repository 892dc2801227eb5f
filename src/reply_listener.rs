use crate::event::{ReplyEvent, ReplyEventSender, ReplyKind};
use crate::icmp::v4::{IcmpReply, ReceivedMessage, TSocket};
use crate::IcmpV4;
use crate::SortError;
use crate::Ttl;
use crate::UnexpectedMessagePolicy;
use std::time::{Duration, Instant};

/// Owns the receiving socket of one round and turns incoming ICMP messages into reply events.
pub(crate) struct ReplyListener<S> {
    icmpv4: IcmpV4<S>,
    read_timeout: Duration,
    unexpected_message: UnexpectedMessagePolicy,
}

impl<S> ReplyListener<S>
where
    S: TSocket + 'static,
{
    pub(crate) fn new(icmpv4: IcmpV4<S>, read_timeout: Duration, unexpected_message: UnexpectedMessagePolicy) -> Self {
        ReplyListener { icmpv4, read_timeout, unexpected_message }
    }

    /// Reads until every value in `outstanding` was answered or the read deadline passed. Returns
    /// the number of dispatched replies.
    ///
    /// A reply for a value that is not outstanding, or was already answered, is an unexpected
    /// message.
    pub(crate) fn listen(&self, outstanding: &[Ttl], reply_event_tx: &ReplyEventSender) -> Result<usize, SortError> {
        let expected = outstanding.len();
        let mut waiting_for = outstanding.to_vec();
        let deadline = Instant::now() + self.read_timeout;
        let mut dispatched = 0;
        while !waiting_for.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("read deadline passed with {} of {} replies received", dispatched, expected);
                break;
            }

            let Some(message) = self.icmpv4.try_receive(remaining)? else {
                tracing::warn!("failed to read: timed out with {} of {} replies received", dispatched, expected);
                break;
            };

            match to_reply_event(message).and_then(|event| answer(&mut waiting_for, event)) {
                Ok(event) => {
                    if reply_event_tx.send(event).is_err() {
                        tracing::error!("could not dispatch reply event: receiver is gone");
                        break;
                    }
                    dispatched += 1;
                    tracing::debug!("Still waiting for {:?}", waiting_for);
                }
                Err(e) => match self.unexpected_message {
                    UnexpectedMessagePolicy::Abort => return Err(e),
                    UnexpectedMessagePolicy::Skip => tracing::warn!("skipping ICMP message: {}", e),
                },
            }
        }
        if !waiting_for.is_empty() {
            tracing::info!("No reply for {:?}", waiting_for);
        }
        tracing::trace!("ReplyListener done");
        Ok(dispatched)
    }
}

// Values may repeat, so only one occurrence is crossed off per reply.
fn answer(waiting_for: &mut Vec<Ttl>, event: ReplyEvent) -> Result<ReplyEvent, SortError> {
    let position = waiting_for.iter().position(|ttl| *ttl == event.ttl).ok_or_else(|| {
        SortError::new(format!("reply for ttl {} from {} answers no outstanding probe", event.ttl, event.ip_addr))
    })?;
    waiting_for.swap_remove(position);
    Ok(event)
}

fn to_reply_event(message: ReceivedMessage) -> Result<ReplyEvent, SortError> {
    let ReceivedMessage { reply, ip_addr, ttl: received_ttl } = message;
    let reply = reply.map_err(|e| SortError::new(format!("{} (from {})", e.message, ip_addr)))?;
    let identifier = reply.identifier();
    let ttl = identifier
        .decode()
        .ok_or_else(|| SortError::new(format!("identifier {identifier} from {ip_addr} does not belong to a probe")))?;
    let kind = match reply {
        IcmpReply::EchoReply(_) => {
            tracing::info!("Echo reply\tID={}\t{}", identifier, ip_addr);
            ReplyKind::EchoReply
        }
        IcmpReply::TimeExceeded(_) => {
            tracing::info!("Time exceeded\tID={}\t{}", identifier, ip_addr);
            ReplyKind::TimeExceeded
        }
    };
    tracing::debug!("reply for ttl {} arrived with ttl {}", ttl, received_ttl);
    Ok(ReplyEvent { ttl, ip_addr, kind })
}
