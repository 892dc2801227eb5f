use crate::Ttl;
use std::{net::IpAddr, sync::mpsc};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ReplyKind {
    EchoReply,
    TimeExceeded,
}

/// One probe answered: the value it carried and who answered it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ReplyEvent {
    pub ttl: Ttl,
    pub ip_addr: IpAddr,
    pub kind: ReplyKind,
}

pub(crate) type ReplyEventSender = mpsc::SyncSender<ReplyEvent>;
pub(crate) type ReplyEventReceiver = mpsc::Receiver<ReplyEvent>;
pub(crate) fn reply_event_channel(channel_size: usize) -> (ReplyEventSender, ReplyEventReceiver) {
    mpsc::sync_channel::<ReplyEvent>(channel_size)
}
