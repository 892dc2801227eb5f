#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use config::*;
pub use identifier::Identifier;
pub use round::RoundResult;
pub use sort_error::{GenericError, SortError, SortResult};
pub use ttl::Ttl;
pub use ttl_sorter::*;
pub use utils::resolve_ipv4;

use icmp::v4::IcmpV4;
use probe_sender::ProbeSender;
use reply_listener::ReplyListener;

mod config;
mod event;
mod icmp;
mod identifier;
mod probe_sender;
mod reply_listener;
mod round;
mod sort_error;
mod ttl;
mod ttl_sorter;
mod utils;
