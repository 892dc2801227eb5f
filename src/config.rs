use crate::SortError;
use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_MAX_ROUNDS: usize = 3;
pub const DEFAULT_ROUND_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// What the reply listener does with an ICMP message it cannot attribute to one of its probes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnexpectedMessagePolicy {
    /// End the round with an error.
    Abort,
    /// Log the message and keep reading. It does not count towards the expected replies.
    Skip,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct SortConfig {
    pub destination: Ipv4Addr,
    pub max_rounds: usize,
    /// Pause between rounds so routers on the path do not rate limit us.
    pub round_delay: Duration,
    /// How long one round listens for replies.
    pub read_timeout: Duration,
    pub unexpected_message: UnexpectedMessagePolicy,
}

impl SortConfig {
    pub fn new(destination: Ipv4Addr) -> Self {
        SortConfig { destination, ..SortConfig::default() }
    }

    pub fn validate(&self) -> Result<(), SortError> {
        if self.max_rounds == 0 {
            return Err(SortError::new("max_rounds must be greater than 0"));
        }
        if self.read_timeout.is_zero() {
            return Err(SortError::new("read_timeout must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            destination: Ipv4Addr::LOCALHOST,
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_delay: DEFAULT_ROUND_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            unexpected_message: UnexpectedMessagePolicy::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SortConfig::new(Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(Ipv4Addr::new(192, 0, 2, 1), config.destination);
        assert_eq!(DEFAULT_READ_TIMEOUT, config.read_timeout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let config = SortConfig { max_rounds: 0, ..SortConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_read_timeout_is_rejected() {
        let config = SortConfig { read_timeout: Duration::ZERO, ..SortConfig::default() };
        assert!(config.validate().is_err());
    }
}
