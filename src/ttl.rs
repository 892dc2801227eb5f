use crate::SortError;

type TtlInnerType = u8;

/// A value to be sorted. It is sent on the wire as the IP time-to-live of its probe, so only
/// 1..=255 can be represented.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ttl(TtlInnerType);

impl Ttl {
    pub const MIN: Ttl = Ttl(1);
    pub const MAX: Ttl = Ttl(TtlInnerType::MAX);

    pub fn get(self) -> TtlInnerType {
        self.0
    }
}

impl TryFrom<u32> for Ttl {
    type Error = SortError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match TtlInnerType::try_from(value) {
            Ok(0) | Err(_) => Err(SortError::new(format!("{value} is not a valid TTL (expected 1-255)"))),
            Ok(ttl) => Ok(Ttl(ttl)),
        }
    }
}

impl TryFrom<i64> for Ttl {
    type Error = SortError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u32::try_from(value)
            .map_err(|_| SortError::new(format!("{value} is not a valid TTL (expected 1-255)")))?;
        Ttl::try_from(value)
    }
}

impl std::str::FromStr for Ttl {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|_| SortError::new(format!("'{s}' is not an integer")))?;
        Ttl::try_from(value)
    }
}

impl From<Ttl> for TtlInnerType {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        u32::from(ttl.0)
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
pub(crate) fn ttl(value: u8) -> Ttl {
    Ttl::try_from(u32::from(value)).unwrap()
}

#[cfg(test)]
pub(crate) fn ttls(values: &[u8]) -> Vec<Ttl> {
    values.iter().map(|v| Ttl::try_from(u32::from(*v)).unwrap()).collect()
}
