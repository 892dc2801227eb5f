use crate::Ttl;

type IdentifierInnerType = u16;

// Keeps our identifiers clear of the low values ping tools commonly use.
const IDENTIFIER_OFFSET: IdentifierInnerType = 100;

/// ICMP echo identifier carrying an encoded [`Ttl`].
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Identifier(IdentifierInnerType);

impl Identifier {
    pub fn encode(ttl: Ttl) -> Identifier {
        Identifier(IdentifierInnerType::from(ttl.get()) + IDENTIFIER_OFFSET)
    }

    /// Returns `None` for identifiers no probe of ours could have carried.
    pub fn decode(self) -> Option<Ttl> {
        let value = self.0.checked_sub(IDENTIFIER_OFFSET)?;
        Ttl::try_from(u32::from(value)).ok()
    }
}

impl From<IdentifierInnerType> for Identifier {
    fn from(value: IdentifierInnerType) -> Self {
        Identifier(value)
    }
}

impl From<Identifier> for IdentifierInnerType {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_inverts_encode_over_ttl_range() {
        for value in 1..=255u32 {
            let ttl = Ttl::try_from(value).unwrap();
            assert_eq!(Some(ttl), Identifier::encode(ttl).decode());
        }
    }

    #[test]
    fn encode_applies_offset() {
        assert_eq!(Identifier(101), Identifier::encode(Ttl::MIN));
        assert_eq!(Identifier(355), Identifier::encode(Ttl::MAX));
    }

    #[test]
    fn foreign_identifiers_do_not_decode() {
        assert_eq!(None, Identifier(0).decode());
        assert_eq!(None, Identifier(100).decode());
        assert_eq!(None, Identifier(356).decode());
        assert_eq!(None, Identifier(0xABCD).decode());
    }
}
