use crate::prelude::*;

/// A normalized extra name. The empty string is the "base" flavor that every
/// real package implicitly carries.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr, Default,
)]
pub struct Extra(String);

impl Extra {
    pub fn new(s: &str) -> Extra {
        Extra(normalize(s))
    }

    pub fn base() -> Extra {
        Extra(String::new())
    }

    pub fn is_base(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Extra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Extra {
    fn from(s: &str) -> Extra {
        Extra::new(s)
    }
}

impl FromStr for Extra {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Extra::new(s))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_is_empty() {
        assert!(Extra::base().is_base());
        assert_eq!(Extra::base(), Extra::new(""));
    }

    #[test]
    fn normalizes_like_names() {
        assert_eq!(Extra::new("Test_Extra"), Extra::new("test-extra"));
        assert!(!Extra::new("x").is_base());
    }
}
