use crate::prelude::*;
use regex::Regex;

/// Canonical form for a package or extra name: lowercase, trimmed, with
/// underscores folded to hyphens and anything outside `[a-z0-9.-]` dropped.
///
/// `normalize` is applied at every ingress boundary (requirement parsing,
/// cache keys, CLI arguments) so that two different spellings of the same
/// package always compare and hash equal. It is idempotent by construction:
/// every character it can produce is itself stable under a second pass.
pub fn normalize(s: &str) -> String {
    static DISALLOWED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^a-z0-9.-]").unwrap());

    let lowered = s.trim().to_lowercase().replace('_', "-");
    DISALLOWED.replace_all(&lowered, "").into_owned()
}

/// A normalized package name. There is no "invalid name" error class here --
/// normalization never fails, it just may produce an empty string for
/// sufficiently garbage-in input.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Name(String);

impl Name {
    pub fn new(s: &str) -> Name {
        Name(normalize(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Name {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Name {
        Name::new(&s)
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Name::new(s))
    }
}

impl std::borrow::Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["Foo_Bar", "  FOO.BAR  ", "foo--bar!!", "Django==1.0"] {
            let once = normalize(raw);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalize_folds_underscores_and_case() {
        assert_eq!(normalize("Foo_Bar"), "foo-bar");
        assert_eq!(normalize("  Foo.Bar  "), "foo.bar");
    }

    #[test]
    fn normalize_drops_disallowed_chars() {
        assert_eq!(normalize("foo!bar#baz"), "foobarbaz");
    }

    #[test]
    fn equal_spellings_compare_equal() {
        assert_eq!(Name::new("Foo_Bar"), Name::new("foo-bar"));
        assert_ne!(Name::new("foo-bar"), Name::new("foo-barbaz"));
    }

    #[test]
    fn serde_roundtrip_normalizes() {
        let n: Name = serde_json::from_str(r#""Foo_Bar""#).unwrap();
        assert_eq!(n, Name::new("foo-bar"));
        assert_eq!(serde_json::to_string(&n).unwrap(), r#""foo-bar""#);
    }
}
