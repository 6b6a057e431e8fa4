use crate::prelude::*;
use std::cmp::Ordering;

/// A parsed version, or the reserved *Virtual* sentinel standing in for "a
/// package we know of by name but for which no metadata was ever harvested".
///
/// `Virtual` never compares equal to any real version, and sorts after every
/// real version -- it's the thing the encoder falls back to, so it should
/// never look preferable to a real, newer-is-better version during the
/// optimization pass (see DESIGN.md, "Virtual version ordering").
#[derive(Clone, Debug, SerializeDisplay, DeserializeFromStr)]
pub enum Version {
    Real(pep440::Version),
    Virtual,
}

impl Version {
    pub fn is_virtual(&self) -> bool {
        matches!(self, Version::Virtual)
    }

    pub fn is_prerelease(&self) -> bool {
        match self {
            Version::Real(v) => v.pre.is_some() || v.dev.is_some(),
            Version::Virtual => false,
        }
    }

    /// The smallest real version strictly greater than `self`. Only
    /// meaningful for `Real` versions; see `vocab::specifier` for how this
    /// is used to turn comparison operators into half-open ranges.
    pub fn next(&self) -> Version {
        match self {
            Version::Real(v) => {
                let mut new = v.clone();
                if let Some(dev) = &mut new.dev {
                    *dev += 1;
                } else if let Some(post) = &mut new.post {
                    *post += 1;
                } else {
                    new.post = Some(0);
                    new.dev = Some(0);
                }
                Version::Real(new)
            }
            Version::Virtual => Version::Virtual,
        }
    }
}

pub static VERSION_ZERO: Lazy<Version> = Lazy::new(|| "0a0.dev0".try_into().unwrap());

pub static VERSION_INFINITY: Lazy<Version> = Lazy::new(|| {
    Version::Real(pep440::Version {
        epoch: u32::MAX,
        release: vec![u32::MAX, u32::MAX, u32::MAX],
        pre: None,
        post: Some(u32::MAX),
        dev: None,
        local: vec![],
    })
});

impl TryFrom<&str> for Version {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        pep440::Version::parse(value)
            .map(Version::Real)
            .ok_or_else(|| anyhow!("failed to parse version {:?}", value))
    }
}

try_from_str_boilerplate!(Version);

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Real(v) => write!(f, "{}", v),
            Version::Virtual => write!(f, "virtual"),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.cmp(other), Ordering::Equal)
    }
}
impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Virtual, Version::Virtual) => Ordering::Equal,
            (Version::Virtual, Version::Real(_)) => Ordering::Greater,
            (Version::Real(_), Version::Virtual) => Ordering::Less,
            (Version::Real(a), Version::Real(b)) => a.cmp(b),
        }
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Version::Real(v) => v.to_string().hash(state),
            Version::Virtual => "::virtual::".hash(state),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn virtual_never_equals_real() {
        let real: Version = "1.0".try_into().unwrap();
        assert_ne!(real, Version::Virtual);
        assert_ne!(Version::Virtual, real);
    }

    #[test]
    fn virtual_sorts_after_every_real_version() {
        let small: Version = "0.0.1".try_into().unwrap();
        let huge: Version = "999999.0".try_into().unwrap();
        assert!(Version::Virtual > small);
        assert!(Version::Virtual > huge);
    }

    #[test]
    fn real_versions_compare_numerically() {
        let a: Version = "1.9".try_into().unwrap();
        let b: Version = "1.10".try_into().unwrap();
        assert!(b > a);
    }

    #[test]
    fn display_suppresses_for_virtual() {
        assert_eq!(Version::Virtual.to_string(), "virtual");
        let real: Version = "1.0".try_into().unwrap();
        assert_eq!(real.to_string(), "1.0");
    }
}
