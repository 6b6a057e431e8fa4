use crate::prelude::*;
use std::ops::Range;

/// The comparison operators a Requirement's constraint list can use. PEP 440
/// wildcard specifiers (`== 1.2.*`) are not modeled: the metadata extractor
/// hands the core already-parsed `(op, version)` pairs (spec.md §3), so there
/// is never a raw wildcard string to interpret here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Equal,
    NotEqual,
    LessThanEqual,
    StrictlyLessThan,
    GreaterThanEqual,
    StrictlyGreaterThan,
    Compatible,
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CompareOp::*;
        write!(
            f,
            "{}",
            match self {
                Equal => "==",
                NotEqual => "!=",
                LessThanEqual => "<=",
                StrictlyLessThan => "<",
                GreaterThanEqual => ">=",
                StrictlyGreaterThan => ">",
                Compatible => "~=",
            }
        )
    }
}

impl TryFrom<&str> for CompareOp {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        use CompareOp::*;
        Ok(match value {
            "==" => Equal,
            "!=" => NotEqual,
            "<=" => LessThanEqual,
            "<" => StrictlyLessThan,
            ">=" => GreaterThanEqual,
            ">" => StrictlyGreaterThan,
            "~=" => Compatible,
            "===" => bail!("'===' is not implemented"),
            _ => bail!("unrecognized operator: {:?}", value),
        })
    }
}

try_from_str_boilerplate!(CompareOp);

impl CompareOp {
    /// Convert a comparison like `(>=, 1.2)` into a union of `[low, high)`
    /// ranges over real versions. `Version::Virtual` never appears as the
    /// right-hand side of a constraint -- callers that need "does this
    /// version satisfy the requirement" should special-case `Virtual` before
    /// calling into ranges (see `Requirement::is_satisfied_by`).
    pub fn to_ranges(&self, rhs: &Version) -> Result<Vec<Range<Version>>> {
        use CompareOp::*;
        let version = rhs.clone();
        if version.is_virtual() {
            bail!("a requirement cannot compare against the virtual version");
        }
        Ok(match self {
            LessThanEqual => vec![VERSION_ZERO.clone()..version.next()],
            GreaterThanEqual => vec![version.clone()..VERSION_INFINITY.clone()],
            Equal => vec![version.clone()..version.next()],
            NotEqual => vec![
                VERSION_ZERO.clone()..version.clone(),
                version.next()..VERSION_INFINITY.clone(),
            ],
            StrictlyGreaterThan => {
                let Version::Real(v) = &version else { unreachable!() };
                let mut low = v.clone();
                if let Some(dev) = &v.dev {
                    low.dev = Some(dev + 1);
                } else if let Some(post) = &v.post {
                    low.post = Some(post + 1);
                } else {
                    low.post = Some(u32::MAX);
                }
                vec![Version::Real(low)..VERSION_INFINITY.clone()]
            }
            StrictlyLessThan => {
                let Version::Real(v) = &version else { unreachable!() };
                if v.pre.is_none() && v.dev.is_none() {
                    let mut new_max = v.clone();
                    new_max.dev = Some(0);
                    new_max.post = None;
                    new_max.local = vec![];
                    vec![VERSION_ZERO.clone()..Version::Real(new_max)]
                } else {
                    vec![VERSION_ZERO.clone()..version]
                }
            }
            // ~= X.Y.suffixes means >= X.Y.suffixes && == X.*, i.e. the
            // half-open range [X.Y.suffixes, (X+1).dev0).
            Compatible => {
                let Version::Real(v) = &version else { unreachable!() };
                if v.release.len() < 2 {
                    bail!("~= operator requires a version with two segments (X.Y)");
                }
                let mut release = v.release.clone();
                release.pop().unwrap();
                *release.last_mut().unwrap() += 1;
                let new_max = Version::Real(pep440::Version {
                    epoch: v.epoch,
                    release,
                    pre: None,
                    post: None,
                    dev: Some(0),
                    local: vec![],
                });
                vec![version..new_max]
            }
        })
    }

    pub fn satisfied_by(&self, rhs: &Version, candidate: &Version) -> Result<bool> {
        if candidate.is_virtual() {
            return Ok(true);
        }
        Ok(self
            .to_ranges(rhs)?
            .into_iter()
            .any(|r| *candidate >= r.start && *candidate < r.end))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(s: &str) -> Version {
        s.try_into().unwrap()
    }

    #[test]
    fn equal_matches_only_exact() {
        assert!(CompareOp::Equal.satisfied_by(&v("1.0"), &v("1.0")).unwrap());
        assert!(!CompareOp::Equal.satisfied_by(&v("1.0"), &v("1.1")).unwrap());
    }

    #[test]
    fn gte_is_inclusive() {
        assert!(CompareOp::GreaterThanEqual.satisfied_by(&v("1.0"), &v("1.0")).unwrap());
        assert!(CompareOp::GreaterThanEqual.satisfied_by(&v("1.0"), &v("2.0")).unwrap());
        assert!(!CompareOp::GreaterThanEqual.satisfied_by(&v("1.0"), &v("0.9")).unwrap());
    }

    #[test]
    fn compatible_release_range() {
        // ~= 1.4.2 means >= 1.4.2, == 1.4.*
        assert!(CompareOp::Compatible.satisfied_by(&v("1.4.2"), &v("1.4.5")).unwrap());
        assert!(!CompareOp::Compatible.satisfied_by(&v("1.4.2"), &v("1.5.0")).unwrap());
    }

    #[test]
    fn virtual_always_satisfies() {
        assert!(CompareOp::Equal.satisfied_by(&v("1.0"), &Version::Virtual).unwrap());
        assert!(CompareOp::StrictlyLessThan.satisfied_by(&v("0.1"), &Version::Virtual).unwrap());
    }
}
