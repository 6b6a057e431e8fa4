use crate::prelude::*;

/// `(name, extras, ordered constraint list)` -- spec.md §3's Requirement
/// Spec. `specs` is a conjunction: a version satisfies the requirement only
/// if it satisfies every entry. The virtual version satisfies every
/// requirement unconditionally (spec.md §3, §4.B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: Name,
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[serde(default)]
    pub specs: Vec<(CompareOp, Version)>,
}

impl Requirement {
    pub fn new(name: impl Into<Name>, extras: Vec<Extra>, specs: Vec<(CompareOp, Version)>) -> Requirement {
        Requirement {
            name: name.into(),
            extras,
            specs,
        }
    }

    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        if version.is_virtual() {
            return true;
        }
        self.specs
            .iter()
            .all(|(op, target)| op.satisfied_by(target, version).unwrap_or(false))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn req(specs: Vec<(CompareOp, &str)>) -> Requirement {
        Requirement::new(
            "Foo",
            vec![],
            specs
                .into_iter()
                .map(|(op, v)| (op, v.try_into().unwrap()))
                .collect(),
        )
    }

    #[test]
    fn conjunction_requires_every_spec() {
        let r = req(vec![
            (CompareOp::GreaterThanEqual, "1.0"),
            (CompareOp::StrictlyLessThan, "2.0"),
        ]);
        assert!(r.is_satisfied_by(&"1.5".try_into().unwrap()));
        assert!(!r.is_satisfied_by(&"2.0".try_into().unwrap()));
        assert!(!r.is_satisfied_by(&"0.9".try_into().unwrap()));
    }

    #[test]
    fn no_specs_matches_anything() {
        let r = req(vec![]);
        assert!(r.is_satisfied_by(&"0.0.1".try_into().unwrap()));
    }

    #[test]
    fn virtual_always_satisfies_every_requirement() {
        let r = req(vec![(CompareOp::Equal, "5.0")]);
        assert!(r.is_satisfied_by(&Version::Virtual));
    }

    #[test]
    fn name_is_normalized_on_construction() {
        let r = req(vec![]);
        assert_eq!(r.name, Name::new("foo"));
    }
}
