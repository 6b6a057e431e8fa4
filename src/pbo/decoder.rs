use crate::pbo::register::VariableRegister;
use crate::prelude::*;
use std::io::Write;

/// A parsed solver report (spec.md §4.K / §6): the text after `s ` on the
/// status line, and the whitespace-separated `v `-line assignment tokens.
#[derive(Debug, Clone)]
pub struct SolverReport {
    pub status: Option<String>,
    pub assignment: Vec<String>,
}

impl SolverReport {
    /// Parse raw solver stdout: a `s <status>` line and a `v <tokens...>`
    /// line, in either order, ignoring anything else (comment lines, etc.).
    pub fn parse(raw: &str) -> SolverReport {
        let mut status = None;
        let mut assignment = Vec::new();
        for line in raw.lines() {
            if let Some(rest) = line.strip_prefix("s ") {
                status = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("v ") {
                assignment.extend(rest.split_whitespace().map(|s| s.to_string()));
            }
        }
        SolverReport { status, assignment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedPackage {
    pub name: Name,
    pub version: Version,
    pub extras: BTreeSet<Extra>,
}

/// Maps a solver's assignment back to a pinned package list (spec.md
/// §4.K). Requires `status == "OPTIMUM FOUND"` exactly; anything else is a
/// [`ResolverError::NoSolution`].
pub fn decode(report: &SolverReport, register: &VariableRegister) -> Result<Vec<PinnedPackage>> {
    if report.status.as_deref() != Some("OPTIMUM FOUND") {
        return Err(ResolverError::NoSolution {
            status: report.status.clone(),
        }
        .into());
    }

    let mut grouped: BTreeMap<(Name, Version), BTreeSet<Extra>> = BTreeMap::new();
    for token in &report.assignment {
        let Some(id_str) = token.strip_prefix('x') else {
            continue; // negated assignments are `-x<id>`; not selected
        };
        let Ok(raw_id) = id_str.parse::<u32>() else {
            continue;
        };
        let Some((name, version, extra)) = register.resolve_single(crate::pbo::register::VarId(raw_id)) else {
            continue; // a set or linking virtual variable, not a package selection
        };
        grouped
            .entry((name.clone(), version.clone()))
            .or_default()
            .insert(extra.clone());
    }

    Ok(grouped
        .into_iter()
        .map(|((name, version), extras)| PinnedPackage { name, version, extras })
        .collect())
}

/// Writes pinned packages as `<name>[==<version>][[extra1,extra2,...]]`,
/// one per line, in ascending name order (spec.md §6). `==<version>` is
/// suppressed for [`Version::Virtual`] selections.
pub fn write_requirements(pins: &[PinnedPackage], out: &mut dyn Write) -> Result<()> {
    for pin in pins {
        write!(out, "{}", pin.name)?;
        if !pin.version.is_virtual() {
            write!(out, "=={}", pin.version)?;
        }
        let extras: Vec<&Extra> = pin.extras.iter().filter(|e| !e.is_base()).collect();
        if !extras.is_empty() {
            write!(
                out,
                "[{}]",
                extras.iter().map(|e| e.as_str()).collect::<Vec<_>>().join(",")
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn mk_register() -> (VariableRegister, Name, Version) {
        let mut reg = VariableRegister::new();
        let name = Name::new("a");
        let version: Version = "1.0".try_into().unwrap();
        let mut extras = BTreeSet::new();
        extras.insert(Extra::base());
        reg.register_single(&name, &version, &extras).unwrap();
        (reg, name, version)
    }

    #[test]
    fn non_optimal_status_is_an_error() {
        let (reg, _, _) = mk_register();
        let report = SolverReport {
            status: Some("UNSATISFIABLE".to_string()),
            assignment: vec![],
        };
        assert!(decode(&report, &reg).is_err());
    }

    #[test]
    fn positive_token_selects_package_negative_does_not() {
        let (reg, name, version) = mk_register();
        let id = reg.get_single(&name, &version, &Extra::base()).unwrap();
        let report = SolverReport {
            status: Some("OPTIMUM FOUND".to_string()),
            assignment: vec![format!("x{}", id.0)],
        };
        let pins = decode(&report, &reg).unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].name, name);
        assert_eq!(pins[0].version, version);

        let negative_report = SolverReport {
            status: Some("OPTIMUM FOUND".to_string()),
            assignment: vec![format!("-x{}", id.0)],
        };
        assert_eq!(decode(&negative_report, &reg).unwrap().len(), 0);
    }

    #[test]
    fn write_requirements_formats_version_and_extras() {
        let mut pins = vec![
            PinnedPackage {
                name: Name::new("b"),
                version: "2.0".try_into().unwrap(),
                extras: BTreeSet::new(),
            },
            PinnedPackage {
                name: Name::new("a"),
                version: Version::Virtual,
                extras: [Extra::new("x"), Extra::new("y")].into_iter().collect(),
            },
        ];
        pins.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = Vec::new();
        write_requirements(&pins, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            indoc::indoc! {"
                a[x,y]
                b==2.0
            "}
        );
    }
}
