use crate::cache::Cache;
use crate::pbo::register::{VarId, VariableRegister};
use crate::prelude::*;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct Term {
    pub coeff: i64,
    pub var: VarId,
}

impl Term {
    fn new(coeff: i64, var: VarId) -> Term {
        Term { coeff, var }
    }
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub terms: Vec<Term>,
    pub rhs: i64,
}

/// A fully-built `.opb` instance plus the register that produced it -- the
/// decoder needs the register to map solver output back to packages
/// (spec.md §4.K), so the two travel together.
pub struct EncodedProblem {
    pub register: VariableRegister,
    pub objective: Vec<Term>,
    pub constraints: Vec<Constraint>,
}

impl EncodedProblem {
    pub fn write_opb(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(
            out,
            "* #variable= {} #constraint= {}",
            self.register.variable_count(),
            self.constraints.len()
        )?;

        write!(out, "min:")?;
        for term in &self.objective {
            write!(out, " {}{} {}", sign_prefix(term.coeff), term.coeff.abs(), term.var)?;
        }
        writeln!(out, " ;")?;

        for constraint in &self.constraints {
            for term in &constraint.terms {
                write!(out, "{}{} {} ", sign_prefix(term.coeff), term.coeff.abs(), term.var)?;
            }
            writeln!(out, ">= {} ;", constraint.rhs)?;
        }
        Ok(())
    }
}

fn sign_prefix(coeff: i64) -> &'static str {
    if coeff < 0 {
        "-"
    } else {
        "+"
    }
}

/// Builds the PBO encoding of everything the scheduler discovered (spec.md
/// §4.J). `done` drives which names/extras exist at all; `cache` supplies
/// metadata and the full version list per name; `must_satisfy` pins the root
/// seeds.
pub fn encode(
    done: &BTreeSet<(Name, Extra)>,
    cache: &dyn Cache,
    must_satisfy: &[(Name, Version)],
) -> Result<EncodedProblem> {
    let mut register = VariableRegister::new();
    let mut constraints = Vec::new();

    // Step 1: name/extra discovery.
    let mut name_extras: BTreeMap<Name, BTreeSet<Extra>> = BTreeMap::new();
    for (name, extra) in done {
        let entry = name_extras.entry(name.clone()).or_default();
        entry.insert(Extra::base());
        entry.insert(extra.clone());
    }

    // Step 2: alias compression + single registration.
    // Representative record per (name, version-set), consulted in step 3.
    let mut representatives: BTreeMap<(Name, BTreeSet<Version>), Option<MetadataRecord>> = BTreeMap::new();

    for (name, extras) in &name_extras {
        let mut versions: BTreeSet<Version> = cache.all_versions(name)?.into_iter().collect();
        if versions.is_empty() {
            versions.insert(Version::Virtual);
        }

        for version in &versions {
            register.register_single(name, version, extras)?;
        }

        let mut aliases: BTreeMap<String, (BTreeSet<Version>, Option<MetadataRecord>)> = BTreeMap::new();
        for version in &versions {
            let (fingerprint, record) = if version.is_virtual() {
                ("::virtual::".to_string(), None)
            } else {
                let record = cache
                    .get(name, version)?
                    .ok_or_else(|| ResolverError::MissingMetadata {
                        name: name.clone(),
                        version: version.clone(),
                    })?;
                (record.requirements_fingerprint()?, Some(record))
            };
            let group = aliases.entry(fingerprint).or_insert_with(|| (BTreeSet::new(), record.clone()));
            group.0.insert(version.clone());
            if group.1.is_none() {
                group.1 = record;
            }
        }

        for (group_versions, representative) in aliases.into_values() {
            register.register_set(name, &group_versions, extras)?;
            representatives.insert((name.clone(), group_versions), representative);
        }
    }

    // Step 3: per-(set, extra) requirement encoding.
    let set_entries: Vec<((Name, BTreeSet<Version>, Extra), VarId)> = register
        .iter_sets()
        .map(|(k, v)| (k.clone(), *v))
        .collect();

    for ((name, versions, extra), set_var) in &set_entries {
        let representative = match representatives.get(&(name.clone(), versions.clone())) {
            Some(Some(r)) => r,
            _ => continue,
        };

        let requirements: Vec<Requirement> = if extra.is_base() {
            representative.base_requirements().cloned().collect()
        } else {
            representative.requirements_for_extra(extra).to_vec()
        };

        let s = *set_var;
        let mut link_terms: Vec<Term> = versions
            .iter()
            .map(|v| Term::new(-1, register.get_single(name, v, extra).expect("version was registered above")))
            .collect();
        link_terms.push(Term::new(versions.len() as i64, s));
        constraints.push(Constraint {
            terms: link_terms,
            rhs: 0,
        });

        for req in &requirements {
            let v_r = register.get_virtual_variable();
            constraints.push(Constraint {
                terms: vec![Term::new(-1, s), Term::new(1, v_r)],
                rhs: 0,
            });

            let mut candidate_terms = Vec::new();
            if let Some(known) = register.known_versions(&req.name) {
                let mut req_extras: BTreeSet<Extra> = req.extras.iter().cloned().collect();
                req_extras.insert(Extra::base());
                for w in known {
                    if !w.is_virtual() && !req.is_satisfied_by(w) {
                        continue;
                    }
                    for e in &req_extras {
                        if let Some(var) = register.get_single(&req.name, w, e) {
                            candidate_terms.push(Term::new(1, var));
                        }
                    }
                }
            }

            let mut terms = vec![Term::new(-1, v_r)];
            terms.extend(candidate_terms);
            constraints.push(Constraint { terms, rhs: 0 });
        }
    }

    // Step 4: at-most-one per name (over base-flavor variables).
    for name in register.iter_names().cloned().collect::<Vec<_>>() {
        let versions = register.known_versions(&name).cloned().unwrap_or_default();
        let terms = versions
            .iter()
            .filter_map(|v| register.get_single(&name, v, &Extra::base()))
            .map(|var| Term::new(-1, var))
            .collect::<Vec<_>>();
        if !terms.is_empty() {
            constraints.push(Constraint { terms, rhs: -1 });
        }
    }

    // Step 5: extras imply base.
    for (name, extras) in &name_extras {
        let versions = register.known_versions(name).cloned().unwrap_or_default();
        for extra in extras {
            if extra.is_base() {
                continue;
            }
            for version in &versions {
                if let (Some(extra_var), Some(base_var)) = (
                    register.get_single(name, version, extra),
                    register.get_single(name, version, &Extra::base()),
                ) {
                    constraints.push(Constraint {
                        terms: vec![Term::new(-1, extra_var), Term::new(1, base_var)],
                        rhs: 0,
                    });
                }
            }
        }
    }

    // Step 6: objective -- prefer newer versions.
    let mut objective = Vec::new();
    for name in register.iter_names().cloned().collect::<Vec<_>>() {
        let mut versions: Vec<Version> = register.known_versions(&name).cloned().unwrap_or_default().into_iter().collect();
        versions.sort_by(|a, b| b.cmp(a));
        for (weight, version) in versions.iter().enumerate() {
            if let Some(var) = register.get_single(&name, version, &Extra::base()) {
                objective.push(Term::new(weight as i64, var));
            }
        }
    }

    // Step 7: must-satisfy seeds.
    for (name, version) in must_satisfy {
        let var = register
            .get_single(name, version, &Extra::base())
            .ok_or_else(|| anyhow!("must-satisfy seed {} {} was never registered", name, version))?;
        constraints.push(Constraint {
            terms: vec![Term::new(1, var)],
            rhs: 1,
        });
    }

    Ok(EncodedProblem {
        register,
        objective,
        constraints,
    })
}
