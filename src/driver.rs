use crate::cache::Cache;
use crate::cli::{CalcArgs, PathSpec};
use crate::extractor::Extractor;
use crate::index::PackageIndex;
use crate::pbo::{decode, encode, write_requirements, PinnedPackage};
use crate::prelude::*;
use crate::scheduler::Scheduler;
use crate::solver;
use std::io::Write as _;

/// Wires components A–K end-to-end (spec.md §2's data flow): seed from the
/// local project roots, drive the scheduler to exhaustion, encode, solve,
/// decode, and write the pinned requirements.
pub fn run_calc(
    args: &CalcArgs,
    cache: &dyn Cache,
    index: &dyn PackageIndex,
    extractor: &dyn Extractor,
) -> Result<()> {
    let mut scheduler = Scheduler::new(args.report_every.max(1));
    let mut must_satisfy = Vec::new();

    for path_spec in &args.paths {
        seed_from_path(path_spec, cache, extractor, &mut scheduler, &mut must_satisfy)?;
    }

    while let Some((name, extra)) = scheduler.get() {
        if args.cached {
            scheduler.process_cached(cache, &name, &extra)?;
        } else {
            scheduler.process_extract(cache, index, extractor, &name, &extra);
        }
    }

    let problem = encode(scheduler.done_set(), cache, &must_satisfy)?;

    let opb_dir = tempfile::tempdir().context("creating scratch directory for the .opb file")?;
    let opb_path = opb_dir.path().join("problem.opb");
    {
        let mut opb_file = std::fs::File::create(&opb_path)
            .with_context(|| format!("creating {}", opb_path.display()))?;
        problem.write_opb(&mut opb_file)?;
    }

    let report = solver::run(&args.solver, &opb_path)?;

    let pins = decode(&report, &problem.register).map_err(|e| {
        if matches!(e.downcast_ref::<ResolverError>(), Some(ResolverError::NoSolution { .. })) {
            warn!("cannot find a solution");
        }
        e
    })?;

    let pins = filter_seeds(pins, &must_satisfy, args.include_seeds);

    let mut writer: Box<dyn std::io::Write> = match &args.outfile {
        Some(path) => Box::new(std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(std::io::stdout()),
    };
    write_requirements(&pins, writer.as_mut())?;
    writer.flush()?;
    Ok(())
}

fn seed_from_path(
    path_spec: &PathSpec,
    cache: &dyn Cache,
    extractor: &dyn Extractor,
    scheduler: &mut Scheduler,
    must_satisfy: &mut Vec<(Name, Version)>,
) -> Result<()> {
    let record = extractor
        .from_path(&path_spec.path)?
        .ok_or_else(|| anyhow!("could not extract metadata from {}", path_spec.path.display()))?;
    cache.set(&record)?;

    must_satisfy.push((record.name.clone(), record.version.clone()));
    scheduler.seed(record.name.clone(), Extra::base());
    for extra in &path_spec.extras {
        scheduler.seed(record.name.clone(), extra.clone());
    }
    scheduler.add_todos_from_db(cache, &record.name, &record.version, &Extra::base())?;
    for extra in &path_spec.extras {
        scheduler.add_todos_from_db(cache, &record.name, &record.version, extra)?;
    }
    Ok(())
}

fn filter_seeds(pins: Vec<PinnedPackage>, must_satisfy: &[(Name, Version)], include_seeds: bool) -> Vec<PinnedPackage> {
    if include_seeds {
        return pins;
    }
    let seeds: BTreeSet<(Name, Version)> = must_satisfy.iter().cloned().collect();
    pins.into_iter().filter(|p| !seeds.contains(&(p.name.clone(), p.version.clone()))).collect()
}

/// The `get` subcommand (`eprc/__main__.py::run_get`): pretty-print the
/// cached record(s) for a name, optionally pinned to one version.
pub fn run_get(cache: &dyn Cache, name: &Name, version: Option<&Version>) -> Result<()> {
    let records = match version {
        Some(v) => cache.get(name, v)?.into_iter().collect::<Vec<_>>(),
        None => {
            let mut out = Vec::new();
            for v in cache.all_versions(name)? {
                if let Some(record) = cache.get(name, &v)? {
                    out.push(record);
                }
            }
            out
        }
    };

    if records.is_empty() {
        println!("(no cached metadata for {})", name);
        return Ok(());
    }
    for record in records {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::{FakeExtractor, MemCache};

    #[test]
    fn linear_chain_prefers_newest_version() {
        let cache = MemCache::default();
        cache
            .set(&MetadataRecord::new(
                "p0",
                "1.0".try_into().unwrap(),
                vec![Requirement::new("a", vec![], vec![(CompareOp::GreaterThanEqual, "1.0".try_into().unwrap())])],
                vec![],
                vec![],
                BTreeMap::new(),
            ))
            .unwrap();
        cache.set(&MetadataRecord::new("a", "1.0".try_into().unwrap(), vec![], vec![], vec![], BTreeMap::new())).unwrap();
        cache.set(&MetadataRecord::new("a", "2.0".try_into().unwrap(), vec![], vec![], vec![], BTreeMap::new())).unwrap();

        let mut scheduler = Scheduler::new(1000);
        scheduler.seed(Name::new("a"), Extra::base());
        scheduler.add_todos_from_db(&cache, &Name::new("p0"), &"1.0".try_into().unwrap(), &Extra::base()).unwrap();
        while let Some((name, extra)) = scheduler.get() {
            scheduler.process_cached(&cache, &name, &extra).unwrap();
        }

        let must_satisfy = vec![(Name::new("p0"), "1.0".try_into().unwrap())];
        let problem = encode(scheduler.done_set(), &cache, &must_satisfy).unwrap();

        let a_base = problem.register.get_single(&Name::new("a"), &"2.0".try_into().unwrap(), &Extra::base()).unwrap();
        let p0_base = problem.register.get_single(&Name::new("p0"), &"1.0".try_into().unwrap(), &Extra::base()).unwrap();
        let report = crate::pbo::SolverReport {
            status: Some("OPTIMUM FOUND".to_string()),
            assignment: vec![format!("x{}", a_base.0), format!("x{}", p0_base.0)],
        };
        let pins = decode(&report, &problem.register).unwrap();
        let filtered = filter_seeds(pins, &must_satisfy, false);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, Name::new("a"));
        assert_eq!(filtered[0].version, "2.0".try_into().unwrap());
    }

    #[test]
    fn seed_from_path_fails_when_extraction_yields_nothing() {
        let cache = MemCache::default();
        let extractor = FakeExtractor::default();
        let mut scheduler = Scheduler::new(1000);
        let mut must_satisfy = Vec::new();
        let spec = PathSpec {
            path: std::path::PathBuf::from("/nonexistent"),
            extras: vec![],
        };
        let result = seed_from_path(&spec, &cache, &extractor, &mut scheduler, &mut must_satisfy);
        assert!(result.is_err());
    }
}
