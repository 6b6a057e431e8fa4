use crate::cache::Cache;
use crate::extractor::Extractor;
use crate::index::PackageIndex;
use crate::prelude::*;

/// Drives exhaustive discovery from seed `(name, extra)` pairs until no
/// reachable package remains unprocessed (spec.md §4.H).
///
/// `todo`/`done` are disjoint after every step: `get()` silently drops any
/// popped item that has already been marked `done`, and nothing is ever
/// moved back from `done` into `todo`.
#[derive(Default)]
pub struct Scheduler {
    todo: BTreeSet<(Name, Extra)>,
    done: BTreeSet<(Name, Extra)>,
    blacklist: BTreeSet<(Name, Version)>,
    report_counter: usize,
    pub verbosity: usize,
}

impl Scheduler {
    pub fn new(verbosity: usize) -> Scheduler {
        Scheduler {
            verbosity: verbosity.max(1),
            ..Default::default()
        }
    }

    pub fn done_set(&self) -> &BTreeSet<(Name, Extra)> {
        &self.done
    }

    pub fn seed(&mut self, name: Name, extra: Extra) {
        if !self.done.contains(&(name.clone(), extra.clone())) {
            self.todo.insert((name, extra));
        }
    }

    pub fn done_with_all_versions(&mut self, name: &Name, extra: &Extra) {
        self.done.insert((name.clone(), extra.clone()));
    }

    pub fn blacklist_version(&mut self, name: &Name, version: &Version) {
        self.blacklist.insert((name.clone(), version.clone()));
    }

    pub fn is_version_blacklisted(&self, name: &Name, version: &Version) -> bool {
        self.blacklist.contains(&(name.clone(), version.clone()))
    }

    /// Read the cached record for `(name, version)` and enqueue every
    /// dependency it declares: the base flavor of each
    /// `install_requires ∪ tests_require ∪ setup_requires` entry, plus each
    /// of *that* entry's requested extras, and (only when `extra` itself is
    /// non-empty) the same treatment for `extras_require[extra]`.
    pub fn add_todos_from_db(
        &mut self,
        cache: &dyn Cache,
        name: &Name,
        version: &Version,
        extra: &Extra,
    ) -> Result<()> {
        let record = cache
            .get(name, version)?
            .ok_or_else(|| anyhow!("no cached metadata for {} {}", name, version))?;

        let mut add_all = |reqs: &[Requirement], scheduler: &mut Scheduler| {
            for req in reqs {
                scheduler.seed(req.name.clone(), Extra::base());
                for e in &req.extras {
                    scheduler.seed(req.name.clone(), e.clone());
                }
            }
        };

        let base: Vec<Requirement> = record.base_requirements().cloned().collect();
        add_all(&base, self);

        if !extra.is_base() {
            let extra_reqs = record.requirements_for_extra(extra).to_vec();
            add_all(&extra_reqs, self);
        }

        Ok(())
    }

    /// Pop an arbitrary pending item, skipping (and discarding) anything
    /// already marked done. Every call counts toward the configured
    /// progress-report threshold.
    pub fn get(&mut self) -> Option<(Name, Extra)> {
        let mut found = None;
        while let Some(candidate) = pop_any(&mut self.todo) {
            if !self.done.contains(&candidate) {
                found = Some(candidate);
                break;
            }
        }

        self.report_counter += 1;
        if self.report_counter >= self.verbosity {
            self.report_counter = 0;
            info!(
                "scheduler: done={} todo={} blacklisted={}",
                self.done.len(),
                self.todo.len(),
                self.blacklist.len()
            );
        }

        found
    }

    /// Cache-only discovery: walk every cached version of `name` without
    /// touching the index or extractor at all, then mark `(name, extra)`
    /// done.
    pub fn process_cached(&mut self, cache: &dyn Cache, name: &Name, extra: &Extra) -> Result<()> {
        let versions = cache.all_versions(name)?;
        if versions.is_empty() {
            warn!("no cached versions found for {}", name);
        }
        for version in versions {
            self.add_todos_from_db(cache, name, &version, extra)?;
        }
        self.done_with_all_versions(name, extra);
        Ok(())
    }

    /// Full discovery for `(name, extra)`: try the native probe, canonicalize
    /// against the index, harvest every release not already cached or
    /// blacklisted, and finally mark the item done regardless of outcome
    /// (spec.md §4.H's six-step algorithm).
    pub fn process_extract(
        &mut self,
        cache: &dyn Cache,
        index: &dyn PackageIndex,
        extractor: &dyn Extractor,
        name: &Name,
        extra: &Extra,
    ) {
        let native_found = match extractor.from_native(name) {
            Ok(Some(record)) => {
                let set_result = cache.set(&record);
                if let Err(e) = set_result {
                    warn!("failed to cache native extraction for {}: {}", name, e);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("native extraction failed for {}: {}", name, e);
                false
            }
        };

        let real_name = match index.real_name(name) {
            Ok(n) => n,
            Err(e) => {
                warn!("package index error for {}: {}", name, e);
                return;
            }
        };

        let versions = match index.package_releases(&real_name) {
            Ok(v) => v,
            Err(e) => {
                warn!("package index error listing releases for {}: {}", real_name, e);
                return;
            }
        };

        if versions.is_empty() && !native_found {
            warn!("no versions found for {}", real_name);
            return;
        }

        for version in versions {
            if cache.get(&real_name, &version).ok().flatten().is_some() {
                info!("cached {}:{}", real_name, version);
            } else if self.is_version_blacklisted(&real_name, &version) {
                info!("blacklisted {}:{}", real_name, version);
            } else {
                info!("fetching {}:{}", real_name, version);
                match extractor.from_pypi(index, cache, &real_name, &version) {
                    Ok(Some(_)) => {}
                    Ok(None) => self.blacklist_version(&real_name, &version),
                    Err(e) => {
                        warn!(
                            "unhandled error while processing {}:{} - {}",
                            real_name, version, e
                        );
                        self.blacklist_version(&real_name, &version);
                    }
                }
            }

            if let Ok(Some(_)) = cache.get(&real_name, &version) {
                if let Err(e) = self.add_todos_from_db(cache, &real_name, &version, extra) {
                    warn!("failed to enqueue dependencies of {}:{} - {}", real_name, version, e);
                }
            }
        }

        self.done_with_all_versions(&real_name, extra);
    }
}

/// `BTreeSet` has no `pop_first`-agnostic "pop anything" primitive that also
/// works pre-1.66 MSRV-wise, and order here is explicitly unspecified
/// (spec.md §5) -- so just take whatever the iterator gives us first.
fn pop_any<T: Ord + Clone>(set: &mut BTreeSet<T>) -> Option<T> {
    let item = set.iter().next().cloned()?;
    set.remove(&item);
    Some(item)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::{FakeExtractor, FakeIndex, MemCache};

    fn mk_record(name: &str, version: &str, deps: Vec<Requirement>) -> MetadataRecord {
        MetadataRecord::new(
            name,
            version.try_into().unwrap(),
            deps,
            vec![],
            vec![],
            BTreeMap::new(),
        )
    }

    #[test]
    fn todo_and_done_are_always_disjoint() {
        let mut s = Scheduler::new(1000);
        s.seed(Name::new("a"), Extra::base());
        s.seed(Name::new("b"), Extra::base());
        s.done_with_all_versions(&Name::new("a"), &Extra::base());
        let got = s.get();
        assert_eq!(got, Some((Name::new("b"), Extra::base())));
        assert_eq!(s.get(), None);
    }

    #[test]
    fn add_todos_from_db_enqueues_base_and_requested_extras() {
        let cache = MemCache::default();
        let dep = Requirement::new("dep", vec![Extra::new("x")], vec![]);
        cache.set(&mk_record("root", "1.0", vec![dep])).unwrap();

        let mut s = Scheduler::new(1000);
        s.add_todos_from_db(&cache, &Name::new("root"), &"1.0".try_into().unwrap(), &Extra::base())
            .unwrap();

        let mut seen = BTreeSet::new();
        while let Some(item) = s.get() {
            seen.insert(item);
        }
        assert!(seen.contains(&(Name::new("dep"), Extra::base())));
        assert!(seen.contains(&(Name::new("dep"), Extra::new("x"))));
    }

    #[test]
    fn self_loop_terminates() {
        let cache = MemCache::default();
        let dep = Requirement::new("a", vec![], vec![]);
        cache.set(&mk_record("a", "1.0", vec![dep])).unwrap();

        let mut s = Scheduler::new(1000);
        s.seed(Name::new("a"), Extra::base());
        let mut iterations = 0;
        while let Some((name, extra)) = s.get() {
            iterations += 1;
            assert!(iterations < 1000, "scheduler looped on a self-dependency");
            s.process_cached(&cache, &name, &extra).unwrap();
        }
        assert!(s.done_set().contains(&(Name::new("a"), Extra::base())));
    }

    #[test]
    fn process_cached_marks_done_even_with_no_versions() {
        let cache = MemCache::default();
        let mut s = Scheduler::new(1000);
        s.process_cached(&cache, &Name::new("ghost"), &Extra::base()).unwrap();
        assert!(s.done_set().contains(&(Name::new("ghost"), Extra::base())));
    }

    #[test]
    fn process_extract_blacklists_failed_versions_and_continues() {
        let cache = MemCache::default();
        let index = FakeIndex::with_releases("flaky", vec!["1.0", "2.0"]);
        let extractor = FakeExtractor::failing_for("flaky", "1.0");

        let mut s = Scheduler::new(1000);
        s.process_extract(&cache, &index, &extractor, &Name::new("flaky"), &Extra::base());

        assert!(s.is_version_blacklisted(&Name::new("flaky"), &"1.0".try_into().unwrap()));
        assert!(!s.is_version_blacklisted(&Name::new("flaky"), &"2.0".try_into().unwrap()));
        assert!(s.done_set().contains(&(Name::new("flaky"), Extra::base())));
    }

    #[test]
    fn process_extract_with_index_error_does_not_mark_done() {
        let cache = MemCache::default();
        let index = FakeIndex::erroring();
        let extractor = FakeExtractor::default();

        let mut s = Scheduler::new(1000);
        s.process_extract(&cache, &index, &extractor, &Name::new("anything"), &Extra::base());

        assert!(!s.done_set().contains(&(Name::new("anything"), Extra::base())));
    }
}
