//! In-memory fakes shared by scheduler/encoder/driver tests, mirroring
//! `njsmith-posy`'s `test_util.rs`: one place for test doubles so individual
//! modules don't each reinvent a `PackageIndex`/`Extractor`/`Cache`.
#![cfg(test)]

use crate::cache::Cache;
use crate::extractor::Extractor;
use crate::index::{PackageIndex, ReleaseArtifact};
use crate::prelude::*;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeIndex {
    real_names: Mutex<HashMap<String, Name>>,
    releases: Mutex<HashMap<String, Vec<Version>>>,
    urls: Mutex<HashMap<(String, String), Vec<ReleaseArtifact>>>,
    error: bool,
}

impl FakeIndex {
    pub fn with_releases(name: &str, versions: Vec<&str>) -> FakeIndex {
        let index = FakeIndex::default();
        index.releases.lock().unwrap().insert(
            Name::new(name).as_str().to_owned(),
            versions.into_iter().map(|v| v.try_into().unwrap()).collect(),
        );
        index
    }

    pub fn erroring() -> FakeIndex {
        FakeIndex {
            error: true,
            ..Default::default()
        }
    }
}

impl PackageIndex for FakeIndex {
    fn real_name(&self, name: &Name) -> Result<Name> {
        if self.error {
            bail!("simulated index failure for {}", name);
        }
        Ok(self
            .real_names
            .lock()
            .unwrap()
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| name.clone()))
    }

    fn package_releases(&self, name: &Name) -> Result<Vec<Version>> {
        if self.error {
            bail!("simulated index failure for {}", name);
        }
        Ok(self
            .releases
            .lock()
            .unwrap()
            .get(name.as_str())
            .cloned()
            .unwrap_or_default())
    }

    fn release_urls(&self, name: &Name, version: &Version) -> Result<Vec<ReleaseArtifact>> {
        if self.error {
            bail!("simulated index failure for {}", name);
        }
        Ok(self
            .urls
            .lock()
            .unwrap()
            .get(&(name.as_str().to_owned(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// A fake [`Extractor`] that always reports "nothing found" except for a
/// configurable set of `(name, version)` pairs that are made to fail, so
/// tests can exercise the blacklisting path deterministically.
#[derive(Default)]
pub struct FakeExtractor {
    failures: Mutex<std::collections::HashSet<(String, String)>>,
}

impl FakeExtractor {
    pub fn failing_for(name: &str, version: &str) -> FakeExtractor {
        let extractor = FakeExtractor::default();
        extractor
            .failures
            .lock()
            .unwrap()
            .insert((Name::new(name).as_str().to_owned(), version.to_owned()));
        extractor
    }
}

impl Extractor for FakeExtractor {
    fn from_path(&self, _path: &std::path::Path) -> Result<Option<MetadataRecord>> {
        Ok(None)
    }

    fn from_pypi(
        &self,
        _index: &dyn PackageIndex,
        _cache: &dyn Cache,
        name: &Name,
        version: &Version,
    ) -> Result<Option<MetadataRecord>> {
        if self
            .failures
            .lock()
            .unwrap()
            .contains(&(name.as_str().to_owned(), version.to_string()))
        {
            return Ok(None);
        }
        Ok(Some(MetadataRecord::new(
            name.as_str(),
            version.clone(),
            vec![],
            vec![],
            vec![],
            BTreeMap::new(),
        )))
    }

    fn from_native(&self, _name: &Name) -> Result<Option<MetadataRecord>> {
        Ok(None)
    }
}

/// An in-memory [`Cache`], for tests that want scheduler/encoder coverage
/// without touching the filesystem.
#[derive(Default)]
pub struct MemCache {
    records: Mutex<BTreeMap<(Name, Version), MetadataRecord>>,
}

impl Cache for MemCache {
    fn set(&self, record: &MetadataRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert((record.name.clone(), record.version.clone()), record.clone());
        Ok(())
    }

    fn get(&self, name: &Name, version: &Version) -> Result<Option<MetadataRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(name.clone(), version.clone()))
            .cloned())
    }

    fn all_versions(&self, name: &Name) -> Result<Vec<Version>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .keys()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect())
    }
}
