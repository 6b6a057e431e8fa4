use crate::prelude::*;
use std::fs::{self, File};
use std::io::prelude::*;
use std::path::PathBuf;

/// The key-value cache interface from spec.md §4.E/§6: `set`/`get` keyed by
/// `(name, version)`, plus a prefix-scan that lists every cached version of
/// a name. The concrete storage format and backend are a black-box external
/// collaborator per spec.md §1 -- only this contract matters to the rest of
/// the core.
pub trait Cache: Send + Sync {
    fn set(&self, record: &MetadataRecord) -> Result<()>;
    fn get(&self, name: &Name, version: &Version) -> Result<Option<MetadataRecord>>;
    fn all_versions(&self, name: &Name) -> Result<Vec<Version>>;
}

/// A directory-per-name, file-per-version JSON store. Writes go through a
/// temp file in the same directory and then `persist` (rename) into place,
/// the same technique `njsmith-posy`'s blob cache uses to make writes
/// atomic without a separate lock file -- safe here because every write to
/// a given key is idempotent (same normalized name/version always produces
/// the same content, spec.md §5), so even a racing concurrent writer can
/// only ever clobber a key with an equivalent value.
pub struct FsCache {
    base: PathBuf,
}

impl FsCache {
    pub fn new(base: impl Into<PathBuf>) -> Result<FsCache> {
        let base = base.into();
        fs::create_dir_all(&base)
            .with_context(|| format!("creating cache directory {}", base.display()))?;
        Ok(FsCache { base })
    }

    fn dir_for(&self, name: &Name) -> PathBuf {
        self.base.join(name.as_str())
    }

    fn path_for(&self, name: &Name, version: &Version) -> PathBuf {
        self.dir_for(name).join(format!("{}.json", version_key(version)))
    }
}

/// Versions can contain characters that aren't filesystem-friendly on every
/// platform (e.g. `+local` segments contain `+`). We only need a key that's
/// stable and collision-free, not human-typeable, so percent-encode
/// anything outside a small safe set.
fn version_key(version: &Version) -> String {
    version
        .to_string()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') { c } else { '_' })
        .collect()
}

impl Cache for FsCache {
    fn set(&self, record: &MetadataRecord) -> Result<()> {
        let dir = self.dir_for(&record.name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
        let path = self.path_for(&record.name, &record.version);
        let data = serde_json::to_vec_pretty(record)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(&data)?;
        tmp.persist(&path)
            .with_context(|| format!("writing cache entry {}", path.display()))?;
        Ok(())
    }

    fn get(&self, name: &Name, version: &Version) -> Result<Option<MetadataRecord>> {
        let path = self.path_for(name, version);
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(Some(serde_json::from_str(&buf)?))
    }

    fn all_versions(&self, name: &Name) -> Result<Vec<Version>> {
        let dir = self.dir_for(name);
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // The version is stored inside the record, not just derived
            // from the (lossily-encoded) filename, so read it back out.
            let mut buf = String::new();
            File::open(&path)?.read_to_string(&mut buf)?;
            let record: MetadataRecord = serde_json::from_str(&buf)?;
            versions.push(record.version);
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mk(name: &str, version: &str) -> MetadataRecord {
        MetadataRecord::new(
            name,
            version.try_into().unwrap(),
            vec![],
            vec![],
            vec![],
            BTreeMap::new(),
        )
    }

    #[test]
    fn roundtrip_set_get() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FsCache::new(dir.path()).unwrap();
        let record = mk("foo", "1.0");
        cache.set(&record).unwrap();
        let got = cache
            .get(&Name::new("foo"), &"1.0".try_into().unwrap())
            .unwrap();
        assert_eq!(got, Some(record));
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FsCache::new(dir.path()).unwrap();
        let got = cache
            .get(&Name::new("nope"), &"1.0".try_into().unwrap())
            .unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn all_versions_lists_every_cached_version() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FsCache::new(dir.path()).unwrap();
        cache.set(&mk("foo", "1.0")).unwrap();
        cache.set(&mk("foo", "2.0")).unwrap();
        cache.set(&mk("bar", "1.0")).unwrap();

        let mut versions = cache.all_versions(&Name::new("foo")).unwrap();
        versions.sort();
        assert_eq!(
            versions,
            vec!["1.0".try_into().unwrap(), "2.0".try_into().unwrap()]
        );
    }

    #[test]
    fn unknown_name_has_no_versions() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FsCache::new(dir.path()).unwrap();
        assert_eq!(cache.all_versions(&Name::new("ghost")).unwrap(), vec![]);
    }

    #[test]
    fn overwrite_replaces_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = FsCache::new(dir.path()).unwrap();
        let mut record = mk("foo", "1.0");
        cache.set(&record).unwrap();
        record
            .install_requires
            .push(Requirement::new("bar", vec![], vec![]));
        cache.set(&record).unwrap();
        let got = cache
            .get(&Name::new("foo"), &"1.0".try_into().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(got.install_requires.len(), 1);
    }
}
