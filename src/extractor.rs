use crate::cache::Cache;
use crate::index::PackageIndex;
use crate::prelude::*;
use std::io::Read;
use std::path::Path;
use std::process::Command;

/// The metadata extractor contract from spec.md §6.G: turn a source tree
/// into a normalized [`MetadataRecord`], or `None` if extraction genuinely
/// produced nothing (not found / not importable / build failed). Extraction
/// failures are the caller's (scheduler's) problem to blacklist, not this
/// trait's to report as an error -- only truly unexpected failures (process
/// couldn't even start, I/O error) should surface as `Err`.
pub trait Extractor: Send + Sync {
    fn from_path(&self, path: &Path) -> Result<Option<MetadataRecord>>;
    fn from_pypi(
        &self,
        index: &dyn PackageIndex,
        cache: &dyn Cache,
        name: &Name,
        version: &Version,
    ) -> Result<Option<MetadataRecord>>;
    fn from_native(&self, name: &Name) -> Result<Option<MetadataRecord>>;
}

/// Runs the extractor the way `original_source/eprc`'s `extractor.py` does:
/// spin up a throwaway virtualenv, run a small script inside it that mocks
/// out `setuptools.setup`/`distutils.core.setup` and records whatever
/// keyword arguments the package's `setup.py` was called with, then read
/// the result back from a hand-off JSON file.
pub struct SubprocessExtractor {
    pub virtualenv_cmd: String,
    pub scratch_dir: std::path::PathBuf,
}

/// The embedded sandbox script: mocks `setup()` and `__import__`, per
/// `original_source/eprc/extractors/setup_py.py`. Kept as a single
/// self-contained script (no package data files to ship) since the whole
/// point is that it runs inside a freshly created, disposable virtualenv.
const SETUP_PY_SANDBOX: &str = include_str!("extractor_sandbox/setup_py_sandbox.py");
const NATIVE_PROBE: &str = include_str!("extractor_sandbox/native_probe.py");

impl SubprocessExtractor {
    pub fn new(virtualenv_cmd: impl Into<String>, scratch_dir: impl Into<std::path::PathBuf>) -> Self {
        SubprocessExtractor {
            virtualenv_cmd: virtualenv_cmd.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    fn run_sandboxed(&self, script: &str, cwd: Option<&Path>, args: &[&str]) -> Result<Option<MetadataRecord>> {
        let venv_dir = tempfile::tempdir_in(&self.scratch_dir)
            .context("creating scratch virtualenv directory")?;
        let status = Command::new(&self.virtualenv_cmd)
            .arg(venv_dir.path())
            .status()
            .with_context(|| format!("invoking virtualenv command {:?}", self.virtualenv_cmd))?;
        if !status.success() {
            warn!("virtualenv creation failed with {:?}", status);
            return Ok(None);
        }

        let script_path = venv_dir.path().join("_sandbox.py");
        std::fs::write(&script_path, script)?;
        let extract_path = venv_dir.path().join("extract_result.json");

        let python = venv_dir.path().join("bin").join("python");
        let mut cmd = Command::new(&python);
        cmd.arg(&script_path)
            .args(args)
            .env("PINCALC_EXTRACT_PATH", &extract_path);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        let status = cmd.status().context("invoking sandboxed extractor script")?;
        if !status.success() || !extract_path.exists() {
            return Ok(None);
        }

        let mut buf = String::new();
        std::fs::File::open(&extract_path)?.read_to_string(&mut buf)?;
        let record: MetadataRecord = serde_json::from_str(&buf)
            .context("parsing extractor result JSON")?;
        Ok(Some(record))
    }

    fn download_and_unpack(&self, url: &Url) -> Result<tempfile::TempDir> {
        let dest = tempfile::tempdir_in(&self.scratch_dir)?;
        let resp = ureq::get(url.as_str())
            .call()
            .with_context(|| format!("downloading {}", url))?;
        let mut body = Vec::new();
        resp.into_reader().read_to_end(&mut body)?;

        let digest = ring::digest::digest(&ring::digest::SHA256, &body);
        debug!("downloaded {} ({} bytes, sha256:{})", url, body.len(), data_encoding::HEXLOWER.encode(digest.as_ref()));

        let path = url.path();
        if path.ends_with(".zip") || path.ends_with(".whl") {
            let cursor = std::io::Cursor::new(body);
            let mut archive = zip::ZipArchive::new(cursor)?;
            archive.extract(dest.path())?;
        } else {
            // .tar.gz / .tgz, the overwhelmingly common sdist format
            let gz = flate2::read::GzDecoder::new(std::io::Cursor::new(body));
            let mut archive = tar::Archive::new(gz);
            archive.unpack(dest.path())?;
        }
        Ok(dest)
    }
}

impl Extractor for SubprocessExtractor {
    fn from_path(&self, path: &Path) -> Result<Option<MetadataRecord>> {
        self.run_sandboxed(SETUP_PY_SANDBOX, Some(path), &[])
    }

    fn from_pypi(
        &self,
        index: &dyn PackageIndex,
        cache: &dyn Cache,
        name: &Name,
        version: &Version,
    ) -> Result<Option<MetadataRecord>> {
        let real_name = index.real_name(name)?;
        let artifacts = index.release_urls(&real_name, version)?;
        let Some(sdist) = artifacts.iter().find(|a| a.is_sdist()) else {
            warn!("no sdist found for {} {}", real_name, version);
            return Ok(None);
        };

        let unpacked = self.download_and_unpack(&sdist.url)?;
        // sdists unpack to a single top-level directory (`foo-1.0/...`).
        let top_level = std::fs::read_dir(unpacked.path())?
            .filter_map(|e| e.ok())
            .find(|e| e.path().is_dir())
            .map(|e| e.path());
        let Some(top_level) = top_level else {
            warn!("sdist for {} {} had no top-level directory", real_name, version);
            return Ok(None);
        };

        let record = self.from_path(&top_level)?;
        if let Some(record) = &record {
            cache.set(record)?;
        }
        Ok(record)
    }

    fn from_native(&self, name: &Name) -> Result<Option<MetadataRecord>> {
        self.run_sandboxed(NATIVE_PROBE, None, &[name.as_str()])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sandbox_scripts_embed_without_panicking() {
        assert!(SETUP_PY_SANDBOX.contains("setup"));
        assert!(NATIVE_PROBE.contains("__version__"));
    }
}
