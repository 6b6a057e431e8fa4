use crate::prelude::*;
use std::path::PathBuf;

/// Resolves the cache root: an explicit `--cache-dir` wins, then
/// `PINCALC_CACHE_DIR`, then the platform cache directory
/// (`directories::ProjectDirs`, see `prelude::PROJECT_DIRS`).
pub fn resolve_cache_dir(cli_override: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_override {
        return dir;
    }
    if let Ok(dir) = std::env::var("PINCALC_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    PROJECT_DIRS.cache_dir().to_path_buf()
}

/// Root of the PyPI JSON API, overridable for pointing at a private mirror.
pub fn resolve_pypi_root() -> Result<Url> {
    match std::env::var("PINCALC_PYPI_ROOT") {
        Ok(raw) => raw.as_str().try_into().with_context(|| format!("parsing PINCALC_PYPI_ROOT={:?}", raw)),
        Err(_) => Ok(crate::index::PYPI_ROOT.clone()),
    }
}
