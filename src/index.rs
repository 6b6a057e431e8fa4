use crate::prelude::*;
use ureq::Agent;

/// The package index contract from spec.md §6.F: canonicalize a name, list
/// every known version, and locate the source-archive URL for one version.
/// The concrete index (network client, on-disk mirror, ...) is an external
/// collaborator per spec.md §1 -- only this contract matters to the rest of
/// the core.
pub trait PackageIndex: Send + Sync {
    /// Canonicalize casing/spelling for a name as the index understands it.
    fn real_name(&self, name: &Name) -> Result<Name>;
    /// Every known version, including yanked/hidden ones -- filtering is the
    /// scheduler's job (spec.md §4.H), not the index's.
    fn package_releases(&self, name: &Name) -> Result<Vec<Version>>;
    /// Candidate download artifacts for one release.
    fn release_urls(&self, name: &Name, version: &Version) -> Result<Vec<ReleaseArtifact>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    pub package_type: String,
    pub url: Url,
}

impl ReleaseArtifact {
    pub fn is_sdist(&self) -> bool {
        self.package_type == "sdist"
    }
}

pub static PYPI_ROOT: Lazy<Url> = Lazy::new(|| "https://pypi.org/".try_into().unwrap());

/// Talks to the PyPI JSON API (`/pypi/<name>/json/`), the same client
/// (`ureq`, blocking) and request style as `njsmith-posy`'s
/// `package_index.rs`.
pub struct PyPiIndex {
    agent: Agent,
    base_url: Url,
}

impl PyPiIndex {
    pub fn new(agent: Agent, base_url: Url) -> PyPiIndex {
        PyPiIndex { agent, base_url }
    }

    fn fetch(&self, name: &Name) -> Result<ReleasesPage> {
        let url = self
            .base_url
            .join(&format!("pypi/{}/json/", name.as_str()))?;
        self.agent
            .request_url("GET", &url)
            .call()
            .with_context(|| format!("fetching package index page for {}", name))?
            .into_json()
            .with_context(|| format!("parsing package index page for {}", name))
    }
}

#[derive(Debug, Deserialize)]
struct PyPIInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PyPIArtifact {
    packagetype: String,
    url: Url,
}

#[derive(Debug, Deserialize)]
struct ReleasesPage {
    info: PyPIInfo,
    releases: HashMap<String, Vec<PyPIArtifact>>,
}

impl PackageIndex for PyPiIndex {
    fn real_name(&self, name: &Name) -> Result<Name> {
        let page = self.fetch(name)?;
        Ok(Name::new(&page.info.name))
    }

    fn package_releases(&self, name: &Name) -> Result<Vec<Version>> {
        let page = self.fetch(name)?;
        let mut versions = Vec::new();
        for raw in page.releases.keys() {
            match Version::try_from(raw.as_str()) {
                Ok(v) => versions.push(v),
                Err(e) => warn!("skipping unparsable version {:?} for {}: {}", raw, name, e),
            }
        }
        Ok(versions)
    }

    fn release_urls(&self, name: &Name, version: &Version) -> Result<Vec<ReleaseArtifact>> {
        let page = self.fetch(name)?;
        let key = version.to_string();
        let artifacts = page
            .releases
            .get(&key)
            .map(|entries| {
                entries
                    .iter()
                    .map(|a| ReleaseArtifact {
                        package_type: a.packagetype.clone(),
                        url: a.url.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(artifacts)
    }
}
