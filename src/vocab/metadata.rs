use crate::prelude::*;

/// The normalized per-`(name, version)` requirement bundle cached by the
/// Discovery Scheduler and read back by the PBO Encoder (spec.md §3).
///
/// Construction always goes through [`MetadataRecord::new`], which
/// re-normalizes `name`/`version` and every embedded requirement name so the
/// invariants hold regardless of what the extractor produced -- extractors
/// are untrusted external collaborators (spec.md §1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: Name,
    pub version: Version,
    #[serde(default)]
    pub install_requires: Vec<Requirement>,
    #[serde(default)]
    pub tests_require: Vec<Requirement>,
    #[serde(default)]
    pub setup_requires: Vec<Requirement>,
    #[serde(default)]
    pub extras_require: BTreeMap<Extra, Vec<Requirement>>,
}

impl MetadataRecord {
    pub fn new(
        name: impl Into<Name>,
        version: Version,
        install_requires: Vec<Requirement>,
        tests_require: Vec<Requirement>,
        setup_requires: Vec<Requirement>,
        extras_require: BTreeMap<Extra, Vec<Requirement>>,
    ) -> MetadataRecord {
        let extras_require = extras_require
            .into_iter()
            .filter(|(e, _)| !e.is_base())
            .collect();
        MetadataRecord {
            name: name.into(),
            version,
            install_requires,
            tests_require,
            setup_requires,
            extras_require,
        }
    }

    /// All unconditional requirements: the base flavor's dependency set,
    /// used by the encoder whenever `extra` is empty (spec.md §4.J step 3).
    pub fn base_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.install_requires
            .iter()
            .chain(self.tests_require.iter())
            .chain(self.setup_requires.iter())
    }

    /// The requirements gated behind a given extra, or an empty slice if the
    /// extra is unknown or the base ("").
    pub fn requirements_for_extra(&self, extra: &Extra) -> &[Requirement] {
        if extra.is_base() {
            &[]
        } else {
            self.extras_require
                .get(extra)
                .map(Vec::as_slice)
                .unwrap_or(&[])
        }
    }

    /// Byte-identical JSON serialization of everything *except* `name` and
    /// `version`, used by the encoder's alias compression to decide whether
    /// two versions of a package can share a `map_set` entry (spec.md §3,
    /// §4.J step 2). `name`/`version` are deliberately excluded: they differ
    /// for every version by construction, so including them would defeat
    /// the compression entirely (see DESIGN.md, "alias fingerprint scope").
    pub fn requirements_fingerprint(&self) -> Result<String> {
        #[derive(Serialize)]
        struct RequirementsOnly<'a> {
            install_requires: &'a [Requirement],
            tests_require: &'a [Requirement],
            setup_requires: &'a [Requirement],
            extras_require: &'a BTreeMap<Extra, Vec<Requirement>>,
        }
        Ok(serde_json::to_string(&RequirementsOnly {
            install_requires: &self.install_requires,
            tests_require: &self.tests_require,
            setup_requires: &self.setup_requires,
            extras_require: &self.extras_require,
        })?)
    }
}
