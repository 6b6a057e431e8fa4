use crate::prelude::*;

/// A dense, positive, monotonically-increasing PBO variable id (spec.md
/// §4.I). Starts at 1 so that `x<id>` tokens in `.opb` output are never
/// ambiguous with a sign marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

impl Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

type SingleKey = (Name, Version, Extra);
type SetKey = (Name, BTreeSet<Version>, Extra);

/// Bidirectional `(name, version, extra)`/`(name, version-set, extra)` ↔
/// `VarId` maps, plus a counter minting keyless "virtual" variables used to
/// link clauses together (spec.md §3, §4.I).
#[derive(Default)]
pub struct VariableRegister {
    next: u32,
    map_single: BTreeMap<SingleKey, VarId>,
    map_single_rev: BTreeMap<VarId, SingleKey>,
    map_set: BTreeMap<SetKey, VarId>,
    map_set_rev: BTreeMap<VarId, SetKey>,
    versions_register: BTreeMap<Name, BTreeSet<Version>>,
}

impl VariableRegister {
    pub fn new() -> VariableRegister {
        VariableRegister::default()
    }

    fn fresh(&mut self) -> VarId {
        self.next += 1;
        VarId(self.next)
    }

    pub fn variable_count(&self) -> u32 {
        self.next
    }

    /// Record `version` as known for `name`, and assign a fresh `VarId` to
    /// `(name, version, e)` for each `e` in `extras`. Errors if any of those
    /// triples is already registered.
    pub fn register_single(&mut self, name: &Name, version: &Version, extras: &BTreeSet<Extra>) -> Result<()> {
        self.versions_register
            .entry(name.clone())
            .or_default()
            .insert(version.clone());

        for extra in extras {
            let key = (name.clone(), version.clone(), extra.clone());
            if self.map_single.contains_key(&key) {
                return Err(ResolverError::Invariant(format!(
                    "duplicate map_single registration for {} {} [{}]",
                    name, version, extra
                ))
                .into());
            }
            let id = self.fresh();
            self.map_single.insert(key.clone(), id);
            self.map_single_rev.insert(id, key);
        }
        Ok(())
    }

    /// Assign a fresh `VarId` to `(name, versions, e)` for each `e` in
    /// `extras`. Errors on re-registration of the same set key.
    pub fn register_set(&mut self, name: &Name, versions: &BTreeSet<Version>, extras: &BTreeSet<Extra>) -> Result<()> {
        for extra in extras {
            let key = (name.clone(), versions.clone(), extra.clone());
            if self.map_set.contains_key(&key) {
                return Err(ResolverError::Invariant(format!(
                    "duplicate map_set registration for {} {:?} [{}]",
                    name, versions, extra
                ))
                .into());
            }
            let id = self.fresh();
            self.map_set.insert(key.clone(), id);
            self.map_set_rev.insert(id, key);
        }
        Ok(())
    }

    pub fn get_virtual_variable(&mut self) -> VarId {
        self.fresh()
    }

    pub fn get_single(&self, name: &Name, version: &Version, extra: &Extra) -> Option<VarId> {
        self.map_single
            .get(&(name.clone(), version.clone(), extra.clone()))
            .copied()
    }

    pub fn known_versions(&self, name: &Name) -> Option<&BTreeSet<Version>> {
        self.versions_register.get(name)
    }

    pub fn resolve_single(&self, id: VarId) -> Option<&SingleKey> {
        self.map_single_rev.get(&id)
    }

    /// Iterate `map_set` entries in a stable, deterministic order -- the
    /// encoder relies on this for reproducible `.opb` output (spec.md §5).
    pub fn iter_sets(&self) -> impl Iterator<Item = (&SetKey, &VarId)> {
        self.map_set.iter()
    }

    pub fn iter_names(&self) -> impl Iterator<Item = &Name> {
        self.versions_register.keys()
    }
}
