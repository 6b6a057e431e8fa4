pub use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
pub use std::convert::{TryFrom, TryInto};
pub use std::fmt::Display;
pub use std::str::FromStr;

pub use anyhow::{anyhow, bail, Context, Result};
pub use once_cell::sync::Lazy;
pub use serde::{Deserialize, Serialize};
pub use serde_with::{DeserializeFromStr, SerializeDisplay};
pub use tracing::{debug, info, trace, warn};
pub use url::Url;

pub use crate::errors::ResolverError;
pub use crate::try_from_str_boilerplate;
pub use crate::vocab::*;

use directories::ProjectDirs;

pub static PROJECT_DIRS: Lazy<ProjectDirs> = Lazy::new(|| {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME")).unwrap()
});
