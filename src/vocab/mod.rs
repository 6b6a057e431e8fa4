mod extra;
mod metadata;
mod name;
mod requirement;
mod specifier;
mod version;

// All this stuff is also re-exported from crate::prelude::*

pub use self::extra::Extra;
pub use self::metadata::MetadataRecord;
pub use self::name::{normalize, Name};
pub use self::requirement::Requirement;
pub use self::specifier::CompareOp;
pub use self::version::{Version, VERSION_INFINITY, VERSION_ZERO};
