//! Package model
//!
//! This module provides the version ordering used by every search and
//! promotion, and the metadata record of a single package artifact.

mod meta;
mod version;

pub use meta::{Arch, PackageMetadata, sort_packages};
pub use version::{Release, Version, VersionComparator, parse_version};
