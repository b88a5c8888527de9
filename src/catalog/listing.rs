//! Parser for `repo search` output.

use std::collections::BTreeMap;

use crate::error::RepoError;
use crate::package::{Arch, PackageMetadata, Version, sort_packages};

/// Value aptly prints for a missing template field.
const NO_VALUE: &str = "<no value>";

/// Parse one `name|version|arch|source` line.
///
/// Blank lines yield `Ok(None)`. `origin` becomes the record's `os`.
pub fn parse_record(
    line: &str,
    catalog_arch: &Arch,
    origin: &str,
) -> Result<Option<PackageMetadata>, RepoError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let [name, version, arch, source] = fields[..] else {
        return Err(RepoError::MalformedRecord {
            line: line.to_string(),
            fields: fields.len(),
        });
    };

    let version = Version::parse(version)?;
    let arch = arch.parse::<Arch>().unwrap_or_else(|_| catalog_arch.clone());
    let source_name = source_name(name, source, &arch);

    let mut package = PackageMetadata::new(name, version, "", arch, source_name, origin);
    package.path = package.filename();
    Ok(Some(package))
}

/// Source packages are their own source. Binaries fall back to their own
/// name when aptly reports no source; a `name (version)` source keeps the
/// name only.
fn source_name<'l>(name: &'l str, source: &'l str, arch: &Arch) -> &'l str {
    if arch.is_source() || source.is_empty() || source == NO_VALUE {
        return name;
    }
    source.split_whitespace().next().unwrap_or(name)
}

/// Parse a whole listing into sorted per-name lists.
///
/// Any malformed line fails the whole listing so that no partial catalog is
/// ever built.
pub fn parse_listing<S: AsRef<str>>(
    lines: &[S],
    catalog_arch: &Arch,
    origin: &str,
) -> Result<BTreeMap<String, Vec<PackageMetadata>>, RepoError> {
    let mut packages: BTreeMap<String, Vec<PackageMetadata>> = BTreeMap::new();
    for line in lines {
        if let Some(package) = parse_record(line.as_ref(), catalog_arch, origin)? {
            packages
                .entry(package.name.clone())
                .or_default()
                .push(package);
        }
    }
    for list in packages.values_mut() {
        sort_packages(list);
    }
    Ok(packages)
}
