use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::version::{Release, Version, VersionComparator};

/// Architecture of a package artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// Source package (`src`, also accepted as `source`)
    Source,
    /// Architecture independent binary
    All,
    /// Binary for a concrete architecture (e.g. "amd64")
    Binary(String),
}

impl Arch {
    /// Key of the catalog this arch is stored in within a codename.
    /// `all` packages live in the source catalog.
    pub fn catalog_key(&self) -> &str {
        match self {
            Arch::Source | Arch::All => "src",
            Arch::Binary(name) => name,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Arch::Source)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Source => write!(f, "src"),
            Arch::All => write!(f, "all"),
            Arch::Binary(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => anyhow::bail!("Architecture must not be empty"),
            "src" | "source" => Ok(Arch::Source),
            "all" => Ok(Arch::All),
            other => Ok(Arch::Binary(other.to_string())),
        }
    }
}

/// One package artifact tracked in a catalog.
///
/// Values are never mutated in place; [`relocated`](Self::relocated) builds
/// the copy stored when a package is added to another catalog.
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Version,
    pub path: String,
    pub arch: Arch,
    pub source_name: String,
    /// Origin as `<codename>-<release>`
    pub os: String,
}

impl PackageMetadata {
    pub fn new(
        name: &str,
        version: Version,
        path: &str,
        arch: Arch,
        source_name: &str,
        os: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            version,
            path: path.to_string(),
            arch,
            source_name: source_name.to_string(),
            os: os.to_string(),
        }
    }

    /// Copy of this record with a new path and origin.
    pub fn relocated(&self, path: &str, os: &str) -> Self {
        Self {
            path: path.to_string(),
            os: os.to_string(),
            ..self.clone()
        }
    }

    /// Canonical artifact filename used by the repository tool.
    ///
    /// - source: `{name}_{version}-{release}.dsc`
    /// - binary: `{name}_{version}-{release}_{arch}.deb`
    ///
    /// A wildcard release drops the `-{release}` part.
    pub fn filename(&self) -> String {
        let version = match self.version.release() {
            Release::Any => self.version.upstream().to_string(),
            Release::Exact(r) => format!("{}-{}", self.version.upstream(), r),
        };
        match &self.arch {
            Arch::Source => format!("{}_{}.dsc", self.name, version),
            arch => format!("{}_{}_{}.deb", self.name, version, arch),
        }
    }

    /// Codename part of [`os`](Self::os).
    pub fn codename(&self) -> &str {
        self.os.split('-').next().unwrap_or(&self.os)
    }

    /// Ascending by name (byte-wise), then by [`VersionComparator::total_cmp`].
    pub fn compare(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| VersionComparator::total_cmp(&self.version, &other.version))
    }
}

impl fmt::Display for PackageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Version: {}", self.version.upstream())?;
        writeln!(f, "Release: {}", self.version.release())?;
        writeln!(f, "Path: {}", self.path)?;
        writeln!(f, "Arch: {}", self.arch)?;
        writeln!(f, "Source: {}", self.source_name)?;
        writeln!(f, "OS: {}", self.os)
    }
}

/// Sort a per-name package list in place.
pub fn sort_packages(packages: &mut [PackageMetadata]) {
    packages.sort_by(|a, b| a.compare(b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, version: &str, arch: Arch) -> PackageMetadata {
        PackageMetadata::new(
            name,
            Version::parse(version).unwrap(),
            "",
            arch,
            name,
            "wheezy-unstable",
        )
    }

    #[test]
    fn test_filename_source() {
        let p = pkg("globus-common", "15.0-1", Arch::Source);
        assert_eq!(p.filename(), "globus-common_15.0-1.dsc");
    }

    #[test]
    fn test_filename_binary() {
        let p = pkg("libglobus-common0", "15.0-1", Arch::Binary("amd64".into()));
        assert_eq!(p.filename(), "libglobus-common0_15.0-1_amd64.deb");

        let p = pkg("globus-common-doc", "15.0-1", Arch::All);
        assert_eq!(p.filename(), "globus-common-doc_15.0-1_all.deb");
    }

    #[test]
    fn test_filename_wildcard_release() {
        let p = pkg("native", "3.2", Arch::Source);
        assert_eq!(p.filename(), "native_3.2.dsc");
    }

    #[test]
    fn test_compare_by_name_then_version() {
        let a = pkg("alpha", "9.0-1", Arch::Source);
        let b = pkg("beta", "1.0-1", Arch::Source);
        let b2 = pkg("beta", "1.0-2", Arch::Source);
        let b3 = pkg("beta", "1.10-1", Arch::Source);

        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&b2), Ordering::Less);
        assert_eq!(b2.compare(&b3), Ordering::Less);
        assert_eq!(b3.compare(&b), Ordering::Greater);
    }

    #[test]
    fn test_sort_packages_is_idempotent() {
        let mut list = vec![
            pkg("foo", "1.10-1", Arch::Source),
            pkg("foo", "1.2-3", Arch::Source),
            pkg("foo", "1.2", Arch::Source),
            pkg("foo", "1.2-10", Arch::Source),
            pkg("foo", "0.9-1", Arch::Source),
        ];
        sort_packages(&mut list);
        let once: Vec<String> = list.iter().map(|p| p.version.to_string()).collect();
        assert_eq!(once, vec!["0.9-1", "1.2", "1.2-10", "1.2-3", "1.10-1"]);

        sort_packages(&mut list);
        let twice: Vec<String> = list.iter().map(|p| p.version.to_string()).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_relocated_keeps_identity() {
        let p = pkg("foo", "1.0-1", Arch::Binary("i386".into()));
        let moved = p.relocated("pool/foo_1.0-1_i386.deb", "trusty-stable");
        assert_eq!(moved.name, "foo");
        assert_eq!(moved.version.to_string(), "1.0-1");
        assert_eq!(moved.arch, Arch::Binary("i386".into()));
        assert_eq!(moved.path, "pool/foo_1.0-1_i386.deb");
        assert_eq!(moved.os, "trusty-stable");
        assert_eq!(moved.codename(), "trusty");
        assert_eq!(p.os, "wheezy-unstable");
    }

    #[test]
    fn test_arch_parse_and_catalog_key() {
        assert_eq!("source".parse::<Arch>().unwrap(), Arch::Source);
        assert_eq!("src".parse::<Arch>().unwrap(), Arch::Source);
        assert_eq!("all".parse::<Arch>().unwrap(), Arch::All);
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::Binary("amd64".into()));
        assert!("".parse::<Arch>().is_err());

        assert_eq!(Arch::All.catalog_key(), "src");
        assert_eq!(Arch::Source.catalog_key(), "src");
        assert_eq!(Arch::Binary("i386".into()).catalog_key(), "i386");
    }

    #[test]
    fn test_display() {
        let p = pkg("foo", "1.0-1", Arch::Source);
        let text = p.to_string();
        assert!(text.contains("Name: foo\n"));
        assert!(text.contains("Version: 1.0\n"));
        assert!(text.contains("Release: 1\n"));
        assert!(text.contains("OS: wheezy-unstable\n"));
    }
}
