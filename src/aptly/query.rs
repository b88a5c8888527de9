//! aptly package query expressions.

use crate::package::{Arch, PackageMetadata};

/// Output template for `repo search`: `name|version|arch|source`.
pub const SEARCH_FORMAT: &str = "{{.Package}}|{{.Version}}|{{.Architecture}}|{{.Source}}";

/// Filter selecting the packages stored in a catalog of the given arch.
/// Source and `all` catalogs both select source packages.
pub fn arch_filter(arch: &Arch) -> String {
    match arch {
        Arch::Source | Arch::All => "$Architecture (=source)".to_string(),
        Arch::Binary(name) => format!("$Architecture (={})", name),
    }
}

/// Query matching one resolved package.
///
/// Source packages match on source name and version so the copy can follow
/// to their binaries; binaries match on name, version and architecture.
/// aptly compares full versions, so the epoch is included.
pub fn package_query(package: &PackageMetadata) -> String {
    let version = package.version.qualified();
    match package.arch {
        Arch::Source => format!(
            "$Source ({}), $SourceVersion (= {})",
            package.source_name, version
        ),
        ref arch => format!("{} (= {}) {{{}}}", package.name, version, arch),
    }
}
