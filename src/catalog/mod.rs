//! Repository catalog
//!
//! One catalog holds the packages of a single codename/arch/release, as last
//! read from aptly plus any additions made through [`RepositoryCatalog::add_package`].

mod listing;
mod state;

use anyhow::{Context, Result};
use log::{debug, info};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::aptly::{Aptly, arch_filter, package_query};
use crate::index::create_index;
use crate::package::{Arch, PackageMetadata, Version, VersionComparator};
use crate::runtime::Runtime;

pub use listing::{parse_listing, parse_record};
pub use state::MetadataState;

const CHANGES_SUFFIX: &str = ".changes";

pub struct RepositoryCatalog<'a, R: Runtime> {
    aptly: Aptly<'a, R>,
    codename: String,
    release: String,
    arch: Arch,
    index_root: PathBuf,
    packages: BTreeMap<String, Vec<PackageMetadata>>,
    state: MetadataState,
}

impl<'a, R: Runtime> RepositoryCatalog<'a, R> {
    /// Query aptly for the packages of `<codename>-<release>` in `arch` and
    /// build the catalog from the listing.
    #[tracing::instrument(skip(aptly, index_root))]
    pub async fn load(
        aptly: Aptly<'a, R>,
        codename: &str,
        arch: Arch,
        release: &str,
        index_root: PathBuf,
    ) -> Result<Self> {
        let repo = repo_name(codename, release);
        let lines = aptly.search(&repo, &arch_filter(&arch)).await?;
        Self::from_listing(aptly, codename, arch, release, index_root, &lines)
    }

    /// Build a catalog from raw `name|version|arch|source` lines.
    pub fn from_listing<S: AsRef<str>>(
        aptly: Aptly<'a, R>,
        codename: &str,
        arch: Arch,
        release: &str,
        index_root: PathBuf,
        lines: &[S],
    ) -> Result<Self> {
        let repo = repo_name(codename, release);
        let packages = parse_listing(lines, &arch, &repo)
            .with_context(|| format!("Failed to read package listing of {} ({})", repo, arch))?;
        debug!("Loaded {} package names for {} ({})", packages.len(), repo, arch);

        Ok(Self {
            aptly,
            codename: codename.to_string(),
            release: release.to_string(),
            arch,
            index_root,
            packages,
            state: MetadataState::Clean,
        })
    }

    pub fn codename(&self) -> &str {
        &self.codename
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    /// aptly repository name: `<codename>-<release>`
    pub fn repo_name(&self) -> String {
        repo_name(&self.codename, &self.release)
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    pub fn state(&self) -> MetadataState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Sorted variants of `name`; empty when unknown.
    pub fn packages(&self, name: &str) -> &[PackageMetadata] {
        self.packages.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageMetadata> {
        self.packages.values().flatten()
    }

    /// Number of package variants.
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Variants of `name` matching `version`; a wildcard release matches
    /// every release of that upstream version.
    pub fn find(&self, name: &str, version: &Version) -> Vec<&PackageMetadata> {
        self.packages(name)
            .iter()
            .filter(|p| VersionComparator::matches(&p.version, version))
            .collect()
    }

    /// Highest variant of `name`.
    pub fn latest(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages(name).last()
    }

    /// Ingest `package` into this catalog's aptly repository and record it.
    ///
    /// `.changes` files are included directly; anything else is copied from
    /// the repository named by the package's `os`. The stored record carries
    /// this catalog's `<codename>-<release>` as origin. Without
    /// `update_metadata_now` the catalog is left dirty for a later
    /// [`update_metadata`](Self::update_metadata).
    ///
    /// Nothing is recorded when aptly fails.
    #[tracing::instrument(skip(self, package), fields(package = %package.name, version = %package.version))]
    pub async fn add_package(
        &mut self,
        package: &PackageMetadata,
        update_metadata_now: bool,
    ) -> Result<PackageMetadata> {
        let target = self.repo_name();
        let path = if package.path.ends_with(CHANGES_SUFFIX) {
            self.aptly
                .include_changes(&target, Path::new(&package.path))
                .await?;
            package.path.clone()
        } else {
            self.aptly
                .copy(
                    &package.os,
                    &target,
                    &package_query(package),
                    package.arch.is_source(),
                )
                .await?;
            package.filename()
        };

        let record = package.relocated(&path, &target);
        self.insert(record.clone());
        self.state.mark_dirty();
        info!("Added {} {} to {}", record.name, record.version, target);

        if update_metadata_now {
            self.update_metadata(false).await?;
        }
        Ok(record)
    }

    /// Insert keeping the list sorted. Only a variant with the same arch and
    /// the same upstream and release text is replaced.
    fn insert(&mut self, record: PackageMetadata) {
        let list = self.packages.entry(record.name.clone()).or_default();
        if let Some(existing) = list
            .iter_mut()
            .find(|p| p.arch == record.arch && p.version.is_same(&record.version))
        {
            *existing = record;
            return;
        }
        let position = list.partition_point(|p| p.compare(&record) != Ordering::Greater);
        list.insert(position, record);
    }

    /// Republish this catalog's codename when dirty or forced, then
    /// regenerate the index listings. Returns whether a publish ran.
    ///
    /// The catalog only becomes clean after aptly succeeded.
    #[tracing::instrument(skip(self))]
    pub async fn update_metadata(&mut self, force: bool) -> Result<bool> {
        if !(self.state.is_dirty() || force) {
            debug!("{} is clean, nothing to publish", self.repo_name());
            return Ok(false);
        }
        self.publish().await?;
        self.state.publish();
        self.rebuild_index()?;
        Ok(true)
    }

    /// `publish update` of this catalog's codename. Leaves the state alone.
    pub(crate) async fn publish(&self) -> Result<()> {
        self.aptly
            .publish_update(&self.codename, &self.release)
            .await
    }

    /// Record that the codename was republished.
    pub(crate) fn mark_published(&mut self) {
        self.state.publish();
    }

    pub(crate) fn rebuild_index(&self) -> Result<()> {
        let written = create_index(self.aptly.runtime(), &self.index_root, true)?;
        debug!("Wrote {} index listings under {:?}", written, self.index_root);
        Ok(())
    }
}

pub fn repo_name(codename: &str, release: &str) -> String {
    format!("{}-{}", codename, release)
}
