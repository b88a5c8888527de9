//! Deb manager
//!
//! Owns one [`ReleaseTree`] per configured release. All trees share the
//! codenames discovered from aptly's repository list at construction.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::aptly::Aptly;
use crate::config::Config;
use crate::package::{Arch, PackageMetadata, Version, VersionComparator};
use crate::release::ReleaseTree;
use crate::runtime::Runtime;

pub struct Manager<'a, R: Runtime> {
    releases: BTreeMap<String, ReleaseTree<'a, R>>,
}

impl<'a, R: Runtime> Manager<'a, R> {
    /// Discover codenames, filter them through the config and load every
    /// release tree.
    #[tracing::instrument(skip(runtime, config))]
    pub async fn new(runtime: &'a R, config: &Config) -> Result<Self> {
        let aptly = Aptly::from_config(runtime, config);
        let codenames = config.filter_codenames(Self::find_codenames(&aptly, &config.root).await?);
        info!("Managing codenames: {}", codenames.join(", "));

        let arches = config
            .arches
            .iter()
            .map(|a| a.parse::<Arch>())
            .collect::<Result<Vec<_>>>()?;

        let mut releases = BTreeMap::new();
        for release in &config.releases {
            let tree =
                ReleaseTree::load(&aptly, release, &codenames, &arches, &config.public_dir())
                    .await?;
            releases.insert(release.clone(), tree);
        }
        Ok(Self { releases })
    }

    pub fn from_trees(trees: Vec<ReleaseTree<'a, R>>) -> Self {
        Self {
            releases: trees
                .into_iter()
                .map(|tree| (tree.name().to_string(), tree))
                .collect(),
        }
    }

    /// Codenames known to aptly: the part of each repository name before the
    /// first `-`, sorted and deduplicated.
    ///
    /// A missing `root` means nothing was ever set up; aptly is not run.
    #[tracing::instrument(skip(aptly))]
    pub async fn find_codenames(aptly: &Aptly<'_, R>, root: &Path) -> Result<Vec<String>> {
        if !aptly.runtime().exists(root) {
            debug!("Repository root {:?} does not exist", root);
            return Ok(Vec::new());
        }
        let repos = aptly
            .list_repos()
            .await
            .context("Failed to list aptly repositories")?;
        let codenames: BTreeSet<String> = repos
            .iter()
            .filter_map(|repo| repo.split('-').next())
            .filter(|codename| !codename.is_empty())
            .map(String::from)
            .collect();
        Ok(codenames.into_iter().collect())
    }

    pub fn release(&self, name: &str) -> Option<&ReleaseTree<'a, R>> {
        self.releases.get(name)
    }

    pub fn release_mut(&mut self, name: &str) -> Option<&mut ReleaseTree<'a, R>> {
        self.releases.get_mut(name)
    }

    pub fn releases(&self) -> impl Iterator<Item = &ReleaseTree<'a, R>> {
        self.releases.values()
    }

    fn tree(&self, name: &str) -> Result<&ReleaseTree<'a, R>> {
        self.release(name)
            .with_context(|| format!("Unknown release '{}'", name))
    }

    /// Highest version of `name` in any catalog of `release`.
    pub fn latest_version(&self, release: &str, name: &str) -> Result<Option<Version>> {
        Ok(self
            .tree(release)?
            .catalogs()
            .filter_map(|catalog| catalog.latest(name))
            .map(|p| &p.version)
            .max_by(|a, b| VersionComparator::total_cmp(a, b))
            .cloned())
    }

    /// Copy every variant of `name` matching `version` from release `from`
    /// into the catalogs of release `to`. Returns the records added to `to`.
    ///
    /// Without `update_metadata_now` the target catalogs stay dirty.
    #[tracing::instrument(skip(self))]
    pub async fn promote(
        &mut self,
        from: &str,
        to: &str,
        name: &str,
        version: &Version,
        update_metadata_now: bool,
    ) -> Result<Vec<PackageMetadata>> {
        if from == to {
            anyhow::bail!("Cannot promote from '{}' into itself", from);
        }
        self.tree(to)?;

        let mut candidates: Vec<PackageMetadata> = self
            .tree(from)?
            .catalogs()
            .flat_map(|catalog| catalog.find(name, version))
            .cloned()
            .collect();
        candidates.sort_by(listing_order);
        if candidates.is_empty() {
            warn!("No {} {} in {}", name, version, from);
            return Ok(Vec::new());
        }

        let target = self
            .release_mut(to)
            .with_context(|| format!("Unknown release '{}'", to))?;
        let mut added = Vec::new();
        for package in &candidates {
            added.extend(target.add_package(package, false).await?);
        }
        if update_metadata_now {
            target.update_metadata(false).await?;
        }
        info!("Promoted {} package(s) from {} to {}", added.len(), from, to);
        Ok(added)
    }

    /// Publish every release. Returns the number of codenames published.
    #[tracing::instrument(skip(self))]
    pub async fn update_metadata(&mut self, force: bool) -> Result<usize> {
        let mut published = 0;
        for tree in self.releases.values_mut() {
            published += tree.update_metadata(force).await?;
        }
        Ok(published)
    }
}

impl<R: Runtime> fmt::Display for Manager<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.releases.keys().map(String::as_str).collect();
        write!(f, "Deb Manager [{}]", names.join(","))
    }
}

/// Package order across catalogs: name, version, then arch and origin.
pub fn listing_order(a: &PackageMetadata, b: &PackageMetadata) -> Ordering {
    a.compare(b)
        .then_with(|| a.arch.cmp(&b.arch))
        .then_with(|| a.os.cmp(&b.os))
}
