//! Release tree
//!
//! A release (e.g. "testing") holds one catalog per codename and arch. aptly
//! publishes per codename, so publishing is done once per codename for all of
//! its arch catalogs.

use anyhow::Result;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::aptly::{Aptly, is_missing_repository};
use crate::catalog::RepositoryCatalog;
use crate::error::RepoError;
use crate::package::{Arch, PackageMetadata};
use crate::runtime::Runtime;

pub struct ReleaseTree<'a, R: Runtime> {
    name: String,
    /// codename -> catalog key (`src` or binary arch) -> catalog
    repositories: BTreeMap<String, BTreeMap<String, RepositoryCatalog<'a, R>>>,
}

impl<'a, R: Runtime> ReleaseTree<'a, R> {
    /// Load a catalog for every codename/arch pair of release `name`.
    ///
    /// `source` and `all` share the `src` catalog. A codename that has no
    /// `<codename>-<name>` repository in aptly is left untracked; any other
    /// failure aborts the load.
    #[tracing::instrument(skip(aptly, index_root))]
    pub async fn load(
        aptly: &Aptly<'a, R>,
        name: &str,
        codenames: &[String],
        arches: &[Arch],
        index_root: &Path,
    ) -> Result<Self> {
        let mut tree = Self::new(name);
        let mut attempted = BTreeSet::new();
        for codename in codenames {
            for arch in arches {
                let key = arch.catalog_key();
                if !attempted.insert((codename.as_str(), key)) {
                    debug!("Catalog {}/{} already loaded", codename, key);
                    continue;
                }
                let loaded = RepositoryCatalog::load(
                    aptly.clone(),
                    codename,
                    arch.clone(),
                    name,
                    index_root.to_path_buf(),
                )
                .await;
                match loaded {
                    Ok(catalog) => tree.insert(catalog),
                    Err(e) if is_missing_repository(&e) => {
                        warn!("Skipping {}-{} ({}): {}", codename, name, arch, e);
                    }
                    Err(e) => {
                        return Err(e.context(format!(
                            "Failed to load catalog {}-{} ({})",
                            codename, name, arch
                        )));
                    }
                }
            }
        }
        Ok(tree)
    }

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            repositories: BTreeMap::new(),
        }
    }

    /// Track `catalog` under its codename and arch, replacing any previous one.
    pub fn insert(&mut self, catalog: RepositoryCatalog<'a, R>) {
        if catalog.release() != self.name {
            warn!(
                "Catalog {} tracked in release tree {}",
                catalog.repo_name(),
                self.name
            );
        }
        self.repositories
            .entry(catalog.codename().to_string())
            .or_default()
            .insert(catalog.arch().catalog_key().to_string(), catalog);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codenames(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    pub fn catalogs(&self) -> impl Iterator<Item = &RepositoryCatalog<'a, R>> {
        self.repositories.values().flat_map(BTreeMap::values)
    }

    /// The catalog of `codename`/`arch`, or `UnknownRepository`.
    pub fn repository(
        &self,
        codename: &str,
        arch: &Arch,
    ) -> Result<&RepositoryCatalog<'a, R>, RepoError> {
        self.repositories
            .get(codename)
            .and_then(|catalogs| catalogs.get(arch.catalog_key()))
            .ok_or_else(|| RepoError::unknown_repository(codename, arch.catalog_key()))
    }

    pub fn repository_mut(
        &mut self,
        codename: &str,
        arch: &Arch,
    ) -> Result<&mut RepositoryCatalog<'a, R>, RepoError> {
        self.repositories
            .get_mut(codename)
            .and_then(|catalogs| catalogs.get_mut(arch.catalog_key()))
            .ok_or_else(|| RepoError::unknown_repository(codename, arch.catalog_key()))
    }

    /// Catalogs `package` belongs in: the one matching its codename and arch,
    /// with `all` mapped to the source catalog.
    ///
    /// An untracked codename or arch gives an empty list, never an error.
    pub fn repositories_for_package(
        &self,
        package: &PackageMetadata,
    ) -> Vec<&RepositoryCatalog<'a, R>> {
        self.repository(package.codename(), &package.arch)
            .into_iter()
            .collect()
    }

    /// Add `package` to each catalog it belongs in and return the new
    /// records. Empty when no catalog matches.
    ///
    /// With `update_metadata_now` the package's codename is republished,
    /// which settles every catalog of that codename.
    pub async fn add_package(
        &mut self,
        package: &PackageMetadata,
        update_metadata_now: bool,
    ) -> Result<Vec<PackageMetadata>> {
        let mut added = Vec::new();
        match self.repository_mut(package.codename(), &package.arch) {
            Ok(catalog) => added.push(catalog.add_package(package, false).await?),
            Err(e) => debug!("Not adding {} to {}: {}", package.name, self.name, e),
        }
        if update_metadata_now
            && !added.is_empty()
            && let Some(catalogs) = self.repositories.get_mut(package.codename())
        {
            publish_codename(catalogs).await?;
        }
        Ok(added)
    }

    /// Publish every codename that has a dirty catalog, or all of them when
    /// forced. Returns the number of codenames published.
    #[tracing::instrument(skip(self))]
    pub async fn update_metadata(&mut self, force: bool) -> Result<usize> {
        let mut published = 0;
        for (codename, catalogs) in self.repositories.iter_mut() {
            if !force && !catalogs.values().any(|c| c.is_dirty()) {
                debug!("{}-{} is clean", codename, self.name);
                continue;
            }
            if publish_codename(catalogs).await? {
                published += 1;
            }
        }
        Ok(published)
    }
}

/// One `publish update` for all catalogs of a codename. They turn clean as
/// soon as aptly succeeds, before the index listings are rebuilt.
async fn publish_codename<R: Runtime>(
    catalogs: &mut BTreeMap<String, RepositoryCatalog<'_, R>>,
) -> Result<bool> {
    let Some(first) = catalogs.values().next() else {
        return Ok(false);
    };
    first.publish().await?;
    for catalog in catalogs.values_mut() {
        catalog.mark_published();
    }
    if let Some(first) = catalogs.values().next() {
        first.rebuild_index()?;
    }
    Ok(true)
}
