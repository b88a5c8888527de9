use anyhow::{Context, Result};

use crate::config::Config;
use crate::manager::Manager;
use crate::package::Version;
use crate::runtime::Runtime;

/// Promote `name` from release `from` into release `to`.
///
/// `version` may omit the packaging release to take every release of that
/// upstream version. Without a version the newest one in `from` is used.
#[tracing::instrument(skip(runtime, config))]
pub async fn promote<R: Runtime>(
    runtime: &R,
    config: &Config,
    from: &str,
    to: &str,
    name: &str,
    version: Option<&str>,
    publish: bool,
) -> Result<()> {
    let mut manager = Manager::new(runtime, config).await?;
    let version = match version {
        Some(raw) => raw.parse::<Version>()?,
        None => manager
            .latest_version(from, name)?
            .with_context(|| format!("Package {} not found in {}", name, from))?,
    };

    let added = manager.promote(from, to, name, &version, publish).await?;
    if added.is_empty() {
        println!("Nothing to promote for {} {} in {}", name, version, from);
        return Ok(());
    }
    for package in &added {
        println!(
            "Promoted {} {} {} to {}",
            package.name, package.version, package.arch, package.os
        );
    }
    if !publish {
        println!("Run 'debrepo publish --release {}' to publish the changes", to);
    }
    Ok(())
}
