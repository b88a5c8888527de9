use anyhow::Result;

use crate::config::Config;
use crate::manager::Manager;
use crate::runtime::Runtime;

/// Republish every codename of `release`, or of all configured releases.
///
/// A freshly loaded manager has nothing pending, so the publish is always
/// forced.
#[tracing::instrument(skip(runtime, config))]
pub async fn publish<R: Runtime>(runtime: &R, config: &Config, release: Option<&str>) -> Result<()> {
    let mut config = config.clone();
    if let Some(release) = release {
        config.releases = vec![release.to_string()];
    }

    let mut manager = Manager::new(runtime, &config).await?;
    let published = manager.update_metadata(true).await?;
    println!("Published {} codename(s) of {}", published, config.releases.join(", "));
    Ok(())
}
