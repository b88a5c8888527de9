use anyhow::Result;
use log::debug;

use crate::aptly::Aptly;
use crate::config::Config;
use crate::manager::Manager;
use crate::runtime::Runtime;

/// Print the codenames that would be managed, one per line.
#[tracing::instrument(skip(runtime, config))]
pub async fn codenames<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    for codename in discover(runtime, config).await? {
        println!("{}", codename);
    }
    Ok(())
}

/// Codenames known to aptly after the include/exclude filters.
pub(crate) async fn discover<R: Runtime>(runtime: &R, config: &Config) -> Result<Vec<String>> {
    let aptly = Aptly::from_config(runtime, config);
    let found = Manager::find_codenames(&aptly, &config.root).await?;
    debug!("aptly knows codenames: {:?}", found);
    Ok(config.filter_codenames(found))
}
