pub mod aptly;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod manager;
pub mod package;
pub mod release;
pub mod runtime;

/// Shared fixtures for unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::aptly::arch_filter;
    use crate::aptly::tests::{failed, ok};
    use crate::config::Config;
    use crate::package::Arch;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    /// Config rooted at `/repo` with releases unstable/testing and arches
    /// amd64/source.
    pub fn test_config() -> Config {
        Config {
            root: PathBuf::from("/repo"),
            releases: vec!["unstable".into(), "testing".into()],
            arches: vec!["amd64".into(), "source".into()],
            ..Default::default()
        }
    }

    /// Make `runtime` answer like aptly under [`test_config`]:
    /// - `/repo` exists
    /// - `repo list -raw` prints `repos`
    /// - `repo search <repo> <filter of arch>` prints the listing registered
    ///   as `(repo, arch, listing)`, anything else reports no results
    pub fn fake_aptly(
        runtime: &mut MockRuntime,
        repos: &[&str],
        listings: &[(&str, &str, &str)],
    ) {
        let repo_list = repos.join("\n");
        let listings: Vec<(String, String, String)> = listings
            .iter()
            .map(|(repo, arch, lines)| {
                let arch: Arch = arch.parse().unwrap();
                (repo.to_string(), arch_filter(&arch), lines.to_string())
            })
            .collect();

        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/repo")))
            .returning(|_| true);
        runtime
            .expect_run_command()
            .withf(|_, args, _| args.iter().any(|a| a == "list"))
            .returning(move |_, _, _| Ok(ok(&repo_list)));
        runtime
            .expect_run_command()
            .withf(|_, args, _| args.iter().any(|a| a == "search"))
            .returning(move |_, args, _| {
                let [.., repo, filter] = args else {
                    return Ok(failed(1, "ERROR: bad arguments"));
                };
                Ok(listings
                    .iter()
                    .find(|(r, f, _)| r == repo && f == filter)
                    .map(|(_, _, lines)| ok(lines))
                    .unwrap_or_else(|| failed(1, "ERROR: no results")))
            });
    }
}
