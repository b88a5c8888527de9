//! aptly command line client.
//!
//! Every operation runs one aptly process through the [`Runtime`], checks its
//! exit status and maps failures to [`RepoError::ExternalTool`].

pub mod query;

use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::error::RepoError;
use crate::runtime::{CommandOutput, Runtime, describe_command};

pub use query::{SEARCH_FORMAT, arch_filter, package_query};

/// aptly reports an empty search result as a failure with this message.
const NO_RESULTS: &str = "no results";
/// `ERROR: local repo with name <repo> not found`
const MISSING_REPO: &str = "local repo with name";

/// True when `err` is aptly refusing to act on a repository it does not have.
pub fn is_missing_repository(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<RepoError>(),
        Some(RepoError::ExternalTool { message, .. })
            if message.contains(MISSING_REPO) && message.contains("not found")
    )
}

pub struct Aptly<'a, R: Runtime> {
    runtime: &'a R,
    program: String,
    config_path: PathBuf,
    timeout: Option<Duration>,
}

impl<R: Runtime> Clone for Aptly<'_, R> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime,
            program: self.program.clone(),
            config_path: self.config_path.clone(),
            timeout: self.timeout,
        }
    }
}

impl<'a, R: Runtime> Aptly<'a, R> {
    pub fn new(
        runtime: &'a R,
        program: &str,
        config_path: PathBuf,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            runtime,
            program: program.to_string(),
            config_path,
            timeout,
        }
    }

    pub fn from_config(runtime: &'a R, config: &Config) -> Self {
        Self::new(
            runtime,
            &config.aptly_program,
            config.aptly_config(),
            config.command_timeout(),
        )
    }

    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn args(&self, rest: &[&str]) -> Vec<String> {
        std::iter::once(format!("-config={}", self.config_path.display()))
            .chain(rest.iter().map(|s| s.to_string()))
            .collect()
    }

    async fn run(&self, args: Vec<String>) -> Result<CommandOutput> {
        let output = self
            .runtime
            .run_command(&self.program, &args, self.timeout)
            .await?;
        if output.success() {
            return Ok(output);
        }

        let command = describe_command(&self.program, &args);
        let message = match output.stderr.trim() {
            "" => "no error output".to_string(),
            stderr => stderr.to_string(),
        };
        if message.contains(NO_RESULTS) {
            debug!("{} found nothing", command);
        } else {
            warn!("{} failed ({:?}): {}", command, output.exit_code, message);
        }
        Err(RepoError::ExternalTool {
            command,
            exit_code: output.exit_code,
            message,
        }
        .into())
    }

    /// `repo search` with the `name|version|arch|source` template.
    ///
    /// An empty result is an empty list, not an error.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, repo: &str, filter: &str) -> Result<Vec<String>> {
        let format = format!("-format={}", SEARCH_FORMAT);
        let args = self.args(&["repo", "search", &format, repo, filter]);
        match self.run(args).await {
            Ok(output) => Ok(output.stdout.lines().map(String::from).collect()),
            Err(e) => {
                let no_results = matches!(
                    e.downcast_ref::<RepoError>(),
                    Some(RepoError::ExternalTool { message, .. }) if message.contains(NO_RESULTS)
                );
                if no_results {
                    debug!("No packages in {} matching {}", repo, filter);
                    Ok(Vec::new())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// `repo include` a changes file into `repo`, keeping the source files.
    #[tracing::instrument(skip(self))]
    pub async fn include_changes(&self, repo: &str, changes: &Path) -> Result<()> {
        let target = format!("-repo={}", repo);
        let changes = changes.display().to_string();
        let args = self.args(&[
            "repo",
            "include",
            "-no-remove-files",
            &target,
            &changes,
        ]);
        self.run(args).await.map(|_| ())
    }

    /// `repo copy` packages matching `query` from `src` to `dst`.
    ///
    /// With `with_deps` the copy also pulls dependencies and follows source
    /// packages to their binaries.
    #[tracing::instrument(skip(self))]
    pub async fn copy(&self, src: &str, dst: &str, query: &str, with_deps: bool) -> Result<()> {
        let args = if with_deps {
            self.args(&[
                "-dep-follow-source",
                "repo",
                "copy",
                "-with-deps",
                src,
                dst,
                query,
            ])
        } else {
            self.args(&["repo", "copy", src, dst, query])
        };
        self.run(args).await.map(|_| ())
    }

    /// Regenerate the published indexes of `distribution` under `prefix`.
    #[tracing::instrument(skip(self))]
    pub async fn publish_update(&self, distribution: &str, prefix: &str) -> Result<()> {
        let args = self.args(&["publish", "update", distribution, prefix]);
        self.run(args).await.map(|_| ())
    }

    /// Raw names of all local repositories.
    #[tracing::instrument(skip(self))]
    pub async fn list_repos(&self) -> Result<Vec<String>> {
        let args = self.args(&["repo", "list", "-raw"]);
        let output = self.run(args).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}
