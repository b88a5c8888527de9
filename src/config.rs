//! Manager configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! `debrepo.json` under the repository root, and command line flags.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::package::Arch;
use crate::runtime::Runtime;

pub const CONFIG_FILE_NAME: &str = "debrepo.json";
/// Environment variable naming the aptly executable.
pub const APTLY_ENV: &str = "DEBREPO_APTLY";

const SYSTEM_ROOT: &str = "/srv/debrepo";
const USER_ROOT_DIR: &str = ".debrepo";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the release trees. Never read from the config file.
    #[serde(skip)]
    pub root: PathBuf,
    /// Names of the release tiers, e.g. unstable/testing/stable
    pub releases: Vec<String>,
    /// Architectures tracked per codename; `source` means source packages
    pub arches: Vec<String>,
    /// Only manage these codenames
    pub include_codenames: Option<Vec<String>>,
    /// Skip these codenames; applied after `include_codenames`
    pub exclude_codenames: Option<Vec<String>>,
    pub aptly_program: String,
    /// Limit for each aptly invocation; 0 disables the limit
    pub command_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(SYSTEM_ROOT),
            releases: vec!["unstable".into(), "testing".into(), "stable".into()],
            arches: vec!["i386".into(), "amd64".into(), "source".into()],
            include_codenames: None,
            exclude_codenames: None,
            aptly_program: "aptly".into(),
            command_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub include_codenames: Option<Vec<String>>,
    pub exclude_codenames: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub aptly_program: Option<String>,
}

impl Config {
    /// Resolve the effective configuration.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let root = match overrides.root {
            Some(root) => root,
            None => default_root(runtime)?,
        };
        info!("Using repository root: {}", root.display());

        let file = overrides
            .config_file
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));

        let mut config = if runtime.exists(&file) {
            Self::from_file(runtime, &file)?
        } else if overrides.config_file.is_some() {
            anyhow::bail!("Config file {} does not exist", file.display());
        } else {
            debug!("No config file at {:?}, using defaults", file);
            Config::default()
        };

        config.root = root;
        if let Some(include) = overrides.include_codenames {
            config.include_codenames = Some(include);
        }
        if let Some(exclude) = overrides.exclude_codenames {
            config.exclude_codenames = Some(exclude);
        }
        if let Some(timeout) = overrides.timeout_secs {
            config.command_timeout_secs = timeout;
        }
        if let Some(program) = overrides
            .aptly_program
            .or_else(|| runtime.env_var(APTLY_ENV).ok())
        {
            config.aptly_program = program;
        }

        config.validate()?;
        Ok(config)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn from_file<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.releases.is_empty() {
            anyhow::bail!("At least one release must be configured");
        }
        if self.arches.is_empty() {
            anyhow::bail!("At least one architecture must be configured");
        }
        for arch in &self.arches {
            arch.parse::<Arch>()
                .with_context(|| format!("Invalid architecture '{}'", arch))?;
        }
        if self.aptly_program.trim().is_empty() {
            anyhow::bail!("aptly_program must not be empty");
        }
        Ok(())
    }

    /// `<root>/aptly`
    pub fn aptly_dir(&self) -> PathBuf {
        self.root.join("aptly")
    }

    /// `<root>/aptly/aptly.conf`
    pub fn aptly_config(&self) -> PathBuf {
        self.aptly_dir().join("aptly.conf")
    }

    /// `<root>/aptly/public`, where published indexes land.
    pub fn public_dir(&self) -> PathBuf {
        self.aptly_dir().join("public")
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        match self.command_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Apply the include filter, then the exclude filter.
    pub fn filter_codenames(&self, codenames: Vec<String>) -> Vec<String> {
        codenames
            .into_iter()
            .filter(|c| {
                self.include_codenames
                    .as_ref()
                    .is_none_or(|include| include.contains(c))
            })
            .filter(|c| {
                self.exclude_codenames
                    .as_ref()
                    .is_none_or(|exclude| !exclude.contains(c))
            })
            .collect()
    }
}

/// Get the default repository root
#[tracing::instrument(skip(runtime))]
pub fn default_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if runtime.is_privileged() {
        Ok(PathBuf::from(SYSTEM_ROOT))
    } else {
        let home_dir = runtime
            .home_dir()
            .context("Could not find home directory")?;
        Ok(home_dir.join(USER_ROOT_DIR))
    }
}
