use anyhow::Result;
use clap::Parser;
use debrepo::commands::{self, ListFilter};
use debrepo::config::{Config, ConfigOverrides};
use debrepo::package::Arch;
use std::path::PathBuf;

/// debrepo - Debian release tree manager
///
/// Tracks the packages of each codename and release held in aptly, promotes
/// packages between releases and republishes the result.
///
/// Examples:
///   debrepo codenames
///   debrepo list --release testing --codename wheezy foo
///   debrepo promote --from unstable --to testing foo 1.2-1
#[derive(Parser, Debug)]
#[command(author, version = env!("DEBREPO_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Repository root directory (overrides defaults; also via DEBREPO_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "DEBREPO_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to <root>/debrepo.json)
    #[arg(long = "config", short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Seconds to wait for each aptly invocation; 0 waits forever
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Only manage this codename (repeatable)
    #[arg(long = "os", value_name = "CODENAME", global = true)]
    pub os: Vec<String>,

    /// Skip this codename (repeatable, applied after --os)
    #[arg(long = "exclude-os", value_name = "CODENAME", global = true)]
    pub exclude_os: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the codenames known to aptly
    Codenames,

    /// List the packages of a release
    List(ListArgs),

    /// Copy a package from one release into another
    Promote(PromoteArgs),

    /// Republish the indexes of one or all releases
    Publish(PublishArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Release to list, e.g. "testing"
    #[arg(long)]
    pub release: String,

    /// Only this codename
    #[arg(long)]
    pub codename: Option<String>,

    /// Only this architecture ("src" for source packages)
    #[arg(long)]
    pub arch: Option<String>,

    /// Only this package
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PromoteArgs {
    /// Release to copy from
    #[arg(long)]
    pub from: String,

    /// Release to copy into
    #[arg(long)]
    pub to: String,

    /// Package name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Version, with or without the packaging release (defaults to the newest)
    #[arg(value_name = "VERSION")]
    pub version: Option<String>,

    /// Leave the target release unpublished
    #[arg(long)]
    pub no_publish: bool,
}

#[derive(clap::Args, Debug)]
pub struct PublishArgs {
    /// Only this release
    #[arg(long)]
    pub release: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root: self.root.clone(),
            config_file: self.config.clone(),
            include_codenames: (!self.os.is_empty()).then(|| self.os.clone()),
            exclude_codenames: (!self.exclude_os.is_empty()).then(|| self.exclude_os.clone()),
            timeout_secs: self.timeout,
            aptly_program: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = debrepo::runtime::RealRuntime;
    let config = Config::load(&runtime, cli.overrides())?;

    match cli.command {
        Commands::Codenames => commands::codenames(&runtime, &config).await?,
        Commands::List(args) => {
            let filter = ListFilter {
                codename: args.codename,
                arch: args.arch.as_deref().map(str::parse::<Arch>).transpose()?,
                name: args.name,
            };
            commands::list(&runtime, &config, &args.release, &filter).await?
        }
        Commands::Promote(args) => {
            commands::promote(
                &runtime,
                &config,
                &args.from,
                &args.to,
                &args.name,
                args.version.as_deref(),
                !args.no_publish,
            )
            .await?
        }
        Commands::Publish(args) => {
            commands::publish(&runtime, &config, args.release.as_deref()).await?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_codenames_parsing() {
        let cli = Cli::try_parse_from(["debrepo", "codenames"]).unwrap();
        assert!(matches!(cli.command, Commands::Codenames));
        assert_eq!(cli.root, None);
        assert!(cli.os.is_empty());
    }

    #[test]
    fn test_cli_list_parsing() {
        let cli = Cli::try_parse_from([
            "debrepo", "list", "--release", "testing", "--arch", "src", "foo",
        ])
        .unwrap();
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.release, "testing");
                assert_eq!(args.arch.as_deref(), Some("src"));
                assert_eq!(args.codename, None);
                assert_eq!(args.name.as_deref(), Some("foo"));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_list_requires_release() {
        assert!(Cli::try_parse_from(["debrepo", "list"]).is_err());
    }

    #[test]
    fn test_cli_promote_parsing() {
        let cli = Cli::try_parse_from([
            "debrepo", "promote", "--from", "unstable", "--to", "testing", "foo", "1.2-1",
            "--no-publish",
        ])
        .unwrap();
        match cli.command {
            Commands::Promote(args) => {
                assert_eq!(args.from, "unstable");
                assert_eq!(args.to, "testing");
                assert_eq!(args.name, "foo");
                assert_eq!(args.version.as_deref(), Some("1.2-1"));
                assert!(args.no_publish);
            }
            _ => panic!("Expected Promote command"),
        }
    }

    #[test]
    fn test_cli_global_options_to_overrides() {
        let cli = Cli::try_parse_from([
            "debrepo", "--root", "/tmp/repo", "--os", "wheezy", "--os", "trusty",
            "--exclude-os", "lucid", "publish", "--timeout", "30",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.root, Some(PathBuf::from("/tmp/repo")));
        assert_eq!(
            overrides.include_codenames,
            Some(vec!["wheezy".to_string(), "trusty".to_string()])
        );
        assert_eq!(overrides.exclude_codenames, Some(vec!["lucid".to_string()]));
        assert_eq!(overrides.timeout_secs, Some(30));
        assert_eq!(overrides.config_file, None);
    }

    #[test]
    fn test_cli_no_filters_leave_config_alone() {
        let cli = Cli::try_parse_from(["debrepo", "publish"]).unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.include_codenames, None);
        assert_eq!(overrides.exclude_codenames, None);
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["debrepo", "--root", "/tmp"]).is_err());
    }
}
