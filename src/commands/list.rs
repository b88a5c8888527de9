use anyhow::Result;
use log::info;

use crate::aptly::Aptly;
use crate::config::Config;
use crate::manager::listing_order;
use crate::package::{Arch, PackageMetadata};
use crate::release::ReleaseTree;
use crate::runtime::Runtime;

use super::codenames::discover;

/// Narrows what `list` prints. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub codename: Option<String>,
    pub arch: Option<Arch>,
    pub name: Option<String>,
}

/// Print `name version arch origin` for every package of `release` that
/// passes `filter`.
///
/// Only the catalogs the filter can match are loaded.
#[tracing::instrument(skip(runtime, config))]
pub async fn list<R: Runtime>(
    runtime: &R,
    config: &Config,
    release: &str,
    filter: &ListFilter,
) -> Result<()> {
    let mut codenames = discover(runtime, config).await?;
    if let Some(wanted) = &filter.codename {
        codenames.retain(|c| c == wanted);
    }
    let arches = match &filter.arch {
        Some(arch) => vec![arch.clone()],
        None => config
            .arches
            .iter()
            .map(|a| a.parse::<Arch>())
            .collect::<Result<Vec<_>>>()?,
    };

    let aptly = Aptly::from_config(runtime, config);
    let tree = ReleaseTree::load(&aptly, release, &codenames, &arches, &config.public_dir()).await?;

    let packages = select(&tree, filter);
    if packages.is_empty() {
        info!("No packages in {} match {:?}", release, filter);
    }
    for package in packages {
        println!("{}", format_line(package));
    }
    Ok(())
}

pub(crate) fn select<'t, R: Runtime>(
    tree: &'t ReleaseTree<'_, R>,
    filter: &ListFilter,
) -> Vec<&'t PackageMetadata> {
    let mut packages: Vec<&PackageMetadata> = tree
        .catalogs()
        .filter(|c| filter.codename.as_ref().is_none_or(|wanted| c.codename() == wanted.as_str()))
        .flat_map(|c| match &filter.name {
            Some(name) => c.packages(name).iter().collect::<Vec<_>>(),
            None => c.iter().collect(),
        })
        .filter(|p| filter.arch.as_ref().is_none_or(|arch| p.arch == *arch))
        .collect();
    packages.sort_by(|a, b| listing_order(a, b));
    packages
}

fn format_line(package: &PackageMetadata) -> String {
    format!(
        "{} {} {} {}",
        package.name, package.version, package.arch, package.os
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{fake_aptly, test_config};

    const LISTINGS: &[(&str, &str, &str)] = &[
        (
            "wheezy-testing",
            "amd64",
            "foo|1.10-1|amd64|foo\nfoo|1.2-1|amd64|foo\nfoo-doc|1.2-1|all|foo\n",
        ),
        ("wheezy-testing", "source", "foo|1.2-1|source|<no value>\n"),
        ("trusty-testing", "amd64", "bar|0.3-1|amd64|<no value>\n"),
    ];

    async fn load<'a>(
        runtime: &'a MockRuntime,
        codenames: &[String],
    ) -> ReleaseTree<'a, MockRuntime> {
        let config = test_config();
        let aptly = Aptly::from_config(runtime, &config);
        ReleaseTree::load(
            &aptly,
            "testing",
            codenames,
            &[Arch::Binary("amd64".into()), Arch::Source],
            &config.public_dir(),
        )
        .await
        .unwrap()
    }

    fn lines(packages: Vec<&PackageMetadata>) -> Vec<String> {
        packages.into_iter().map(format_line).collect()
    }

    #[tokio::test]
    async fn test_select_everything_sorted() {
        let mut runtime = MockRuntime::new();
        fake_aptly(&mut runtime, &[], LISTINGS);
        let tree = load(&runtime, &["trusty".into(), "wheezy".into()]).await;

        assert_eq!(
            lines(select(&tree, &ListFilter::default())),
            vec![
                "bar 0.3-1 amd64 trusty-testing",
                "foo 1.2-1 src wheezy-testing",
                "foo 1.2-1 amd64 wheezy-testing",
                "foo 1.10-1 amd64 wheezy-testing",
                "foo-doc 1.2-1 all wheezy-testing",
            ]
        );
    }

    #[tokio::test]
    async fn test_select_by_name_arch_and_codename() {
        let mut runtime = MockRuntime::new();
        fake_aptly(&mut runtime, &[], LISTINGS);
        let tree = load(&runtime, &["trusty".into(), "wheezy".into()]).await;

        let filter = ListFilter {
            name: Some("foo".into()),
            arch: Some(Arch::Binary("amd64".into())),
            ..Default::default()
        };
        assert_eq!(
            lines(select(&tree, &filter)),
            vec!["foo 1.2-1 amd64 wheezy-testing", "foo 1.10-1 amd64 wheezy-testing"]
        );

        let filter = ListFilter {
            codename: Some("trusty".into()),
            ..Default::default()
        };
        assert_eq!(lines(select(&tree, &filter)), vec!["bar 0.3-1 amd64 trusty-testing"]);
    }

    #[tokio::test]
    async fn test_list_only_loads_requested_codename() {
        let mut runtime = MockRuntime::new();
        fake_aptly(&mut runtime, &["wheezy-testing", "trusty-testing"], LISTINGS);

        let filter = ListFilter {
            codename: Some("trusty".into()),
            arch: Some(Arch::Binary("amd64".into())),
            name: None,
        };
        list(&runtime, &test_config(), "testing", &filter)
            .await
            .unwrap();
    }
}
