#![cfg(unix)]

use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Stand-in for aptly that serves a small fixed repository and appends every
/// invocation to `calls.log` next to itself.
const FAKE_APTLY: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$2 $3" in
  "repo list")
    printf 'wheezy-unstable\nwheezy-testing\ntrusty-unstable\ntrusty-testing\n'
    ;;
  "repo search")
    case "$5|$6" in
      'wheezy-unstable|$Architecture (=source)')
        printf 'foo|1.0-1|source|<no value>\nfoo|1.1-1|source|<no value>\n'
        ;;
      'wheezy-unstable|$Architecture (=amd64)')
        printf 'foo|1:1.1-1|amd64|foo\nlibfoo1|1.1-1|amd64|foo (1.1-1)\n'
        ;;
      *)
        echo "ERROR: no results" >&2
        exit 1
        ;;
    esac
    ;;
  "repo copy")
    case "$6" in
      *'(= 1.1-1) {amd64}')
        echo "ERROR: no packages match $6" >&2
        exit 1
        ;;
    esac
    ;;
  "-dep-follow-source repo"|"publish update")
    ;;
  *)
    echo "unexpected invocation: $*" >&2
    exit 2
    ;;
esac
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let root = dir.path();

        let aptly = root.join("fake-aptly");
        std::fs::write(&aptly, FAKE_APTLY).unwrap();
        std::fs::set_permissions(&aptly, std::fs::Permissions::from_mode(0o755)).unwrap();

        std::fs::create_dir_all(root.join("aptly/public/dists/wheezy")).unwrap();
        std::fs::write(root.join("aptly/public/dists/wheezy/Release"), "Codename: wheezy\n")
            .unwrap();

        let config = serde_json::json!({
            "releases": ["unstable", "testing"],
            "arches": ["amd64", "source"],
            "aptly_program": aptly,
            "command_timeout_secs": 30
        });
        std::fs::write(root.join("debrepo.json"), config.to_string()).unwrap();

        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn public(&self) -> PathBuf {
        self.root().join("aptly/public")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("debrepo"));
        cmd.arg("--root")
            .arg(self.root())
            .env_remove("DEBREPO_ROOT")
            .env_remove("DEBREPO_APTLY");
        cmd
    }

    fn calls(&self) -> String {
        std::fs::read_to_string(self.root().join("calls.log")).unwrap_or_default()
    }
}

#[test]
fn test_version_flag() {
    Command::new(cargo::cargo_bin!("debrepo"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("debrepo "));
}

#[test]
fn test_codenames() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .arg("codenames")
        .assert()
        .success()
        .stdout(predicate::eq("trusty\nwheezy\n"));

    fixture
        .cmd()
        .args(["--exclude-os", "trusty", "codenames"])
        .assert()
        .success()
        .stdout(predicate::eq("wheezy\n"));
}

#[test]
fn test_codenames_missing_root_runs_nothing() {
    let fixture = Fixture::new();
    let missing = fixture.root().join("missing");

    Command::new(cargo::cargo_bin!("debrepo"))
        .env_remove("DEBREPO_APTLY")
        .arg("--root")
        .arg(&missing)
        .arg("--config")
        .arg(fixture.root().join("debrepo.json"))
        .arg("codenames")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_list_release() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["list", "--release", "unstable", "--codename", "wheezy"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "foo 1.0-1 src wheezy-unstable\nfoo 1.1-1 src wheezy-unstable\nfoo 1.1-1 amd64 wheezy-unstable\nlibfoo1 1.1-1 amd64 wheezy-unstable\n",
        ));

    fixture
        .cmd()
        .args(["list", "--release", "unstable", "--arch", "amd64", "libfoo1"])
        .assert()
        .success()
        .stdout(predicate::eq("libfoo1 1.1-1 amd64 wheezy-unstable\n"));
}

#[test]
fn test_promote_and_publish() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["promote", "--from", "unstable", "--to", "testing", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Promoted foo 1.1-1 src to wheezy-testing"))
        .stdout(predicate::str::contains("Promoted foo 1.1-1 amd64 to wheezy-testing"));

    let calls = fixture.calls();
    assert!(calls.contains("-dep-follow-source repo copy -with-deps wheezy-unstable wheezy-testing $Source (foo), $SourceVersion (= 1.1-1)"));
    assert!(calls.contains("repo copy wheezy-unstable wheezy-testing foo (= 1:1.1-1) {amd64}"));
    assert!(calls.contains("publish update wheezy testing"));
    assert!(!calls.contains("publish update trusty"));

    let index = std::fs::read_to_string(fixture.public().join("index.html")).unwrap();
    assert!(index.contains("dists/"));
    assert!(fixture.public().join("dists/wheezy/index.html").exists());
}

#[test]
fn test_promote_without_publish() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args([
            "promote", "--from", "unstable", "--to", "testing", "foo", "1.0", "--no-publish",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Promoted foo 1.0-1 src to wheezy-testing"))
        .stdout(predicate::str::contains("debrepo publish --release testing"));

    assert!(!fixture.calls().contains("publish update"));
    assert!(!fixture.public().join("index.html").exists());
}

#[test]
fn test_promote_unknown_package_fails() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["--os", "trusty", "promote", "--from", "unstable", "--to", "testing", "foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_publish_release() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["publish", "--release", "testing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Published 2 codename(s) of testing"));

    let calls = fixture.calls();
    assert!(calls.contains("publish update trusty testing"));
    assert!(calls.contains("publish update wheezy testing"));
    assert!(!calls.contains("publish update wheezy unstable"));
}

#[test]
fn test_tool_failure_is_reported() {
    let fixture = Fixture::new();
    std::fs::write(
        fixture.root().join("debrepo.json"),
        r#"{"aptly_program": "/nonexistent/aptly"}"#,
    )
    .unwrap();

    fixture
        .cmd()
        .arg("codenames")
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/aptly"));
}
