use std::{
    env,
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

/// Set by packagers building from a tarball without git metadata.
const VERSION_OVERRIDE: &str = "DEBREPO_BUILD_VERSION";
/// Reproducible-builds timestamp, honoured instead of the clock.
const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed={}", VERSION_OVERRIDE);
    println!("cargo:rerun-if-env-changed={}", SOURCE_DATE_EPOCH);

    let version = match env::var(VERSION_OVERRIDE) {
        Ok(version) if !version.trim().is_empty() => version.trim().to_string(),
        _ => git_version().unwrap_or_else(|| {
            format!("{}+unknown.{}", env!("CARGO_PKG_VERSION"), timestamp())
        }),
    };

    println!("cargo:rustc-env=DEBREPO_VERSION={}", version);
}

/// `git describe` with the tag's `v` dropped and Debian-friendly separators:
/// `v1.2.0-3-gabc123-dirty` becomes `1.2.0+3.gabc123.dirty<timestamp>`.
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    let described = described.strip_prefix('v').unwrap_or(described);
    if described.is_empty() {
        return None;
    }

    let (described, dirty) = match described.strip_suffix("-dirty") {
        Some(clean) => (clean, true),
        None => (described, false),
    };
    let mut parts = described.splitn(2, '-');
    let mut version = parts.next().unwrap_or_default().to_string();
    if let Some(rest) = parts.next() {
        version.push('+');
        version.push_str(&rest.replace('-', "."));
    }
    if dirty {
        let separator = if version.contains('+') { '.' } else { '+' };
        version.push(separator);
        version.push_str(&format!("dirty{}", timestamp()));
    }
    Some(version)
}

fn timestamp() -> u64 {
    env::var(SOURCE_DATE_EPOCH)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default()
        })
}
