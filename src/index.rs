//! Static `index.html` listings for the published tree.

use anyhow::{Context, Result};
use log::debug;
use minijinja::{Environment, context};
use serde::Serialize;
use std::path::Path;

use crate::runtime::Runtime;

pub const INDEX_FILE: &str = "index.html";

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Index of {{ title }}</title></head>
<body>
<h1>Index of {{ title }}</h1>
<ul>
<li><a href="../">../</a></li>
{% for entry in entries %}
<li><a href="{{ entry.name }}{% if entry.dir %}/{% endif %}">{{ entry.name }}{% if entry.dir %}/{% endif %}</a></li>
{% endfor %}
</ul>
</body>
</html>
"#;

#[derive(Serialize)]
struct Entry<'n> {
    name: &'n str,
    dir: bool,
}

/// Template environment with the listing page; `.html` names autoescape.
fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(INDEX_FILE, INDEX_TEMPLATE)
        .context("Failed to load index template")?;
    Ok(env)
}

/// Write an `index.html` listing into `dir`, and into every subdirectory when
/// `recursive` is set. Returns the number of listings written; a missing
/// directory writes nothing.
///
/// Symlinked directories are listed but never descended into.
#[tracing::instrument(skip(runtime))]
pub fn create_index<R: Runtime>(runtime: &R, dir: &Path, recursive: bool) -> Result<usize> {
    let env = environment()?;
    write_index(runtime, &env, dir, recursive)
}

fn write_index<R: Runtime>(
    runtime: &R,
    env: &Environment<'_>,
    dir: &Path,
    recursive: bool,
) -> Result<usize> {
    if !runtime.is_dir(dir) {
        debug!("Skipping index for missing directory {:?}", dir);
        return Ok(0);
    }

    let mut paths = runtime.read_dir(dir)?;
    paths.sort();

    let mut entries = Vec::new();
    let mut written = 0;
    for path in &paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == INDEX_FILE || name.starts_with('.') {
            continue;
        }

        let is_dir = runtime.is_dir(path);
        if is_dir && recursive {
            if runtime.is_symlink(path) {
                debug!("Not descending into symlink {:?}", path);
            } else {
                written += write_index(runtime, env, path, true)?;
            }
        }
        entries.push(Entry { name, dir: is_dir });
    }

    let html = env
        .get_template(INDEX_FILE)
        .and_then(|template| {
            template.render(context! {
                title => dir.display().to_string(),
                entries => entries,
            })
        })
        .with_context(|| format!("Failed to render index of {:?}", dir))?;

    let index = dir.join(INDEX_FILE);
    runtime
        .write(&index, html.as_bytes())
        .with_context(|| format!("Failed to write index {:?}", index))?;
    Ok(written + 1)
}
