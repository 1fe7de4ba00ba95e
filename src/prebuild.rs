//! Pre-build orchestration.
//!
//! Runs once before every documentation build:
//!
//! ```text
//! discover → introspect → render pages + index → (gallery) → write
//! ```
//!
//! The work is split into [`plan`], which reads everything and renders every
//! output in memory, and [`apply`], which writes. Every structural failure
//! (missing template placeholder, bad marker, colliding page names) surfaces
//! during planning, so a failed build never leaves a half-written docs tree.
//! The `check` command is `plan` without `apply`.
//!
//! Writing is idempotent. Files are only rewritten when their content changes,
//! which keeps `mkdocs serve` from seeing its own output as an edit, and pages
//! for modules that no longer exist are pruned from the output directory.

use crate::config::{ConfigError, HookConfig};
use crate::discover::{self, DiscoverError};
use crate::gallery::{self, GalleryError};
use crate::introspect::{self, IntrospectError};
use crate::marker::Marker;
use crate::pages::{self, ApiPage, PageError, PageTemplate};
use crate::types::{DocEntry, Warning};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Contents of the `.gitignore` written into the output directory.
const GITIGNORE: &str = "# Generated by apidoc-hook\n*\n";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error(transparent)]
    Introspect(#[from] IntrospectError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Skip the gallery and write a notice in its place.
    pub fast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryOutcome {
    /// The project has no gallery; the examples page is not touched.
    Disabled,
    /// Fast build: the region holds a notice instead of cards.
    Skipped,
    /// Number of cards rendered.
    Rendered(usize),
}

/// Discovery and introspection results, as printed by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub package: String,
    pub entries: Vec<DocEntry>,
    pub warnings: Vec<Warning>,
}

/// Everything a build would write, rendered but not yet on disk.
#[derive(Debug, Clone)]
pub struct Plan {
    pub package: String,
    pub api_dir: PathBuf,
    pub pages: Vec<ApiPage>,
    /// Hand-authored pages with their marker regions filled, in write order.
    pub hosts: Vec<(PathBuf, String)>,
    /// Marker regions filled across all hosts; two regions may share a host.
    pub regions: usize,
    pub gallery: GalleryOutcome,
    pub warnings: Vec<Warning>,
    gitignore: bool,
}

/// What a build did. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub package: String,
    pub pages: Vec<PathBuf>,
    pub hosts: Vec<PathBuf>,
    /// Files whose content changed on disk.
    pub updated: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub gallery: GalleryOutcome,
    pub warnings: Vec<Warning>,
}

/// Locate, discover and introspect the package.
pub fn inspect(root: &Path, config: &HookConfig) -> Result<Inspection, BuildError> {
    let package = config.package_name(root)?;
    let package_dir = discover::locate_package(root, &config.package.source_dir, &package)?;
    let discovery = discover::discover(&package, &package_dir)?;
    tracing::info!(
        package = %package,
        modules = discovery.modules.len(),
        skipped = discovery.warnings.len(),
        "discovered modules"
    );

    let entries = discovery
        .modules
        .iter()
        .map(introspect::introspect)
        .collect::<Result<Vec<_>, _>>()?;

    let warnings = discovery
        .warnings
        .into_iter()
        .map(|w| relative_warning(root, w))
        .collect();

    Ok(Inspection {
        package,
        entries,
        warnings,
    })
}

/// Render every output without writing anything.
pub fn plan(root: &Path, config: &HookConfig, options: &BuildOptions) -> Result<Plan, BuildError> {
    let Inspection {
        package,
        entries,
        mut warnings,
    } = inspect(root, config)?;

    let template = PageTemplate::parse(read(&root.join(&config.api.template))?)?;
    let rendered = pages::render_pages(&template, &package, &entries)?;
    tracing::info!(pages = rendered.len(), "rendered API pages");

    let api_dir = root.join(&config.api.output_dir);
    let index_page = root.join(&config.api.index_page);
    let rows = pages::table_rows(&entries, &pages::relative_link_base(&index_page, &api_dir));
    let index = pages::render_index(&read(&index_page)?, &Marker::new(&config.api.marker), &rows)?;
    let mut hosts = vec![(index_page, index)];
    let mut regions = 1;

    let gallery = if config.gallery.enabled {
        let page = root.join(&config.gallery.page);
        let marker = Marker::new(&config.gallery.marker);
        let (fragment, outcome) = if options.fast {
            tracing::info!(env = %config.gallery.skip_env, "fast build, skipping gallery");
            (gallery::skipped_notice(&config.gallery.skip_env), GalleryOutcome::Skipped)
        } else {
            let scan = gallery::scan_examples(&root.join(&config.gallery.examples_dir))?;
            warnings.extend(scan.warnings.into_iter().map(|w| relative_warning(root, w)));
            tracing::info!(cards = scan.items.len(), "rendered gallery");
            (
                gallery::render_gallery(&scan.items, &config.gallery.link_base),
                GalleryOutcome::Rendered(scan.items.len()),
            )
        };
        let current = match hosts.iter().find(|(path, _)| *path == page) {
            Some((_, content)) => content.clone(),
            None => read(&page)?,
        };
        let content = gallery::render_examples_page(&current, &marker, &fragment)?;
        match hosts.iter_mut().find(|(path, _)| *path == page) {
            Some(host) => host.1 = content,
            None => hosts.push((page, content)),
        }
        regions += 1;
        outcome
    } else {
        GalleryOutcome::Disabled
    };

    warnings.sort_by(|a, b| a.path.cmp(&b.path));
    for warning in &warnings {
        tracing::warn!(path = %warning.path.display(), "skipped: {}", warning.reason);
    }

    Ok(Plan {
        package,
        api_dir,
        pages: rendered,
        hosts,
        regions,
        gallery,
        warnings,
        gitignore: config.api.gitignore,
    })
}

/// Write a plan to disk and prune stale pages.
pub fn apply(root: &Path, plan: Plan) -> Result<BuildReport, BuildError> {
    fs::create_dir_all(&plan.api_dir).map_err(|source| BuildError::Write {
        path: plan.api_dir.clone(),
        source,
    })?;

    let mut updated = Vec::new();
    let mut page_paths = Vec::with_capacity(plan.pages.len());
    for page in &plan.pages {
        let path = plan.api_dir.join(&page.file_name);
        if write_if_changed(&path, &page.content)? {
            tracing::debug!(module = %page.module, path = %path.display(), "wrote page");
            updated.push(relative(root, &path));
        }
        page_paths.push(relative(root, &path));
    }

    if plan.gitignore {
        let path = plan.api_dir.join(".gitignore");
        if write_if_changed(&path, GITIGNORE)? {
            updated.push(relative(root, &path));
        }
    }

    let mut host_paths = Vec::with_capacity(plan.hosts.len());
    for (path, content) in &plan.hosts {
        if write_if_changed(path, content)? {
            tracing::debug!(path = %path.display(), "updated marker region");
            updated.push(relative(root, path));
        }
        host_paths.push(relative(root, path));
    }

    // Only once every write succeeded.
    let keep: HashSet<&str> = plan.pages.iter().map(|p| p.file_name.as_str()).collect();
    let pruned = prune_stale(&plan.api_dir, &keep)?;

    Ok(BuildReport {
        package: plan.package,
        pages: page_paths,
        hosts: host_paths,
        updated,
        pruned: pruned.iter().map(|p| relative(root, p)).collect(),
        gallery: plan.gallery,
        warnings: plan.warnings,
    })
}

/// The pre-build entry point: plan, then write.
pub fn run(root: &Path, config: &HookConfig, options: &BuildOptions) -> Result<BuildReport, BuildError> {
    let plan = plan(root, config, options)?;
    apply(root, plan)
}

/// Remove `*.md` files in `dir` that are not in `keep`. Returns removed paths, sorted.
fn prune_stale(dir: &Path, keep: &HashSet<&str>) -> Result<Vec<PathBuf>, BuildError> {
    let read_err = |source| BuildError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut stale = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_page = path.is_file() && path.extension().is_some_and(|ext| ext == "md");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if is_page && !keep.contains(name) {
            stale.push(path);
        }
    }
    stale.sort();
    for path in &stale {
        fs::remove_file(path).map_err(|source| BuildError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "pruned stale page");
    }
    Ok(stale)
}

/// Write `content` unless the file already holds exactly that. Returns whether it wrote.
fn write_if_changed(path: &Path, content: &str) -> Result<bool, BuildError> {
    if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        return Ok(false);
    }
    fs::write(path, content).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

fn read(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn relative_warning(root: &Path, warning: Warning) -> Warning {
    Warning::new(relative(root, &warning.path), warning.reason)
}
