//! Example gallery.
//!
//! Example scripts opt into the gallery with a module-level literal:
//!
//! ```python
//! __gallery__ = {
//!     "title": "Hello world",
//!     "description": "The smallest possible example.",
//!     "thumbnail": "img/hello.png",   # optional
//! }
//! ```
//!
//! The block is read statically, like everything else the hook inspects;
//! examples are never executed. Scripts without the block are left out
//! silently. Scripts whose block is malformed are left out with a warning.
//!
//! Cards link to `<link_base><stem>/`, the page the site generator renders for
//! each example, and are laid out in a single grid that replaces the
//! examples page's marker region.

use crate::marker::{Marker, MarkerError};
use crate::python::{self, LiteralError, SyntaxError, Tok};
use crate::types::{GalleryItem, Warning};
use maud::{Markup, html};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the module-level metadata binding.
pub const METADATA_NAME: &str = "__gallery__";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("cannot read examples directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("examples page: {0}")]
    Marker(#[from] MarkerError),
}

/// Why a metadata block was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("cannot be parsed: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("__gallery__: {0}")]
    Literal(#[from] LiteralError),
    #[error("__gallery__ is missing required key '{0}'")]
    MissingKey(&'static str),
}

/// Metadata declared by one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Default)]
pub struct GalleryScan {
    pub items: Vec<GalleryItem>,
    pub warnings: Vec<Warning>,
}

/// Collect gallery items from the direct `*.py` children of `dir`.
///
/// A missing directory yields no items. Items are ordered by file name.
pub fn scan_examples(dir: &Path) -> Result<GalleryScan, GalleryError> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "examples directory not found");
        return Ok(GalleryScan::default());
    }

    let read_err = |source| GalleryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut scripts: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    scripts.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "py"));
    scripts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut scan = GalleryScan::default();
    for path in scripts {
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                scan.warnings.push(Warning::new(&path, format!("cannot be read: {e}")));
                continue;
            }
        };
        match gallery_metadata(&source) {
            Ok(Some(meta)) => scan.items.push(GalleryItem {
                path,
                title: meta.title,
                description: meta.description,
                thumbnail: meta.thumbnail,
            }),
            Ok(None) => tracing::debug!(path = %path.display(), "no gallery metadata"),
            Err(e) => scan.warnings.push(Warning::new(&path, e.to_string())),
        }
    }
    Ok(scan)
}

/// Extract the `__gallery__` block from script source.
///
/// Only top-level assignments count; the last one wins, as it would at
/// runtime. Unknown keys are ignored.
pub fn gallery_metadata(source: &str) -> Result<Option<Metadata>, MetadataError> {
    let lines = python::logical_lines(source)?;
    let value = lines
        .iter()
        .filter(|line| line.indent == 0)
        .filter_map(|line| metadata_value(&line.tokens()))
        .last();
    let Some(value) = value else {
        return Ok(None);
    };

    let mut entries = python::string_dict(&value)?;
    let mut take = |key: &str| {
        entries
            .iter()
            .rposition(|(k, _)| k == key)
            .map(|i| entries.swap_remove(i).1)
    };
    let title = take("title").ok_or(MetadataError::MissingKey("title"))?;
    let description = take("description").ok_or(MetadataError::MissingKey("description"))?;
    let thumbnail = take("thumbnail").filter(|t| !t.trim().is_empty());
    Ok(Some(Metadata {
        title,
        description,
        thumbnail,
    }))
}

/// Right-hand side of `__gallery__ = ...` or `__gallery__: T = ...`.
fn metadata_value<'a>(toks: &[Tok<'a>]) -> Option<Vec<Tok<'a>>> {
    let (first, rest) = toks.split_first()?;
    if !first.is_name(METADATA_NAME) {
        return None;
    }
    let value_start = match rest.first() {
        Some(t) if t.is_op("=") => 1,
        Some(t) if t.is_op(":") => rest.iter().position(|t| t.is_op("="))? + 1,
        _ => return None,
    };
    Some(rest[value_start..].to_vec())
}

pub fn render_card(item: &GalleryItem, link_base: &str) -> Markup {
    let stem = item
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    html! {
        a.gallery-card href=(format!("{link_base}{stem}/")) {
            @if let Some(thumbnail) = &item.thumbnail {
                img.gallery-thumb src=(thumbnail) alt=(item.title) loading="lazy";
            }
            span.gallery-title { (item.title) }
            @if !item.description.is_empty() {
                span.gallery-description { (item.description) }
            }
        }
    }
}

/// The card grid. An empty gallery says so explicitly.
pub fn render_gallery(items: &[GalleryItem], link_base: &str) -> Markup {
    html! {
        div.gallery-grid {
            @for item in items {
                (render_card(item, link_base))
            }
        }
        @if items.is_empty() {
            p.gallery-empty { "No examples yet." }
        }
    }
}

/// Shown instead of the grid in fast-build mode.
pub fn skipped_notice(env_var: &str) -> Markup {
    html! {
        p.gallery-skipped {
            "Gallery skipped for a fast build (" code { (env_var) } " is set)."
        }
    }
}

/// Rewrite the examples page's marker region with `fragment`.
pub fn render_examples_page(content: &str, marker: &Marker, fragment: &Markup) -> Result<String, GalleryError> {
    Ok(marker.replace(content, &fragment.0)?)
}
