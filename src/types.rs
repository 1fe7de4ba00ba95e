//! Shared types passed between pipeline stages.
//!
//! Discovery produces [`ModuleRecord`]s, introspection turns each one into a
//! [`DocEntry`], and the page builder consumes those once. Nothing here is
//! persisted between builds; the JSON serialization exists for the `inspect`
//! command.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// An importable, public submodule found under the root package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRecord {
    /// Dotted import path, e.g. `sample.core`.
    pub dotted: String,
    /// Source file: the module's `.py` file, or `__init__.py` for packages.
    pub path: PathBuf,
    pub is_package: bool,
}

impl ModuleRecord {
    /// Last segment of the dotted path (`core` for `sample.core`).
    pub fn simple_name(&self) -> &str {
        self.dotted.rsplit('.').next().unwrap_or(&self.dotted)
    }
}

/// What kind of object a module-level name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Function,
    Class,
    Constant,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Function => "function",
            MemberKind::Class => "class",
            MemberKind::Constant => "constant",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One public name defined by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    pub name: String,
    pub kind: MemberKind,
    /// First non-blank line of the member's docstring, or empty.
    pub summary: String,
}

/// Everything the page builder needs to render one module page.
///
/// Members are in declaration order, never sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocEntry {
    pub module: String,
    /// Cleaned module docstring; empty when the module has none.
    pub docstring: String,
    pub members: Vec<MemberRecord>,
}

/// An example script that opted into the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub path: PathBuf,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// A per-item problem that was absorbed instead of failing the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: PathBuf,
    pub reason: String,
}

impl Warning {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}
