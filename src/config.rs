//! Hook configuration.
//!
//! Handles loading, validating, and merging `apidoc-hook.toml`. Stock defaults
//! match the layout of a generated project, so most projects need no config
//! file at all; a sparse file overrides only what differs.
//!
//! ## Config File Location
//!
//! Place `apidoc-hook.toml` in the project root (next to `pyproject.toml`), or
//! point at another file with `--config`:
//!
//! ```text
//! project/
//! ├── apidoc-hook.toml        # Hook config (overrides stock defaults)
//! ├── pyproject.toml          # [project].name is the package name fallback
//! ├── src/sample/             # Package to document
//! ├── examples/               # Gallery scripts
//! └── docs/
//!     ├── api-submodule.html  # Page template
//!     └── pages/
//!         ├── api-reference.md
//!         ├── examples.md
//!         └── api/            # Generated, git-ignored
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [package]
//! name = ""                 # Import name; empty = [project].name from pyproject.toml
//! source_dir = "src"        # Searched first; the project root is the fallback
//!
//! [api]
//! output_dir = "docs/pages/api"
//! template = "docs/api-submodule.html"
//! index_page = "docs/pages/api-reference.md"
//! marker = "API_TABLE"      # <!-- API_TABLE --> in the index page
//! gitignore = true          # Write a .gitignore into output_dir
//!
//! [gallery]
//! enabled = false
//! examples_dir = "examples"
//! page = "docs/pages/examples.md"
//! marker = "GALLERY"
//! link_base = "../examples/"
//! skip_env = "MKDOCS_SKIP_NOTEBOOKS"
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only turn the gallery on
//! [gallery]
//! enabled = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::naming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config filename, looked up in the project root.
pub const CONFIG_FILE: &str = "apidoc-hook.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Hook configuration loaded from `apidoc-hook.toml`.
///
/// All paths are relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HookConfig {
    pub package: PackageConfig,
    pub api: ApiConfig,
    /// The project's "examples enabled" switch and gallery locations.
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Root package import name. Empty means "ask pyproject.toml".
    pub name: String,
    pub source_dir: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            source_dir: "src".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub output_dir: String,
    pub template: String,
    pub index_page: String,
    pub marker: String,
    pub gitignore: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            output_dir: "docs/pages/api".into(),
            template: "docs/api-submodule.html".into(),
            index_page: "docs/pages/api-reference.md".into(),
            marker: "API_TABLE".into(),
            gitignore: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub enabled: bool,
    pub examples_dir: String,
    pub page: String,
    pub marker: String,
    /// Prefix for card links, relative to the examples page.
    pub link_base: String,
    /// Environment variable that requests a fast build.
    pub skip_env: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            examples_dir: "examples".into(),
            page: "docs/pages/examples.md".into(),
            marker: "GALLERY".into(),
            link_base: "../examples/".into(),
            skip_env: "MKDOCS_SKIP_NOTEBOOKS".into(),
        }
    }
}

impl HookConfig {
    /// Validate values that deserialization alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("package.source_dir", &self.package.source_dir),
            ("api.output_dir", &self.api.output_dir),
            ("api.template", &self.api.template),
            ("api.index_page", &self.api.index_page),
            ("gallery.examples_dir", &self.gallery.examples_dir),
            ("gallery.page", &self.gallery.page),
            ("gallery.skip_env", &self.gallery.skip_env),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }

        for (key, marker) in [("api.marker", &self.api.marker), ("gallery.marker", &self.gallery.marker)] {
            if marker.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if marker.contains("-->") || marker.starts_with('/') || marker.chars().any(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a single word without '-->' or a leading '/'"
                )));
            }
        }

        let output_dir = Path::new(&self.api.output_dir);
        for (key, path) in [
            ("api.template", &self.api.template),
            ("api.index_page", &self.api.index_page),
            ("gallery.page", &self.gallery.page),
        ] {
            if Path::new(path).starts_with(output_dir) {
                return Err(ConfigError::Validation(format!(
                    "{key} must not be inside api.output_dir, which is regenerated on every build"
                )));
            }
        }

        if self.api.index_page == self.gallery.page && self.api.marker == self.gallery.marker {
            return Err(ConfigError::Validation(
                "api.marker and gallery.marker must differ when both regions share a page".into(),
            ));
        }
        Ok(())
    }

    /// The root package import name.
    ///
    /// Uses `package.name` when set, otherwise `[project].name` from the
    /// project's `pyproject.toml`, normalized to an import name.
    pub fn package_name(&self, root: &Path) -> Result<String, ConfigError> {
        if !self.package.name.trim().is_empty() {
            return Ok(self.package.name.trim().to_string());
        }
        let pyproject = root.join("pyproject.toml");
        let distribution = if pyproject.exists() {
            let value: toml::Value = toml::from_str(&fs::read_to_string(&pyproject)?)?;
            value
                .get("project")
                .and_then(|p| p.get("name"))
                .and_then(|n| n.as_str())
                .map(str::to_string)
        } else {
            None
        };
        distribution
            .map(|name| naming::import_name_from_distribution(&name))
            .ok_or_else(|| {
                ConfigError::Validation(
                    "package.name is not set and pyproject.toml has no [project].name".into(),
                )
            })
    }
}

// =============================================================================
// Fast-build toggle
// =============================================================================

/// Whether an environment value means "on": `1`, `true`, `yes` or `on`, in
/// any case. Anything else, including an empty string, is off.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Whether the environment variable `var` requests a fast build.
pub fn fast_build_requested(var: &str) -> bool {
    std::env::var(var).is_ok_and(|value| is_truthy(&value))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(HookConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<HookConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: HookConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a specific file, falling back to defaults if it is absent.
pub fn load_config_file(path: &Path) -> Result<HookConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    tracing::debug!(path = %path.display(), found = overlay.is_some(), "loaded config");
    resolve_config(overlay)
}

/// Load `apidoc-hook.toml` from the project root.
pub fn load_config(root: &Path) -> Result<HookConfig, ConfigError> {
    load_config_file(&root.join(CONFIG_FILE))
}

/// Returns a fully-commented stock `apidoc-hook.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# apidoc-hook configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the project root.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Package to document
# ---------------------------------------------------------------------------
[package]
# Root package import name. Leave empty to use [project].name from
# pyproject.toml, with dashes turned into underscores.
name = ""

# Directory holding the package (src layout). The project root is searched
# when the package is not found here.
source_dir = "src"

# ---------------------------------------------------------------------------
# API reference
# ---------------------------------------------------------------------------
[api]
# Generated pages, one per public submodule. Regenerated and pruned on every
# build: do not put hand-written files here.
output_dir = "docs/pages/api"

# Page template. Must contain {package_name}, {module_name}, {module_doc}
# and {members_tables}.
template = "docs/api-submodule.html"

# Hand-written page that receives the module index table.
index_page = "docs/pages/api-reference.md"

# The index table replaces <!-- API_TABLE --> in index_page.
marker = "API_TABLE"

# Write a .gitignore into output_dir so generated pages stay out of git.
gitignore = true

# ---------------------------------------------------------------------------
# Example gallery
# ---------------------------------------------------------------------------
[gallery]
# Build the gallery at all.
enabled = false

# Scripts with a top-level __gallery__ = {"title": ..., "description": ...}
# dict become gallery cards.
examples_dir = "examples"

# Hand-written page that receives the gallery grid.
page = "docs/pages/examples.md"

# The grid replaces <!-- GALLERY --> in page.
marker = "GALLERY"

# Card link prefix, relative to page. Cards link to <link_base><script stem>/.
link_base = "../examples/"

# When this environment variable is 1/true/yes/on, the gallery is skipped and
# a short notice is written instead.
skip_env = "MKDOCS_SKIP_NOTEBOOKS"
"##
}
