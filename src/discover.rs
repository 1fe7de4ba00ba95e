//! Submodule discovery.
//!
//! Walks a package directory and yields one [`ModuleRecord`] per importable,
//! public submodule, recursively, sorted by dotted path.
//!
//! ## Rules
//!
//! - A subpackage is a directory with an `__init__.py`. Other directories
//!   (data folders, `__pycache__`, namespace-style dirs) are not walked.
//! - Names starting with `_` are private: the module, or the whole subtree of
//!   a private package, is left out silently.
//! - The root package itself is not a submodule and gets no record.
//!
//! ## Import Failures
//!
//! Nothing is executed, so "importing" a module means reading it as UTF-8 and
//! tokenizing it with [`python::logical_lines`]. Anything that would keep a
//! module from importing is recorded as a [`Warning`] and the module skipped;
//! a failing package `__init__.py` takes its subtree with it. The rest of the
//! tree is still returned:
//!
//! - unreadable or non-UTF-8 source
//! - unterminated strings, unbalanced brackets
//! - a file name that is not a Python identifier (`my-module.py`)
//! - `core.py` next to a `core/` package (the package shadows the module)
//! - compiled extension modules (`.so`, `.pyd`), which have no source to read

use crate::naming;
use crate::python::{self, SyntaxError};
use crate::types::{ModuleRecord, Warning};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("'{0}' is not a valid package name")]
    InvalidPackageName(String),
    #[error("package '{name}' not found (looked in {searched})")]
    PackageNotFound { name: String, searched: String },
    #[error("{0} is not a package (no __init__.py)")]
    NotAPackage(PathBuf),
}

/// Why a module could not be "imported".
#[derive(Error, Debug)]
enum ImportFailure {
    #[error("cannot be read: {0}")]
    Read(#[from] std::io::Error),
    #[error("cannot be parsed: {0}")]
    Syntax(#[from] SyntaxError),
}

/// Result of walking one package.
#[derive(Debug)]
pub struct Discovery {
    pub modules: Vec<ModuleRecord>,
    pub warnings: Vec<Warning>,
}

const EXTENSION_SUFFIXES: &[&str] = &["so", "pyd"];

/// Find the directory of package `name` under a project root.
///
/// Tries the src layout (`<root>/<source_dir>/<name>`) first, then the flat
/// layout (`<root>/<name>`). Dotted names map to nested directories.
pub fn locate_package(root: &Path, source_dir: &str, name: &str) -> Result<PathBuf, DiscoverError> {
    if name.is_empty() || !name.split('.').all(naming::is_identifier) {
        return Err(DiscoverError::InvalidPackageName(name.to_string()));
    }
    let relative: PathBuf = name.split('.').collect();
    let mut candidates = Vec::new();
    if !source_dir.is_empty() {
        candidates.push(root.join(source_dir).join(&relative));
    }
    candidates.push(root.join(&relative));

    if let Some(found) = candidates.iter().find(|c| c.join("__init__.py").is_file()) {
        return Ok(found.clone());
    }
    if let Some(dir) = candidates.iter().find(|c| c.is_dir()) {
        return Err(DiscoverError::NotAPackage(dir.clone()));
    }
    Err(DiscoverError::PackageNotFound {
        name: name.to_string(),
        searched: candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Walk `package_dir` (the directory of package `package`) for submodules.
pub fn discover(package: &str, package_dir: &Path) -> Result<Discovery, DiscoverError> {
    if !package_dir.join("__init__.py").is_file() {
        return Err(DiscoverError::NotAPackage(package_dir.to_path_buf()));
    }

    let mut modules = Vec::new();
    let mut warnings = Vec::new();
    let mut pruned = Vec::new();

    let walker = WalkDir::new(package_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(entry, &mut pruned));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(package_dir).to_path_buf();
                warnings.push(Warning::new(path, err.to_string()));
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(package_dir) else {
            continue;
        };

        if entry.file_type().is_dir() {
            modules.push(ModuleRecord {
                dotted: dotted_path(package, relative),
                path: entry.path().join("__init__.py"),
                is_package: true,
            });
        } else if let Some(record) = module_file(package, package_dir, &entry, &mut warnings) {
            modules.push(record);
        }
    }

    warnings.append(&mut pruned);
    warnings.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.reason.cmp(&b.reason)));
    modules.sort_by(|a, b| a.dotted.cmp(&b.dotted));

    for module in &modules {
        tracing::debug!(module = %module.dotted, "discovered");
    }
    Ok(Discovery { modules, warnings })
}

/// Directory pruning: only importable, public packages are descended into.
fn keep_entry(entry: &DirEntry, warnings: &mut Vec<Warning>) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name == "__pycache__" {
        return false;
    }
    if !entry.file_type().is_dir() {
        return true;
    }

    let init = entry.path().join("__init__.py");
    if !init.is_file() || !naming::is_public(&name) {
        return false;
    }
    if !naming::is_identifier(&name) {
        warnings.push(Warning::new(entry.path(), "not an importable package name"));
        return false;
    }
    match probe(&init) {
        Ok(()) => true,
        Err(failure) => {
            warnings.push(Warning::new(init, failure.to_string()));
            false
        }
    }
}

/// Record for a plain module file, or `None` when it is skipped.
fn module_file(
    package: &str,
    package_dir: &Path,
    entry: &DirEntry,
    warnings: &mut Vec<Warning>,
) -> Option<ModuleRecord> {
    let path = entry.path();
    let file_name = entry.file_name().to_string_lossy();
    let extension = path.extension()?.to_string_lossy().to_lowercase();

    if EXTENSION_SUFFIXES.contains(&extension.as_str()) {
        let module = file_name.split('.').next().unwrap_or_default();
        if naming::is_public(module) && naming::is_identifier(module) {
            warnings.push(Warning::new(
                path,
                "compiled extension module has no source to introspect",
            ));
        }
        return None;
    }
    if extension != "py" {
        return None;
    }

    let stem = path.file_stem()?.to_string_lossy();
    if !naming::is_public(&stem) {
        return None;
    }
    if !naming::is_identifier(&stem) {
        warnings.push(Warning::new(path, "not an importable module name"));
        return None;
    }
    if path.with_extension("").join("__init__.py").is_file() {
        warnings.push(Warning::new(path, format!("shadowed by package '{stem}/'")));
        return None;
    }
    if let Err(failure) = probe(path) {
        warnings.push(Warning::new(path, failure.to_string()));
        return None;
    }

    let relative = path.strip_prefix(package_dir).ok()?.with_extension("");
    Some(ModuleRecord {
        dotted: dotted_path(package, &relative),
        path: path.to_path_buf(),
        is_package: false,
    })
}

fn probe(path: &Path) -> Result<(), ImportFailure> {
    let source = fs::read_to_string(path)?;
    python::logical_lines(&source)?;
    Ok(())
}

fn dotted_path(package: &str, relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .fold(package.to_string(), |acc, part| naming::join_dotted(&acc, &part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    fn dotted(discovery: &Discovery) -> Vec<&str> {
        discovery.modules.iter().map(|m| m.dotted.as_str()).collect()
    }

    fn package(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "sample/__init__.py", "");
        for (path, content) in files {
            write_file(tmp.path(), &format!("sample/{path}"), content);
        }
        tmp
    }

    fn run(tmp: &TempDir) -> Discovery {
        discover("sample", &tmp.path().join("sample")).unwrap()
    }

    // =========================================================================
    // discover
    // =========================================================================

    #[test]
    fn finds_public_modules_only() {
        let tmp = package(&[
            ("core.py", "def run():\n    'Run it.'\n"),
            ("_internal.py", "X = 1\n"),
        ]);
        let found = run(&tmp);
        assert_eq!(dotted(&found), vec!["sample.core"]);
        assert!(!found.modules[0].is_package);
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn empty_package_yields_nothing() {
        let tmp = package(&[]);
        let found = run(&tmp);
        assert!(found.modules.is_empty());
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn recurses_into_subpackages_in_lexicographic_order() {
        let tmp = package(&[
            ("zeta.py", ""),
            ("io/__init__.py", "'''IO.'''\n"),
            ("io/readers.py", ""),
            ("alpha.py", ""),
        ]);
        let found = run(&tmp);
        assert_eq!(
            dotted(&found),
            vec!["sample.alpha", "sample.io", "sample.io.readers", "sample.zeta"]
        );
        let io = &found.modules[1];
        assert!(io.is_package);
        assert!(io.path.ends_with("io/__init__.py"));
    }

    #[test]
    fn private_package_hides_its_subtree() {
        let tmp = package(&[
            ("_vendor/__init__.py", ""),
            ("_vendor/public_name.py", ""),
            ("api.py", ""),
        ]);
        assert_eq!(dotted(&run(&tmp)), vec!["sample.api"]);
    }

    #[test]
    fn directories_without_init_are_not_packages() {
        let tmp = package(&[("data/loader.py", ""), ("__pycache__/core.cpython-312.pyc", "")]);
        assert!(run(&tmp).modules.is_empty());
    }

    #[test]
    fn broken_module_is_skipped_with_warning() {
        let tmp = package(&[
            ("broken.py", "X = '''never closed\n"),
            ("good.py", "Y = 1\n"),
        ]);
        let found = run(&tmp);
        assert_eq!(dotted(&found), vec!["sample.good"]);
        assert_eq!(found.warnings.len(), 1);
        assert!(found.warnings[0].path.ends_with("broken.py"));
        assert!(found.warnings[0].reason.contains("unterminated"));
    }

    #[test]
    fn non_utf8_module_is_skipped_with_warning() {
        let tmp = package(&[("good.py", "")]);
        fs::write(tmp.path().join("sample/latin.py"), [0x58, 0x3d, 0xe9, 0x0a]).unwrap();
        let found = run(&tmp);
        assert_eq!(dotted(&found), vec!["sample.good"]);
        assert!(found.warnings[0].reason.contains("cannot be read"));
    }

    #[test]
    fn broken_package_init_prunes_subtree() {
        let tmp = package(&[
            ("plugins/__init__.py", "def f(:\n"),
            ("plugins/extra.py", ""),
            ("core.py", ""),
        ]);
        let found = run(&tmp);
        assert_eq!(dotted(&found), vec!["sample.core"]);
        assert_eq!(found.warnings.len(), 1);
        assert!(found.warnings[0].path.ends_with("plugins/__init__.py"));
    }

    #[test]
    fn non_identifier_names_are_skipped_with_warning() {
        let tmp = package(&[("my-module.py", ""), ("bad-pkg/__init__.py", ""), ("ok.py", "")]);
        let found = run(&tmp);
        assert_eq!(dotted(&found), vec!["sample.ok"]);
        assert_eq!(found.warnings.len(), 2);
    }

    #[test]
    fn package_shadows_module_of_same_name() {
        let tmp = package(&[("core.py", ""), ("core/__init__.py", "")]);
        let found = run(&tmp);
        assert_eq!(dotted(&found), vec!["sample.core"]);
        assert!(found.modules[0].is_package);
        assert!(found.warnings[0].reason.contains("shadowed"));
    }

    #[test]
    fn extension_modules_are_reported() {
        let tmp = package(&[("_speedups.cpython-312-x86_64-linux-gnu.so", ""), ("fast.pyd", "")]);
        let found = run(&tmp);
        assert!(found.modules.is_empty());
        assert_eq!(found.warnings.len(), 1);
        assert!(found.warnings[0].path.ends_with("fast.pyd"));
    }

    #[test]
    fn other_files_are_ignored() {
        let tmp = package(&[("py.typed", ""), ("schema.json", "{}"), ("stub.pyi", "")]);
        let found = run(&tmp);
        assert!(found.modules.is_empty());
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn missing_init_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sample")).unwrap();
        assert!(matches!(
            discover("sample", &tmp.path().join("sample")),
            Err(DiscoverError::NotAPackage(_))
        ));
    }

    // =========================================================================
    // locate_package
    // =========================================================================

    #[test]
    fn locates_src_layout_first() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/sample/__init__.py", "");
        write_file(tmp.path(), "sample/__init__.py", "");
        let dir = locate_package(tmp.path(), "src", "sample").unwrap();
        assert_eq!(dir, tmp.path().join("src/sample"));
    }

    #[test]
    fn falls_back_to_flat_layout() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "sample/__init__.py", "");
        let dir = locate_package(tmp.path(), "src", "sample").unwrap();
        assert_eq!(dir, tmp.path().join("sample"));
    }

    #[test]
    fn dotted_package_names_map_to_nested_dirs() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/acme/tools/__init__.py", "");
        let dir = locate_package(tmp.path(), "src", "acme.tools").unwrap();
        assert_eq!(dir, tmp.path().join("src/acme/tools"));
    }

    #[test]
    fn missing_package_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = locate_package(tmp.path(), "src", "sample").unwrap_err();
        assert!(matches!(err, DiscoverError::PackageNotFound { .. }));
        assert!(err.to_string().contains("src"));
    }

    #[test]
    fn directory_without_init_is_not_a_package() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/sample")).unwrap();
        assert!(matches!(
            locate_package(tmp.path(), "src", "sample"),
            Err(DiscoverError::NotAPackage(_))
        ));
    }

    #[test]
    fn invalid_package_name_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            locate_package(tmp.path(), "src", "my-package"),
            Err(DiscoverError::InvalidPackageName(_))
        ));
    }
}
