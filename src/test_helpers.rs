//! Shared test utilities for the apidoc-hook test suite.
//!
//! Provides fixture setup, a file writer for ad-hoc project trees, and lookup
//! helpers over introspection results.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! write_file(tmp.path(), "src/sample/extra.py", "def f(): pass\n");
//!
//! let inspection = inspect(tmp.path(), &config).unwrap();
//! let core = find_entry(&inspection.entries, "sample.core");
//! assert_eq!(member_names(core), vec!["run"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::{DocEntry, MemberRecord};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a doc entry by dotted module path. Panics if not found.
pub fn find_entry<'a>(entries: &'a [DocEntry], module: &str) -> &'a DocEntry {
    entries.iter().find(|e| e.module == module).unwrap_or_else(|| {
        let modules: Vec<&str> = entries.iter().map(|e| e.module.as_str()).collect();
        panic!("module '{module}' not found. Available: {modules:?}")
    })
}

/// Find a member by name. Panics if not found.
pub fn find_member<'a>(entry: &'a DocEntry, name: &str) -> &'a MemberRecord {
    entry.members.iter().find(|m| m.name == name).unwrap_or_else(|| {
        let names = member_names(entry);
        panic!("member '{name}' not found in '{}'. Available: {names:?}", entry.module)
    })
}

/// Member names in declaration order.
pub fn member_names(entry: &DocEntry) -> Vec<&str> {
    entry.members.iter().map(|m| m.name.as_str()).collect()
}
