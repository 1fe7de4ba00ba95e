//! Python naming rules and the module → page filename convention.
//!
//! Every stage needs the same answers to "is this name importable?" and "is it
//! public?", so they live here instead of being re-derived per module.
//!
//! ## Page Filenames
//!
//! Generated pages are named after the full dotted path, so the mapping is
//! injective by construction:
//! - `sample.core` → `sample.core.md`
//! - `sample.io.readers` → `sample.io.readers.md`

/// Whether `name` can appear in an import statement.
///
/// Follows Python's identifier rule closely enough for filesystem names: a
/// letter or underscore, then letters, digits or underscores. Non-ASCII
/// letters are accepted, as Python does.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Public names are the ones not starting with an underscore.
pub fn is_public(name: &str) -> bool {
    !name.starts_with('_')
}

/// Join a parent dotted path and a child name.
pub fn join_dotted(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

/// Filename of the generated page for a dotted module path.
pub fn page_file_name(dotted: &str) -> String {
    format!("{dotted}.md")
}

/// Normalize a distribution name (`my-package`) into an import name (`my_package`).
pub fn import_name_from_distribution(name: &str) -> String {
    name.trim().replace(['-', '.'], "_").to_lowercase()
}
