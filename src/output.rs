//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with what was documented (module paths, card counts) and
//! shows filesystem paths as the secondary part of each line. Per-item
//! problems are grouped in a trailing `Warnings` section so a clean build is
//! visibly clean.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! API reference (sample)
//! 001 sample.core → docs/pages/api/sample.core.md
//! 002 sample.io → docs/pages/api/sample.io.md
//!
//! Marker regions
//!     docs/pages/api-reference.md
//!     docs/pages/examples.md
//!
//! Gallery: 3 cards
//!
//! Pruned
//!     docs/pages/api/sample.old.md
//!
//! Warnings
//!     src/sample/plugins.py: cannot be parsed: line 3: bracket is never closed
//!
//! Generated 2 pages, updated 4 files, pruned 1
//! ```
//!
//! ## Check
//!
//! ```text
//! API reference (sample)
//! 001 sample.core → sample.core.md
//!
//! Gallery: skipped (fast build)
//!
//! Check passed: 1 page, 2 marker regions
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::prebuild::{BuildReport, GalleryOutcome, Inspection, Plan};
use crate::types::Warning;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// ```text
/// 001 sample.core → docs/pages/api/sample.core.md
/// ```
fn page_line(index: usize, module: &str, target: &Path) -> String {
    format!("{} {} → {}", format_index(index), module, target.display())
}

fn gallery_line(outcome: GalleryOutcome) -> String {
    match outcome {
        GalleryOutcome::Disabled => "Gallery: disabled".to_string(),
        GalleryOutcome::Skipped => "Gallery: skipped (fast build)".to_string(),
        GalleryOutcome::Rendered(n) => format!("Gallery: {}", plural(n, "card")),
    }
}

/// A titled section of indented lines, preceded by a blank line.
/// Empty sections are omitted entirely.
fn push_section<I>(lines: &mut Vec<String>, title: &str, items: I)
where
    I: IntoIterator<Item = String>,
{
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(title.to_string());
    lines.extend(items.into_iter().map(|item| format!("{}{}", indent(1), item)));
}

fn warning_lines(warnings: &[Warning]) -> impl Iterator<Item = String> + '_ {
    warnings.iter().map(|w| w.to_string())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of a build.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!("API reference ({})", report.package)];
    for (i, path) in report.pages.iter().enumerate() {
        let module = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        lines.push(page_line(i + 1, &module, path));
    }

    push_section(
        &mut lines,
        "Marker regions",
        report.hosts.iter().map(|p| p.display().to_string()),
    );

    lines.push(String::new());
    lines.push(gallery_line(report.gallery));

    push_section(
        &mut lines,
        "Pruned",
        report.pruned.iter().map(|p| p.display().to_string()),
    );
    push_section(&mut lines, "Warnings", warning_lines(&report.warnings));

    lines.push(String::new());
    let mut summary = format!(
        "Generated {}, updated {}",
        plural(report.pages.len(), "page"),
        plural(report.updated.len(), "file")
    );
    if !report.pruned.is_empty() {
        summary.push_str(&format!(", pruned {}", report.pruned.len()));
    }
    lines.push(summary);
    lines
}

pub fn print_build_report(report: &BuildReport) {
    print_lines(&format_build_report(report));
}

// ============================================================================
// Check
// ============================================================================

/// Format a build plan that was validated but not written.
pub fn format_check(plan: &Plan) -> Vec<String> {
    let mut lines = vec![format!("API reference ({})", plan.package)];
    for (i, page) in plan.pages.iter().enumerate() {
        lines.push(page_line(i + 1, &page.module, Path::new(&page.file_name)));
    }

    lines.push(String::new());
    lines.push(gallery_line(plan.gallery));

    push_section(&mut lines, "Warnings", warning_lines(&plan.warnings));

    lines.push(String::new());
    lines.push(format!(
        "Check passed: {}, {}",
        plural(plan.pages.len(), "page"),
        plural(plan.regions, "marker region")
    ));
    lines
}

pub fn print_check(plan: &Plan) {
    print_lines(&format_check(plan));
}

// ============================================================================
// Inspect
// ============================================================================

/// Pretty JSON for the `inspect` command.
pub fn format_inspection(inspection: &Inspection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(inspection)
}

pub fn print_inspection(inspection: &Inspection) -> Result<(), serde_json::Error> {
    println!("{}", format_inspection(inspection)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocEntry, MemberKind, MemberRecord};
    use std::path::PathBuf;

    fn report() -> BuildReport {
        BuildReport {
            package: "sample".into(),
            pages: vec![
                PathBuf::from("docs/pages/api/sample.core.md"),
                PathBuf::from("docs/pages/api/sample.io.md"),
            ],
            hosts: vec![
                PathBuf::from("docs/pages/api-reference.md"),
                PathBuf::from("docs/pages/examples.md"),
            ],
            updated: vec![PathBuf::from("docs/pages/api/sample.io.md")],
            pruned: vec![],
            gallery: GalleryOutcome::Rendered(3),
            warnings: vec![],
        }
    }

    #[test]
    fn format_index_is_zero_padded() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(0, "page"), "0 pages");
        assert_eq!(plural(1, "page"), "1 page");
        assert_eq!(plural(2, "card"), "2 cards");
    }

    #[test]
    fn gallery_lines() {
        assert_eq!(gallery_line(GalleryOutcome::Disabled), "Gallery: disabled");
        assert_eq!(gallery_line(GalleryOutcome::Skipped), "Gallery: skipped (fast build)");
        assert_eq!(gallery_line(GalleryOutcome::Rendered(1)), "Gallery: 1 card");
    }

    #[test]
    fn build_report_lists_pages_with_modules() {
        let lines = format_build_report(&report());
        assert_eq!(lines[0], "API reference (sample)");
        assert_eq!(lines[1], "001 sample.core → docs/pages/api/sample.core.md");
        assert_eq!(lines[2], "002 sample.io → docs/pages/api/sample.io.md");
        assert!(lines.contains(&"Marker regions".to_string()));
        assert!(lines.contains(&"    docs/pages/examples.md".to_string()));
        assert!(lines.contains(&"Gallery: 3 cards".to_string()));
        assert_eq!(lines.last().unwrap(), "Generated 2 pages, updated 1 file");
    }

    #[test]
    fn clean_build_has_no_warning_or_pruned_sections() {
        let lines = format_build_report(&report());
        assert!(!lines.contains(&"Warnings".to_string()));
        assert!(!lines.contains(&"Pruned".to_string()));
    }

    #[test]
    fn build_report_shows_pruned_and_warnings() {
        let mut r = report();
        r.pruned = vec![PathBuf::from("docs/pages/api/sample.old.md")];
        r.warnings = vec![Warning::new("src/sample/bad.py", "cannot be parsed")];
        let lines = format_build_report(&r);

        let pruned = lines.iter().position(|l| l == "Pruned").unwrap();
        assert_eq!(lines[pruned + 1], "    docs/pages/api/sample.old.md");
        let warnings = lines.iter().position(|l| l == "Warnings").unwrap();
        assert_eq!(lines[warnings + 1], "    src/sample/bad.py: cannot be parsed");
        assert!(lines.last().unwrap().ends_with(", pruned 1"));
    }

    #[test]
    fn build_report_for_empty_package() {
        let mut r = report();
        r.pages.clear();
        r.gallery = GalleryOutcome::Disabled;
        let lines = format_build_report(&r);
        assert_eq!(lines[1], "");
        assert!(lines.contains(&"Gallery: disabled".to_string()));
        assert!(lines.last().unwrap().starts_with("Generated 0 pages"));
    }

    #[test]
    fn check_counts_regions_not_host_pages() {
        let tmp = crate::test_helpers::setup_fixtures();
        let mut config = crate::config::load_config(tmp.path()).unwrap();
        config.gallery.page = config.api.index_page.clone();
        crate::test_helpers::write_file(
            tmp.path(),
            "docs/pages/api-reference.md",
            "<!-- API_TABLE -->\n\n<!-- GALLERY -->\n",
        );

        let plan = crate::prebuild::plan(tmp.path(), &config, &Default::default()).unwrap();
        let lines = format_check(&plan);
        assert_eq!(lines.last().unwrap(), "Check passed: 1 page, 2 marker regions");
    }

    #[test]
    fn inspection_is_json() {
        let inspection = Inspection {
            package: "sample".into(),
            entries: vec![DocEntry {
                module: "sample.core".into(),
                docstring: String::new(),
                members: vec![MemberRecord {
                    name: "run".into(),
                    kind: MemberKind::Function,
                    summary: "Run it.".into(),
                }],
            }],
            warnings: vec![],
        };
        let json: serde_json::Value = serde_json::from_str(&format_inspection(&inspection).unwrap()).unwrap();
        assert_eq!(json["package"], "sample");
        assert_eq!(json["entries"][0]["members"][0]["kind"], "function");
        assert_eq!(json["entries"][0]["members"][0]["summary"], "Run it.");
    }
}
