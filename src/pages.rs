//! API page rendering.
//!
//! Turns introspected [`DocEntry`] values into Markdown pages by filling the
//! project's page template, and renders the index table that goes into the
//! hand-authored API reference page.
//!
//! ## Page Template
//!
//! The template is a plain text file with four placeholders:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{package_name}` | root package import name |
//! | `{module_name}` | dotted module path |
//! | `{module_doc}` | module docstring rendered from Markdown to HTML |
//! | `{members_tables}` | HTML table of public members |
//!
//! Substitution is a single left-to-right pass: values inserted for one
//! placeholder are never rescanned, so a docstring that mentions
//! `{module_name}` is published literally. Braces that do not name a
//! placeholder (CSS, Jinja, prose) pass through untouched.
//!
//! ## Tables
//!
//! Tables are built with Maud, so member names and summaries are escaped.
//! Each member row carries `id="<name>"` so pages can link to
//! `sample.core.md#run`.

use crate::marker::{Marker, MarkerError};
use crate::naming;
use crate::python;
use crate::types::{DocEntry, MemberKind, MemberRecord};
use maud::{Markup, html};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("page template is missing placeholder {{{0}}}")]
    MissingPlaceholder(&'static str),
    #[error("modules {first} and {second} both map to page {file}")]
    Collision {
        first: String,
        second: String,
        file: String,
    },
    #[error("index page: {0}")]
    Marker(#[from] MarkerError),
}

/// Placeholders every page template must contain.
pub const PLACEHOLDERS: [&str; 4] = ["package_name", "module_name", "module_doc", "members_tables"];

/// A parsed page template.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    /// Accept `source` if it names every placeholder in [`PLACEHOLDERS`].
    pub fn parse(source: impl Into<String>) -> Result<Self, PageError> {
        let source = source.into();
        if let Some(&missing) = PLACEHOLDERS
            .iter()
            .find(|name| !source.contains(&format!("{{{name}}}")))
        {
            return Err(PageError::MissingPlaceholder(missing));
        }
        Ok(Self { source })
    }

    /// Substitute `values` in a single pass.
    pub fn fill(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let key = &after[..close];
                values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (close, *value))
            });
            match value {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// A rendered API page, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPage {
    pub module: String,
    /// Filename inside the API output directory.
    pub file_name: String,
    pub content: String,
}

/// One row of the index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTableRow {
    pub module: String,
    pub link: String,
    pub description: String,
}

/// Render one page per entry.
///
/// Fails if two modules would share a page file. Filenames are compared
/// case-insensitively since docs are often built on case-insensitive
/// filesystems.
pub fn render_pages(
    template: &PageTemplate,
    package: &str,
    entries: &[DocEntry],
) -> Result<Vec<ApiPage>, PageError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut pages = Vec::with_capacity(entries.len());
    for entry in entries {
        let page = render_page(template, package, entry);
        if let Some(first) = seen.insert(page.file_name.to_lowercase(), &entry.module) {
            return Err(PageError::Collision {
                first: first.to_string(),
                second: entry.module.clone(),
                file: page.file_name,
            });
        }
        pages.push(page);
    }
    Ok(pages)
}

pub fn render_page(template: &PageTemplate, package: &str, entry: &DocEntry) -> ApiPage {
    let module_doc = module_doc_html(&entry.docstring);
    let members = members_table(&entry.members).into_string();
    let content = template.fill(&[
        ("package_name", package),
        ("module_name", &entry.module),
        ("module_doc", &module_doc),
        ("members_tables", &members),
    ]);
    ApiPage {
        module: entry.module.clone(),
        file_name: naming::page_file_name(&entry.module),
        content,
    }
}

/// Render a module docstring as HTML. Docstrings are treated as Markdown.
pub fn module_doc_html(docstring: &str) -> String {
    if docstring.trim().is_empty() {
        return String::new();
    }
    let parser = pulldown_cmark::Parser::new(docstring);
    let mut out = String::new();
    pulldown_cmark::html::push_html(&mut out, parser);
    out
}

pub fn members_table(members: &[MemberRecord]) -> Markup {
    html! {
        table.api-members {
            thead {
                tr {
                    th { "Name" }
                    th { "Kind" }
                    th { "Summary" }
                }
            }
            tbody {
                @if members.is_empty() {
                    tr.api-no-members {
                        td colspan="3" { "No public members." }
                    }
                }
                @for member in members {
                    tr id=(member.name) {
                        td { code { (member.name) } }
                        td { (kind_badge(member.kind)) }
                        td { (member.summary) }
                    }
                }
            }
        }
    }
}

fn kind_badge(kind: MemberKind) -> Markup {
    html! {
        span class=(format!("api-badge api-badge-{}", kind.as_str())) { (kind.as_str()) }
    }
}

/// Index rows in entry order. `link_base` is prefixed to each page filename.
pub fn table_rows(entries: &[DocEntry], link_base: &str) -> Vec<ApiTableRow> {
    entries
        .iter()
        .map(|entry| ApiTableRow {
            module: entry.module.clone(),
            link: format!("{link_base}{}", naming::page_file_name(&entry.module)),
            description: python::summary_line(&entry.docstring),
        })
        .collect()
}

/// The index table. With no rows it still renders a header and empty body.
pub fn index_table(rows: &[ApiTableRow]) -> Markup {
    html! {
        table.api-index {
            thead {
                tr {
                    th { "Module" }
                    th { "Description" }
                }
            }
            tbody {
                @for row in rows {
                    tr {
                        td { a href=(row.link) { code { (row.module) } } }
                        td { (row.description) }
                    }
                }
            }
        }
    }
}

/// Rewrite the index page's marker region with the table for `rows`.
pub fn render_index(content: &str, marker: &Marker, rows: &[ApiTableRow]) -> Result<String, PageError> {
    Ok(marker.replace(content, &index_table(rows).into_string())?)
}

/// Relative link prefix from the page at `from_page` to files in `to_dir`.
///
/// Always uses `/` separators and ends with `/` unless both live in the same
/// directory, in which case it is empty.
pub fn relative_link_base(from_page: &Path, to_dir: &Path) -> String {
    let from_dir = from_page.parent().unwrap_or(Path::new(""));
    let relative = pathdiff::diff_paths(to_dir, from_dir).unwrap_or_else(|| to_dir.to_path_buf());
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("{}/", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "# {module_name}\n\nPart of `{package_name}`.\n\n{module_doc}\n\n{members_tables}\n";

    fn entry(module: &str, docstring: &str, members: Vec<MemberRecord>) -> DocEntry {
        DocEntry {
            module: module.into(),
            docstring: docstring.into(),
            members,
        }
    }

    fn member(name: &str, kind: MemberKind, summary: &str) -> MemberRecord {
        MemberRecord {
            name: name.into(),
            kind,
            summary: summary.into(),
        }
    }

    fn template() -> PageTemplate {
        PageTemplate::parse(TEMPLATE).unwrap()
    }

    // =========================================================================
    // Template
    // =========================================================================

    #[test]
    fn template_requires_every_placeholder() {
        let err = PageTemplate::parse("# {module_name}\n{module_doc}\n{members_tables}\n").unwrap_err();
        assert!(matches!(err, PageError::MissingPlaceholder("package_name")));
        assert_eq!(err.to_string(), "page template is missing placeholder {package_name}");
    }

    #[test]
    fn fill_substitutes_all_occurrences() {
        let t = PageTemplate::parse("{module_name} {module_name} {package_name}{module_doc}{members_tables}").unwrap();
        let out = t.fill(&[
            ("module_name", "a.b"),
            ("package_name", "a"),
            ("module_doc", ""),
            ("members_tables", ""),
        ]);
        assert_eq!(out, "a.b a.b a");
    }

    #[test]
    fn fill_leaves_foreign_braces_alone() {
        let t = PageTemplate::parse(
            "<style>.x { color: red }</style>{{ jinja }} {module_name}{package_name}{module_doc}{members_tables}",
        )
        .unwrap();
        let out = t.fill(&[
            ("module_name", "m"),
            ("package_name", "p"),
            ("module_doc", "d"),
            ("members_tables", "t"),
        ]);
        assert_eq!(out, "<style>.x { color: red }</style>{{ jinja }} mpdt");
    }

    #[test]
    fn fill_does_not_rescan_inserted_values() {
        let out = template().fill(&[
            ("module_name", "m"),
            ("package_name", "p"),
            ("module_doc", "see {module_name}"),
            ("members_tables", ""),
        ]);
        assert!(out.contains("see {module_name}"));
    }

    // =========================================================================
    // Pages
    // =========================================================================

    #[test]
    fn page_for_sample_core() {
        let e = entry(
            "sample.core",
            "Core helpers.",
            vec![member("run", MemberKind::Function, "Run it.")],
        );
        let page = render_page(&template(), "sample", &e);
        assert_eq!(page.file_name, "sample.core.md");
        assert!(page.content.starts_with("# sample.core\n\nPart of `sample`."));
        assert!(page.content.contains("<p>Core helpers.</p>"));
        assert!(page.content.contains(
            r#"<tr id="run"><td><code>run</code></td><td><span class="api-badge api-badge-function">function</span></td><td>Run it.</td></tr>"#
        ));
    }

    #[test]
    fn members_keep_declaration_order() {
        let html = members_table(&[
            member("zeta", MemberKind::Class, ""),
            member("alpha", MemberKind::Constant, ""),
        ])
        .into_string();
        let z = html.find("zeta").unwrap();
        let a = html.find("alpha").unwrap();
        assert!(z < a);
        assert!(html.contains("api-badge-class"));
        assert!(html.contains("api-badge-constant"));
    }

    #[test]
    fn module_without_members_gets_placeholder_row() {
        let html = members_table(&[]).into_string();
        assert!(html.contains("No public members."));
        assert!(html.contains(r#"colspan="3""#));
    }

    #[test]
    fn member_text_is_escaped() {
        let html = members_table(&[member("cmp", MemberKind::Function, "Return a < b & c.")]).into_string();
        assert!(html.contains("Return a &lt; b &amp; c."));
    }

    #[test]
    fn empty_docstring_renders_nothing() {
        assert_eq!(module_doc_html(""), "");
        assert_eq!(module_doc_html("  \n"), "");
    }

    #[test]
    fn docstring_markdown_is_rendered() {
        let html = module_doc_html("Tools.\n\nUse `run()` to start:\n\n- fast\n- safe");
        assert!(html.contains("<p>Tools.</p>"));
        assert!(html.contains("<code>run()</code>"));
        assert!(html.contains("<li>fast</li>"));
    }

    #[test]
    fn case_insensitive_collision_is_error() {
        let entries = vec![entry("sample.Core", "", vec![]), entry("sample.core", "", vec![])];
        let err = render_pages(&template(), "sample", &entries).unwrap_err();
        match err {
            PageError::Collision { first, second, .. } => {
                assert_eq!(first, "sample.Core");
                assert_eq!(second, "sample.core");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn one_page_per_entry() {
        let entries = vec![entry("sample.a", "", vec![]), entry("sample.b", "", vec![])];
        let pages = render_pages(&template(), "sample", &entries).unwrap();
        let names: Vec<_> = pages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["sample.a.md", "sample.b.md"]);
    }

    // =========================================================================
    // Index
    // =========================================================================

    #[test]
    fn rows_use_first_docstring_line() {
        let entries = vec![entry("sample.core", "Core helpers.\n\nMore text.", vec![])];
        let rows = table_rows(&entries, "api/");
        assert_eq!(
            rows,
            vec![ApiTableRow {
                module: "sample.core".into(),
                link: "api/sample.core.md".into(),
                description: "Core helpers.".into(),
            }]
        );
    }

    #[test]
    fn index_table_links_modules() {
        let rows = table_rows(&[entry("sample.core", "Core.", vec![])], "api/");
        let html = index_table(&rows).into_string();
        assert!(html.contains(r#"<a href="api/sample.core.md"><code>sample.core</code></a>"#));
        assert!(html.contains("<td>Core.</td>"));
    }

    #[test]
    fn empty_index_table_is_valid() {
        let html = index_table(&[]).into_string();
        assert!(html.contains("<thead>"));
        assert!(html.contains("<tbody></tbody>"));
    }

    #[test]
    fn render_index_fills_marker() {
        let marker = Marker::new("API_TABLE");
        let rows = table_rows(&[entry("sample.core", "", vec![])], "api/");
        let out = render_index("# API\n\n<!-- API_TABLE -->\n", &marker, &rows).unwrap();
        assert!(out.starts_with("# API\n\n<!-- API_TABLE -->\n<table class=\"api-index\">"));
        assert!(out.ends_with("</table>\n<!-- /API_TABLE -->\n"));
    }

    #[test]
    fn render_index_without_marker_is_error() {
        let marker = Marker::new("API_TABLE");
        let err = render_index("# API\n", &marker, &[]).unwrap_err();
        assert!(matches!(err, PageError::Marker(MarkerError::Missing(_))));
    }

    #[test]
    fn link_base_between_directories() {
        assert_eq!(
            relative_link_base(Path::new("/p/docs/pages/api-reference.md"), Path::new("/p/docs/pages/api")),
            "api/"
        );
        assert_eq!(
            relative_link_base(Path::new("/p/docs/index.md"), Path::new("/p/docs/pages/api")),
            "pages/api/"
        );
        assert_eq!(
            relative_link_base(Path::new("/p/docs/other/ref.md"), Path::new("/p/docs/api")),
            "../api/"
        );
        assert_eq!(relative_link_base(Path::new("/p/docs/ref.md"), Path::new("/p/docs")), "");
    }
}
