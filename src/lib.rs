//! # apidoc-hook
//!
//! A documentation pre-build hook for Python projects. Run it before every
//! docs build: it writes one API reference page per public submodule, fills
//! the module index table in a hand-written reference page and, for projects
//! with examples, renders a gallery of example scripts.
//!
//! # Architecture: One Pass, Four Stages
//!
//! ```text
//! 1. Discover    src/sample/            →  ModuleRecord*   (public, importable modules)
//! 2. Introspect  ModuleRecord           →  DocEntry        (docstring + public members)
//! 3. Pages       DocEntry*              →  api/*.md + index table
//! 4. Gallery     examples/*.py          →  card grid       (only when enabled)
//! ```
//!
//! Each stage is a function of the previous stage's output. Nothing persists
//! between builds except the written files, which are regenerated in full;
//! pages for deleted modules are pruned. Running the hook twice in a row
//! leaves the tree exactly as the first run left it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Stage 1: walks the package tree, skips private and unparsable modules with warnings |
//! | [`introspect`] | Stage 2: reads module docstrings and public top-level members from source |
//! | [`pages`] | Stage 3: fills the page template, renders member and index tables with Maud |
//! | [`gallery`] | Stage 4: reads `__gallery__` metadata from examples, renders the card grid |
//! | [`prebuild`] | Orchestration: plan everything in memory, then write and prune |
//! | [`marker`] | `<!-- NAME -->` region replacement in hand-written pages |
//! | [`python`] | Lexical reader for Python source: logical lines, tokens, literals, docstrings |
//! | [`config`] | `apidoc-hook.toml` loading, merging with stock defaults, validation |
//! | [`types`] | Records passed between stages |
//! | [`naming`] | Identifier, privacy and page-filename rules |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//!
//! # Design Decisions
//!
//! ## Read Source, Never Import
//!
//! The hook does not run Python. Importing a package to reflect on it runs
//! its top-level code, needs its dependencies installed in the docs
//! environment, and makes the build depend on the interpreter. Instead the
//! [`python`] module reads just enough syntax to answer the questions the
//! pages need: what is the module docstring, which names does the module
//! bind at top level, is each one a function, class or constant, and what is
//! the first line of its docstring. A module that cannot be read this way is
//! treated as an import failure: skipped with a warning, never fatal.
//!
//! ## Marker Regions Over Whole-File Generation
//!
//! The index table and the gallery live inside hand-written pages. The hook
//! owns only the region between `<!-- NAME -->` and `<!-- /NAME -->`;
//! everything else in the page belongs to the author and is preserved byte
//! for byte. A missing or duplicated marker fails the build, since guessing
//! where the table goes would publish a broken page.
//!
//! ## Plan, Then Write
//!
//! [`prebuild::plan`] renders every output in memory before
//! [`prebuild::apply`] touches the disk, so structural errors never leave a
//! half-updated docs tree. Files are rewritten only when their content
//! changes, which keeps live-reload servers from looping on their own output.
//!
//! ## Maud For Generated HTML
//!
//! Member tables, the index table and gallery cards are built with
//! [Maud](https://maud.lambda.xyz/). Docstring text and member names are
//! escaped automatically; only the module docstring, rendered from Markdown
//! with `pulldown-cmark`, is inserted as HTML.

pub mod config;
pub mod discover;
pub mod gallery;
pub mod introspect;
pub mod logging;
pub mod marker;
pub mod naming;
pub mod output;
pub mod pages;
pub mod prebuild;
pub mod python;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
