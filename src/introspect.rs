//! Module introspection.
//!
//! Turns one [`ModuleRecord`] into exactly one [`DocEntry`]: the module
//! docstring plus the public names the module itself defines.
//!
//! ## What Counts as a Member
//!
//! The reader replays the module's top-level statements the way the module
//! `__dict__` would be filled:
//!
//! | Statement | Binding |
//! |-----------|---------|
//! | `def f` / `async def f` | function |
//! | `class C` | class |
//! | `X = ...`, `X: T = ...`, `a, b = ...`, `X += ...` | constant |
//! | `f = lambda ...` | function |
//! | `P = namedtuple(...)` and similar class factories | class |
//! | `type Alias = ...` | constant |
//! | `alias = local_name` | same kind and summary as `local_name` |
//! | `import m`, `from m import x`, `alias = imported_name` | foreign (never documented) |
//! | `del X` | removes `X` (`del X[k]` and `del X.attr` keep it) |
//!
//! Rebinding keeps the first position (dict insertion order) and takes the
//! last binding, so a name defined locally and then re-imported is dropped,
//! and a name imported and then redefined locally is kept.
//!
//! Bodies of module-level `if`/`try`/`with`/`for` blocks bind at module
//! scope and are read with the same rules. Bodies of `def` and `class` are not.
//!
//! ## Summaries
//!
//! Functions and classes use the first line of their own docstring. Constants
//! use an attribute docstring: a string literal statement directly below the
//! assignment. Missing docstrings give an empty summary, never a placeholder.

use crate::naming;
use crate::python::{self, LogicalLine, SyntaxError, Tok};
use crate::types::{DocEntry, MemberKind, MemberRecord, ModuleRecord};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },
}

/// Read and introspect a discovered module.
pub fn introspect(record: &ModuleRecord) -> Result<DocEntry, IntrospectError> {
    let source = fs::read_to_string(&record.path).map_err(|source| IntrospectError::Io {
        path: record.path.clone(),
        source,
    })?;
    let entry =
        introspect_source(&record.dotted, &source).map_err(|source| IntrospectError::Syntax {
            path: record.path.clone(),
            source,
        })?;
    tracing::debug!(
        module = %entry.module,
        members = entry.members.len(),
        "introspected module"
    );
    Ok(entry)
}

/// Introspect module source text.
pub fn introspect_source(module: &str, source: &str) -> Result<DocEntry, SyntaxError> {
    let lines = python::logical_lines(source)?;
    Ok(DocEntry {
        module: module.to_string(),
        docstring: module_docstring(&lines),
        members: module_members(&lines),
    })
}

fn module_docstring(lines: &[LogicalLine<'_>]) -> String {
    lines
        .first()
        .filter(|l| l.indent == 0)
        .and_then(|l| python::string_expr(&l.tokens()))
        .map(|doc| python::cleandoc(&doc))
        .unwrap_or_default()
}

// ============================================================================
// Module scope
// ============================================================================

#[derive(Debug, Clone)]
enum Binding {
    Local { kind: MemberKind, summary: String },
    Foreign,
}

/// Module namespace in insertion order.
#[derive(Default)]
struct Scope {
    order: Vec<String>,
    bindings: HashMap<String, Binding>,
}

impl Scope {
    fn bind(&mut self, name: &str, binding: Binding) {
        if !self.bindings.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.bindings.insert(name.to_string(), binding);
    }

    fn unbind(&mut self, name: &str) {
        if self.bindings.remove(name).is_some() {
            self.order.retain(|n| n != name);
        }
    }

    fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    fn into_members(mut self) -> Vec<MemberRecord> {
        self.order
            .iter()
            .filter(|name| naming::is_public(name))
            .filter_map(|name| match self.bindings.remove(name) {
                Some(Binding::Local { kind, summary }) => Some(MemberRecord {
                    name: name.clone(),
                    kind,
                    summary,
                }),
                _ => None,
            })
            .collect()
    }
}

const CLASS_FACTORIES: &[&str] = &[
    "namedtuple",
    "NamedTuple",
    "TypedDict",
    "Enum",
    "IntEnum",
    "StrEnum",
    "Flag",
    "IntFlag",
    "make_dataclass",
];

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Compound statements whose bodies still bind at module scope.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "try", "except", "finally", "with", "for", "while", "match", "case",
];

fn module_members(lines: &[LogicalLine<'_>]) -> Vec<MemberRecord> {
    let mut scope = Scope::default();
    // Body indents of the module-level blocks being visited; 0 is the module.
    let mut levels = vec![0usize];

    for (idx, line) in lines.iter().enumerate() {
        while levels.len() > 1 && levels.last().is_some_and(|&level| line.indent < level) {
            levels.pop();
        }
        if levels.last() != Some(&line.indent) {
            // Inside a def or class body.
            continue;
        }
        let toks = line.tokens();
        match block_header(&toks) {
            Some([]) => {
                if let Some(next) = lines.get(idx + 1)
                    && next.indent > line.indent
                {
                    levels.push(next.indent);
                }
            }
            Some(inline) => bind_statement(&mut scope, lines, idx, inline),
            None => bind_statement(&mut scope, lines, idx, &toks),
        }
    }

    scope.into_members()
}

/// Apply one simple or `def`/`class` statement to the module namespace.
fn bind_statement(scope: &mut Scope, lines: &[LogicalLine<'_>], idx: usize, toks: &[Tok<'_>]) {
    match toks {
        [Tok::Name("def"), Tok::Name(name), ..]
        | [Tok::Name("async"), Tok::Name("def"), Tok::Name(name), ..] => {
            let summary = body_summary(lines, idx, toks);
            scope.bind(name, Binding::Local { kind: MemberKind::Function, summary });
        }
        [Tok::Name("class"), Tok::Name(name), ..] => {
            let summary = body_summary(lines, idx, toks);
            scope.bind(name, Binding::Local { kind: MemberKind::Class, summary });
        }
        [Tok::Name("import"), rest @ ..] => {
            for name in imported_names(rest) {
                scope.bind(name, Binding::Foreign);
            }
        }
        [Tok::Name("from"), rest @ ..] => {
            let names = rest
                .iter()
                .position(|t| t.is_name("import"))
                .map(|pos| imported_names(&rest[pos + 1..]))
                .unwrap_or_default();
            for name in names {
                scope.bind(name, Binding::Foreign);
            }
        }
        [Tok::Name("del"), rest @ ..] => {
            for name in deleted_names(rest) {
                scope.unbind(name);
            }
        }
        [Tok::Name("type"), Tok::Name(name), ..] if toks.iter().any(|t| t.is_op("=")) => {
            let summary = attribute_summary(lines, idx);
            scope.bind(name, Binding::Local { kind: MemberKind::Constant, summary });
        }
        _ => {
            if let Some((targets, value)) = assignment(toks) {
                let binding = value_binding(value, scope, || attribute_summary(lines, idx));
                for target in targets {
                    scope.bind(target, binding.clone());
                }
            }
        }
    }
}

/// For `if ...:`, `try:`, `with ...:` and the other block headers, the
/// statement written after the colon (empty when the body is indented below).
fn block_header<'t, 'a>(toks: &'t [Tok<'a>]) -> Option<&'t [Tok<'a>]> {
    let keyword = match toks {
        [Tok::Name("async"), Tok::Name(keyword), ..] | [Tok::Name(keyword), ..] => *keyword,
        _ => return None,
    };
    if !BLOCK_KEYWORDS.contains(&keyword) {
        return None;
    }
    let colon = top_level_position(toks, ":")?;
    // `match` and `case` are soft keywords: `match: int = 1` is an assignment.
    if matches!(keyword, "match" | "case") && colon + 1 != toks.len() {
        return None;
    }
    Some(&toks[colon + 1..])
}

// ============================================================================
// Statement helpers
// ============================================================================

/// Summary of a `def`/`class` from its body docstring.
fn body_summary(lines: &[LogicalLine<'_>], idx: usize, header: &[Tok<'_>]) -> String {
    let doc = match top_level_position(header, ":") {
        Some(colon) if colon + 1 < header.len() => python::string_expr(&header[colon + 1..]),
        _ => lines
            .get(idx + 1)
            .filter(|next| next.indent > lines[idx].indent)
            .and_then(|next| python::string_expr(&next.tokens())),
    };
    doc.map(|d| python::summary_line(&python::cleandoc(&d)))
        .unwrap_or_default()
}

/// Summary from a string literal statement directly after an assignment.
fn attribute_summary(lines: &[LogicalLine<'_>], idx: usize) -> String {
    lines
        .get(idx + 1)
        .filter(|next| next.indent == lines[idx].indent)
        .and_then(|next| python::string_expr(&next.tokens()))
        .map(|d| python::summary_line(&python::cleandoc(&d)))
        .unwrap_or_default()
}

/// Names bound by the tail of an `import` statement or of `from m import ...`.
fn imported_names<'a>(toks: &[Tok<'a>]) -> Vec<&'a str> {
    let inner = match toks {
        [Tok::Op("("), inner @ .., Tok::Op(")")] => inner,
        _ => toks,
    };
    inner
        .split(|t| t.is_op(","))
        .filter_map(|clause| match clause {
            [.., Tok::Name("as"), Tok::Name(alias)] => Some(*alias),
            [Tok::Name(first), ..] => Some(*first),
            _ => None,
        })
        .collect()
}

/// Names unbound by the tail of a `del` statement. Subscript and attribute
/// targets leave the module namespace alone.
fn deleted_names<'a>(toks: &[Tok<'a>]) -> Vec<&'a str> {
    let mut names = Vec::new();
    for clause in split_top_level(toks) {
        match clause {
            [Tok::Name(name)] => names.push(*name),
            _ => {
                if let Some(inner) = bracketed(clause) {
                    names.extend(deleted_names(inner));
                }
            }
        }
    }
    names
}

/// Split on commas outside any brackets.
fn split_top_level<'t, 'a>(toks: &'t [Tok<'a>]) -> Vec<&'t [Tok<'a>]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in toks.iter().enumerate() {
        match tok {
            Tok::Op("(" | "[" | "{") => depth += 1,
            Tok::Op(")" | "]" | "}") => depth = depth.saturating_sub(1),
            Tok::Op(",") if depth == 0 => {
                parts.push(&toks[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&toks[start..]);
    parts
}

/// The inside of `( ... )` or `[ ... ]` when the brackets wrap the whole clause.
fn bracketed<'t, 'a>(clause: &'t [Tok<'a>]) -> Option<&'t [Tok<'a>]> {
    if !matches!(clause.first(), Some(Tok::Op("(" | "["))) {
        return None;
    }
    let mut depth = 0usize;
    for (i, tok) in clause.iter().enumerate() {
        match tok {
            Tok::Op("(" | "[" | "{") => depth += 1,
            Tok::Op(")" | "]" | "}") => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (i + 1 == clause.len()).then(|| &clause[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the first `op` outside any brackets.
fn top_level_position(toks: &[Tok<'_>], op: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in toks.iter().enumerate() {
        match tok {
            Tok::Op("(" | "[" | "{") => depth += 1,
            Tok::Op(")" | "]" | "}") => depth = depth.saturating_sub(1),
            Tok::Op(o) if depth == 0 && *o == op => return Some(i),
            _ => {}
        }
    }
    None
}

const AUGMENTED: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", ">>=", "<<=", "&=", "|=", "^=", "@=",
];

/// Split an assignment statement into bound names and the value expression.
fn assignment<'t, 'a>(toks: &'t [Tok<'a>]) -> Option<(Vec<&'a str>, &'t [Tok<'a>])> {
    if let [Tok::Name(name), Tok::Op(op), value @ ..] = toks
        && AUGMENTED.contains(op)
    {
        return is_bindable(name).then(|| (vec![*name], value));
    }

    let mut depth = 0usize;
    let mut splits = Vec::new();
    for (i, tok) in toks.iter().enumerate() {
        match tok {
            Tok::Op("(" | "[" | "{") => depth += 1,
            Tok::Op(")" | "]" | "}") => depth = depth.saturating_sub(1),
            Tok::Op("=") if depth == 0 => splits.push(i),
            Tok::Name("lambda") if depth == 0 => break,
            _ => {}
        }
    }
    let &last = splits.last()?;

    let mut targets = Vec::new();
    let mut start = 0;
    for (n, &split) in splits.iter().enumerate() {
        let segment = &toks[start..split];
        let annotated = n == 0 && splits.len() == 1;
        targets.extend(target_names(segment, annotated)?);
        start = split + 1;
    }
    Some((targets, &toks[last + 1..]))
}

/// Plain names bound by one assignment target; `None` for attribute or
/// subscript targets, which bind nothing at module level.
fn target_names<'a>(segment: &[Tok<'a>], annotated: bool) -> Option<Vec<&'a str>> {
    if annotated
        && let [Tok::Name(name), Tok::Op(":"), ..] = segment
    {
        return is_bindable(name).then(|| vec![*name]);
    }
    let inner = match segment {
        [Tok::Op("(" | "["), inner @ .., Tok::Op(")" | "]")] => inner,
        _ => segment,
    };
    let mut names = Vec::new();
    for clause in inner.split(|t| t.is_op(",")) {
        match clause {
            [] => {}
            [Tok::Name(name)] | [Tok::Op("*"), Tok::Name(name)] if is_bindable(name) => {
                names.push(*name);
            }
            _ => return None,
        }
    }
    (!names.is_empty()).then_some(names)
}

fn is_bindable(name: &str) -> bool {
    naming::is_identifier(name) && !KEYWORDS.contains(&name)
}

/// Decide what an assigned value is.
fn value_binding(
    value: &[Tok<'_>],
    scope: &Scope,
    attribute_doc: impl FnOnce() -> String,
) -> Binding {
    let constant = |summary: String| Binding::Local {
        kind: MemberKind::Constant,
        summary,
    };
    match value {
        [Tok::Name("lambda"), ..] => Binding::Local {
            kind: MemberKind::Function,
            summary: String::new(),
        },
        [Tok::Name(name)] => match scope.get(name) {
            Some(binding) => binding.clone(),
            None => constant(attribute_doc()),
        },
        [Tok::Name(root), Tok::Op("."), ..] if is_dotted_name(value) => match scope.get(root) {
            Some(Binding::Foreign) => Binding::Foreign,
            _ => constant(attribute_doc()),
        },
        _ if calls_class_factory(value) => Binding::Local {
            kind: MemberKind::Class,
            summary: attribute_doc(),
        },
        _ => constant(attribute_doc()),
    }
}

fn is_dotted_name(toks: &[Tok<'_>]) -> bool {
    toks.iter().enumerate().all(|(i, t)| {
        if i % 2 == 0 {
            matches!(t, Tok::Name(_))
        } else {
            t.is_op(".")
        }
    }) && toks.len() % 2 == 1
}

/// `namedtuple("P", ...)`, `enum.Enum("Color", ...)` and friends.
fn calls_class_factory(value: &[Tok<'_>]) -> bool {
    let Some(paren) = value.iter().position(|t| t.is_op("(")) else {
        return false;
    };
    let callee = &value[..paren];
    if !is_dotted_name(callee) {
        return false;
    }
    matches!(callee.last(), Some(Tok::Name(name)) if CLASS_FACTORIES.contains(name))
        && value.last().is_some_and(|t| t.is_op(")"))
}
