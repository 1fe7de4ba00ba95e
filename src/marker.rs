//! Marker regions in hand-authored pages.
//!
//! A page opts into generated content with a single HTML comment such as
//! `<!-- API_TABLE -->`. Substitution inserts the generated text after it and
//! closes the region with `<!-- /API_TABLE -->`:
//!
//! ```text
//! # API Reference               # API Reference
//!
//! Intro prose.          →        Intro prose.
//!
//! <!-- API_TABLE -->             <!-- API_TABLE -->
//!                                <table>…</table>
//! Closing prose.                 <!-- /API_TABLE -->
//!
//!                                Closing prose.
//! ```
//!
//! Later runs find both comments and replace only the span between them, so
//! rewriting a page in place is idempotent and every byte outside the region
//! survives untouched. A missing or repeated marker is an error: it means the
//! page and the hook disagree, and guessing would publish a broken page.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("marker {0} not found")]
    Missing(String),
    #[error("marker {marker} appears {count} times, expected exactly once")]
    Duplicated { marker: String, count: usize },
    #[error("closing marker {marker} appears {count} times, expected at most once")]
    DuplicatedClose { marker: String, count: usize },
    #[error("closing marker {0} comes before its opening marker")]
    ClosedBeforeOpened(String),
}

/// A named marker comment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    name: String,
}

/// Byte offsets of a located marker region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    /// End of the opening comment.
    open_end: usize,
    /// Start of the text that follows the region.
    tail_start: usize,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn open(&self) -> String {
        format!("<!-- {} -->", self.name)
    }

    pub fn close(&self) -> String {
        format!("<!-- /{} -->", self.name)
    }

    /// Check that `content` holds exactly one well-formed region.
    pub fn check(&self, content: &str) -> Result<(), MarkerError> {
        self.locate(content).map(|_| ())
    }

    /// The generated text currently inside the region, if it was ever filled.
    pub fn current<'a>(&self, content: &'a str) -> Result<Option<&'a str>, MarkerError> {
        let region = self.locate(content)?;
        if region.tail_start == region.open_end {
            return Ok(None);
        }
        let close_start = region.tail_start - self.close().len();
        Ok(Some(content[region.open_end..close_start].trim_matches('\n')))
    }

    /// Replace the region's contents with `generated`.
    pub fn replace(&self, content: &str, generated: &str) -> Result<String, MarkerError> {
        let region = self.locate(content)?;
        let close = self.close();
        let generated = generated.trim_matches('\n');

        let mut out = String::with_capacity(content.len() + generated.len() + close.len() + 2);
        out.push_str(&content[..region.open_end]);
        out.push('\n');
        out.push_str(generated);
        out.push('\n');
        out.push_str(&close);
        out.push_str(&content[region.tail_start..]);
        Ok(out)
    }

    fn locate(&self, content: &str) -> Result<Region, MarkerError> {
        let open = self.open();
        let close = self.close();

        let opens: Vec<usize> = content.match_indices(&open).map(|(i, _)| i).collect();
        let open_start = match opens.as_slice() {
            [] => return Err(MarkerError::Missing(open)),
            [only] => *only,
            _ => {
                return Err(MarkerError::Duplicated {
                    count: opens.len(),
                    marker: open,
                });
            }
        };
        let open_end = open_start + open.len();

        let closes: Vec<usize> = content.match_indices(&close).map(|(i, _)| i).collect();
        let tail_start = match closes.as_slice() {
            [] => open_end,
            [only] if *only < open_start => return Err(MarkerError::ClosedBeforeOpened(close)),
            [only] => only + close.len(),
            _ => {
                return Err(MarkerError::DuplicatedClose {
                    count: closes.len(),
                    marker: close,
                });
            }
        };

        Ok(Region {
            open_end,
            tail_start,
        })
    }
}
