#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// A source position carried by bindings and `tick` markers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SrcLoc {
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub col: u32,
}

impl SrcLoc {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
        }
    }
}

impl fmt::Display for SrcLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

/// Render an optional location for diagnostics.
pub fn describe_loc(loc: &Option<SrcLoc>) -> String {
    match loc {
        Some(l) => l.to_string(),
        None => "<unknown location>".to_string(),
    }
}
