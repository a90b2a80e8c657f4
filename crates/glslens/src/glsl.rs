//! Built-in GLSL front end.
//!
//! Preprocessing is done by `pp-rs`, the preprocessor naga's GLSL frontend is
//! built on. The parser on top accepts every GLSL and GLSL ES version from
//! 100 to 460 and every shader stage: it only needs declarations and the
//! shape of function bodies, not types of expressions.

pub(crate) mod ast;
pub(crate) mod eval;
mod lexer;
mod parser;
pub(crate) mod types;

use std::fmt;

use crate::source::PreparedSource;

pub(crate) use ast::TranslationUnit;

/// A compile error in the glslang info-log format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Diagnostic {
    pub line: u32,
    pub token: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, token: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line,
            token: token.into(),
            message: message.into(),
        }
    }

    /// Full info log for a failed compilation.
    pub fn log(&self) -> String {
        format!("{self}\nERROR: 1 compilation errors.  No code generated.\n")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR: 0:{}: '{}' : {}", self.line, self.token, self.message)
    }
}

/// Preprocesses and parses `source`.
pub(crate) fn parse(source: &PreparedSource<'_>) -> Result<TranslationUnit, Diagnostic> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).translation_unit()
}
