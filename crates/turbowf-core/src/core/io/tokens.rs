use crate::core::models::field::{Field, Provenance, TokenValue};
use crate::engine::error::{Result, WfError};
use std::path::{Path, PathBuf};

/// Byte ranges of the whitespace-separated tokens of `line`.
///
/// The line terminator, if any, is treated as whitespace.
pub fn token_spans(line: &str) -> Vec<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, bytes.len()));
    }
    spans
}

/// Whether `line` is a `#` comment line.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// A token together with its position in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub at: Provenance,
}

/// Sequential reader over the tokens of a located section.
///
/// Section readers consume tokens in file order without caring how they are
/// broken over lines; every parse error carries the position of the offending
/// token.
pub struct TokenStream {
    path: PathBuf,
    tokens: Vec<Token>,
    cursor: usize,
    end_line: usize,
}

impl TokenStream {
    /// Tokenizes `lines`, the first of which is line `first_line` of the file.
    pub fn new(path: &Path, first_line: usize, lines: &[String]) -> Self {
        let mut tokens = Vec::new();
        for (offset, line) in lines.iter().enumerate() {
            for (index, (s, e)) in token_spans(line).into_iter().enumerate() {
                tokens.push(Token {
                    text: line[s..e].to_string(),
                    at: Provenance::new(first_line + offset, index),
                });
            }
        }
        Self {
            path: path.to_path_buf(),
            tokens,
            cursor: 0,
            end_line: first_line + lines.len(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.cursor
    }

    pub fn next_token(&mut self, what: &str) -> Result<Token> {
        match self.tokens.get(self.cursor) {
            Some(token) => {
                self.cursor += 1;
                Ok(token.clone())
            }
            None => Err(WfError::malformed(
                &self.path,
                self.end_line,
                0,
                format!("section ended while reading {}", what),
            )),
        }
    }

    pub fn next_field<T: TokenValue>(&mut self, what: &str) -> Result<Field<T>> {
        let token = self.next_token(what)?;
        Field::parse(&self.path, token.at, &token.text)
    }

    pub fn next_fields<T: TokenValue>(&mut self, count: usize, what: &str) -> Result<Vec<Field<T>>> {
        (0..count).map(|_| self.next_field(what)).collect()
    }

    /// Fails if any token is left unconsumed.
    pub fn finish(self, section: &str) -> Result<()> {
        match self.tokens.get(self.cursor) {
            None => Ok(()),
            Some(token) => Err(WfError::malformed(
                &self.path,
                token.at.line,
                token.at.token,
                format!("unexpected trailing token '{}' in section '{}'", token.text, section),
            )),
        }
    }

    /// Consumes every remaining token.
    pub fn drain<T: TokenValue>(&mut self, what: &str) -> Result<Vec<Field<T>>> {
        let count = self.remaining();
        self.next_fields(count, what)
    }
}
