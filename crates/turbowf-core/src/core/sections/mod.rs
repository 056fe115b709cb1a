//! Lazy readers for the keyword-delimited sections of the record file.
//!
//! Each reader is wrapped in a [`LazySection`], which walks its section's token
//! stream exactly once, on first access, and caches both the located line range
//! and the parsed record until explicitly invalidated.

pub mod basis;
pub mod forces;
pub mod header;
pub mod jastrow;
pub mod matrix;
pub mod occupation;
pub mod structure;
pub mod symmetry;

use crate::core::io::locator::{LineRange, Section};
use crate::core::io::tokens::TokenStream;
use crate::engine::error::{Result, WfError};
use crate::engine::store::WfStore;
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq)]
pub enum ReadState<T> {
    Unread,
    Reading,
    Read(T),
}

#[derive(Debug, Clone)]
pub struct LazySection<T> {
    section: Section,
    range: Option<LineRange>,
    state: ReadState<T>,
}

impl<T> LazySection<T> {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            range: None,
            state: ReadState::Unread,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn is_read(&self) -> bool {
        matches!(self.state, ReadState::Read(_))
    }

    /// The cached line range, if the section has been located.
    pub fn range(&self) -> Option<LineRange> {
        self.range
    }

    pub fn get(&self) -> Option<&T> {
        match &self.state {
            ReadState::Read(record) => Some(record),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            ReadState::Read(record) => Some(record),
            _ => None,
        }
    }

    /// Forgets the cached range and record; the next access re-scans the file.
    pub fn invalidate(&mut self) {
        self.range = None;
        self.state = ReadState::Unread;
    }

    /// Returns the cached record, parsing the section with `parse` first if it
    /// has not been read yet. Every token of the section must be consumed.
    pub fn get_or_read<F>(&mut self, store: &WfStore, parse: F) -> Result<&mut T>
    where
        F: FnOnce(&mut TokenStream) -> Result<T>,
    {
        if !self.is_read() {
            self.state = ReadState::Reading;
            match self.read(store, parse) {
                Ok(record) => self.state = ReadState::Read(record),
                Err(e) => {
                    self.state = ReadState::Unread;
                    return Err(e);
                }
            }
        }
        match &mut self.state {
            ReadState::Read(record) => Ok(record),
            _ => unreachable!("section state is Read after a successful parse"),
        }
    }

    #[instrument(skip_all, name = "section_scan", fields(section = self.section.title()))]
    fn read<F>(&mut self, store: &WfStore, parse: F) -> Result<T>
    where
        F: FnOnce(&mut TokenStream) -> Result<T>,
    {
        let range = match self.range {
            Some(range) => range,
            None => {
                let range = store.locate(self.section)?;
                self.range = Some(range);
                range
            }
        };
        let lines = store.read_lines(range)?;
        let mut stream = TokenStream::new(store.path(), range.start, &lines);
        let record = parse(&mut stream)?;
        stream.finish(self.section.title())?;
        debug!(
            "Parsed section '{}' ({} line(s)).",
            self.section.title(),
            range.len()
        );
        Ok(record)
    }
}

/// Converts a header count to `usize`, rejecting negative values.
pub(crate) fn non_negative(path: &Path, value: i64, line: usize, token: usize, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        WfError::malformed(path, line, token, format!("{} must not be negative, got {}", what, value))
    })
}

pub(crate) fn count_mismatch(path: &Path, section: Section, expected: usize, found: usize) -> WfError {
    WfError::CountMismatch {
        path: path.to_path_buf(),
        section: section.title(),
        expected,
        found,
    }
}
