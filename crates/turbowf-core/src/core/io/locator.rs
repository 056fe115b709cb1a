//! Keyword-delimited section boundaries.
//!
//! The record file declares no structure of its own: a section begins on the
//! line after its title comment and ends on the line before the next section's
//! title. Titles are matched as whole lines, so the exact phrasing and spacing
//! tolerance of each pattern matters.

use crate::engine::error::{Result, WfError};
use regex::Regex;
use std::io::BufRead;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

/// Every keyword-delimited section, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    IonCoordinates,
    ForceConstraints,
    TwoBodyJastrow,
    DetBasis,
    JasBasis,
    DetOccupation,
    JasOccupation,
    DetMatrix,
    DetMatrixSymmetry,
    JasMatrix,
    JasMatrixSymmetry,
    DetBasisSymmetry,
    JasBasisSymmetry,
}

impl Section {
    pub const ALL: [Section; 13] = [
        Section::IonCoordinates,
        Section::ForceConstraints,
        Section::TwoBodyJastrow,
        Section::DetBasis,
        Section::JasBasis,
        Section::DetOccupation,
        Section::JasOccupation,
        Section::DetMatrix,
        Section::DetMatrixSymmetry,
        Section::JasMatrix,
        Section::JasMatrixSymmetry,
        Section::DetBasisSymmetry,
        Section::JasBasisSymmetry,
    ];

    /// The title phrase as it appears in the file.
    pub fn title(self) -> &'static str {
        match self {
            Section::IonCoordinates => "Ion coordinates",
            Section::ForceConstraints => "Constraints for forces: ion - coordinate",
            Section::TwoBodyJastrow => "Parameters Jastrow two body",
            Section::DetBasis => "Parameters atomic wf",
            Section::JasBasis => "Parameters atomic Jastrow wf",
            Section::DetOccupation => "Occupation atomic orbitals",
            Section::JasOccupation => "Occupation atomic orbitals  Jastrow",
            Section::DetMatrix => "Nonzero values of  detmat",
            Section::DetMatrixSymmetry => "Grouped par.  in the chosen ordered basis",
            Section::JasMatrix => "Nonzero values of  jasmat",
            Section::JasMatrixSymmetry => "Eq. par. in the 3-body Jastrow in the chosen basis",
            Section::DetBasisSymmetry => "Eq. par. in the atomic Det par.in the chosen basis",
            Section::JasBasisSymmetry => "Eq. par. in the atomic 3-body  par. in the chosen basis",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Section::IonCoordinates => r"^\s*#\s*Ion coordinates\s*$",
            Section::ForceConstraints => r"^\s*#\s*Constraints for forces: ion - coordinate\s*$",
            Section::TwoBodyJastrow => r"^\s*#\s*Parameters Jastrow two body\s*$",
            Section::DetBasis => r"^\s*#\s*Parameters atomic wf\s*$",
            Section::JasBasis => r"^\s*#\s*Parameters atomic Jastrow wf\s*$",
            Section::DetOccupation => r"^\s*#\s*Occupation atomic orbitals\s*$",
            Section::JasOccupation => r"^\s*#\s*Occupation atomic orbitals\s+Jastrow\s*$",
            Section::DetMatrix => r"^\s*#\s*Nonzero values of\s+detmat\s*$",
            Section::DetMatrixSymmetry => r"^\s*#\s*Grouped par\.\s+in the chosen ordered basis\s*$",
            Section::JasMatrix => r"^\s*#\s*Nonzero values of\s+jasmat\s*$",
            Section::JasMatrixSymmetry => {
                r"^\s*#\s*Eq\. par\. in the 3-body Jastrow in the chosen basis\s*$"
            }
            Section::DetBasisSymmetry => {
                r"^\s*#\s*Eq\. par\. in the atomic Det par\.\s*in the chosen basis\s*$"
            }
            Section::JasBasisSymmetry => {
                r"^\s*#\s*Eq\. par\. in the atomic 3-body\s+par\. in the chosen basis\s*$"
            }
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Regex matching this section's title line.
    pub fn start_keyword(self) -> &'static Regex {
        &KEYWORDS[self.index()]
    }

    /// Regex matching the line that closes this section, if any.
    pub fn end_keyword(self) -> Option<&'static Regex> {
        KEYWORDS.get(self.index() + 1)
    }
}

static KEYWORDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    Section::ALL
        .iter()
        .map(|s| Regex::new(s.pattern()).expect("section keyword pattern is valid"))
        .collect()
});

/// Half-open range `[start, end)` of physical lines holding a section's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusive `(first_data_line, last_data_line)`, or `None` for an empty section.
    pub fn inclusive(&self) -> Option<(usize, usize)> {
        (!self.is_empty()).then(|| (self.start, self.end - 1))
    }
}

/// Finds the data lines between `start` and the next line matching `end`.
///
/// The range runs to end-of-file when `end` is `None` or never matches.
///
/// # Errors
///
/// Returns [`WfError::SectionNotFound`] if no line matches `start`.
pub fn locate(
    reader: impl BufRead,
    path: &Path,
    keyword: &str,
    start: &Regex,
    end: Option<&Regex>,
) -> Result<LineRange> {
    let mut start_line = None;
    let mut line_count = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| WfError::io(path, e))?;
        line_count = line_no + 1;
        let content = line.trim_end_matches(['\r', '\n']);
        match start_line {
            None if start.is_match(content) => start_line = Some(line_no),
            Some(s) => {
                if end.is_some_and(|re| re.is_match(content)) {
                    trace!("Section '{}' spans lines {}..{}", keyword, s + 1, line_no);
                    return Ok(LineRange {
                        start: s + 1,
                        end: line_no,
                    });
                }
            }
            None => {}
        }
    }
    match start_line {
        Some(s) => Ok(LineRange {
            start: s + 1,
            end: line_count,
        }),
        None => Err(WfError::SectionNotFound {
            path: path.to_path_buf(),
            keyword: keyword.to_string(),
        }),
    }
}

/// Locates `section` using its keyword pair.
pub fn locate_section(reader: impl BufRead, path: &Path, section: Section) -> Result<LineRange> {
    locate(
        reader,
        path,
        section.title(),
        section.start_keyword(),
        section.end_keyword(),
    )
}
