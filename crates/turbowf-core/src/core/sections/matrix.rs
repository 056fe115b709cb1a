//! Sparse `detmat`/`jasmat` records: `row col value` or `row col re im`.

use super::count_mismatch;
use crate::core::io::locator::Section;
use crate::core::io::tokens::TokenStream;
use crate::core::models::field::{Field, Slot};
use crate::engine::error::{Result, WfError};
use crate::engine::rewrite::TokenEdit;

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixEntry {
    pub row: Field<i64>,
    pub col: Field<i64>,
    pub coeff_real: Field<f64>,
    pub coeff_imag: Slot<f64>,
}

/// New values for some columns of one matrix entry; `None` leaves a column alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntryPatch {
    pub row: Option<i64>,
    pub col: Option<i64>,
    pub real: Option<f64>,
    pub imag: Option<f64>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: i64) -> Self {
        self.row = Some(row);
        self
    }

    pub fn col(mut self, col: i64) -> Self {
        self.col = Some(col);
        self
    }

    pub fn real(mut self, value: f64) -> Self {
        self.real = Some(value);
        self
    }

    pub fn imag(mut self, value: f64) -> Self {
        self.imag = Some(value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EntryColumn {
    Row(i64),
    Col(i64),
    Real(f64),
    Imag(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRecord {
    entries: Vec<MatrixEntry>,
    complex: bool,
}

impl MatrixRecord {
    pub(crate) fn parse(stream: &mut TokenStream, section: Section, nnz: usize, complex: bool) -> Result<Self> {
        let stride = if complex { 4 } else { 3 };
        let available = stream.remaining();
        let expected = nnz.checked_mul(stride);
        if expected != Some(available) && (expected.is_none() || available % stride == 0) {
            return Err(count_mismatch(stream.path(), section, nnz, available / stride));
        }
        let mut entries = Vec::with_capacity(available / stride);
        for _ in 0..nnz {
            let row: Field<i64> = stream.next_field("matrix row")?;
            let col: Field<i64> = stream.next_field("matrix column")?;
            for index in [&row, &col] {
                if index.value() < 1 {
                    let at = index.at();
                    return Err(WfError::malformed(
                        stream.path(),
                        at.line,
                        at.token,
                        format!("matrix index must be at least 1, got {}", index.value()),
                    ));
                }
            }
            let coeff_real = stream.next_field("matrix value")?;
            let coeff_imag = if complex {
                Slot::Present(stream.next_field("matrix value (imaginary)")?)
            } else {
                Slot::Absent
            };
            entries.push(MatrixEntry {
                row,
                col,
                coeff_real,
                coeff_imag,
            });
        }
        Ok(Self { entries, complex })
    }

    pub fn entries(&self) -> &[MatrixEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_complex(&self) -> bool {
        self.complex
    }

    pub fn rows(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.row.value()).collect()
    }

    pub fn cols(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.col.value()).collect()
    }

    pub fn coeff_real(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.coeff_real.value()).collect()
    }

    /// Imaginary parts; empty for a real matrix.
    pub fn coeff_imag(&self) -> Vec<f64> {
        self.entries.iter().filter_map(|e| e.coeff_imag.value()).collect()
    }

    /// Plans the token edits for `patch` applied to entry `index`.
    pub(crate) fn plan_patch(&self, index: usize, patch: &EntryPatch) -> Result<Vec<(EntryColumn, TokenEdit)>> {
        let entry = self.entries.get(index).ok_or_else(|| {
            WfError::InvalidArgument(format!(
                "matrix entry {} out of range ({} entries)",
                index,
                self.entries.len()
            ))
        })?;
        if let Some(v) = [patch.row, patch.col].into_iter().flatten().find(|&v| v < 1) {
            return Err(WfError::InvalidArgument(format!(
                "matrix index must be at least 1, got {}",
                v
            )));
        }
        let mut planned = Vec::new();
        if let Some(row) = patch.row {
            planned.extend(entry.row.plan(row).map(|e| (EntryColumn::Row(row), e)));
        }
        if let Some(col) = patch.col {
            planned.extend(entry.col.plan(col).map(|e| (EntryColumn::Col(col), e)));
        }
        if let Some(real) = patch.real {
            planned.extend(entry.coeff_real.plan(real).map(|e| (EntryColumn::Real(real), e)));
        }
        if let Some(imag) = patch.imag {
            let field = entry.coeff_imag.field().ok_or_else(|| {
                WfError::InvalidArgument("imaginary part given for a real matrix".into())
            })?;
            planned.extend(field.plan(imag).map(|e| (EntryColumn::Imag(imag), e)));
        }
        Ok(planned)
    }

    pub(crate) fn commit(&mut self, index: usize, planned: &[(EntryColumn, TokenEdit)]) {
        let Some(entry) = self.entries.get_mut(index) else {
            return;
        };
        for (column, edit) in planned {
            match *column {
                EntryColumn::Row(v) => entry.row.commit(v, edit),
                EntryColumn::Col(v) => entry.col.commit(v, edit),
                EntryColumn::Real(v) => entry.coeff_real.commit(v, edit),
                EntryColumn::Imag(v) => {
                    if let Slot::Present(field) = &mut entry.coeff_imag {
                        field.commit(v, edit);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::path::Path;

    fn lines(text: &str) -> Vec<String> {
        text.split_inclusive('\n').map(str::to_string).collect()
    }

    fn molecule_detmat() -> MatrixRecord {
        let all = lines(fixtures::MOLECULE);
        let mut stream = TokenStream::new(Path::new("f"), 50, &all[50..53]);
        MatrixRecord::parse(&mut stream, Section::DetMatrix, 3, false).unwrap()
    }

    #[test]
    fn real_matrix_has_no_imaginary_parts() {
        let matrix = molecule_detmat();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.rows(), vec![1, 2, 1]);
        assert_eq!(matrix.cols(), vec![1, 2, 2]);
        assert_eq!(matrix.coeff_real(), vec![1.0, 0.5, 1e-2]);
        assert!(matrix.coeff_imag().is_empty());
    }

    #[test]
    fn complex_matrix_pairs_every_real_part() {
        let all = lines(fixtures::CRYSTAL);
        let mut stream = TokenStream::new(Path::new("f"), 38, &all[38..40]);
        let matrix = MatrixRecord::parse(&mut stream, Section::DetMatrix, 2, true).unwrap();
        assert!(matrix.is_complex());
        assert_eq!(matrix.coeff_real(), vec![1.0, 0.25]);
        assert_eq!(matrix.coeff_imag(), vec![0.0, -0.125]);
        assert_eq!(matrix.coeff_imag().len(), matrix.coeff_real().len());
    }

    #[test]
    fn entry_count_disagreeing_with_header_is_count_mismatch() {
        let all = lines(fixtures::MOLECULE);
        let mut stream = TokenStream::new(Path::new("f"), 50, &all[50..53]);
        let err = MatrixRecord::parse(&mut stream, Section::DetMatrix, 4, false).unwrap_err();
        assert!(matches!(err, WfError::CountMismatch { expected: 4, found: 3, .. }));
    }

    #[test]
    fn ragged_token_stream_is_malformed() {
        let text = vec![" 1 1 0.5\n".to_string(), " 2 2\n".to_string()];
        let mut stream = TokenStream::new(Path::new("f"), 0, &text);
        let err = MatrixRecord::parse(&mut stream, Section::JasMatrix, 2, false).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn oversized_header_count_is_count_mismatch() {
        let text = vec![" 1 1 0.5 7\n".to_string()];
        let mut stream = TokenStream::new(Path::new("f"), 0, &text);
        let err = MatrixRecord::parse(&mut stream, Section::DetMatrix, usize::MAX / 2, false).unwrap_err();
        assert!(matches!(err, WfError::CountMismatch { found: 1, .. }));
    }

    #[test]
    fn large_header_count_with_ragged_tokens_is_malformed() {
        let text = vec![" 1 1 0.5 7\n".to_string()];
        let mut stream = TokenStream::new(Path::new("f"), 0, &text);
        let err = MatrixRecord::parse(&mut stream, Section::DetMatrix, 1 << 40, false).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { .. }));
    }

    #[test]
    fn patch_plans_only_changed_columns() {
        let mut matrix = molecule_detmat();
        let patch = EntryPatch::new().row(1).col(3).real(0.02);
        let planned = matrix.plan_patch(2, &patch).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].1.at.line, 52);
        assert_eq!(planned[0].1.at.token, 1);
        matrix.commit(2, &planned);
        assert_eq!(matrix.cols(), vec![1, 2, 3]);
        assert_eq!(matrix.coeff_real()[2], 0.02);
        assert!(matrix.plan_patch(2, &patch).unwrap().is_empty());
    }

    #[test]
    fn patch_rejects_bad_targets() {
        let matrix = molecule_detmat();
        assert!(matrix.plan_patch(3, &EntryPatch::new().real(1.0)).is_err());
        assert!(matrix.plan_patch(0, &EntryPatch::new().imag(1.0)).is_err());
        assert!(matrix.plan_patch(0, &EntryPatch::new().row(0)).is_err());
    }
}
