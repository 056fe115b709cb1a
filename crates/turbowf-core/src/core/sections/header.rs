//! The fixed-position header block and the periodic-cell preamble before it.

use super::non_negative;
use super::structure::Cell;
use crate::core::io::tokens::{is_comment, token_spans};
use crate::core::models::field::{Field, Provenance};
use crate::engine::error::{Result, WfError};
use crate::engine::store::WfStore;
use std::path::Path;

/// Number of physical lines in the header block.
pub const HEADER_LINES: usize = 12;

/// Boundary conditions announced by the first line of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Periodicity {
    Open,
    /// `PBC_C`: orthorhombic cell encoded by `rs` and aspect ratios.
    Orthorhombic,
    /// `PBC_T`: explicit lattice vectors.
    Tilted,
}

impl Periodicity {
    fn from_first_line(line: &str) -> Self {
        match line.split_whitespace().next() {
            Some("PBC_C") => Periodicity::Orthorhombic,
            Some("PBC_T") => Periodicity::Tilted,
            _ => Periodicity::Open,
        }
    }

    /// Number of lines the cell preamble occupies before the header.
    pub fn preamble_lines(self) -> usize {
        match self {
            Periodicity::Open => 0,
            Periodicity::Orthorhombic => 2,
            Periodicity::Tilted => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    periodicity: Periodicity,
    cell: Option<Cell>,
    nelup: Field<i64>,
    nel: Field<i64>,
    natom: Field<i64>,
    shell_det: Field<i64>,
    shell_jas: Field<i64>,
    twobody_kind: Field<i64>,
    det_par_num: Field<i64>,
    jas_par_num: Field<i64>,
    nnz_det: Field<i64>,
    nnz_jas: Field<i64>,
    det_basis_sym: Field<i64>,
    jas_basis_sym: Field<i64>,
    iesfree: Field<i64>,
    iessw: Field<i64>,
    ieskinr: Field<i64>,
    io_flag: Field<i64>,
}

fn data_line(path: &Path, lines: &[String], line_no: usize, expected: usize) -> Result<Vec<Field<i64>>> {
    let comment_no = line_no - 1;
    let comment = lines.get(comment_no).ok_or_else(|| {
        WfError::malformed(path, comment_no, 0, "file ends inside the header")
    })?;
    if !is_comment(comment) {
        return Err(WfError::malformed(
            path,
            comment_no,
            0,
            "expected a '#' comment line in the header",
        ));
    }
    let line = lines
        .get(line_no)
        .ok_or_else(|| WfError::malformed(path, line_no, 0, "file ends inside the header"))?;
    let spans = token_spans(line);
    if spans.len() != expected {
        return Err(WfError::malformed(
            path,
            line_no,
            spans.len().min(expected),
            format!("expected {} header values, found {}", expected, spans.len()),
        ));
    }
    spans
        .iter()
        .enumerate()
        .map(|(i, &(s, e))| Field::parse(path, Provenance::new(line_no, i), &line[s..e]))
        .collect()
}

impl Header {
    /// Reads the preamble and header from the top of the file.
    pub fn read(store: &WfStore) -> Result<Self> {
        let path = store.path();
        let first = store.read_head(1)?;
        let periodicity = first
            .first()
            .map(|line| Periodicity::from_first_line(line))
            .ok_or_else(|| WfError::malformed(path, 0, 0, "file is empty"))?;
        let h = periodicity.preamble_lines();
        let lines = store.read_head(h + HEADER_LINES)?;
        Self::parse(path, &lines, periodicity)
    }

    fn parse(path: &Path, lines: &[String], periodicity: Periodicity) -> Result<Self> {
        let h = periodicity.preamble_lines();
        let cell = Cell::parse(path, lines, periodicity)?;

        let mut electrons = data_line(path, lines, h + 1, 3)?.into_iter();
        let mut shells = data_line(path, lines, h + 3, 2)?.into_iter();
        let mut params = data_line(path, lines, h + 5, 3)?.into_iter();
        let mut nonzero = data_line(path, lines, h + 7, 2)?.into_iter();
        let mut basis_sym = data_line(path, lines, h + 9, 2)?.into_iter();
        let mut flags = data_line(path, lines, h + 11, 4)?.into_iter();

        // Lengths were checked by `data_line`.
        let take = |it: &mut std::vec::IntoIter<Field<i64>>| {
            it.next().ok_or_else(|| WfError::malformed(path, h, 0, "truncated header"))
        };
        let header = Header {
            periodicity,
            cell,
            nelup: take(&mut electrons)?,
            nel: take(&mut electrons)?,
            natom: take(&mut electrons)?,
            shell_det: take(&mut shells)?,
            shell_jas: take(&mut shells)?,
            twobody_kind: take(&mut params)?,
            det_par_num: take(&mut params)?,
            jas_par_num: take(&mut params)?,
            nnz_det: take(&mut nonzero)?,
            nnz_jas: take(&mut nonzero)?,
            det_basis_sym: take(&mut basis_sym)?,
            jas_basis_sym: take(&mut basis_sym)?,
            iesfree: take(&mut flags)?,
            iessw: take(&mut flags)?,
            ieskinr: take(&mut flags)?,
            io_flag: take(&mut flags)?,
        };
        header.validate(path)?;
        Ok(header)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (field, what) in [
            (&self.nelup, "nelup"),
            (&self.natom, "natom"),
            (&self.det_par_num, "det_par_num"),
            (&self.jas_par_num, "jas_par_num"),
            (&self.det_basis_sym, "det_basis_sym"),
            (&self.jas_basis_sym, "jas_basis_sym"),
            (&self.iesfree, "iesfree"),
            (&self.iessw, "iessw"),
            (&self.ieskinr, "ieskinr"),
        ] {
            non_negative(path, field.value(), field.at().line, field.at().token, what)?;
        }
        if self.nelup.value().unsigned_abs() > self.nel.value().unsigned_abs() {
            let at = self.nelup.at();
            return Err(WfError::malformed(
                path,
                at.line,
                at.token,
                format!(
                    "nelup ({}) exceeds the number of electrons ({})",
                    self.nelup.value(),
                    self.nel.value().unsigned_abs()
                ),
            ));
        }
        Ok(())
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    pub fn cell(&self) -> Option<&Cell> {
        self.cell.as_ref()
    }

    pub fn nelup(&self) -> usize {
        self.nelup.value() as usize
    }

    /// Total electron count; the sign of the stored value is the Pfaffian flag.
    pub fn nel(&self) -> usize {
        self.nel.value().unsigned_abs() as usize
    }

    pub fn neldn(&self) -> usize {
        self.nel().saturating_sub(self.nelup())
    }

    pub fn pfaffian(&self) -> bool {
        self.nel.value() < 0
    }

    pub fn natom(&self) -> usize {
        self.natom.value() as usize
    }

    pub fn shell_det(&self) -> usize {
        self.shell_det.value().unsigned_abs() as usize
    }

    /// A negative determinant shell count marks complex coefficients.
    pub fn complex(&self) -> bool {
        self.shell_det.value() < 0
    }

    pub fn shell_jas(&self) -> usize {
        self.shell_jas.value().unsigned_abs() as usize
    }

    /// A negative Jastrow shell count marks a spin-dependent Jastrow basis.
    pub fn jastrow_spin_dependent(&self) -> bool {
        self.shell_jas.value() < 0
    }

    pub fn twobody_kind(&self) -> i64 {
        self.twobody_kind.value()
    }

    pub fn det_par_num(&self) -> usize {
        self.det_par_num.value() as usize
    }

    pub fn jas_par_num(&self) -> usize {
        self.jas_par_num.value() as usize
    }

    pub fn nnz_det(&self) -> usize {
        self.nnz_det.value().unsigned_abs() as usize
    }

    pub fn nnz_jas(&self) -> usize {
        self.nnz_jas.value().unsigned_abs() as usize
    }

    pub fn det_basis_sym(&self) -> usize {
        self.det_basis_sym.value() as usize
    }

    pub fn jas_basis_sym(&self) -> usize {
        self.jas_basis_sym.value() as usize
    }

    /// Symmetry classes of the Jastrow matrix.
    pub fn iesfree(&self) -> usize {
        self.iesfree.value() as usize
    }

    /// Symmetry classes of the determinant matrix.
    pub fn iessw(&self) -> usize {
        self.iessw.value() as usize
    }

    /// Force-constraint classes.
    pub fn ieskinr(&self) -> usize {
        self.ieskinr.value() as usize
    }

    pub fn io_flag(&self) -> i64 {
        self.io_flag.value()
    }

    pub fn io_flag_field(&self) -> &Field<i64> {
        &self.io_flag
    }

    pub(crate) fn io_flag_field_mut(&mut self) -> &mut Field<i64> {
        &mut self.io_flag
    }
}
