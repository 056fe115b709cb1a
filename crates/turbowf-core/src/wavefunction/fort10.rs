use super::ansatz::{self, Ansatz};
use super::labels;
use crate::core::io::locator::Section;
use crate::core::sections::LazySection;
use crate::core::sections::basis::{BasisSets, Component, OrbitalBlock};
use crate::core::sections::forces::ForceConstraints;
use crate::core::sections::header::{Header, Periodicity};
use crate::core::sections::jastrow::TwoBodyJastrow;
use crate::core::sections::matrix::{EntryPatch, MatrixRecord};
use crate::core::sections::occupation::Occupations;
use crate::core::sections::structure::{Cell, Structure};
use crate::core::sections::symmetry::{BasisSymmetry, MatrixSymmetry};
use crate::engine::config::WfConfig;
use crate::engine::error::Result;
use crate::engine::rewrite::{RewriteReport, TokenEdit};
use crate::engine::store::WfStore;
use nalgebra::Matrix3;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Applies `edits` to the working file; an empty batch never touches it.
fn write_through(store: &WfStore, edits: &[TokenEdit]) -> Result<()> {
    if edits.is_empty() {
        return Ok(());
    }
    let report = store.apply(edits)?;
    debug!(
        "Wrote {} token(s) on {} line(s) ({:?}).",
        report.edits_applied, report.lines_touched, report.strategy
    );
    Ok(())
}

/// Which sparse matrix a patch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Determinant,
    Jastrow,
}

/// Summary produced by [`Fort10::check`] after every section has been read.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub natom: usize,
    pub ansatz: Ansatz,
    pub force_classes: usize,
    pub twobody_parameters: usize,
    pub det_shells: usize,
    pub det_primitives: usize,
    pub jas_shells: usize,
    pub jas_primitives: usize,
    pub molecular_orbitals: usize,
    pub hybrid_orbitals: usize,
    pub det_nonzero: usize,
    pub jas_nonzero: usize,
    pub det_matrix_constraints: usize,
    pub jas_matrix_constraints: usize,
    pub det_basis_constraints: usize,
    pub jas_basis_constraints: usize,
}

/// A wavefunction record file.
///
/// Opening reads only the header. Every other section is located and parsed the
/// first time one of its accessors is called, then cached until
/// [`invalidate`](Fort10::invalidate). Setters write through to disk before
/// returning; writing a value equal to the cached one does nothing.
#[derive(Debug)]
pub struct Fort10 {
    store: WfStore,
    header: Header,
    structure: LazySection<Structure>,
    forces: LazySection<ForceConstraints>,
    twobody: LazySection<TwoBodyJastrow>,
    det_basis: LazySection<BasisSets>,
    jas_basis: LazySection<BasisSets>,
    det_occupation: LazySection<Occupations>,
    jas_occupation: LazySection<Occupations>,
    det_matrix: LazySection<MatrixRecord>,
    det_matrix_symmetry: LazySection<MatrixSymmetry>,
    jas_matrix: LazySection<MatrixRecord>,
    jas_matrix_symmetry: LazySection<MatrixSymmetry>,
    det_basis_symmetry: LazySection<BasisSymmetry>,
    jas_basis_symmetry: LazySection<BasisSymmetry>,
}

impl Fort10 {
    /// Opens `path` in place with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, WfConfig::default())
    }

    #[instrument(skip_all, name = "fort10_open", fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, config: WfConfig) -> Result<Self> {
        let store = WfStore::open(path.as_ref(), config)?;
        let header = Header::read(&store)?;
        info!(
            "Opened record with {} atom(s), {} electron(s), {} determinant shell(s).",
            header.natom(),
            header.nel(),
            header.shell_det()
        );
        Ok(Self {
            store,
            header,
            structure: LazySection::new(Section::IonCoordinates),
            forces: LazySection::new(Section::ForceConstraints),
            twobody: LazySection::new(Section::TwoBodyJastrow),
            det_basis: LazySection::new(Section::DetBasis),
            jas_basis: LazySection::new(Section::JasBasis),
            det_occupation: LazySection::new(Section::DetOccupation),
            jas_occupation: LazySection::new(Section::JasOccupation),
            det_matrix: LazySection::new(Section::DetMatrix),
            det_matrix_symmetry: LazySection::new(Section::DetMatrixSymmetry),
            jas_matrix: LazySection::new(Section::JasMatrix),
            jas_matrix_symmetry: LazySection::new(Section::JasMatrixSymmetry),
            det_basis_symmetry: LazySection::new(Section::DetBasisSymmetry),
            jas_basis_symmetry: LazySection::new(Section::JasBasisSymmetry),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The path the record was opened from.
    pub fn source_path(&self) -> &Path {
        self.store.source_path()
    }

    /// The file reads and writes go to; in copy mode, the private copy made by
    /// the first write.
    pub fn working_path(&self) -> &Path {
        self.store.path()
    }

    /// Copies the working file to `dest`.
    pub fn save_as(&self, dest: impl AsRef<Path>) -> Result<()> {
        self.store.save_as(dest.as_ref())?;
        info!("Saved working copy to {:?}", dest.as_ref());
        Ok(())
    }

    /// Whether `section` has been parsed and cached.
    pub fn is_section_read(&self, section: Section) -> bool {
        match section {
            Section::IonCoordinates => self.structure.is_read(),
            Section::ForceConstraints => self.forces.is_read(),
            Section::TwoBodyJastrow => self.twobody.is_read(),
            Section::DetBasis => self.det_basis.is_read(),
            Section::JasBasis => self.jas_basis.is_read(),
            Section::DetOccupation => self.det_occupation.is_read(),
            Section::JasOccupation => self.jas_occupation.is_read(),
            Section::DetMatrix => self.det_matrix.is_read(),
            Section::DetMatrixSymmetry => self.det_matrix_symmetry.is_read(),
            Section::JasMatrix => self.jas_matrix.is_read(),
            Section::JasMatrixSymmetry => self.jas_matrix_symmetry.is_read(),
            Section::DetBasisSymmetry => self.det_basis_symmetry.is_read(),
            Section::JasBasisSymmetry => self.jas_basis_symmetry.is_read(),
        }
    }

    /// Drops every cached section and re-reads the header.
    ///
    /// Needed only when something other than this instance rewrote the file.
    pub fn invalidate(&mut self) -> Result<()> {
        self.header = Header::read(&self.store)?;
        self.structure.invalidate();
        self.forces.invalidate();
        self.twobody.invalidate();
        self.det_basis.invalidate();
        self.jas_basis.invalidate();
        self.det_occupation.invalidate();
        self.jas_occupation.invalidate();
        self.det_matrix.invalidate();
        self.det_matrix_symmetry.invalidate();
        self.jas_matrix.invalidate();
        self.jas_matrix_symmetry.invalidate();
        self.det_basis_symmetry.invalidate();
        self.jas_basis_symmetry.invalidate();
        debug!("Invalidated all cached sections.");
        Ok(())
    }

    // Section accessors.

    pub fn structure(&mut self) -> Result<&Structure> {
        let natom = self.header.natom();
        let record = self
            .structure
            .get_or_read(&self.store, |s| Structure::parse(s, natom))?;
        Ok(record)
    }

    pub fn force_constraints(&mut self) -> Result<&ForceConstraints> {
        let classes = self.header.ieskinr();
        let record = self
            .forces
            .get_or_read(&self.store, |s| ForceConstraints::parse(s, classes))?;
        Ok(record)
    }

    pub fn twobody_jastrow(&mut self) -> Result<&TwoBodyJastrow> {
        Ok(self.twobody_mut()?)
    }

    fn twobody_mut(&mut self) -> Result<&mut TwoBodyJastrow> {
        let kind = self.header.twobody_kind();
        self.twobody
            .get_or_read(&self.store, |s| TwoBodyJastrow::parse(s, kind))
    }

    pub fn det_basis(&mut self) -> Result<&BasisSets> {
        Ok(self.det_basis_mut()?)
    }

    fn det_basis_mut(&mut self) -> Result<&mut BasisSets> {
        let (shells, par_num, complex) = (
            self.header.shell_det(),
            self.header.det_par_num(),
            self.header.complex(),
        );
        self.det_basis.get_or_read(&self.store, |s| {
            BasisSets::parse(s, Section::DetBasis, shells, par_num, complex)
        })
    }

    pub fn jas_basis(&mut self) -> Result<&BasisSets> {
        let (shells, par_num) = (self.header.shell_jas(), self.header.jas_par_num());
        let record = self.jas_basis.get_or_read(&self.store, |s| {
            BasisSets::parse(s, Section::JasBasis, shells, par_num, false)
        })?;
        Ok(record)
    }

    pub fn det_occupation(&mut self) -> Result<&Occupations> {
        let expected = self.det_basis()?.multiplicity_sum();
        let record = self.det_occupation.get_or_read(&self.store, |s| {
            Occupations::parse(s, Section::DetOccupation, expected)
        })?;
        Ok(record)
    }

    pub fn jas_occupation(&mut self) -> Result<&Occupations> {
        let expected = self.jas_basis()?.multiplicity_sum();
        let record = self.jas_occupation.get_or_read(&self.store, |s| {
            Occupations::parse(s, Section::JasOccupation, expected)
        })?;
        Ok(record)
    }

    pub fn det_matrix(&mut self) -> Result<&MatrixRecord> {
        Ok(self.matrix_mut(MatrixKind::Determinant)?)
    }

    pub fn jas_matrix(&mut self) -> Result<&MatrixRecord> {
        Ok(self.matrix_mut(MatrixKind::Jastrow)?)
    }

    fn matrix_mut(&mut self, kind: MatrixKind) -> Result<&mut MatrixRecord> {
        let (lazy, section, nnz, complex) = match kind {
            MatrixKind::Determinant => (
                &mut self.det_matrix,
                Section::DetMatrix,
                self.header.nnz_det(),
                self.header.complex(),
            ),
            MatrixKind::Jastrow => (
                &mut self.jas_matrix,
                Section::JasMatrix,
                self.header.nnz_jas(),
                false,
            ),
        };
        lazy.get_or_read(&self.store, |s| MatrixRecord::parse(s, section, nnz, complex))
    }

    pub fn det_matrix_symmetry(&mut self) -> Result<&MatrixSymmetry> {
        let classes = self.header.iessw();
        let record = self
            .det_matrix_symmetry
            .get_or_read(&self.store, |s| MatrixSymmetry::parse(s, classes))?;
        Ok(record)
    }

    pub fn jas_matrix_symmetry(&mut self) -> Result<&MatrixSymmetry> {
        let classes = self.header.iesfree();
        let record = self
            .jas_matrix_symmetry
            .get_or_read(&self.store, |s| MatrixSymmetry::parse(s, classes))?;
        Ok(record)
    }

    pub fn det_basis_symmetry(&mut self) -> Result<&BasisSymmetry> {
        let classes = self.header.det_basis_sym();
        let record = self
            .det_basis_symmetry
            .get_or_read(&self.store, |s| BasisSymmetry::parse(s, classes))?;
        Ok(record)
    }

    pub fn jas_basis_symmetry(&mut self) -> Result<&BasisSymmetry> {
        let classes = self.header.jas_basis_sym();
        let record = self
            .jas_basis_symmetry
            .get_or_read(&self.store, |s| BasisSymmetry::parse(s, classes))?;
        Ok(record)
    }

    // Derived properties.

    pub fn periodic(&self) -> bool {
        self.header.periodicity() != Periodicity::Open
    }

    /// Orthorhombic cell encoded by density and aspect ratios (`PBC_C`).
    pub fn ortho_flag(&self) -> bool {
        self.header.periodicity() == Periodicity::Orthorhombic
    }

    pub fn complex_flag(&self) -> bool {
        self.header.complex()
    }

    pub fn cell(&self) -> Option<&Cell> {
        self.header.cell()
    }

    /// Lattice vectors as rows, for periodic records.
    pub fn lattice(&self) -> Option<Matrix3<f64>> {
        self.header.cell().map(|c| c.lattice(self.header.nel()))
    }

    /// Whether any atom carries fewer valence electrons than its nuclear charge.
    pub fn pseudopotential_present(&mut self) -> Result<bool> {
        let structure = self.structure()?;
        let core: f64 = structure
            .atoms()
            .iter()
            .map(|a| labels::element_of(a.atomic_number()) as f64 - a.valence())
            .sum();
        Ok(core.abs() > 1e-8)
    }

    /// Whether any determinant shell sums more than one primitive.
    pub fn contracted(&mut self) -> Result<bool> {
        Ok(self.det_basis()?.contracted())
    }

    pub fn ansatz(&mut self) -> Result<Ansatz> {
        let n_mo = self.det_basis()?.num_orbitals(OrbitalBlock::Molecular);
        ansatz::classify(self.store.path(), &self.header, n_mo)
    }

    /// `(element, basis slot)` of every atom, decoded from shifted atomic numbers.
    pub fn basis_labels(&mut self) -> Result<Vec<(u32, usize)>> {
        Ok(self
            .structure()?
            .atomic_numbers()
            .into_iter()
            .map(|z| (labels::element_of(z), labels::basis_slot(z)))
            .collect())
    }

    pub fn mo_coefficients(&mut self) -> Result<Vec<Vec<f64>>> {
        Ok(self.det_basis()?.mo_coefficients())
    }

    pub fn mo_coefficients_imag(&mut self) -> Result<Vec<Vec<f64>>> {
        Ok(self.det_basis()?.mo_coefficients_imag())
    }

    pub fn hybrid_coefficients(&mut self) -> Result<Vec<Vec<f64>>> {
        Ok(self.det_basis()?.hybrid_coefficients())
    }

    /// Reads every section once and verifies the cross-section counts.
    #[instrument(skip_all, name = "fort10_check")]
    pub fn check(&mut self) -> Result<CheckReport> {
        let natom = self.structure()?.natom();
        let force_classes = self.force_constraints()?.num_classes();
        let twobody_parameters = self.twobody_jastrow()?.parameters().len();
        let det = self.det_basis()?;
        let (det_shells, det_primitives) = (det.num_shells(), det.total_primitives());
        let molecular_orbitals = det.num_orbitals(OrbitalBlock::Molecular);
        let hybrid_orbitals = det.num_orbitals(OrbitalBlock::Hybrid);
        let jas = self.jas_basis()?;
        let (jas_shells, jas_primitives) = (jas.num_shells(), jas.total_primitives());
        self.det_occupation()?;
        self.jas_occupation()?;
        let det_nonzero = self.det_matrix()?.len();
        let jas_nonzero = self.jas_matrix()?.len();
        let det_matrix_constraints = self.det_matrix_symmetry()?.total_pairs();
        let jas_matrix_constraints = self.jas_matrix_symmetry()?.total_pairs();
        let det_basis_constraints = self.det_basis_symmetry()?.total_pairs();
        let jas_basis_constraints = self.jas_basis_symmetry()?.total_pairs();
        let ansatz = self.ansatz()?;

        let report = CheckReport {
            natom,
            ansatz,
            force_classes,
            twobody_parameters,
            det_shells,
            det_primitives,
            jas_shells,
            jas_primitives,
            molecular_orbitals,
            hybrid_orbitals,
            det_nonzero,
            jas_nonzero,
            det_matrix_constraints,
            jas_matrix_constraints,
            det_basis_constraints,
            jas_basis_constraints,
        };
        info!("All sections consistent: {}", report.ansatz);
        Ok(report)
    }

    // Mutation.

    /// Runs the mutation engine with no edits; the file comes back byte-identical.
    pub fn write_back(&self) -> Result<RewriteReport> {
        self.store.apply(&[])
    }

    pub fn set_io_flag(&mut self, value: i64) -> Result<()> {
        if let Some(edit) = self.header.io_flag_field().plan(value) {
            write_through(&self.store, std::slice::from_ref(&edit))?;
            self.header.io_flag_field_mut().commit(value, &edit);
        }
        Ok(())
    }

    pub fn set_twobody_parameter(&mut self, index: usize, value: f64) -> Result<()> {
        self.twobody_mut()?;
        let Some(record) = self.twobody.get_mut() else {
            return Ok(());
        };
        if let Some(edit) = record.plan_parameter(index, value)? {
            write_through(&self.store, std::slice::from_ref(&edit))?;
            record.commit_parameter(index, value, &edit);
        }
        Ok(())
    }

    /// Replaces some columns of one sparse-matrix entry.
    pub fn patch_matrix_entry(&mut self, kind: MatrixKind, index: usize, patch: EntryPatch) -> Result<()> {
        self.matrix_mut(kind)?;
        let lazy = match kind {
            MatrixKind::Determinant => &mut self.det_matrix,
            MatrixKind::Jastrow => &mut self.jas_matrix,
        };
        let Some(record) = lazy.get_mut() else {
            return Ok(());
        };
        let planned = record.plan_patch(index, &patch)?;
        if planned.is_empty() {
            return Ok(());
        }
        let edits: Vec<TokenEdit> = planned.iter().map(|(_, e)| e.clone()).collect();
        write_through(&self.store, &edits)?;
        record.commit(index, &planned);
        Ok(())
    }

    fn set_orbital_block(&mut self, block: OrbitalBlock, component: Component, values: &[Vec<f64>]) -> Result<()> {
        self.det_basis_mut()?;
        let Some(basis) = self.det_basis.get_mut() else {
            return Ok(());
        };
        let planned = basis.plan_block(block, component, values)?;
        if planned.is_empty() {
            return Ok(());
        }
        let edits: Vec<TokenEdit> = planned.iter().map(|p| p.edit.clone()).collect();
        write_through(&self.store, &edits)?;
        basis.commit(&planned);
        info!("Rewrote {} coefficient(s) of the {:?} block in one pass.", edits.len(), block);
        Ok(())
    }

    /// Rewrites the real molecular-orbital block, indexed `[orbital][row]`, in one pass.
    pub fn set_mo_coefficients(&mut self, values: &[Vec<f64>]) -> Result<()> {
        self.set_orbital_block(OrbitalBlock::Molecular, Component::Real, values)
    }

    pub fn set_mo_coefficients_imag(&mut self, values: &[Vec<f64>]) -> Result<()> {
        self.set_orbital_block(OrbitalBlock::Molecular, Component::Imaginary, values)
    }

    pub fn set_hybrid_coefficients(&mut self, values: &[Vec<f64>]) -> Result<()> {
        self.set_orbital_block(OrbitalBlock::Hybrid, Component::Real, values)
    }

    /// Sets one real molecular-orbital coefficient.
    pub fn set_mo_coefficient(&mut self, mo: usize, row: usize, value: f64) -> Result<()> {
        self.det_basis_mut()?;
        let Some(basis) = self.det_basis.get_mut() else {
            return Ok(());
        };
        if let Some(planned) = basis.plan_entry(OrbitalBlock::Molecular, Component::Real, mo, row, value)? {
            write_through(&self.store, std::slice::from_ref(&planned.edit))?;
            basis.commit(std::slice::from_ref(&planned));
        }
        Ok(())
    }
}
