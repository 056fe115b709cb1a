//! Determinant and Jastrow basis sets.
//!
//! Both sections share one grammar. Every shell opens with four integers,
//! `multiplicity param_num code atom`, and the decoded `code` decides how many
//! of the following tokens belong to it:
//!
//! | code | tokens after the opener |
//! |---|---|
//! | uncontracted | one exponent |
//! | contracted, `param_num = 2n` | `n` exponents, then `n` coefficients (`2n` when complex) |
//! | orbital block, `param_num = 2k` | `k` AO indices, then `k` coefficients (`2k` when complex) |
//!
//! Complex coefficients are interleaved `re im` pairs.

use super::{count_mismatch, non_negative};
use crate::core::io::locator::Section;
use crate::core::io::tokens::TokenStream;
use crate::core::models::field::{Field, Slot};
use crate::core::models::turbo::{AngularMomentum, ShellCode};
use crate::engine::error::{Result, WfError};
use crate::engine::rewrite::TokenEdit;
use std::path::Path;
use tracing::trace;

/// One Gaussian term of an ordinary shell.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub exponent: Field<f64>,
    /// Absent for uncontracted shells, whose single primitive has no coefficient token.
    pub coefficient: Slot<f64>,
    pub coefficient_imag: Slot<f64>,
}

/// Molecular- or hybrid-orbital coefficients over a list of AO indices.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalCoefficients {
    pub indices: Vec<Field<i64>>,
    pub real: Vec<Field<f64>>,
    /// Empty unless the determinant part is complex.
    pub imag: Vec<Field<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellBody {
    Gaussian(Vec<Primitive>),
    Orbital(OrbitalCoefficients),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    multiplicity: Field<i64>,
    param_num: Field<i64>,
    code: Field<i64>,
    atom: Field<i64>,
    kind: ShellCode,
    body: ShellBody,
}

impl Shell {
    pub fn multiplicity(&self) -> usize {
        self.multiplicity.value() as usize
    }

    pub fn param_num(&self) -> usize {
        self.param_num.value() as usize
    }

    pub fn code(&self) -> i64 {
        self.code.value()
    }

    pub fn kind(&self) -> ShellCode {
        self.kind
    }

    pub fn angular_momentum(&self) -> Option<AngularMomentum> {
        self.kind.angular_momentum()
    }

    /// 1-based atom the shell is centred on.
    pub fn atom(&self) -> i64 {
        self.atom.value()
    }

    pub fn body(&self) -> &ShellBody {
        &self.body
    }

    pub fn primitives(&self) -> &[Primitive] {
        match &self.body {
            ShellBody::Gaussian(primitives) => primitives.as_slice(),
            ShellBody::Orbital(_) => &[],
        }
    }

    pub fn orbital(&self) -> Option<&OrbitalCoefficients> {
        match &self.body {
            ShellBody::Orbital(block) => Some(block),
            ShellBody::Gaussian(_) => None,
        }
    }

    fn parse(stream: &mut TokenStream, complex: bool) -> Result<Self> {
        let multiplicity: Field<i64> = stream.next_field("shell multiplicity")?;
        let param_num: Field<i64> = stream.next_field("shell parameter count")?;
        let code: Field<i64> = stream.next_field("shell code")?;
        let atom: Field<i64> = stream.next_field("shell atom")?;

        let path = stream.path().to_path_buf();
        let bad = |field: &Field<i64>, reason: String| {
            let at = field.at();
            WfError::malformed(&path, at.line, at.token, reason)
        };
        let at = multiplicity.at();
        non_negative(&path, multiplicity.value(), at.line, at.token, "shell multiplicity")?;
        let at = param_num.at();
        let n = non_negative(&path, param_num.value(), at.line, at.token, "shell parameter count")?;
        let kind = ShellCode::decode(code.value())
            .ok_or_else(|| bad(&code, format!("unknown shell code {}", code.value())))?;

        let body = match kind {
            ShellCode::Uncontracted(_) => {
                if n != 1 {
                    return Err(bad(
                        &param_num,
                        format!("uncontracted shell needs 1 parameter, found {}", n),
                    ));
                }
                ShellBody::Gaussian(vec![Primitive {
                    exponent: stream.next_field("exponent")?,
                    coefficient: Slot::Absent,
                    coefficient_imag: Slot::Absent,
                }])
            }
            ShellCode::Contracted(_) => {
                if n % 2 != 0 || n < 4 {
                    return Err(bad(
                        &param_num,
                        format!("contracted shell needs an even parameter count of at least 4, found {}", n),
                    ));
                }
                let exponents = stream.next_fields::<f64>(n / 2, "exponent")?;
                let mut primitives = Vec::with_capacity(n / 2);
                for exponent in exponents {
                    let (coefficient, coefficient_imag) = if complex {
                        let re = stream.next_field("coefficient (real)")?;
                        let im = stream.next_field("coefficient (imaginary)")?;
                        (Slot::Present(re), Slot::Present(im))
                    } else {
                        (Slot::Present(stream.next_field("coefficient")?), Slot::Absent)
                    };
                    primitives.push(Primitive {
                        exponent,
                        coefficient,
                        coefficient_imag,
                    });
                }
                ShellBody::Gaussian(primitives)
            }
            ShellCode::MolecularOrbital | ShellCode::Hybrid => {
                if n % 2 != 0 || n == 0 {
                    return Err(bad(
                        &param_num,
                        format!("orbital block needs an even, non-zero parameter count, found {}", n),
                    ));
                }
                let k = n / 2;
                let indices = stream.next_fields(k, "orbital AO index")?;
                let mut real = Vec::with_capacity(k);
                let mut imag = Vec::new();
                for _ in 0..k {
                    real.push(stream.next_field("orbital coefficient")?);
                    if complex {
                        imag.push(stream.next_field("orbital coefficient (imaginary)")?);
                    }
                }
                ShellBody::Orbital(OrbitalCoefficients { indices, real, imag })
            }
        };
        Ok(Self {
            multiplicity,
            param_num,
            code,
            atom,
            kind,
            body,
        })
    }
}

/// Which orbital block a coefficient edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitalBlock {
    Molecular,
    Hybrid,
}

impl OrbitalBlock {
    fn code(self) -> ShellCode {
        match self {
            OrbitalBlock::Molecular => ShellCode::MolecularOrbital,
            OrbitalBlock::Hybrid => ShellCode::Hybrid,
        }
    }

    fn name(self) -> &'static str {
        match self {
            OrbitalBlock::Molecular => "molecular-orbital",
            OrbitalBlock::Hybrid => "hybrid-orbital",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Real,
    Imaginary,
}

/// A planned write to one orbital coefficient, kept with its target so the
/// cache can be committed after the engine has written it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoefficientEdit {
    shell: usize,
    row: usize,
    component: Component,
    value: f64,
    pub(crate) edit: TokenEdit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasisSets {
    shells: Vec<Shell>,
    complex: bool,
}

impl BasisSets {
    pub(crate) fn parse(
        stream: &mut TokenStream,
        section: Section,
        shells: usize,
        par_num: usize,
        complex: bool,
    ) -> Result<Self> {
        let shells = (0..shells)
            .map(|_| Shell::parse(stream, complex))
            .collect::<Result<Vec<_>>>()?;
        let record = Self { shells, complex };

        let declared: usize = record.shells.iter().map(Shell::param_num).sum();
        if declared != par_num {
            return Err(count_mismatch(stream.path(), section, par_num, declared));
        }
        for block in [OrbitalBlock::Molecular, OrbitalBlock::Hybrid] {
            record.check_rectangular(stream.path(), section, block)?;
        }
        trace!(
            "Read {} shell(s), {} primitive(s), {} molecular orbital(s).",
            record.shells.len(),
            record.total_primitives(),
            record.num_orbitals(OrbitalBlock::Molecular)
        );
        Ok(record)
    }

    fn check_rectangular(&self, path: &Path, section: Section, block: OrbitalBlock) -> Result<()> {
        let mut rows = self.orbitals(block).map(|(_, o)| o.indices.len());
        if let Some(first) = rows.next() {
            if let Some(other) = rows.find(|&r| r != first) {
                return Err(count_mismatch(path, section, first, other));
            }
        }
        Ok(())
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn num_shells(&self) -> usize {
        self.shells.len()
    }

    pub fn is_complex(&self) -> bool {
        self.complex
    }

    fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.shells.iter().flat_map(Shell::primitives)
    }

    pub fn primitives_per_shell(&self) -> Vec<usize> {
        self.shells
            .iter()
            .filter(|s| matches!(s.body, ShellBody::Gaussian(_)))
            .map(|s| s.primitives().len())
            .collect()
    }

    pub fn total_primitives(&self) -> usize {
        self.primitives().count()
    }

    pub fn exponents(&self) -> Vec<f64> {
        self.primitives().map(|p| p.exponent.value()).collect()
    }

    /// One slot per primitive; absent for uncontracted shells.
    pub fn coefficients(&self) -> Vec<Slot<f64>> {
        self.primitives().map(|p| p.coefficient.clone()).collect()
    }

    pub fn coefficients_imag(&self) -> Vec<Slot<f64>> {
        self.primitives().map(|p| p.coefficient_imag.clone()).collect()
    }

    /// Σ multiplicity, the number of entries the matching occupation section holds.
    pub fn multiplicity_sum(&self) -> usize {
        self.shells.iter().map(Shell::multiplicity).sum()
    }

    pub fn contracted(&self) -> bool {
        self.shells.iter().any(|s| s.primitives().len() > 1)
    }

    pub fn atoms(&self) -> Vec<i64> {
        self.shells.iter().map(Shell::atom).collect()
    }

    fn orbitals(&self, block: OrbitalBlock) -> impl Iterator<Item = (usize, &OrbitalCoefficients)> {
        let code = block.code();
        self.shells
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.kind == code)
            .filter_map(|(i, s)| s.orbital().map(|o| (i, o)))
    }

    pub fn num_orbitals(&self, block: OrbitalBlock) -> usize {
        self.orbitals(block).count()
    }

    /// AO indices of every orbital in `block`, one column per orbital.
    pub fn orbital_indices(&self, block: OrbitalBlock) -> Vec<Vec<i64>> {
        self.orbitals(block)
            .map(|(_, o)| o.indices.iter().map(Field::value).collect())
            .collect()
    }

    /// Coefficients of every orbital in `block`, indexed `[orbital][row]`.
    pub fn orbital_coefficients(&self, block: OrbitalBlock, component: Component) -> Vec<Vec<f64>> {
        self.orbitals(block)
            .map(|(_, o)| {
                let column = match component {
                    Component::Real => &o.real,
                    Component::Imaginary => &o.imag,
                };
                column.iter().map(Field::value).collect()
            })
            .collect()
    }

    pub fn mo_coefficients(&self) -> Vec<Vec<f64>> {
        self.orbital_coefficients(OrbitalBlock::Molecular, Component::Real)
    }

    pub fn mo_coefficients_imag(&self) -> Vec<Vec<f64>> {
        self.orbital_coefficients(OrbitalBlock::Molecular, Component::Imaginary)
    }

    pub fn hybrid_coefficients(&self) -> Vec<Vec<f64>> {
        self.orbital_coefficients(OrbitalBlock::Hybrid, Component::Real)
    }

    fn column(&self, shell: usize, component: Component) -> &[Field<f64>] {
        match self.shells[shell].orbital() {
            Some(o) => match component {
                Component::Real => o.real.as_slice(),
                Component::Imaginary => o.imag.as_slice(),
            },
            None => &[],
        }
    }

    fn check_component(&self, component: Component) -> Result<()> {
        if component == Component::Imaginary && !self.complex {
            return Err(WfError::InvalidArgument(
                "imaginary coefficients requested on a real basis".into(),
            ));
        }
        Ok(())
    }

    fn plan_one(&self, shell: usize, row: usize, component: Component, value: f64) -> Option<CoefficientEdit> {
        let field = self.column(shell, component).get(row)?;
        field.plan(value).map(|edit| CoefficientEdit {
            shell,
            row,
            component,
            value,
            edit,
        })
    }

    /// Plans rewriting the whole `block` with `values[orbital][row]`.
    ///
    /// `values` must have the exact shape of the stored block.
    pub(crate) fn plan_block(
        &self,
        block: OrbitalBlock,
        component: Component,
        values: &[Vec<f64>],
    ) -> Result<Vec<CoefficientEdit>> {
        self.check_component(component)?;
        let shells: Vec<(usize, usize)> = self.orbitals(block).map(|(i, o)| (i, o.indices.len())).collect();
        if values.len() != shells.len() {
            return Err(WfError::InvalidArgument(format!(
                "expected {} {} column(s), got {}",
                shells.len(),
                block.name(),
                values.len()
            )));
        }
        let mut planned = Vec::new();
        for (column, (&(shell, rows), new)) in shells.iter().zip(values).enumerate() {
            if new.len() != rows {
                return Err(WfError::InvalidArgument(format!(
                    "{} column {} has {} row(s), expected {}",
                    block.name(),
                    column,
                    new.len(),
                    rows
                )));
            }
            planned.extend(
                new.iter()
                    .enumerate()
                    .filter_map(|(row, &value)| self.plan_one(shell, row, component, value)),
            );
        }
        Ok(planned)
    }

    /// Plans a single coefficient write.
    pub(crate) fn plan_entry(
        &self,
        block: OrbitalBlock,
        component: Component,
        orbital: usize,
        row: usize,
        value: f64,
    ) -> Result<Option<CoefficientEdit>> {
        self.check_component(component)?;
        let (shell, rows) = self
            .orbitals(block)
            .nth(orbital)
            .map(|(i, o)| (i, o.indices.len()))
            .ok_or_else(|| {
                WfError::InvalidArgument(format!(
                    "{} {} out of range ({} present)",
                    block.name(),
                    orbital,
                    self.num_orbitals(block)
                ))
            })?;
        if row >= rows {
            return Err(WfError::InvalidArgument(format!(
                "row {} out of range for {} {} ({} rows)",
                row,
                block.name(),
                orbital,
                rows
            )));
        }
        Ok(self.plan_one(shell, row, component, value))
    }

    pub(crate) fn commit(&mut self, edits: &[CoefficientEdit]) {
        for planned in edits {
            if let Some(ShellBody::Orbital(o)) = self.shells.get_mut(planned.shell).map(|s| &mut s.body) {
                let column = match planned.component {
                    Component::Real => &mut o.real,
                    Component::Imaginary => &mut o.imag,
                };
                if let Some(field) = column.get_mut(planned.row) {
                    field.commit(planned.value, &planned.edit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn lines(text: &str) -> Vec<String> {
        text.split_inclusive('\n').map(str::to_string).collect()
    }

    fn molecule_det() -> BasisSets {
        let all = lines(fixtures::MOLECULE);
        let mut stream = TokenStream::new(Path::new("f"), 21, &all[21..33]);
        let basis = BasisSets::parse(&mut stream, Section::DetBasis, 5, 18, false).unwrap();
        stream.finish("det basis").unwrap();
        basis
    }

    fn crystal_det() -> BasisSets {
        let all = lines(fixtures::CRYSTAL);
        let mut stream = TokenStream::new(Path::new("f"), 23, &all[23..27]);
        let basis = BasisSets::parse(&mut stream, Section::DetBasis, 2, 5, true).unwrap();
        stream.finish("det basis").unwrap();
        basis
    }

    #[test]
    fn real_coefficients_are_absent_for_uncontracted_shells() {
        let basis = molecule_det();
        assert_eq!(basis.primitives_per_shell(), vec![1, 2, 1]);
        assert_eq!(basis.total_primitives(), 4);
        assert_eq!(basis.exponents(), vec![20.0, 5.0, 1.0, 20.0]);
        let coefficients: Vec<Option<f64>> = basis.coefficients().iter().map(Slot::value).collect();
        assert_eq!(coefficients, vec![None, Some(0.4), Some(0.6), None]);
        assert!(basis.coefficients_imag().iter().all(Slot::is_absent));
        assert!(basis.contracted());
    }

    #[test]
    fn molecular_orbitals_form_columns() {
        let basis = molecule_det();
        assert_eq!(basis.num_orbitals(OrbitalBlock::Molecular), 2);
        assert_eq!(basis.num_orbitals(OrbitalBlock::Hybrid), 0);
        assert_eq!(basis.orbital_indices(OrbitalBlock::Molecular), vec![vec![1, 2, 3], vec![1, 2, 3]]);
        assert_eq!(
            basis.mo_coefficients(),
            vec![vec![0.5, 0.25, 0.125], vec![-0.5, 0.75, 0.1]]
        );
        assert!(basis.mo_coefficients_imag().iter().all(Vec::is_empty));
        assert_eq!(basis.multiplicity_sum(), 5);
        assert_eq!(basis.atoms(), vec![1, 1, 2, 1, 1]);
    }

    #[test]
    fn complex_contracted_shell_interleaves_pairs() {
        let basis = crystal_det();
        assert!(basis.is_complex());
        assert_eq!(basis.shells()[1].angular_momentum(), Some(AngularMomentum::P));
        let re: Vec<Option<f64>> = basis.coefficients().iter().map(Slot::value).collect();
        let im: Vec<Option<f64>> = basis.coefficients_imag().iter().map(Slot::value).collect();
        assert_eq!(re, vec![None, Some(0.6), Some(0.4)]);
        assert_eq!(im, vec![None, Some(0.1), Some(-0.2)]);
        assert_eq!(basis.multiplicity_sum(), 4);
    }

    #[test]
    fn parameter_total_must_match_header() {
        let all = lines(fixtures::MOLECULE);
        let mut stream = TokenStream::new(Path::new("f"), 21, &all[21..33]);
        let err = BasisSets::parse(&mut stream, Section::DetBasis, 5, 17, false).unwrap_err();
        assert!(matches!(err, WfError::CountMismatch { expected: 17, found: 18, .. }));
    }

    #[test]
    fn unknown_code_is_malformed_at_code_token() {
        let text = vec![" 1 1 17 1\n".to_string(), " 2.0\n".to_string()];
        let mut stream = TokenStream::new(Path::new("f"), 40, &text);
        let err = BasisSets::parse(&mut stream, Section::JasBasis, 1, 1, false).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { line: 40, token: 2, .. }));
    }

    #[test]
    fn contracted_shell_with_odd_parameter_count_is_malformed() {
        let text = vec![" 1 5 300 1\n".to_string(), " 1 2 3 4 5\n".to_string()];
        let mut stream = TokenStream::new(Path::new("f"), 0, &text);
        let err = BasisSets::parse(&mut stream, Section::DetBasis, 1, 5, false).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { line: 0, token: 1, .. }));
    }

    #[test]
    fn ragged_orbital_block_is_count_mismatch() {
        let text = vec![
            " 1 4 1000000 1\n".to_string(),
            " 1 2 0.1 0.2\n".to_string(),
            " 1 2 1000000 1\n".to_string(),
            " 1 0.3\n".to_string(),
        ];
        let mut stream = TokenStream::new(Path::new("f"), 0, &text);
        let err = BasisSets::parse(&mut stream, Section::DetBasis, 2, 6, false).unwrap_err();
        assert!(matches!(err, WfError::CountMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn block_plan_skips_unchanged_values_and_checks_shape() {
        let mut basis = molecule_det();
        let mut values = basis.mo_coefficients();
        assert!(basis.plan_block(OrbitalBlock::Molecular, Component::Real, &values).unwrap().is_empty());

        values[1][2] = 2.5;
        let planned = basis.plan_block(OrbitalBlock::Molecular, Component::Real, &values).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].edit.at.line, 32);
        assert_eq!(planned[0].edit.at.token, 2);
        basis.commit(&planned);
        assert_eq!(basis.mo_coefficients()[1][2], 2.5);

        values.pop();
        assert!(basis.plan_block(OrbitalBlock::Molecular, Component::Real, &values).is_err());
        assert!(basis
            .plan_block(OrbitalBlock::Molecular, Component::Imaginary, &basis.mo_coefficients())
            .is_err());
    }

    #[test]
    fn entry_plan_is_bounds_checked() {
        let basis = molecule_det();
        let planned = basis
            .plan_entry(OrbitalBlock::Molecular, Component::Real, 0, 0, 1000.0)
            .unwrap()
            .unwrap();
        assert_eq!(planned.edit.expected, "0.500000000000000");
        assert_eq!(planned.edit.replacement, "1000.0");
        assert!(basis.plan_entry(OrbitalBlock::Molecular, Component::Real, 2, 0, 1.0).is_err());
        assert!(basis.plan_entry(OrbitalBlock::Molecular, Component::Real, 0, 3, 1.0).is_err());
        assert!(basis.plan_entry(OrbitalBlock::Hybrid, Component::Real, 0, 0, 1.0).is_err());
    }
}
