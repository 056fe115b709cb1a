use super::symmetry::{ClassRecord, ConstraintClass};
use crate::core::io::tokens::TokenStream;
use crate::engine::error::{Result, WfError};
use nalgebra::Vector3;

/// Constraint classes over `(atom, direction)` force components.
///
/// A negative atom label flips the sign of that atom's contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceConstraints {
    record: ClassRecord<2>,
}

impl ForceConstraints {
    pub(crate) fn parse(stream: &mut TokenStream, classes: usize) -> Result<Self> {
        let record = ClassRecord::<2>::parse(stream, classes)?;
        for class in record.classes() {
            for member in class.member_fields().chunks_exact(2) {
                let (atom, direction) = (&member[0], &member[1]);
                if atom.value() == 0 {
                    let at = atom.at();
                    return Err(WfError::malformed(stream.path(), at.line, at.token, "atom label 0"));
                }
                if !(1..=3).contains(&direction.value()) {
                    let at = direction.at();
                    return Err(WfError::malformed(
                        stream.path(),
                        at.line,
                        at.token,
                        format!("direction must be 1, 2 or 3, got {}", direction.value()),
                    ));
                }
            }
        }
        Ok(Self { record })
    }

    pub fn classes(&self) -> &[ConstraintClass<2>] {
        self.record.classes()
    }

    pub fn num_classes(&self) -> usize {
        self.record.num_classes()
    }

    pub fn total_pairs(&self) -> usize {
        self.record.total_pairs()
    }

    pub fn multiplicities(&self) -> Vec<i64> {
        self.record.multiplicities()
    }

    /// `(atom, direction)` members of every class; atoms and directions are 1-based.
    pub fn members(&self) -> Vec<Vec<(i64, i64)>> {
        self.record.pairs()
    }

    /// Reduces per-atom Cartesian forces to one value per class:
    /// `Σ sign(atom) · F[|atom|][direction] / |m|`.
    pub fn reduce(&self, forces: &[Vector3<f64>]) -> Result<Vec<f64>> {
        self.record
            .classes()
            .iter()
            .map(|class| {
                let mut total = 0.0;
                for [atom, direction] in class.members() {
                    let index = atom.unsigned_abs() as usize - 1;
                    let force = forces.get(index).ok_or_else(|| {
                        WfError::InvalidArgument(format!(
                            "force constraint refers to atom {} but only {} forces were given",
                            index + 1,
                            forces.len()
                        ))
                    })?;
                    total += atom.signum() as f64 * force[direction as usize - 1];
                }
                Ok(total / class.multiplicity().unsigned_abs() as f64)
            })
            .collect()
    }
}
