//! Signed-multiplicity constraint classes.
//!
//! Matrix symmetry, basis symmetry and force constraints share one layout: a
//! signed multiplicity `m` followed by `|m|` members of `N` integers each. The
//! sign of `m` is data and is kept as read.

use crate::core::io::tokens::TokenStream;
use crate::core::models::field::Field;
use crate::engine::error::{Result, WfError};

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintClass<const N: usize> {
    multiplicity: Field<i64>,
    /// `|m| * N` member tokens in file order.
    members: Vec<Field<i64>>,
}

impl<const N: usize> ConstraintClass<N> {
    fn parse(stream: &mut TokenStream) -> Result<Self> {
        let multiplicity: Field<i64> = stream.next_field("class multiplicity")?;
        let count = usize::try_from(multiplicity.value().unsigned_abs())
            .ok()
            .and_then(|m| m.checked_mul(N))
            .ok_or_else(|| {
                let at = multiplicity.at();
                WfError::malformed(
                    stream.path(),
                    at.line,
                    at.token,
                    format!("class multiplicity {} is out of range", multiplicity.value()),
                )
            })?;
        let members = stream.next_fields(count, "class member")?;
        Ok(Self { multiplicity, members })
    }

    /// The multiplicity with its sign as stored.
    pub fn multiplicity(&self) -> i64 {
        self.multiplicity.value()
    }

    /// Whether the stored multiplicity is negative.
    pub fn is_signed(&self) -> bool {
        self.multiplicity.value() < 0
    }

    pub fn len(&self) -> usize {
        self.members.len() / N
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn member_fields(&self) -> &[Field<i64>] {
        &self.members
    }

    /// Member tuples, sign included.
    pub fn members(&self) -> impl Iterator<Item = [i64; N]> + '_ {
        self.members
            .chunks_exact(N)
            .map(|m| std::array::from_fn(|i| m[i].value()))
    }
}

/// A full constraint section: exactly `classes` classes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord<const N: usize> {
    classes: Vec<ConstraintClass<N>>,
}

/// Matrix-element symmetry: members are `(row, col)`.
pub type MatrixSymmetry = ClassRecord<2>;
/// Basis-coefficient symmetry: members are single parameter indices.
pub type BasisSymmetry = ClassRecord<1>;

impl<const N: usize> ClassRecord<N> {
    pub(crate) fn parse(stream: &mut TokenStream, classes: usize) -> Result<Self> {
        let classes = (0..classes)
            .map(|_| ConstraintClass::parse(stream))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[ConstraintClass<N>] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// `Σ |m_i|` over all classes.
    pub fn total_pairs(&self) -> usize {
        self.classes.iter().map(ConstraintClass::len).sum()
    }

    pub fn multiplicities(&self) -> Vec<i64> {
        self.classes.iter().map(ConstraintClass::multiplicity).collect()
    }
}

impl BasisSymmetry {
    /// Parameter indices of every class, sign preserved.
    pub fn indices(&self) -> Vec<Vec<i64>> {
        self.classes
            .iter()
            .map(|c| c.members().map(|[i]| i).collect())
            .collect()
    }
}

impl MatrixSymmetry {
    /// `(row, col)` pairs of every class, sign preserved.
    pub fn pairs(&self) -> Vec<Vec<(i64, i64)>> {
        self.classes
            .iter()
            .map(|c| c.members().map(|[r, col]| (r, col)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::path::Path;

    fn stream(text: &str, first: usize, lines: std::ops::Range<usize>) -> TokenStream {
        let all: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        TokenStream::new(Path::new("f"), first, &all[lines])
    }

    #[test]
    fn matrix_symmetry_keeps_negative_multiplicity() {
        let mut s = stream(fixtures::MOLECULE, 54, 54..56);
        let record = MatrixSymmetry::parse(&mut s, 2).unwrap();
        assert!(s.finish("det matrix symmetry").is_ok());
        assert_eq!(record.multiplicities(), vec![1, -2]);
        assert!(record.classes()[1].is_signed());
        assert_eq!(record.pairs(), vec![vec![(1, 1)], vec![(2, 2), (1, 2)]]);
        assert_eq!(record.total_pairs(), 3);
    }

    #[test]
    fn basis_symmetry_reads_single_indices() {
        let mut s = stream(fixtures::MOLECULE, 62, 62..64);
        let record = BasisSymmetry::parse(&mut s, 2).unwrap();
        assert_eq!(record.indices(), vec![vec![1], vec![2, 3]]);
        assert_eq!(record.total_pairs(), 3);
        assert_eq!(record.multiplicities(), vec![1, -2]);
    }

    #[test]
    fn zero_classes_consume_nothing() {
        let mut s = stream(fixtures::MOLECULE, 0, 0..0);
        let record = BasisSymmetry::parse(&mut s, 0).unwrap();
        assert_eq!(record.num_classes(), 0);
        assert_eq!(record.total_pairs(), 0);
    }

    #[test]
    fn short_class_is_malformed() {
        let lines = vec![" 3 1 1 2 2\n".to_string()];
        let mut s = TokenStream::new(Path::new("f"), 7, &lines);
        let err = MatrixSymmetry::parse(&mut s, 1).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { line: 8, .. }));
    }

    #[test]
    fn overflowing_multiplicity_is_malformed_at_its_token() {
        let lines = vec![" -9223372036854775808 1 1\n".to_string()];
        let mut s = TokenStream::new(Path::new("f"), 0, &lines);
        let err = MatrixSymmetry::parse(&mut s, 1).unwrap_err();
        assert!(matches!(
            err,
            WfError::MalformedRecord { line: 0, ref reason, .. } if reason.contains("out of range")
        ));
    }
}
