use super::count_mismatch;
use crate::core::io::locator::Section;
use crate::core::io::tokens::TokenStream;
use crate::core::models::field::Field;
use crate::engine::error::Result;

/// Per-orbital occupation flags; one entry per basis function.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupations {
    flags: Vec<Field<i64>>,
}

impl Occupations {
    /// `expected` is the multiplicity sum of the matching basis record.
    pub(crate) fn parse(stream: &mut TokenStream, section: Section, expected: usize) -> Result<Self> {
        let found = stream.remaining();
        if found != expected {
            return Err(count_mismatch(stream.path(), section, expected, found));
        }
        Ok(Self {
            flags: stream.next_fields(expected, "occupation flag")?,
        })
    }

    pub fn values(&self) -> Vec<i64> {
        self.flags.iter().map(Field::value).collect()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of orbitals with a non-zero flag.
    pub fn occupied(&self) -> usize {
        self.flags.iter().filter(|f| f.value() != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::WfError;
    use crate::testing::fixtures;
    use std::path::Path;

    fn lines() -> Vec<String> {
        fixtures::MOLECULE.split_inclusive('\n').map(str::to_string).collect()
    }

    #[test]
    fn one_flag_per_basis_function() {
        let all = lines();
        let mut stream = TokenStream::new(Path::new("f"), 39, &all[39..44]);
        let occupations = Occupations::parse(&mut stream, Section::DetOccupation, 5).unwrap();
        assert_eq!(occupations.len(), 5);
        assert_eq!(occupations.occupied(), 5);
        assert_eq!(occupations.values(), vec![1; 5]);
    }

    #[test]
    fn flag_count_must_match_multiplicity_sum() {
        let all = lines();
        let mut stream = TokenStream::new(Path::new("f"), 45, &all[45..49]);
        let err = Occupations::parse(&mut stream, Section::JasOccupation, 3).unwrap_err();
        assert!(matches!(
            err,
            WfError::CountMismatch { expected: 3, found: 4, section, .. } if section == Section::JasOccupation.title()
        ));
    }
}
