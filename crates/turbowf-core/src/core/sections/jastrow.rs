use crate::core::io::tokens::TokenStream;
use crate::core::models::field::Field;
use crate::engine::error::{Result, WfError};
use crate::engine::rewrite::TokenEdit;

/// The `Parameters Jastrow two body` section: the functional-form code followed
/// by its float parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoBodyJastrow {
    kind: Field<i64>,
    parameters: Vec<Field<f64>>,
}

impl TwoBodyJastrow {
    pub(crate) fn parse(stream: &mut TokenStream, expected_kind: i64) -> Result<Self> {
        let kind: Field<i64> = stream.next_field("two-body Jastrow kind")?;
        if kind.value() != expected_kind {
            let at = kind.at();
            return Err(WfError::malformed(
                stream.path(),
                at.line,
                at.token,
                format!(
                    "two-body Jastrow kind {} disagrees with the header ({})",
                    kind.value(),
                    expected_kind
                ),
            ));
        }
        let parameters = stream.drain("two-body Jastrow parameter")?;
        Ok(Self { kind, parameters })
    }

    pub fn kind(&self) -> i64 {
        self.kind.value()
    }

    pub fn parameters(&self) -> Vec<f64> {
        self.parameters.iter().map(Field::value).collect()
    }

    pub fn parameter_fields(&self) -> &[Field<f64>] {
        &self.parameters
    }

    pub(crate) fn plan_parameter(&self, index: usize, value: f64) -> Result<Option<TokenEdit>> {
        let field = self.parameters.get(index).ok_or_else(|| {
            WfError::InvalidArgument(format!(
                "two-body parameter {} out of range ({} parameters)",
                index,
                self.parameters.len()
            ))
        })?;
        Ok(field.plan(value))
    }

    pub(crate) fn commit_parameter(&mut self, index: usize, value: f64, edit: &TokenEdit) {
        if let Some(field) = self.parameters.get_mut(index) {
            field.commit(value, edit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use std::path::Path;

    fn lines() -> Vec<String> {
        fixtures::MOLECULE.split_inclusive('\n').map(str::to_string).collect()
    }

    #[test]
    fn reads_kind_and_fortran_parameters() {
        let all = lines();
        let mut stream = TokenStream::new(Path::new("f"), 19, &all[19..20]);
        let jastrow = TwoBodyJastrow::parse(&mut stream, -6).unwrap();
        assert_eq!(jastrow.kind(), -6);
        assert_eq!(jastrow.parameters(), vec![0.5, 1.25]);
    }

    #[test]
    fn kind_must_match_header() {
        let all = lines();
        let mut stream = TokenStream::new(Path::new("f"), 19, &all[19..20]);
        let err = TwoBodyJastrow::parse(&mut stream, 4).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { line: 19, token: 0, .. }));
    }

    #[test]
    fn parameter_plans_are_bounds_checked() {
        let all = lines();
        let mut stream = TokenStream::new(Path::new("f"), 19, &all[19..20]);
        let mut jastrow = TwoBodyJastrow::parse(&mut stream, -6).unwrap();
        assert!(jastrow.plan_parameter(0, 0.5).unwrap().is_none());
        assert!(jastrow.plan_parameter(2, 1.0).is_err());

        let edit = jastrow.plan_parameter(1, 2.0).unwrap().unwrap();
        assert_eq!(edit.expected, "1.250000000000000D+00");
        jastrow.commit_parameter(1, 2.0, &edit);
        assert_eq!(jastrow.parameters(), vec![0.5, 2.0]);
    }
}
