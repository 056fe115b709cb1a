//! Typed scalars that remember where in the record file they came from.
//!
//! A [`Field`] is the unit every section reader produces: the parsed value, the
//! exact token text it was parsed from, and its `(line, token)` position. The
//! position is what the mutation engine needs to splice a replacement in place;
//! the original text is what lets it detect that the file changed underneath the
//! cache.

use crate::engine::error::{Result, WfError};
use crate::engine::rewrite::TokenEdit;
use std::fmt::Debug;
use std::path::Path;

/// Position of a token inside the record file. Both indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Provenance {
    pub line: usize,
    pub token: usize,
}

impl Provenance {
    pub fn new(line: usize, token: usize) -> Self {
        Self { line, token }
    }
}

/// A scalar type that can live in a record-file token.
pub trait TokenValue: Copy + PartialEq + Debug {
    /// Human-readable type name used in error messages.
    const KIND: &'static str;

    fn parse_token(text: &str) -> Option<Self>;

    /// Canonical text written back into the file.
    ///
    /// Floats render as the shortest text that parses back to the identical
    /// `f64`, so a read-modify-write cycle never loses precision.
    fn render(&self) -> String;
}

impl TokenValue for i64 {
    const KIND: &'static str = "integer";

    fn parse_token(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl TokenValue for f64 {
    const KIND: &'static str = "float";

    fn parse_token(text: &str) -> Option<Self> {
        parse_fortran_float(text)
    }

    fn render(&self) -> String {
        format!("{:?}", self)
    }
}

/// Parses a float, accepting the Fortran `D`/`d` exponent marker.
pub fn parse_fortran_float(text: &str) -> Option<f64> {
    if text.contains(['D', 'd']) {
        text.replace(['D', 'd'], "E").parse().ok()
    } else {
        text.parse().ok()
    }
}

/// A value read from a specific token of the record file.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T: TokenValue> {
    value: T,
    text: String,
    at: Provenance,
}

impl<T: TokenValue> Field<T> {
    /// Parses `text` found at `at` in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WfError::MalformedRecord`] if the token is not a valid `T`.
    pub fn parse(path: &Path, at: Provenance, text: &str) -> Result<Self> {
        let value = T::parse_token(text).ok_or_else(|| {
            WfError::malformed(
                path,
                at.line,
                at.token,
                format!("expected {}, found '{}'", T::KIND, text),
            )
        })?;
        Ok(Self {
            value,
            text: text.to_string(),
            at,
        })
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn at(&self) -> Provenance {
        self.at
    }

    /// The token text currently backing this field on disk.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Builds the edit that replaces this token with `new_value`.
    ///
    /// Returns `None` when `new_value` equals the cached value, so writing a
    /// field to its current value never touches the file.
    pub fn plan(&self, new_value: T) -> Option<TokenEdit> {
        if new_value == self.value {
            return None;
        }
        Some(TokenEdit {
            at: self.at,
            expected: self.text.clone(),
            replacement: new_value.render(),
        })
    }

    /// Updates the cache after the mutation engine has written `edit`.
    pub(crate) fn commit(&mut self, new_value: T, edit: &TokenEdit) {
        self.value = new_value;
        self.text = edit.replacement.clone();
    }
}

/// An optional token slot.
///
/// Uncontracted shells carry no coefficient token; their coefficient slot is
/// [`Slot::Absent`] rather than a zero, so callers cannot mistake "no token" for
/// a real value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot<T: TokenValue> {
    #[default]
    Absent,
    Present(Field<T>),
}

impl<T: TokenValue> Slot<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Slot::Absent => None,
            Slot::Present(field) => Some(field.value()),
        }
    }

    pub fn value_or(&self, default: T) -> T {
        self.value().unwrap_or(default)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    pub fn field(&self) -> Option<&Field<T>> {
        match self {
            Slot::Absent => None,
            Slot::Present(field) => Some(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("fort.10")
    }

    #[test]
    fn fortran_exponent_markers_are_accepted() {
        assert_eq!(parse_fortran_float("1.5D+02"), Some(150.0));
        assert_eq!(parse_fortran_float("-2.0d-1"), Some(-0.2));
        assert_eq!(parse_fortran_float("3.0E0"), Some(3.0));
        assert_eq!(parse_fortran_float("abc"), None);
    }

    #[test]
    fn float_rendering_round_trips_exactly() {
        for value in [1000.0, 0.1, 1.0e-7, 123456.789012345678, -2.5e300] {
            let text = value.render();
            assert_eq!(parse_fortran_float(&text), Some(value), "{text}");
        }
        assert_eq!(1000.0_f64.render(), "1000.0");
    }

    #[test]
    fn parse_rejects_wrong_kind_with_position() {
        let err = Field::<i64>::parse(&path(), Provenance::new(3, 1), "1.5").unwrap_err();
        match err {
            WfError::MalformedRecord { line, token, .. } => {
                assert_eq!((line, token), (3, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn planning_current_value_is_a_no_op() {
        let field = Field::<f64>::parse(&path(), Provenance::new(0, 0), "0.500000000000000").unwrap();
        assert!(field.plan(0.5).is_none());

        let edit = field.plan(0.25).unwrap();
        assert_eq!(edit.expected, "0.500000000000000");
        assert_eq!(edit.replacement, "0.25");
    }

    #[test]
    fn commit_tracks_new_text() {
        let mut field = Field::<i64>::parse(&path(), Provenance::new(2, 3), "0").unwrap();
        let edit = field.plan(1).unwrap();
        field.commit(1, &edit);
        assert_eq!(field.value(), 1);
        assert_eq!(field.text(), "1");
        assert!(field.plan(1).is_none());
    }

    #[test]
    fn absent_slot_falls_back_to_default() {
        let slot: Slot<f64> = Slot::Absent;
        assert!(slot.is_absent());
        assert_eq!(slot.value(), None);
        assert_eq!(slot.value_or(1.0), 1.0);
    }
}
