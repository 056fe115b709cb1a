//! Atomic-number shifts that tell basis sets apart.
//!
//! The record file identifies which basis set an atom uses only by an exact
//! match on its atomic-number field. When two atoms of the same element must
//! carry different basis sets, the second set is tagged by writing `Z + 0.01`,
//! the third `Z + 0.02`, and so on. The shift is a format-level label, not a
//! physical quantity: [`element_of`] recovers the element and [`basis_slot`]
//! the tag.

use crate::engine::error::{Result, WfError};
use std::collections::HashMap;
use std::hash::Hash;

const SHIFT: f64 = 0.01;
/// Distinct basis sets that fit below the next integer.
pub const MAX_SLOTS: usize = 100;

/// Assigns `Z + 0.01·k` to every `(Z, basis)` pair, where `k` counts the
/// distinct basis sets already seen for element `Z` (the first gets `k = 0`).
pub fn shift_atomic_numbers<B: Eq + Hash>(atoms: &[(u32, B)]) -> Result<Vec<f64>> {
    let mut slots: HashMap<u32, HashMap<&B, usize>> = HashMap::new();
    atoms
        .iter()
        .map(|(z, basis)| {
            let seen = slots.entry(*z).or_default();
            let next = seen.len();
            let k = *seen.entry(basis).or_insert(next);
            if k >= MAX_SLOTS {
                return Err(WfError::InvalidArgument(format!(
                    "element {} uses more than {} distinct basis sets",
                    z, MAX_SLOTS
                )));
            }
            Ok(*z as f64 + SHIFT * k as f64)
        })
        .collect()
}

/// The element encoded in a (possibly shifted) atomic number.
pub fn element_of(atomic_number: f64) -> u32 {
    atomic_number.trunc() as u32
}

/// The basis-set tag `k` encoded in a shifted atomic number.
pub fn basis_slot(atomic_number: f64) -> usize {
    (atomic_number.fract() / SHIFT).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_basis_per_element_is_unshifted() {
        let atoms = [(6, "cc-pvdz"), (1, "cc-pvdz"), (6, "cc-pvtz"), (6, "cc-pvdz"), (1, "sto-3g")];
        let shifted = shift_atomic_numbers(&atoms).unwrap();
        assert_eq!(shifted, vec![6.0, 1.0, 6.01, 6.0, 1.01]);
    }

    #[test]
    fn shifted_numbers_decode_back() {
        let atoms = [(8, 'a'), (8, 'b'), (8, 'c')];
        let shifted = shift_atomic_numbers(&atoms).unwrap();
        let decoded: Vec<(u32, usize)> = shifted.iter().map(|&z| (element_of(z), basis_slot(z))).collect();
        assert_eq!(decoded, vec![(8, 0), (8, 1), (8, 2)]);
    }

    #[test]
    fn too_many_basis_sets_for_one_element_is_rejected() {
        let atoms: Vec<(u32, usize)> = (0..=MAX_SLOTS).map(|k| (1, k)).collect();
        assert!(shift_atomic_numbers(&atoms).is_err());
    }
}
