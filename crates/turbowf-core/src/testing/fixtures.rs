/// Open-boundary H2 molecule: real coefficients, two molecular orbitals.
pub const MOLECULE: &str = include_str!("../../fixtures/molecule.10");

/// Tilted periodic carbon crystal: complex coefficients, no molecular orbitals.
pub const CRYSTAL: &str = include_str!("../../fixtures/crystal.10");

/// Orthorhombic periodic preamble (`PBC_C`) followed by a minimal header.
pub const ORTHORHOMBIC_HEAD: &str = include_str!("../../fixtures/orthorhombic_head.10");

/// Full `PBC_C` record for one hydrogen atom: complex coefficients and a single
/// molecular orbital over two s shells.
pub const ORTHORHOMBIC_CELL: &str = include_str!("../../fixtures/orthorhombic_cell.10");
