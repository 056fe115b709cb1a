//! # Wavefunction Module
//!
//! The public entry point. [`Fort10`] owns the working file, reads the header
//! eagerly, and exposes every other section lazily together with the derived
//! properties callers usually want: periodicity, complex coefficients, contraction,
//! pseudopotentials and the [`Ansatz`](ansatz::Ansatz).
//!
//! - **Facade** ([`Fort10`]) - section accessors and write-through setters
//! - **Classification** ([`ansatz`]) - the ansatz decision table
//! - **Basis labels** ([`labels`]) - the `Z + 0.01·k` atomic-number shift

pub mod ansatz;
mod fort10;
pub mod labels;

pub use fort10::{CheckReport, Fort10, MatrixKind};
