//! Geometry: the periodic cell preamble and the `Ion coordinates` section.

use super::count_mismatch;
use super::header::Periodicity;
use crate::core::io::locator::Section;
use crate::core::io::tokens::TokenStream;
use crate::core::models::field::Field;
use crate::engine::error::Result;
use nalgebra::{Matrix3, Point3, Vector3};
use std::f64::consts::PI;
use std::path::Path;

type Triple = [Field<f64>; 3];

fn triple(stream: &mut TokenStream, what: &str) -> Result<Triple> {
    Ok([
        stream.next_field(what)?,
        stream.next_field(what)?,
        stream.next_field(what)?,
    ])
}

fn vector(t: &Triple) -> Vector3<f64> {
    Vector3::new(t[0].value(), t[1].value(), t[2].value())
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellShape {
    /// Density parameter plus `Ly/Lx` and `Lz/Lx` aspect ratios.
    Orthorhombic {
        rs: Field<f64>,
        ly_lx: Field<f64>,
        lz_lx: Field<f64>,
    },
    /// Lattice vectors stored verbatim.
    Tilted { a1: Triple, a2: Triple, a3: Triple },
}

/// Periodic simulation cell and the twist phases for each spin channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    shape: CellShape,
    phase_up: Triple,
    phase_dn: Triple,
}

impl Cell {
    /// Parses the preamble lines that precede the header.
    pub(crate) fn parse(path: &Path, lines: &[String], periodicity: Periodicity) -> Result<Option<Self>> {
        let h = periodicity.preamble_lines();
        if h == 0 {
            return Ok(None);
        }
        let body = lines.get(1..h).unwrap_or_default();
        let mut stream = TokenStream::new(path, 1, body);
        let shape = match periodicity {
            Periodicity::Orthorhombic => CellShape::Orthorhombic {
                rs: stream.next_field("rs")?,
                ly_lx: stream.next_field("Ly/Lx")?,
                lz_lx: stream.next_field("Lz/Lx")?,
            },
            _ => CellShape::Tilted {
                a1: triple(&mut stream, "lattice vector a1")?,
                a2: triple(&mut stream, "lattice vector a2")?,
                a3: triple(&mut stream, "lattice vector a3")?,
            },
        };
        let cell = Cell {
            shape,
            phase_up: triple(&mut stream, "up-spin phase")?,
            phase_dn: triple(&mut stream, "down-spin phase")?,
        };
        stream.finish("cell")?;
        Ok(Some(cell))
    }

    pub fn shape(&self) -> &CellShape {
        &self.shape
    }

    pub fn is_orthorhombic(&self) -> bool {
        matches!(self.shape, CellShape::Orthorhombic { .. })
    }

    /// Lattice vectors as matrix rows.
    ///
    /// For the orthorhombic encoding the box volume is `4/3 π rs³ nel`, so the
    /// electron count is needed to recover absolute lengths.
    pub fn lattice(&self, nel: usize) -> Matrix3<f64> {
        match &self.shape {
            CellShape::Tilted { a1, a2, a3 } => {
                Matrix3::from_rows(&[vector(a1).transpose(), vector(a2).transpose(), vector(a3).transpose()])
            }
            CellShape::Orthorhombic { rs, ly_lx, lz_lx } => {
                let volume = 4.0 / 3.0 * PI * rs.value().powi(3) * nel as f64;
                let lx = (volume / (ly_lx.value() * lz_lx.value())).cbrt();
                Matrix3::from_diagonal(&Vector3::new(
                    lx,
                    lx * ly_lx.value(),
                    lx * lz_lx.value(),
                ))
            }
        }
    }

    pub fn phase_up(&self) -> Vector3<f64> {
        vector(&self.phase_up)
    }

    pub fn phase_dn(&self) -> Vector3<f64> {
        vector(&self.phase_dn)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    valence: Field<f64>,
    atomic_number: Field<f64>,
    position: Triple,
}

impl AtomRecord {
    pub fn valence(&self) -> f64 {
        self.valence.value()
    }

    /// Atomic number as stored, including any basis-disambiguation shift.
    pub fn atomic_number(&self) -> f64 {
        self.atomic_number.value()
    }

    pub fn position(&self) -> Point3<f64> {
        Point3::from(vector(&self.position))
    }
}

/// Parsed `Ion coordinates` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    atoms: Vec<AtomRecord>,
}

impl Structure {
    pub(crate) fn parse(stream: &mut TokenStream, natom: usize) -> Result<Self> {
        let available = stream.remaining();
        match natom.checked_mul(5) {
            Some(expected) if expected == available => {}
            expected => {
                return Err(count_mismatch(
                    stream.path(),
                    Section::IonCoordinates,
                    expected.unwrap_or(usize::MAX),
                    available,
                ));
            }
        }
        let atoms = (0..natom)
            .map(|_| {
                Ok(AtomRecord {
                    valence: stream.next_field("valence charge")?,
                    atomic_number: stream.next_field("atomic number")?,
                    position: triple(stream, "position")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { atoms })
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    pub fn natom(&self) -> usize {
        self.atoms.len()
    }

    pub fn atomic_numbers(&self) -> Vec<f64> {
        self.atoms.iter().map(AtomRecord::atomic_number).collect()
    }

    pub fn valences(&self) -> Vec<f64> {
        self.atoms.iter().map(AtomRecord::valence).collect()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(AtomRecord::position).collect()
    }
}
