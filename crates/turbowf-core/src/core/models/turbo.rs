//! Angular-momentum/contraction codes ("turbo notation") used in basis records.

use phf::{Map, phf_map};
use std::fmt;

/// Code tagging a molecular-orbital shell.
pub const MOLECULAR_ORBITAL_CODE: i64 = 1_000_000;
/// Code tagging a hybrid-orbital shell.
pub const HYBRID_ORBITAL_CODE: i64 = 900_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AngularMomentum {
    S,
    P,
    D,
    F,
    G,
    H,
    I,
}

impl AngularMomentum {
    pub fn l(self) -> u32 {
        self as u32
    }

    /// Number of spherical components, `2l + 1`.
    pub fn components(self) -> u32 {
        2 * self.l() + 1
    }
}

impl fmt::Display for AngularMomentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            AngularMomentum::S => "s",
            AngularMomentum::P => "p",
            AngularMomentum::D => "d",
            AngularMomentum::F => "f",
            AngularMomentum::G => "g",
            AngularMomentum::H => "h",
            AngularMomentum::I => "i",
        };
        f.write_str(symbol)
    }
}

/// What a shell's code says about its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCode {
    Uncontracted(AngularMomentum),
    Contracted(AngularMomentum),
    MolecularOrbital,
    Hybrid,
}

static UNCONTRACTED: Map<i32, AngularMomentum> = phf_map! {
    16i32 => AngularMomentum::S,
    36i32 => AngularMomentum::P,
    37i32 => AngularMomentum::D,
    48i32 => AngularMomentum::F,
    51i32 => AngularMomentum::G,
    72i32 => AngularMomentum::H,
    73i32 => AngularMomentum::I,
};

static CONTRACTED: Map<i32, AngularMomentum> = phf_map! {
    300i32 => AngularMomentum::S,
    400i32 => AngularMomentum::P,
    500i32 => AngularMomentum::D,
    600i32 => AngularMomentum::F,
    700i32 => AngularMomentum::G,
    800i32 => AngularMomentum::H,
    900i32 => AngularMomentum::I,
};

impl ShellCode {
    pub fn decode(code: i64) -> Option<Self> {
        match code {
            MOLECULAR_ORBITAL_CODE => return Some(ShellCode::MolecularOrbital),
            HYBRID_ORBITAL_CODE => return Some(ShellCode::Hybrid),
            _ => {}
        }
        let key = i32::try_from(code).ok()?;
        UNCONTRACTED
            .get(&key)
            .map(|&l| ShellCode::Uncontracted(l))
            .or_else(|| CONTRACTED.get(&key).map(|&l| ShellCode::Contracted(l)))
    }

    pub fn angular_momentum(self) -> Option<AngularMomentum> {
        match self {
            ShellCode::Uncontracted(l) | ShellCode::Contracted(l) => Some(l),
            ShellCode::MolecularOrbital | ShellCode::Hybrid => None,
        }
    }

    pub fn is_contracted(self) -> bool {
        matches!(self, ShellCode::Contracted(_))
    }
}
