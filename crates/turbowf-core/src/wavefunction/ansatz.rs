use crate::core::io::locator::Section;
use crate::core::sections::count_mismatch;
use crate::core::sections::header::Header;
use crate::engine::error::Result;
use std::fmt;
use std::path::Path;

/// Functional form of the determinant part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsatzKind {
    /// One molecular orbital per up-spin electron.
    SingleDeterminant,
    /// Geminal built from more molecular orbitals than up-spin electrons.
    AgpConstrained,
    /// Geminal expanded directly on atomic orbitals, no molecular-orbital block.
    AgpUnconstrained,
    Pfaffian,
}

impl AnsatzKind {
    pub fn label(self) -> &'static str {
        match self {
            AnsatzKind::SingleDeterminant => "sd",
            AnsatzKind::AgpConstrained => "agps",
            AnsatzKind::AgpUnconstrained => "agpu",
            AnsatzKind::Pfaffian => "pf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    Paired,
    Unpaired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JastrowKind {
    None,
    SpinIndependent,
    SpinDependent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ansatz {
    pub kind: AnsatzKind,
    pub pairing: Pairing,
    pub jastrow: JastrowKind,
    pub complex: bool,
}

impl fmt::Display for Ansatz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.label())?;
        if self.pairing == Pairing::Unpaired {
            f.write_str(" (unpaired)")?;
        }
        if self.complex {
            f.write_str(", complex")?;
        }
        match self.jastrow {
            JastrowKind::None => f.write_str(", no Jastrow"),
            JastrowKind::SpinIndependent => f.write_str(", Jastrow"),
            JastrowKind::SpinDependent => f.write_str(", spin-dependent Jastrow"),
        }
    }
}

/// Classifies the ansatz from the header and the number of molecular orbitals.
///
/// | condition | kind |
/// |---|---|
/// | `nel < 0` | Pfaffian |
/// | no molecular orbitals | AGP unconstrained |
/// | `n_mo == nelup` | single determinant |
/// | `n_mo > nelup` | AGP constrained |
///
/// Fewer molecular orbitals than up-spin electrons cannot describe the state and
/// is reported as a count mismatch against the determinant basis.
pub fn classify(path: &Path, header: &Header, n_mo: usize) -> Result<Ansatz> {
    let kind = if header.pfaffian() {
        AnsatzKind::Pfaffian
    } else if n_mo == 0 {
        AnsatzKind::AgpUnconstrained
    } else if n_mo == header.nelup() {
        AnsatzKind::SingleDeterminant
    } else if n_mo > header.nelup() {
        AnsatzKind::AgpConstrained
    } else {
        return Err(count_mismatch(path, Section::DetBasis, header.nelup(), n_mo));
    };
    let pairing = if header.nelup() == header.neldn() {
        Pairing::Paired
    } else {
        Pairing::Unpaired
    };
    let jastrow = if header.shell_jas() == 0 {
        JastrowKind::None
    } else if header.jastrow_spin_dependent() {
        JastrowKind::SpinDependent
    } else {
        JastrowKind::SpinIndependent
    };
    Ok(Ansatz {
        kind,
        pairing,
        jastrow,
        complex: header.complex(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::WfConfig;
    use crate::engine::error::WfError;
    use crate::engine::store::WfStore;
    use crate::testing::{fixtures, write_fixture};
    use tempfile::tempdir;

    fn header(text: &str) -> Header {
        let dir = tempdir().unwrap();
        let path = write_fixture(dir.path(), text);
        let store = WfStore::open(&path, WfConfig::default()).unwrap();
        Header::read(&store).unwrap()
    }

    #[test]
    fn molecule_with_extra_orbitals_is_constrained_agp() {
        let h = header(fixtures::MOLECULE);
        let ansatz = classify(Path::new("f"), &h, 2).unwrap();
        assert_eq!(ansatz.kind, AnsatzKind::AgpConstrained);
        assert_eq!(ansatz.pairing, Pairing::Paired);
        assert_eq!(ansatz.jastrow, JastrowKind::SpinIndependent);
        assert!(!ansatz.complex);
        assert_eq!(ansatz.to_string(), "agps, Jastrow");
    }

    #[test]
    fn orbital_count_decides_between_sd_and_agp() {
        let h = header(fixtures::MOLECULE);
        assert_eq!(classify(Path::new("f"), &h, 1).unwrap().kind, AnsatzKind::SingleDeterminant);
        assert_eq!(classify(Path::new("f"), &h, 0).unwrap().kind, AnsatzKind::AgpUnconstrained);
    }

    #[test]
    fn too_few_orbitals_is_count_mismatch() {
        let text = fixtures::MOLECULE.replacen(
            "          1           2           2\n",
            "          2           4           2\n",
            1,
        );
        let h = header(&text);
        let err = classify(Path::new("f"), &h, 1).unwrap_err();
        assert!(matches!(err, WfError::CountMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn sign_flags_feed_the_classification() {
        let text = fixtures::MOLECULE
            .replacen("          1           2           2\n", "          1          -3           2\n", 1)
            .replacen("          5           2\n", "          5          -2\n", 1);
        let ansatz = classify(Path::new("f"), &header(&text), 2).unwrap();
        assert_eq!(ansatz.kind, AnsatzKind::Pfaffian);
        assert_eq!(ansatz.pairing, Pairing::Unpaired);
        assert_eq!(ansatz.jastrow, JastrowKind::SpinDependent);
    }

    #[test]
    fn crystal_is_complex_unconstrained_agp() {
        let ansatz = classify(Path::new("f"), &header(fixtures::CRYSTAL), 0).unwrap();
        assert_eq!(ansatz.kind, AnsatzKind::AgpUnconstrained);
        assert!(ansatz.complex);
        assert_eq!(ansatz.to_string(), "agpu, complex, Jastrow");
    }
}
