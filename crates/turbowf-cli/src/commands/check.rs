use super::open_for_reading;
use crate::cli::CheckArgs;
use crate::error::Result;
use std::path::Path;
use tracing::info;

pub fn run(args: CheckArgs, config: Option<&Path>) -> Result<()> {
    let mut wf = open_for_reading(&args.input, config)?;
    info!("Checking every section of {:?}", args.input);
    let report = wf.check()?;

    println!("{}: consistent", args.input.display());
    println!("  ansatz               {}", report.ansatz);
    println!("  atoms                {}", report.natom);
    println!("  force classes        {}", report.force_classes);
    println!("  two-body parameters  {}", report.twobody_parameters);
    println!(
        "  determinant basis    {} shells, {} primitives, {} MOs, {} hybrids",
        report.det_shells, report.det_primitives, report.molecular_orbitals, report.hybrid_orbitals
    );
    println!(
        "  Jastrow basis        {} shells, {} primitives",
        report.jas_shells, report.jas_primitives
    );
    println!(
        "  matrices             {} determinant, {} Jastrow entries",
        report.det_nonzero, report.jas_nonzero
    );
    println!(
        "  matrix constraints   {} determinant, {} Jastrow pairs",
        report.det_matrix_constraints, report.jas_matrix_constraints
    );
    println!(
        "  basis constraints    {} determinant, {} Jastrow members",
        report.det_basis_constraints, report.jas_basis_constraints
    );
    Ok(())
}
