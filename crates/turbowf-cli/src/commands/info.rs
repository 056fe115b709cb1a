use super::open_for_reading;
use crate::cli::InfoArgs;
use crate::error::Result;
use std::path::Path;
use tracing::info;

pub fn run(args: InfoArgs, config: Option<&Path>) -> Result<()> {
    let mut wf = open_for_reading(&args.input, config)?;
    info!("Inspecting {:?}", args.input);

    let header = wf.header().clone();
    println!("File:            {}", args.input.display());
    println!(
        "Electrons:       {} ({} up, {} down)",
        header.nel(),
        header.nelup(),
        header.neldn()
    );
    println!("Atoms:           {}", header.natom());
    println!(
        "Shells:          {} determinant, {} Jastrow",
        header.shell_det(),
        header.shell_jas()
    );
    println!(
        "Non-zero:        {} determinant, {} Jastrow",
        header.nnz_det(),
        header.nnz_jas()
    );
    println!("I/O flag:        {}", header.io_flag());
    println!(
        "Periodic:        {}{}",
        wf.periodic(),
        if wf.ortho_flag() { " (orthorhombic)" } else { "" }
    );
    if let Some(lattice) = wf.lattice() {
        for (i, row) in lattice.row_iter().enumerate() {
            println!("  a{}:            {:>14.8} {:>14.8} {:>14.8}", i + 1, row[0], row[1], row[2]);
        }
    }
    println!("Complex:         {}", wf.complex_flag());
    println!("Pseudopotential: {}", wf.pseudopotential_present()?);
    println!("Contracted:      {}", wf.contracted()?);
    println!("Ansatz:          {}", wf.ansatz()?);

    if args.atoms {
        let labels = wf.basis_labels()?;
        let structure = wf.structure()?;
        println!("\n{:>4} {:>4} {:>5} {:>8} {:>14} {:>14} {:>14}", "#", "Z", "slot", "valence", "x", "y", "z");
        for (i, (atom, (z, slot))) in structure.atoms().iter().zip(labels).enumerate() {
            let p = atom.position();
            println!(
                "{:>4} {:>4} {:>5} {:>8.3} {:>14.8} {:>14.8} {:>14.8}",
                i + 1,
                z,
                slot,
                atom.valence(),
                p.x,
                p.y,
                p.z
            );
        }
    }
    Ok(())
}
