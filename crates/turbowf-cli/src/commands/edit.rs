use crate::cli::{EditOptions, PatchMatrixArgs, RewriteArgs, SetIoFlagArgs, SetMoArgs};
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use std::path::Path;
use tracing::{info, warn};
use turbowf::core::sections::matrix::EntryPatch;
use turbowf::wavefunction::Fort10;

/// Opens `input`, applies `edit_fn`, and persists the working copy to
/// `--output` when one was requested.
fn with_edit<F>(input: &Path, options: &EditOptions, config: Option<&Path>, edit_fn: F) -> Result<()>
where
    F: FnOnce(&mut Fort10) -> Result<()>,
{
    let config = PartialConfig::load(config)?.merge_with_cli(Some(options))?;
    let mut wf = Fort10::open_with(input, config)?;
    edit_fn(&mut wf)?;
    match &options.output {
        Some(output) => {
            wf.save_as(output)?;
            println!("Wrote {}", output.display());
        }
        None => println!("Updated {}", input.display()),
    }
    Ok(())
}

pub fn set_io_flag(args: SetIoFlagArgs, config: Option<&Path>) -> Result<()> {
    with_edit(&args.input, &args.edit, config, |wf| {
        info!("Setting I/O flag {} -> {}", wf.header().io_flag(), args.value);
        wf.set_io_flag(args.value)?;
        Ok(())
    })
}

pub fn set_mo(args: SetMoArgs, config: Option<&Path>) -> Result<()> {
    with_edit(&args.input, &args.edit, config, |wf| {
        let current = wf
            .mo_coefficients()?
            .get(args.mo)
            .and_then(|mo| mo.get(args.row).copied());
        if let Some(current) = current {
            info!(
                "Setting MO {} row {}: {:?} -> {:?}",
                args.mo, args.row, current, args.value
            );
        }
        wf.set_mo_coefficient(args.mo, args.row, args.value)?;
        Ok(())
    })
}

pub fn patch_matrix(args: PatchMatrixArgs, config: Option<&Path>) -> Result<()> {
    let mut patch = EntryPatch::new();
    if let Some(row) = args.row {
        patch = patch.row(row);
    }
    if let Some(col) = args.col {
        patch = patch.col(col);
    }
    if let Some(real) = args.real {
        patch = patch.real(real);
    }
    if let Some(imag) = args.imag {
        patch = patch.imag(imag);
    }
    if patch == EntryPatch::new() {
        return Err(CliError::Argument(
            "at least one of --row, --col, --real or --imag is required".into(),
        ));
    }
    with_edit(&args.input, &args.edit, config, |wf| {
        wf.patch_matrix_entry(args.matrix.into(), args.index, patch)?;
        Ok(())
    })
}

pub fn rewrite(args: RewriteArgs, config: Option<&Path>) -> Result<()> {
    with_edit(&args.input, &args.edit, config, |wf| {
        let report = wf.write_back()?;
        if report.edits_applied != 0 {
            warn!("Rewrite applied {} edits", report.edits_applied);
        }
        info!("Rewrote file using {:?} strategy", report.strategy);
        Ok(())
    })
}
