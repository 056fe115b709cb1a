pub mod check;
pub mod edit;
pub mod info;

use crate::config::PartialConfig;
use crate::error::Result;
use std::path::Path;
use turbowf::wavefunction::Fort10;

/// Opens `input` read-only with the engine settings from the config file.
pub(crate) fn open_for_reading(input: &Path, config: Option<&Path>) -> Result<Fort10> {
    let config = PartialConfig::load(config)?.merge_with_cli(None)?;
    Ok(Fort10::open_with(input, config)?)
}
