use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use turbowf::engine::config::RewriteStrategy;
use turbowf::wavefunction::MatrixKind;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "turbowf - inspect and edit TurboRVB wavefunction record files (fort.10) in place.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a configuration file in TOML format with an [engine] table.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the header, derived flags and ansatz of a wavefunction file.
    Info(InfoArgs),
    /// Read every section once and verify all count invariants.
    Check(CheckArgs),
    /// Set the header I/O flag.
    SetIoFlag(SetIoFlagArgs),
    /// Set one molecular-orbital coefficient.
    SetMo(SetMoArgs),
    /// Change the row, column or value of one determinant or Jastrow matrix entry.
    PatchMatrix(PatchMatrixArgs),
    /// Rewrite the file without changing any value.
    Rewrite(RewriteArgs),
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the wavefunction file.
    #[arg(required = true, value_name = "FILE")]
    pub input: PathBuf,

    /// Also print the atoms and the shifted-label decoding of each atomic number.
    #[arg(long)]
    pub atoms: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the wavefunction file.
    #[arg(required = true, value_name = "FILE")]
    pub input: PathBuf,
}

/// Options shared by every editing subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct EditOptions {
    /// Leave the input untouched and write the edited file here instead.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override `engine.rewrite-strategy` from the config file.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<StrategyArg>,
}

#[derive(Args, Debug)]
pub struct SetIoFlagArgs {
    #[arg(required = true, value_name = "FILE")]
    pub input: PathBuf,

    #[arg(required = true, allow_negative_numbers = true, value_name = "INT")]
    pub value: i64,

    #[command(flatten)]
    pub edit: EditOptions,
}

#[derive(Args, Debug)]
pub struct SetMoArgs {
    #[arg(required = true, value_name = "FILE")]
    pub input: PathBuf,

    /// Zero-based molecular-orbital index.
    #[arg(long, value_name = "INT")]
    pub mo: usize,

    /// Zero-based coefficient row within the orbital.
    #[arg(long, value_name = "INT")]
    pub row: usize,

    #[arg(long, allow_negative_numbers = true, value_name = "FLOAT")]
    pub value: f64,

    #[command(flatten)]
    pub edit: EditOptions,
}

#[derive(Args, Debug)]
pub struct PatchMatrixArgs {
    #[arg(required = true, value_name = "FILE")]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = MatrixArg::Det)]
    pub matrix: MatrixArg,

    /// Zero-based entry index.
    #[arg(long, value_name = "INT")]
    pub index: usize,

    #[arg(long, value_name = "INT")]
    pub row: Option<i64>,

    #[arg(long, value_name = "INT")]
    pub col: Option<i64>,

    #[arg(long, allow_negative_numbers = true, value_name = "FLOAT")]
    pub real: Option<f64>,

    #[arg(long, allow_negative_numbers = true, value_name = "FLOAT")]
    pub imag: Option<f64>,

    #[command(flatten)]
    pub edit: EditOptions,
}

#[derive(Args, Debug)]
pub struct RewriteArgs {
    #[arg(required = true, value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub edit: EditOptions,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Auto,
    Buffered,
    Streaming,
}

impl From<StrategyArg> for RewriteStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => RewriteStrategy::Auto,
            StrategyArg::Buffered => RewriteStrategy::Buffered,
            StrategyArg::Streaming => RewriteStrategy::Streaming,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixArg {
    Det,
    Jas,
}

impl From<MatrixArg> for MatrixKind {
    fn from(arg: MatrixArg) -> Self {
        match arg {
            MatrixArg::Det => MatrixKind::Determinant,
            MatrixArg::Jas => MatrixKind::Jastrow,
        }
    }
}
