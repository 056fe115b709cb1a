use std::path::PathBuf;
use thiserror::Error;
use turbowf::engine::config::ConfigError;
use turbowf::engine::error::WfError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Wavefunction(#[from] WfError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_display_unchanged() {
        let err: CliError = WfError::InvalidArgument("mo 7 out of range".into()).into();
        assert!(matches!(err, CliError::Wavefunction(_)));
        assert_eq!(err.to_string(), WfError::InvalidArgument("mo 7 out of range".into()).to_string());
    }

    #[test]
    fn config_errors_are_prefixed() {
        let err: CliError = ConfigError::ScratchWithoutCopy.into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Scratch directory is only meaningful in copy mode"
        );
    }

    #[test]
    fn parse_errors_name_the_file() {
        let source = toml::from_str::<toml::Table>("[engine").unwrap_err();
        let err = CliError::FileParsing {
            path: PathBuf::from("turbowf.toml"),
            source: source.into(),
        };
        assert!(err.to_string().starts_with("Failed to parse file 'turbowf.toml': "));
    }
}
