use crate::cli::EditOptions;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use turbowf::engine::config::{RewriteStrategy, WfConfig, WfConfigBuilder, WriteMode};

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct PartialEngineConfig {
    #[serde(rename = "write-mode")]
    write_mode: Option<WriteMode>,
    #[serde(rename = "rewrite-strategy")]
    rewrite_strategy: Option<RewriteStrategy>,
    #[serde(rename = "memory-headroom")]
    memory_headroom: Option<f64>,
    #[serde(rename = "fallback-memory-bytes")]
    fallback_memory_bytes: Option<u64>,
    #[serde(rename = "scratch-dir")]
    scratch_dir: Option<PathBuf>,
}

/// Contents of a `turbowf` TOML configuration file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    engine: Option<PartialEngineConfig>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `path` when given, otherwise an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Builds the engine configuration: command-line flags first, then the file,
    /// then library defaults.
    pub fn merge_with_cli(self, edit: Option<&EditOptions>) -> Result<WfConfig> {
        let engine = self.engine.unwrap_or_default();
        let mut builder = WfConfigBuilder::new();

        let write_mode = match edit.and_then(|e| e.output.as_ref()) {
            Some(_) => Some(WriteMode::Copy),
            None => engine.write_mode,
        };
        if let Some(mode) = write_mode {
            builder = builder.write_mode(mode);
        }
        let strategy = edit
            .and_then(|e| e.strategy)
            .map(RewriteStrategy::from)
            .or(engine.rewrite_strategy);
        if let Some(strategy) = strategy {
            builder = builder.rewrite_strategy(strategy);
        }
        if let Some(headroom) = engine.memory_headroom {
            builder = builder.memory_headroom(headroom);
        }
        if let Some(bytes) = engine.fallback_memory_bytes {
            builder = builder.fallback_memory_bytes(bytes);
        }
        if let Some(dir) = engine.scratch_dir {
            builder = builder.scratch_dir(dir);
        }

        let config = builder.build()?;
        debug!("Resolved engine configuration: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StrategyArg;
    use tempfile::tempdir;

    const FULL: &str = r#"
[engine]
write-mode = "copy"
rewrite-strategy = "streaming"
memory-headroom = 3.5
fallback-memory-bytes = 1048576
scratch-dir = "/var/tmp"
"#;

    #[test]
    fn full_engine_table_is_applied() {
        let config = PartialConfig::from_toml(FULL).unwrap().merge_with_cli(None).unwrap();
        assert_eq!(config.write_mode, WriteMode::Copy);
        assert_eq!(config.rewrite_strategy, RewriteStrategy::Streaming);
        assert_eq!(config.memory_headroom, 3.5);
        assert_eq!(config.fallback_memory_bytes, 1_048_576);
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    fn missing_file_and_flags_give_library_defaults() {
        let config = PartialConfig::load(None).unwrap().merge_with_cli(None).unwrap();
        assert_eq!(config, WfConfig::default());
    }

    #[test]
    fn command_line_overrides_file() {
        let file = PartialConfig::from_toml("[engine]\nrewrite-strategy = \"buffered\"\n").unwrap();
        let edit = EditOptions {
            output: Some(PathBuf::from("out.10")),
            strategy: Some(StrategyArg::Streaming),
        };
        let config = file.merge_with_cli(Some(&edit)).unwrap();
        assert_eq!(config.write_mode, WriteMode::Copy);
        assert_eq!(config.rewrite_strategy, RewriteStrategy::Streaming);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PartialConfig::from_toml("[engine]\nheadroom = 2.0\n").is_err());
        assert!(PartialConfig::from_toml("[network]\n").is_err());
    }

    #[test]
    fn invalid_values_surface_as_config_errors() {
        let file = PartialConfig::from_toml("[engine]\nmemory-headroom = 0.5\n").unwrap();
        assert!(matches!(file.merge_with_cli(None), Err(CliError::Config(_))));

        let file = PartialConfig::from_toml("[engine]\nscratch-dir = \"/tmp\"\n").unwrap();
        assert!(matches!(file.merge_with_cli(None), Err(CliError::Config(_))));
    }

    #[test]
    fn unparsable_file_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("turbowf.toml");
        std::fs::write(&path, "[engine\n").unwrap();
        let err = PartialConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { path: p, .. } if p == path));
    }
}
