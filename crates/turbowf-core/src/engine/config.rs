use super::memory;
use super::rewrite::Strategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MEMORY_HEADROOM: f64 = 2.0;
pub const DEFAULT_FALLBACK_MEMORY_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Memory headroom must be a finite number >= 1.0, got {0}")]
    InvalidHeadroom(f64),
    #[error("Scratch directory is only meaningful in copy mode")]
    ScratchWithoutCopy,
}

/// Where mutations land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Write through to the opened file.
    #[default]
    InPlace,
    /// Work on a private copy; the opened file is never modified.
    Copy,
}

/// Which physical rewrite the mutation engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteStrategy {
    /// Buffered when the file fits in available memory, streaming otherwise.
    #[default]
    Auto,
    Buffered,
    Streaming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WfConfig {
    pub write_mode: WriteMode,
    pub rewrite_strategy: RewriteStrategy,
    /// Multiplier on the file size that must fit in available memory for
    /// `Auto` to choose the buffered rewrite.
    pub memory_headroom: f64,
    /// Memory assumed available when the platform does not report it.
    pub fallback_memory_bytes: u64,
    /// Directory holding the private copy in [`WriteMode::Copy`].
    pub scratch_dir: Option<PathBuf>,
}

impl Default for WfConfig {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::default(),
            rewrite_strategy: RewriteStrategy::default(),
            memory_headroom: DEFAULT_MEMORY_HEADROOM,
            fallback_memory_bytes: DEFAULT_FALLBACK_MEMORY_BYTES,
            scratch_dir: None,
        }
    }
}

impl WfConfig {
    /// Resolves the strategy for a file of `file_size` bytes.
    pub fn strategy_for(&self, file_size: u64) -> Strategy {
        match self.rewrite_strategy {
            RewriteStrategy::Buffered => Strategy::Buffered,
            RewriteStrategy::Streaming => Strategy::Streaming,
            RewriteStrategy::Auto => {
                let available = memory::available_memory().unwrap_or(self.fallback_memory_bytes);
                choose_strategy(file_size, available, self.memory_headroom)
            }
        }
    }
}

fn choose_strategy(file_size: u64, available: u64, headroom: f64) -> Strategy {
    if (file_size as f64) * headroom <= available as f64 {
        Strategy::Buffered
    } else {
        Strategy::Streaming
    }
}

#[derive(Default)]
pub struct WfConfigBuilder {
    write_mode: Option<WriteMode>,
    rewrite_strategy: Option<RewriteStrategy>,
    memory_headroom: Option<f64>,
    fallback_memory_bytes: Option<u64>,
    scratch_dir: Option<PathBuf>,
}

impl WfConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = Some(mode);
        self
    }
    pub fn rewrite_strategy(mut self, strategy: RewriteStrategy) -> Self {
        self.rewrite_strategy = Some(strategy);
        self
    }
    pub fn memory_headroom(mut self, headroom: f64) -> Self {
        self.memory_headroom = Some(headroom);
        self
    }
    pub fn fallback_memory_bytes(mut self, bytes: u64) -> Self {
        self.fallback_memory_bytes = Some(bytes);
        self
    }
    pub fn scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    pub fn build(self) -> Result<WfConfig, ConfigError> {
        let defaults = WfConfig::default();
        let memory_headroom = self.memory_headroom.unwrap_or(defaults.memory_headroom);
        if !memory_headroom.is_finite() || memory_headroom < 1.0 {
            return Err(ConfigError::InvalidHeadroom(memory_headroom));
        }
        let write_mode = self.write_mode.unwrap_or(defaults.write_mode);
        if self.scratch_dir.is_some() && write_mode != WriteMode::Copy {
            return Err(ConfigError::ScratchWithoutCopy);
        }
        Ok(WfConfig {
            write_mode,
            rewrite_strategy: self.rewrite_strategy.unwrap_or(defaults.rewrite_strategy),
            memory_headroom,
            fallback_memory_bytes: self
                .fallback_memory_bytes
                .unwrap_or(defaults.fallback_memory_bytes),
            scratch_dir: self.scratch_dir,
        })
    }
}
