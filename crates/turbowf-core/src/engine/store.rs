use super::config::{WfConfig, WriteMode};
use super::error::{Result, WfError};
use super::rewrite::{self, RewriteReport, TokenEdit};
use crate::core::io::locator::{self, LineRange, Section};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::{debug, info};

#[derive(Debug)]
struct PrivateCopy {
    path: PathBuf,
    _dir: TempDir,
}

/// The physical file a [`Fort10`](crate::wavefunction::Fort10) reads from and
/// writes to.
///
/// In [`WriteMode::Copy`] reads go to the source until the first write, which
/// copies it into a scratch directory; from then on every read and write goes
/// to the copy.
#[derive(Debug)]
pub struct WfStore {
    source: PathBuf,
    config: WfConfig,
    copy: OnceLock<PrivateCopy>,
}

impl WfStore {
    pub fn open(path: &Path, config: WfConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(WfError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a regular file"),
            ));
        }
        Ok(Self {
            source: path.to_path_buf(),
            config,
            copy: OnceLock::new(),
        })
    }

    /// The file the caller opened.
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// The file currently read from; the private copy once one exists.
    pub fn path(&self) -> &Path {
        self.copy.get().map_or(&self.source, |copy| &copy.path)
    }

    /// Whether copy mode has made its private copy yet.
    pub fn has_private_copy(&self) -> bool {
        self.copy.get().is_some()
    }

    fn make_copy(&self) -> Result<PrivateCopy> {
        let dir = match &self.config.scratch_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| WfError::io(dir, e))?;
                TempDir::new_in(dir).map_err(|e| WfError::io(dir, e))?
            }
            None => TempDir::new().map_err(|e| WfError::io(std::env::temp_dir(), e))?,
        };
        let file_name = self.source.file_name().unwrap_or_else(|| "fort.10".as_ref());
        let path = dir.path().join(file_name);
        fs::copy(&self.source, &path).map_err(|e| WfError::io(&path, e))?;
        info!("Working on private copy {:?} of {:?}", &path, &self.source);
        Ok(PrivateCopy { path, _dir: dir })
    }

    /// The file writes go to, copying the source first in copy mode.
    fn writable(&self) -> Result<&Path> {
        match self.config.write_mode {
            WriteMode::InPlace => Ok(&self.source),
            WriteMode::Copy => {
                if let Some(copy) = self.copy.get() {
                    return Ok(&copy.path);
                }
                let copy = self.make_copy()?;
                Ok(&self.copy.get_or_init(|| copy).path)
            }
        }
    }

    pub fn config(&self) -> &WfConfig {
        &self.config
    }

    fn reader(&self) -> Result<BufReader<File>> {
        let path = self.path();
        let file = File::open(path).map_err(|e| WfError::io(path, e))?;
        Ok(BufReader::new(file))
    }

    /// Reads the physical lines in `range`, line terminators included.
    pub fn read_lines(&self, range: LineRange) -> Result<Vec<String>> {
        let mut reader = self.reader()?;
        let mut lines = Vec::with_capacity(range.len());
        let mut buf = String::new();
        let mut line_no = 0;
        while line_no < range.end {
            buf.clear();
            let read = reader
                .read_line(&mut buf)
                .map_err(|e| WfError::io(self.path(), e))?;
            if read == 0 {
                return Err(WfError::malformed(
                    self.path(),
                    line_no,
                    0,
                    format!("file ended before line {}", range.end),
                ));
            }
            if line_no >= range.start {
                lines.push(buf.clone());
            }
            line_no += 1;
        }
        Ok(lines)
    }

    /// Reads the first `count` lines, or fewer if the file is shorter.
    pub fn read_head(&self, count: usize) -> Result<Vec<String>> {
        let reader = self.reader()?;
        reader
            .lines()
            .take(count)
            .map(|line| line.map_err(|e| WfError::io(self.path(), e)))
            .collect()
    }

    pub fn locate(&self, section: Section) -> Result<LineRange> {
        locator::locate_section(self.reader()?, self.path(), section)
    }

    /// Writes `edits` through to the working file.
    pub fn apply(&self, edits: &[TokenEdit]) -> Result<RewriteReport> {
        let target = self.writable()?;
        let size = fs::metadata(target).map_err(|e| WfError::io(target, e))?.len();
        let strategy = self.config.strategy_for(size);
        debug!("Applying {} edit(s) to a {} byte file.", edits.len(), size);
        rewrite::apply_edits(target, edits, strategy)
    }

    /// Copies the working file to `dest`.
    pub fn save_as(&self, dest: &Path) -> Result<()> {
        fs::copy(self.path(), dest).map_err(|e| WfError::io(dest, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::WfConfigBuilder;
    use crate::core::models::field::Provenance;
    use tempfile::tempdir;

    fn edit_line_one(store: &WfStore) {
        let edit = TokenEdit {
            at: Provenance::new(1, 1),
            expected: "2".into(),
            replacement: "3".into(),
        };
        store.apply(&[edit]).unwrap();
    }

    #[test]
    fn copy_mode_never_touches_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fort.10");
        fs::write(&path, "a 1\nb 2\n").unwrap();

        let config = WfConfigBuilder::new().write_mode(WriteMode::Copy).build().unwrap();
        let store = WfStore::open(&path, config).unwrap();
        edit_line_one(&store);
        assert_ne!(store.path(), store.source_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a 1\nb 2\n");
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "a 1\nb 3\n");
    }

    #[test]
    fn copy_mode_defers_the_copy_until_first_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fort.10");
        fs::write(&path, "a 1\nb 2\n").unwrap();
        let scratch = dir.path().join("scratch");

        let config = WfConfigBuilder::new()
            .write_mode(WriteMode::Copy)
            .scratch_dir(scratch.clone())
            .build()
            .unwrap();
        let store = WfStore::open(&path, config).unwrap();
        assert_eq!(store.read_head(2).unwrap(), vec!["a 1", "b 2"]);
        store.locate(Section::IonCoordinates).unwrap_err();
        assert!(!store.has_private_copy());
        assert_eq!(store.path(), path.as_path());
        assert!(!scratch.exists());

        edit_line_one(&store);
        assert!(store.has_private_copy());
        assert!(store.path().starts_with(&scratch));
        let copy = store.path().to_path_buf();

        let edit = TokenEdit {
            at: Provenance::new(0, 1),
            expected: "1".into(),
            replacement: "4".into(),
        };
        store.apply(&[edit]).unwrap();
        assert_eq!(store.path(), copy.as_path());
        assert_eq!(fs::read_to_string(&copy).unwrap(), "a 4\nb 3\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "a 1\nb 2\n");
    }

    #[test]
    fn in_place_mode_writes_the_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fort.10");
        fs::write(&path, "a 1\nb 2\n").unwrap();
        let store = WfStore::open(&path, WfConfig::default()).unwrap();
        edit_line_one(&store);
        assert!(!store.has_private_copy());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a 1\nb 3\n");
    }

    #[test]
    fn read_lines_returns_requested_window() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fort.10");
        fs::write(&path, "l0\nl1\nl2\nl3\n").unwrap();
        let store = WfStore::open(&path, WfConfig::default()).unwrap();

        let lines = store.read_lines(LineRange { start: 1, end: 3 }).unwrap();
        assert_eq!(lines, vec!["l1\n".to_string(), "l2\n".to_string()]);

        let err = store.read_lines(LineRange { start: 2, end: 9 }).unwrap_err();
        assert!(matches!(err, WfError::MalformedRecord { line: 4, .. }));
    }

    #[test]
    fn opening_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = WfStore::open(&dir.path().join("nope"), WfConfig::default()).unwrap_err();
        assert!(matches!(err, WfError::Io { .. }));
    }
}
