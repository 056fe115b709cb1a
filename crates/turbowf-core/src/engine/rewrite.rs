//! The mutation engine.
//!
//! Edits name a token by `(line, token)` and carry the text the caller believes
//! is there. The engine splices each replacement into exactly that token's byte
//! range, leaving separators, line terminators and every other line untouched,
//! then atomically swaps the rewritten file into place.

use crate::core::io::tokens::token_spans;
use crate::core::models::field::Provenance;
use crate::engine::error::{Result, WfError};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Replacement of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEdit {
    pub at: Provenance,
    /// Text the token must currently hold; anything else is a stale write.
    pub expected: String,
    pub replacement: String,
}

/// How the file is physically rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Whole file in memory, one write.
    Buffered,
    /// Line by line into a sibling temporary file.
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    pub strategy: Strategy,
    pub edits_applied: usize,
    pub lines_touched: usize,
}

type LineEdits<'a> = BTreeMap<usize, Vec<&'a TokenEdit>>;

fn group_by_line(edits: &[TokenEdit]) -> Result<LineEdits<'_>> {
    let mut grouped: LineEdits = BTreeMap::new();
    for edit in edits {
        if edit.replacement.is_empty()
            || edit.replacement.bytes().any(|b| b.is_ascii_whitespace())
        {
            return Err(WfError::InvalidArgument(format!(
                "replacement text '{}' must be a single non-empty token",
                edit.replacement
            )));
        }
        grouped.entry(edit.at.line).or_default().push(edit);
    }
    for (line, line_edits) in grouped.iter_mut() {
        line_edits.sort_by_key(|e| e.at.token);
        if line_edits.windows(2).any(|w| w[0].at.token == w[1].at.token) {
            return Err(WfError::InvalidArgument(format!(
                "more than one edit targets the same token on line {}",
                line + 1
            )));
        }
    }
    Ok(grouped)
}

/// Splices `edits` (sorted by token index) into `line`.
fn splice_line(path: &Path, line_no: usize, line: &str, edits: &[&TokenEdit]) -> Result<String> {
    let spans = token_spans(line);
    let mut out = String::with_capacity(line.len() + 16);
    let mut cursor = 0;
    for edit in edits {
        let (start, end) = *spans.get(edit.at.token).ok_or_else(|| {
            WfError::malformed(
                path,
                line_no,
                edit.at.token,
                format!("line has only {} tokens", spans.len()),
            )
        })?;
        let found = &line[start..end];
        if found != edit.expected {
            return Err(WfError::StaleCacheWrite {
                path: path.to_path_buf(),
                line: line_no,
                token: edit.at.token,
                expected: edit.expected.clone(),
                found: found.to_string(),
            });
        }
        out.push_str(&line[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&line[cursor..]);
    Ok(out)
}

fn missing_line_error(path: &Path, grouped: &LineEdits, line_count: usize) -> Option<WfError> {
    grouped
        .range(line_count..)
        .next()
        .map(|(&line, edits)| {
            WfError::malformed(
                path,
                line,
                edits[0].at.token,
                format!("file has only {} lines", line_count),
            )
        })
}

fn sibling_temp(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| WfError::io(dir, e))?;
    let permissions = fs::metadata(path).map_err(|e| WfError::io(path, e))?.permissions();
    fs::set_permissions(tmp.path(), permissions).map_err(|e| WfError::io(tmp.path(), e))?;
    Ok(tmp)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path).map_err(|e| WfError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Applies `edits` to the file at `path` with the given strategy.
///
/// The whole batch is validated before the original file is replaced: if any
/// edit is stale or out of range the file is left exactly as it was. An empty
/// batch still performs a full rewrite pass, which reproduces the file
/// byte-for-byte.
///
/// # Errors
///
/// Returns [`WfError::StaleCacheWrite`] if a token does not hold its expected
/// text, [`WfError::MalformedRecord`] if a line or token does not exist, and
/// [`WfError::InvalidArgument`] for unusable replacement text.
#[instrument(skip_all, name = "rewrite", fields(path = %path.display(), edits = edits.len()))]
pub fn apply_edits(path: &Path, edits: &[TokenEdit], strategy: Strategy) -> Result<RewriteReport> {
    let grouped = group_by_line(edits)?;
    match strategy {
        Strategy::Buffered => rewrite_buffered(path, &grouped)?,
        Strategy::Streaming => rewrite_streaming(path, &grouped)?,
    }
    debug!(
        "Rewrote {} token(s) on {} line(s) using {:?} strategy.",
        edits.len(),
        grouped.len(),
        strategy
    );
    Ok(RewriteReport {
        strategy,
        edits_applied: edits.len(),
        lines_touched: grouped.len(),
    })
}

fn rewrite_buffered(path: &Path, grouped: &LineEdits) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| WfError::io(path, e))?;
    let mut out = String::with_capacity(content.len() + 64 * grouped.len());
    let mut line_count = 0;
    for (line_no, line) in content.split_inclusive('\n').enumerate() {
        match grouped.get(&line_no) {
            Some(line_edits) => out.push_str(&splice_line(path, line_no, line, line_edits)?),
            None => out.push_str(line),
        }
        line_count = line_no + 1;
    }
    if let Some(err) = missing_line_error(path, grouped, line_count) {
        return Err(err);
    }

    let mut tmp = sibling_temp(path)?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(out.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| WfError::io(&tmp_path, e))?;
    persist(tmp, path)
}

fn rewrite_streaming(path: &Path, grouped: &LineEdits) -> Result<()> {
    let file = File::open(path).map_err(|e| WfError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let tmp = sibling_temp(path)?;
    let tmp_path = tmp.path().to_path_buf();
    let mut writer = BufWriter::new(tmp);

    let mut line = String::new();
    let mut line_no = 0;
    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|e| WfError::io(path, e))?;
        if read == 0 {
            break;
        }
        let result = match grouped.get(&line_no) {
            Some(line_edits) => {
                let spliced = splice_line(path, line_no, &line, line_edits)?;
                writer.write_all(spliced.as_bytes())
            }
            None => writer.write_all(line.as_bytes()),
        };
        result.map_err(|e| WfError::io(&tmp_path, e))?;
        line_no += 1;
    }
    if let Some(err) = missing_line_error(path, grouped, line_no) {
        return Err(err);
    }

    let tmp = writer
        .into_inner()
        .map_err(|e| WfError::io(&tmp_path, e.into_error()))?;
    persist(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = " # Det mat. =/0\n          3   1\n  1 1   0.500000000000000\r\n  2  2  -1.25D+00   \nlast line without newline";

    fn edit(line: usize, token: usize, expected: &str, replacement: &str) -> TokenEdit {
        TokenEdit {
            at: Provenance::new(line, token),
            expected: expected.to_string(),
            replacement: replacement.to_string(),
        }
    }

    fn write_sample(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("fort.10");
        fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn empty_batch_reproduces_file_with_both_strategies() {
        let dir = tempdir().unwrap();
        for strategy in [Strategy::Buffered, Strategy::Streaming] {
            let path = write_sample(dir.path());
            let report = apply_edits(&path, &[], strategy).unwrap();
            assert_eq!(report.edits_applied, 0);
            assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        }
    }

    #[test]
    fn edits_change_only_target_token_bytes() {
        let dir = tempdir().unwrap();
        let expected = " # Det mat. =/0\n          3   1\n  1 1   0.75\r\n  2  7  -1.25D+00   \nlast line without newline";
        for strategy in [Strategy::Buffered, Strategy::Streaming] {
            let path = write_sample(dir.path());
            let edits = vec![
                edit(2, 2, "0.500000000000000", "0.75"),
                edit(3, 1, "2", "7"),
            ];
            let report = apply_edits(&path, &edits, strategy).unwrap();
            assert_eq!(report.lines_touched, 2);
            assert_eq!(fs::read_to_string(&path).unwrap(), expected);
        }
    }

    #[test]
    fn strategies_produce_identical_output() {
        let dir = tempdir().unwrap();
        let edits = vec![edit(4, 3, "newline", "tail"), edit(1, 0, "3", "30")];

        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, SAMPLE).unwrap();
        fs::write(&b, SAMPLE).unwrap();
        apply_edits(&a, &edits, Strategy::Buffered).unwrap();
        apply_edits(&b, &edits, Strategy::Streaming).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
        assert!(fs::read_to_string(&a).unwrap().ends_with("without tail"));
    }

    #[test]
    fn stale_token_aborts_without_touching_file() {
        let dir = tempdir().unwrap();
        for strategy in [Strategy::Buffered, Strategy::Streaming] {
            let path = write_sample(dir.path());
            let edits = vec![edit(2, 0, "1", "9"), edit(3, 2, "-1.25", "0.0")];
            let err = apply_edits(&path, &edits, strategy).unwrap_err();
            assert!(matches!(
                err,
                WfError::StaleCacheWrite { line: 3, token: 2, ref found, .. } if found == "-1.25D+00"
            ));
            assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        }
    }

    #[test]
    fn out_of_range_line_and_token_are_malformed() {
        let dir = tempdir().unwrap();
        for strategy in [Strategy::Buffered, Strategy::Streaming] {
            let path = write_sample(dir.path());
            let err = apply_edits(&path, &[edit(99, 0, "x", "y")], strategy).unwrap_err();
            assert!(matches!(err, WfError::MalformedRecord { line: 99, .. }));

            let err = apply_edits(&path, &[edit(1, 5, "x", "y")], strategy).unwrap_err();
            assert!(matches!(err, WfError::MalformedRecord { line: 1, token: 5, .. }));
        }
    }

    #[test]
    fn whitespace_in_replacement_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());
        let err = apply_edits(&path, &[edit(1, 0, "3", "3 4")], Strategy::Buffered).unwrap_err();
        assert!(matches!(err, WfError::InvalidArgument(_)));
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());
        let edits = vec![edit(1, 0, "3", "4"), edit(1, 0, "3", "5")];
        let err = apply_edits(&path, &edits, Strategy::Streaming).unwrap_err();
        assert!(matches!(err, WfError::InvalidArgument(_)));
    }
}
