//! Generic JSONL (JSON Lines) reader.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::StoreError;

/// Streaming reader for one record per line.
///
/// Blank lines are skipped. Parse failures carry the file and 1-based line.
pub struct JsonlReader<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    _phantom: PhantomData<T>,
}

impl<T: serde::de::DeserializeOwned> JsonlReader<T> {
    /// Open a file for reading JSONL records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let f = File::open(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            lines: BufReader::new(f).lines(),
            line_no: 0,
            _phantom: PhantomData,
        })
    }
}

impl<T: serde::de::DeserializeOwned> Iterator for JsonlReader<T> {
    type Item = Result<T, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(source) => {
                    return Some(Err(StoreError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                line: self.line_no,
                source,
            }));
        }
    }
}

/// Read every record of a JSONL file.
pub fn read_all<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, StoreError> {
    JsonlReader::open(path)?.collect()
}

/// Like [`read_all`], but a missing file is an empty collection.
pub fn read_optional<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<Vec<T>, StoreError> {
    if path.as_ref().exists() {
        read_all(path)
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[test]
    fn test_skips_blank_lines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{\"id\":1}}\n\n   \n{{\"id\":2}}").unwrap();
        let rows: Vec<Row> = read_all(f.path()).unwrap();
        assert_eq!(rows, vec![Row { id: 1 }, Row { id: 2 }]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{\"id\":1}}\n{{\"id\":\"x\"}}").unwrap();
        let err = read_all::<Row>(f.path()).unwrap_err();
        match err {
            StoreError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<Row> = read_optional(dir.path().join("absent.jsonl")).unwrap();
        assert!(rows.is_empty());
    }
}
