//! Corpus ingestion: source units read from disk.
//!
//! One unreadable file never blocks the rest; failures are collected as
//! [`IngestionFailure`] records and carried into the report.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One source file: relative path plus raw text. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// File name without directories or extension.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }
}

/// A file or directory entry that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionFailure {
    pub path: String,
    pub message: String,
}

/// Every unit of one run plus the files that failed to load.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub units: Vec<SourceUnit>,
    pub failures: Vec<IngestionFailure>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from in-memory units, sorted by path.
    pub fn from_units(units: Vec<SourceUnit>) -> Self {
        let mut corpus = Self {
            units,
            failures: Vec::new(),
        };
        corpus.sort();
        corpus
    }

    /// Read `files` in parallel. Paths are stored relative to `root`.
    pub fn load(root: &Path, files: &[PathBuf]) -> Self {
        let results: Vec<Result<SourceUnit, IngestionFailure>> = files
            .par_iter()
            .map(|file| {
                let path = relative_path(file, root);
                match std::fs::read_to_string(file) {
                    Ok(text) => Ok(SourceUnit::new(path, text)),
                    Err(e) => Err(IngestionFailure {
                        path,
                        message: e.to_string(),
                    }),
                }
            })
            .collect();

        let mut corpus = Corpus::new();
        for result in results {
            match result {
                Ok(unit) => corpus.units.push(unit),
                Err(failure) => {
                    warn!(path = %failure.path, error = %failure.message, "failed to read source file");
                    corpus.failures.push(failure);
                }
            }
        }
        corpus.sort();
        debug!(
            units = corpus.units.len(),
            failures = corpus.failures.len(),
            "corpus loaded"
        );
        corpus
    }

    /// Record a failure that happened before reading (e.g. a directory walk error).
    pub fn add_failure(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.failures.push(IngestionFailure {
            path: path.into(),
            message: message.into(),
        });
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }

    fn sort(&mut self) {
        self.units.sort_by(|a, b| a.path.cmp(&b.path));
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// `file` relative to `root` with forward slashes.
///
/// A single-file scan (file == root) keeps just the file name.
pub fn relative_path(file: &Path, root: &Path) -> String {
    if file == root {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string_lossy().to_string());
    }

    file.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file.to_string_lossy().replace('\\', "/"))
}
