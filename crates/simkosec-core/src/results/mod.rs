//! The simulator's CSV result vector.

use crate::document::format_field_value;
use crate::domain::{SimError, SimResult};
use crate::serialization::remove_artifact;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Result of looking at the output file.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRead {
    Missing,
    Malformed(String),
    Values(Vec<f64>),
}

impl OutputRead {
    pub fn into_values(self) -> Option<Vec<f64>> {
        match self {
            Self::Values(values) => Some(values),
            Self::Missing | Self::Malformed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultFile {
    path: PathBuf,
    separator: u8,
}

impl ResultFile {
    pub fn new(path: impl Into<PathBuf>, separator: u8) -> Self {
        Self {
            path: path.into(),
            separator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Distinguishes a missing file from one that cannot be parsed.
    pub fn inspect(&self) -> OutputRead {
        if !self.exists() {
            return OutputRead::Missing;
        }
        match self.parse() {
            Ok(values) if values.is_empty() => {
                OutputRead::Malformed("output file holds no values".to_string())
            }
            Ok(values) => OutputRead::Values(values),
            Err(reason) => OutputRead::Malformed(reason),
        }
    }

    /// Values in the output file, or `None` when it is missing or malformed.
    pub fn read(&self) -> Option<Vec<f64>> {
        match self.inspect() {
            OutputRead::Malformed(reason) => {
                warn!(
                    path = %self.path.display(),
                    "ignoring malformed simulator output: {}", reason
                );
                None
            }
            other => other.into_values(),
        }
    }

    fn parse(&self) -> Result<Vec<f64>, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.separator)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|source| source.to_string())?;

        let mut values = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| source.to_string())?;
            for field in record.iter().filter(|field| !field.is_empty()) {
                let value = field
                    .parse::<f64>()
                    .map_err(|_| format!("'{}' is not a number", field))?;
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Writes `values` as one separator-joined line, creating parent
    /// directories.
    pub fn write(&self, values: &[f64]) -> SimResult<()> {
        if values.is_empty() {
            return Err(SimError::configuration(
                "CONFIG.OUTPUT_EMPTY",
                "refusing to write an empty output vector",
            ));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                SimError::io_system(
                    "IO.OUTPUT_DIRECTORY",
                    format!("failed to create '{}': {}", parent.display(), source),
                )
            })?;
        }

        let io_error = |source: csv::Error| {
            SimError::io_system(
                "IO.OUTPUT_WRITE",
                format!("failed to write '{}': {}", self.path.display(), source),
            )
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(self.separator)
            .from_path(&self.path)
            .map_err(io_error)?;
        writer
            .write_record(values.iter().map(|value| format_field_value(*value)))
            .map_err(io_error)?;
        writer.flush().map_err(|source| io_error(source.into()))?;
        Ok(())
    }

    pub fn remove(&self) -> SimResult<bool> {
        remove_artifact(&self.path, "IO.OUTPUT_REMOVE")
    }
}
