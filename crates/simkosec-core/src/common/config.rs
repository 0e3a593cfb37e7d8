//! Adapter configuration: file locations, simulator executable, CSV
//! separator and the simulator variant.

use crate::domain::{SimError, SimResult};
use crate::variants::VariantKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE_FILE_NAME: &str = "template.par";
pub const DEFAULT_INPUT_FILE_NAME: &str = "default.par";
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "optim.csv";
pub const DEFAULT_SEPARATOR: char = ';';
pub const STDOUT_SUFFIX: &str = ".out";

/// How the single command-line argument naming the input file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputArgumentStyle {
    #[default]
    RelativeToExecutable,
    RelativeToWorkingDirectory,
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterConfig {
    /// Directory holding the template and the generated input file.
    pub working_directory: PathBuf,
    pub template_file_name: String,
    pub input_file_name: String,
    /// Root of the simulator's result tree. Defaults to `working_directory`.
    pub output_directory: Option<PathBuf>,
    pub output_file_name: String,
    pub executable_path: PathBuf,
    pub input_argument: InputArgumentStyle,
    pub redirect_stdout: bool,
    pub stdout_path: Option<PathBuf>,
    pub separator: char,
    pub output_level: u8,
    pub variant: VariantKind,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("."),
            template_file_name: DEFAULT_TEMPLATE_FILE_NAME.to_string(),
            input_file_name: DEFAULT_INPUT_FILE_NAME.to_string(),
            output_directory: None,
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            executable_path: PathBuf::new(),
            input_argument: InputArgumentStyle::default(),
            redirect_stdout: false,
            stdout_path: None,
            separator: DEFAULT_SEPARATOR,
            output_level: 0,
            variant: VariantKind::default(),
        }
    }
}

impl AdapterConfig {
    pub fn new(working_directory: impl Into<PathBuf>, executable_path: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            executable_path: executable_path.into(),
            ..Self::default()
        }
    }

    /// Loads a JSON config. Relative paths inside it are resolved against the
    /// directory containing the file.
    pub fn from_json_path(path: &Path) -> SimResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            SimError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read config '{}': {}", path.display(), source),
            )
        })?;
        let config = Self::from_json_str(&content).map_err(|error| {
            SimError::configuration(
                error.placeholder(),
                format!("{} in '{}'", error.message(), path.display()),
            )
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_relative_to(base))
    }

    pub fn from_json_str(content: &str) -> SimResult<Self> {
        serde_json::from_str(content).map_err(|source| {
            SimError::configuration(
                "CONFIG.PARSE",
                format!("failed to parse adapter config: {}", source),
            )
        })
    }

    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        self.working_directory = resolve_path(base, &self.working_directory);
        self.output_directory = self
            .output_directory
            .map(|path| resolve_path(base, &path));
        if !self.executable_path.as_os_str().is_empty() {
            self.executable_path = resolve_path(base, &self.executable_path);
        }
        self.stdout_path = self.stdout_path.map(|path| resolve_path(base, &path));
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.working_directory.is_dir() {
            return Err(SimError::configuration(
                "CONFIG.WORKING_DIRECTORY",
                format!(
                    "working directory '{}' does not exist",
                    self.working_directory.display()
                ),
            ));
        }

        if let Some(output_directory) = &self.output_directory
            && !output_directory.is_dir()
        {
            return Err(SimError::configuration(
                "CONFIG.OUTPUT_DIRECTORY",
                format!(
                    "output directory '{}' does not exist",
                    output_directory.display()
                ),
            ));
        }

        for (label, value) in [
            ("template file name", &self.template_file_name),
            ("input file name", &self.input_file_name),
            ("output file name", &self.output_file_name),
        ] {
            if value.trim().is_empty() {
                return Err(SimError::configuration(
                    "CONFIG.FILE_NAME",
                    format!("{} must not be empty", label),
                ));
            }
        }

        self.separator_byte().map(|_| ())
    }

    pub fn separator_byte(&self) -> SimResult<u8> {
        if self.separator.is_ascii() && !matches!(self.separator, '\n' | '\r' | '"') {
            Ok(self.separator as u8)
        } else {
            Err(SimError::configuration(
                "CONFIG.SEPARATOR",
                format!(
                    "CSV separator {:?} must be a single ASCII character",
                    self.separator
                ),
            ))
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.working_directory.join(&self.template_file_name)
    }

    pub fn input_file_path(&self) -> PathBuf {
        self.working_directory.join(&self.input_file_name)
    }

    pub fn output_root(&self) -> &Path {
        self.output_directory
            .as_deref()
            .unwrap_or(&self.working_directory)
    }

    /// `<output root>/<input file stem>/<output file name>`.
    pub fn output_file_path(&self) -> PathBuf {
        let stem = Path::new(&self.input_file_name)
            .file_stem()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&self.input_file_name));
        self.output_root().join(stem).join(&self.output_file_name)
    }

    /// Capture file for the simulator's stdout, when redirection is enabled.
    pub fn stdout_file_path(&self) -> Option<PathBuf> {
        if !self.redirect_stdout {
            return None;
        }
        Some(self.stdout_path.clone().unwrap_or_else(|| {
            let mut path = self.input_file_path().into_os_string();
            path.push(STDOUT_SUFFIX);
            PathBuf::from(path)
        }))
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
