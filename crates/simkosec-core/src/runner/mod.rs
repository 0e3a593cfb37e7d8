//! Blocking launcher for the external simulator executable.

use crate::common::config::InputArgumentStyle;
use crate::domain::{SimError, SimResult};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub argument: PathBuf,
    pub working_directory: PathBuf,
    pub stdout_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
    argument_style: InputArgumentStyle,
    stdout_path: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            argument_style: InputArgumentStyle::default(),
            stdout_path: None,
        }
    }

    pub fn with_argument_style(mut self, style: InputArgumentStyle) -> Self {
        self.argument_style = style;
        self
    }

    pub fn with_stdout_redirect(mut self, path: Option<PathBuf>) -> Self {
        self.stdout_path = path;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn stdout_path(&self) -> Option<&Path> {
        self.stdout_path.as_deref()
    }

    /// Fails if no executable is configured or the file does not exist.
    pub fn validate(&self) -> SimResult<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(SimError::configuration(
                "CONFIG.EXECUTABLE_EMPTY",
                "no simulator executable is configured",
            ));
        }
        if !self.executable.is_file() {
            return Err(SimError::configuration(
                "CONFIG.EXECUTABLE_MISSING",
                format!(
                    "simulator executable '{}' does not exist",
                    self.executable.display()
                ),
            ));
        }
        Ok(())
    }

    /// Argument naming `input_file` on the simulator's command line.
    pub fn input_argument(&self, input_file: &Path) -> SimResult<PathBuf> {
        let input_file = absolute(input_file)?;
        match self.argument_style {
            InputArgumentStyle::Absolute => Ok(input_file),
            InputArgumentStyle::RelativeToExecutable => {
                let executable = absolute(&self.executable)?;
                let base = executable.parent().unwrap_or_else(|| Path::new("/"));
                Ok(relative_path(base, &input_file))
            }
            InputArgumentStyle::RelativeToWorkingDirectory => Ok(input_file
                .file_name()
                .map(PathBuf::from)
                .unwrap_or(input_file)),
        }
    }

    /// Runs the simulator on `input_file` and waits for it to exit.
    ///
    /// The child runs inside the input file's directory. Its exit status is
    /// reported but not interpreted.
    pub fn run(&self, input_file: &Path) -> SimResult<RunOutcome> {
        self.validate()?;
        // Resolved before `current_dir` changes what a relative path means.
        let executable = absolute(&self.executable)?;

        let working_directory = absolute(input_file)?
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                SimError::configuration(
                    "CONFIG.INPUT_FILE",
                    format!("input file '{}' has no parent directory", input_file.display()),
                )
            })?;
        let argument = self.input_argument(input_file)?;

        let mut command = Command::new(&executable);
        command.current_dir(&working_directory).arg(&argument);

        if let Some(stdout_path) = &self.stdout_path {
            let capture = File::create(stdout_path).map_err(|source| {
                SimError::io_system(
                    "IO.STDOUT_CAPTURE",
                    format!(
                        "failed to create stdout capture '{}': {}",
                        stdout_path.display(),
                        source
                    ),
                )
            })?;
            command.stdout(Stdio::from(capture));
        }

        info!(
            executable = %executable.display(),
            argument = %argument.display(),
            working_directory = %working_directory.display(),
            "starting simulator"
        );
        let status = command.status().map_err(|source| {
            SimError::io_system(
                "IO.PROCESS_SPAWN",
                format!(
                    "failed to execute simulator '{}': {}",
                    executable.display(),
                    source
                ),
            )
        })?;

        if status.success() {
            debug!(exit_code = ?status.code(), "simulator finished");
        } else {
            let status_text = status.code().map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exit code {}", code),
            );
            warn!("simulator finished with {}", status_text);
        }

        Ok(RunOutcome {
            exit_code: status.code(),
            success: status.success(),
            argument,
            working_directory,
            stdout_path: self.stdout_path.clone(),
        })
    }
}

fn absolute(path: &Path) -> SimResult<PathBuf> {
    std::path::absolute(path).map_err(|source| {
        SimError::io_system(
            "IO.PATH_RESOLVE",
            format!("failed to resolve '{}': {}", path.display(), source),
        )
    })
}

/// Path of `target` as seen from directory `base`. Both must be absolute.
/// Falls back to `target` when they share no root.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base_components = normalized_components(base);
    let target_components = normalized_components(target);

    let common = base_components
        .iter()
        .zip(&target_components)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return target.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

fn normalized_components(path: &Path) -> Vec<Component<'_>> {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(components.last(), Some(Component::Normal(_))) =>
            {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::{ProcessRunner, relative_path};
    use crate::common::config::InputArgumentStyle;
    use crate::domain::SimErrorCategory;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn relative_path_walks_up_to_common_ancestor() {
        assert_eq!(
            relative_path(Path::new("/opt/sim/bin"), Path::new("/opt/sim/runs/a/default.par")),
            PathBuf::from("../runs/a/default.par")
        );
        assert_eq!(
            relative_path(Path::new("/data/run"), Path::new("/data/run/default.par")),
            PathBuf::from("default.par")
        );
        assert_eq!(
            relative_path(Path::new("/data/./run/../run"), Path::new("/data/run")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn empty_or_missing_executable_fails_validation() {
        let error = ProcessRunner::new("")
            .validate()
            .expect_err("empty path should fail");
        assert_eq!(error.placeholder(), "CONFIG.EXECUTABLE_EMPTY");

        let temp = TempDir::new().expect("tempdir should be created");
        let input = temp.path().join("default.par");
        let error = ProcessRunner::new(temp.path().join("missing-sim"))
            .run(&input)
            .expect_err("missing executable should fail");
        assert_eq!(error.category(), SimErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.EXECUTABLE_MISSING");
        assert!(!input.exists(), "input file must not be touched");
    }

    #[test]
    fn argument_styles_render_input_path() {
        let runner = ProcessRunner::new("/opt/sim/bin/simkosec");
        assert_eq!(
            runner
                .input_argument(Path::new("/opt/sim/runs/default.par"))
                .expect("relative argument"),
            PathBuf::from("../runs/default.par")
        );

        let runner = runner.with_argument_style(InputArgumentStyle::RelativeToWorkingDirectory);
        assert_eq!(
            runner
                .input_argument(Path::new("/opt/sim/runs/default.par"))
                .expect("file name argument"),
            PathBuf::from("default.par")
        );

        let runner = runner.with_argument_style(InputArgumentStyle::Absolute);
        assert_eq!(
            runner
                .input_argument(Path::new("/opt/sim/runs/default.par"))
                .expect("absolute argument"),
            PathBuf::from("/opt/sim/runs/default.par")
        );
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_stdout_and_reports_exit_code() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir should be created");
        let bin = temp.path().join("bin");
        let work = temp.path().join("work");
        fs::create_dir_all(&bin).expect("bin dir");
        fs::create_dir_all(&work).expect("work dir");

        let script = bin.join("sim.sh");
        fs::write(&script, "#!/bin/sh\necho \"arg=$1\"\npwd\nexit 3\n").expect("script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");

        let input = work.join("default.par");
        fs::write(&input, "  1  NumX0  50 \n").expect("input");
        let capture = work.join("default.par.out");

        let outcome = ProcessRunner::new(&script)
            .with_stdout_redirect(Some(capture.clone()))
            .run(&input)
            .expect("run should succeed even with non-zero exit");

        assert_eq!(outcome.exit_code, Some(3));
        assert!(!outcome.success);
        assert_eq!(outcome.argument, PathBuf::from("../work/default.par"));
        let captured = fs::read_to_string(&capture).expect("capture should exist");
        assert!(captured.contains("arg=../work/default.par"));
        assert!(captured.contains("work"));
    }

    #[cfg(unix)]
    #[test]
    fn relative_executable_resolves_against_process_directory() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir should be created");
        let bin = temp.path().join("bin");
        let work = temp.path().join("work");
        fs::create_dir_all(&bin).expect("bin dir");
        fs::create_dir_all(&work).expect("work dir");

        let script = bin.join("sim.sh");
        fs::write(&script, "#!/bin/sh\ntouch ran.marker\n").expect("script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
        let input = work.join("default.par");
        fs::write(&input, "  1  NumX0  50 \n").expect("input");

        let current = std::env::current_dir().expect("current dir");
        let executable = relative_path(&current, &script);
        assert!(executable.is_relative());

        let outcome = ProcessRunner::new(&executable)
            .run(&input)
            .expect("relative executable should launch from the input directory");

        assert!(outcome.success);
        assert!(work.join("ran.marker").exists());
    }
}
