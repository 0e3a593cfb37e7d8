use crate::domain::{SimError, SimResult};
use std::fs;
use std::path::Path;

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn read_text_artifact(path: &Path, placeholder: &'static str) -> SimResult<String> {
    fs::read_to_string(path).map_err(|source| {
        SimError::io_system(
            placeholder,
            format!("failed to read '{}': {}", path.display(), source),
        )
    })
}

pub fn write_text_artifact(path: &Path, content: &str, placeholder: &'static str) -> SimResult<()> {
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        SimError::io_system(
            placeholder,
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Removes `path` if it exists. Returns whether a file was removed.
pub fn remove_artifact(path: &Path, placeholder: &'static str) -> SimResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SimError::io_system(
            placeholder,
            format!("failed to remove '{}': {}", path.display(), source),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_text_artifact, read_text_artifact, remove_artifact, write_text_artifact};
    use crate::domain::SimErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        let normalized = normalize_text_artifact("alpha\r\nbeta\rgamma");
        assert_eq!(normalized, "alpha\nbeta\ngamma\n");
        assert_eq!(normalize_text_artifact(""), "");
    }

    #[test]
    fn repeated_text_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("default.par");
        let input = "  1  NumX0  50 \r\n  2  NumY0  50 ";

        write_text_artifact(&path, input, "IO.TEST").expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");

        write_text_artifact(&path, input, "IO.TEST").expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"  1  NumX0  50 \n  2  NumY0  50 \n");
    }

    #[test]
    fn missing_files_map_to_io_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = read_text_artifact(&temp.path().join("missing.par"), "IO.TEMPLATE_READ")
            .expect_err("missing file should fail");
        assert_eq!(error.category(), SimErrorCategory::IoSystemError);
        assert_eq!(error.placeholder(), "IO.TEMPLATE_READ");
    }

    #[test]
    fn remove_artifact_tolerates_missing_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("optim.csv");
        assert!(!remove_artifact(&path, "IO.TEST").expect("missing file is fine"));

        fs::write(&path, "1;2\n").expect("seed file");
        assert!(remove_artifact(&path, "IO.TEST").expect("removal should succeed"));
        assert!(!path.exists());
    }
}
