use super::CliError;
use anyhow::Context;
use simkosec_core::{AdapterConfig, SimError, SimResult, SimulatorAdapter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the stderr subscriber. `RUST_LOG` wins over the `-v` count.
pub(super) fn init_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second install (tests calling `run` repeatedly) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub(super) fn current_working_dir() -> SimResult<PathBuf> {
    std::env::current_dir().map_err(|source| {
        SimError::io_system(
            "IO.CLI_CURRENT_DIR",
            format!("failed to read current working directory: {}", source),
        )
    })
}

pub(super) fn resolve_cli_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

pub(super) fn load_config(path: &Path, output_level: Option<u8>) -> Result<AdapterConfig, CliError> {
    let working_dir = current_working_dir()?;
    let path = resolve_cli_path(&working_dir, path);
    let mut config = AdapterConfig::from_json_path(&path)?;
    if let Some(level) = output_level {
        config.output_level = level;
    }
    Ok(config)
}

pub(super) fn load_adapter(path: &Path, output_level: Option<u8>) -> Result<SimulatorAdapter, CliError> {
    let config = load_config(path, output_level)?;
    Ok(SimulatorAdapter::new(config)?)
}

pub(super) fn format_vector(values: &[f64], separator: char) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

pub(super) fn print_json<T: serde::Serialize>(report: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(report).context("failed to render JSON report")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{format_vector, resolve_cli_path};
    use std::path::{Path, PathBuf};

    #[test]
    fn cli_paths_resolve_against_working_dir() {
        assert_eq!(
            resolve_cli_path(Path::new("/runs"), Path::new("simkosec.json")),
            PathBuf::from("/runs/simkosec.json")
        );
        assert_eq!(
            resolve_cli_path(Path::new("/runs"), Path::new("/etc/simkosec.json")),
            PathBuf::from("/etc/simkosec.json")
        );
    }

    #[test]
    fn vectors_render_with_configured_separator() {
        assert_eq!(format_vector(&[0.2, 1.0, -3.5], ';'), "0.2;1;-3.5");
        assert_eq!(format_vector(&[], ','), "");
    }
}
