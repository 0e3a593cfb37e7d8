use super::CliError;
use super::helpers::{format_vector, load_adapter, print_json};
use serde::Serialize;
use simkosec_core::{OutputRead, SimulatorAdapter};
use std::path::PathBuf;
use tracing::debug;

#[derive(clap::Args)]
pub(super) struct AdapterArgs {
    /// Adapter configuration (JSON)
    #[arg(short, long, default_value = "simkosec.json")]
    config: PathBuf,

    /// Console verbosity of the adapter (0 silent .. 3 full dump after each run)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    output_level: Option<u8>,
}

impl AdapterArgs {
    fn load(&self, json: bool) -> Result<SimulatorAdapter, CliError> {
        // Progress lines would corrupt a JSON report on stdout.
        let output_level = if json { Some(0) } else { self.output_level };
        let adapter = load_adapter(&self.config, output_level)?;
        debug!(
            config = %self.config.display(),
            variant = adapter.variant_name(),
            "loaded simulator adapter"
        );
        Ok(adapter)
    }
}

#[derive(clap::Args)]
pub(super) struct ParameterArgs {
    #[command(flatten)]
    adapter: AdapterArgs,

    /// Input parameter vector, comma separated or repeated
    #[arg(
        short = 'p',
        long = "param",
        value_delimiter = ',',
        allow_negative_numbers = true,
        required = true
    )]
    parameters: Vec<f64>,

    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ReadOutputArgs {
    #[command(flatten)]
    adapter: AdapterArgs,

    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    variant: &'static str,
    parameters: Vec<f64>,
    values: Vec<f64>,
    input_file: PathBuf,
    output_file: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrepareReport {
    variant: &'static str,
    parameters: Vec<f64>,
    input_file: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepairReport {
    variant: &'static str,
    corrected: bool,
    parameters: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputReport {
    output_file: PathBuf,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<f64>>,
}

pub(super) fn run_simulation_command(args: ParameterArgs) -> Result<i32, CliError> {
    let adapter = args.adapter.load(args.json)?;
    let values = adapter.calculate_vector_response(&args.parameters)?;

    if args.json {
        print_json(&RunReport {
            variant: adapter.variant_name(),
            parameters: args.parameters,
            values,
            input_file: adapter.input_file_path(),
            output_file: adapter.output_file_path(),
        })?;
    } else {
        println!("{}", format_vector(&values, adapter.config().separator));
    }
    Ok(0)
}

pub(super) fn run_prepare_command(args: ParameterArgs) -> Result<i32, CliError> {
    let adapter = args.adapter.load(args.json)?;
    let input_file = adapter.prepare_input(&args.parameters)?;

    if args.json {
        print_json(&PrepareReport {
            variant: adapter.variant_name(),
            parameters: args.parameters,
            input_file,
        })?;
    } else {
        println!("{}", input_file.display());
    }
    Ok(0)
}

pub(super) fn run_repair_command(args: ParameterArgs) -> Result<i32, CliError> {
    let adapter = args.adapter.load(args.json)?;
    let mut parameters = args.parameters;
    let corrected = adapter.repair_parameters(&mut parameters)?;

    if args.json {
        print_json(&RepairReport {
            variant: adapter.variant_name(),
            corrected,
            parameters,
        })?;
    } else {
        println!("{}", format_vector(&parameters, adapter.config().separator));
        if corrected {
            eprintln!("parameters were moved onto the simulator grid");
        }
    }
    Ok(0)
}

/// Exits with 1 when the output file is missing or unreadable.
pub(super) fn run_read_output_command(args: ReadOutputArgs) -> Result<i32, CliError> {
    let adapter = args.adapter.load(args.json)?;
    let output_file = adapter.output_file_path();

    let (status, reason, values) = match adapter.inspect_output_values() {
        OutputRead::Values(values) => ("ok", None, Some(values)),
        OutputRead::Missing => ("missing", None, None),
        OutputRead::Malformed(reason) => ("malformed", Some(reason), None),
    };
    let exit_code = if values.is_some() { 0 } else { 1 };

    if args.json {
        print_json(&OutputReport {
            output_file,
            status,
            reason,
            values,
        })?;
        return Ok(exit_code);
    }

    match (&values, &reason) {
        (Some(values), _) => println!("{}", format_vector(values, adapter.config().separator)),
        (None, Some(reason)) => eprintln!(
            "output file '{}' is malformed: {}",
            output_file.display(),
            reason
        ),
        (None, None) => eprintln!("no output file at '{}'", output_file.display()),
    }
    Ok(exit_code)
}

pub(super) fn run_dump_command(args: AdapterArgs) -> Result<i32, CliError> {
    let adapter = args.load(false)?;
    adapter.write_to_console();
    Ok(0)
}
