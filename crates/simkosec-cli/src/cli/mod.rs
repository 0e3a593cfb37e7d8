mod commands;
mod helpers;

use clap::Parser;
use simkosec_core::SimError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let adapter_error = error.as_sim_error();
            eprintln!("{}", adapter_error.diagnostic_line());
            adapter_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("simkosec".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "simkosec",
    version,
    about = "Drive the obstacle-flow simulator through its input and result files"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Write the input file, run the simulator and print its output vector
    Run(commands::ParameterArgs),
    /// Write the input file for a parameter vector without running the simulator
    Prepare(commands::ParameterArgs),
    /// Print the output vector left by the last simulator run
    ReadOutput(commands::ReadOutputArgs),
    /// Snap a parameter vector onto the simulator grid
    Repair(commands::ParameterArgs),
    /// Print the adapter configuration, mapping tables and field catalog
    Dump(commands::AdapterArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Run(args) => commands::run_simulation_command(args),
        CliCommand::Prepare(args) => commands::run_prepare_command(args),
        CliCommand::ReadOutput(args) => commands::run_read_output_command(args),
        CliCommand::Repair(args) => commands::run_repair_command(args),
        CliCommand::Dump(args) => commands::run_dump_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Adapter(#[from] SimError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_sim_error(&self) -> SimError {
        match self {
            Self::Usage(message) => SimError::configuration("CONFIG.CLI_USAGE", message.clone()),
            Self::Adapter(error) => error.clone(),
            Self::Internal(error) => SimError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
