//! wheelpack - bundle Python dependencies for a target platform

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wheelpack_cli::cmd;
use wheelpack_cli::ui::ConsoleReporter;
use wheelpack_cli::{Cli, Commands};
use wheelpack_core::{BundleError, ExitCode};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Pack(args) if cmd::pack::wants_verbose(args));
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code.into(),
        Err(err) => report(&err).into(),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let reporter = ConsoleReporter::new(cli.quiet);

    match cli.command {
        Commands::Pack(args) => {
            cmd::pack::pack(&args, &reporter)?;
            Ok(ExitCode::Success)
        }
        Commands::Inspect { filenames, json } => {
            if cmd::inspect::inspect(&filenames, json)? {
                Ok(ExitCode::Success)
            } else {
                Ok(ExitCode::GeneralError)
            }
        }
        Commands::Layout {
            platform,
            python_version,
            root,
            json,
        } => {
            cmd::layout::layout(&platform, &python_version, &root, json)?;
            Ok(ExitCode::Success)
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(ExitCode::Success)
        }
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    if let Some(bundle) = err.downcast_ref::<BundleError>() {
        eprintln!("ERROR: {bundle}");
        return bundle.exit_code();
    }
    eprintln!("ERROR: {err:#}");
    ExitCode::GeneralError
}
