//! Conform CLI: run WebAssembly conformance test cases
//!
//! ## Usage
//!
//! ```bash
//! conform run arith --dir cases/arith           # text module, fs host
//! conform run arith --dir cases/arith --host shell
//! conform wat2wasm cases/arith/arith.wat        # writes arith.wasm
//! conform features                              # show the feature set
//! ```

use clap::Parser;
use conform_cli::{
    handlers::{execute_features, execute_run, execute_wat2wasm},
    init_logging, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, Reporter,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(&config);

    let reporter = Reporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
        config.verbosity.is_verbose(),
    );

    match cli.command {
        Commands::Run(args) => {
            let report = runtime()?.block_on(execute_run(&args))?;
            reporter.report(&args.test, &report);
            Ok(())
        }
        Commands::Wat2wasm(args) => {
            let (output, size) = runtime()?.block_on(execute_wat2wasm(&args))?;
            reporter.success(&format!("wrote {} ({size} bytes)", output.display()));
            Ok(())
        }
        Commands::Features => {
            execute_features();
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create runtime: {e}")))
}
