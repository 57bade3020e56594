use reactor_ops::{cli, config::Config, setup_logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse command line arguments
    let args = cli::parse_args();

    // Setup logging based on debug flag
    if let Err(e) = setup_logging(args.debug) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    // Initialize configuration
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Execute the appropriate command, mapping structured failures to the
    // documented exit codes
    match cli::execute_command(&config, &args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(cli::exit_code_for(&e))
        }
    }
}
