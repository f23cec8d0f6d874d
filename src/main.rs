use clap::Parser;
use std::process;
use test_instruments::cli::{args::Args, commands};
use test_instruments::error::InstrumentError;

fn main() {
    let args = Args::parse();

    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(InstrumentError::Interrupted {
                    reason: "generation interrupted by user".to_string(),
                }
                .into())
            }
        }
    });

    match result {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("testinst - synthetic test instrument generator");
    println!("==============================================");
    println!();
    println!("Generate deterministic satellite, profile, imager and model data sets");
    println!("for exercising data-loading pipelines.");
    println!();
    println!("USAGE:");
    println!("    testinst <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    list        List the instruments and their tags");
    println!("    files       List the fake file names for a date range");
    println!("    describe    Generate a data set and describe its variables");
    println!("    generate    Write Parquet fixtures");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Describe one day of the profile instrument:");
    println!("    testinst describe pysat_testing2d");
    println!();
    println!("    # Write every tag of the scalar instruments for a week:");
    println!("    testinst generate -i testing,testing_xarray --all-tags \\");
    println!("                      --start 2009-01-01 --end 2009-01-08 --per-day");
    println!();
    println!("For detailed help on any command, use:");
    println!("    testinst <COMMAND> --help");
}
