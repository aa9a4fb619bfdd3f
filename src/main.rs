use clap::Parser;
use echem_processor::cli::{Args, run, setup_logging};
use std::process;

fn main() {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args) {
        eprintln!("Failed to initialise logging: {:#}", error);
        process::exit(1);
    }

    if let Err(error) = run(&args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}
