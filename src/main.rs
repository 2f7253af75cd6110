use clap::Parser;

use relocate::cli::Cli;
use relocate::commands::execute;

fn main() {
    if let Err(err) = execute(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
