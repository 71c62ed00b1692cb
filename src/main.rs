use clap::Parser;
use weightbt::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
