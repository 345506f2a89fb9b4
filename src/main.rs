use clap::Parser;
use orbscan::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
