use std::process::ExitCode;

fn main() -> ExitCode {
    scenematch::cli::run()
}
