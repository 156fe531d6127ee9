use std::process::ExitCode;

fn main() -> ExitCode {
    smorti_cli::run()
}
