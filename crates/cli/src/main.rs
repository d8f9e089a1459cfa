use std::process::ExitCode;

fn main() -> ExitCode {
    gestibank_cli::run()
}
