use std::process::ExitCode;

fn main() -> ExitCode {
    shredbox::cli::run()
}
