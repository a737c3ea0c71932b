use std::process::ExitCode;

fn main() -> ExitCode {
    goscript::cli::run()
}
