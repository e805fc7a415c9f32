use std::process::ExitCode;

fn main() -> ExitCode {
    match transplant_cli::run_cli() {
        Ok(code) => code,
        Err(e) => {
            transplant_logger::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
