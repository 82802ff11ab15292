//! toolrank binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match toolrank_runner::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
