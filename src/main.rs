use env_logger::Env;
use std::process::ExitCode;

/// Exit status for errors that stop the run before or while listing.
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match lister::app::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ls: {:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
