use std::process::ExitCode;

use clap::Parser;
use log::warn;

use otpclip::cli::{self, Cli};
use otpclip::signal;

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    if let Err(err) = signal::install() {
        warn!("could not install the interrupt handler: {}", err);
    }

    match cli::run(&cli) {
        Ok(code) => code,
        Err(err) => {
            let kind = err.kind();
            for detail in err.details() {
                eprintln!("{}: {}", kind, detail);
            }
            ExitCode::FAILURE
        }
    }
}
