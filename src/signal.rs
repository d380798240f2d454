//! Ctrl+C handling: end the line the terminal is on and exit with the conventional status.

/// Exit status after an interrupt, 128 + SIGINT.
pub const INTERRUPTED: i32 = 130;

/// Installs the interrupt handler for the rest of the process.
pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        println!();
        std::process::exit(INTERRUPTED);
    })
}
