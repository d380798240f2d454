//! Command line surface and the one-shot / continuous flow behind it.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::{debug, info};

use crate::{watch, Algorithm, ClipboardCommand, Error, GenerateError, SecretSource, TOTP};

/// Where the secret is read from when `--file` is not given.
pub const DEFAULT_SECRET_FILE: &str = "~/.otpsecret";

#[derive(Parser, Debug)]
#[command(name = "otpclip", version)]
#[command(about = "Copy the current TOTP code for a locally stored secret to the clipboard")]
pub struct Cli {
    /// Print a fresh code at every step instead of copying one
    #[arg(short, long)]
    pub debug: bool,

    /// Secret file, which must have mode 0400; "-" reads the secret from standard input
    #[arg(short, long, env = "OTPCLIP_FILE", default_value = DEFAULT_SECRET_FILE)]
    pub file: String,

    /// HMAC algorithm: sha1, sha256 or sha512
    #[arg(short, long, default_value_t = Algorithm::SHA1)]
    pub algorithm: Algorithm,

    /// Number of digits in a code, 6 to 8
    #[arg(long, default_value_t = 6)]
    pub digits: usize,

    /// Seconds a code stays valid
    #[arg(long, default_value_t = 30)]
    pub step: u64,

    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,
}

impl Cli {
    /// Loads the secret and builds the generator. Any failure here is fatal.
    pub fn totp(&self) -> Result<TOTP, Error> {
        let source = SecretSource::from_arg(&self.file)?;
        debug!("secret source is {}", source);
        let secret = source.load()?;
        let key = secret.to_bytes().map_err(GenerateError::from)?;
        Ok(TOTP::new(self.algorithm, self.digits, self.step, key)?)
    }
}

/// Runs one invocation and returns the status the process should exit with.
///
/// One-shot mode exits with the clipboard command's own status. Continuous mode only
/// comes back on error.
pub fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let totp = cli.totp()?;
    if cli.debug {
        // Unlocked, so the interrupt handler can still print its newline.
        match watch(&totp, &mut io::stdout())? {}
    }
    let code = totp.generate_current()?;
    let status = ClipboardCommand::discover().copy(&code)?;
    info!("clipboard command finished with {}", status);
    Ok(ExitCode::from(exit_status(status.code())))
}

/// A helper killed by a signal has no code and counts as a failure.
fn exit_status(code: Option<i32>) -> u8 {
    match code.map(u8::try_from) {
        Some(Ok(code)) => code,
        _ => 1,
    }
}
