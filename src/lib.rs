//! This library reads a shared secret from a locked-down local file, computes the current TOTP code
//! for it and hands the code to the system clipboard or prints it continuously for debugging.
//!
//! Codes follow [rfc-6238](https://tools.ietf.org/html/rfc6238): a 30 second step and 6 digits by
//! default, `SHA1` unless another algorithm is asked for.
//!
//! # Examples
//!
//! ```rust
//! use otpclip::{Algorithm, Secret, TOTP};
//!
//! let secret = Secret::Encoded("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string());
//! let totp = TOTP::new(Algorithm::SHA1, 8, 30, secret.to_bytes().unwrap()).unwrap();
//! assert_eq!(totp.generate(59), "94287082");
//! ```
//!
//! ```rust,no_run
//! use otpclip::{ClipboardCommand, SecretSource, TOTP};
//!
//! let secret = SecretSource::from_arg("~/.otpsecret").unwrap().load().unwrap();
//! let code = TOTP::from_secret(&secret).unwrap().generate_current().unwrap();
//! let status = ClipboardCommand::discover().copy(&code).unwrap();
//! assert!(status.success());
//! ```

mod clipboard;
mod error;
mod secret;
mod source;
mod watch;

pub mod cli;
pub mod signal;

pub use clipboard::{ClipboardCommand, Platform};
pub use error::{Error, GenerateError};
pub use secret::{Secret, SecretParseError};
pub use source::{first_secret_line, symbolic_mode, LoadError, SecretSource, REQUIRED_MODE};
pub use watch::{watch, CodeWatch};

use constant_time_eq::constant_time_eq;

use core::fmt;
use std::str::FromStr;

use hmac::Mac;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = hmac::Hmac<sha1::Sha1>;
type HmacSha256 = hmac::Hmac<sha2::Sha256>;
type HmacSha512 = hmac::Hmac<sha2::Sha512>;

/// Algorithm enum holds the three standards algorithms for TOTP as per the [reference implementation](https://tools.ietf.org/html/rfc6238#appendix-A)
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Algorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::SHA1 => f.write_str("SHA1"),
            Algorithm::SHA256 => f.write_str("SHA256"),
            Algorithm::SHA512 => f.write_str("SHA512"),
        }
    }
}

/// Name given for an algorithm is not one of SHA1, SHA256 or SHA512.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlgorithm(pub String);

impl std::error::Error for UnknownAlgorithm {}

impl fmt::Display for UnknownAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Algorithm can only be SHA1, SHA256 or SHA512, not \"{}\"",
            self.0
        )
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA1" => Ok(Algorithm::SHA1),
            "SHA256" => Ok(Algorithm::SHA256),
            "SHA512" => Ok(Algorithm::SHA512),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

impl Algorithm {
    fn hash<D>(mut digest: D, data: &[u8]) -> Vec<u8>
    where
        D: Mac,
    {
        digest.update(data);
        digest.finalize().into_bytes().to_vec()
    }

    fn sign(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        const ANY_KEY: &str = "HMAC can take key of any size";
        match self {
            Algorithm::SHA1 => Algorithm::hash(HmacSha1::new_from_slice(key).expect(ANY_KEY), data),
            Algorithm::SHA256 => {
                Algorithm::hash(HmacSha256::new_from_slice(key).expect(ANY_KEY), data)
            }
            Algorithm::SHA512 => {
                Algorithm::hash(HmacSha512::new_from_slice(key).expect(ANY_KEY), data)
            }
        }
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, GenerateError> {
    let t = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(t)
}

/// TOTP holds informations as to how to generate an auth code. Its [secret](struct.TOTP.html#structfield.secret) field is sensitive data, treat it accordingly
#[derive(Debug, Clone)]
pub struct TOTP<T = Vec<u8>> {
    /// SHA-1 is the most widespread algorithm used, and for totp pursposes, SHA-1 hash collisions are [not a problem](https://tools.ietf.org/html/rfc4226#appendix-B.2) as HMAC-SHA-1 is not impacted.
    pub algorithm: Algorithm,
    /// The number of digits composing the auth code. Per [rfc-4226](https://tools.ietf.org/html/rfc4226#section-5.3), this can oscilate between 6 and 8 digits
    pub digits: usize,
    /// Duration in seconds of a step. The recommended value per [rfc-6238](https://tools.ietf.org/html/rfc6238#section-5.2) is 30 seconds
    pub step: u64,
    /// non-encoded value
    pub secret: T,
}

impl<T: AsRef<[u8]>> PartialEq for TOTP<T> {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && self.digits == other.digits
            && self.step == other.step
            && constant_time_eq(self.secret.as_ref(), other.secret.as_ref())
    }
}

impl<T> fmt::Display for TOTP<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "digits: {}; step: {}; alg: {}",
            self.digits, self.step, self.algorithm,
        )
    }
}

impl TOTP {
    /// `SHA1`, 6 digits and a 30 second step over a decoded [Secret](enum.Secret.html).
    ///
    /// # Errors
    ///
    /// Fails when the secret is not valid base32 or decodes to nothing.
    pub fn from_secret(secret: &Secret) -> Result<TOTP, GenerateError> {
        TOTP::new(Algorithm::SHA1, 6, 30, secret.to_bytes()?)
    }
}

impl<T: AsRef<[u8]>> TOTP<T> {
    /// Will create a new instance of TOTP with given parameters.
    ///
    /// * `digits`: MUST be between 6 & 8
    /// * `step`: at least one second
    /// * `secret`: non-encoded and non-empty, to pass in base32 string use `Secret::Encoded(String)`
    pub fn new(
        algorithm: Algorithm,
        digits: usize,
        step: u64,
        secret: T,
    ) -> Result<TOTP<T>, GenerateError> {
        if !(6..=8).contains(&digits) {
            return Err(GenerateError::InvalidDigits(digits));
        }
        if step == 0 {
            return Err(GenerateError::InvalidStep);
        }
        if secret.as_ref().is_empty() {
            return Err(GenerateError::EmptySecret);
        }
        Ok(TOTP {
            algorithm,
            digits,
            step,
            secret,
        })
    }

    /// Will sign the given timestamp
    pub fn sign(&self, time: u64) -> Vec<u8> {
        self.algorithm.sign(
            self.secret.as_ref(),
            (time / self.step).to_be_bytes().as_ref(),
        )
    }

    /// Will generate a token given the provided timestamp in seconds
    pub fn generate(&self, time: u64) -> String {
        let result: &[u8] = &self.sign(time);
        // Every digest is at least 20 bytes, so offset + 4 stays in bounds.
        let offset = (result[result.len() - 1] & 15) as usize;
        let result = u32::from_be_bytes([
            result[offset],
            result[offset + 1],
            result[offset + 2],
            result[offset + 3],
        ]) & 0x7fff_ffff;
        format!(
            "{1:00$}",
            self.digits,
            result % 10_u32.pow(self.digits as u32)
        )
    }

    /// Index of the step the timestamp falls into
    pub fn step_index(&self, time: u64) -> u64 {
        time / self.step
    }

    /// Returns the timestamp of the first second for the next step
    /// given the provided timestamp in seconds
    pub fn next_step(&self, time: u64) -> u64 {
        (self.step_index(time) + 1) * self.step
    }

    /// Seconds left before the token for the given timestamp expires
    pub fn ttl_at(&self, time: u64) -> u64 {
        self.step - (time % self.step)
    }

    /// Give the ttl (in seconds) of the current token
    pub fn ttl(&self) -> Result<u64, GenerateError> {
        Ok(self.ttl_at(unix_now()?))
    }

    /// Generate a token from the current system time
    pub fn generate_current(&self) -> Result<String, GenerateError> {
        Ok(self.generate(unix_now()?))
    }
}
