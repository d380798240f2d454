//! Representation of a secret either a "raw" \[u8\] or "base 32" encoded String
//!
//! Secrets read from a secret file or from standard input are always
//! [`Secret::Encoded`], the form authenticator enrollment pages hand out.
//!
//! ```
//! use otpclip::{Secret, TOTP};
//!
//! let secret = Secret::Encoded("JBSWY3DPEHPK3PXP".to_string());
//! let totp = TOTP::from_secret(&secret).unwrap();
//! assert_eq!(totp.generate(59), "996554");
//! ```

use base32::{self, Alphabet};

use constant_time_eq::constant_time_eq;

/// Different ways secret parsing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretParseError {
    /// Invalid base32 input.
    ParseBase32,
}

impl std::error::Error for SecretParseError {}

impl std::fmt::Display for SecretParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretParseError::ParseBase32 => write!(f, "Could not decode base32 secret."),
        }
    }
}

/// Shared secret between client and server to generate tokens from.
#[derive(Debug, Clone)]
pub enum Secret {
    /// Non-encoded "raw" secret.
    Raw(Vec<u8>),
    /// Base32 encoded secret.
    Encoded(String),
}

impl PartialEq for Secret {
    /// Will check that to_bytes() returns the same.
    /// One secret can be Raw, and the other Encoded.
    /// A secret that fails to decode is never equal to anything.
    fn eq(&self, other: &Self) -> bool {
        match (self.to_bytes(), other.to_bytes()) {
            (Ok(left), Ok(right)) => constant_time_eq(&left, &right),
            _ => false,
        }
    }
}

impl Secret {
    /// Get the inner String value as a Vec of bytes.
    /// Trailing `=` padding on an encoded secret is accepted.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SecretParseError> {
        match self {
            Secret::Raw(s) => Ok(s.to_vec()),
            Secret::Encoded(s) => base32::decode(
                Alphabet::Rfc4648 { padding: false },
                s.trim_end_matches('='),
            )
            .ok_or(SecretParseError::ParseBase32),
        }
    }
}

impl From<String> for Secret {
    fn from(line: String) -> Self {
        Secret::Encoded(line)
    }
}
