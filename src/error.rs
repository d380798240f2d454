use std::error::Error as StdError;
use std::time::SystemTimeError;

use crate::source::LoadError;
use crate::SecretParseError;

/// Failures while building a [TOTP](struct.TOTP.html) or computing a code.
#[derive(Debug)]
pub enum GenerateError {
    /// The secret is not valid base32.
    Secret(SecretParseError),
    /// The secret decoded to zero bytes.
    EmptySecret,
    /// Implementations MUST extract a 6-digit code at a minimum and possibly 7 and 8-digit code
    InvalidDigits(usize),
    /// A step of zero seconds has no time window.
    InvalidStep,
    /// The system clock reads earlier than the Unix epoch.
    Clock(SystemTimeError),
}

impl StdError for GenerateError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            GenerateError::Secret(err) => Some(err),
            GenerateError::Clock(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Secret(_) => write!(f, "Secret is not a valid base32 string"),
            GenerateError::EmptySecret => write!(f, "Secret is empty"),
            GenerateError::InvalidDigits(digits) => write!(
                f,
                "Implementations MUST extract a 6-digit code at a minimum and possibly 7 and 8-digit code. {} digits is not allowed",
                digits
            ),
            GenerateError::InvalidStep => write!(f, "Step must be at least one second"),
            GenerateError::Clock(_) => write!(f, "System time is before the Unix epoch"),
        }
    }
}

impl From<SecretParseError> for GenerateError {
    fn from(err: SecretParseError) -> Self {
        GenerateError::Secret(err)
    }
}

impl From<SystemTimeError> for GenerateError {
    fn from(err: SystemTimeError) -> Self {
        GenerateError::Clock(err)
    }
}

/// Every way an invocation can fail. Each one ends the process with status 1.
#[derive(Debug)]
pub enum Error {
    /// The secret source is missing, unreadable, has the wrong mode or holds no secret.
    Load(LoadError),
    /// The code could not be computed from the secret.
    Generate(GenerateError),
    /// The clipboard helper could not be started or fed.
    Clipboard(std::io::Error),
    /// Writing the code stream to the terminal failed.
    Output(std::io::Error),
}

impl Error {
    /// Category name reported to the user ahead of the details.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Load(_) => "ConfigurationError",
            Error::Generate(_) => "GenerationError",
            Error::Clipboard(_) => "ClipboardError",
            Error::Output(_) => "OutputError",
        }
    }

    /// This error's message followed by every message down its source chain.
    pub fn details(&self) -> Vec<String> {
        let mut details = vec![self.to_string()];
        let mut source = StdError::source(self);
        while let Some(err) = source {
            details.push(err.to_string());
            source = err.source();
        }
        details
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Load(err) => err.source(),
            Error::Generate(err) => err.source(),
            Error::Clipboard(err) => Some(err),
            Error::Output(err) => Some(err),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Load(err) => write!(f, "{}", err),
            Error::Generate(err) => write!(f, "{}", err),
            Error::Clipboard(_) => write!(f, "Could not hand the code to the clipboard command"),
            Error::Output(_) => write!(f, "Could not write the code to standard output"),
        }
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Error::Load(err)
    }
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Self {
        Error::Generate(err)
    }
}
