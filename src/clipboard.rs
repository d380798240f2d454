use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

use log::{debug, info};

use crate::Error;

/// The operating system family, as far as clipboard helpers are concerned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Platform {
    MacOs,
    /// Linux and the BSDs, where an X11 clipboard tool may be installed.
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Platform {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Platform::Linux
        } else {
            Platform::Other
        }
    }
}

/// An external program that takes text on standard input and puts it on the clipboard.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClipboardCommand {
    pub program: String,
    pub args: Vec<String>,
}

fn find_in_path(program: &str) -> bool {
    match which::which(program) {
        Ok(path) => {
            debug!("found {} at {}", program, path.display());
            true
        }
        Err(_) => false,
    }
}

impl ClipboardCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Echoes its input back, used when no clipboard tool is known.
    pub fn passthrough() -> Self {
        Self::new("cat", &[])
    }

    /// Clipboard command for the running system, looked up on `PATH`.
    pub fn discover() -> Self {
        Self::discover_for(Platform::current(), find_in_path)
    }

    /// Clipboard command for `platform`, where `available` tells whether a program can be run.
    ///
    /// - macOS: `pbcopy`
    /// - Linux: `xclip -selection clipboard`, else `xsel --clipboard --input`
    /// - otherwise, or when neither Linux tool is installed: `cat`
    pub fn discover_for(platform: Platform, available: impl Fn(&str) -> bool) -> Self {
        let command = match platform {
            Platform::MacOs => Some(Self::new("pbcopy", &[])),
            Platform::Linux => [
                Self::new("xclip", &["-selection", "clipboard"]),
                Self::new("xsel", &["--clipboard", "--input"]),
            ]
            .into_iter()
            .find(|candidate| available(candidate.program.as_str())),
            Platform::Other => None,
        };
        command.unwrap_or_else(Self::passthrough)
    }

    /// Writes `text` and a newline to the command's standard input, then waits for it.
    ///
    /// There is no timeout: a helper that never exits blocks the caller forever.
    pub fn copy(&self, text: &str) -> Result<ExitStatus, Error> {
        info!("copying code with {}", self);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(Error::Clipboard)?;
        // Taking stdin out of the child closes the pipe when it goes out of scope.
        if let Some(mut stdin) = child.stdin.take() {
            writeln!(stdin, "{}", text).map_err(Error::Clipboard)?;
        }
        let status = child.wait().map_err(Error::Clipboard)?;
        debug!("{} exited with {}", self.program, status);
        Ok(status)
    }
}

impl std::fmt::Display for ClipboardCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_uses_pbcopy() {
        let command = ClipboardCommand::discover_for(Platform::MacOs, |_| false);
        assert_eq!(command, ClipboardCommand::new("pbcopy", &[]));
    }

    #[test]
    fn linux_prefers_xclip() {
        let command = ClipboardCommand::discover_for(Platform::Linux, |_| true);
        assert_eq!(command.to_string(), "xclip -selection clipboard");
    }

    #[test]
    fn linux_falls_back_to_xsel() {
        let command = ClipboardCommand::discover_for(Platform::Linux, |p| p == "xsel");
        assert_eq!(command.to_string(), "xsel --clipboard --input");
    }

    #[test]
    fn linux_without_tools_passes_through() {
        let command = ClipboardCommand::discover_for(Platform::Linux, |_| false);
        assert_eq!(command, ClipboardCommand::passthrough());
    }

    #[test]
    fn unknown_platform_passes_through() {
        let command = ClipboardCommand::discover_for(Platform::Other, |_| true);
        assert_eq!(command, ClipboardCommand::passthrough());
    }

    #[test]
    #[cfg(unix)]
    fn passthrough_exits_cleanly() {
        let status = ClipboardCommand::passthrough().copy("287082").unwrap();
        assert!(status.success());
        assert_eq!(status.code(), Some(0));
    }

    #[test]
    #[cfg(unix)]
    fn child_status_is_returned_verbatim() {
        let command = ClipboardCommand::new("sh", &["-c", "cat >/dev/null; exit 3"]);
        let status = command.copy("287082").unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn missing_program_is_a_clipboard_error() {
        let command = ClipboardCommand::new("otpclip-no-such-clipboard-tool", &[]);
        let err = command.copy("287082").unwrap_err();
        assert_eq!(err.kind(), "ClipboardError");
    }
}
