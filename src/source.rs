//! Where the secret comes from: a locked-down file or standard input.
//!
//! A secret file is plain text. Blank lines and lines starting with `"` or `#`
//! are skipped, the first remaining line (trimmed) is the secret and anything
//! after it is ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;

use crate::Secret;

/// The only mode a secret file may carry: readable by its owner and nobody else.
pub const REQUIRED_MODE: u32 = 0o400;

/// Failures while locating, checking or reading the secret source.
#[derive(Debug)]
pub enum LoadError {
    /// `~` was used but `$HOME` is not set.
    NoHome,
    /// The secret file does not exist.
    Missing(PathBuf),
    /// The secret file's mode is not exactly [REQUIRED_MODE].
    Permissions {
        path: PathBuf,
        required: u32,
        actual: u32,
    },
    /// The source could not be resolved or read.
    Io(String, io::Error),
    /// Only blank and comment lines were found.
    NoSecret(String),
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NoHome => write!(f, "Can't expand \"~\": HOME is not set"),
            LoadError::Missing(path) => {
                write!(f, "Secret file \"{}\" does not exist", path.display())
            }
            LoadError::Permissions {
                path,
                required,
                actual,
            } => write!(
                f,
                "Secret file \"{}\" must have mode {:04o} ({}), not {:04o} ({})",
                path.display(),
                required,
                symbolic_mode(*required),
                actual,
                symbolic_mode(*actual),
            ),
            LoadError::Io(source, _) => write!(f, "Could not read secret from {}", source),
            LoadError::NoSecret(source) => {
                write!(f, "No secret line found in {}", source)
            }
        }
    }
}

/// Renders the owner/group/other bits the way `ls -l` does, `0o640` is `rw-r-----`.
pub fn symbolic_mode(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Returns the first line that is neither blank nor a comment, trimmed.
pub fn first_secret_line<R: BufRead>(reader: R) -> io::Result<Option<String>> {
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('"') || line.starts_with('#') {
            continue;
        }
        return Ok(Some(line.to_string()));
    }
    Ok(None)
}

/// A secret file path or standard input, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Read from standard input. No permission check applies.
    Stdin,
    /// Read from a file whose mode must be exactly [REQUIRED_MODE].
    File(PathBuf),
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Stdin => write!(f, "standard input"),
            SecretSource::File(path) => write!(f, "\"{}\"", path.display()),
        }
    }
}

impl SecretSource {
    /// `-` means standard input, anything else is a path where a leading `~` is the home directory.
    pub fn from_arg(arg: &str) -> Result<SecretSource, LoadError> {
        if arg == "-" {
            return Ok(SecretSource::Stdin);
        }
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Ok(SecretSource::File(expand_home(arg, home.as_deref())?))
    }

    /// Reads the secret, taking standard input from the process.
    pub fn load(&self) -> Result<Secret, LoadError> {
        self.load_from(io::stdin().lock())
    }

    /// Reads the secret, taking standard input from `stdin` when the source is [SecretSource::Stdin].
    pub fn load_from<R: BufRead>(&self, stdin: R) -> Result<Secret, LoadError> {
        let line = match self {
            SecretSource::Stdin => {
                debug!("reading secret from standard input");
                first_secret_line(stdin).map_err(|err| LoadError::Io(self.to_string(), err))?
            }
            SecretSource::File(path) => read_secret_file(path)?,
        };
        line.map(Secret::from)
            .ok_or_else(|| LoadError::NoSecret(self.to_string()))
    }
}

fn expand_home(arg: &str, home: Option<&Path>) -> Result<PathBuf, LoadError> {
    let rest = match arg.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(arg)),
    };
    let home = home.ok_or(LoadError::NoHome)?;
    if rest.is_empty() {
        Ok(home.to_path_buf())
    } else {
        Ok(home.join(rest))
    }
}

fn read_secret_file(path: &Path) -> Result<Option<String>, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let io_err = |err| LoadError::Io(format!("\"{}\"", path.display()), err);
    let path = path.canonicalize().map_err(io_err)?;
    check_mode(&path)?;
    debug!("reading secret from {}", path.display());
    // The handle is dropped, and the file closed, when this returns.
    let file = File::open(&path).map_err(io_err)?;
    first_secret_line(BufReader::new(file)).map_err(io_err)
}

#[cfg(unix)]
fn check_mode(path: &Path) -> Result<(), LoadError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|err| LoadError::Io(format!("\"{}\"", path.display()), err))?;
    let actual = metadata.permissions().mode() & 0o777;
    if actual != REQUIRED_MODE {
        return Err(LoadError::Permissions {
            path: path.to_path_buf(),
            required: REQUIRED_MODE,
            actual,
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_mode(path: &Path) -> Result<(), LoadError> {
    log::warn!(
        "can't check the mode of {} on this platform, make sure only you can read it",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    const SECRET: &str = "JBSWY3DPEHPK3PXP";

    #[cfg(unix)]
    fn secret_file(dir: &tempfile::TempDir, contents: &str, mode: u32) -> PathBuf {
        let path = dir.path().join("otpsecret");
        std::fs::write(&path, contents).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn first_line_skips_comments_and_blanks() {
        let input = "\n# comment\n\" vim style\n   \n  JBSWY3DPEHPK3PXP  \nGEZDGNBV\n";
        assert_eq!(
            first_secret_line(Cursor::new(input)).unwrap(),
            Some(SECRET.to_string())
        );
    }

    #[test]
    fn first_line_none_when_only_comments() {
        let input = "# one\n\n\"two\n";
        assert_eq!(first_secret_line(Cursor::new(input)).unwrap(), None);
        assert_eq!(first_secret_line(Cursor::new("")).unwrap(), None);
    }

    #[test]
    fn dash_is_stdin() {
        assert_eq!(SecretSource::from_arg("-").unwrap(), SecretSource::Stdin);
    }

    #[test]
    fn stdin_is_read_without_permission_check() {
        let secret = SecretSource::Stdin
            .load_from(Cursor::new("# from a pipe\nJBSWY3DPEHPK3PXP\n"))
            .unwrap();
        assert_eq!(secret, Secret::Encoded(SECRET.to_string()));
    }

    #[test]
    fn stdin_without_secret_fails() {
        let err = SecretSource::Stdin
            .load_from(Cursor::new("\n#\n"))
            .unwrap_err();
        assert!(matches!(err, LoadError::NoSecret(ref s) if s == "standard input"));
    }

    #[test]
    fn expand_home_prefix() {
        let home = Path::new("/home/someone");
        assert_eq!(
            expand_home("~/.otpsecret", Some(home)).unwrap(),
            PathBuf::from("/home/someone/.otpsecret")
        );
        assert_eq!(expand_home("~", Some(home)).unwrap(), home.to_path_buf());
        assert_eq!(
            expand_home("~other/secret", Some(home)).unwrap(),
            PathBuf::from("~other/secret")
        );
        assert_eq!(
            expand_home("/etc/secret", None).unwrap(),
            PathBuf::from("/etc/secret")
        );
        assert!(matches!(
            expand_home("~/.otpsecret", None),
            Err(LoadError::NoHome)
        ));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        let err = SecretSource::File(path.clone())
            .load_from(Cursor::new(""))
            .unwrap_err();
        assert!(matches!(err, LoadError::Missing(p) if p == path));
    }

    #[test]
    #[cfg(unix)]
    fn owner_read_only_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = secret_file(&dir, "# my secret\n\nJBSWY3DPEHPK3PXP\nignored\n", 0o400);
        let secret = SecretSource::File(path).load_from(Cursor::new("")).unwrap();
        assert_eq!(secret, Secret::Encoded(SECRET.to_string()));
    }

    #[test]
    #[cfg(unix)]
    fn wrong_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for mode in [0o600, 0o644, 0o440, 0o404, 0o000, 0o500] {
            let path = secret_file(&dir, "JBSWY3DPEHPK3PXP\n", mode);
            let err = SecretSource::File(path)
                .load_from(Cursor::new(""))
                .unwrap_err();
            match err {
                LoadError::Permissions {
                    required, actual, ..
                } => {
                    assert_eq!(required, REQUIRED_MODE);
                    assert_eq!(actual, mode);
                }
                other => panic!("expected a permission error, got {:?}", other),
            }
            std::fs::set_permissions(
                dir.path().join("otpsecret"),
                std::fs::Permissions::from_mode(0o600),
            )
            .unwrap();
        }
    }

    #[test]
    #[cfg(unix)]
    fn permission_message_names_both_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = secret_file(&dir, "JBSWY3DPEHPK3PXP\n", 0o644);
        let err = SecretSource::File(path)
            .load_from(Cursor::new(""))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("0400 (r--------)"));
        assert!(message.contains("0644 (rw-r--r--)"));
    }

    #[test]
    #[cfg(unix)]
    fn comment_only_file_has_no_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = secret_file(&dir, "# nothing here\n\n\"still nothing\n", 0o400);
        let err = SecretSource::File(path)
            .load_from(Cursor::new(SECRET))
            .unwrap_err();
        assert!(matches!(err, LoadError::NoSecret(_)));
    }

    #[test]
    fn symbolic_modes() {
        assert_eq!(symbolic_mode(0o400), "r--------");
        assert_eq!(symbolic_mode(0o640), "rw-r-----");
        assert_eq!(symbolic_mode(0o755), "rwxr-xr-x");
        assert_eq!(symbolic_mode(0), "---------");
    }
}
