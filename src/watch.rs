//! Continuous display of the current code, for checking a secret against an authenticator app.

use std::convert::Infallible;
use std::io::Write;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::debug;

use crate::{unix_now, Error, TOTP};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Remembers which step the last printed code belongs to.
#[derive(Debug)]
pub struct CodeWatch<'a> {
    totp: &'a TOTP,
    last_step: Option<u64>,
}

impl<'a> CodeWatch<'a> {
    pub fn new(totp: &'a TOTP) -> Self {
        CodeWatch {
            totp,
            last_step: None,
        }
    }

    /// Returns a code on the first poll and whenever `time` has moved into a new step.
    pub fn poll(&mut self, time: u64) -> Option<String> {
        let step = self.totp.step_index(time);
        if self.last_step == Some(step) {
            return None;
        }
        self.last_step = Some(step);
        Some(self.totp.generate(time))
    }
}

fn render_line(now: DateTime<Local>, code: &str, ttl: u64) -> String {
    format!("{}  {}  ({}s left)", now.format("%Y-%m-%d %H:%M:%S"), code, ttl)
}

/// Prints a fresh code to `out` at every step boundary. Only returns on error, the
/// loop otherwise runs until the process is interrupted.
pub fn watch<W: Write>(totp: &TOTP, out: &mut W) -> Result<Infallible, Error> {
    debug!("watching codes, {}", totp);
    let mut codes = CodeWatch::new(totp);
    loop {
        let time = unix_now()?;
        if let Some(code) = codes.poll(time) {
            let line = render_line(Local::now(), &code, totp.ttl_at(time));
            writeln!(out, "{}", line).map_err(Error::Output)?;
            out.flush().map_err(Error::Output)?;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Algorithm;
    use chrono::TimeZone;

    fn totp() -> TOTP {
        TOTP::new(Algorithm::SHA1, 6, 30, b"12345678901234567890".to_vec()).unwrap()
    }

    #[test]
    fn first_poll_yields_a_code() {
        let totp = totp();
        let mut watch = CodeWatch::new(&totp);
        assert_eq!(watch.poll(59).as_deref(), Some("287082"));
    }

    #[test]
    fn code_refreshes_only_on_step_boundaries() {
        let totp = totp();
        let mut watch = CodeWatch::new(&totp);
        assert!(watch.poll(31).is_some());
        for time in 32..60 {
            assert_eq!(watch.poll(time), None, "no new code at {}", time);
        }
        assert_eq!(watch.poll(60), Some(totp.generate(60)));
        assert_eq!(watch.poll(61), None);
        assert!(watch.poll(90).is_some());
    }

    #[test]
    fn skipped_steps_still_refresh() {
        let totp = totp();
        let mut watch = CodeWatch::new(&totp);
        assert!(watch.poll(0).is_some());
        assert_eq!(watch.poll(1111111109).as_deref(), Some("081804"));
    }

    #[test]
    fn line_has_timestamp_code_and_ttl() {
        let now = Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        assert_eq!(
            render_line(now, "287082", 30),
            "2024-05-17 09:30:00  287082  (30s left)"
        );
    }
}
