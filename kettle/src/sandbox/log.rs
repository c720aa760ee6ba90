//! Bridge debug output.

use std::fmt::Display;
use std::io::Write;

/// Prefix of every bridge debug line.
pub const LOG_TAG: &str = "[kettle:sandbox]: ";

/// Tagged debug lines, written only in verbose mode. Every line is also
/// emitted as a `tracing` debug event.
pub struct DebugLog {
    verbose: bool,
    out: Box<dyn Write + Send>,
}

impl DebugLog {
    /// Debug log on stdout.
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(verbose, Box::new(std::io::stdout()))
    }

    pub fn with_writer(verbose: bool, out: Box<dyn Write + Send>) -> Self {
        Self { verbose, out }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn line(&mut self, msg: impl Display) {
        tracing::debug!(target: "kettle::sandbox", "{}", msg);
        if self.verbose {
            let _ = writeln!(self.out, "{}{}", LOG_TAG, msg);
        }
    }
}

impl std::fmt::Debug for DebugLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugLog")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
