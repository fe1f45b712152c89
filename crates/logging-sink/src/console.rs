//! crates/logging-sink/src/console.rs
//! Standard output and standard error destinations.

use std::io::{self, Write};

use is_terminal::IsTerminal;

/// One of the two standard streams.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConsoleStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl ConsoleStream {
    /// Returns `true` when the stream is attached to a terminal.
    pub fn is_terminal(self) -> bool {
        match self {
            Self::Stdout => io::stdout().is_terminal(),
            Self::Stderr => io::stderr().is_terminal(),
        }
    }

    /// Writes a fully rendered line and flushes.
    ///
    /// The stream's own lock is held for the duration so lines from
    /// concurrent producers never interleave.
    pub fn write_line(self, line: &str) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(line.as_bytes())?;
                out.flush()
            }
            Self::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(line.as_bytes())?;
                err.flush()
            }
        }
    }
}

/// When console output is wrapped in style escape sequences.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum StylePolicy {
    /// Style only streams attached to a terminal.
    #[default]
    Auto,
    /// Always style.
    Always,
    /// Never style.
    Never,
}

impl StylePolicy {
    /// Decides whether `stream` gets styled output.
    pub fn applies_to(self, stream: ConsoleStream) -> bool {
        match self {
            Self::Auto => stream.is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_policies_ignore_terminal_state() {
        assert!(StylePolicy::Always.applies_to(ConsoleStream::Stdout));
        assert!(!StylePolicy::Never.applies_to(ConsoleStream::Stderr));
    }

    #[test]
    fn auto_follows_terminal_detection() {
        let stream = ConsoleStream::Stderr;
        assert_eq!(StylePolicy::Auto.applies_to(stream), stream.is_terminal());
    }

    #[test]
    fn write_line_succeeds() {
        ConsoleStream::Stderr.write_line("").unwrap();
    }
}
