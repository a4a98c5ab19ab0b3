//! Terminal reporting and result writers.
//!
//! Status lines go to stderr so that stdout carries only command results.

use std::io::{self, Write};
use std::path::Path;

use console::{Style, Term};
use serde::Serialize;

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tone {
    Success,
    Warning,
    Error,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Self::Success => Style::new().green(),
            Self::Warning => Style::new().yellow(),
            Self::Error => Style::new().red().bold(),
        }
    }
}

/// Status reporter on stderr.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Print `msg` styled for `tone`.
    pub(crate) fn say(&self, tone: Tone, msg: &str) {
        let _ = self.term.write_line(&tone.style().apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        self.say(Tone::Error, msg);
    }

    /// Report how many directives a command handled in `input`.
    ///
    /// Nothing found is a warning, since it usually means the wrong file was given.
    pub(crate) fn tally(&self, verb: &str, count: usize, input: &Path) {
        let (tone, msg) = tally_line(verb, count, input);
        self.say(tone, &msg);
    }
}

fn tally_line(verb: &str, count: usize, input: &Path) -> (Tone, String) {
    let source = if input == Path::new("-") {
        "stdin".to_owned()
    } else {
        input.display().to_string()
    };
    match count {
        0 => (Tone::Warning, format!("No directives in {source}")),
        1 => (Tone::Success, format!("{verb} 1 directive in {source}")),
        n => (Tone::Success, format!("{verb} {n} directives in {source}")),
    }
}

/// Write `value` to stdout as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout).map_err(serde_json::Error::io)
}

/// Write `text` to stdout unchanged.
pub(crate) fn write_text(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}
