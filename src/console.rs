use std::fmt::Display;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// The interpreter's line-oriented input and output.
///
/// Generic over reader and writer so runs can be driven from memory.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes one line of output.
    pub fn emit(&mut self, line: impl Display) {
        if let Err(err) = writeln!(self.output, "{}", line) {
            warn!(%err, "failed to write output line");
        }
    }

    /// Shows `prompt` and reads one line without its line terminator.
    /// End of input is an `UnexpectedEof` error.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input",
            ));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
