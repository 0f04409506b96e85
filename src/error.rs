use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Indentation below the reference width. Fatal to the run.
    Structural,
    Assignment,
    Arithmetic,
    Call,
    Type,
    UnsupportedStatement,
    LoopLimit,
    Input,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::Structural => "Structural Error",
            ErrorKind::Assignment => "Assignment Error",
            ErrorKind::Arithmetic => "Arithmetic Error",
            ErrorKind::Call => "Call Error",
            ErrorKind::Type => "Type Error",
            ErrorKind::UnsupportedStatement => "Unsupported Statement",
            ErrorKind::LoopLimit => "Loop Limit",
            ErrorKind::Input => "Input Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::Structural => Color::Red,
            ErrorKind::Assignment | ErrorKind::Call => Color::Yellow,
            ErrorKind::Input => Color::Blue,
            _ => Color::Magenta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LsiError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub message: String,
    pub help: Option<String>,
}

impl LsiError {
    pub fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            span: None,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attaches a span unless one is already present.
    pub fn with_span(mut self, span: &Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    pub fn structural_error(span: Span, message: String) -> Self {
        Self {
            kind: ErrorKind::Structural,
            span: Some(span),
            message,
            help: Some(
                "every line must be indented at least as far as the first statement".to_string(),
            ),
        }
    }

    pub fn assignment_error(message: String) -> Self {
        Self::new(ErrorKind::Assignment, message)
    }

    pub fn arithmetic_error(message: String) -> Self {
        Self::new(ErrorKind::Arithmetic, message)
    }

    pub fn call_error(message: String) -> Self {
        Self::new(ErrorKind::Call, message)
    }

    pub fn type_error(message: String) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn unsupported(keyword: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedStatement,
            format!("'{}' statement is not supported", keyword),
        )
    }

    pub fn loop_limit(limit: u64) -> Self {
        Self::new(
            ErrorKind::LoopLimit,
            format!("loop exceeded {} iterations", limit),
        )
        .with_help("raise --max-iterations or check the loop step")
    }

    pub fn input_error(err: io::Error) -> Self {
        Self::new(ErrorKind::Input, format!("failed to read input: {}", err))
    }

    /// Writes a diagnostic for this error to stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        if let Err(err) = self.render(source, filename, io::stderr()) {
            eprintln!("{}: {} ({})", self.kind.label(), self.message, err);
        }
    }

    /// Writes a diagnostic for this error into `out`.
    pub fn render<W: io::Write>(
        &self,
        source: &str,
        filename: Option<&str>,
        out: W,
    ) -> io::Result<()> {
        let filename = filename.unwrap_or("<script>");
        let color = self.kind.color();
        let span = self.span.clone().unwrap_or_else(|| Span::new(0, 0));

        let mut report_builder = Report::build(ReportKind::Error, filename, span.start)
            .with_message(format!("{}: {}", self.kind.label().fg(color), self.message))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), out)
    }
}

impl fmt::Display for LsiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LsiError {}
