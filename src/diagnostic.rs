use std::fmt;

/// A source span representing a range of bytes in the expression text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A complete diagnostic message with one primary span
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Computes line and column (both 1-based) from a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Returns the content of the given 1-based line, without its newline
fn line_content(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.saturating_sub(1))
}

/// Diagnostic renderer for Rust-like error output
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, use_color: bool) -> Self {
        Self { source, use_color }
    }

    /// Render a diagnostic to a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        // Header line: error: message
        output.push_str(&format!(
            "{}: {}\n",
            self.style_red_bold("error"),
            self.style_bold(&diagnostic.message)
        ));

        let (line, col) = line_col(self.source, diagnostic.span.start);

        if let Some(content) = line_content(self.source, line) {
            // Location line: --> line:col
            output.push_str(&format!("  {} {}:{}\n", self.style_blue("-->"), line, col));

            let line_label = line.to_string();
            let gutter = " ".repeat(line_label.len());

            // Empty gutter line
            output.push_str(&format!("{} {}\n", gutter, self.style_blue("|")));

            // Source line: "1 | editorLangId == 'rust'"
            output.push_str(&format!(
                "{} {} {}\n",
                self.style_blue(&line_label),
                self.style_blue("|"),
                content
            ));

            // Caret line, measured in characters so the underline stays
            // aligned when literals contain multi-byte text
            let caret_len = self
                .source
                .get(diagnostic.span.start..diagnostic.span.end)
                .map(|s| s.chars().count())
                .unwrap_or(1)
                .max(1);
            let underline = format!("{}{}", " ".repeat(col - 1), "^".repeat(caret_len));
            output.push_str(&format!(
                "{} {} {}\n",
                gutter,
                self.style_blue("|"),
                self.style_red(&underline)
            ));

            // Final empty gutter line
            output.push_str(&format!("{} {}\n", gutter, self.style_blue("|")));
        }

        // Notes and help
        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.style_blue("="), note));
        }

        output
    }

    // Color helpers
    fn style_red(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[31m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_red_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1;31m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_blue(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[34m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }
}
