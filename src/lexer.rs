use crate::diagnostic::{Diagnostic, Span};
use crate::token::{SyntaxKind, Token};

/// Errors produced while scanning expression text. Every variant knows
/// where in the input it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { ch: char, position: usize },
    LonePipe { position: usize },
    LoneAmpersand { position: usize },
    InvalidEqualsContinuation { found: Option<char>, position: usize },
    UnterminatedString { span: Span },
    UnterminatedRegex { span: Span },
    MalformedNumber { text: String, span: Span },
}

impl LexError {
    /// Byte offset of the start of the offending input
    pub fn position(&self) -> usize {
        self.span().start
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedCharacter { ch, position } => {
                Span::new(*position, position + ch.len_utf8())
            }
            Self::LonePipe { position } | Self::LoneAmpersand { position } => {
                Span::new(*position, position + 1)
            }
            Self::InvalidEqualsContinuation { found, position } => {
                let len = found.map(char::len_utf8).unwrap_or(0);
                Span::new(*position, position + len)
            }
            Self::UnterminatedString { span }
            | Self::UnterminatedRegex { span }
            | Self::MalformedNumber { span, .. } => *span,
        }
    }

    /// Convert to a diagnostic for pretty printing
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnexpectedCharacter { ch, .. } => {
                Diagnostic::error(format!("unexpected character `{}`", ch), self.span())
            }
            Self::LonePipe { .. } => {
                Diagnostic::error("`|` must be followed by `|`", self.span())
                    .with_help("use `||` for logical or")
            }
            Self::LoneAmpersand { .. } => {
                Diagnostic::error("`&` must be followed by `&`", self.span())
                    .with_help("use `&&` for logical and")
            }
            Self::InvalidEqualsContinuation { found, .. } => {
                let diagnostic =
                    Diagnostic::error("expected `=` or `~` after `=`", self.span());
                match found {
                    Some(ch) => diagnostic.with_note(format!("found `{}`", ch)),
                    None => diagnostic.with_note("found end of input"),
                }
            }
            Self::UnterminatedString { .. } => {
                Diagnostic::error("unterminated string literal", self.span())
                    .with_help("close the literal with `'`")
            }
            Self::UnterminatedRegex { .. } => {
                Diagnostic::error("unterminated regex literal", self.span())
                    .with_help("close the pattern with `/`")
            }
            Self::MalformedNumber { text, .. } => {
                Diagnostic::error(format!("malformed number `{}`", text), self.span())
                    .with_help("a number is one or more digits with at most one `.`")
            }
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnexpectedCharacter { ch, position } => {
                write!(f, "Unexpected character '{}' at position {}", ch, position)
            }
            LexError::LonePipe { position } => {
                write!(f, "'|' must be followed by '|' at position {}", position)
            }
            LexError::LoneAmpersand { position } => {
                write!(f, "'&' must be followed by '&' at position {}", position)
            }
            LexError::InvalidEqualsContinuation { position, .. } => {
                write!(f, "Expected '=' or '~' after '=' at position {}", position)
            }
            LexError::UnterminatedString { span } => {
                write!(f, "Unterminated string literal at position {}", span.start)
            }
            LexError::UnterminatedRegex { span } => {
                write!(f, "Unterminated regex literal at position {}", span.start)
            }
            LexError::MalformedNumber { text, span } => {
                write!(f, "Malformed number '{}' at position {}", text, span.start)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Scans expression text into an ordered token sequence.
///
/// Single left-to-right pass with one character of lookahead and longest
/// match for operators. Whitespace separates tokens and is otherwise
/// skipped. The first error aborts the scan; no partial token list is
/// returned.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Decodes the full character at the cursor. The cursor only ever
    /// rests on a character boundary.
    fn current_char(&self) -> Option<char> {
        self.input.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b >= 0x80 {
                match self.current_char() {
                    Some(ch) if ch.is_whitespace() => self.pos += ch.len_utf8(),
                    _ => break,
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();
        let Some(b) = self.peek() else {
            return Ok(None);
        };

        let token = match b {
            b'(' => self.single_char(SyntaxKind::BracketLeft),
            b')' => self.single_char(SyntaxKind::BracketRight),
            b'!' => self.scan_bang(),
            b'|' => self.scan_pair(b'|', SyntaxKind::Or)?,
            b'&' => self.scan_pair(b'&', SyntaxKind::And)?,
            b'=' => self.scan_equals()?,
            b'<' => self.scan_ordering(SyntaxKind::LessThan, SyntaxKind::LessThanOrEqual),
            b'>' => self.scan_ordering(SyntaxKind::GreaterThan, SyntaxKind::GreaterThanOrEqual),
            b'\'' => self.scan_string()?,
            b'/' => self.scan_regex()?,
            b'0'..=b'9' => self.scan_number()?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_word(),
            _ => {
                // Cursor sits on a boundary, so a character is always
                // there to decode.
                let ch = self.current_char().unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    position: self.pos,
                });
            }
        };
        Ok(Some(token))
    }

    fn single_char(&mut self, kind: SyntaxKind) -> Token {
        let start = self.pos;
        self.pos += 1;
        Token::new(kind, &self.input[start..self.pos], Span::new(start, self.pos))
    }

    /// `!`, `!=`, or `!==`
    fn scan_bang(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        if self.peek() == Some(b'=') {
            self.pos += 1;
            if self.peek() == Some(b'=') {
                self.pos += 1;
            }
            let text = &self.input[start..self.pos];
            Token::new(SyntaxKind::Inequality, text, Span::new(start, self.pos))
        } else {
            Token::new(SyntaxKind::Not, "!", Span::new(start, self.pos))
        }
    }

    /// `||` and `&&`; the character is only legal doubled
    fn scan_pair(&mut self, expected: u8, kind: SyntaxKind) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        if self.peek() == Some(expected) {
            self.pos += 1;
            let text = &self.input[start..self.pos];
            Ok(Token::new(kind, text, Span::new(start, self.pos)))
        } else if expected == b'|' {
            Err(LexError::LonePipe { position: start })
        } else {
            Err(LexError::LoneAmpersand { position: start })
        }
    }

    /// `==`, `===`, or `=~`; anything else after `=` is an error
    fn scan_equals(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                }
                let text = &self.input[start..self.pos];
                Ok(Token::new(SyntaxKind::Equality, text, Span::new(start, self.pos)))
            }
            Some(b'~') => {
                self.pos += 1;
                Ok(Token::new(SyntaxKind::Matches, "=~", Span::new(start, self.pos)))
            }
            _ => Err(LexError::InvalidEqualsContinuation {
                found: self.current_char(),
                position: self.pos,
            }),
        }
    }

    /// `<`/`<=` and `>`/`>=`
    fn scan_ordering(&mut self, bare: SyntaxKind, inclusive: SyntaxKind) -> Token {
        let start = self.pos;
        self.pos += 1;
        let kind = if self.peek() == Some(b'=') {
            self.pos += 1;
            inclusive
        } else {
            bare
        };
        Token::new(kind, &self.input[start..self.pos], Span::new(start, self.pos))
    }

    /// `'...'`; the token text is the interior without quotes, kept
    /// verbatim (no escape processing)
    fn scan_string(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\'' {
                let text = &self.input[content_start..self.pos];
                self.pos += 1;
                return Ok(Token::new(SyntaxKind::String, text, Span::new(start, self.pos)));
            }
            self.pos += 1;
        }
        Err(LexError::UnterminatedString {
            span: Span::new(start, self.input.len()),
        })
    }

    /// `/.../`; the token text is the interior pattern, not compiled here
    fn scan_regex(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'/' {
                let text = &self.input[content_start..self.pos];
                self.pos += 1;
                return Ok(Token::new(SyntaxKind::Regex, text, Span::new(start, self.pos)));
            }
            self.pos += 1;
        }
        Err(LexError::UnterminatedRegex {
            span: Span::new(start, self.input.len()),
        })
    }

    /// Digits with at most one embedded `.`; the dot may trail
    fn scan_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        let dots = text.bytes().filter(|b| *b == b'.').count();
        if dots > 1 {
            return Err(LexError::MalformedNumber {
                text: text.to_string(),
                span: Span::new(start, self.pos),
            });
        }
        Ok(Token::new(SyntaxKind::Number, text, Span::new(start, self.pos)))
    }

    /// Identifiers, plus the contextual keywords `in` and `not in`.
    /// The whole word is consumed first, so `interest` or `notation`
    /// never shadow the keywords.
    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while self.peek().map_or(false, is_word_byte) {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        match text {
            "in" => Token::new(SyntaxKind::In, "in", Span::new(start, self.pos)),
            "not" => self.fuse_not_in(start),
            _ => Token::new(SyntaxKind::Identifier, text, Span::new(start, self.pos)),
        }
    }

    /// A `not` followed by whitespace and the word `in` fuses into one
    /// membership token. Anything else leaves `not` as an identifier
    /// and rewinds.
    fn fuse_not_in(&mut self, start: usize) -> Token {
        let mark = self.pos;
        self.skip_whitespace();
        if self.pos > mark {
            let word_start = self.pos;
            while self.peek().map_or(false, is_word_byte) {
                self.pos += 1;
            }
            if &self.input[word_start..self.pos] == "in" {
                return Token::new(SyntaxKind::NotIn, "not in", Span::new(start, self.pos));
            }
        }
        self.pos = mark;
        Token::new(SyntaxKind::Identifier, "not", Span::new(start, mark))
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
