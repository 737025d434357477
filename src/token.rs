use std::fmt;

use crate::diagnostic::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    // Operands
    Identifier,
    Number,
    String,
    Regex,

    // Brackets
    BracketLeft,
    BracketRight,

    // Unary operator
    Not,

    // Comparison operators; `text` keeps the spelling, so `==` and
    // `===` share a kind and stay distinguishable
    Equality,
    Inequality,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Matches,

    // Membership
    In,
    /// `not in` - fused into a single token during scanning
    NotIn,

    // Logical connectives
    And,
    Or,
}

impl SyntaxKind {
    /// Binding strength for the postfix converter. Operands and
    /// brackets have none.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            SyntaxKind::Not => Some(4),
            SyntaxKind::Equality
            | SyntaxKind::Inequality
            | SyntaxKind::GreaterThan
            | SyntaxKind::GreaterThanOrEqual
            | SyntaxKind::LessThan
            | SyntaxKind::LessThanOrEqual
            | SyntaxKind::Matches
            | SyntaxKind::In
            | SyntaxKind::NotIn => Some(3),
            SyntaxKind::And => Some(2),
            SyntaxKind::Or => Some(1),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.precedence().is_some()
    }

    pub fn is_binary_operator(&self) -> bool {
        self.is_operator() && *self != SyntaxKind::Not
    }

    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier | SyntaxKind::Number | SyntaxKind::String | SyntaxKind::Regex
        )
    }
}

/// A single lexeme with its kind, source spelling, and location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
