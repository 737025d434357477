use crate::diagnostic::{Diagnostic, Span};
use crate::token::{SyntaxKind, Token};

/// Bracket structure errors found while reordering. Unbalanced input is
/// rejected instead of being silently tolerated, since a swallowed
/// bracket can flip the meaning of the whole expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BracketError {
    UnmatchedClosing { span: Span },
    UnclosedOpening { span: Span },
}

impl BracketError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnmatchedClosing { span } | Self::UnclosedOpening { span } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnmatchedClosing { span } => {
                Diagnostic::error("unmatched `)`", *span)
                    .with_help("remove it or add a matching `(`")
            }
            Self::UnclosedOpening { span } => {
                Diagnostic::error("unclosed `(`", *span).with_help("add a matching `)`")
            }
        }
    }
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::UnmatchedClosing { span } => {
                write!(f, "Unmatched ')' at position {}", span.start)
            }
            BracketError::UnclosedOpening { span } => {
                write!(f, "Unclosed '(' at position {}", span.start)
            }
        }
    }
}

impl std::error::Error for BracketError {}

/// Reorders an infix token sequence into postfix (RPN) with one output
/// queue and one operator stack.
///
/// Operands go straight to the output. An operator first pops every
/// stacked operator of greater or equal precedence, so equal-precedence
/// runs come out left-associative: `a && b && c` yields `a b && c &&`.
/// A stacked `(` has no precedence and never outranks an operator.
pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, BracketError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();

    for token in tokens {
        if token.kind.is_operand() {
            output.push(token);
        } else if token.kind == SyntaxKind::BracketLeft {
            operators.push(token);
        } else if token.kind == SyntaxKind::BracketRight {
            loop {
                match operators.pop() {
                    Some(op) if op.kind == SyntaxKind::BracketLeft => break,
                    Some(op) => output.push(op),
                    None => {
                        return Err(BracketError::UnmatchedClosing { span: token.span });
                    }
                }
            }
        } else {
            while operators
                .last()
                .map_or(false, |top| top.kind.precedence() >= token.kind.precedence())
            {
                if let Some(op) = operators.pop() {
                    output.push(op);
                }
            }
            operators.push(token);
        }
    }

    while let Some(op) = operators.pop() {
        if op.kind == SyntaxKind::BracketLeft {
            return Err(BracketError::UnclosedOpening { span: op.span });
        }
        output.push(op);
    }

    Ok(output)
}
