use std::fmt;

use crate::diagnostic::Diagnostic;
use crate::lexer::{tokenize, LexError};
use crate::postfix::{to_postfix, BracketError};
use crate::token::{SyntaxKind, Token};

/// Minimal capabilities the evaluator needs from a stack value. Keeping
/// the core generic over this trait lets a context bring its own value
/// kinds without touching the pipeline.
pub trait Operand: Sized {
    fn from_text(text: &str) -> Self;
    fn from_number(value: f64) -> Self;
    fn from_bool(value: bool) -> Self;
    fn truthy(&self) -> bool;
}

/// What the evaluator asks of its environment: variable lookup and
/// binary operator semantics. Unary `!` is applied natively and never
/// reaches the context.
pub trait EvalContext {
    type Value: Operand;
    type Error;

    /// Look up a variable by name. Policy for unknown names, a falsy
    /// sentinel or a hard error, belongs to the implementor.
    fn resolve_identifier(&self, name: &str) -> Result<Self::Value, Self::Error>;

    /// Apply the operator with the given source spelling. Both operands
    /// are already evaluated; `&&` and `||` do not short-circuit.
    fn apply_operator(
        &self,
        spelling: &str,
        left: Self::Value,
        right: Self::Value,
    ) -> Result<Self::Value, Self::Error>;
}

/// Walks a postfix token sequence with a value stack and coerces the
/// result to a boolean.
///
/// Operands push their value, `!` pops one entry, every binary operator
/// pops the right operand then the left and pushes the context's result.
/// An empty sequence is `false`. A malformed hand-built sequence never
/// panics: a missing operand acts as `false`, and the bottom of the
/// stack decides the result.
pub fn evaluate<C: EvalContext>(tokens: &[Token], context: &C) -> Result<bool, C::Error> {
    let mut stack: Vec<C::Value> = Vec::new();

    for token in tokens {
        match token.kind {
            SyntaxKind::Identifier => {
                stack.push(context.resolve_identifier(&token.text)?);
            }
            SyntaxKind::String | SyntaxKind::Regex => {
                stack.push(C::Value::from_text(&token.text));
            }
            SyntaxKind::Number => {
                let value = token.text.parse::<f64>().unwrap_or_default();
                stack.push(C::Value::from_number(value));
            }
            SyntaxKind::Not => {
                let value = pop_or_falsy(&mut stack);
                stack.push(C::Value::from_bool(!value.truthy()));
            }
            kind if kind.is_binary_operator() => {
                let right = pop_or_falsy(&mut stack);
                let left = pop_or_falsy(&mut stack);
                stack.push(context.apply_operator(&token.text, left, right)?);
            }
            // Brackets never survive conversion; skip them in case the
            // sequence was built by hand.
            _ => {}
        }
    }

    Ok(stack.into_iter().next().map_or(false, |value| value.truthy()))
}

fn pop_or_falsy<V: Operand>(stack: &mut Vec<V>) -> V {
    stack.pop().unwrap_or_else(|| V::from_bool(false))
}

/// Failure of any stage of [`evaluate_expression`]. Lex and bracket
/// errors come from the pipeline itself; context errors pass through
/// from the collaborator without wrapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError<E> {
    Lex(LexError),
    Bracket(BracketError),
    Context(E),
}

impl<E> ExpressionError<E> {
    /// Diagnostic for pipeline errors; context errors carry no span and
    /// render through their own `Display`.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::Lex(err) => Some(err.to_diagnostic()),
            Self::Bracket(err) => Some(err.to_diagnostic()),
            Self::Context(_) => None,
        }
    }
}

impl<E> From<LexError> for ExpressionError<E> {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

impl<E> From<BracketError> for ExpressionError<E> {
    fn from(err: BracketError) -> Self {
        Self::Bracket(err)
    }
}

impl<E: fmt::Display> fmt::Display for ExpressionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::Lex(err) => write!(f, "{}", err),
            ExpressionError::Bracket(err) => write!(f, "{}", err),
            ExpressionError::Context(err) => write!(f, "{}", err),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ExpressionError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExpressionError::Lex(err) => Some(err),
            ExpressionError::Bracket(err) => Some(err),
            ExpressionError::Context(err) => Some(err),
        }
    }
}

/// Convenience entry point composing the whole pipeline: tokenize,
/// convert to postfix, evaluate.
pub fn evaluate_expression<C: EvalContext>(
    input: &str,
    context: &C,
) -> Result<bool, ExpressionError<C::Error>> {
    let tokens = tokenize(input)?;
    let postfix = to_postfix(tokens)?;
    evaluate(&postfix, context).map_err(ExpressionError::Context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Span;

    /// Everything is a boolean; identifiers starting with `t` resolve
    /// true, everything else false.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Truthy(bool);

    impl Operand for Truthy {
        fn from_text(text: &str) -> Self {
            Truthy(!text.is_empty())
        }

        fn from_number(value: f64) -> Self {
            Truthy(value != 0.0)
        }

        fn from_bool(value: bool) -> Self {
            Truthy(value)
        }

        fn truthy(&self) -> bool {
            self.0
        }
    }

    struct FlagContext;

    impl EvalContext for FlagContext {
        type Value = Truthy;
        type Error = String;

        fn resolve_identifier(&self, name: &str) -> Result<Truthy, String> {
            Ok(Truthy(name.starts_with('t')))
        }

        fn apply_operator(
            &self,
            spelling: &str,
            left: Truthy,
            right: Truthy,
        ) -> Result<Truthy, String> {
            match spelling {
                "&&" => Ok(Truthy(left.0 && right.0)),
                "||" => Ok(Truthy(left.0 || right.0)),
                "==" => Ok(Truthy(left.0 == right.0)),
                other => Err(format!("unknown operator {}", other)),
            }
        }
    }

    fn run(input: &str) -> bool {
        evaluate_expression(input, &FlagContext).unwrap()
    }

    #[test]
    fn test_identifier_resolution() {
        assert!(run("tfoo"));
        assert!(!run("fbar"));
    }

    #[test]
    fn test_binary_dispatch() {
        assert!(run("tfoo && tbar"));
        assert!(!run("tfoo && fbar"));
        assert!(run("fbar || tfoo"));
        assert!(run("fbar == fqux"));
    }

    #[test]
    fn test_not_never_reaches_the_context() {
        // FlagContext has no `!` operator, so these only pass if the
        // evaluator negates natively.
        assert!(run("!fbar"));
        assert!(!run("!tfoo"));
        assert!(run("!(tfoo && fbar)"));
    }

    #[test]
    fn test_empty_input_is_false() {
        assert!(!run(""));
        assert!(!evaluate(&[], &FlagContext).unwrap());
    }

    #[test]
    fn test_context_error_passes_through_unwrapped() {
        let err = evaluate_expression("tfoo < tbar", &FlagContext).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::Context("unknown operator <".to_string())
        );
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = evaluate_expression("tfoo | tbar", &FlagContext).unwrap_err();
        assert!(matches!(err, ExpressionError::Lex(_)));
    }

    #[test]
    fn test_bracket_error_surfaces() {
        let err = evaluate_expression("(tfoo && tbar", &FlagContext).unwrap_err();
        assert!(matches!(err, ExpressionError::Bracket(_)));
    }

    #[test]
    fn test_missing_operand_acts_as_false() {
        let and = Token::new(SyntaxKind::And, "&&", Span::new(0, 2));
        assert!(!evaluate(&[and.clone()], &FlagContext).unwrap());

        let ident = Token::new(SyntaxKind::Identifier, "tfoo", Span::new(0, 4));
        // Only a right operand is available; the left defaults false.
        assert!(!evaluate(&[ident.clone(), and], &FlagContext).unwrap());
        let or = Token::new(SyntaxKind::Or, "||", Span::new(0, 2));
        assert!(evaluate(&[ident, or], &FlagContext).unwrap());
    }

    #[test]
    fn test_leftover_operands_keep_the_first() {
        let t = Token::new(SyntaxKind::Identifier, "tfoo", Span::new(0, 4));
        let f = Token::new(SyntaxKind::Identifier, "fbar", Span::new(5, 9));
        assert!(evaluate(&[t.clone(), f.clone()], &FlagContext).unwrap());
        assert!(!evaluate(&[f, t], &FlagContext).unwrap());
    }
}
