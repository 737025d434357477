pub mod context;
pub mod diagnostic;
pub mod eval;
pub mod lexer;
pub mod postfix;
pub mod token;
pub mod value;

pub use context::{standard_operator, ContextError, KeyValueContext};
pub use diagnostic::{Diagnostic, DiagnosticRenderer, Span};
pub use eval::{evaluate, evaluate_expression, EvalContext, ExpressionError, Operand};
pub use lexer::{tokenize, LexError};
pub use postfix::{to_postfix, BracketError};
pub use token::{SyntaxKind, Token};
pub use value::Value;
