//! An interactive calculator: floating-point arithmetic with `+ - * / %`,
//! parentheses, unary signs and `let` declarations, one statement per `;`.

pub mod config;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod session;

pub use config::{Config, ConfigError, Syntax};
pub use env::SymbolTable;
pub use error::{CalcError, ErrorKind};
pub use evaluator::Evaluator;
pub use lexer::{Keyword, Symbol, Token, Tokenizer};
pub use session::{Ending, Outcome, Session};
