use miette::Diagnostic;
use thiserror::Error;

/// Taxonomy class of a [`CalcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Syntax,
    Name,
    Arithmetic,
    Internal,
    Eof,
    Io,
}

#[derive(Diagnostic, Debug, Error)]
pub enum CalcError {
    #[error("{0}")]
    #[diagnostic(code(calc::lex))]
    Lex(String),

    #[error("{0}")]
    #[diagnostic(code(calc::syntax))]
    Syntax(&'static str),

    #[error("{message}: {name}")]
    #[diagnostic(code(calc::name))]
    Name { message: &'static str, name: String },

    #[error("{0}")]
    #[diagnostic(code(calc::arithmetic))]
    Arithmetic(&'static str),

    /// A grammar level broke the token stream contract. Never caused by input.
    #[error("internal error: {0}")]
    #[diagnostic(
        code(calc::internal),
        help("this is a bug in the calculator, not in the input")
    )]
    Internal(&'static str),

    #[error("unexpected end of input")]
    #[diagnostic(code(calc::eof))]
    Eof,

    #[error(transparent)]
    #[diagnostic(code(calc::io))]
    Io(#[from] std::io::Error),
}

impl CalcError {
    pub fn undefined_name(name: &str) -> Self {
        CalcError::Name {
            message: "undefined name",
            name: name.to_string(),
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        CalcError::Name {
            message: "undefined variable",
            name: name.to_string(),
        }
    }

    pub fn declared_twice(name: &str) -> Self {
        CalcError::Name {
            message: "declared twice",
            name: name.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::Lex(_) => ErrorKind::Lex,
            CalcError::Syntax(_) => ErrorKind::Syntax,
            CalcError::Name { .. } => ErrorKind::Name,
            CalcError::Arithmetic(_) => ErrorKind::Arithmetic,
            CalcError::Internal(_) => ErrorKind::Internal,
            CalcError::Eof => ErrorKind::Eof,
            CalcError::Io(_) => ErrorKind::Io,
        }
    }

    /// True for the errors the session reports and resynchronizes past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Lex | ErrorKind::Syntax | ErrorKind::Name | ErrorKind::Arithmetic
        )
    }
}
