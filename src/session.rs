use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::{
    config::{Config, ConfigError},
    env::SymbolTable,
    error::CalcError,
    evaluator::Evaluator,
    lexer::{Keyword, Symbol, Token, Tokenizer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    Quit,
    EndOfInput,
}

/// How a session ended, and what it did on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub ending: Ending,
    pub evaluated: usize,
    pub failed: usize,
}

enum Step {
    Value(f64),
    Quit,
    End,
}

/// A read-evaluate-print loop over one character source.
///
/// Results go to `out`, user errors go to `err`. Only internal and I/O errors
/// end [`Session::run`] with `Err`.
pub struct Session<R, W, E> {
    tokens: Tokenizer<R>,
    symbols: SymbolTable,
    out: W,
    err: E,
    config: Config,
}

impl<R: BufRead, W: Write, E: Write> Session<R, W, E> {
    pub fn new(reader: R, out: W, err: E, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let symbols = if config.seed_constants {
            SymbolTable::with_constants()
        } else {
            SymbolTable::new()
        };

        Ok(Self {
            tokens: Tokenizer::with_syntax(reader, config.syntax.clone()),
            symbols,
            out,
            err,
            config,
        })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn run(&mut self) -> Result<Outcome, CalcError> {
        let mut evaluated = 0;
        let mut failed = 0;

        let ending = loop {
            write!(self.out, "{}", self.config.prompt)?;
            self.out.flush()?;

            match self.step() {
                Ok(Step::Value(value)) => {
                    evaluated += 1;
                    debug!(value, "statement evaluated");
                    writeln!(self.out, "{}{}", self.config.result_marker, value)?;
                }
                Ok(Step::Quit) => break Ending::Quit,
                Ok(Step::End) => break Ending::EndOfInput,
                Err(CalcError::Eof) => {
                    warn!("input ended in the middle of a statement");
                    break Ending::EndOfInput;
                }
                Err(e) if e.is_recoverable() => {
                    failed += 1;
                    debug!(kind = ?e.kind(), "statement failed");
                    writeln!(self.err, "{e}")?;
                    self.err.flush()?;
                    self.tokens.discard_through(self.config.syntax.separator)?;
                }
                Err(e) => return Err(e),
            }
        };

        let outcome = Outcome {
            ending,
            evaluated,
            failed,
        };
        info!(?outcome, "session finished");
        Ok(outcome)
    }

    fn step(&mut self) -> Result<Step, CalcError> {
        let token = loop {
            match self.tokens.next_token() {
                Ok(Token::Punct(Symbol::Separator)) => continue,
                Ok(token) => break token,
                Err(CalcError::Eof) => return Ok(Step::End),
                Err(e) => return Err(e),
            }
        };

        if token == Token::Keyword(Keyword::Quit) {
            return Ok(Step::Quit);
        }

        self.tokens.push_back(token)?;
        Evaluator::new(&mut self.tokens, &mut self.symbols)
            .statement()
            .map(Step::Value)
    }
}
