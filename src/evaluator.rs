use std::io::BufRead;

use tracing::trace;

use crate::{
    env::SymbolTable,
    error::CalcError,
    lexer::{Keyword, Symbol, Token, Tokenizer},
};

/// Parses and evaluates in one pass; no tree is built.
///
/// Every method consumes exactly the tokens of its production and leaves the
/// stream at the first token it did not use.
pub struct Evaluator<'a, R> {
    tokens: &'a mut Tokenizer<R>,
    symbols: &'a mut SymbolTable,
}

impl<'a, R: BufRead> Evaluator<'a, R> {
    pub fn new(tokens: &'a mut Tokenizer<R>, symbols: &'a mut SymbolTable) -> Self {
        Self { tokens, symbols }
    }

    /// `declaration | expression`
    pub fn statement(&mut self) -> Result<f64, CalcError> {
        match self.tokens.next_token()? {
            Token::Keyword(Keyword::Let) => self.declaration(),
            token => {
                self.tokens.push_back(token)?;
                self.expression()
            }
        }
    }

    /// `let Identifier = expression`, with the `let` already consumed.
    pub fn declaration(&mut self) -> Result<f64, CalcError> {
        let name = match self.tokens.next_token()? {
            Token::Identifier(name) => name,
            token => return self.reject(token, "name expected in declaration"),
        };

        match self.tokens.next_token()? {
            Token::Punct(Symbol::Equal) => {}
            token => return self.reject(token, "= missing in declaration"),
        }

        let value = self.expression()?;
        self.symbols.declare(&name, value)
    }

    /// `term { (+|-) term }`
    pub fn expression(&mut self) -> Result<f64, CalcError> {
        let mut left = self.term()?;
        loop {
            match self.tokens.next_token()? {
                Token::Punct(Symbol::Plus) => left += self.term()?,
                Token::Punct(Symbol::Minus) => left -= self.term()?,
                token => {
                    self.tokens.push_back(token)?;
                    return Ok(left);
                }
            }
        }
    }

    /// `primary { (*|/|%) primary }`
    pub fn term(&mut self) -> Result<f64, CalcError> {
        let mut left = self.primary()?;
        loop {
            match self.tokens.next_token()? {
                Token::Punct(Symbol::Star) => left *= self.primary()?,
                Token::Punct(Symbol::Slash) => {
                    let d = self.primary()?;
                    if d == 0.0 {
                        return Err(CalcError::Arithmetic("divide by zero"));
                    }
                    left /= d;
                }
                Token::Punct(Symbol::Percent) => {
                    let d = self.primary()?;
                    if d == 0.0 {
                        return Err(CalcError::Arithmetic("divide by zero"));
                    }
                    // f64 `%` truncates, so the sign follows the dividend.
                    left %= d;
                }
                token => {
                    self.tokens.push_back(token)?;
                    return Ok(left);
                }
            }
        }
    }

    pub fn primary(&mut self) -> Result<f64, CalcError> {
        let token = self.tokens.next_token()?;
        trace!(?token, "primary");
        match token {
            Token::Punct(Symbol::LeftParen) => {
                let d = self.expression()?;
                match self.tokens.next_token()? {
                    Token::Punct(Symbol::RightParen) => Ok(d),
                    token => self.reject(token, "'(' expected"),
                }
            }
            Token::Punct(Symbol::Minus) => Ok(-self.primary()?),
            Token::Punct(Symbol::Plus) => self.primary(),
            Token::Number(n) => Ok(n),
            Token::Identifier(name) => self.symbols.lookup(&name),
            token => self.reject(token, "primary expected"),
        }
    }

    /// Returns `token` to the stream and fails with a syntax error, so a
    /// rejected separator is still there for resynchronization.
    fn reject(&mut self, token: Token, message: &'static str) -> Result<f64, CalcError> {
        self.tokens.push_back(token)?;
        Err(CalcError::Syntax(message))
    }
}
