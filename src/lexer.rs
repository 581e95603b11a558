use std::io::{self, BufRead};

use tracing::{debug, trace};

use crate::{config::Syntax, error::CalcError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Symbol {
    LeftParen,
    RightParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    Separator,
}

impl Symbol {
    pub fn from_char(c: char, separator: char) -> Option<Self> {
        let symbol = match c {
            '(' => Symbol::LeftParen,
            ')' => Symbol::RightParen,
            '+' => Symbol::Plus,
            '-' => Symbol::Minus,
            '*' => Symbol::Star,
            '/' => Symbol::Slash,
            '%' => Symbol::Percent,
            '=' => Symbol::Equal,
            c if c == separator => Symbol::Separator,
            _ => return None,
        };
        Some(symbol)
    }

    pub fn as_char(self, separator: char) -> char {
        match self {
            Symbol::LeftParen => '(',
            Symbol::RightParen => ')',
            Symbol::Plus => '+',
            Symbol::Minus => '-',
            Symbol::Star => '*',
            Symbol::Slash => '/',
            Symbol::Percent => '%',
            Symbol::Equal => '=',
            Symbol::Separator => separator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Keyword {
    Let,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Punct(Symbol),
    Number(f64),
    Keyword(Keyword),
    Identifier(String),
}

/// Line-buffered character reader with one character of pushback.
///
/// Lookahead past the next character only sees the line already buffered,
/// which is enough for numeric literals since they never span a newline.
#[derive(Debug)]
pub struct CharSource<R> {
    reader: R,
    line: Vec<char>,
    pos: usize,
    exhausted: bool,
}

impl<R: BufRead> CharSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            pos: 0,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> io::Result<bool> {
        while self.pos >= self.line.len() {
            if self.exhausted {
                return Ok(false);
            }
            let mut buf = Vec::new();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                self.exhausted = true;
                return Ok(false);
            }
            // Invalid UTF-8 becomes U+FFFD, which the tokenizer rejects as a bad token.
            self.line = String::from_utf8_lossy(&buf).chars().collect();
            self.pos = 0;
        }
        Ok(true)
    }

    pub fn peek(&mut self) -> io::Result<Option<char>> {
        if self.fill()? {
            Ok(Some(self.line[self.pos]))
        } else {
            Ok(None)
        }
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.line.get(self.pos + n).copied()
    }

    pub fn next_char(&mut self) -> io::Result<Option<char>> {
        let c = self.peek()?;
        if c.is_some() {
            self.pos += 1;
        }
        Ok(c)
    }

    pub fn next_non_whitespace(&mut self) -> io::Result<Option<char>> {
        while let Some(c) = self.next_char()? {
            if !c.is_whitespace() {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// Returns `c` to the front of the stream.
    pub fn putback(&mut self, c: char) {
        if self.pos > 0 && self.line[self.pos - 1] == c {
            self.pos -= 1;
        } else {
            self.line.insert(self.pos, c);
        }
    }

    fn take_digits(&mut self, literal: &mut String) -> io::Result<()> {
        while let Some(c) = self.peek()? {
            if !c.is_ascii_digit() {
                break;
            }
            literal.push(c);
            self.pos += 1;
        }
        Ok(())
    }

    /// Reads `digits [. digits] [(e|E) [+|-] digits]` starting at the current
    /// position. An exponent marker without digits after it is left unread.
    pub fn read_number(&mut self) -> Result<f64, CalcError> {
        let mut literal = String::new();
        self.take_digits(&mut literal)?;

        if self.peek()? == Some('.') {
            literal.push('.');
            self.pos += 1;
            self.take_digits(&mut literal)?;
        }

        if !literal.chars().any(|c| c.is_ascii_digit()) {
            return Err(CalcError::Lex(format!("Bad number '{literal}'")));
        }

        if let Some(marker @ ('e' | 'E')) = self.peek()? {
            let sign = self.peek_ahead(1).filter(|&c| matches!(c, '+' | '-'));
            let digit_at = if sign.is_some() { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                literal.push(marker);
                literal.extend(sign);
                self.pos += digit_at;
                self.take_digits(&mut literal)?;
            }
        }

        match literal.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            Ok(_) => Err(CalcError::Lex(format!("Bad number '{literal}': out of range"))),
            Err(err) => Err(CalcError::Lex(format!("Bad number '{literal}': {err}"))),
        }
    }
}

/// Turns a character stream into [`Token`]s, with a single-token pushback slot.
#[derive(Debug)]
pub struct Tokenizer<R> {
    source: CharSource<R>,
    pushback: Option<Token>,
    syntax: Syntax,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_syntax(reader, Syntax::default())
    }

    pub fn with_syntax(reader: R, syntax: Syntax) -> Self {
        Self {
            source: CharSource::new(reader),
            pushback: None,
            syntax,
        }
    }

    /// Next token, or [`CalcError::Eof`] once the source is exhausted.
    pub fn next_token(&mut self) -> Result<Token, CalcError> {
        if let Some(token) = self.pushback.take() {
            trace!(?token, "token from pushback");
            return Ok(token);
        }

        let c = self.source.next_non_whitespace()?.ok_or(CalcError::Eof)?;

        let token = if let Some(symbol) = Symbol::from_char(c, self.syntax.separator) {
            Token::Punct(symbol)
        } else if c.is_ascii_digit() || c == '.' {
            self.source.putback(c);
            Token::Number(self.source.read_number()?)
        } else if c.is_alphabetic() {
            let mut word = String::from(c);
            while let Some(c) = self.source.peek()? {
                if !c.is_alphanumeric() {
                    break;
                }
                word.push(c);
                self.source.next_char()?;
            }

            if word == self.syntax.declare_keyword {
                Token::Keyword(Keyword::Let)
            } else if word == self.syntax.quit_keyword {
                Token::Keyword(Keyword::Quit)
            } else {
                Token::Identifier(word)
            }
        } else {
            return Err(CalcError::Lex(format!("Bad token '{c}'")));
        };

        trace!(?token, "token");
        Ok(token)
    }

    /// Unreads `token`. Two pushbacks without a `next_token` in between is an
    /// internal error.
    pub fn push_back(&mut self, token: Token) -> Result<(), CalcError> {
        if self.pushback.is_some() {
            return Err(CalcError::Internal("putback() into full buffer"));
        }
        trace!(?token, "push back");
        self.pushback = Some(token);
        Ok(())
    }

    /// Skips input up to and including the next `c`, or to end of input.
    pub fn discard_through(&mut self, c: char) -> Result<(), CalcError> {
        let separator = self.syntax.separator;
        if let Some(Token::Punct(symbol)) = &self.pushback {
            if symbol.as_char(separator) == c {
                self.pushback = None;
                debug!(%c, "resynchronized on pushed back token");
                return Ok(());
            }
        }
        self.pushback = None;

        let mut skipped = 0usize;
        while let Some(ch) = self.source.next_char()? {
            if ch == c {
                debug!(%c, skipped, "resynchronized");
                return Ok(());
            }
            skipped += 1;
        }
        debug!(skipped, "resynchronization reached end of input");
        Ok(())
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = Result<Token, CalcError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Err(CalcError::Eof) => None,
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokenizer(input: &str) -> Tokenizer<Cursor<&str>> {
        Tokenizer::new(Cursor::new(input))
    }

    fn tokens(input: &str) -> Vec<Token> {
        tokenizer(input).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            tokens("( ) + - * / % ; ="),
            vec![
                Token::Punct(Symbol::LeftParen),
                Token::Punct(Symbol::RightParen),
                Token::Punct(Symbol::Plus),
                Token::Punct(Symbol::Minus),
                Token::Punct(Symbol::Star),
                Token::Punct(Symbol::Slash),
                Token::Punct(Symbol::Percent),
                Token::Punct(Symbol::Separator),
                Token::Punct(Symbol::Equal),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("42 3.14 .5 7. 1e3 2.5E-2"),
            vec![
                Token::Number(42.0),
                Token::Number(3.14),
                Token::Number(0.5),
                Token::Number(7.0),
                Token::Number(1000.0),
                Token::Number(0.025),
            ]
        );
    }

    #[test]
    fn test_number_without_whitespace() {
        assert_eq!(
            tokens("2*3.5;"),
            vec![
                Token::Number(2.0),
                Token::Punct(Symbol::Star),
                Token::Number(3.5),
                Token::Punct(Symbol::Separator),
            ]
        );
    }

    #[test]
    fn test_dangling_exponent_is_not_consumed() {
        assert_eq!(
            tokens("2e"),
            vec![Token::Number(2.0), Token::Identifier("e".to_string())]
        );
        assert_eq!(
            tokens("2e+"),
            vec![
                Token::Number(2.0),
                Token::Identifier("e".to_string()),
                Token::Punct(Symbol::Plus),
            ]
        );
    }

    #[test]
    fn test_lone_dot_is_bad_number() {
        let mut lexer = tokenizer(". 1");
        assert!(matches!(lexer.next_token(), Err(CalcError::Lex(_))));
        assert_eq!(lexer.next_token().unwrap(), Token::Number(1.0));
    }

    #[test]
    fn test_out_of_range_number() {
        let mut lexer = tokenizer("1e400 2");
        match lexer.next_token() {
            Err(CalcError::Lex(msg)) => assert_eq!(msg, "Bad number '1e400': out of range"),
            other => panic!("expected lex error, got {other:?}"),
        }
        assert_eq!(lexer.next_token().unwrap(), Token::Number(2.0));
    }

    #[test]
    fn test_invalid_utf8_is_bad_token() {
        let mut lexer = Tokenizer::new(Cursor::new(&b"\xff 3"[..]));
        match lexer.next_token() {
            Err(CalcError::Lex(msg)) => assert!(msg.starts_with("Bad token")),
            other => panic!("expected lex error, got {other:?}"),
        }
        assert_eq!(lexer.next_token().unwrap(), Token::Number(3.0));
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            tokens("let x1 quit lettuce"),
            vec![
                Token::Keyword(Keyword::Let),
                Token::Identifier("x1".to_string()),
                Token::Keyword(Keyword::Quit),
                Token::Identifier("lettuce".to_string()),
            ]
        );
    }

    #[test]
    fn test_configured_keywords_and_separator() {
        let syntax = Syntax {
            separator: '!',
            declare_keyword: "var".to_string(),
            quit_keyword: "exit".to_string(),
        };
        let lexer = Tokenizer::with_syntax(Cursor::new("var let! exit"), syntax);
        let tokens: Vec<_> = lexer.map(|t| t.unwrap()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Let),
                Token::Identifier("let".to_string()),
                Token::Punct(Symbol::Separator),
                Token::Keyword(Keyword::Quit),
            ]
        );
    }

    #[test]
    fn test_bad_token() {
        let mut lexer = tokenizer("#");
        match lexer.next_token() {
            Err(CalcError::Lex(msg)) => assert!(msg.starts_with("Bad token")),
            other => panic!("expected lex error, got {other:?}"),
        }
        assert!(matches!(lexer.next_token(), Err(CalcError::Eof)));
    }

    #[test]
    fn test_push_back() {
        let mut lexer = tokenizer("1 2");
        let first = lexer.next_token().unwrap();
        lexer.push_back(first.clone()).unwrap();
        assert_eq!(lexer.next_token().unwrap(), first);
        assert_eq!(lexer.next_token().unwrap(), Token::Number(2.0));
    }

    #[test]
    fn test_double_push_back_is_internal_error() {
        let mut lexer = tokenizer("");
        lexer.push_back(Token::Number(1.0)).unwrap();
        let err = lexer.push_back(Token::Number(2.0)).unwrap_err();
        assert!(matches!(err, CalcError::Internal(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_discard_through_skips_past_separator() {
        let mut lexer = tokenizer("1 + # ) ; 4");
        lexer.next_token().unwrap();
        lexer.discard_through(';').unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Number(4.0));
    }

    #[test]
    fn test_discard_through_pushed_back_separator() {
        let mut lexer = tokenizer("; 5 ; 6");
        let sep = lexer.next_token().unwrap();
        lexer.push_back(sep).unwrap();
        lexer.discard_through(';').unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Number(5.0));
    }

    #[test]
    fn test_discard_through_clears_other_pushback() {
        let mut lexer = tokenizer("x ; 7");
        let ident = lexer.next_token().unwrap();
        lexer.push_back(ident).unwrap();
        lexer.discard_through(';').unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Number(7.0));
    }

    #[test]
    fn test_discard_through_to_end_of_input() {
        let mut lexer = tokenizer("1 2 3");
        lexer.discard_through(';').unwrap();
        assert!(matches!(lexer.next_token(), Err(CalcError::Eof)));
    }

    #[test]
    fn test_tokens_across_lines() {
        assert_eq!(
            tokens("1\n+\n2"),
            vec![
                Token::Number(1.0),
                Token::Punct(Symbol::Plus),
                Token::Number(2.0),
            ]
        );
    }
}
