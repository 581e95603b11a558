use miette::Diagnostic;
use thiserror::Error;

/// Characters the tokenizer already gives a meaning to.
const RESERVED: &[char] = &['(', ')', '+', '-', '*', '/', '%', '=', '.'];

#[derive(Diagnostic, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("separator {0:?} clashes with an operator, digit, letter or whitespace")]
    #[diagnostic(code(config::separator), help("pick a punctuation character such as ';'"))]
    BadSeparator(char),

    #[error("keyword {0:?} is not a word")]
    #[diagnostic(
        code(config::keyword),
        help("keywords start with a letter and contain only letters and digits")
    )]
    BadKeyword(String),

    #[error("declaration and quit keywords are both {0:?}")]
    #[diagnostic(code(config::keyword))]
    SameKeywords(String),
}

/// The configurable parts of the statement grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub separator: char,
    pub declare_keyword: String,
    pub quit_keyword: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            separator: ';',
            declare_keyword: "let".to_string(),
            quit_keyword: "quit".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub syntax: Syntax,
    pub prompt: String,
    pub result_marker: String,
    /// Declare `pi` and `e` before the first statement.
    pub seed_constants: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            syntax: Syntax::default(),
            prompt: "> ".to_string(),
            result_marker: "= ".to_string(),
            seed_constants: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sep = self.syntax.separator;
        if sep.is_alphanumeric() || sep.is_whitespace() || RESERVED.contains(&sep) {
            return Err(ConfigError::BadSeparator(sep));
        }

        for keyword in [&self.syntax.declare_keyword, &self.syntax.quit_keyword] {
            let mut chars = keyword.chars();
            let starts_alpha = chars.next().is_some_and(char::is_alphabetic);
            if !starts_alpha || !chars.all(char::is_alphanumeric) {
                return Err(ConfigError::BadKeyword(keyword.clone()));
            }
        }

        if self.syntax.declare_keyword == self.syntax.quit_keyword {
            return Err(ConfigError::SameKeywords(self.syntax.quit_keyword.clone()));
        }

        Ok(())
    }
}
