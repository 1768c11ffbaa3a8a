//! Query tokenizer built on Logos.
//!
//! Logos produces the raw words, operators, strings and parentheses; words
//! are then classified into tags, keywords and word operators, and an
//! implicit `and` is inserted between two adjacent tags so that `food shop`
//! means `food and shop`.

use logos::Logos;
use std::fmt;

use crate::error::{ParseErrorKind, QueryParseError};

/// Words with a fixed meaning on the left side of a comparison.
pub const KEYWORDS: &[&str] = &["date", "money", "currency"];

/// Operators spelled as words.
pub const WORD_OPERATORS: &[&str] = &["and", "or", "not"];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n]+")]
enum RawToken<'src> {
    #[token("(")]
    Open,

    #[token(")")]
    Close,

    /// One operator character, optionally followed by `=` or `>`.
    #[regex(r"[><=!^$*][=>]?", |lex| lex.slice())]
    Operator(&'src str),

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    String(&'src str),

    /// Anything else up to whitespace, a parenthesis or an operator.
    #[regex(r#"[^ \t\n()<>=!^$*"'][^ \t\n()<>=!^$*]*"#, |lex| lex.slice())]
    Word(&'src str),
}

fn unquote<'src>(lex: &logos::Lexer<'src, RawToken<'src>>) -> &'src str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

/// Kind of a query token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A tag name, or a bare literal on the right side of a comparison.
    Tag,
    /// `date`, `money` or `currency`.
    Keyword,
    /// A symbolic or word operator.
    Operator,
    /// `(` or `)`.
    Punctuation,
    /// A quoted literal, without its quotes.
    String,
}

/// A query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The token text.
    pub text: String,
}

impl Token {
    /// Create a token.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Check whether this is the punctuation `text`.
    pub fn is_punctuation(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }

    /// Check whether this is the operator `text`.
    pub fn is_operator(&self, text: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Split a query into tokens.
///
/// The only lexical error is an unterminated string.
///
/// ```
/// use finanse_query::lexer::{tokenize, Token, TokenKind};
///
/// let tokens = tokenize("food shop").unwrap();
/// assert_eq!(tokens[1], Token::new(TokenKind::Operator, "and"));
/// ```
pub fn tokenize(query: &str) -> Result<Vec<Token>, QueryParseError> {
    let mut tokens: Vec<Token> = Vec::new();
    for raw in RawToken::lexer(query) {
        let raw = raw.map_err(|()| QueryParseError::new(query, ParseErrorKind::UnexpectedEnd))?;
        let token = match raw {
            RawToken::Open => Token::new(TokenKind::Punctuation, "("),
            RawToken::Close => Token::new(TokenKind::Punctuation, ")"),
            RawToken::Operator(op) => Token::new(TokenKind::Operator, op),
            RawToken::String(text) => Token::new(TokenKind::String, text),
            RawToken::Word(word) => Token::new(classify(word), word),
        };
        if token.kind == TokenKind::Tag
            && tokens.last().is_some_and(|last| last.kind == TokenKind::Tag)
        {
            tokens.push(Token::new(TokenKind::Operator, "and"));
        }
        tokens.push(token);
    }
    tracing::trace!(query, count = tokens.len(), "tokenized query");
    Ok(tokens)
}

fn classify(word: &str) -> TokenKind {
    if KEYWORDS.contains(&word) {
        TokenKind::Keyword
    } else if WORD_OPERATORS.contains(&word) {
        TokenKind::Operator
    } else {
        TokenKind::Tag
    }
}
