//! Precedence-climbing query parser.
//!
//! Operands are parsed by [`Parser::parse_atom`]; binary operators are folded
//! in by [`Parser::maybe_binary`], which only accepts operators binding
//! tighter than the current floor and parses their right side with the
//! operator's own precedence as the new floor. Operand kinds are checked as
//! soon as each binary node is built.

use crate::ast::{Ast, Atom, AtomKind, BinaryOp};
use crate::error::{ParseErrorKind, QueryParseError};
use crate::lexer::{tokenize, Token, TokenKind};

/// Deepest nesting accepted, counting parentheses, `not` and the height of
/// the resulting tree. A flat chain `a b c …` is as deep as it is long.
pub const MAX_DEPTH: usize = 256;

/// Parse a query into its syntax tree.
///
/// ```
/// use finanse_query::parse;
///
/// let ast = parse("a or b and c").unwrap();
/// assert_eq!(ast.to_string(), "(a or (b and c))");
/// ```
pub fn parse(query: &str) -> Result<Ast> {
    let tokens = tokenize(query)?;
    Parser::new(query, tokens).run()
}

struct Parser<'q> {
    query: &'q str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

type Result<T> = std::result::Result<T, QueryParseError>;

impl<'q> Parser<'q> {
    const fn new(query: &'q str, tokens: Vec<Token>) -> Self {
        Self {
            query,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn run(mut self) -> Result<Ast> {
        let atom = self.parse_atom()?;
        let ast = self.maybe_binary(atom, 0)?;
        if self.pos < self.tokens.len() {
            return Err(self.error(ParseErrorKind::UnbalancedParenthesis));
        }
        match ast.as_atom() {
            Some(atom) if atom.kind != AtomKind::Tag => {
                Err(self.error(ParseErrorKind::Standalone(atom.value.clone())))
            }
            _ => Ok(ast),
        }
    }

    fn error(&self, kind: ParseErrorKind) -> QueryParseError {
        QueryParseError::new(self.query, kind)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn maybe_binary(&mut self, mut left: Ast, floor: u8) -> Result<Ast> {
        loop {
            let Some(token) = self.peek().filter(|t| t.kind == TokenKind::Operator) else {
                return Ok(left);
            };
            let op = BinaryOp::from_symbol(&token.text).ok_or_else(|| {
                self.error(ParseErrorKind::InvalidOperator(token.text.clone()))
            })?;
            if op.precedence() <= floor {
                return Ok(left);
            }
            self.advance();
            let operand = self.parse_atom()?;
            let right = self.maybe_binary(operand, op.precedence())?;
            left = self.binary(op, left, right)?;
        }
    }

    fn binary(&self, op: BinaryOp, left: Ast, right: Ast) -> Result<Ast> {
        if let BinaryOp::Relation(relation) = op {
            if !matches!(left.atom_kind(), Some(AtomKind::Tag | AtomKind::Keyword)) {
                return Err(self.invalid_left(op, &left));
            }
            if !matches!(right.atom_kind(), Some(AtomKind::Tag | AtomKind::String)) {
                return Err(self.error(ParseErrorKind::InvalidRightOperand {
                    operand: right.to_string(),
                    operator: op.symbol().to_string(),
                }));
            }
            if relation.is_textual() && left.atom_kind() != Some(AtomKind::Tag) {
                return Err(self.invalid_left(op, &left));
            }
        }
        let ast = Ast::binary(op, left, right);
        if ast.height() > MAX_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep));
        }
        Ok(ast)
    }

    fn invalid_left(&self, op: BinaryOp, left: &Ast) -> QueryParseError {
        self.error(ParseErrorKind::InvalidLeftOperand {
            operand: left.to_string(),
            operator: op.symbol().to_string(),
        })
    }

    fn parse_atom(&mut self) -> Result<Ast> {
        let Some(token) = self.peek() else {
            return Err(self.error(ParseErrorKind::UnexpectedEnd));
        };
        match token.kind {
            TokenKind::Operator if token.text == "not" => {
                self.advance();
                self.enter()?;
                let operand = self.parse_atom()?;
                self.leave();
                Ok(Ast::Not(Box::new(operand)))
            }
            TokenKind::Tag | TokenKind::Keyword | TokenKind::String => {
                let kind = match token.kind {
                    TokenKind::Tag => AtomKind::Tag,
                    TokenKind::Keyword => AtomKind::Keyword,
                    _ => AtomKind::String,
                };
                let text = token.text.clone();
                self.advance();
                Ok(Ast::Atom(Atom::new(kind, text)))
            }
            TokenKind::Punctuation if token.text == "(" => self.parse_parenthesized(),
            TokenKind::Punctuation => Err(self.error(ParseErrorKind::UnbalancedParenthesis)),
            TokenKind::Operator => Err(self.error(ParseErrorKind::MissingExpression)),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Ast> {
        self.advance();
        self.enter()?;
        let atom = self.parse_atom()?;
        let inner = self.maybe_binary(atom, 0)?;
        if !self.peek().is_some_and(|t| t.is_punctuation(")")) {
            return Err(self.error(ParseErrorKind::UnbalancedParenthesis));
        }
        self.advance();
        self.leave();
        Ok(inner)
    }
}
