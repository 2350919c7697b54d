//! Token cursor and expression parsing

use std::mem;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};
use crate::parser::lexer::{syntax_error, Lexer, SpannedToken, Token};

/// Deepest expression nesting accepted before parsing gives up
pub const MAX_NESTING_DEPTH: usize = 50;

/// Cursor over the tokens of one extended statement.
///
/// Tokens are lexed up front, stopping after the first `;`, at the end of
/// input, or at the first lexical error. Nothing past the `;` is read, so
/// the statement that follows is never looked at.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<SpannedToken>,
    pos: usize,
    lex_error: Option<Error>,
    lexical_failure: bool,
    end: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        let mut lex_error = None;

        loop {
            match lexer.next_token() {
                Ok(spanned) => {
                    let last = matches!(spanned.token, Token::Semicolon | Token::Eof);
                    tokens.push(spanned);
                    if last {
                        break;
                    }
                }
                Err(e) => {
                    lex_error = Some(e);
                    break;
                }
            }
        }

        Self {
            input,
            tokens,
            pos: 0,
            lex_error,
            lexical_failure: false,
            end: lexer.position(),
            depth: 0,
        }
    }

    /// Current token, or `None` past the last lexed token
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    pub fn advance(&mut self) -> Option<&SpannedToken> {
        let spanned = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(spanned)
    }

    /// Whether the current token has the same kind as `token`
    pub fn check(&self, token: &Token) -> bool {
        self.current()
            .map_or(false, |t| mem::discriminant(t) == mem::discriminant(token))
    }

    pub fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, token: &Token) -> Result<()> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.error(&token.to_string()))
        }
    }

    pub fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match self.current() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(what)),
        }
    }

    /// Expect a string literal and return it as written, quotes included
    pub fn expect_string(&mut self, what: &str) -> Result<String> {
        match self.current() {
            Some(Token::StringLiteral(raw)) => {
                let raw = raw.clone();
                self.pos += 1;
                Ok(raw)
            }
            _ => Err(self.error(what)),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.check(&Token::Eof)
    }

    /// Byte offset just past what the statement consumed: after its `;`,
    /// or at the end of input minus any trailing comments
    pub fn end_position(&self) -> usize {
        self.end
    }

    /// Start offset of the current token
    pub fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.start)
    }

    /// Whether the last reported error came from the lexer
    pub fn hit_lexical_error(&self) -> bool {
        self.lexical_failure
    }

    /// Error for an unexpected current token.
    ///
    /// Running past the lexed tokens means the lexer failed there, and its
    /// error is the one reported.
    pub fn error(&mut self, expected: &str) -> Error {
        match self.tokens.get(self.pos) {
            Some(spanned) => syntax_error(
                self.input,
                spanned.start,
                format!("syntax error: expected {}, found {}", expected, spanned.token),
            ),
            None => match self.lex_error.take() {
                Some(e) => {
                    self.lexical_failure = true;
                    e
                }
                None => syntax_error(
                    self.input,
                    self.end,
                    format!("syntax error: expected {}", expected),
                ),
            },
        }
    }

    /// Error located at an already consumed token
    pub fn error_at(&self, offset: usize, message: impl Into<String>) -> Error {
        syntax_error(self.input, offset, message)
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_at(self.position(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Parse an expression.
///
/// Precedence from loosest to tightest: `OR`, `AND`, `NOT`, comparisons,
/// `+ -`, `* / %`, `**` (right associative), unary minus.
pub fn parse_expression(parser: &mut Parser) -> Result<Expr> {
    parser.nested(parse_or)
}

fn parse_or(parser: &mut Parser) -> Result<Expr> {
    let mut lhs = parse_and(parser)?;
    while parser.consume(&Token::Or) {
        let rhs = parse_and(parser)?;
        lhs = Expr::binary(BinaryOp::Or, lhs, rhs);
    }
    Ok(lhs)
}

fn parse_and(parser: &mut Parser) -> Result<Expr> {
    let mut lhs = parse_not(parser)?;
    while parser.consume(&Token::And) {
        let rhs = parse_not(parser)?;
        lhs = Expr::binary(BinaryOp::And, lhs, rhs);
    }
    Ok(lhs)
}

fn parse_not(parser: &mut Parser) -> Result<Expr> {
    if parser.consume(&Token::Not) {
        let operand = parser.nested(parse_not)?;
        return Ok(Expr::unary(UnaryOp::Not, operand));
    }
    parse_comparison(parser)
}

fn comparison_op(token: Option<&Token>) -> Option<BinaryOp> {
    match token? {
        Token::Lt => Some(BinaryOp::Lt),
        Token::LtEq => Some(BinaryOp::LtEq),
        Token::Gt => Some(BinaryOp::Gt),
        Token::GtEq => Some(BinaryOp::GtEq),
        Token::Eq => Some(BinaryOp::Eq),
        Token::NotEq => Some(BinaryOp::NotEq),
        _ => None,
    }
}

fn parse_comparison(parser: &mut Parser) -> Result<Expr> {
    let mut lhs = parse_additive(parser)?;
    while let Some(op) = comparison_op(parser.current()) {
        parser.advance();
        let rhs = parse_additive(parser)?;
        lhs = Expr::binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn parse_additive(parser: &mut Parser) -> Result<Expr> {
    let mut lhs = parse_multiplicative(parser)?;
    loop {
        let op = match parser.current() {
            Some(Token::Plus) => BinaryOp::Plus,
            Some(Token::Minus) => BinaryOp::Minus,
            _ => return Ok(lhs),
        };
        parser.advance();
        let rhs = parse_multiplicative(parser)?;
        lhs = Expr::binary(op, lhs, rhs);
    }
}

fn parse_multiplicative(parser: &mut Parser) -> Result<Expr> {
    let mut lhs = parse_power(parser)?;
    loop {
        let op = match parser.current() {
            Some(Token::Star) => BinaryOp::Multiply,
            Some(Token::Slash) => BinaryOp::Divide,
            Some(Token::Percent) => BinaryOp::Modulo,
            _ => return Ok(lhs),
        };
        parser.advance();
        let rhs = parse_power(parser)?;
        lhs = Expr::binary(op, lhs, rhs);
    }
}

fn parse_power(parser: &mut Parser) -> Result<Expr> {
    let base = parse_unary(parser)?;
    if parser.consume(&Token::Power) {
        let exponent = parser.nested(parse_power)?;
        return Ok(Expr::binary(BinaryOp::Power, base, exponent));
    }
    Ok(base)
}

fn parse_unary(parser: &mut Parser) -> Result<Expr> {
    if parser.consume(&Token::Minus) {
        let operand = parser.nested(parse_unary)?;
        return Ok(Expr::unary(UnaryOp::Neg, operand));
    }
    parse_primary(parser)
}

/// Comma separated expressions up to and including `close`
fn parse_expression_list(parser: &mut Parser, close: &Token) -> Result<Vec<Expr>> {
    let mut items = Vec::new();
    if parser.consume(close) {
        return Ok(items);
    }
    loop {
        items.push(parse_expression(parser)?);
        if !parser.consume(&Token::Comma) {
            break;
        }
    }
    parser.expect(close)?;
    Ok(items)
}

fn parse_primary(parser: &mut Parser) -> Result<Expr> {
    let expr = match parser.current() {
        Some(Token::NumberLiteral(text)) => Expr::Number(text.clone()),
        Some(Token::StringLiteral(raw)) => Expr::String(raw.clone()),
        Some(Token::Identifier(name)) => {
            let name = name.clone();
            parser.advance();
            if parser.consume(&Token::LParen) {
                let args = parse_expression_list(parser, &Token::RParen)?;
                return Ok(Expr::Call { name, args });
            }
            return Ok(Expr::Ident(name));
        }
        Some(Token::LBracket) => {
            parser.advance();
            let items = parse_expression_list(parser, &Token::RBracket)?;
            return Ok(Expr::List(items));
        }
        Some(Token::LParen) => {
            parser.advance();
            let inner = parse_expression(parser)?;
            parser.expect(&Token::RParen)?;
            return Ok(Expr::Paren(Box::new(inner)));
        }
        _ => return Err(parser.error("an expression")),
    };
    parser.advance();
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(input: &str) -> Expr {
        let mut parser = Parser::new(input);
        parse_expression(&mut parser).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            expr("a + b * c"),
            Expr::binary(
                BinaryOp::Plus,
                Expr::ident("a"),
                Expr::binary(BinaryOp::Multiply, Expr::ident("b"), Expr::ident("c")),
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            expr("2 ** 3 ** 4"),
            Expr::binary(
                BinaryOp::Power,
                Expr::number("2"),
                Expr::binary(BinaryOp::Power, Expr::number("3"), Expr::number("4")),
            )
        );
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let ok = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH - 1), ")".repeat(MAX_NESTING_DEPTH - 1));
        assert!(parse_expression(&mut Parser::new(&ok)).is_ok());

        let deep = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH), ")".repeat(MAX_NESTING_DEPTH));
        let err = parse_expression(&mut Parser::new(&deep)).unwrap_err();
        assert_eq!(err.offset(), Some(MAX_NESTING_DEPTH));
    }

    #[test]
    fn cursor_stops_after_semicolon() {
        let parser = Parser::new("a; b c");
        assert_eq!(parser.end_position(), 2);
    }
}
