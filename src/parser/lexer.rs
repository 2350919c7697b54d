//! Extension clause tokenization
//!
//! This module breaks the tail of a statement (`TO TRAIN ...`,
//! `SHOW TRAIN ...`) into tokens. Identifiers are permissive so that model
//! names and image references like `registry.io/team/model:v0.2` lex as a
//! single token.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Characters of input shown after an error position
const NEAR_WINDOW: usize = 30;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]*[.]?[0-9]+([eE][-+]?[0-9]+)?").unwrap());

/// Token types for the extension lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Select,
    From,
    Where,
    Limit,
    Train,
    Predict,
    Explain,
    Evaluate,
    Run,
    Maximize,
    Minimize,
    Using,
    With,
    Cmd,
    Column,
    For,
    Label,
    Into,
    Constraint,
    And,
    Or,
    Not,
    As,
    To,
    Show,
    Group,
    By,

    // Identifiers and literals
    Identifier(String),
    /// String literal as written, quotes included
    StringLiteral(String),
    NumberLiteral(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power, // **
    Eq,
    NotEq, // != or <>
    Lt,
    LtEq,
    Gt,
    GtEq,
    Bang,

    // Punctuation
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Select => "SELECT",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::Limit => "LIMIT",
            Token::Train => "TRAIN",
            Token::Predict => "PREDICT",
            Token::Explain => "EXPLAIN",
            Token::Evaluate => "EVALUATE",
            Token::Run => "RUN",
            Token::Maximize => "MAXIMIZE",
            Token::Minimize => "MINIMIZE",
            Token::Using => "USING",
            Token::With => "WITH",
            Token::Cmd => "CMD",
            Token::Column => "COLUMN",
            Token::For => "FOR",
            Token::Label => "LABEL",
            Token::Into => "INTO",
            Token::Constraint => "CONSTRAINT",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::As => "AS",
            Token::To => "TO",
            Token::Show => "SHOW",
            Token::Group => "GROUP",
            Token::By => "BY",
            Token::Identifier(s) | Token::StringLiteral(s) | Token::NumberLiteral(s) => s,
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Power => "**",
            Token::Eq => "=",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Bang => "!",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// Look up a reserved word, case-insensitively
pub fn keyword(word: &str) -> Option<Token> {
    let token = match word.to_ascii_uppercase().as_str() {
        "SELECT" => Token::Select,
        "FROM" => Token::From,
        "WHERE" => Token::Where,
        "LIMIT" => Token::Limit,
        "TRAIN" => Token::Train,
        "PREDICT" => Token::Predict,
        "EXPLAIN" => Token::Explain,
        "EVALUATE" => Token::Evaluate,
        "RUN" => Token::Run,
        "MAXIMIZE" => Token::Maximize,
        "MINIMIZE" => Token::Minimize,
        "USING" => Token::Using,
        "WITH" => Token::With,
        "CMD" => Token::Cmd,
        "COLUMN" => Token::Column,
        "FOR" => Token::For,
        "LABEL" => Token::Label,
        "INTO" => Token::Into,
        "CONSTRAINT" => Token::Constraint,
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "AS" => Token::As,
        "TO" => Token::To,
        "SHOW" => Token::Show,
        "GROUP" => Token::Group,
        "BY" => Token::By,
        _ => return None,
    };
    Some(token)
}

/// A token with its byte range in the lexed input
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '/' | ':' | '-')
}

/// Build the error reported for a failure at `offset`, quoting the input
/// that follows it
pub fn syntax_error(input: &str, offset: usize, message: impl Into<String>) -> Error {
    let near = input
        .get(offset..)
        .unwrap_or("")
        .chars()
        .take(NEAR_WINDOW)
        .collect();
    Error::ExtensionSyntax {
        message: message.into(),
        offset,
        near,
    }
}

/// Hand-written lexer over a string slice
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and comments. Returns whether a comment was skipped.
    fn skip_trivia(&mut self) -> Result<bool> {
        let mut skipped_comment = false;
        loop {
            while self.peek().map_or(false, char::is_whitespace) {
                self.bump();
            }

            if self.rest().starts_with("--") {
                let len = self.rest().find('\n').unwrap_or(self.rest().len());
                self.pos += len;
                skipped_comment = true;
            } else if self.rest().starts_with("/*") {
                let start = self.pos;
                match self.rest()[2..].find("*/") {
                    Some(len) => self.pos += len + 4,
                    None => return Err(Error::UnmatchedBlockComment { offset: start }),
                }
                skipped_comment = true;
            } else {
                return Ok(skipped_comment);
            }
        }
    }

    /// Lex the next token.
    ///
    /// When only comments remain, the lexer rewinds to where it was before
    /// them, so the comments are left to whatever follows this statement.
    pub fn next_token(&mut self) -> Result<SpannedToken> {
        let before = self.pos;
        let skipped_comment = self.skip_trivia()?;
        let start = self.pos;

        let Some(c) = self.peek() else {
            if skipped_comment {
                self.pos = before;
            }
            return Ok(SpannedToken {
                token: Token::Eof,
                start,
                end: start,
            });
        };

        let token = if c.is_alphabetic() {
            self.lex_ident_or_keyword()
        } else if c.is_ascii_digit() {
            self.lex_number()
        } else if c == '"' || c == '\'' {
            self.lex_string()?
        } else if "+-*/%<>=()[]{},;!".contains(c) {
            self.lex_operator()
        } else {
            return Err(syntax_error(
                self.input,
                start,
                format!("unexpected character {:?}", c),
            ));
        };

        Ok(SpannedToken {
            token,
            start,
            end: self.pos,
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        loop {
            while self.peek().map_or(false, is_ident_char) {
                self.bump();
            }
            // a dot only joins two name parts
            if self.peek() == Some('.') && self.peek_second().map_or(false, is_ident_char) {
                self.bump();
            } else {
                break;
            }
        }

        let word = &self.input[start..self.pos];
        keyword(word).unwrap_or_else(|| Token::Identifier(word.to_string()))
    }

    fn lex_number(&mut self) -> Token {
        // the caller saw a digit, so the pattern matches at least one char
        let len = NUMBER.find(self.rest()).map_or(1, |m| m.end());
        let text = &self.rest()[..len];
        self.pos += len;
        Token::NumberLiteral(text.to_string())
    }

    fn lex_string(&mut self) -> Result<Token> {
        let start = self.pos;
        let quote = self.bump();
        loop {
            match self.bump() {
                None => return Err(Error::UnmatchedQuote { offset: start }),
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(Error::UnmatchedQuote { offset: start });
                    }
                }
                Some(c) if Some(c) == quote => break,
                Some(_) => {}
            }
        }
        Ok(Token::StringLiteral(self.input[start..self.pos].to_string()))
    }

    fn lex_operator(&mut self) -> Token {
        let c = self.bump();
        let next = self.peek();
        let (token, extra) = match (c, next) {
            (Some('*'), Some('*')) => (Token::Power, true),
            (Some('<'), Some('=')) => (Token::LtEq, true),
            (Some('>'), Some('=')) => (Token::GtEq, true),
            (Some('!'), Some('=')) => (Token::NotEq, true),
            (Some('<'), Some('>')) => (Token::NotEq, true),
            (Some('+'), _) => (Token::Plus, false),
            (Some('-'), _) => (Token::Minus, false),
            (Some('*'), _) => (Token::Star, false),
            (Some('/'), _) => (Token::Slash, false),
            (Some('%'), _) => (Token::Percent, false),
            (Some('<'), _) => (Token::Lt, false),
            (Some('>'), _) => (Token::Gt, false),
            (Some('='), _) => (Token::Eq, false),
            (Some('('), _) => (Token::LParen, false),
            (Some(')'), _) => (Token::RParen, false),
            (Some('['), _) => (Token::LBracket, false),
            (Some(']'), _) => (Token::RBracket, false),
            (Some('{'), _) => (Token::LBrace, false),
            (Some('}'), _) => (Token::RBrace, false),
            (Some(','), _) => (Token::Comma, false),
            (Some(';'), _) => (Token::Semicolon, false),
            _ => (Token::Bang, false),
        };
        if extra {
            self.bump();
        }
        token
    }
}

/// Tokenize the whole input, excluding the final [`Token::Eof`]
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let spanned = lexer.next_token()?;
        if spanned.token == Token::Eof {
            return Ok(tokens);
        }
        tokens.push(spanned.token);
    }
}
