//! Two-layer program parser
//!
//! A dialect parser splits the program into standard SQL statements until
//! it meets an extended clause. The extension grammar then parses that
//! clause and either completes the SELECT in front of it or stands alone
//! (`SHOW TRAIN`). The two alternate until the program is consumed.

pub mod comments;
pub mod expr;
pub mod lexer;
pub mod stmt;

use log::debug;

use crate::ast::{ExtensionStmt, Statement};
use crate::dialect::DialectRegistry;
use crate::error::{Error, Result};
use expr::Parser;
use lexer::{Lexer, Token};

/// Parse a program written in `dialect` using the process-wide registry
pub fn parse(dialect: &str, program: &str) -> Result<Vec<Statement>> {
    parse_with(DialectRegistry::global(), dialect, program)
}

/// Parse a program that must hold exactly one statement
pub fn parse_statement(dialect: &str, program: &str) -> Result<Statement> {
    let mut statements = parse(dialect, program)?;
    if statements.len() != 1 {
        return Err(Error::MultipleStatementsInSingleStatement {
            count: statements.len(),
        });
    }
    statements.pop().ok_or(Error::EmptyProgram)
}

/// Parse a program with the dialect parsers of `registry`.
///
/// Error offsets are relative to `program`.
pub fn parse_with(
    registry: &DialectRegistry,
    dialect: &str,
    program: &str,
) -> Result<Vec<Statement>> {
    let dialect_parser = registry.get(dialect)?;
    let mut all: Vec<Statement> = Vec::new();
    if program.trim().is_empty() {
        return Ok(all);
    }

    let mut base = 0;
    loop {
        // SELECT ...; SELECT * FROM t TO TRAIN ...
        //                             ^ stop
        // or
        // SELECT ...; SHOW TRAIN my_model;
        //             ^ stop
        let output = dialect_parser
            .parse(&program[base..])
            .map_err(|e| e.shifted(base))?;
        let ends_unfinished = output
            .statements
            .last()
            .map_or(false, |s| s.unfinished_select);
        all.extend(output.statements.into_iter().map(|s| {
            Statement::standard(s.text, s.inputs, s.outputs, s.unfinished_select)
        }));

        let Some(stop) = output.stopped_at else {
            return Ok(all);
        };
        base += stop;
        let rest = &program[base..];

        let (extension, consumed) = match parse_first_extension(rest) {
            Ok(parsed) => parsed,
            Err(e) => {
                if let Some(message) = output.error {
                    if !starts_with_extension(rest) {
                        return Err(Error::DialectParseFailure {
                            message,
                            offset: base,
                        });
                    }
                }
                return Err(e.shifted(base));
            }
        };
        let span = &rest[..consumed];

        if ends_unfinished {
            if extension.is_show_train() {
                return Err(Error::ShowTrainAfterSelect { offset: base });
            }
            if let Some(last) = all.last_mut() {
                debug!("attaching {} clause to SELECT at offset {}", extension.kind(), base);
                last.standard_select = Some(last.original.clone());
                last.original.push_str(span);
                last.extension = Some(extension);
                last.unfinished_select = false;
            }
        } else {
            if !extension.is_show_train() {
                return Err(Error::ExtensionWithoutSelect { offset: base });
            }
            debug!("standalone {} statement at offset {}", extension.kind(), base);
            all.push(Statement::extended(span, extension));
        }

        base += consumed;
        if program[base..].trim().is_empty() {
            return Ok(all);
        }
    }
}

/// Parse the extended statement at the start of `program`.
///
/// On a lexical error, the text before the error is parsed again: a
/// complete statement may precede a stray character or quote. If that
/// fails too, the first error is reported since it saw more input.
pub fn parse_first_extension(program: &str) -> Result<(ExtensionStmt, usize)> {
    let mut parser = Parser::new(program);
    let err = match stmt::parse_statement(&mut parser) {
        Ok(parsed) => return Ok((parsed, parser.end_position())),
        Err(e) => e,
    };

    if parser.hit_lexical_error() {
        if let Some(offset) = err.offset() {
            if let Ok(parsed) = stmt::parse_extension(&program[..offset]) {
                return Ok(parsed);
            }
        }
    }
    Err(err)
}

/// Whether `program` begins with `TO` or `SHOW`
fn starts_with_extension(program: &str) -> bool {
    matches!(
        Lexer::new(program).next_token().map(|t| t.token),
        Ok(Token::To | Token::Show)
    )
}
