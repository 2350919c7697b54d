//! In-process dialect parser built on `sqlparser`

use log::debug;
use sqlparser::ast::Statement as SqlStatement;
use sqlparser::dialect::Dialect;
use sqlparser::parser::Parser;

use super::split::{find_extension_start, leading_trivia_len, split_statements};
use super::tables::extract_tables;
use super::{DialectOutput, DialectParser, DialectStatement};
use crate::Result;

/// Dialect parser that runs `sqlparser` on each statement of the program.
///
/// `sqlparser` keeps no global state, so one instance serves concurrent
/// callers without locking.
pub struct EmbeddedParser {
    name: String,
    dialect: Box<dyn Dialect + Send + Sync>,
}

impl EmbeddedParser {
    pub fn new(name: impl Into<String>, dialect: Box<dyn Dialect + Send + Sync>) -> Self {
        Self {
            name: name.into(),
            dialect,
        }
    }

    fn parse_sql(&self, sql: &str) -> std::result::Result<Vec<SqlStatement>, String> {
        Parser::parse_sql(self.dialect.as_ref(), sql).map_err(|e| e.to_string())
    }

    /// The single query `sql` holds, if that is all it holds
    fn parse_single_query(&self, sql: &str) -> Option<SqlStatement> {
        let statements = self.parse_sql(sql).ok()?;
        if statements.len() != 1 {
            return None;
        }
        statements
            .into_iter()
            .next()
            .filter(|s| matches!(s, SqlStatement::Query(_)))
    }
}

/// Whether `piece` is nothing but a `;` after leading whitespace and comments
fn is_bare_semicolon(piece: &str) -> bool {
    piece[leading_trivia_len(piece)..].trim_end() == ";"
}

impl DialectParser for EmbeddedParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, program: &str) -> Result<DialectOutput> {
        let mut output = DialectOutput::default();
        let mut pos = 0;

        for piece in split_statements(program) {
            let trivia = leading_trivia_len(piece);
            let text_start = piece.len() - piece.trim_start().len();
            let stop = pos + trivia;

            if let Some(k) = find_extension_start(&piece[trivia..]) {
                if k == 0 {
                    debug!("{}: extended statement at offset {}", self.name, stop);
                    output.stopped_at = Some(stop);
                    return Ok(output);
                }

                let prefix = &piece[..trivia + k];
                if let Some(query) = self.parse_single_query(prefix) {
                    let tables = extract_tables(&query);
                    output.statements.push(DialectStatement {
                        text: prefix[text_start..].to_string(),
                        inputs: tables.inputs,
                        outputs: tables.outputs,
                        unfinished_select: true,
                    });
                    debug!("{}: unfinished SELECT, extension at offset {}", self.name, stop + k);
                    output.stopped_at = Some(stop + k);
                    return Ok(output);
                }
            }

            match self.parse_sql(piece) {
                Ok(statements) => match statements.as_slice() {
                    [statement] => {
                        let tables = extract_tables(statement);
                        output.statements.push(DialectStatement {
                            text: piece[text_start..].to_string(),
                            inputs: tables.inputs,
                            outputs: tables.outputs,
                            unfinished_select: false,
                        });
                    }
                    [] => {
                        if is_bare_semicolon(piece) {
                            output.statements.push(DialectStatement {
                                text: piece[text_start..].to_string(),
                                ..Default::default()
                            });
                        }
                    }
                    _ => {
                        output.stopped_at = Some(stop);
                        output.error = Some(format!(
                            "expected one statement, found {}",
                            statements.len()
                        ));
                        return Ok(output);
                    }
                },
                Err(message) => {
                    debug!("{}: stopped at offset {}: {}", self.name, stop, message);
                    output.stopped_at = Some(stop);
                    output.error = Some(message);
                    return Ok(output);
                }
            }

            pos += piece.len();
        }

        Ok(output)
    }
}
