//! Error types for sqlflow

use miette::Diagnostic;
use thiserror::Error;

/// Where users are pointed when the extended syntax does not parse.
pub const LANGUAGE_GUIDE: &str = "https://sqlflow.org/sqlflow/doc/language_guide";

/// Result type alias for sqlflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sqlflow
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("unknown dialect {dialect:?}")]
    #[diagnostic(
        code(sqlflow::unknown_dialect),
        help("supported dialects are mysql, tidb, hive, calcite, maxcompute and alisa")
    )]
    UnknownDialect { dialect: String },

    #[error("failed to parse standard SQL at offset {offset}: {message}")]
    #[diagnostic(code(sqlflow::dialect_parse_failure))]
    DialectParseFailure { message: String, offset: usize },

    #[error("unmatched quotation mark at offset {offset}")]
    #[diagnostic(code(sqlflow::unmatched_quote))]
    UnmatchedQuote { offset: usize },

    #[error("cannot find the end (*/) of the comment starting at offset {offset}")]
    #[diagnostic(code(sqlflow::unmatched_block_comment))]
    UnmatchedBlockComment { offset: usize },

    #[error("{message} near or before {near:?}. You might want to refer to the {}", LANGUAGE_GUIDE)]
    #[diagnostic(code(sqlflow::extension_syntax))]
    ExtensionSyntax {
        message: String,
        offset: usize,
        near: String,
    },

    #[error("SHOW TRAIN cannot follow a SELECT; a SELECT must be followed by TO TRAIN/PREDICT/EXPLAIN/EVALUATE/MAXIMIZE/MINIMIZE/RUN")]
    #[diagnostic(code(sqlflow::show_train_after_select))]
    ShowTrainAfterSelect { offset: usize },

    #[error("extended clause at offset {offset} has no leading SELECT")]
    #[diagnostic(code(sqlflow::extension_without_select))]
    ExtensionWithoutSelect { offset: usize },

    #[error("expecting one statement, got {count}")]
    #[diagnostic(code(sqlflow::multiple_statements))]
    MultipleStatementsInSingleStatement { count: usize },

    #[error("no parsed statements to analyze")]
    #[diagnostic(code(sqlflow::empty_program))]
    EmptyProgram,

    #[error("{message}, statement: {statement}")]
    #[diagnostic(code(sqlflow::graph_invariant))]
    GraphInvariant { message: String, statement: String },

    #[error("configuration error: {message}")]
    #[diagnostic(code(sqlflow::config_error))]
    Config { message: String },

    #[error("remote parser error: {message}")]
    #[diagnostic(code(sqlflow::remote_parser_error))]
    RemoteParser { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(sqlflow::io_error))]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Byte offset into the program for errors that carry one
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::DialectParseFailure { offset, .. }
            | Error::UnmatchedQuote { offset }
            | Error::UnmatchedBlockComment { offset }
            | Error::ExtensionSyntax { offset, .. }
            | Error::ShowTrainAfterSelect { offset }
            | Error::ExtensionWithoutSelect { offset } => Some(*offset),
            _ => None,
        }
    }

    /// Shift a positional error by `base` bytes.
    ///
    /// The pipeline parses suffixes of the program; this turns offsets
    /// relative to a suffix into offsets relative to the whole program.
    pub(crate) fn shifted(self, base: usize) -> Self {
        match self {
            Error::DialectParseFailure { message, offset } => Error::DialectParseFailure {
                message,
                offset: offset + base,
            },
            Error::UnmatchedQuote { offset } => Error::UnmatchedQuote { offset: offset + base },
            Error::UnmatchedBlockComment { offset } => Error::UnmatchedBlockComment {
                offset: offset + base,
            },
            Error::ExtensionSyntax {
                message,
                offset,
                near,
            } => Error::ExtensionSyntax {
                message,
                offset: offset + base,
                near,
            },
            Error::ShowTrainAfterSelect { offset } => Error::ShowTrainAfterSelect {
                offset: offset + base,
            },
            Error::ExtensionWithoutSelect { offset } => Error::ExtensionWithoutSelect {
                offset: offset + base,
            },
            other => other,
        }
    }
}

/// Calculate line and column number from byte offset
pub fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in input.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Get the line content at a given line number (1-indexed)
pub fn get_line_content(input: &str, line_num: usize) -> Option<&str> {
    input.lines().nth(line_num.saturating_sub(1))
}

/// Format a parse error with context
pub fn format_parse_error(input: &str, offset: usize, message: &str) -> String {
    let (line, col) = offset_to_line_col(input, offset);
    let line_content = get_line_content(input, line).unwrap_or("");

    // Create a pointer to the error position
    let pointer = " ".repeat(col.saturating_sub(1)) + "^";

    format!(
        "Parse error at line {}, column {}:\n  |\n{:>3} | {}\n  | {}\n  = {}",
        line, col, line, line_content, pointer, message
    )
}
