//! sqlflow - Parser and dependency analyzer for SQL programs with
//! machine-learning extensions
//!
//! Programs mix standard SQL statements with extended clauses such as
//! `SELECT ... TO TRAIN ...` or `SHOW TRAIN model`. [`parse`] splits a
//! program into [`ast::Statement`] records, and [`analyze`] orders them
//! by the tables they read and write.

pub mod ast;
pub mod cli;
pub mod config;
pub mod deps;
pub mod dialect;
pub mod error;
pub mod formatter;
pub mod parser;

pub use config::Config;
pub use deps::{analyze, analyze_with};
pub use error::{Error, Result};
pub use formatter::format_extension;
pub use parser::{parse, parse_statement, parse_with};
