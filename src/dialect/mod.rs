//! Standard SQL dialect parsers
//!
//! A dialect parser consumes as many standard SQL statements as it can from
//! the start of a program and reports where it stopped. It stops at an
//! extended clause (`TO ...`, `SHOW TRAIN ...`) or at SQL it cannot parse.

pub mod embedded;
pub mod remote;
pub mod split;
pub mod tables;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use sqlparser::dialect::MySqlDialect;

use crate::config::Config;
use crate::error::{Error, Result};
use embedded::EmbeddedParser;
use remote::{RemoteConnection, RemoteParser};

/// Dialects parsed in process
pub const EMBEDDED_DIALECTS: &[&str] = &["mysql", "tidb"];

/// Dialects parsed by the external parser server
pub const REMOTE_DIALECTS: &[&str] = &["hive", "calcite", "maxcompute", "alisa"];

/// One standard SQL statement as reported by a dialect parser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialectStatement {
    pub text: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// The statement is a SELECT whose extended tail starts at the stop offset
    pub unfinished_select: bool,
}

/// Result of running a dialect parser over a program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialectOutput {
    pub statements: Vec<DialectStatement>,
    /// Byte offset where parsing stopped, `None` if the program was consumed
    pub stopped_at: Option<usize>,
    /// Parser message when the stop was caused by invalid SQL
    pub error: Option<String>,
}

/// A standard SQL front end
pub trait DialectParser: Send + Sync {
    fn name(&self) -> &str;

    fn parse(&self, program: &str) -> Result<DialectOutput>;
}

/// Dialect parsers by name
pub struct DialectRegistry {
    parsers: HashMap<String, Arc<dyn DialectParser>>,
}

static GLOBAL: Lazy<DialectRegistry> =
    Lazy::new(|| DialectRegistry::with_connection(Arc::new(RemoteConnection::from_env())));

impl DialectRegistry {
    /// Registry whose remote dialects use the server described by `config`
    pub fn new(config: Config) -> Self {
        Self::with_connection(Arc::new(RemoteConnection::new(config)))
    }

    /// Process-wide registry configured from the environment on first use
    pub fn global() -> &'static DialectRegistry {
        &GLOBAL
    }

    /// Registry with no dialects
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    fn with_connection(connection: Arc<RemoteConnection>) -> Self {
        let mut registry = Self::empty();
        for name in EMBEDDED_DIALECTS {
            registry.register(Arc::new(EmbeddedParser::new(*name, Box::new(MySqlDialect {}))));
        }
        for name in REMOTE_DIALECTS {
            registry.register(Arc::new(RemoteParser::new(*name, Arc::clone(&connection))));
        }
        registry
    }

    /// Add or replace the parser registered under `parser.name()`
    pub fn register(&mut self, parser: Arc<dyn DialectParser>) {
        self.parsers.insert(parser.name().to_string(), parser);
    }

    pub fn get(&self, dialect: &str) -> Result<Arc<dyn DialectParser>> {
        self.parsers
            .get(dialect)
            .cloned()
            .ok_or_else(|| Error::UnknownDialect {
                dialect: dialect.to_string(),
            })
    }

    /// Registered dialect names, sorted
    pub fn dialects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
