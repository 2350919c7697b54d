//! Process configuration
//!
//! Options are read from the environment. Nothing here is consulted eagerly:
//! the remote dialect parser reads the server options on its first call and
//! the dependency analyzer reads the graph path on each call.

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const PARSER_SERVER_PORT_VAR: &str = "SQLFLOW_PARSER_SERVER_PORT";
pub const PARSER_SERVER_LOADING_PATH_VAR: &str = "SQLFLOW_PARSER_SERVER_LOADING_PATH";
pub const GRAPHVIZ_OUTPUT_VAR: &str = "SQLFLOW_GRAPHVIZ_OUTPUT";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// TCP port of the external dialect parser server
    pub parser_server_port: Option<u16>,
    /// Directory holding the external parser server's jars
    pub parser_server_loading_path: Option<PathBuf>,
    /// Where to write the dependency graph in DOT format
    pub graphviz_output: Option<PathBuf>,
}

impl Config {
    /// Build a configuration from the `SQLFLOW_*` environment variables.
    ///
    /// Unset or empty variables leave the option unset. A port that is not
    /// a valid `u16` is rejected.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(port) = non_empty_var(PARSER_SERVER_PORT_VAR) {
            let port = port.trim().parse::<u16>().map_err(|_| Error::Config {
                message: format!("invalid {} value: {}", PARSER_SERVER_PORT_VAR, port),
            })?;
            config.parser_server_port = Some(port);
        }

        if let Some(path) = non_empty_var(PARSER_SERVER_LOADING_PATH_VAR) {
            config.parser_server_loading_path = Some(PathBuf::from(path));
        }

        if let Some(path) = non_empty_var(GRAPHVIZ_OUTPUT_VAR) {
            config.graphviz_output = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn with_parser_server_port(mut self, port: u16) -> Self {
        self.parser_server_port = Some(port);
        self
    }

    pub fn with_parser_server_loading_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.parser_server_loading_path = Some(path.into());
        self
    }

    pub fn with_graphviz_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.graphviz_output = Some(path.into());
        self
    }

    /// Port of the parser server, or a configuration error naming the variable
    pub fn require_parser_server_port(&self) -> Result<u16> {
        self.parser_server_port.ok_or_else(|| Error::Config {
            message: format!("{} is not set", PARSER_SERVER_PORT_VAR),
        })
    }

    /// Loading path of the parser server, or a configuration error naming the variable
    pub fn require_parser_server_loading_path(&self) -> Result<&PathBuf> {
        self.parser_server_loading_path
            .as_ref()
            .ok_or_else(|| Error::Config {
                message: format!("{} is not set", PARSER_SERVER_LOADING_PATH_VAR),
            })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
