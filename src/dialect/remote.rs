//! Dialect parser served by an external parser server
//!
//! Hive, Calcite and MaxCompute grammars live in a separate server process.
//! Requests and responses are single JSON objects, one per line, over a
//! local TCP connection:
//!
//! ```text
//! -> {"dialect": "hive", "sql_program": "SELECT 1; SELECT 2 TO TRAIN ..."}
//! <- {"sql_statements": [{"statement": "SELECT 1", "inputs": [], "outputs": [],
//!      "is_unfinished_select": false}, ...], "index": 10, "error": ""}
//! ```
//!
//! An `index` of -1 means the whole program was consumed.

use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, TcpStream};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{DialectOutput, DialectParser, DialectStatement};
use crate::config::Config;
use crate::error::{Error, Result};

const SERVER_MAIN_CLASS: &str = "org.sqlflow.parser.ParserServer";
const CONNECT_ATTEMPTS: usize = 3;
const CONNECT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    dialect: &'a str,
    sql_program: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteStatement {
    statement: String,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    is_unfinished_select: bool,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    sql_statements: Vec<RemoteStatement>,
    index: i64,
    #[serde(default)]
    error: String,
}

struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    fn new(stream: TcpStream) -> Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    fn call(&mut self, request: &ParseRequest<'_>) -> Result<ParseResponse> {
        let mut line = serde_json::to_string(request).map_err(|e| Error::RemoteParser {
            message: format!("cannot encode request: {}", e),
        })?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(Error::RemoteParser {
                message: "parser server closed the connection".to_string(),
            });
        }
        serde_json::from_str(&reply).map_err(|e| Error::RemoteParser {
            message: format!("malformed response: {}", e),
        })
    }
}

/// Process-wide connection to the parser server, opened on first use
pub struct RemoteConnection {
    /// `None` reads the configuration from the environment when connecting
    config: Option<Config>,
    client: Mutex<Option<Client>>,
}

impl RemoteConnection {
    pub fn new(config: Config) -> Self {
        Self {
            config: Some(config),
            client: Mutex::new(None),
        }
    }

    pub fn from_env() -> Self {
        Self {
            config: None,
            client: Mutex::new(None),
        }
    }

    fn connect(&self) -> Result<Client> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => Config::from_env()?,
        };
        let port = config.require_parser_server_port()?;
        let addr = (Ipv4Addr::LOCALHOST, port);

        if let Ok(stream) = TcpStream::connect(addr) {
            debug!("connected to parser server on port {}", port);
            return Client::new(stream);
        }

        let loading_path = config.require_parser_server_loading_path()?;
        let classpath = loading_path.join("*");
        info!(
            "starting parser server on port {} from {}",
            port,
            loading_path.display()
        );
        Command::new("java")
            .arg("-cp")
            .arg(&classpath)
            .arg(SERVER_MAIN_CLASS)
            .arg("-p")
            .arg(port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        for attempt in 1..=CONNECT_ATTEMPTS {
            thread::sleep(CONNECT_INTERVAL);
            match TcpStream::connect(addr) {
                Ok(stream) => return Client::new(stream),
                Err(e) => warn!(
                    "parser server not ready on port {} (attempt {}/{}): {}",
                    port, attempt, CONNECT_ATTEMPTS, e
                ),
            }
        }

        Err(Error::RemoteParser {
            message: format!("parser server did not start listening on port {}", port),
        })
    }

    fn call(&self, request: &ParseRequest<'_>) -> Result<ParseResponse> {
        let mut guard = self.client.lock();
        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        let Some(client) = guard.as_mut() else {
            return Err(Error::RemoteParser {
                message: "no connection to the parser server".to_string(),
            });
        };

        let response = client.call(request);
        if response.is_err() {
            // reconnect on the next call
            *guard = None;
        }
        response
    }
}

/// Dialect parser that forwards programs to the parser server
pub struct RemoteParser {
    dialect: String,
    connection: Arc<RemoteConnection>,
}

impl RemoteParser {
    pub fn new(dialect: impl Into<String>, connection: Arc<RemoteConnection>) -> Self {
        Self {
            dialect: dialect.into(),
            connection,
        }
    }
}

impl DialectParser for RemoteParser {
    fn name(&self) -> &str {
        &self.dialect
    }

    fn parse(&self, program: &str) -> Result<DialectOutput> {
        let response = self.connection.call(&ParseRequest {
            dialect: &self.dialect,
            sql_program: program,
        })?;

        if !response.error.is_empty() {
            return Err(Error::RemoteParser {
                message: response.error,
            });
        }

        let stopped_at = match response.index {
            -1 => None,
            i if i >= 0 && program.is_char_boundary(i as usize) => Some(i as usize),
            i => {
                return Err(Error::RemoteParser {
                    message: format!("index {} out of range", i),
                })
            }
        };

        let statements = response
            .sql_statements
            .into_iter()
            .map(|s| DialectStatement {
                text: s.statement,
                inputs: s.inputs,
                outputs: s.outputs,
                unfinished_select: s.is_unfinished_select,
            })
            .collect();

        Ok(DialectOutput {
            statements,
            stopped_at,
            error: None,
        })
    }
}
