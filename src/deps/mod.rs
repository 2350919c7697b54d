//! Table-level dependency graph of a parsed program
//!
//! Every statement becomes a node. Tables become versioned nodes: each write
//! to a table allocates the next hazard index, so a reader always points at
//! the version written most recently before it. Writers additionally depend
//! on earlier readers (write-after-read) and earlier writers
//! (write-after-write) of the same table, so executing the graph in any
//! topological order preserves the program's semantics.

pub mod graphviz;

use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use serde::Serialize;

use crate::ast::Statement;
use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Table,
    /// Reserved for trained models
    Model,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::Table => "table",
            TableType::Model => "model",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One version of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableNode {
    pub table_type: TableType,
    pub name: String,
    pub hazard_index: usize,
}

impl TableNode {
    pub fn table(name: impl Into<String>, hazard_index: usize) -> Self {
        Self {
            table_type: TableType::Table,
            name: name.into(),
            hazard_index,
        }
    }

    /// `type.name`, the key shared by all versions of the table
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table_type, self.name)
    }
}

impl fmt::Display for TableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}#{}", self.table_type, self.name, self.hazard_index)
    }
}

/// A statement with the table versions it reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementNode {
    pub statement: String,
    /// Position of the statement in the program
    pub order: usize,
    pub inputs: Vec<TableNode>,
    pub outputs: Vec<TableNode>,
}

impl StatementNode {
    fn new(statement: &Statement, order: usize) -> Self {
        Self {
            statement: statement.original.clone(),
            order,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn reads(&self, full_name: &str) -> bool {
        contains(&self.inputs, full_name)
    }

    fn writes(&self, full_name: &str) -> bool {
        contains(&self.outputs, full_name)
    }
}

fn contains(nodes: &[TableNode], full_name: &str) -> bool {
    nodes.iter().any(|n| n.full_name() == full_name)
}

/// Versions allocated so far, by full table name
#[derive(Default)]
struct Versions {
    nodes: HashMap<String, Vec<TableNode>>,
}

impl Versions {
    fn latest(&self, full_name: &str) -> Option<&TableNode> {
        self.nodes.get(full_name).and_then(|list| list.last())
    }

    /// Allocate the version after the latest one
    fn next(&mut self, name: &str, full_name: &str) -> TableNode {
        let index = self.latest(full_name).map_or(0, |n| n.hazard_index + 1);
        let node = TableNode::table(name, index);
        self.nodes
            .entry(full_name.to_string())
            .or_default()
            .push(node.clone());
        node
    }
}

/// Build the dependency graph of `statements` without exporting it
pub fn analyze(statements: &[Statement]) -> Result<Vec<StatementNode>> {
    analyze_with(statements, &Config::default())
}

/// Build the dependency graph of `statements`.
///
/// When `config.graphviz_output` is set the graph is also written there in
/// DOT format.
pub fn analyze_with(statements: &[Statement], config: &Config) -> Result<Vec<StatementNode>> {
    if statements.is_empty() {
        return Err(Error::EmptyProgram);
    }
    if statements.len() == 1 {
        return Ok(vec![StatementNode::new(&statements[0], 0)]);
    }

    let mut versions = Versions::default();
    let mut graph: Vec<StatementNode> = Vec::with_capacity(statements.len());

    for (order, statement) in statements.iter().enumerate() {
        let mut node = StatementNode::new(statement, order);
        connect_inputs(&mut node, statement, &mut versions);
        connect_outputs(&mut node, statement, &mut graph, &mut versions)?;
        graph.push(node);
    }

    debug!("analyzed {} statements", graph.len());
    if let Some(path) = &config.graphviz_output {
        graphviz::write_dot(path, &graph)?;
    }
    Ok(graph)
}

/// Read-after-write: every input points at the latest version of its table.
fn connect_inputs(node: &mut StatementNode, statement: &Statement, versions: &mut Versions) {
    for name in &statement.inputs {
        let full_name = TableNode::table(name.as_str(), 0).full_name();
        let input = versions
            .latest(&full_name)
            .cloned()
            .unwrap_or_else(|| versions.next(name, &full_name));
        node.inputs.push(input);
    }
}

fn connect_outputs(
    node: &mut StatementNode,
    statement: &Statement,
    graph: &mut [StatementNode],
    versions: &mut Versions,
) -> Result<()> {
    for name in &statement.outputs {
        let full_name = TableNode::table(name.as_str(), 0).full_name();
        if versions.latest(&full_name).is_some() {
            resolve_hazards(node, name, &full_name, graph, versions)?;
        }
        let output = versions.next(name, &full_name);
        trace!("Stmt{} writes {}", node.order, output);
        node.outputs.push(output);
    }
    Ok(())
}

/// Order a write of `name` after every earlier access to it.
fn resolve_hazards(
    node: &mut StatementNode,
    name: &str,
    full_name: &str,
    graph: &mut [StatementNode],
    versions: &mut Versions,
) -> Result<()> {
    for prev in graph.iter_mut().rev() {
        if prev.writes(full_name) {
            let first = prev
                .outputs
                .iter()
                .find(|n| n.full_name() == full_name)
                .cloned()
                .ok_or_else(|| Error::GraphInvariant {
                    message: format!("cannot add write-after-write dependency on {}", full_name),
                    statement: prev.statement.clone(),
                })?;
            trace!("WAW: Stmt{} after Stmt{} on {}", node.order, prev.order, first);
            node.inputs.push(first);
        } else if prev.reads(full_name) {
            let synthetic = versions.next(name, full_name);
            trace!("WAR: Stmt{} after Stmt{} via {}", node.order, prev.order, synthetic);
            prev.outputs.push(synthetic.clone());
            if !node.reads(full_name) {
                node.inputs.push(synthetic);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(original: &str, inputs: &[&str], outputs: &[&str]) -> Statement {
        Statement::standard(
            original,
            inputs.iter().map(|s| s.to_string()).collect(),
            outputs.iter().map(|s| s.to_string()).collect(),
            false,
        )
    }

    #[test]
    fn full_name_and_display() {
        let node = TableNode::table("db.t", 2);
        assert_eq!(node.full_name(), "table.db.t");
        assert_eq!(node.to_string(), "table.db.t#2");
    }

    #[test]
    fn versions_start_at_zero_and_increase() {
        let mut versions = Versions::default();
        assert_eq!(versions.next("a", "table.a").hazard_index, 0);
        assert_eq!(versions.next("a", "table.a").hazard_index, 1);
        assert_eq!(versions.next("b", "table.b").hazard_index, 0);
    }

    #[test]
    fn self_read_and_write() {
        let graph = analyze(&[
            stmt("INSERT INTO a SELECT * FROM a;", &["a"], &["a"]),
            stmt("SELECT * FROM a;", &["a"], &[]),
        ])
        .unwrap();
        assert_eq!(graph[0].inputs, vec![TableNode::table("a", 0)]);
        assert_eq!(graph[0].outputs, vec![TableNode::table("a", 1)]);
        assert_eq!(graph[1].inputs, vec![TableNode::table("a", 1)]);
    }
}
