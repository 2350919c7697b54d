//! DOT export of a dependency graph

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::info;

use super::{StatementNode, TableNode};
use crate::error::Result;

fn statement_id(node: &StatementNode) -> String {
    format!("Stmt{}", node.order)
}

/// `table.db.t#2` becomes `table_db_t_2`
fn table_id(node: &TableNode) -> String {
    format!("{}_{}", node.full_name(), node.hazard_index).replace('.', "_")
}

fn escape_label(text: &str) -> String {
    text.trim_matches('\n')
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

/// Render the graph in Graphviz DOT format
pub fn render_dot(nodes: &[StatementNode]) -> String {
    let mut dot = String::from("digraph D {\n");

    for node in nodes {
        let _ = writeln!(
            dot,
            "{} [shape=box label=\"{}\"]",
            statement_id(node),
            escape_label(&node.statement)
        );
    }

    let tables: BTreeSet<String> = nodes
        .iter()
        .flat_map(|n| n.inputs.iter().chain(&n.outputs))
        .map(table_id)
        .collect();
    for table in &tables {
        let _ = writeln!(dot, "{} [shape=circle]", table);
    }

    for node in nodes {
        let stmt = statement_id(node);
        for input in &node.inputs {
            let _ = writeln!(dot, "{} -> {}", table_id(input), stmt);
        }
        for output in &node.outputs {
            let _ = writeln!(dot, "{} -> {}", stmt, table_id(output));
        }
    }

    dot.push_str("}\n");
    dot
}

/// Write the DOT rendering of `nodes` to `path`
pub fn write_dot(path: &Path, nodes: &[StatementNode]) -> Result<()> {
    fs::write(path, render_dot(nodes))?;
    info!("wrote dependency graph to {}", path.display());
    Ok(())
}
