//! Canonical rendering of extended statements
//!
//! `Display` gives the single-line form and [`format_extension`] the
//! multi-line form. Both parse back to the statement they came from.

pub mod printer;

use std::fmt;

use crate::ast::*;
use crate::parser::lexer::keyword;
use printer::Printer;

/// One clause of an extended statement
enum Part {
    /// Keyword and operands on a single line (`TO TRAIN DNNClassifier`)
    Line(String),
    /// Keyword, comma separated items and an optional trailer
    /// (`COLUMN a, b FOR target`)
    List {
        keyword: &'static str,
        items: Vec<String>,
        trailer: Option<String>,
    },
}

fn line(text: impl Into<String>) -> Part {
    Part::Line(text.into())
}

fn list(keyword: &'static str, items: Vec<String>) -> Part {
    Part::List {
        keyword,
        items,
        trailer: None,
    }
}

/// Render a label as a bare word when it lexes back as one
fn label(text: &str) -> String {
    let mut chars = text.chars();
    let bare = chars.next().map_or(false, char::is_alphabetic)
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && keyword(text).is_none();
    if bare {
        text.to_string()
    } else {
        quote(text)
    }
}

fn with_clause(parts: &mut Vec<Part>, attrs: &Attributes) {
    if !attrs.is_empty() {
        let items = attrs.iter().map(|(k, v)| format!("{} = {}", k, v)).collect();
        parts.push(list("WITH", items));
    }
}

fn optional(parts: &mut Vec<Part>, keyword: &str, value: &Option<String>) {
    if let Some(value) = value {
        parts.push(line(format!("{} {}", keyword, value)));
    }
}

fn exprs(items: &[Expr]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn parts(stmt: &ExtensionStmt) -> Vec<Part> {
    let mut parts = Vec::new();
    match stmt {
        ExtensionStmt::Train(train) => {
            parts.push(line(format!("TO TRAIN {}", train.estimator)));
            with_clause(&mut parts, &train.attrs);
            for (target, columns) in &train.columns {
                parts.push(Part::List {
                    keyword: "COLUMN",
                    items: exprs(columns),
                    trailer: (target != DEFAULT_COLUMN_TARGET).then(|| format!("FOR {}", target)),
                });
            }
            optional(&mut parts, "LABEL", &train.label.as_deref().map(label));
            optional(&mut parts, "INTO", &train.into);
        }
        ExtensionStmt::Predict(predict) => {
            parts.push(line(format!("TO PREDICT {}", predict.into)));
            with_clause(&mut parts, &predict.attrs);
            parts.push(line(format!("USING {}", predict.model)));
        }
        ExtensionStmt::Explain(explain) => {
            parts.push(line(format!("TO EXPLAIN {}", explain.model)));
            with_clause(&mut parts, &explain.attrs);
            optional(&mut parts, "USING", &explain.explainer);
            optional(&mut parts, "INTO", &explain.into);
        }
        ExtensionStmt::Evaluate(evaluate) => {
            parts.push(line(format!("TO EVALUATE {}", evaluate.model)));
            with_clause(&mut parts, &evaluate.attrs);
            parts.push(line(format!("LABEL {}", label(&evaluate.label))));
            parts.push(line(format!("INTO {}", evaluate.into)));
        }
        ExtensionStmt::Optimize(optimize) => {
            parts.push(line(format!("TO {} {}", optimize.direction, optimize.objective)));
            let constraints = optimize.constraints.iter().map(ToString::to_string).collect();
            parts.push(list("CONSTRAINT", constraints));
            with_clause(&mut parts, &optimize.attrs);
            optional(&mut parts, "USING", &optimize.solver);
            parts.push(line(format!("INTO {}", optimize.into)));
        }
        ExtensionStmt::ShowTrain(show) => {
            parts.push(line(format!("SHOW TRAIN {}", show.model_name)));
        }
        ExtensionStmt::Run(run) => {
            parts.push(line(format!("TO RUN {}", run.image)));
            if !run.parameters.is_empty() {
                parts.push(list("CMD", run.parameters.iter().map(|p| quote(p)).collect()));
            }
            if !run.output_tables.is_empty() {
                parts.push(list("INTO", run.output_tables.clone()));
            }
        }
    }
    parts
}

impl fmt::Display for ExtensionStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in parts(self).iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match part {
                Part::Line(text) => f.write_str(text)?,
                Part::List {
                    keyword,
                    items,
                    trailer,
                } => {
                    write!(f, "{} {}", keyword, items.join(", "))?;
                    if let Some(trailer) = trailer {
                        write!(f, " {}", trailer)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Render `stmt` one clause per line, terminated by `;`
pub fn format_extension(stmt: &ExtensionStmt) -> String {
    let mut printer = Printer::new();
    for (i, part) in parts(stmt).iter().enumerate() {
        if i > 0 {
            printer.newline();
        }
        match part {
            Part::Line(text) => printer.write(text),
            Part::List {
                keyword,
                items,
                trailer,
            } => {
                printer.write_list(keyword, items);
                if let Some(trailer) = trailer {
                    let trailer = format!(" {}", trailer);
                    if printer.would_exceed_width(&trailer) {
                        printer.newline();
                        printer.write(trailer.trim_start());
                    } else {
                        printer.write(&trailer);
                    }
                }
            }
        }
    }
    printer.write(";");
    printer.finish()
}

/// Render a parsed statement: the extension of an extended statement is
/// rendered in canonical form after its SELECT, anything else as written
pub fn format_statement(stmt: &Statement) -> String {
    match (&stmt.extension, &stmt.standard_select) {
        (Some(extension), Some(select)) => {
            format!("{}\n{}", select.trim_end(), format_extension(extension))
        }
        (Some(extension), None) => format_extension(extension),
        (None, _) => stmt.original.clone(),
    }
}
