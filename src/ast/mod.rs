//! AST node definitions for SQL programs with extended clauses
//!
//! A program parses into a list of [`Statement`] records. Standard SQL is
//! kept as text together with the tables it reads and writes; statements
//! carrying a `TO ...` or `SHOW TRAIN` tail also hold an [`ExtensionStmt`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Target name of a `COLUMN` block without `FOR`
pub const DEFAULT_COLUMN_TARGET: &str = "feature_columns";

/// Attribute holding the validation query of a TRAIN statement
pub const VALIDATION_SELECT_ATTR: &str = "validation.select";

/// Attribute map: dotted name to value
pub type Attributes = BTreeMap<String, Expr>;

/// One statement of a parsed program
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statement {
    /// Source text consumed for this statement, including its `;`
    pub original: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub extension: Option<ExtensionStmt>,
    /// SELECT half of an extended statement, as the dialect parser saw it
    pub standard_select: Option<String>,
    #[serde(skip)]
    pub unfinished_select: bool,
}

impl Statement {
    /// Standard SQL statement reported by a dialect parser
    pub fn standard(
        original: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        unfinished_select: bool,
    ) -> Self {
        Self {
            original: original.into(),
            inputs,
            outputs,
            extension: None,
            standard_select: None,
            unfinished_select,
        }
    }

    /// Statement made of an extended clause only (`SHOW TRAIN ...`)
    pub fn extended(original: impl Into<String>, extension: ExtensionStmt) -> Self {
        Self {
            original: original.into(),
            extension: Some(extension),
            ..Default::default()
        }
    }

    pub fn is_extended(&self) -> bool {
        self.extension.is_some()
    }
}

/// The extended clause kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Train,
    Predict,
    Explain,
    Evaluate,
    Optimize,
    ShowTrain,
    Run,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionKind::Train => "TRAIN",
            ExtensionKind::Predict => "PREDICT",
            ExtensionKind::Explain => "EXPLAIN",
            ExtensionKind::Evaluate => "EVALUATE",
            ExtensionKind::Optimize => "OPTIMIZE",
            ExtensionKind::ShowTrain => "SHOW TRAIN",
            ExtensionKind::Run => "RUN",
        };
        f.write_str(name)
    }
}

/// A parsed extended clause
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtensionStmt {
    Train(TrainClause),
    Predict(PredictClause),
    Explain(ExplainClause),
    Evaluate(EvaluateClause),
    Optimize(OptimizeClause),
    ShowTrain(ShowTrainClause),
    Run(RunClause),
}

impl ExtensionStmt {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            ExtensionStmt::Train(_) => ExtensionKind::Train,
            ExtensionStmt::Predict(_) => ExtensionKind::Predict,
            ExtensionStmt::Explain(_) => ExtensionKind::Explain,
            ExtensionStmt::Evaluate(_) => ExtensionKind::Evaluate,
            ExtensionStmt::Optimize(_) => ExtensionKind::Optimize,
            ExtensionStmt::ShowTrain(_) => ExtensionKind::ShowTrain,
            ExtensionStmt::Run(_) => ExtensionKind::Run,
        }
    }

    pub fn is_show_train(&self) -> bool {
        matches!(self, ExtensionStmt::ShowTrain(_))
    }
}

/// `TO TRAIN estimator [WITH ...] [COLUMN ...]* [LABEL label] [INTO model]`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TrainClause {
    pub estimator: String,
    pub attrs: Attributes,
    /// Column blocks keyed by target; blocks sharing a target are concatenated
    pub columns: BTreeMap<String, Vec<Expr>>,
    pub label: Option<String>,
    pub into: Option<String>,
}

impl TrainClause {
    /// The `validation.select` attribute with its quotes removed
    pub fn validation_select(&self) -> Option<String> {
        match self.attrs.get(VALIDATION_SELECT_ATTR)? {
            Expr::String(raw) => Some(unquote(raw)),
            _ => None,
        }
    }
}

/// `TO PREDICT result_table [WITH ...] USING model`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PredictClause {
    pub into: String,
    pub attrs: Attributes,
    pub model: String,
}

/// `TO EXPLAIN model [WITH ...] [USING explainer] [INTO table]`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExplainClause {
    pub model: String,
    pub attrs: Attributes,
    pub explainer: Option<String>,
    pub into: Option<String>,
}

/// `TO EVALUATE model [WITH ...] LABEL label INTO table`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EvaluateClause {
    pub model: String,
    pub attrs: Attributes,
    pub label: String,
    pub into: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    #[serde(rename = "MAXIMIZE")]
    Maximize,
    #[serde(rename = "MINIMIZE")]
    Minimize,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Maximize => "MAXIMIZE",
            Direction::Minimize => "MINIMIZE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a `CONSTRAINT` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub expr: Expr,
    pub group_by: Option<String>,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(group_by) = &self.group_by {
            write!(f, " GROUP BY {}", group_by)?;
        }
        Ok(())
    }
}

/// `TO MAXIMIZE|MINIMIZE objective CONSTRAINT ... [WITH ...] [USING solver] INTO table`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeClause {
    pub direction: Direction,
    pub objective: Expr,
    pub constraints: Vec<Constraint>,
    pub attrs: Attributes,
    pub solver: Option<String>,
    pub into: String,
}

/// `SHOW TRAIN model`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShowTrainClause {
    pub model_name: String,
}

/// `TO RUN image [CMD "arg", ...] [INTO table, ...]`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunClause {
    pub image: String,
    /// CMD arguments with their quotes removed
    pub parameters: Vec<String>,
    pub output_tables: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("NOT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of an attribute, a column or an optimization term
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal as written
    Number(String),
    /// String literal as written, quotes included
    String(String),
    Ident(String),
    Call { name: String, args: Vec<Expr> },
    List(Vec<Expr>),
    /// Parenthesized expression
    Paren(Box<Expr>),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Expr::Number(text.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(text) | Expr::String(text) | Expr::Ident(text) => f.write_str(text),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::List(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expr::Paren(inner) => write!(f, "({})", inner),
            Expr::Unary { op, operand } => write!(f, "{} {}", op, operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Strip the surrounding quotes of a string literal and resolve backslash escapes
pub fn unquote(raw: &str) -> String {
    let mut chars = raw.chars();
    let quote = match chars.next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return raw.to_string(),
    };
    let body = chars.as_str();
    let body = body.strip_suffix(quote).unwrap_or(body);

    let mut out = String::with_capacity(body.len());
    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Render `s` as a double-quoted string literal the lexer reads back as `s`
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_handles_both_quotes_and_escapes() {
        assert_eq!(unquote(r#""MAE,MSE""#), "MAE,MSE");
        assert_eq!(unquote("','"), ",");
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn quote_escapes_for_the_lexer() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(unquote(&quote(r"a\b")), r"a\b");
    }

    #[test]
    fn expr_display() {
        let e = Expr::call(
            "bucketize",
            vec![Expr::ident("last_name"), Expr::number("1000")],
        );
        assert_eq!(e.to_string(), "bucketize(last_name, 1000)");

        let e = Expr::List(vec![Expr::number("10"), Expr::number("20")]);
        assert_eq!(e.to_string(), "[10, 20]");

        let e = Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Neg, Expr::number("1")));
        assert_eq!(e.to_string(), "NOT - 1");
    }
}
