//! Extended statement parsing
//!
//! Parses `TO TRAIN/PREDICT/EXPLAIN/EVALUATE/MAXIMIZE/MINIMIZE/RUN ...` and
//! `SHOW TRAIN ...` into an [`ExtensionStmt`].

use std::collections::BTreeMap;

use crate::ast::*;
use crate::parser::expr::{parse_expression, Parser};
use crate::parser::lexer::Token;
use crate::Result;

/// Parse one extended statement from the start of `input`.
///
/// Returns the statement and the byte offset just past it (after its `;`,
/// or at the end of input when there is none).
pub fn parse_extension(input: &str) -> Result<(ExtensionStmt, usize)> {
    let mut parser = Parser::new(input);
    let stmt = parse_statement(&mut parser)?;
    Ok((stmt, parser.end_position()))
}

/// Parse an extended statement from tokens
pub fn parse_statement(parser: &mut Parser) -> Result<ExtensionStmt> {
    let stmt = match parser.current() {
        Some(Token::To) => {
            parser.advance();
            parse_to_clause(parser)?
        }
        Some(Token::Show) => {
            parser.advance();
            parser.expect(&Token::Train)?;
            let model_name = parser.expect_identifier("model name")?;
            ExtensionStmt::ShowTrain(ShowTrainClause { model_name })
        }
        _ => return Err(parser.error("TO or SHOW TRAIN")),
    };

    if !parser.consume(&Token::Semicolon) && !parser.is_eof() {
        return Err(parser.error("';' or end of input"));
    }

    Ok(stmt)
}

fn parse_to_clause(parser: &mut Parser) -> Result<ExtensionStmt> {
    match parser.current() {
        Some(Token::Train) => {
            parser.advance();
            parse_train(parser).map(ExtensionStmt::Train)
        }
        Some(Token::Predict) => {
            parser.advance();
            parse_predict(parser).map(ExtensionStmt::Predict)
        }
        Some(Token::Explain) => {
            parser.advance();
            parse_explain(parser).map(ExtensionStmt::Explain)
        }
        Some(Token::Evaluate) => {
            parser.advance();
            parse_evaluate(parser).map(ExtensionStmt::Evaluate)
        }
        Some(Token::Maximize) => {
            parser.advance();
            parse_optimize(parser, Direction::Maximize).map(ExtensionStmt::Optimize)
        }
        Some(Token::Minimize) => {
            parser.advance();
            parse_optimize(parser, Direction::Minimize).map(ExtensionStmt::Optimize)
        }
        Some(Token::Run) => {
            parser.advance();
            parse_run(parser).map(ExtensionStmt::Run)
        }
        _ => Err(parser.error("TRAIN, PREDICT, EXPLAIN, EVALUATE, MAXIMIZE, MINIMIZE or RUN")),
    }
}

fn parse_train(parser: &mut Parser) -> Result<TrainClause> {
    let estimator = parser.expect_identifier("estimator")?;
    let attrs = parse_optional_with(parser)?;

    let mut columns: BTreeMap<String, Vec<Expr>> = BTreeMap::new();
    while parser.consume(&Token::Column) {
        let (target, exprs) = parse_column_block(parser)?;
        columns.entry(target).or_default().extend(exprs);
    }

    let label = if parser.consume(&Token::Label) {
        Some(parse_label(parser)?)
    } else {
        None
    };

    let into = if parser.consume(&Token::Into) {
        Some(parser.expect_identifier("model name")?)
    } else {
        None
    };

    Ok(TrainClause {
        estimator,
        attrs,
        columns,
        label,
        into,
    })
}

fn parse_predict(parser: &mut Parser) -> Result<PredictClause> {
    let into = parser.expect_identifier("result table")?;
    let attrs = parse_optional_with(parser)?;
    parser.expect(&Token::Using)?;
    let model = parser.expect_identifier("model name")?;

    Ok(PredictClause { into, attrs, model })
}

fn parse_explain(parser: &mut Parser) -> Result<ExplainClause> {
    let model = parser.expect_identifier("model name")?;
    let attrs = parse_optional_with(parser)?;

    let explainer = if parser.consume(&Token::Using) {
        Some(parser.expect_identifier("explainer")?)
    } else {
        None
    };

    let into = if parser.consume(&Token::Into) {
        Some(parser.expect_identifier("result table")?)
    } else {
        None
    };

    Ok(ExplainClause {
        model,
        attrs,
        explainer,
        into,
    })
}

fn parse_evaluate(parser: &mut Parser) -> Result<EvaluateClause> {
    let model = parser.expect_identifier("model name")?;
    let attrs = parse_optional_with(parser)?;
    parser.expect(&Token::Label)?;
    let label = parse_label(parser)?;
    parser.expect(&Token::Into)?;
    let into = parser.expect_identifier("result table")?;

    Ok(EvaluateClause {
        model,
        attrs,
        label,
        into,
    })
}

fn parse_optimize(parser: &mut Parser, direction: Direction) -> Result<OptimizeClause> {
    let objective = parse_expression(parser)?;

    parser.expect(&Token::Constraint)?;
    let mut constraints = Vec::new();
    loop {
        let expr = parse_expression(parser)?;
        let group_by = if parser.consume(&Token::Group) {
            parser.expect(&Token::By)?;
            Some(parser.expect_identifier("column name")?)
        } else {
            None
        };
        constraints.push(Constraint { expr, group_by });

        if !parser.consume(&Token::Comma) {
            break;
        }
    }

    let attrs = parse_optional_with(parser)?;

    let solver = if parser.consume(&Token::Using) {
        Some(parser.expect_identifier("solver")?)
    } else {
        None
    };

    parser.expect(&Token::Into)?;
    let into = parser.expect_identifier("result table")?;

    Ok(OptimizeClause {
        direction,
        objective,
        constraints,
        attrs,
        solver,
        into,
    })
}

fn parse_run(parser: &mut Parser) -> Result<RunClause> {
    let image = parser.expect_identifier("image name")?;

    let mut parameters = Vec::new();
    if parser.consume(&Token::Cmd) {
        loop {
            let raw = parser.expect_string("a quoted command argument")?;
            parameters.push(unquote(&raw));
            if !parser.consume(&Token::Comma) {
                break;
            }
        }
    }

    let mut output_tables = Vec::new();
    if parser.consume(&Token::Into) {
        loop {
            output_tables.push(parser.expect_identifier("table name")?);
            if !parser.consume(&Token::Comma) {
                break;
            }
        }
    }

    Ok(RunClause {
        image,
        parameters,
        output_tables,
    })
}

/// `[WITH name = expr, ...]`
fn parse_optional_with(parser: &mut Parser) -> Result<Attributes> {
    let mut attrs = Attributes::new();
    if !parser.consume(&Token::With) {
        return Ok(attrs);
    }

    loop {
        let offset = parser.position();
        let name = parser.expect_identifier("attribute name")?;
        parser.expect(&Token::Eq)?;
        let value = parse_expression(parser)?;
        if attrs.contains_key(&name) {
            return Err(parser.error_at(offset, format!("attribute {:?} already specified", name)));
        }
        attrs.insert(name, value);

        if !parser.consume(&Token::Comma) {
            return Ok(attrs);
        }
    }
}

/// `expr, ... [FOR target]`
fn parse_column_block(parser: &mut Parser) -> Result<(String, Vec<Expr>)> {
    let mut exprs = vec![parse_expression(parser)?];
    while parser.consume(&Token::Comma) {
        exprs.push(parse_expression(parser)?);
    }

    let target = if parser.consume(&Token::For) {
        parser.expect_identifier("column target")?
    } else {
        DEFAULT_COLUMN_TARGET.to_string()
    };

    Ok((target, exprs))
}

/// An identifier or a string literal, quotes removed
fn parse_label(parser: &mut Parser) -> Result<String> {
    match parser.current() {
        Some(Token::Identifier(name)) => {
            let name = name.clone();
            parser.advance();
            Ok(name)
        }
        Some(Token::StringLiteral(raw)) => {
            let label = unquote(raw);
            parser.advance();
            Ok(label)
        }
        _ => Err(parser.error("label")),
    }
}
