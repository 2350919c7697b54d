//! End-to-end parsing tests over the mysql dialect

use pretty_assertions::assert_eq;
use sqlflow::ast::*;
use sqlflow::{parse, parse_statement, Error};

fn mysql(program: &str) -> Vec<Statement> {
    parse("mysql", program).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", program, e))
}

fn mysql_err(program: &str) -> Error {
    match parse("mysql", program) {
        Ok(statements) => panic!("expected {:?} to fail, got {:?}", program, statements),
        Err(e) => e,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

mod standard {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_select() {
        let statements = mysql("SELECT * FROM t;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].original, "SELECT * FROM t;");
        assert!(!statements[0].is_extended());
        assert_eq!(statements[0].inputs, strings(&["t"]));
        assert!(statements[0].outputs.is_empty());
    }

    #[test]
    fn several_statements_with_tables() {
        let statements = mysql(
            "CREATE TABLE a AS SELECT * FROM s;\n\
             INSERT INTO b SELECT * FROM a JOIN c ON a.id = c.id;\n\
             DROP TABLE a;",
        );
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].inputs, strings(&["s"]));
        assert_eq!(statements[0].outputs, strings(&["a"]));
        assert_eq!(statements[1].original, "INSERT INTO b SELECT * FROM a JOIN c ON a.id = c.id;");
        assert_eq!(statements[1].inputs, strings(&["a", "c"]));
        assert_eq!(statements[1].outputs, strings(&["b"]));
        assert_eq!(statements[2].outputs, strings(&["a"]));
    }

    #[test]
    fn empty_program() {
        assert!(mysql("").is_empty());
        assert!(mysql("  \n\t").is_empty());
    }

    #[test]
    fn bare_semicolon() {
        let statements = mysql(";");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].original, ";");
        assert!(statements[0].inputs.is_empty());
    }

    #[test]
    fn bare_semicolon_after_comment_with_apostrophe() {
        let statements = mysql("-- it's\n;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].original, "-- it's\n;");
    }

    #[test]
    fn last_statement_without_semicolon() {
        let statements = mysql("SELECT 1; SELECT 2");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].original, "SELECT 2");
    }

    #[test]
    fn tidb_uses_the_mysql_grammar() {
        let statements = parse("tidb", "SELECT * FROM t;").unwrap();
        assert_eq!(statements[0].inputs, strings(&["t"]));
    }
}

mod extended {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn train() {
        let program = "SELECT * FROM iris.train TO TRAIN DNNClassifier WITH n_classes=3, hidden_units=[10,20] COLUMN sepal_length LABEL class INTO m;";
        let statements = mysql(program);
        assert_eq!(statements.len(), 1);

        let stmt = &statements[0];
        assert!(stmt.is_extended());
        assert!(!stmt.unfinished_select);
        assert_eq!(stmt.original, program);
        assert_eq!(stmt.standard_select.as_deref(), Some("SELECT * FROM iris.train "));
        assert_eq!(stmt.inputs, strings(&["iris.train"]));

        let Some(ExtensionStmt::Train(train)) = &stmt.extension else {
            panic!("expected TRAIN, got {:?}", stmt.extension);
        };
        assert_eq!(train.estimator, "DNNClassifier");
        assert_eq!(train.attrs["n_classes"], Expr::number("3"));
        assert_eq!(
            train.attrs["hidden_units"],
            Expr::List(vec![Expr::number("10"), Expr::number("20")])
        );
        assert_eq!(
            train.columns["feature_columns"],
            vec![Expr::ident("sepal_length")]
        );
        assert_eq!(train.label.as_deref(), Some("class"));
        assert_eq!(train.into.as_deref(), Some("m"));
    }

    #[test]
    fn extended_statement_followed_by_select() {
        let statements = mysql("SELECT a FROM t TO TRAIN M LABEL y INTO q; SELECT b FROM u;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].original, "SELECT a FROM t TO TRAIN M LABEL y INTO q;");
        assert_eq!(statements[0].extension.as_ref().map(|e| e.kind()), Some(ExtensionKind::Train));
        assert_eq!(statements[1].original, "SELECT b FROM u;");
        assert!(!statements[1].is_extended());
        assert_eq!(statements[1].inputs, strings(&["u"]));
    }

    #[test]
    fn to_on_its_own_line() {
        let statements = mysql("SELECT * FROM t\nTO PREDICT t.class USING m;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].original, "SELECT * FROM t\nTO PREDICT t.class USING m;");
        assert_eq!(
            statements[0].extension.as_ref().map(|e| e.kind()),
            Some(ExtensionKind::Predict)
        );
    }

    #[test]
    fn table_named_train() {
        let statements = mysql("SELECT * FROM db.train TO TRAIN m INTO x;");
        assert_eq!(statements[0].inputs, strings(&["db.train"]));
    }

    #[test]
    fn to_inside_subquery_is_not_an_extension() {
        let statements = mysql("SELECT * FROM (SELECT `to` FROM t) AS s TO EXPLAIN m;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].inputs, strings(&["t"]));
        assert_eq!(
            statements[0].extension.as_ref().map(|e| e.kind()),
            Some(ExtensionKind::Explain)
        );
    }

    #[test]
    fn show_train_after_select() {
        let statements = mysql("SELECT * FROM t; SHOW TRAIN m;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].original, "SHOW TRAIN m;");
        assert!(statements[1].inputs.is_empty());
        assert_eq!(
            statements[1].extension,
            Some(ExtensionStmt::ShowTrain(ShowTrainClause {
                model_name: "m".to_string()
            }))
        );
    }

    #[test]
    fn show_train_alone() {
        let statements = mysql("SHOW TRAIN my_model");
        assert_eq!(statements.len(), 1);
        assert!(statements[0].is_extended());
    }

    #[test]
    fn comment_before_show_train() {
        let statements = mysql("select 1; -- comment\nSHOW TRAIN my_model;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].original, "SHOW TRAIN my_model;");
    }

    #[test]
    fn mixed_program() {
        let statements = mysql(
            "SELECT * FROM a;\n\
             SELECT * FROM b TO TRAIN DNN LABEL c INTO m;\n\
             SHOW TRAIN m;\n\
             SELECT * FROM c TO PREDICT c.out USING m;\n\
             SELECT 1;",
        );
        let kinds: Vec<Option<ExtensionKind>> = statements
            .iter()
            .map(|s| s.extension.as_ref().map(|e| e.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                None,
                Some(ExtensionKind::Train),
                Some(ExtensionKind::ShowTrain),
                Some(ExtensionKind::Predict),
                None
            ]
        );
        assert!(statements.iter().all(|s| !s.unfinished_select));
    }

    #[test]
    fn originals_cover_the_program() {
        let program = "SELECT * FROM a; SELECT * FROM b TO TRAIN DNN INTO m; SHOW TRAIN m; SELECT 1;";
        let joined: String = mysql(program)
            .iter()
            .map(|s| s.original.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined, program);
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_dialect() {
        match parse("oracle", "SELECT 1;") {
            Err(Error::UnknownDialect { dialect }) => assert_eq!(dialect, "oracle"),
            other => panic!("expected unknown dialect, got {:?}", other),
        }
    }

    #[test]
    fn show_train_directly_after_select() {
        match mysql_err("SELECT * FROM t SHOW TRAIN m;") {
            Error::ShowTrainAfterSelect { offset } => assert_eq!(offset, 16),
            other => panic!("expected SHOW TRAIN error, got {:?}", other),
        }
    }

    #[test]
    fn extension_without_select() {
        match mysql_err("SELECT 1; TO TRAIN m INTO x;") {
            Error::ExtensionWithoutSelect { offset } => assert_eq!(offset, 10),
            other => panic!("expected missing SELECT error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_standard_sql() {
        match mysql_err("selec 1; select 1 to train;") {
            Error::DialectParseFailure { offset, message } => {
                assert_eq!(offset, 0);
                assert!(!message.is_empty());
            }
            other => panic!("expected dialect failure, got {:?}", other),
        }
    }

    #[test]
    fn invalid_sql_after_valid_statement() {
        let err = mysql_err("SELECT 1; SELEC 2;");
        assert!(matches!(err, Error::DialectParseFailure { offset: 10, .. }));
    }

    #[test]
    fn extension_error_offsets_are_absolute() {
        let err = mysql_err("SELECT * FROM t TO TRAIN DNN WITH a = 1, a = 2 INTO m;");
        assert_eq!(err.offset(), Some(41));
    }

    #[test]
    fn extension_error_in_second_statement() {
        let err = mysql_err("SELECT 1; SELECT * FROM t TO RUN \"x\";");
        assert_eq!(err.offset(), Some(33));
    }

    #[test]
    fn unmatched_quote_in_extension() {
        match mysql_err("SELECT * FROM t TO TRAIN \"some_thing") {
            Error::UnmatchedQuote { offset } => assert_eq!(offset, 25),
            other => panic!("expected unmatched quote, got {:?}", other),
        }
    }

    #[test]
    fn extension_without_estimator() {
        let err = mysql_err("select 1; select * from train TO train;");
        assert_eq!(err.offset(), Some(38));
    }
}

mod single_statement {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exactly_one() {
        let stmt = parse_statement("mysql", "SELECT * FROM t TO TRAIN m INTO x;").unwrap();
        assert!(stmt.is_extended());
    }

    #[test]
    fn more_than_one() {
        match parse_statement("mysql", "SELECT 1; SELECT 2;") {
            Err(Error::MultipleStatementsInSingleStatement { count }) => assert_eq!(count, 2),
            other => panic!("expected multiple statements error, got {:?}", other),
        }
    }

    #[test]
    fn none() {
        assert!(matches!(
            parse_statement("mysql", ""),
            Err(Error::MultipleStatementsInSingleStatement { count: 0 })
        ));
    }
}
