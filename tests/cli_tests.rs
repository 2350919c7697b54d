//! CLI integration tests
//!
//! Tests for the sqlflow command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PROGRAM: &str = "CREATE TABLE a AS SELECT * FROM s;\nSELECT * FROM a;\n";

fn sqlflow() -> Command {
    Command::cargo_bin("sqlflow").unwrap()
}

mod parse_command {
    use super::*;

    #[test]
    fn parse_single_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("train.sql");
        fs::write(&file_path, "SELECT * FROM iris TO TRAIN DNN LABEL c INTO m;").unwrap();

        sqlflow()
            .arg("parse")
            .arg(&file_path)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""kind": "train""#))
            .stdout(predicate::str::contains(r#""estimator": "DNN""#));
    }

    #[test]
    fn parse_stdin() {
        sqlflow()
            .arg("parse")
            .arg("-")
            .write_stdin("SELECT 1; SHOW TRAIN m;")
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""kind": "show_train""#));
    }

    #[test]
    fn parse_directory_recursive() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("models");
        fs::create_dir(&subdir).unwrap();
        fs::write(temp.path().join("root.sql"), "SELECT * FROM root_table;").unwrap();
        fs::write(subdir.join("model.sql"), "SELECT * FROM nested_table;").unwrap();
        fs::write(subdir.join("notes.txt"), "SELECT * FROM ignored_table;").unwrap();

        sqlflow()
            .arg("parse")
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("root_table"))
            .stdout(predicate::str::contains("nested_table"))
            .stdout(predicate::str::contains("ignored_table").not());
    }

    #[test]
    fn parse_glob_pattern() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("one.sql"), "SELECT * FROM first_table;").unwrap();
        fs::write(temp.path().join("two.sql"), "SELECT * FROM second_table;").unwrap();

        sqlflow()
            .arg("parse")
            .arg(temp.path().join("*.sql"))
            .assert()
            .success()
            .stdout(predicate::str::contains("first_table"))
            .stdout(predicate::str::contains("second_table"));
    }
}

mod deps_command {
    use super::*;

    #[test]
    fn deps_prints_edges() {
        sqlflow()
            .arg("deps")
            .arg("-")
            .write_stdin(PROGRAM)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Stmt0: CREATE TABLE a AS SELECT * FROM s; <- [table.s#0] -> [table.a#0]",
            ))
            .stdout(predicate::str::contains(
                "Stmt1: SELECT * FROM a; <- [table.a#0] -> []",
            ));
    }

    #[test]
    fn deps_writes_graphviz() {
        let temp = TempDir::new().unwrap();
        let dot_path = temp.path().join("deps.dot");

        sqlflow()
            .arg("deps")
            .arg("--graphviz")
            .arg(&dot_path)
            .arg("-")
            .write_stdin(PROGRAM)
            .assert()
            .success();

        let dot = fs::read_to_string(&dot_path).unwrap();
        assert!(dot.starts_with("digraph D {"));
        assert!(dot.contains("table_a_0 -> Stmt1"));
    }

    #[test]
    fn deps_empty_input_succeeds() {
        sqlflow()
            .arg("deps")
            .arg("-")
            .write_stdin("  \n")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }
}

mod errors {
    use super::*;

    #[test]
    fn syntax_error_exits_with_2() {
        sqlflow()
            .arg("parse")
            .arg("-")
            .write_stdin("SELECT 1;\nSELECT * FROM t TO FROB x;")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Parse error at line 2, column 20"))
            .stderr(predicate::str::contains("language_guide"));
    }

    #[test]
    fn unknown_dialect_exits_with_2() {
        sqlflow()
            .args(["parse", "--dialect", "oracle", "-"])
            .write_stdin("SELECT 1;")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown dialect \"oracle\""));
    }

    #[test]
    fn missing_file_exits_with_2() {
        let temp = TempDir::new().unwrap();

        sqlflow()
            .arg("parse")
            .arg(temp.path().join("missing.sql"))
            .assert()
            .code(2);
    }

    #[test]
    fn missing_files_argument() {
        sqlflow().arg("parse").assert().failure();
    }

    #[test]
    fn remote_dialect_without_server_exits_with_2() {
        sqlflow()
            .args(["parse", "--dialect", "hive", "-"])
            .env_remove("SQLFLOW_PARSER_SERVER_PORT")
            .write_stdin("SELECT 1;")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("configuration error"));
    }
}
