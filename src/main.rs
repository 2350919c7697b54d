//! sqlflow CLI - Parse SQL programs and print their dependency graphs

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sqlflow::cli::{discover_files, Cli, Commands};
use sqlflow::error::format_parse_error;
use sqlflow::{Config, Error};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { dialect, files } => run(&files, |path, contents| {
            run_parse(path, contents, &dialect)
        }),
        Commands::Deps {
            dialect,
            graphviz,
            files,
        } => {
            let config = match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(2);
                }
            };
            let config = match graphviz {
                Some(path) => config.with_graphviz_output(path),
                None => config,
            };
            run(&files, |path, contents| {
                run_deps(path, contents, &dialect, &config)
            })
        }
    }
}

/// Run `command` over every discovered input, reporting errors per input
fn run<F>(paths: &[PathBuf], mut command: F) -> ExitCode
where
    F: FnMut(&Path, &str) -> Result<(), Error>,
{
    let files = match discover_files(paths) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut had_errors = false;
    for path in &files {
        let contents = match read_input(path) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                had_errors = true;
                continue;
            }
        };

        if let Err(e) = command(path, &contents) {
            report(path, &contents, &e);
            had_errors = true;
        }
    }

    if had_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

/// Read a file, or stdin for `-`
fn read_input(path: &Path) -> Result<String, Error> {
    if path == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        return Ok(contents);
    }
    Ok(fs::read_to_string(path)?)
}

fn report(path: &Path, contents: &str, error: &Error) {
    match error.offset() {
        Some(offset) => eprintln!(
            "{}:\n{}",
            path.display(),
            format_parse_error(contents, offset, &error.to_string())
        ),
        None => eprintln!("{}: {}", path.display(), error),
    }
}

fn run_parse(_path: &Path, contents: &str, dialect: &str) -> Result<(), Error> {
    let statements = sqlflow::parse(dialect, contents)?;
    let json = serde_json::to_string_pretty(&statements).map_err(io::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn run_deps(path: &Path, contents: &str, dialect: &str, config: &Config) -> Result<(), Error> {
    let statements = sqlflow::parse(dialect, contents)?;
    if statements.is_empty() {
        log::warn!("{}: no statements", path.display());
        return Ok(());
    }

    for node in sqlflow::analyze_with(&statements, config)? {
        let inputs: Vec<String> = node.inputs.iter().map(ToString::to_string).collect();
        let outputs: Vec<String> = node.outputs.iter().map(ToString::to_string).collect();
        println!(
            "Stmt{}: {} <- [{}] -> [{}]",
            node.order,
            node.statement.trim(),
            inputs.join(", "),
            outputs.join(", ")
        );
    }
    Ok(())
}
