//! CLI argument parsing and file discovery

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// sqlflow - Parse SQL programs with machine-learning extensions
#[derive(Parser, Debug)]
#[command(name = "sqlflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse programs and print their statements as JSON
    Parse {
        /// SQL dialect of the standard statements
        #[arg(short, long, default_value = "mysql")]
        dialect: String,

        /// Files, directories or glob patterns (use - for stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the table dependency graph of each program
    Deps {
        /// SQL dialect of the standard statements
        #[arg(short, long, default_value = "mysql")]
        dialect: String,

        /// Also write the graph in DOT format to this file
        #[arg(short, long)]
        graphviz: Option<PathBuf>,

        /// Files, directories or glob patterns (use - for stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn is_sql_file(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == "sql")
}

/// Discover SQL files in the given paths.
///
/// Files are taken as given, directories are walked for `*.sql` files and
/// anything else is expanded as a glob pattern. `-` is passed through for
/// stdin. A pattern matching no `*.sql` file is passed through unchanged.
pub fn discover_files(paths: &[PathBuf]) -> crate::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path == Path::new("-") || path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| is_sql_file(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            let pattern = path.to_string_lossy();
            let matches = glob::glob(&pattern).map_err(|e| crate::Error::Config {
                message: format!("invalid path pattern {:?}: {}", pattern, e),
            })?;
            let found: Vec<PathBuf> = matches
                .filter_map(|p| p.ok())
                .filter(|p| is_sql_file(p))
                .collect();
            // kept as given so that reading it reports the missing file
            if found.is_empty() {
                files.push(path.clone());
            }
            files.extend(found);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_mysql() {
        let cli = Cli::parse_from(["sqlflow", "parse", "a.sql"]);
        match cli.command {
            Commands::Parse { dialect, files } => {
                assert_eq!(dialect, "mysql");
                assert_eq!(files, vec![PathBuf::from("a.sql")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn deps_accepts_graphviz_path() {
        let cli = Cli::parse_from(["sqlflow", "deps", "-g", "out.dot", "-d", "tidb", "-"]);
        match cli.command {
            Commands::Deps {
                dialect,
                graphviz,
                files,
            } => {
                assert_eq!(dialect, "tidb");
                assert_eq!(graphviz, Some(PathBuf::from("out.dot")));
                assert_eq!(files, vec![PathBuf::from("-")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn unmatched_path_is_kept() {
        let missing = PathBuf::from("no/such/dir/query.sql");
        let files = discover_files(&[missing.clone()]).unwrap();
        assert_eq!(files, vec![missing]);
    }
}
