use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::LogDestination;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "local-mind",
    version,
    about = "Private semantic search over local documents"
)]
pub struct Cli {
    /// Worker configuration file (RON). Missing file means defaults.
    #[arg(long, global = true, default_value = "./local_mind.ron")]
    pub config: PathBuf,

    /// Directory holding downloaded model files and the index snapshot.
    #[arg(long, global = true, default_value = "./.local_mind_cache")]
    pub cache_dir: PathBuf,

    /// Where log output goes.
    #[arg(long, global = true, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    /// Log at debug level.
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index files; each file's name becomes its document id.
    Index {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Search the indexed documents.
    Search {
        query: String,

        /// Restrict results to this document id (repeatable).
        #[arg(long = "only", value_name = "ID")]
        only: Vec<String>,
    },
    /// List indexed documents.
    Docs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_accepts_repeated_filters() {
        let cli = Cli::try_parse_from([
            "local-mind",
            "search",
            "borrow checker",
            "--only",
            "a.md",
            "--only",
            "b.md",
            "--log",
            "both",
        ])
        .unwrap();
        assert_eq!(cli.log, LogDestination::Both);
        assert_eq!(cli.config, PathBuf::from("./local_mind.ron"));
        match cli.command {
            Command::Search { query, only } => {
                assert_eq!(query, "borrow checker");
                assert_eq!(only, vec!["a.md".to_string(), "b.md".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn index_requires_files() {
        assert!(Cli::try_parse_from(["local-mind", "index"]).is_err());
    }
}
