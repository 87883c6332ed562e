use clap::{Parser, Subcommand};
use puzzle87_core::search::SearchMode;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Solver and CRUD backend for the 87 digit puzzle.
#[derive(Debug, Parser)]
#[command(name = "puzzle87-server", version)]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "PUZZLE87_BIND", default_value = "0.0.0.0:3000", global = true)]
    pub bind: SocketAddr,

    /// JSON snapshot that persists stored solutions across restarts.
    #[arg(long, env = "PUZZLE87_DATA_FILE", global = true)]
    pub data_file: Option<PathBuf>,

    /// Split the search across the rayon thread pool.
    #[arg(long, env = "PUZZLE87_PARALLEL", global = true)]
    pub parallel: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the REST API (default).
    Serve,
    /// Print every solution once and exit.
    Solve,
}

impl Config {
    pub fn search_mode(&self) -> SearchMode {
        if self.parallel { SearchMode::Parallel } else { SearchMode::Sequential }
    }

    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["puzzle87-server"]).unwrap();
        assert_eq!(config.command(), Command::Serve);
        assert_eq!(config.search_mode(), SearchMode::Sequential);
        assert_eq!(config.data_file, None);
    }

    #[test]
    fn flags_override() {
        let config = Config::try_parse_from([
            "puzzle87-server", "--bind", "127.0.0.1:8087", "--data-file", "solutions.json", "--parallel", "solve",
        ]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8087".parse().unwrap());
        assert_eq!(config.data_file, Some(PathBuf::from("solutions.json")));
        assert_eq!(config.search_mode(), SearchMode::Parallel);
        assert_eq!(config.command(), Command::Solve);
    }

    #[test]
    fn flags_after_subcommand() {
        let config = Config::try_parse_from(["puzzle87-server", "serve", "--parallel"]).unwrap();
        assert_eq!(config.search_mode(), SearchMode::Parallel);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(Config::try_parse_from(["puzzle87-server", "--bind", "nowhere"]).is_err());
    }
}
