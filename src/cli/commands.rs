//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "kbrag")]
#[command(about = "Answer questions from a plain-text knowledge base")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question from the knowledge base
    Ask {
        /// Question to answer
        question: String,
        /// Number of chunks used as context (default: from config)
        #[arg(short, long, value_parser = parse_top_k)]
        k: Option<usize>,
        /// Print the full answer record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retrieve matching chunks without generating an answer
    Search {
        /// Search query
        query: String,
        /// Maximum number of results (default: from config)
        #[arg(short, long, value_parser = parse_top_k)]
        k: Option<usize>,
    },
    /// Show corpus, retrieval tier and backend information
    Info,
}

/// Retrieval breadth must be a positive integer
fn parse_top_k(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(k) => Ok(k),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli =
            Cli::try_parse_from(["kbrag", "-v", "ask", "what is rust?", "-k", "5", "--json"])
                .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ask { question, k, json } => {
                assert_eq!(question, "what is rust?");
                assert_eq!(k, Some(5));
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_search_and_config() {
        let cli = Cli::try_parse_from(["kbrag", "-c", "kb.toml", "search", "dogs"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("kb.toml")));
        assert!(matches!(cli.command, Commands::Search { k: None, .. }));
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(Cli::try_parse_from(["kbrag", "ask", "q", "-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["kbrag", "search", "q", "-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["kbrag", "search", "q", "-k", "-2"]).is_err());

        let cli = Cli::try_parse_from(["kbrag", "search", "q", "-k", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { k: Some(1), .. }));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["kbrag"]).is_err());
    }
}
