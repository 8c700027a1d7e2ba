//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "coleta",
    version,
    about = "Match donation needs to collection points",
    long_about = "Coleta ranks active donation collection points against a free-text need. \
                  Needs are canonicalized against a synonym vocabulary and scored by a trained \
                  relevance model combined with deterministic matching rules."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/coleta/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recommend collection points for a need
    Recommend {
        /// What is needed, e.g. "arroz" or "Medicamentos"
        need: String,

        /// Only consider collection points in this city
        #[arg(long)]
        city: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the single best collection point for a need
    Best {
        /// What is needed
        need: String,

        /// Only consider collection points in this city
        #[arg(long)]
        city: Option<String>,

        /// Show the result in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Fit a new relevance model from the current collection points
    Retrain,

    /// Show relevance model and database status
    Status,

    /// Manage collection points
    Candidates {
        #[command(subcommand)]
        action: CandidatesAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CandidatesAction {
    /// Import collection points from a JSON array
    Import {
        /// JSON file containing an array of collection points
        file: PathBuf,
    },

    /// List stored collection points
    List {
        /// Only list collection points in this city
        #[arg(long)]
        city: Option<String>,
    },

    /// Show one collection point as JSON
    Show {
        /// Collection point id
        id: i64,
    },

    /// Reopen a collection point so it is recommended again
    Activate {
        /// Collection point id
        id: i64,
    },

    /// Close a collection point; it is kept but no longer recommended
    Deactivate {
        /// Collection point id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recommend_args() {
        let cli = Cli::try_parse_from([
            "coleta",
            "--profile",
            "strict",
            "recommend",
            "leite em pó",
            "--city",
            "São Paulo",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.profile.as_deref(), Some("strict"));
        match cli.command {
            Commands::Recommend { need, city, json } => {
                assert_eq!(need, "leite em pó");
                assert_eq!(city.as_deref(), Some("São Paulo"));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_candidates_import_args() {
        let cli = Cli::try_parse_from(["coleta", "-v", "candidates", "import", "points.json"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Candidates {
                action: CandidatesAction::Import { .. }
            }
        ));
    }

    #[test]
    fn test_candidates_toggle_args() {
        let cli = Cli::try_parse_from(["coleta", "candidates", "deactivate", "42"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Candidates {
                action: CandidatesAction::Deactivate { id: 42 }
            }
        ));

        let cli = Cli::try_parse_from(["coleta", "candidates", "show", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Candidates {
                action: CandidatesAction::Show { id: 7 }
            }
        ));

        assert!(Cli::try_parse_from(["coleta", "candidates", "activate", "abc"]).is_err());
    }
}
