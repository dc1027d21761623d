use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use boq_tagger_common::ExtractionStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boq-tagger")]
#[command(about = "BOQ work-item extraction, trade classification and accuracy scoring", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AI provider used as the classifier (overrides config)
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, classify and score every workbook in a folder
    Run {
        /// Folder of BOQ workbooks (default: config data_dir)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Reference tag map CSV (default: config tag_map_path)
        #[arg(short, long)]
        tag_map: Option<PathBuf>,

        /// Where predictions_<file>.json are written
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Extraction strategy (positional/header/auto)
        #[arg(short, long, default_value = "auto")]
        strategy: ExtractionStrategy,

        /// Oracle calls in flight (default: config max_concurrency)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Reuse cached classifications from the output folder
        #[arg(long)]
        use_cache: bool,

        /// Also write mismatches_<file>.json
        #[arg(long)]
        mismatches: bool,
    },

    /// Extract work items from one workbook without classifying
    Extract {
        /// Workbook path
        #[arg(required = true)]
        file: PathBuf,

        /// Extraction strategy (positional/header/auto)
        #[arg(short, long, default_value = "auto")]
        strategy: ExtractionStrategy,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a predictions file against the reference tag map
    Score {
        /// predictions_<file>.json
        #[arg(required = true)]
        predictions: PathBuf,

        /// Reference tag map CSV (default: config tag_map_path)
        #[arg(short, long)]
        tag_map: Option<PathBuf>,

        /// Print every mismatch
        #[arg(long)]
        mismatches: bool,
    },

    /// Build the reference tag map from the TAG columns of every workbook
    Tags {
        /// Folder of BOQ workbooks (default: config data_dir)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output CSV (default: config tag_map_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or edit settings
    Config {
        /// Set the AI provider
        #[arg(long)]
        set_provider: Option<AiProvider>,

        /// Set the model passed to the AI CLI
        #[arg(long)]
        set_model: Option<String>,

        /// Show settings
        #[arg(long)]
        show: bool,
    },

    /// Classification cache management
    Cache {
        /// Delete the cache
        #[arg(long)]
        clear: bool,

        /// Folder holding the cache (default: current directory)
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Show cache info
        #[arg(long)]
        info: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::parse_from(["boq-tagger", "run"]);
        match cli.command {
            Commands::Run { strategy, output_dir, use_cache, concurrency, .. } => {
                assert_eq!(strategy, ExtractionStrategy::Auto);
                assert_eq!(output_dir, PathBuf::from("."));
                assert!(!use_cache);
                assert!(concurrency.is_none());
            }
            _ => panic!("expected run"),
        }
        assert!(cli.ai_provider.is_none());
    }

    #[test]
    fn test_parse_extract_with_strategy() {
        let cli = Cli::parse_from(["boq-tagger", "--ai-provider", "gemini", "extract", "a.xlsx", "-s", "header"]);
        assert_eq!(cli.ai_provider, Some(AiProvider::Gemini));
        match cli.command {
            Commands::Extract { file, strategy, .. } => {
                assert_eq!(file, PathBuf::from("a.xlsx"));
                assert_eq!(strategy, ExtractionStrategy::Header);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Cli::try_parse_from(["boq-tagger", "extract", "a.xlsx", "-s", "magic"]).is_err());
    }
}
