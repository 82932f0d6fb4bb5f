//! Command-line structure

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Trading assistant: Russian questions to Finam TradeAPI calls
#[derive(Parser, Debug)]
#[command(name = "trader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask questions and execute the resulting API calls
    Ask(AskArgs),

    /// Generate a submission file for a set of test questions
    Submit(SubmitArgs),

    /// Score a submission against labeled data
    Metrics(MetricsArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Single question; starts an interactive session when omitted
    pub question: Option<String>,

    /// Labeled examples used as few-shot context
    #[arg(long)]
    pub train_file: Option<PathBuf>,

    /// Number of few-shot examples
    #[arg(long, default_value_t = 10)]
    pub num_examples: usize,

    /// Approve POST and DELETE requests without asking
    #[arg(long)]
    pub yes: bool,

    /// Print the resolved intent without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Test questions (`uid;question`)
    #[arg(long, default_value = "data/processed/test.csv")]
    pub test_file: PathBuf,

    /// Labeled examples (`question;type;request`)
    #[arg(long, default_value = "data/processed/train.csv")]
    pub train_file: PathBuf,

    /// Output file (`uid;type;request`)
    #[arg(long, default_value = "data/processed/submission.csv")]
    pub output_file: PathBuf,

    /// Number of few-shot examples
    #[arg(long, default_value_t = 20)]
    pub num_examples: usize,
}

#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Predicted file (`uid;type;request`)
    #[arg(long, default_value = "data/processed/submission.csv")]
    pub pred: PathBuf,

    /// Ground truth file (`uid;type;request`)
    #[arg(long = "true", default_value = "data/processed/train.csv")]
    pub truth: PathBuf,

    /// Number of errors to print
    #[arg(long, default_value_t = 0)]
    pub show_errors: usize,

    /// Write every error to this CSV file
    #[arg(long)]
    pub save_errors: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_submit_defaults() {
        let cli = Cli::parse_from(["trader", "submit"]);
        let Commands::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.num_examples, 20);
        assert_eq!(args.output_file, PathBuf::from("data/processed/submission.csv"));
    }

    #[test]
    fn test_metrics_flags() {
        let cli = Cli::parse_from([
            "trader",
            "-vv",
            "metrics",
            "--pred",
            "p.csv",
            "--true",
            "t.csv",
            "--show-errors",
            "5",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Metrics(args) = cli.command else {
            panic!("expected metrics");
        };
        assert_eq!(args.truth, PathBuf::from("t.csv"));
        assert_eq!(args.show_errors, 5);
        assert!(args.save_errors.is_none());
    }

    #[test]
    fn test_ask_one_shot() {
        let cli = Cli::parse_from(["trader", "ask", "Цена Сбербанка", "--yes"]);
        let Commands::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.question.as_deref(), Some("Цена Сбербанка"));
        assert!(args.yes);
        assert!(!args.dry_run);
    }
}
