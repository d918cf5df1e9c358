//! Command-line argument parsing and result rendering
//!
//! Thin presentation layer: everything here consumes the orchestrator's
//! produced interface and never reaches into the pipeline.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::rag::GroundedAnswer;
use crate::types::{RequestState, RunStats, TriageVerdict};

/// deskpilot - triage support requests against internal policy documents
#[derive(Parser, Debug)]
#[command(name = "deskpilot")]
#[command(version)]
#[command(about = "Service-desk triage agent grounded in internal policy documents", long_about = None)]
pub struct Args {
    /// Folder with policy documents (overrides the config file)
    #[arg(long, value_name = "DIR")]
    pub corpus: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (warn), -v (info), -vv (debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand; without one an interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one message end to end (triage + grounded answer)
    Ask {
        /// The support message
        message: String,
    },

    /// Classify a message without consulting the corpus
    Triage {
        /// The message to classify
        message: String,
    },

    /// Query the policy corpus without triage
    Query {
        /// The policy question
        question: String,
    },

    /// Show corpus and model information
    Info,
}

impl Args {
    /// Tracing filter directive for the selected verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "deskpilot=info",
            _ => "deskpilot=debug",
        }
    }
}

/// Render a finalized request state
pub fn print_state(state: &RequestState) {
    println!();
    if let Some(verdict) = &state.verdict {
        println!("{}", "TRIAGE".bold().cyan());
        println!("  decision: {}", verdict.decision());
        println!("  urgency:  {}", verdict.urgency());
        if !verdict.missing_fields().is_empty() {
            println!("  missing:  {}", verdict.missing_fields().join(", "));
        }
    }

    if let Some(answer) = &state.answer {
        println!("{}", "ANSWER".bold().cyan());
        println!("  {}", answer);
        if !state.retrieved.is_empty() {
            println!("  {}", "sources:".dimmed());
            for retrieved in &state.retrieved {
                println!(
                    "    [{}] {}",
                    retrieved.relevance_rank,
                    retrieved.chunk.source_id
                );
            }
        }
    }

    println!("{}", "RECOMMENDATION".bold().green());
    if let Some(recommendation) = &state.recommendation {
        println!("  {}", recommendation);
    }
    if let Some(action) = &state.suggested_action {
        println!("  action: {}", action.bold());
    }

    if let Some(error) = &state.error {
        println!("{} {}", "error:".bold().red(), error);
    }

    print_stats(&state.stats());
}

/// Render the statistics view
pub fn print_stats(stats: &RunStats) {
    println!("{}", "STATS".bold().cyan());
    if let Some(decision) = stats.decision {
        println!("  decision:  {}", decision);
    }
    if let Some(urgency) = stats.urgency {
        println!("  urgency:   {}", urgency);
    }
    println!("  attempts:  {}", stats.attempts);
    println!("  documents: {}", stats.documents_consulted);
    println!("  error:     {}", stats.has_error);
    let path: Vec<&str> = stats.executed_path.iter().map(|s| s.name()).collect();
    println!("  path:      {}", path.join(" -> "));
}

/// Render a triage-only verdict
pub fn print_verdict(verdict: &TriageVerdict) {
    println!("{}", "TRIAGE".bold().cyan());
    println!("  decision: {}", verdict.decision());
    println!("  urgency:  {}", verdict.urgency());
    if !verdict.missing_fields().is_empty() {
        println!("  missing:  {}", verdict.missing_fields().join(", "));
    }
}

/// Render a query-only grounded answer
pub fn print_answer(grounded: &GroundedAnswer) {
    println!("{}", "ANSWER".bold().cyan());
    println!("  {}", grounded.answer);
    if !grounded.sources.is_empty() {
        println!("{}", "SOURCES".bold().cyan());
        for source in &grounded.sources {
            println!("  {} {}", "-".dimmed(), source.source_id.bold());
            println!("    {}", source.preview.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_parse() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_ask_subcommand() {
        let args = Args::parse_from(["deskpilot", "ask", "Qual a política de férias?"]);
        match args.command {
            Some(Commands::Ask { message }) => {
                assert_eq!(message, "Qual a política de férias?")
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_maps_to_filter() {
        let args = Args::parse_from(["deskpilot", "-vv", "info"]);
        assert_eq!(args.log_filter(), "deskpilot=debug");

        let args = Args::parse_from(["deskpilot", "info"]);
        assert_eq!(args.log_filter(), "warn");
    }

    #[test]
    fn test_no_subcommand_is_interactive() {
        let args = Args::parse_from(["deskpilot"]);
        assert!(args.command.is_none());
    }
}
