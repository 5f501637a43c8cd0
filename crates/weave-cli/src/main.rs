//! Weave metadata inspection tool
//!
//! Loads a native model, an optional facts table and an optional
//! weave.toml, builds the class metadata and prints what was inferred.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Inspect reflective class metadata", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv); WEAVE_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Input files shared by the commands that build metadata
#[derive(Args, Debug, Clone)]
pub struct Sources {
    /// Native model (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub model: PathBuf,
    /// Facts table (.json or .toml)
    #[arg(short, long, value_name = "FILE")]
    pub facts: Option<PathBuf>,
    /// Repository configuration (weave.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the fields and methods of one class
    Inspect {
        #[command(flatten)]
        sources: Sources,
        /// Class name
        class: String,
    },

    /// List the classes of a model
    Classes {
        /// Native model (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        model: PathBuf,
    },

    /// Resolve a field, expression field or method of a class
    Resolve {
        #[command(flatten)]
        sources: Sources,
        /// Class name
        class: String,
        /// Member name, dotted expression or method signature
        member: String,
    },

    /// Build every class and report diagnostics
    Check {
        #[command(flatten)]
        sources: Sources,
        /// Emit a JSON summary
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("WEAVE_LOG").unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("weave_rtti={level},weave={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let color = output::resolve_color_choice(cli.color.as_deref());

    match cli.command {
        Commands::Inspect { sources, class } => commands::inspect::execute(&sources, &class, color),
        Commands::Classes { model } => commands::classes::execute(&model, color),
        Commands::Resolve { sources, class, member } => commands::resolve::execute(&sources, &class, &member),
        Commands::Check { sources, json } => commands::check::execute(&sources, json, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["weave", "inspect", "--model", "m.toml", "--facts", "f.json", "Bank"]).unwrap();
        match cli.command {
            Commands::Inspect { sources, class } => {
                assert_eq!(class, "Bank");
                assert_eq!(sources.model, PathBuf::from("m.toml"));
                assert_eq!(sources.facts, Some(PathBuf::from("f.json")));
                assert!(sources.config.is_none());
            }
            _ => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_parse_check_json_verbose() {
        let cli = Cli::try_parse_from(["weave", "-vv", "check", "-m", "m.toml", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check { json: true, .. }));
    }

    #[test]
    fn test_resolve_requires_member() {
        assert!(Cli::try_parse_from(["weave", "resolve", "-m", "m.toml", "Bank"]).is_err());
    }
}
