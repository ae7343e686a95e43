use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::{Result, RulegenError};
use crate::selection::{ProcessMode, SelectionSet};

#[derive(Parser)]
#[command(name = "rulegen")]
#[command(author, version, about = "Rule fragment composer for AI coding assistants", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to the fragments directory (default: from config)
    #[arg(long, global = true, env = "RULEGEN_FRAGMENTS")]
    pub fragments: Option<PathBuf>,
}

/// Output format for CLI results.
/// - Text: Human-readable text output (default)
/// - Json: Single JSON object at completion
/// - Stream: NDJSON streaming (one JSON object per line)
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Stream,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize rulegen in the current project
    Init,

    /// Generate rule trees for the selected stack
    Generate {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Targets to generate (default: from config)
        #[arg(long)]
        target: Vec<String>,

        /// Compute the diff without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a selection against the fragment catalog without writing
    Check {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Targets to check (default: from config)
        #[arg(long)]
        target: Vec<String>,
    },

    /// List the fragments in the catalog
    List,

    /// List the registered target adapters
    Targets,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Reset to defaults
    Reset,
}

/// Stack selection flags shared by `generate` and `check`.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Selected language (repeatable)
    #[arg(long = "language", value_name = "NAME")]
    pub languages: Vec<String>,

    /// Selected framework as language:name (repeatable)
    #[arg(long = "framework", value_name = "LANGUAGE:NAME")]
    pub frameworks: Vec<String>,

    /// Selected structure as framework:name (at most one per framework)
    #[arg(long = "structure", value_name = "FRAMEWORK:NAME")]
    pub structures: Vec<String>,

    /// Selected process, loaded permanently (repeatable)
    #[arg(long = "process", value_name = "NAME")]
    pub processes: Vec<String>,

    /// Selected process, loaded on demand (repeatable)
    #[arg(long = "on-demand", value_name = "NAME")]
    pub on_demand: Vec<String>,
}

impl SelectionArgs {
    /// Build a `SelectionSet`. Pair syntax errors surface as
    /// `InvalidSelection`; the invariant checks themselves run inside the
    /// engine.
    pub fn to_selection(&self) -> Result<SelectionSet> {
        let mut selection = SelectionSet::new();

        for language in &self.languages {
            selection = selection.with_language(language);
        }
        for framework in &self.frameworks {
            let (language, name) = split_pair(framework, "framework", "language:name")?;
            selection = selection.with_framework(language, name);
        }
        for structure in &self.structures {
            let (framework, name) = split_pair(structure, "structure", "framework:name")?;
            selection = selection.with_structure(framework, name);
        }
        for process in &self.processes {
            selection = selection.with_process(process, ProcessMode::Permanent);
        }
        for process in &self.on_demand {
            selection = selection.with_process(process, ProcessMode::OnDemand);
        }

        Ok(selection)
    }
}

fn split_pair<'a>(text: &'a str, flag: &str, shape: &str) -> Result<(&'a str, &'a str)> {
    match text.split_once(':') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => Ok((left, right)),
        _ => Err(RulegenError::InvalidSelection(format!(
            "--{} expects {}, got '{}'",
            flag, shape, text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_args_build_selection() {
        let args = SelectionArgs {
            languages: vec!["typescript".into()],
            frameworks: vec!["typescript:react".into()],
            structures: vec!["react:react-modular".into()],
            processes: vec!["tdd".into()],
            on_demand: vec!["code-review".into()],
        };
        let selection = args.to_selection().unwrap();
        assert!(selection.languages.contains("typescript"));
        assert_eq!(selection.frameworks[0].name, "react");
        assert_eq!(selection.structures[0].framework, "react");
        assert_eq!(selection.processes.len(), 2);
        assert!(selection.validate().is_ok());
    }

    #[test]
    fn malformed_pair_is_invalid_selection() {
        let args = SelectionArgs {
            frameworks: vec!["react".into()],
            ..Default::default()
        };
        assert!(matches!(
            args.to_selection(),
            Err(RulegenError::InvalidSelection(_))
        ));
    }
}
