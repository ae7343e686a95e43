use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::engine::{RunStatus, TargetSummary, overall_status};
use crate::fragment::Fragment;
use crate::resolve::PrecedenceTier;

/// Output writer that handles different output formats.
///
/// Supports three output modes:
/// - Text: Human-readable formatted output (default)
/// - Json: Single JSON object at completion
/// - Stream: NDJSON streaming (one JSON object per line)
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the configured output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Emit the per-target summaries of a run.
    pub fn emit_run(&self, summaries: &[TargetSummary]) {
        match self.format {
            OutputFormat::Text => {}
            OutputFormat::Json => {
                self.write_json(&RunOutput::from_summaries(summaries));
            }
            OutputFormat::Stream => {
                for summary in summaries {
                    self.write_json(summary);
                }
            }
        }
    }

    /// Emit the fragment catalog listing.
    pub fn emit_fragments(&self, fragments: &[Fragment]) {
        let infos: Vec<FragmentInfo> = fragments.iter().map(FragmentInfo::from).collect();
        match self.format {
            OutputFormat::Text => {}
            OutputFormat::Json => self.write_json(&infos),
            OutputFormat::Stream => {
                for info in &infos {
                    self.write_json(info);
                }
            }
        }
    }

    /// Emit a simple message.
    pub fn emit_message(&self, message: &str) {
        match self.format {
            OutputFormat::Text => {
                println!("{}", message);
            }
            OutputFormat::Json | OutputFormat::Stream => {
                let msg = MessageOutput {
                    message: message.to_string(),
                };
                self.write_json(&msg);
            }
        }
    }

    fn write_json<T: Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }
}

/// Whole-run output: overall status plus every target summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput<'a> {
    pub status: RunStatus,
    pub targets: &'a [TargetSummary],
}

impl<'a> RunOutput<'a> {
    pub fn from_summaries(summaries: &'a [TargetSummary]) -> Self {
        Self {
            status: overall_status(summaries),
            targets: summaries,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FragmentInfo {
    pub id: String,
    pub category: String,
    pub name: String,
    pub tier: PrecedenceTier,
    pub always_on: bool,
    pub scope: Vec<String>,
    pub overrides: Vec<String>,
}

impl From<&Fragment> for FragmentInfo {
    fn from(fragment: &Fragment) -> Self {
        Self {
            id: fragment.id(),
            category: fragment.category.to_string(),
            name: fragment.name.clone(),
            tier: PrecedenceTier::of(fragment),
            always_on: fragment.always_on,
            scope: fragment.scope.clone(),
            overrides: fragment.overrides.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct MessageOutput {
    message: String,
}
