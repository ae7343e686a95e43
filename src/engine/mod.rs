//! The generate entry point.
//!
//! Wires the pipeline together: validate the selection, resolve precedence,
//! annotate scopes, fan out across target adapters, materialize each
//! target's tree, and report one summary per target.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;
use tracing::info;

use crate::error::{Result, RulegenError, Warning};
use crate::fragment::FragmentStore;
use crate::materialize::Materializer;
use crate::resolve::PrecedenceResolver;
use crate::scope::PathScopeAnnotator;
use crate::selection::SelectionSet;
use crate::target::{TargetAdapter, adapter_by_name};

/// Outcome class of a run, per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    SuccessWithWarnings,
    Failed,
}

/// Per-target result of one generate run.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
    pub target: String,
    pub root: PathBuf,
    pub written: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub unchanged: usize,
    pub warnings: Vec<Warning>,
    pub status: RunStatus,
    /// Fatal error for this target, when `status` is `Failed`.
    pub error: Option<String>,
}

impl TargetSummary {
    fn failed(target: &TargetAdapter, project_root: &Path, error: String) -> Self {
        Self {
            target: target.name().to_string(),
            root: project_root.join(target.root()),
            written: Vec::new(),
            pruned: Vec::new(),
            unchanged: 0,
            warnings: Vec::new(),
            status: RunStatus::Failed,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Compute diffs without touching disk.
    pub dry_run: bool,
}

/// Resolve, annotate, adapt, and materialize one run.
///
/// Selection validation failures abort before any I/O. Everything else is
/// collected into per-target summaries: a bad fragment or an unwritable
/// file never prevents the rest of the configuration from being generated,
/// and a fatal root-creation failure on one target leaves other targets
/// untouched.
pub async fn generate(
    selection: &SelectionSet,
    store: &dyn FragmentStore,
    targets: &[String],
    project_root: &Path,
    options: &GenerateOptions,
) -> Result<Vec<TargetSummary>> {
    selection.validate()?;

    let adapters: Vec<TargetAdapter> = targets
        .iter()
        .map(|name| adapter_by_name(name).ok_or_else(|| RulegenError::UnknownTarget(name.clone())))
        .collect::<Result<_>>()?;

    let resolution = PrecedenceResolver::new(store).resolve(selection);
    let annotation = PathScopeAnnotator::new().annotate(resolution.fragments);

    let mut shared_warnings = resolution.warnings;
    shared_warnings.extend(annotation.warnings);

    info!(
        fragments = annotation.fragments.len(),
        targets = adapters.len(),
        dry_run = options.dry_run,
        "generating"
    );

    // Adapters share only read-only inputs; each target writes a disjoint
    // root, so the fan-out needs no coordination.
    let runs = adapters.iter().map(|adapter| {
        let fragments = &annotation.fragments;
        let shared = &shared_warnings;
        async move {
            let output = adapter.adapt(fragments, selection);

            let root = project_root.join(adapter.root());
            let mut materializer = Materializer::new(&root, adapter.name());
            if options.dry_run {
                materializer = materializer.dry_run();
            }

            let mut warnings = shared.clone();
            warnings.extend(output.warnings);

            match materializer.materialize(&output.tree).await {
                Ok(report) => {
                    warnings.extend(report.failed);
                    let status = if warnings.is_empty() {
                        RunStatus::Success
                    } else {
                        RunStatus::SuccessWithWarnings
                    };
                    TargetSummary {
                        target: adapter.name().to_string(),
                        root,
                        written: report.written,
                        pruned: report.pruned,
                        unchanged: report.unchanged.len(),
                        warnings,
                        status,
                        error: None,
                    }
                }
                Err(e) => TargetSummary::failed(adapter, project_root, e.to_string()),
            }
        }
    });

    Ok(join_all(runs).await)
}

/// Overall status across targets: `Failed` dominates, then warnings.
pub fn overall_status(summaries: &[TargetSummary]) -> RunStatus {
    if summaries.iter().any(|s| s.status == RunStatus::Failed) {
        RunStatus::Failed
    } else if summaries
        .iter()
        .any(|s| s.status == RunStatus::SuccessWithWarnings)
    {
        RunStatus::SuccessWithWarnings
    } else {
        RunStatus::Success
    }
}
