//! Materialization.
//!
//! Writes a `GeneratedTree` to disk without destroying user-owned content.
//! The generated root is fully engine-owned: unchanged files are left
//! untouched (mtime-preserving), changed and new files are written
//! atomically (temp-then-rename), and files from deselected choices are
//! pruned. The sibling custom root is never written or pruned.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, RulegenError, Warning};
use crate::target::GeneratedTree;

/// What one materialization run did on disk.
#[derive(Debug, Clone, Default)]
pub struct MaterializeReport {
    pub written: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Per-file failures; the rest of the run proceeded.
    pub failed: Vec<Warning>,
}

impl MaterializeReport {
    /// True when the run touched nothing on disk.
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.pruned.is_empty() && self.failed.is_empty()
    }
}

pub struct Materializer {
    /// Absolute path of the generated root for one target.
    root: PathBuf,
    target: String,
    dry_run: bool,
}

impl Materializer {
    pub fn new(root: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            target: target.into(),
            dry_run: false,
        }
    }

    /// Compute the diff without touching disk.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Write the tree, returning what changed.
    ///
    /// Idempotent: a second run with the same tree reports everything
    /// unchanged and performs no filesystem changes. Failure to create the
    /// root itself is fatal; individual file failures are collected and the
    /// remaining writes continue.
    pub async fn materialize(&self, tree: &GeneratedTree) -> Result<MaterializeReport> {
        if !self.dry_run {
            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|e| RulegenError::RootCreate {
                    target: self.target.clone(),
                    path: self.root.clone(),
                    reason: e.to_string(),
                })?;
        }

        let existing = self.scan_existing();
        let mut report = MaterializeReport::default();

        for (rel, content) in tree.files() {
            let full = self.root.join(rel);
            match tokio::fs::read(&full).await {
                Ok(bytes) if bytes == content.as_bytes() => {
                    report.unchanged.push(rel.clone());
                    continue;
                }
                _ => {}
            }

            if self.dry_run {
                report.written.push(rel.clone());
                continue;
            }

            match self.write_atomic(&full, content).await {
                Ok(()) => {
                    debug!(path = %rel.display(), "wrote file");
                    report.written.push(rel.clone());
                }
                Err(e) => {
                    warn!(path = %rel.display(), error = %e, "write failed");
                    report.failed.push(Warning::WriteFailed {
                        path: rel.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Prune stale output from deselected choices.
        for rel in existing {
            if tree.contains(&rel) {
                continue;
            }
            if self.dry_run {
                report.pruned.push(rel);
                continue;
            }
            let full = self.root.join(&rel);
            match tokio::fs::remove_file(&full).await {
                Ok(()) => {
                    debug!(path = %rel.display(), "pruned file");
                    report.pruned.push(rel);
                }
                Err(e) => {
                    report.failed.push(Warning::WriteFailed {
                        path: rel.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !self.dry_run && !report.pruned.is_empty() {
            self.remove_empty_dirs().await;
        }

        info!(
            target = %self.target,
            written = report.written.len(),
            pruned = report.pruned.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "materialized"
        );

        Ok(report)
    }

    /// Relative paths of every file currently under the generated root.
    fn scan_existing(&self) -> BTreeSet<PathBuf> {
        let mut paths = BTreeSet::new();
        if !self.root.is_dir() {
            return paths;
        }
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                    paths.insert(rel.to_path_buf());
                }
            }
        }
        paths
    }

    /// Write-to-temp-then-rename, so a crash mid-run never leaves a
    /// half-written file at the destination.
    async fn write_atomic(&self, full: &Path, content: &str) -> Result<()> {
        let parent = full
            .parent()
            .ok_or_else(|| RulegenError::Other(format!("no parent for {}", full.display())))?;
        tokio::fs::create_dir_all(parent).await?;

        let tmp = tempfile::NamedTempFile::new_in(parent)?;
        std::io::Write::write_all(&mut tmp.as_file(), content.as_bytes())?;
        tmp.persist(full)
            .map_err(|e| RulegenError::Io(e.error))?;
        Ok(())
    }

    /// Drop directories emptied by pruning, deepest first.
    async fn remove_empty_dirs(&self) {
        let mut dirs: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.path() != self.root)
            .map(|e| e.path().to_path_buf())
            .collect();
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
        for dir in dirs {
            // Fails for non-empty directories, which is the point.
            let _ = tokio::fs::remove_dir(&dir).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree(entries: &[(&str, &str)]) -> GeneratedTree {
        let mut tree = GeneratedTree::new();
        for (path, content) in entries {
            tree.insert(PathBuf::from(path), content.to_string());
        }
        tree
    }

    #[tokio::test]
    async fn writes_new_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("rules");
        let m = Materializer::new(&root, "claude");

        let report = m
            .materialize(&tree(&[("core/style.md", "a\n"), ("frontend/react.md", "b\n")]))
            .await
            .unwrap();

        assert_eq!(report.written.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(std::fs::read_to_string(root.join("core/style.md")).unwrap(), "a\n");
    }

    #[tokio::test]
    async fn second_run_is_noop() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("rules");
        let m = Materializer::new(&root, "claude");
        let t = tree(&[("core/style.md", "a\n")]);

        m.materialize(&t).await.unwrap();
        let mtime_before = std::fs::metadata(root.join("core/style.md"))
            .unwrap()
            .modified()
            .unwrap();

        let report = m.materialize(&t).await.unwrap();
        assert!(report.is_noop());
        assert_eq!(report.unchanged.len(), 1);

        let mtime_after = std::fs::metadata(root.join("core/style.md"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(mtime_before, mtime_after);
    }

    #[tokio::test]
    async fn prunes_stale_files_and_empty_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("rules");
        let m = Materializer::new(&root, "claude");

        m.materialize(&tree(&[
            ("core/style.md", "a\n"),
            ("frontend/react-modular.md", "s\n"),
        ]))
        .await
        .unwrap();

        let report = m.materialize(&tree(&[("core/style.md", "a\n")])).await.unwrap();
        assert_eq!(report.pruned, vec![PathBuf::from("frontend/react-modular.md")]);
        assert!(!root.join("frontend/react-modular.md").exists());
        assert!(!root.join("frontend").exists());
        assert!(root.join("core/style.md").exists());
    }

    #[tokio::test]
    async fn rewrites_changed_content() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("rules");
        let m = Materializer::new(&root, "claude");

        m.materialize(&tree(&[("core/style.md", "old\n")])).await.unwrap();
        let report = m.materialize(&tree(&[("core/style.md", "new\n")])).await.unwrap();

        assert_eq!(report.written, vec![PathBuf::from("core/style.md")]);
        assert_eq!(std::fs::read_to_string(root.join("core/style.md")).unwrap(), "new\n");
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("rules");
        let m = Materializer::new(&root, "claude").dry_run();

        let report = m.materialize(&tree(&[("core/style.md", "a\n")])).await.unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn root_create_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        // A file where the root directory should go.
        let blocker = tmp.path().join("rules");
        std::fs::write(&blocker, "not a dir").unwrap();

        let m = Materializer::new(blocker.join("sub"), "claude");
        let result = m.materialize(&tree(&[("core/style.md", "a\n")])).await;
        assert!(matches!(result, Err(RulegenError::RootCreate { .. })));
    }

    #[tokio::test]
    async fn per_file_failure_does_not_abort_run() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("rules");
        std::fs::create_dir_all(&root).unwrap();
        // A file where a subdirectory is needed makes that write fail,
        // independent of the user the test runs as.
        std::fs::write(root.join("blocked"), "in the way").unwrap();

        let m = Materializer::new(&root, "claude");
        let report = m
            .materialize(&tree(&[
                ("blocked/note.md", "x\n"),
                ("core/style.md", "a\n"),
            ]))
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            &report.failed[0],
            Warning::WriteFailed { path, .. } if path == "blocked/note.md"
        ));
        assert_eq!(report.written, vec![PathBuf::from("core/style.md")]);
        assert!(root.join("core/style.md").exists());
    }
}
