//! Fragment catalogs.
//!
//! `DirFragmentStore` walks a fragments directory where each path component
//! names a category segment (`language:typescript/framework:react/hooks.md`)
//! and each `.md` file is one fragment. `MemoryFragmentStore` backs tests
//! and embedded catalogs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, RulegenError, Warning};

use super::{CategoryPath, Fragment, Segment, parse_fragment_file};

/// Read-only catalog of rule fragments.
///
/// Enumeration order is deterministic regardless of the backing storage's
/// iteration order.
pub trait FragmentStore: Send + Sync {
    /// All fragments, sorted by (category, name).
    fn all(&self) -> Vec<Fragment>;

    /// Fragments whose category path is exactly the given segments.
    ///
    /// Deeper categories are distinct selections: fragments under
    /// `language:typescript/framework:react` are not returned for
    /// `language:typescript`.
    fn fragments_at(&self, category: &[Segment]) -> Vec<Fragment> {
        self.all()
            .into_iter()
            .filter(|f| f.category.segments() == category)
            .collect()
    }
}

/// In-memory store for tests and embedded catalogs.
#[derive(Debug, Default)]
pub struct MemoryFragmentStore {
    fragments: BTreeMap<(CategoryPath, String), Fragment>,
}

impl MemoryFragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fragment: Fragment) {
        self.fragments
            .insert((fragment.category.clone(), fragment.name.clone()), fragment);
    }

    pub fn with(mut self, fragment: Fragment) -> Self {
        self.insert(fragment);
        self
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl FragmentStore for MemoryFragmentStore {
    fn all(&self) -> Vec<Fragment> {
        self.fragments.values().cloned().collect()
    }
}

/// Filesystem-backed store rooted at a fragments directory.
#[derive(Debug)]
pub struct DirFragmentStore {
    root: PathBuf,
    fragments: BTreeMap<(CategoryPath, String), Fragment>,
    warnings: Vec<Warning>,
}

impl DirFragmentStore {
    /// Load every `.md` file under `root`. Files that fail to parse are
    /// skipped with a warning; only a missing root directory is an error.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(RulegenError::Store(format!(
                "fragments directory not found: {}",
                root.display()
            )));
        }

        let mut fragments = BTreeMap::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warnings.push(Warning::InvalidFragment {
                        path: e
                            .path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| root.display().to_string()),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            match Self::load_file(root, path) {
                Ok(fragment) => {
                    debug!(fragment = %fragment.id(), "loaded fragment");
                    fragments.insert((fragment.category.clone(), fragment.name.clone()), fragment);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping fragment file");
                    warnings.push(Warning::InvalidFragment {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            fragments,
            warnings,
        })
    }

    fn load_file(root: &Path, path: &Path) -> Result<Fragment> {
        let rel = path
            .strip_prefix(root)
            .map_err(|e| RulegenError::Store(e.to_string()))?;

        let dir = rel
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                RulegenError::Store("fragment file must live under a category directory".into())
            })?;

        let segments = dir
            .components()
            .map(|c| Segment::parse(&c.as_os_str().to_string_lossy()))
            .collect::<Result<Vec<_>>>()?;
        let category = CategoryPath::new(segments)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| RulegenError::Store("fragment file has no valid stem".into()))?
            .to_string();

        let raw = std::fs::read_to_string(path)?;
        let (meta, body) = parse_fragment_file(&raw)?;

        let mut fragment = Fragment::new(category, name, body)
            .with_overrides(meta.overrides)
            .with_facet(meta.facet.unwrap_or_default());
        if let Some(scope) = meta.scope {
            fragment = fragment.with_scope(scope.into_patterns());
        }
        if meta.always_on {
            fragment = fragment.with_always_on();
        }
        Ok(fragment)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files that were skipped during loading.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl FragmentStore for DirFragmentStore {
    fn all(&self) -> Vec<Fragment> {
        self.fragments.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fragment(root: &Path, rel_dir: &str, name: &str, content: &str) {
        let dir = root.join(rel_dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.md", name)), content).unwrap();
    }

    #[test]
    fn loads_fragments_by_directory_category() {
        let tmp = TempDir::new().unwrap();
        write_fragment(tmp.path(), "core:general", "style", "# Style\n");
        write_fragment(
            tmp.path(),
            "language:typescript/framework:react",
            "hooks",
            "---\nscope: \"**/*.{jsx,tsx}\"\n---\n# Hooks\n",
        );

        let store = DirFragmentStore::load(tmp.path()).unwrap();
        let all = store.all();
        assert_eq!(all.len(), 2);
        assert!(store.warnings().is_empty());

        let hooks = all.iter().find(|f| f.name == "hooks").unwrap();
        assert_eq!(
            hooks.category.to_string(),
            "language:typescript/framework:react"
        );
        assert_eq!(hooks.scope, vec!["**/*.{jsx,tsx}".to_string()]);
        assert!(!hooks.always_on);

        let style = all.iter().find(|f| f.name == "style").unwrap();
        assert!(style.always_on);
    }

    #[test]
    fn category_lookup_is_exact() {
        let tmp = TempDir::new().unwrap();
        write_fragment(tmp.path(), "language:typescript", "base", "ts\n");
        write_fragment(tmp.path(), "language:python", "base", "py\n");
        write_fragment(
            tmp.path(),
            "language:typescript/framework:react",
            "react",
            "react\n",
        );

        let store = DirFragmentStore::load(tmp.path()).unwrap();
        let ts = store.fragments_at(&[Segment::language("typescript")]);
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].content, "ts\n");

        let react = store.fragments_at(&[
            Segment::language("typescript"),
            Segment::framework("react"),
        ]);
        assert_eq!(react.len(), 1);
        assert_eq!(react[0].content, "react\n");
    }

    #[test]
    fn bad_segment_directory_is_skipped_with_warning() {
        let tmp = TempDir::new().unwrap();
        write_fragment(tmp.path(), "not-a-segment", "oops", "x\n");
        write_fragment(tmp.path(), "core:general", "ok", "x\n");

        let store = DirFragmentStore::load(tmp.path()).unwrap();
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.warnings().len(), 1);
    }

    #[test]
    fn top_level_file_is_skipped_with_warning() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("stray.md"), "x\n").unwrap();

        let store = DirFragmentStore::load(tmp.path()).unwrap();
        assert!(store.all().is_empty());
        assert_eq!(store.warnings().len(), 1);
    }

    #[test]
    fn missing_root_is_error() {
        assert!(DirFragmentStore::load(Path::new("/nonexistent/fragments")).is_err());
    }

    #[test]
    fn enumeration_is_sorted() {
        let tmp = TempDir::new().unwrap();
        write_fragment(tmp.path(), "language:zig", "base", "z\n");
        write_fragment(tmp.path(), "language:ada", "base", "a\n");
        write_fragment(tmp.path(), "core:general", "style", "c\n");

        let store = DirFragmentStore::load(tmp.path()).unwrap();
        let categories: Vec<String> = store
            .all()
            .iter()
            .map(|f| f.category.to_string())
            .collect();
        assert_eq!(
            categories,
            vec!["core:general", "language:ada", "language:zig"]
        );
    }
}
