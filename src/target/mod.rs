//! Target tool adapters.
//!
//! Each adapter maps a resolved, annotated fragment list into one AI tool's
//! directory and file-naming convention. Adapters share no mutable state,
//! so fan-out across targets is free; the same input always yields
//! byte-identical output (no timestamps, no generated IDs).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Warning;
use crate::fragment::SegmentKind;
use crate::scope::{AnnotatedFragment, PathScope};
use crate::selection::{ProcessMode, SelectionSet};

/// The file tree an adapter produces: output-relative path to content.
/// Built fresh each run, never mutated afterwards, only diffed against
/// disk by the materializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedTree {
    files: BTreeMap<PathBuf, String>,
}

impl GeneratedTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf, content: String) {
        self.files.insert(path, content);
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, String> {
        &self.files
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Front-matter dialect for scoped fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterStyle {
    /// YAML `paths:` list; omitted entirely for always-on fragments.
    ClaudePaths,
    /// Cursor `.mdc` header with `globs:` and `alwaysApply:`.
    CursorGlobs,
}

/// Adapter output plus per-target warnings.
#[derive(Debug, Default)]
pub struct AdapterOutput {
    pub tree: GeneratedTree,
    pub warnings: Vec<Warning>,
}

/// Maps fragment categories into one tool's layout.
#[derive(Debug, Clone)]
pub struct TargetAdapter {
    name: String,
    /// Generated root, relative to the project root.
    root: PathBuf,
    extension: String,
    front_matter: FrontMatterStyle,
    /// Output directory per category kind. A kind absent from this table is
    /// unmapped for this target.
    mapping: BTreeMap<SegmentKind, MappingRule>,
}

/// Where fragments of one category kind land inside the generated root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingRule {
    /// Fixed directory, e.g. `core/`.
    Fixed(String),
    /// Directory named after the leaf's language, under a fixed prefix:
    /// `core/<language>/`.
    PerLanguage(String),
}

impl TargetAdapter {
    /// The `.claude/rules` layout: language rules under `core/<language>/`,
    /// framework and structure rules in a shared group directory, processes
    /// under `process/`.
    pub fn claude() -> Self {
        Self {
            name: "claude".into(),
            root: PathBuf::from(".claude/rules"),
            extension: "md".into(),
            front_matter: FrontMatterStyle::ClaudePaths,
            mapping: BTreeMap::from([
                (SegmentKind::Core, MappingRule::Fixed("core".into())),
                (SegmentKind::Language, MappingRule::PerLanguage("core".into())),
                (SegmentKind::Framework, MappingRule::Fixed("frontend".into())),
                (SegmentKind::Structure, MappingRule::Fixed("frontend".into())),
                (SegmentKind::Process, MappingRule::Fixed("process".into())),
            ]),
        }
    }

    /// The `.cursor/rules` layout. Cursor has no process-rule convention,
    /// so process fragments are unmapped for this target.
    pub fn cursor() -> Self {
        Self {
            name: "cursor".into(),
            root: PathBuf::from(".cursor/rules"),
            extension: "mdc".into(),
            front_matter: FrontMatterStyle::CursorGlobs,
            mapping: BTreeMap::from([
                (SegmentKind::Core, MappingRule::Fixed("core".into())),
                (SegmentKind::Language, MappingRule::PerLanguage("core".into())),
                (SegmentKind::Framework, MappingRule::Fixed("frontend".into())),
                (SegmentKind::Structure, MappingRule::Fixed("frontend".into())),
            ]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generated root, relative to the project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sibling tree owned by the user; the engine never writes there.
    pub fn custom_root(&self) -> PathBuf {
        let mut name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str("-custom");
        self.root.with_file_name(name)
    }

    /// Map the annotated fragment list into this target's tree.
    ///
    /// The selection is consulted only for process modes: on-demand process
    /// fragments land in an `on-demand/` subdirectory so consuming tools
    /// load them only when asked.
    pub fn adapt(&self, fragments: &[AnnotatedFragment], selection: &SelectionSet) -> AdapterOutput {
        let on_demand: BTreeSet<&str> = selection
            .processes
            .iter()
            .filter(|p| p.mode == ProcessMode::OnDemand)
            .map(|p| p.name.as_str())
            .collect();

        let mut output = AdapterOutput::default();

        for annotated in fragments {
            let leaf = annotated.resolved.fragment.category.leaf();
            let Some(rule) = self.mapping.get(&leaf.kind) else {
                output.warnings.push(Warning::UnmappedCategory {
                    target: self.name.clone(),
                    fragment: annotated.id(),
                });
                continue;
            };

            let mut dir = match rule {
                MappingRule::Fixed(dir) => PathBuf::from(dir),
                MappingRule::PerLanguage(prefix) => {
                    let language = annotated
                        .resolved
                        .fragment
                        .category
                        .language()
                        .unwrap_or(leaf.name.as_str());
                    Path::new(prefix).join(language)
                }
            };
            if leaf.kind == SegmentKind::Process && on_demand.contains(leaf.name.as_str()) {
                dir = dir.join("on-demand");
            }

            let path = dir.join(format!(
                "{}.{}",
                annotated.resolved.fragment.name, self.extension
            ));
            let content = self.render(annotated);
            debug!(target = %self.name, path = %path.display(), "mapped fragment");
            output.tree.insert(path, content);
        }

        output
    }

    fn render(&self, annotated: &AnnotatedFragment) -> String {
        let body = &annotated.resolved.content;
        match (&self.front_matter, &annotated.scope) {
            (FrontMatterStyle::ClaudePaths, PathScope::AlwaysOn) => body.clone(),
            (FrontMatterStyle::ClaudePaths, PathScope::Globs(globs)) => {
                let mut out = String::from("---\npaths:\n");
                for glob in globs {
                    out.push_str(&format!("  - \"{}\"\n", glob));
                }
                out.push_str("---\n\n");
                out.push_str(body);
                out
            }
            (FrontMatterStyle::CursorGlobs, scope) => {
                let mut out = String::from("---\n");
                match scope {
                    PathScope::AlwaysOn => out.push_str("alwaysApply: true\n"),
                    PathScope::Globs(globs) => {
                        out.push_str(&format!("globs: {}\n", globs.join(",")));
                        out.push_str("alwaysApply: false\n");
                    }
                }
                out.push_str("---\n\n");
                out.push_str(body);
                out
            }
        }
    }
}

/// Fixed table of built-in adapters.
pub fn builtin_adapters() -> Vec<TargetAdapter> {
    vec![TargetAdapter::claude(), TargetAdapter::cursor()]
}

/// Look up a built-in adapter by name.
pub fn adapter_by_name(name: &str) -> Option<TargetAdapter> {
    builtin_adapters().into_iter().find(|a| a.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{CategoryPath, Fragment};
    use crate::resolve::{PrecedenceTier, ResolvedFragment};
    use crate::scope::PathScope;

    fn annotated(category: &str, name: &str, content: &str, scope: PathScope) -> AnnotatedFragment {
        let fragment = Fragment::new(CategoryPath::parse(category).unwrap(), name, content);
        let tier = PrecedenceTier::of(&fragment);
        AnnotatedFragment {
            resolved: ResolvedFragment {
                content: fragment.content.clone(),
                fragment,
                tier,
            },
            scope,
        }
    }

    #[test]
    fn claude_layout_matches_convention() {
        let fragments = vec![
            annotated("core:general", "style", "general\n", PathScope::AlwaysOn),
            annotated(
                "language:typescript",
                "base",
                "ts\n",
                PathScope::AlwaysOn,
            ),
            annotated(
                "language:typescript/framework:react",
                "react",
                "react\n",
                PathScope::Globs(vec!["**/*.{jsx,tsx}".into()]),
            ),
        ];
        let output = TargetAdapter::claude().adapt(&fragments, &SelectionSet::new());

        assert!(output.tree.contains(Path::new("core/style.md")));
        assert!(output.tree.contains(Path::new("core/typescript/base.md")));
        assert!(output.tree.contains(Path::new("frontend/react.md")));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn claude_front_matter_only_when_scoped() {
        let fragments = vec![
            annotated("core:general", "style", "general\n", PathScope::AlwaysOn),
            annotated(
                "language:typescript/framework:react",
                "react",
                "react\n",
                PathScope::Globs(vec!["**/*.{jsx,tsx}".into()]),
            ),
        ];
        let output = TargetAdapter::claude().adapt(&fragments, &SelectionSet::new());

        let core = &output.tree.files()[Path::new("core/style.md")];
        assert_eq!(core, "general\n");

        let react = &output.tree.files()[Path::new("frontend/react.md")];
        assert!(react.starts_with("---\npaths:\n  - \"**/*.{jsx,tsx}\"\n---\n\n"));
        assert!(react.ends_with("react\n"));
    }

    #[test]
    fn cursor_uses_mdc_and_always_apply() {
        let fragments = vec![
            annotated("core:general", "style", "general\n", PathScope::AlwaysOn),
            annotated(
                "language:typescript/framework:react",
                "react",
                "react\n",
                PathScope::Globs(vec!["**/*.{jsx,tsx}".into()]),
            ),
        ];
        let output = TargetAdapter::cursor().adapt(&fragments, &SelectionSet::new());

        let core = &output.tree.files()[Path::new("core/style.mdc")];
        assert!(core.starts_with("---\nalwaysApply: true\n---\n"));

        let react = &output.tree.files()[Path::new("frontend/react.mdc")];
        assert!(react.contains("globs: **/*.{jsx,tsx}\n"));
        assert!(react.contains("alwaysApply: false\n"));
    }

    #[test]
    fn unmapped_kind_is_skipped_with_warning() {
        let fragments = vec![annotated(
            "process:code-review",
            "checklist",
            "review\n",
            PathScope::AlwaysOn,
        )];
        let output = TargetAdapter::cursor().adapt(&fragments, &SelectionSet::new());

        assert!(output.tree.is_empty());
        assert!(matches!(
            &output.warnings[0],
            Warning::UnmappedCategory { target, .. } if target == "cursor"
        ));
    }

    #[test]
    fn on_demand_process_goes_to_subdirectory() {
        use crate::selection::ProcessMode;
        let fragments = vec![
            annotated(
                "process:code-review",
                "checklist",
                "review\n",
                PathScope::AlwaysOn,
            ),
            annotated("process:tdd", "loop", "tdd\n", PathScope::AlwaysOn),
        ];
        let selection = SelectionSet::new()
            .with_process("code-review", ProcessMode::OnDemand)
            .with_process("tdd", ProcessMode::Permanent);
        let output = TargetAdapter::claude().adapt(&fragments, &selection);

        assert!(output.tree.contains(Path::new("process/on-demand/checklist.md")));
        assert!(output.tree.contains(Path::new("process/loop.md")));
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let fragments = vec![annotated(
            "language:typescript/framework:react",
            "react",
            "react\n",
            PathScope::Globs(vec!["**/*.{jsx,tsx}".into()]),
        )];
        let adapter = TargetAdapter::claude();
        let first = adapter.adapt(&fragments, &SelectionSet::new());
        let second = adapter.adapt(&fragments, &SelectionSet::new());
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn custom_root_is_sibling() {
        assert_eq!(
            TargetAdapter::claude().custom_root(),
            PathBuf::from(".claude/rules-custom")
        );
    }
}
