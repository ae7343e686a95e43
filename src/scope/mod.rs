//! Path scoping.
//!
//! Decides per fragment whether it is always-on (loaded in every context)
//! or restricted to files matching a glob set, and validates the globs so
//! consuming tools never receive an unparsable pattern.

use globset::Glob;
use tracing::{debug, warn};

use crate::error::Warning;
use crate::resolve::ResolvedFragment;

/// Applicability of an emitted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathScope {
    /// Loaded in every context, regardless of file path.
    AlwaysOn,
    /// Applies only to files matching at least one of the globs. Non-empty,
    /// every pattern syntactically valid.
    Globs(Vec<String>),
}

impl PathScope {
    pub fn is_always_on(&self) -> bool {
        matches!(self, Self::AlwaysOn)
    }

    pub fn globs(&self) -> &[String] {
        match self {
            Self::AlwaysOn => &[],
            Self::Globs(patterns) => patterns,
        }
    }
}

/// A resolved fragment with its scope decided.
#[derive(Debug, Clone)]
pub struct AnnotatedFragment {
    pub resolved: ResolvedFragment,
    pub scope: PathScope,
}

impl AnnotatedFragment {
    pub fn id(&self) -> String {
        self.resolved.id()
    }
}

/// Output of annotation: scoped fragments plus exclusions reported as
/// warnings.
#[derive(Debug, Default)]
pub struct Annotation {
    pub fragments: Vec<AnnotatedFragment>,
    pub warnings: Vec<Warning>,
}

pub struct PathScopeAnnotator;

impl PathScopeAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Annotate every fragment in resolution order.
    ///
    /// Core and `always_on` fragments get no scope. Everything else uses its
    /// declared globs, falling back to the conventional pattern for its
    /// framework or language. A fragment with an invalid glob is excluded
    /// from the run with an `InvalidPathScope` warning.
    pub fn annotate(&self, fragments: Vec<ResolvedFragment>) -> Annotation {
        let mut annotation = Annotation::default();

        'next: for resolved in fragments {
            if resolved.fragment.always_on {
                annotation.fragments.push(AnnotatedFragment {
                    resolved,
                    scope: PathScope::AlwaysOn,
                });
                continue;
            }

            let patterns = if resolved.fragment.scope.is_empty() {
                match default_scope(&resolved) {
                    Some(patterns) => patterns,
                    None => {
                        debug!(fragment = %resolved.id(), "no scope and no convention, treating as always-on");
                        annotation.fragments.push(AnnotatedFragment {
                            resolved,
                            scope: PathScope::AlwaysOn,
                        });
                        continue;
                    }
                }
            } else {
                resolved.fragment.scope.clone()
            };

            for pattern in &patterns {
                if let Err(e) = Glob::new(pattern) {
                    warn!(fragment = %resolved.id(), pattern = %pattern, "invalid glob, excluding fragment");
                    annotation.warnings.push(Warning::InvalidPathScope {
                        fragment: resolved.id(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    });
                    continue 'next;
                }
            }

            annotation.fragments.push(AnnotatedFragment {
                resolved,
                scope: PathScope::Globs(patterns),
            });
        }

        annotation
    }
}

impl Default for PathScopeAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

/// Conventional glob for a fragment that declares none, keyed on the
/// framework first and the language second.
fn default_scope(resolved: &ResolvedFragment) -> Option<Vec<String>> {
    let category = &resolved.fragment.category;

    if let Some(framework) = category.framework() {
        if let Some(pattern) = framework_convention(framework) {
            return Some(vec![pattern.to_string()]);
        }
    }
    if let Some(language) = category.language() {
        if let Some(pattern) = language_convention(language) {
            return Some(vec![pattern.to_string()]);
        }
    }
    None
}

fn framework_convention(framework: &str) -> Option<&'static str> {
    let pattern = match framework {
        "react" | "nextjs" => "**/*.{jsx,tsx}",
        "vue" | "nuxt" => "**/*.vue",
        "svelte" => "**/*.svelte",
        "angular" => "**/*.{ts,html}",
        "django" | "flask" | "fastapi" => "**/*.py",
        "rails" => "**/*.rb",
        "spring" => "**/*.java",
        "laravel" => "**/*.php",
        "axum" | "actix" => "**/*.rs",
        _ => return None,
    };
    Some(pattern)
}

fn language_convention(language: &str) -> Option<&'static str> {
    let pattern = match language {
        "typescript" => "**/*.{ts,tsx}",
        "javascript" => "**/*.{js,jsx}",
        "python" => "**/*.py",
        "rust" => "**/*.rs",
        "go" => "**/*.go",
        "java" => "**/*.java",
        "kotlin" => "**/*.kt",
        "ruby" => "**/*.rb",
        "csharp" => "**/*.cs",
        "php" => "**/*.php",
        "swift" => "**/*.swift",
        _ => return None,
    };
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{CategoryPath, Fragment};
    use crate::resolve::{PrecedenceTier, ResolvedFragment};

    fn resolved(category: &str, name: &str, scope: Vec<String>) -> ResolvedFragment {
        let fragment =
            Fragment::new(CategoryPath::parse(category).unwrap(), name, "body\n").with_scope(scope);
        let tier = PrecedenceTier::of(&fragment);
        let content = fragment.content.clone();
        ResolvedFragment {
            fragment,
            tier,
            content,
        }
    }

    #[test]
    fn core_fragment_is_always_on() {
        let annotation =
            PathScopeAnnotator::new().annotate(vec![resolved("core:general", "style", vec![])]);
        assert_eq!(annotation.fragments.len(), 1);
        assert!(annotation.fragments[0].scope.is_always_on());
    }

    #[test]
    fn declared_scope_passes_through() {
        let annotation = PathScopeAnnotator::new().annotate(vec![resolved(
            "language:typescript/framework:react/structure:react-modular",
            "react-modular",
            vec!["src/**/*.{jsx,tsx}".into()],
        )]);
        assert_eq!(
            annotation.fragments[0].scope.globs(),
            &["src/**/*.{jsx,tsx}".to_string()]
        );
    }

    #[test]
    fn framework_convention_fills_missing_scope() {
        let annotation = PathScopeAnnotator::new().annotate(vec![resolved(
            "language:typescript/framework:vue",
            "vue",
            vec![],
        )]);
        assert_eq!(
            annotation.fragments[0].scope.globs(),
            &["**/*.vue".to_string()]
        );
    }

    #[test]
    fn language_convention_fills_missing_scope() {
        let annotation = PathScopeAnnotator::new().annotate(vec![resolved(
            "language:typescript",
            "base",
            vec![],
        )]);
        assert_eq!(
            annotation.fragments[0].scope.globs(),
            &["**/*.{ts,tsx}".to_string()]
        );
    }

    #[test]
    fn invalid_glob_excludes_fragment_with_warning() {
        let annotation = PathScopeAnnotator::new().annotate(vec![
            resolved(
                "language:typescript/framework:react",
                "broken",
                vec!["**/*.{jsx,tsx".into()],
            ),
            resolved("language:typescript", "base", vec![]),
        ]);

        assert_eq!(annotation.fragments.len(), 1);
        assert_eq!(annotation.fragments[0].resolved.fragment.name, "base");
        assert!(matches!(
            &annotation.warnings[0],
            Warning::InvalidPathScope { pattern, .. } if pattern == "**/*.{jsx,tsx"
        ));
    }

    #[test]
    fn unknown_language_without_scope_is_always_on() {
        let annotation =
            PathScopeAnnotator::new().annotate(vec![resolved("language:cobol", "base", vec![])]);
        assert!(annotation.fragments[0].scope.is_always_on());
    }
}
