//! Precedence resolution.
//!
//! Turns a `SelectionSet` plus a `FragmentStore` into an ordered,
//! deduplicated fragment list. Conflicts between tiers are resolved by an
//! explicit precedence order: a higher-tier fragment that claims an
//! override key suppresses the matching section of every lower-tier
//! fragment, while the rest of the lower-tier content survives.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::Warning;
use crate::fragment::{CategoryPath, Facet, Fragment, FragmentStore, Segment, SegmentKind};
use crate::selection::SelectionSet;

/// Precedence tiers, lowest to highest. On a direct conflict (same override
/// key) the higher tier wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedenceTier {
    Process,
    GeneralCodeStyle,
    GeneralArchitecture,
    LanguageCodeStyle,
    LanguageArchitecture,
    Framework,
    Structure,
}

impl PrecedenceTier {
    /// Tier of a fragment, determined by its deepest category segment and,
    /// for general and language fragments, its declared facet.
    pub fn of(fragment: &Fragment) -> Self {
        match fragment.category.leaf().kind {
            SegmentKind::Structure => Self::Structure,
            SegmentKind::Framework => Self::Framework,
            SegmentKind::Language => match fragment.facet {
                Facet::Architecture => Self::LanguageArchitecture,
                Facet::CodeStyle => Self::LanguageCodeStyle,
            },
            SegmentKind::Core => match fragment.facet {
                Facet::Architecture => Self::GeneralArchitecture,
                Facet::CodeStyle => Self::GeneralCodeStyle,
            },
            SegmentKind::Process => Self::Process,
        }
    }
}

impl std::fmt::Display for PrecedenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Process => "process",
            Self::GeneralCodeStyle => "general-code-style",
            Self::GeneralArchitecture => "general-architecture",
            Self::LanguageCodeStyle => "language-code-style",
            Self::LanguageArchitecture => "language-architecture",
            Self::Framework => "framework",
            Self::Structure => "structure",
        };
        f.write_str(name)
    }
}

/// A fragment after precedence resolution: its tier and its content with
/// any overridden sections removed.
#[derive(Debug, Clone)]
pub struct ResolvedFragment {
    pub fragment: Fragment,
    pub tier: PrecedenceTier,
    pub content: String,
}

impl ResolvedFragment {
    pub fn id(&self) -> String {
        self.fragment.id()
    }
}

/// Output of a resolution run: the ordered fragment list plus the
/// recoverable conditions encountered along the way.
#[derive(Debug, Default)]
pub struct Resolution {
    pub fragments: Vec<ResolvedFragment>,
    pub warnings: Vec<Warning>,
}

pub struct PrecedenceResolver<'a> {
    store: &'a dyn FragmentStore,
}

impl<'a> PrecedenceResolver<'a> {
    pub fn new(store: &'a dyn FragmentStore) -> Self {
        Self { store }
    }

    /// Resolve a validated selection into an ordered fragment list.
    ///
    /// Deterministic for identical inputs: fragments are ordered by tier
    /// (ascending precedence, so base guidance precedes its overrides) and
    /// by category path within a tier. A selected category with no
    /// fragments produces a `FragmentNotFound` warning, not a failure.
    pub fn resolve(&self, selection: &SelectionSet) -> Resolution {
        let mut warnings = Vec::new();
        let mut picked: BTreeMap<(CategoryPath, String), Fragment> = BTreeMap::new();

        // Core fragments are included in every run, selected or not.
        for fragment in self.store.all() {
            if fragment.category.segments()[0].kind == SegmentKind::Core {
                picked.insert(
                    (fragment.category.clone(), fragment.name.clone()),
                    fragment,
                );
            }
        }

        for language in &selection.languages {
            self.collect(
                &[Segment::language(language)],
                &mut picked,
                &mut warnings,
            );
        }

        let mut frameworks = selection.frameworks.clone();
        frameworks.sort_by(|a, b| a.name.cmp(&b.name));
        for framework in &frameworks {
            self.collect(
                &[
                    Segment::language(&framework.language),
                    Segment::framework(&framework.name),
                ],
                &mut picked,
                &mut warnings,
            );
        }

        let mut structures = selection.structures.clone();
        structures.sort_by(|a, b| a.name.cmp(&b.name));
        for structure in &structures {
            // validate() guarantees the framework exists in the selection.
            let Some(language) = selection.language_of(&structure.framework) else {
                continue;
            };
            self.collect(
                &[
                    Segment::language(language),
                    Segment::framework(&structure.framework),
                    Segment::structure(&structure.name),
                ],
                &mut picked,
                &mut warnings,
            );
        }

        let mut processes = selection.processes.clone();
        processes.sort_by(|a, b| a.name.cmp(&b.name));
        for process in &processes {
            self.collect(&[Segment::process(&process.name)], &mut picked, &mut warnings);
        }

        let mut resolved: Vec<ResolvedFragment> = picked
            .into_values()
            .map(|fragment| {
                let tier = PrecedenceTier::of(&fragment);
                let content = fragment.content.clone();
                ResolvedFragment {
                    fragment,
                    tier,
                    content,
                }
            })
            .collect();

        apply_overrides(&mut resolved, &mut warnings);

        resolved.sort_by(|a, b| {
            (a.tier, &a.fragment.category, &a.fragment.name).cmp(&(
                b.tier,
                &b.fragment.category,
                &b.fragment.name,
            ))
        });

        debug!(
            fragments = resolved.len(),
            warnings = warnings.len(),
            "resolution complete"
        );

        Resolution {
            fragments: resolved,
            warnings,
        }
    }

    fn collect(
        &self,
        category: &[Segment],
        picked: &mut BTreeMap<(CategoryPath, String), Fragment>,
        warnings: &mut Vec<Warning>,
    ) {
        let found = self.store.fragments_at(category);
        if found.is_empty() {
            let category = category
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("/");
            warnings.push(Warning::FragmentNotFound { category });
            return;
        }
        for fragment in found {
            picked
                .entry((fragment.category.clone(), fragment.name.clone()))
                .or_insert(fragment);
        }
    }
}

/// Suppress overridden sections and detect same-tier override collisions.
fn apply_overrides(resolved: &mut [ResolvedFragment], warnings: &mut Vec<Warning>) {
    // key -> claimants, sorted by (tier, id) for deterministic reporting.
    let mut claims: BTreeMap<String, Vec<(PrecedenceTier, String)>> = BTreeMap::new();
    for item in resolved.iter() {
        for key in &item.fragment.overrides {
            claims
                .entry(slugify(key))
                .or_default()
                .push((item.tier, item.id()));
        }
    }

    for (key, claimants) in &mut claims {
        claimants.sort();
        for pair in claimants.windows(2) {
            if pair[0].0 == pair[1].0 {
                warnings.push(Warning::AmbiguousOverride {
                    key: key.clone(),
                    first: pair[0].1.clone(),
                    second: pair[1].1.clone(),
                });
            }
        }
    }

    for item in resolved.iter_mut() {
        for (key, claimants) in &claims {
            let overridden = claimants.iter().any(|(tier, _)| *tier > item.tier);
            if !overridden {
                continue;
            }
            if let Some(stripped) = strip_section(&item.content, key) {
                debug!(fragment = %item.id(), key = %key, "suppressed overridden section");
                item.content = stripped;
            }
        }
    }
}

/// Remove the `## `-level section whose slugified heading matches `key`.
/// Returns `None` when the fragment has no such section.
fn strip_section(content: &str, key: &str) -> Option<String> {
    let mut out = Vec::new();
    let mut suppressing = false;
    let mut found = false;

    for line in content.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            if slugify(heading) == key {
                suppressing = true;
                found = true;
                continue;
            }
            suppressing = false;
        } else if line.starts_with("# ") {
            suppressing = false;
        }
        if !suppressing {
            out.push(line);
        }
    }

    if !found {
        return None;
    }

    let mut result = out.join("\n");
    if content.ends_with('\n') {
        result.push('\n');
    }
    Some(result)
}

/// Lowercase alphanumeric slug, hyphen-separated: `Folder Organization`
/// becomes `folder-organization`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_hyphen = true;
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
