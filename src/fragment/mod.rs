//! Rule fragment model.
//!
//! A fragment is one rule file's content plus its category and scope
//! metadata: `CategoryPath` places it in the selection/precedence model,
//! front-matter declares its glob scope and override keys.

mod store;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RulegenError};

pub use store::{DirFragmentStore, FragmentStore, MemoryFragmentStore};

/// Position of a category segment in the selection hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Core,
    Language,
    Framework,
    Structure,
    Process,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Language => "language",
            Self::Framework => "framework",
            Self::Structure => "structure",
            Self::Process => "process",
        }
    }
}

/// One `kind:name` element of a category path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub name: String,
}

impl Segment {
    pub fn new(kind: SegmentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn core(name: impl Into<String>) -> Self {
        Self::new(SegmentKind::Core, name)
    }

    pub fn language(name: impl Into<String>) -> Self {
        Self::new(SegmentKind::Language, name)
    }

    pub fn framework(name: impl Into<String>) -> Self {
        Self::new(SegmentKind::Framework, name)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(SegmentKind::Structure, name)
    }

    pub fn process(name: impl Into<String>) -> Self {
        Self::new(SegmentKind::Process, name)
    }

    /// Parse `kind:name` text. Bare `core` is accepted as `core:general`.
    pub fn parse(text: &str) -> Result<Self> {
        if text == "core" {
            return Ok(Self::core("general"));
        }
        let (kind, name) = text
            .split_once(':')
            .ok_or_else(|| RulegenError::Store(format!("invalid category segment: {}", text)))?;
        if name.is_empty() {
            return Err(RulegenError::Store(format!(
                "empty name in category segment: {}",
                text
            )));
        }
        let kind = match kind {
            "core" => SegmentKind::Core,
            "language" => SegmentKind::Language,
            "framework" => SegmentKind::Framework,
            "structure" => SegmentKind::Structure,
            "process" => SegmentKind::Process,
            other => {
                return Err(RulegenError::Store(format!(
                    "unknown category segment kind: {}",
                    other
                )));
            }
        };
        Ok(Self::new(kind, name))
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.name)
    }
}

/// Hierarchical category tag identifying a fragment's place in the
/// precedence and selection model, e.g. `language:typescript/framework:react`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryPath(Vec<Segment>);

impl CategoryPath {
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(RulegenError::Store("empty category path".into()));
        }
        Ok(Self(segments))
    }

    /// Parse a `/`-separated path of `kind:name` segments.
    pub fn parse(text: &str) -> Result<Self> {
        let segments = text
            .split('/')
            .map(Segment::parse)
            .collect::<Result<Vec<_>>>()?;
        Self::new(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// The deepest segment, which determines the fragment's precedence tier.
    pub fn leaf(&self) -> &Segment {
        self.0.last().expect("category path is non-empty")
    }

    /// Name of the language segment, if the path has one.
    pub fn language(&self) -> Option<&str> {
        self.segment_name(SegmentKind::Language)
    }

    /// Name of the framework segment, if the path has one.
    pub fn framework(&self) -> Option<&str> {
        self.segment_name(SegmentKind::Framework)
    }

    fn segment_name(&self, kind: SegmentKind) -> Option<&str> {
        self.0
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.name.as_str())
    }
}

impl std::fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "/")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

/// Which aspect of guidance a fragment covers. Splits the language and
/// general tiers into architecture vs code-style precedence levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Facet {
    Architecture,
    #[default]
    CodeStyle,
}

/// A single rule fragment, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub category: CategoryPath,
    /// File-stem identity within the category.
    pub name: String,
    /// Opaque markdown body, front-matter already stripped.
    pub content: String,
    /// Declared glob patterns restricting where this fragment applies.
    pub scope: Vec<String>,
    /// Override keys this fragment claims against lower tiers.
    pub overrides: Vec<String>,
    /// Core rules with no scope, loaded in every context.
    pub always_on: bool,
    pub facet: Facet,
}

impl Fragment {
    pub fn new(category: CategoryPath, name: impl Into<String>, content: impl Into<String>) -> Self {
        let always_on = category.segments()[0].kind == SegmentKind::Core;
        Self {
            category,
            name: name.into(),
            content: content.into(),
            scope: Vec::new(),
            overrides: Vec::new(),
            always_on,
            facet: Facet::default(),
        }
    }

    pub fn with_scope(mut self, patterns: Vec<String>) -> Self {
        self.scope = patterns;
        self
    }

    pub fn with_overrides(mut self, keys: Vec<String>) -> Self {
        self.overrides = keys;
        self
    }

    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facet = facet;
        self
    }

    pub fn with_always_on(mut self) -> Self {
        self.always_on = true;
        self
    }

    /// `category/name`, the display identity used in warnings and summaries.
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

/// YAML front-matter accepted on fragment files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FragmentMeta {
    pub scope: Option<ScopeField>,
    pub overrides: Vec<String>,
    pub facet: Option<Facet>,
    pub always_on: bool,
}

/// `scope:` accepts a single pattern or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScopeField {
    One(String),
    Many(Vec<String>),
}

impl ScopeField {
    pub fn into_patterns(self) -> Vec<String> {
        match self {
            Self::One(p) => vec![p],
            Self::Many(ps) => ps,
        }
    }
}

/// Split a markdown document into its front-matter block and body.
///
/// Returns the parsed metadata and the body with the `---` block removed.
/// A document without front-matter yields default metadata.
pub fn parse_fragment_file(input: &str) -> Result<(FragmentMeta, String)> {
    let stripped = input.strip_prefix('\u{feff}').unwrap_or(input);
    let Some(rest) = stripped.strip_prefix("---\n") else {
        return Ok((FragmentMeta::default(), stripped.to_string()));
    };

    let Some(end) = rest.find("\n---") else {
        return Err(RulegenError::Store(
            "unterminated front-matter block".into(),
        ));
    };

    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches('\n').to_string();
    let meta: FragmentMeta = serde_yaml_bw::from_str(yaml)?;
    Ok((meta, body))
}
