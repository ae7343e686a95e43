//! Resolved user choices.
//!
//! A `SelectionSet` is pure data constructed at the CLI boundary; the engine
//! validates its invariants before any I/O happens.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RulegenError};

/// Whether a process fragment is loaded permanently or on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessMode {
    #[default]
    Permanent,
    OnDemand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkSelection {
    pub name: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSelection {
    pub name: String,
    pub framework: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSelection {
    pub name: String,
    pub mode: ProcessMode,
}

/// The user's chosen languages, frameworks, structures, and processes.
///
/// Invariants (checked by [`SelectionSet::validate`]):
/// - every framework's language is also selected
/// - every structure's framework is also selected
/// - at most one structure per framework
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSet {
    pub languages: BTreeSet<String>,
    pub frameworks: Vec<FrameworkSelection>,
    pub structures: Vec<StructureSelection>,
    pub processes: Vec<ProcessSelection>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    pub fn with_framework(
        mut self,
        language: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.frameworks.push(FrameworkSelection {
            name: name.into(),
            language: language.into(),
        });
        self
    }

    pub fn with_structure(
        mut self,
        framework: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.structures.push(StructureSelection {
            name: name.into(),
            framework: framework.into(),
        });
        self
    }

    pub fn with_process(mut self, name: impl Into<String>, mode: ProcessMode) -> Self {
        self.processes.push(ProcessSelection {
            name: name.into(),
            mode,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.frameworks.is_empty()
            && self.structures.is_empty()
            && self.processes.is_empty()
    }

    /// The language a selected framework belongs to.
    pub fn language_of(&self, framework: &str) -> Option<&str> {
        self.frameworks
            .iter()
            .find(|f| f.name == framework)
            .map(|f| f.language.as_str())
    }

    /// Check the selection invariants. Violations abort the run before any
    /// filesystem access.
    pub fn validate(&self) -> Result<()> {
        for framework in &self.frameworks {
            if !self.languages.contains(&framework.language) {
                return Err(RulegenError::InvalidSelection(format!(
                    "framework '{}' requires language '{}' to be selected",
                    framework.name, framework.language
                )));
            }
        }

        let framework_names: HashSet<&str> =
            self.frameworks.iter().map(|f| f.name.as_str()).collect();
        let mut structured: HashSet<&str> = HashSet::new();
        for structure in &self.structures {
            if !framework_names.contains(structure.framework.as_str()) {
                return Err(RulegenError::InvalidSelection(format!(
                    "structure '{}' requires framework '{}' to be selected",
                    structure.name, structure.framework
                )));
            }
            if !structured.insert(structure.framework.as_str()) {
                return Err(RulegenError::InvalidSelection(format!(
                    "framework '{}' has more than one structure selected",
                    structure.framework
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_selection_passes() {
        let selection = SelectionSet::new()
            .with_language("typescript")
            .with_framework("typescript", "react")
            .with_structure("react", "react-modular")
            .with_process("tdd", ProcessMode::Permanent);
        assert!(selection.validate().is_ok());
    }

    #[test]
    fn framework_without_language_fails() {
        let selection = SelectionSet::new().with_framework("typescript", "react");
        assert!(matches!(
            selection.validate(),
            Err(RulegenError::InvalidSelection(_))
        ));
    }

    #[test]
    fn structure_without_framework_fails() {
        let selection = SelectionSet::new()
            .with_language("typescript")
            .with_structure("react", "react-modular");
        assert!(matches!(
            selection.validate(),
            Err(RulegenError::InvalidSelection(_))
        ));
    }

    #[test]
    fn two_structures_for_one_framework_fails() {
        let selection = SelectionSet::new()
            .with_language("typescript")
            .with_framework("typescript", "react")
            .with_structure("react", "react-modular")
            .with_structure("react", "feature-first");
        assert!(selection.validate().is_err());
    }

    #[test]
    fn empty_selection_is_valid() {
        assert!(SelectionSet::new().validate().is_ok());
    }
}
