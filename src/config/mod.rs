//! Configuration types and loading.
//!
//! Provides the project-level configuration for rulegen:
//! - `RulegenConfig`: Top-level configuration with validation
//! - `ProjectPaths`: Resolved directory layout for a project

mod settings;

pub use settings::{GenerateConfig, ProjectPaths, RulegenConfig};
