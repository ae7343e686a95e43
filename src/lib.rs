pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod materialize;
pub mod output;
pub mod resolve;
pub mod scope;
pub mod selection;
pub mod target;

pub use config::{ProjectPaths, RulegenConfig};
pub use engine::{GenerateOptions, RunStatus, TargetSummary, generate, overall_status};
pub use error::{Result, RulegenError, Warning};
pub use fragment::{
    CategoryPath, DirFragmentStore, Fragment, FragmentStore, MemoryFragmentStore, Segment,
    SegmentKind,
};
pub use materialize::{MaterializeReport, Materializer};
pub use resolve::{PrecedenceResolver, PrecedenceTier, ResolvedFragment, Resolution};
pub use scope::{AnnotatedFragment, PathScope, PathScopeAnnotator};
pub use selection::{ProcessMode, SelectionSet};
pub use target::{GeneratedTree, TargetAdapter, adapter_by_name, builtin_adapters};
