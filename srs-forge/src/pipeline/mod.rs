//! Generation pipeline
//!
//! Seven stages run in a fixed order, threading one accumulated state
//! mapping: extract requirements from the SRS, scaffold the project, generate
//! tests, generate code, write the README, verify the tree, archive it.

pub mod types;
pub mod generate;
pub mod workflow;

pub mod stage0_extract;
pub mod stage1_scaffold;
pub mod stage2_testgen;
pub mod stage3_codegen;
pub mod stage4_readme;
pub mod stage5_verify;
pub mod stage6_archive;

pub use types::keys;
pub use types::{PipelineState, Stage, StageContext, StageUpdate, StructuredRequirements};
pub use workflow::{run_generation_pipeline, Pipeline};
