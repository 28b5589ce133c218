//! Pipeline module for orchestrating world generation stages.
//!
//! Provides a trait-based architecture for modular generation stages
//! that can be composed into a complete terrain generation pipeline.

mod stage;

pub use stage::{
    BiomeStage, ErosionStage, GenerationStage, Pipeline, PipelineError, StageId, TerrainStage, World,
};
