//! Generation stage trait and pipeline orchestration.

use log::{debug, info};
use thiserror::Error;

use crate::biomes::{BiomeError, BiomeGenerator, BiomifyStats, ClimateAxis};
use crate::config::WorldConfig;
use crate::erosion::{ErosionConfig, ErosionError, ErosionSimulator, ErosionStats};
use crate::terrain::{TerrainError, TerrainGenerator, TerrainParameter};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Elevation from the three terrain channels.
    Terrain,
    /// Biome classification.
    Biomes,
    /// Droplet hydraulic erosion.
    Erosion,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Terrain => "terrain",
            StageId::Biomes => "biomes",
            StageId::Erosion => "erosion",
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error("Terrain: {0}")]
    Terrain(#[from] TerrainError),
    #[error("Biomes: {0}")]
    Biomes(#[from] BiomeError),
    #[error("Erosion: {0}")]
    Erosion(#[from] ErosionError),
}

/// Generators and outputs for one rectangular tile.
///
/// The terrain generator owns the height map; erosion borrows it mutably for the
/// duration of its stage.
#[derive(Debug, Clone)]
pub struct World {
    pub width: usize,
    pub height: usize,
    pub origin: (f64, f64),
    pub terrain: TerrainGenerator,
    pub biomes: BiomeGenerator,
    pub biome_stats: Option<BiomifyStats>,
    pub erosion_stats: Option<ErosionStats>,
    /// `(x, height, y)` per droplet per step, when tracing was requested.
    pub erosion_trace: Option<Vec<f32>>,
}

impl World {
    /// Builds sized generators from `config`. Nothing is generated yet.
    pub fn new(config: &WorldConfig) -> Result<Self, PipelineError> {
        let terrain = TerrainGenerator::with_size(&config.terrain, config.width, config.height)?;
        let mut biomes = BiomeGenerator::new(&config.biomes)?;
        biomes.initialize(config.width, config.height)?;
        Ok(Self {
            width: config.width,
            height: config.height,
            origin: (config.origin_x, config.origin_y),
            terrain,
            biomes,
            biome_stats: None,
            erosion_stats: None,
            erosion_trace: None,
        })
    }

    /// Heights in row-major order.
    pub fn heights(&self) -> &[f32] {
        self.terrain.height_map().as_slice()
    }
}

/// Trait for implementing generation stages.
///
/// Each stage transforms the world in some way, building upon previous stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, modifying the world in place.
    fn execute(&self, world: &mut World) -> Result<(), PipelineError>;
}

/// Orchestrates multiple generation stages into a complete pipeline.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
}

impl Pipeline {
    /// Creates a new empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Terrain, biomes, then erosion if `config.erode` is set.
    pub fn from_config(config: &WorldConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(TerrainStage).add_stage(BiomeStage);
        if config.erode {
            pipeline.add_stage(ErosionStage::new(config.erosion.clone()).with_trace(config.trace));
        }
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order on the given world.
    pub fn run(&self, world: &mut World) -> Result<(), PipelineError> {
        self.run_with_callbacks(world, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `world` - The world to generate
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        world: &mut World,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            debug!("running stage '{}' ({}/{})", stage.name(), i + 1, total);
            stage.execute(world)?;
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Evaluates the height map at the world origin.
pub struct TerrainStage;

impl GenerationStage for TerrainStage {
    fn id(&self) -> StageId {
        StageId::Terrain
    }

    fn name(&self) -> &str {
        "Terrain Generation"
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        world.terrain.resize(world.width, world.height)?;
        let (ox, oy) = world.origin;
        world.terrain.generate_terrain(ox, oy)?;
        Ok(())
    }
}

/// Classifies biomes from the terrain channels and the climate channels.
pub struct BiomeStage;

impl GenerationStage for BiomeStage {
    fn id(&self) -> StageId {
        StageId::Biomes
    }

    fn name(&self) -> &str {
        "Biome Classification"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Terrain]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        world.biomes.resize(world.width, world.height)?;
        let (ox, oy) = world.origin;
        for axis in [ClimateAxis::Temperature, ClimateAxis::Humidity] {
            world.biomes.regenerate(axis, ox, oy)?;
        }

        let terrain = &world.terrain;
        let stats = world.biomes.biomify(
            terrain.noise(TerrainParameter::Continentalness),
            terrain.noise(TerrainParameter::Mountainousness),
            terrain.noise(TerrainParameter::Weirdness),
        )?;
        world.biome_stats = Some(stats);
        Ok(())
    }
}

/// Runs one droplet erosion pass over the terrain height map.
pub struct ErosionStage {
    pub config: ErosionConfig,
    /// Record droplet paths into [`World::erosion_trace`].
    pub trace: bool,
}

impl ErosionStage {
    pub fn new(config: ErosionConfig) -> Self {
        Self { config, trace: false }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

impl GenerationStage for ErosionStage {
    fn id(&self) -> StageId {
        StageId::Erosion
    }

    fn name(&self) -> &str {
        "Hydraulic Erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Terrain]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let mut simulator = ErosionSimulator::new(self.config.clone(), world.width, world.height)?;
        let mut trace = self.trace.then(|| vec![0.0f32; simulator.trace_len()]);

        let heights = world.terrain.height_map_mut().as_mut_slice();
        let stats = simulator.erode(heights, trace.as_deref_mut())?;

        info!(
            "erosion stage: {} of {} droplets exited, {:.4} sediment lost",
            stats.droplets_exited, self.config.droplet_count, stats.carried_lost
        );
        world.erosion_stats = Some(stats);
        world.erosion_trace = trace;
        Ok(())
    }
}
