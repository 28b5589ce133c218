//! Terragen CLI - procedural terrain, biome and erosion generator.
//!
//! Generates a height map from layered noise, classifies biomes, runs droplet
//! erosion and writes the results as RAW arrays.

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use terragen::config::WorldConfig;
use terragen::export::{
    expected_file_size, export_biome_ids_raw, export_heights_raw, export_trace_raw, RawFormat,
};
use terragen::pipeline::{Pipeline, World};
use terragen::terrain::EvaluationMethod;

/// Procedural terrain generator.
#[derive(Parser)]
#[command(name = "terragen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a height map, biome map and optional erosion trace.
    Generate {
        /// TOML world config; command-line options override it.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Grid width in cells.
        #[arg(long)]
        width: Option<usize>,

        /// Grid height in cells.
        #[arg(long)]
        height: Option<usize>,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u32>,

        /// Number of noise octaves for every terrain channel.
        #[arg(long)]
        octaves: Option<u32>,

        /// Noise scale for every terrain channel.
        #[arg(long)]
        scale: Option<f32>,

        /// How the terrain channels are combined.
        #[arg(long)]
        method: Option<Method>,

        /// Number of erosion droplets.
        #[arg(long)]
        droplets: Option<u32>,

        /// Droplet lifetime in steps.
        #[arg(long)]
        lifetime: Option<u32>,

        /// Skip the erosion stage.
        #[arg(long)]
        skip_erosion: bool,

        /// Also write the droplet trace.
        #[arg(long)]
        trace: bool,

        /// Height export format.
        #[arg(short, long, default_value = "raw")]
        format: ExportFormat,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "terrain")]
        name: String,
    },
    /// Show information about a configuration.
    Info {
        /// TOML world config to inspect; defaults are shown otherwise.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Product of the rescaled channels.
    Linear,
    /// Product of the channel splines.
    Spline,
}

impl From<Method> for EvaluationMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Linear => EvaluationMethod::LinearCombine,
            Method::Spline => EvaluationMethod::SplineCombine,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// 16-bit RAW (little-endian).
    Raw,
    /// 32-bit float RAW (high precision).
    RawFloat,
}

impl From<ExportFormat> for RawFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Raw => RawFormat::R16LittleEndian,
            ExportFormat::RawFloat => RawFormat::R32Float,
        }
    }
}

/// Command-line overrides applied on top of the loaded config.
struct Overrides {
    width: Option<usize>,
    height: Option<usize>,
    seed: Option<u32>,
    octaves: Option<u32>,
    scale: Option<f32>,
    method: Option<Method>,
    droplets: Option<u32>,
    lifetime: Option<u32>,
    skip_erosion: bool,
    trace: bool,
}

impl Overrides {
    fn apply(self, mut config: WorldConfig) -> WorldConfig {
        if let Some(seed) = self.seed {
            config.terrain.continentalness.seed = seed;
            config.terrain.mountainousness.seed = seed.wrapping_add(1);
            config.terrain.weirdness.seed = seed.wrapping_add(2);
            config.biomes.temperature.seed = seed.wrapping_add(100);
            config.biomes.humidity.seed = seed.wrapping_add(200);
            config.erosion.seed = seed as u64;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        for noise in [
            &mut config.terrain.continentalness,
            &mut config.terrain.mountainousness,
            &mut config.terrain.weirdness,
        ] {
            if let Some(octaves) = self.octaves {
                noise.octaves = octaves;
            }
            if let Some(scale) = self.scale {
                noise.scale = scale;
            }
        }
        if let Some(method) = self.method {
            config.terrain.method = method.into();
        }
        if let Some(droplets) = self.droplets {
            config.erosion.droplet_count = droplets;
        }
        if let Some(lifetime) = self.lifetime {
            config.erosion.droplet_lifetime = lifetime;
        }
        if self.skip_erosion {
            config.erode = false;
        }
        if self.trace {
            config.trace = true;
        }
        config
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            config,
            width,
            height,
            seed,
            octaves,
            scale,
            method,
            droplets,
            lifetime,
            skip_erosion,
            trace,
            format,
            output,
            name,
        } => {
            let overrides = Overrides {
                width,
                height,
                seed,
                octaves,
                scale,
                method,
                droplets,
                lifetime,
                skip_erosion,
                trace,
            };
            run_generate(config.as_deref(), overrides, format, &output, &name)
        }
        Commands::Info { config } => run_info(config.as_deref()),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<WorldConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Ok(WorldConfig::load(path)?)
        }
        None => Ok(WorldConfig::default()),
    }
}

fn run_generate(
    config_path: Option<&Path>,
    overrides: Overrides,
    format: ExportFormat,
    output: &Path,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = overrides.apply(load_config(config_path)?);
    config.validate()?;

    println!("Terragen - Procedural Terrain Generator");
    println!("=======================================");
    println!("Grid: {}x{}", config.width, config.height);
    println!("Origin: ({}, {})", config.origin_x, config.origin_y);
    println!("Method: {:?}", config.terrain.method);
    println!("Output: {}", output.display());

    let start = Instant::now();
    let mut world = World::new(&config)?;
    let pipeline = Pipeline::from_config(&config);
    pipeline.run_with_callbacks(
        &mut world,
        |stage, i, total| info!("[{}/{}] {}...", i + 1, total, stage),
        |stage, _, _| info!("{} done in {:.2?}", stage, start.elapsed()),
    )?;

    std::fs::create_dir_all(output)?;
    let format = RawFormat::from(format);
    let (min, max) = world.terrain.height_map().height_range();
    let (min, max) = if min < max { (min, max) } else { (min, min + 1.0) };
    let heights_path = output.join(format!("{name}_heights.raw"));
    export_heights_raw(world.heights(), &heights_path, format, min, max)?;
    println!("Heights: {} (range [{:.4}, {:.4}])", heights_path.display(), min, max);

    let biomes_path = output.join(format!("{name}_biomes.raw"));
    export_biome_ids_raw(world.biomes.biome_map(), &biomes_path)?;
    println!("Biomes: {}", biomes_path.display());
    if let Some(stats) = world.biome_stats {
        if stats.unclassified > 0 {
            warn!("{} cells are unclassified", stats.unclassified);
        }
    }

    if let Some(stats) = world.erosion_stats {
        println!(
            "Erosion: eroded {:.4}, deposited {:.4}, lost {:.4}, {} droplets exited",
            stats.eroded, stats.deposited, stats.carried_lost, stats.droplets_exited
        );
    }
    if let Some(trace) = &world.erosion_trace {
        let trace_path = output.join(format!("{name}_trace.raw"));
        export_trace_raw(trace, &trace_path)?;
        println!("Trace: {}", trace_path.display());
    }

    println!("\nDone in {:.2?}", start.elapsed());
    Ok(())
}

fn run_info(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    config.validate()?;
    let cells = config.width * config.height;

    println!("Terragen - World Information");
    println!("============================");
    println!("Grid: {}x{} ({} cells)", config.width, config.height, cells);
    println!("Terrain method: {:?}", config.terrain.method);
    println!(
        "Channel octaves: continentalness {}, mountainousness {}, weirdness {}",
        config.terrain.continentalness.octaves,
        config.terrain.mountainousness.octaves,
        config.terrain.weirdness.octaves
    );
    println!("Biome rules: {}", config.biomes.biomes.len());
    for biome in &config.biomes.biomes {
        println!("  {:>3} {}", biome.id.as_u16(), biome.name);
    }
    if config.erode {
        let trace_floats =
            (config.erosion.droplet_lifetime as usize + 1) * config.erosion.droplet_count as usize * 3;
        println!(
            "Erosion: {} droplets x {} steps, radius {}",
            config.erosion.droplet_count, config.erosion.droplet_lifetime, config.erosion.erosion_radius
        );
        println!("Trace buffer: {} floats ({:.2} MB)", trace_floats, trace_floats as f64 * 4.0 / 1e6);
    } else {
        println!("Erosion: disabled");
    }
    let mb = |format| expected_file_size(config.width, config.height, format) as f64 / 1e6;
    println!("\nFile sizes:");
    println!("  Heights R16: {:.2} MB", mb(RawFormat::R16LittleEndian));
    println!("  Heights R32: {:.2} MB", mb(RawFormat::R32Float));
    println!("  Biome ids:   {:.2} MB", cells as f64 * 2.0 / 1e6);
    Ok(())
}
