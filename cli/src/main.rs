use std::convert::Infallible;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use particle_field::config::EngineConfig;
use particle_field::device::{DeviceProfile, PlatformHints, classify};
use particle_field::engine::Simulation;
use particle_field::error::EngineError;
use particle_field::geom::{Point, Size};
use particle_field::particle::Particle;
use particle_field::render::{self, Surface};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid pointer `{0}`; expected X,Y")]
    InvalidPointer(String),
    #[error("cannot read config {path}: {source}")]
    ReadConfig { path: PathBuf, source: std::io::Error },
    #[error("surface is empty ({width}x{height})")]
    EmptySurface { width: f64, height: f64 },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "particle-cli", about = "Run the particle field headless and summarize the result")]
struct Cli {
    /// Requested particle count, before device adjustment.
    #[arg(long, env = "PARTICLE_COUNT")]
    count: Option<usize>,

    #[arg(long, env = "PARTICLE_WIDTH", default_value_t = 800.0)]
    width: f64,

    #[arg(long, env = "PARTICLE_HEIGHT", default_value_t = 600.0)]
    height: f64,

    #[arg(long, env = "PARTICLE_STEPS", default_value_t = 600)]
    steps: u64,

    #[arg(long, env = "PARTICLE_SEED", default_value_t = 0)]
    seed: u64,

    /// Viewport width used for device classification; defaults to --width.
    #[arg(long, env = "PARTICLE_VIEWPORT_WIDTH")]
    viewport_width: Option<f64>,

    #[arg(long, env = "PARTICLE_USER_AGENT")]
    user_agent: Option<String>,

    /// Fixed pointer position as `X,Y`.
    #[arg(long, env = "PARTICLE_POINTER")]
    pointer: Option<String>,

    #[arg(long, env = "PARTICLE_NO_INTERACTION", default_value_t = false)]
    no_interaction: bool,

    /// JSON file with an engine config; flags override it.
    #[arg(long, env = "PARTICLE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Surface that only counts what the last frame drew.
#[derive(Debug, Default)]
struct CountingSurface {
    frames: u64,
    circles: usize,
    lines: usize,
}

impl Surface for CountingSurface {
    type Error = Infallible;

    fn clear(&mut self, _size: Size) {
        self.frames += 1;
        self.circles = 0;
        self.lines = 0;
    }

    fn set_global_alpha(&mut self, _alpha: f64) {}

    fn fill_circle(&mut self, _center: Point, _radius: f64, _color: &str) -> Result<(), Infallible> {
        self.circles += 1;
        Ok(())
    }

    fn stroke_line(&mut self, _from: Point, _to: Point, _color: &str, _width: f64) {
        self.lines += 1;
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    profile: DeviceProfile,
    requested: usize,
    particles: usize,
    interaction: bool,
    steps: u64,
    circles: usize,
    lines: usize,
    mean_speed: f64,
    contained: bool,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let summary = run(&cli)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<Summary, CliError> {
    let mut config = load_config(cli)?;
    if let Some(count) = cli.count {
        config.particle_count = count;
    }
    if cli.no_interaction {
        config.mouse_interaction = false;
    }

    let bounds = Size::new(cli.width, cli.height);
    if bounds.is_empty() {
        return Err(CliError::EmptySurface { width: cli.width, height: cli.height });
    }
    let pointer = cli.pointer.as_deref().map(parse_pointer).transpose()?;

    let hints = cli.user_agent.as_deref().map(PlatformHints::from_user_agent);
    let profile = classify(Some(cli.viewport_width.unwrap_or(cli.width)), hints);
    let particles = profile.adjusted_count(config.particle_count);
    let interaction = profile.allows_interaction(config.mouse_interaction);
    let pointer = pointer.filter(|_| interaction);
    tracing::info!(particles, interaction, steps = cli.steps, seed = cli.seed, "running simulation");

    let mut simulation = Simulation::seed(particles, bounds, config.tuning, SmallRng::seed_from_u64(cli.seed));
    let mut surface = CountingSurface::default();
    for _ in 0..cli.steps {
        simulation.advance(bounds, pointer);
        if let Err(never) = render::draw(&mut surface, simulation.particles(), bounds, &config.style) {
            match never {}
        }
    }
    tracing::debug!(frames = surface.frames, "simulation finished");

    Ok(Summary {
        profile,
        requested: config.particle_count,
        particles,
        interaction,
        steps: cli.steps,
        circles: surface.circles,
        lines: surface.lines,
        mean_speed: mean_speed(simulation.particles()),
        contained: simulation.particles().iter().all(|p| bounds.contains(p.position)),
    })
}

fn load_config(cli: &Cli) -> Result<EngineConfig, CliError> {
    let Some(path) = &cli.config else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(|source| CliError::ReadConfig { path: path.clone(), source })?;
    Ok(EngineConfig::from_json(&raw)?)
}

fn parse_pointer(raw: &str) -> Result<Point, CliError> {
    let invalid = || CliError::InvalidPointer(raw.to_owned());
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Point::new(x, y))
}

#[allow(clippy::cast_precision_loss)]
fn mean_speed(particles: &[Particle]) -> f64 {
    if particles.is_empty() {
        return 0.0;
    }
    particles.iter().map(|p| p.velocity.length()).sum::<f64>() / particles.len() as f64
}

fn print_summary(summary: &Summary) {
    let p = &summary.profile;
    let tier = if p.is_mobile {
        "mobile"
    } else if p.is_tablet {
        "tablet"
    } else {
        "desktop"
    };
    println!("device:      {tier}{}", if p.is_low_power { " (low power)" } else { "" });
    println!("particles:   {} of {} requested", summary.particles, summary.requested);
    println!("interaction: {}", if summary.interaction { "on" } else { "off" });
    println!("steps:       {}", summary.steps);
    println!("last frame:  {} circles, {} lines", summary.circles, summary.lines);
    println!("mean speed:  {:.3}", summary.mean_speed);
    println!("contained:   {}", if summary.contained { "yes" } else { "NO" });
}
