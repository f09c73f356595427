use clap::Parser;
use log::warn;
use scene::export::{summary, write_scenes};
use std::path::PathBuf;
use workflow::config::{Overrides, ProjectionArg, ViewerConfig};
use workflow::runner::Runner;

mod scene;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Gamma survey session viewer driver")]
struct Args {
    /// Session directories or session database files
    sessions: Vec<PathBuf>,
    /// Load the viewer config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Lua dose-rate script defining calculate_doserate
    #[arg(long)]
    script: Option<PathBuf>,
    /// Calibration factor of the built-in dose-rate formula
    #[arg(long)]
    doserate_factor: Option<f64>,
    /// Geodetic projection, `scene` unless the config sets one
    #[arg(long, value_enum)]
    projection: Option<ProjectionArg>,
    /// Use a linear instead of a logarithmic colour scale
    #[arg(long, default_value_t = false)]
    linear: bool,
    /// Write the scene JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Selected spectrum index in the first session
    #[arg(long, requires = "mark")]
    select: Option<usize>,
    /// Marked spectrum index to measure the selection against
    #[arg(long, requires = "select")]
    mark: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let overrides = Overrides {
        projection: args.projection,
        linear: args.linear,
        doserate_factor: args.doserate_factor,
        script: args.script.clone(),
        output: args.output.clone(),
    };
    let viewer_config = match &args.config {
        Some(path) => ViewerConfig::load(path)?
            .with_sessions(args.sessions.clone())
            .with_overrides(overrides),
        None => ViewerConfig::from_args(args.sessions.clone(), overrides),
    };
    if viewer_config.sessions.is_empty() {
        anyhow::bail!("no sessions given");
    }

    let output = viewer_config.output.clone();
    let first = viewer_config.sessions[0].clone();
    let mut runner = Runner::new(viewer_config);
    let scenes = runner.execute()?;

    for scene in &scenes {
        eprintln!("{}", summary(scene));
        if scene.doserate_engine.is_none() {
            warn!("{}: no doserate engine bound, doserates stay zero", scene.session);
        }
    }

    if let (Some(selected), Some(marked)) = (args.select, args.mark) {
        let measurement = runner.measure(&first, selected, marked)?;
        eprintln!(
            "spectrum {} -> {}: distance {:.1} m, azimuth {:.1} deg",
            selected, marked, measurement.distance, measurement.azimuth
        );
    }

    write_scenes(&scenes, output.as_deref())?;
    Ok(())
}
