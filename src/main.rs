mod app;
mod config;
mod driver;
mod input;
mod layout;
mod logging;
mod mapper;
mod pattern;
mod ramp;
mod scene;
mod term;
mod texture;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use crate::config::{load_config, project_paths};
use crate::driver::{Animator, StartPose};
use crate::scene::SceneRenderer;
use crate::texture::Texture;

const EARTH_W: usize = 512;
const EARTH_H: usize = 256;

#[derive(Parser, Debug, Clone)]
#[command(name = "asciiglobe")]
#[command(about = "Rotating textured globe rendered as ASCII art in the terminal", long_about = None)]
struct Args {
    /// Config file (default: per-user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Equirectangular earth texture (PNG or JPEG). Without it a procedural globe is drawn.
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Override the configured FPS cap
    #[arg(long)]
    fps: Option<u32>,

    /// Seed for the random start pose and the procedural texture
    #[arg(long)]
    seed: Option<u64>,

    /// Config override, e.g. --set camera.fov=40 (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,

    /// Start with the test pattern instead of the globe
    #[arg(long, default_value_t = false)]
    test_pattern: bool,

    /// Print N frames to stdout and exit instead of running interactively
    #[arg(long, value_name = "N")]
    frames: Option<u32>,

    /// Log file (default: per-user data dir); filter with ASCIIGLOBE_LOG
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths()?;
    logging::init_logging(args.log.as_deref().unwrap_or(paths.log_path.as_path()))?;

    let res = run(args, paths.config_path);
    if let Err(err) = &res {
        tracing::error!(err = %format!("{err:#}"), "asciiglobe exited with an error");
    }
    res
}

fn run(args: Args, default_config: PathBuf) -> Result<()> {
    let config_path = args.config.unwrap_or(default_config);
    let mut cfg = load_config(&config_path);
    for patch in &args.set {
        cfg.apply_patch_str(patch)
            .with_context(|| format!("applying --set {patch}"))?;
    }
    if let Some(fps) = args.fps {
        cfg.display.fps_cap = fps;
    }
    if args.test_pattern {
        cfg.display.show_test_pattern = true;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let texture = match &args.texture {
        Some(path) => Texture::load(path)?,
        None => Texture::procedural_earth(EARTH_W, EARTH_H, rng.gen()),
    };

    let start = StartPose::resolve(&cfg, &mut rng);
    tracing::info!(
        config = %config_path.display(),
        rotation_y = start.rotation_y,
        float_x = start.float_x,
        float_y = start.float_y,
        "starting"
    );

    let scene = SceneRenderer::new(cfg.grid, texture, &cfg);
    let mut animator = Animator::new(scene, &cfg, start);

    match args.frames {
        Some(n) => {
            let stdout = std::io::stdout();
            app::run_headless(&cfg, &mut animator, n, &mut stdout.lock())
        }
        None => app::run(cfg, animator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeatable_set_flags() {
        let args = Args::parse_from([
            "asciiglobe",
            "--set",
            "camera.fov=40",
            "--set",
            "globe.flipped=true",
            "--frames",
            "2",
        ]);
        assert_eq!(args.set, vec!["camera.fov=40", "globe.flipped=true"]);
        assert_eq!(args.frames, Some(2));
        assert!(!args.test_pattern);
    }
}
