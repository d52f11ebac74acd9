//! Developer tasks for softraster
//!
//! Usage:
//!   cargo xtask snapshot [--demo clipping] [--frames 60] [--out snapshots]
//!   cargo xtask mask [--demo grid] [--frame 10]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use softraster::config::{load_config, RenderConfig};
use softraster::demos::{DemoKind, DemoScene};
use softraster::image_io::{load_texture_or_default, save_png};
use softraster::logging;
use softraster::rasterizer::{DrawStats, Framebuffer, Renderer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Developer tasks for softraster")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render consecutive frames of a demo to numbered PNG files
    Snapshot {
        /// Config file (defaults to assets/config.ron)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Demo to render instead of the configured one
        #[arg(long)]
        demo: Option<DemoKind>,
        /// Number of frames
        #[arg(long, default_value_t = 60)]
        frames: u32,
        /// Output directory
        #[arg(long, default_value = "snapshots")]
        out: PathBuf,
    },
    /// Print the occupied-pixel mask of one frame as ASCII
    Mask {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        demo: Option<DemoKind>,
        /// Frame index (each frame advances the clock by one tick)
        #[arg(long, default_value_t = 0)]
        frame: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot { config, demo, frames, out } => snapshot(config, demo, frames, &out),
        Commands::Mask { config, demo, frame } => mask(config, demo, frame),
    }
}

/// Get the project root directory
fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

/// Load the given config, or the repository's sample config
fn read_config(path: Option<PathBuf>) -> Result<RenderConfig> {
    let path = match path {
        Some(path) => path,
        None => project_root()?.join("assets/config.ron"),
    };
    let config = load_config(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    logging::init_named(&config.log_level);
    Ok(config)
}

/// Headless frame loop shared by both tasks
struct Headless {
    config: RenderConfig,
    fb: Framebuffer,
    renderer: Renderer,
    scene: DemoScene,
    texture: Framebuffer,
}

impl Headless {
    fn new(config: RenderConfig, demo: Option<DemoKind>) -> Self {
        let texture = load_texture_or_default(config.texture.as_deref());
        Self {
            fb: Framebuffer::new(config.width, config.height),
            renderer: Renderer::new(config.raster.clone()),
            scene: DemoScene::new(demo.unwrap_or(config.demo)),
            texture,
            config,
        }
    }

    fn render_frame(&mut self) -> DrawStats {
        self.fb.clear_transparent();
        let stats = self.scene.render(
            &mut self.renderer,
            &mut self.fb,
            &self.config.projection(),
            Some(&self.texture),
            self.config.filter,
        );
        self.scene.tick();
        stats
    }
}

fn snapshot(config: Option<PathBuf>, demo: Option<DemoKind>, frames: u32, out: &Path) -> Result<()> {
    let mut headless = Headless::new(read_config(config)?, demo);
    std::fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Rendering {msg} [{bar:30}] {pos}/{len}")?
            .progress_chars("█▓░"),
    );
    pb.set_message(headless.scene.kind.to_string());

    let mut total = DrawStats::default();
    for i in 0..frames {
        total.accumulate(&headless.render_frame());
        let path = out.join(format!("{}_{:04}.png", headless.scene.kind, i));
        save_png(&headless.fb, &path).with_context(|| format!("Failed to write {}", path.display()))?;
        pb.inc(1);
    }

    pb.finish_with_message(format!("{} frames", frames));
    println!(
        "{} triangles in, {} rasterized, {} culled, {} pixels written",
        total.triangles_submitted, total.triangles_rasterized, total.triangles_culled, total.pixels_written
    );
    println!("Output: {}", out.display());
    Ok(())
}

fn mask(config: Option<PathBuf>, demo: Option<DemoKind>, frame: u32) -> Result<()> {
    let mut headless = Headless::new(read_config(config)?, demo);
    for _ in 0..frame {
        headless.scene.tick();
    }
    headless.render_frame();

    let fb = &headless.fb;
    for y in 0..fb.height {
        let row: String = (0..fb.width)
            .map(|x| match fb.get_pixel(x, y) {
                Some(c) if c.a > 0 => '#',
                _ => '.',
            })
            .collect();
        println!("{}", row);
    }
    Ok(())
}
