//! softraster viewer
//!
//! Runs the demo scenes in a window. The rasterizer draws into a CPU
//! framebuffer which is uploaded as a nearest-filtered texture every frame
//! and scaled to fit the window.
//!
//! Usage: softraster [config.ron]

use macroquad::prelude::*;
use softraster::config::{load_config_or_default, RenderConfig};
use softraster::demos::DemoScene;
use softraster::image_io::{load_texture_or_default, save_png};
use softraster::rasterizer::{DrawStats, Framebuffer, Renderer};
use softraster::{logging, VERSION};

const DEFAULT_CONFIG: &str = "assets/config.ron";

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softraster v{}", VERSION),
        window_width: 960,
        window_height: 720,
        window_resizable: true,
        ..Default::default()
    }
}

/// Flip a raster setting by key and report the new state
fn toggle(flag: &mut bool, name: &str) {
    *flag = !*flag;
    log::info!("{}: {}", name, if *flag { "on" } else { "off" });
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config: RenderConfig = load_config_or_default(&config_path);
    logging::init_named(&config.log_level);
    request_new_screen_size(config.width as f32 * config.scale, config.height as f32 * config.scale);

    let mut fb = Framebuffer::new(config.width, config.height);
    let mut renderer = Renderer::new(config.raster.clone());
    let mut scene = DemoScene::new(config.demo);
    let mut filter = config.filter;
    let texture = load_texture_or_default(config.texture.as_deref());
    let projection = config.projection();

    // The loop owns playback state; nothing here is global
    let mut running = true;
    let mut snapshot_index = 0u32;
    let mut last_stats = DrawStats::default();

    log::info!("showing {} demo ({}x{})", scene.kind, fb.width, fb.height);

    loop {
        if is_key_pressed(KeyCode::Space) {
            running = !running;
        }
        if is_key_pressed(KeyCode::Right) {
            scene.kind = scene.kind.next();
            log::info!("demo: {}", scene.kind);
        }
        if is_key_pressed(KeyCode::Left) {
            scene.kind = scene.kind.prev();
            log::info!("demo: {}", scene.kind);
        }
        if is_key_pressed(KeyCode::F) {
            filter = filter.toggled();
            log::info!("filter: {}", filter.label());
        }
        if is_key_pressed(KeyCode::C) {
            toggle(&mut renderer.settings.clip_frustum, "frustum clipping");
        }
        if is_key_pressed(KeyCode::P) {
            toggle(&mut renderer.settings.perspective_correct, "perspective correction");
        }
        if is_key_pressed(KeyCode::B) {
            toggle(&mut renderer.settings.backface_cull, "backface culling");
        }
        if is_key_pressed(KeyCode::Z) {
            toggle(&mut renderer.settings.use_zbuffer, "z-buffer");
        }

        if running {
            fb.clear_transparent();
            last_stats = scene.render(&mut renderer, &mut fb, &projection, Some(&texture), filter);
            scene.tick();
        }

        if is_key_pressed(KeyCode::S) {
            let path = format!("snapshot_{:03}.png", snapshot_index);
            match save_png(&fb, &path) {
                Ok(()) => {
                    log::info!("saved {}", path);
                    snapshot_index += 1;
                }
                Err(e) => log::error!("could not save {}: {}", path, e),
            }
        }

        clear_background(Color::from_rgba(30, 30, 35, 255));

        // Fit the buffer to the window, keeping its aspect ratio
        let fit = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let draw_w = fb.width as f32 * fit;
        let draw_h = fb.height as f32 * fit;
        let draw_x = (screen_width() - draw_w) * 0.5;
        let draw_y = (screen_height() - draw_h) * 0.5;

        let frame = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        frame.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &frame,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        draw_text(
            &format!(
                "{} | {} | {} tris, {} px{}",
                scene.kind,
                filter.label(),
                last_stats.triangles_rasterized,
                last_stats.pixels_written,
                if running { "" } else { " | paused" },
            ),
            8.0,
            20.0,
            20.0,
            Color::from_rgba(200, 200, 200, 255),
        );

        next_frame().await;
    }
}
