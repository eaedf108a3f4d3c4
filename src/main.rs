use std::sync::Arc;

use anyhow::Context;
use winit::{
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

use klein_orbit::config::SceneConfig;
use klein_orbit::geometry::klein_mesh;
use klein_orbit::rendering::{RenderError, Renderer};
use klein_orbit::simulation::Scene;

const TITLE: &str = "Klein Orbit";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli_path = std::env::args().nth(1);
    let config = SceneConfig::resolve(cli_path.as_deref())?;
    let grid = config.grid()?;

    let mesh = klein_mesh(grid);
    log::info!(
        "Klein mesh ready: {} vertices, {} indices",
        mesh.vertex_count(),
        mesh.indices.len()
    );

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut scene = Scene::new(config);
    let mut renderer = pollster::block_on(Renderer::new(
        window.clone(),
        scene.camera.clone(),
        scene.config(),
        &mesh,
    ))
    .context("Failed to initialise renderer")?;
    drop(mesh);

    log::info!("Controls: drag = orbit, wheel = zoom, M material, T tone mapping, L lights, C double-sided, H HUD, P pause, R reset, +/- orbit speed");

    let win_id = window.id();
    event_loop.run(move |event, target| match event {
        Event::WindowEvent { event, window_id } if window_id == win_id => match event {
            WindowEvent::CloseRequested => target.exit(),
            WindowEvent::Resized(size) => renderer.resize(size),
            WindowEvent::RedrawRequested => {
                scene.update();
                if let Some(next) = scene.take_config_change() {
                    if let Err(e) = renderer.apply_config(&next) {
                        log::error!("Failed to apply config: {e}");
                    }
                }
                if scene.take_hud_change() {
                    let hud = scene.hud_text();
                    if hud.is_empty() {
                        window.set_title(TITLE);
                    } else {
                        window.set_title(&format!("{TITLE} | {hud}"));
                    }
                }
                match renderer.render(&scene.frame_data()) {
                    Ok(()) => {}
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => renderer.reconfigure(),
                    Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        log::error!("Surface out of memory, exiting");
                        target.exit();
                    }
                    Err(e) => log::warn!("Render error: {e}"),
                }
            }
            _ => scene.handle_window_event(&event),
        },
        Event::DeviceEvent { event, .. } => scene.handle_device_event(&event),
        Event::AboutToWait => window.request_redraw(),
        _ => {}
    })?;
    Ok(())
}
