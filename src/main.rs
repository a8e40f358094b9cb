use std::{path::PathBuf, rc::Rc};

use meshview_core::{
    Renderer, Scene, Surface,
    assets::Assets,
    gesture::CameraGesture,
    gl::{GlDefaults, GlowGpu},
    gpu::Gpu,
};

use crate::{
    app::{App, AppError},
    config::DemoConfig,
    input::{Action, InputTranslator},
};

mod app;
mod assets;
mod config;
mod demo;
mod input;
mod logging;

fn main() {
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, source) = match DemoConfig::load(explicit.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = logging::init(config.level_filter()) {
        eprintln!("Failed to install logger: {e}");
    }
    match source {
        Some(path) => log::info!("Loaded config from {}", path.display()),
        None => log::info!("No config file found, using defaults"),
    }

    if let Err(e) = run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: DemoConfig) -> Result<(), AppError> {
    let (mut app, surface, gl) = App::new(&config.window)?;

    let glow_gpu = GlowGpu::new(gl);
    glow_gpu.log_context_info();
    glow_gpu.apply_defaults(&GlDefaults::from(&config.gl));
    let gpu: Rc<dyn Gpu> = Rc::new(glow_gpu);

    let assets: Rc<dyn Assets> = Rc::new(assets::sources(config.asset_dir.clone()));
    let mut renderer = Renderer::new(
        surface,
        gpu,
        Box::new(move |scene: &mut Scene| demo::create_models(scene, &assets, &config)),
    );
    let mut input = InputTranslator::new();

    'running: loop {
        let size = renderer.surface().size();
        let mut events = Vec::new();
        for event in app.event_pump.poll_iter() {
            match input.translate(&event, size) {
                Some(Action::Quit) => break 'running,
                Some(Action::Input(event)) => events.push(event),
                Some(Action::Dolly(amount)) => {
                    if let Some(camera) = renderer.scene_mut().and_then(|s| s.main_camera_mut()) {
                        CameraGesture::Dolly(amount).apply(camera);
                    }
                }
                None => {}
            }
        }
        renderer.handle_input(&events);
        renderer.render_frame()?;
    }

    renderer.destroy();
    Ok(())
}
