//! SDL2 window and OpenGL ES context management.
//!
//! This module defines the [`App`] struct which owns the SDL2 subsystems and event pump, and
//! the [`SdlSurface`] the renderer presents to.

use std::sync::Arc;

use meshview_core::renderer::{Surface, SurfaceError};

use crate::config::WindowConfig;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("SDL error: {0}")]
    Sdl(String),
    #[error(transparent)]
    Window(#[from] sdl2::video::WindowBuildError),
    #[error(transparent)]
    Render(#[from] meshview_core::RenderError),
}

/// The window with its GL context. Presenting swaps the window's buffers.
pub struct SdlSurface {
    // The context goes before the window it was created for.
    context: sdl2::video::GLContext,
    window: sdl2::video::Window,
}

impl Surface for SdlSurface {
    fn size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    /// Fails when the context can no longer be made current, which is how a lost context
    /// shows up through SDL.
    fn present(&mut self) -> Result<(), SurfaceError> {
        self.window
            .gl_make_current(&self.context)
            .map_err(SurfaceError)?;
        self.window.gl_swap_window();
        Ok(())
    }
}

/// The [`App`] struct encapsulates the SDL2 subsystems and the event pump.
pub struct App {
    // Held so SDL and its video subsystem outlive the window.
    _sdl: sdl2::Sdl,
    _video_subsystem: sdl2::VideoSubsystem,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Opens a window with a current OpenGL ES 3.0 context. The window size is ignored when
    /// `fullscreen` is set.
    pub fn new(config: &WindowConfig) -> Result<(Self, SdlSurface, Arc<glow::Context>), AppError> {
        // Touch input is handled as fingers, not as synthesized mouse clicks.
        sdl2::hint::set("SDL_TOUCH_MOUSE_EVENTS", "0");

        let sdl = sdl2::init().map_err(AppError::Sdl)?;
        let video_subsystem = sdl.video().map_err(AppError::Sdl)?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::GLES);
        gl_attr.set_context_version(3, 0);
        gl_attr.set_depth_size(24);

        let (width, height) = if config.fullscreen {
            let mode = video_subsystem
                .current_display_mode(0)
                .map_err(AppError::Sdl)?;
            (mode.w as u32, mode.h as u32)
        } else {
            (config.width, config.height)
        };
        let mut window = video_subsystem
            .window(&config.title, width, height)
            .opengl()
            .resizable()
            .build()?;
        if config.fullscreen {
            window
                .set_fullscreen(sdl2::video::FullscreenType::Desktop)
                .map_err(AppError::Sdl)?;
        }

        let context = window.gl_create_context().map_err(AppError::Sdl)?;
        window.gl_make_current(&context).map_err(AppError::Sdl)?;
        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump().map_err(AppError::Sdl)?;
        log::info!("Opened {width}x{height} window {:?}", config.title);

        Ok((
            Self {
                _sdl: sdl,
                _video_subsystem: video_subsystem,
                event_pump,
            },
            SdlSurface {
                context,
                window,
            },
            Arc::new(gl),
        ))
    }
}
