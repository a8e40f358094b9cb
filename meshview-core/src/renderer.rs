//! The frame driver.
//!
//! [`Renderer`] owns the presentation surface and the scene. The scene is created lazily on
//! the first frame the surface reports a usable size, and is always destroyed before the
//! surface (and with it the graphics context) is torn down.

use std::{error::Error, rc::Rc};

use crate::{
    gesture::{GestureTracker, InputEvent},
    gpu::{self, Gpu},
    scene::Scene,
};

/// Failure reported by a [`Surface`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// Something frames are presented to, usually a window with a GL context.
pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Shows the frame that was just rendered.
    fn present(&mut self) -> Result<(), SurfaceError>;
}

/// Fatal frame loop failure.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to present frame: {0}")]
    Present(#[source] SurfaceError),
    #[error("failed to set up scene: {0}")]
    Setup(#[source] Box<dyn Error>),
}

/// Populates a freshly created scene.
pub type SceneSetup = Box<dyn FnMut(&mut Scene) -> Result<(), Box<dyn Error>>>;

pub struct Renderer<S: Surface> {
    gpu: Rc<dyn Gpu>,
    scene: Option<Scene>,
    setup: SceneSetup,
    gestures: GestureTracker,
    size: (u32, u32),
    frames: u64,
    destroyed: bool,
    surface: S,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S, gpu: Rc<dyn Gpu>, setup: SceneSetup) -> Self {
        Self {
            gpu,
            scene: None,
            setup,
            gestures: GestureTracker::new(),
            size: (0, 0),
            frames: 0,
            destroyed: false,
            surface,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Number of frames presented.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Renders and presents one frame. Does nothing while the surface has no area.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        if self.destroyed {
            return Ok(());
        }
        self.update_render_area()?;
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };

        self.gpu.clear();
        scene.render();
        gpu::check_error(self.gpu.as_ref(), "render pass");
        scene.update();

        self.surface.present().map_err(RenderError::Present)?;
        self.frames += 1;
        Ok(())
    }

    /// Follows the surface size. The first usable size creates and populates the scene;
    /// later changes resize it.
    fn update_render_area(&mut self) -> Result<(), RenderError> {
        let size = self.surface.size();
        if size == self.size && self.scene.is_some() {
            return Ok(());
        }
        let (width, height) = size;
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.size = size;
        self.gpu.viewport(width, height);

        match self.scene.as_mut() {
            Some(scene) => {
                log::debug!("Render area changed to {width}x{height}");
                scene.set_size(width, height);
            }
            None => {
                let mut scene = Scene::new(Rc::clone(&self.gpu), width, height);
                (self.setup)(&mut scene).map_err(RenderError::Setup)?;
                log::info!("Scene ready with {} objects", scene.object_count());
                self.scene = Some(scene);
            }
        }
        Ok(())
    }

    /// Feeds input to the gesture decoder and applies the result to the main camera.
    pub fn handle_input<'a>(&mut self, events: impl IntoIterator<Item = &'a InputEvent>) {
        for event in events {
            let Some(gesture) = self.gestures.handle(event, self.size) else {
                continue;
            };
            if let Some(camera) = self.scene.as_mut().and_then(Scene::main_camera_mut) {
                gesture.apply(camera);
            }
        }
    }

    /// Runs the scene's destroy traversal. Must happen before the surface goes away; calling
    /// it again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(mut scene) = self.scene.take() {
            scene.on_destroy();
        }
        log::info!("Renderer destroyed after {} frames", self.frames);
    }
}

impl<S: Surface> Drop for Renderer<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
