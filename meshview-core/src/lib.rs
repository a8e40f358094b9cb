//! The core of the meshview renderer. This crate contains the scene graph, the component
//! model and the render passes that draw meshes under a camera and a light, along with the
//! OBJ importer and the GPU seam everything draws through.
//!
//! Nothing here opens a window. A platform layer provides a [`renderer::Surface`] and a
//! [`gpu::Gpu`] (usually [`gl::GlowGpu`] over the window's GL context) and drives
//! [`renderer::Renderer::render_frame`] once per frame.

pub mod assets;
pub mod camera;
pub mod component;
pub mod gesture;
pub mod gl;
pub mod gpu;
pub mod headless;
pub mod importer;
pub mod light;
pub mod material;
pub mod mesh;
pub mod mesh_renderer;
pub mod object;
pub mod primitives;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod transform;

pub use component::{Component, ObjectId};
pub use object::SceneObject;
pub use renderer::{RenderError, Renderer, Surface};
pub use scene::Scene;
