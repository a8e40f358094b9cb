//! The GPU binding context.
//!
//! OpenGL is a global state machine: binding a program, a texture or a vertex array changes
//! what every following call operates on. The [`Gpu`] trait is that "current binding context"
//! made explicit. Everything that touches the GPU receives it, and nothing caches GPU state
//! between frames, so each draw rebinds everything it depends on.
//!
//! Two implementations exist: [`crate::gl::GlowGpu`] drives a real OpenGL ES 3 context and
//! [`crate::headless::RecordingGpu`] records calls without a context.

use std::{fmt, num::NonZeroU32};

use glam::{Mat4, Vec3, Vec4};

use crate::mesh::Vertex;

/// Handle to a linked shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub NonZeroU32);

/// Handle to a 2D texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub NonZeroU32);

/// Resolved location of a uniform inside a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// The vertex array and the two buffers backing an indexed mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshBuffers {
    pub vao: NonZeroU32,
    pub vbo: NonZeroU32,
    pub ebo: NonZeroU32,
}

/// Shader pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// An error flag reported by the graphics API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlError {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    Unknown(u32),
}

impl GlError {
    /// Maps a raw `glGetError` code to an error, `None` for `GL_NO_ERROR`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            glow::NO_ERROR => None,
            glow::INVALID_ENUM => Some(GlError::InvalidEnum),
            glow::INVALID_VALUE => Some(GlError::InvalidValue),
            glow::INVALID_OPERATION => Some(GlError::InvalidOperation),
            glow::INVALID_FRAMEBUFFER_OPERATION => Some(GlError::InvalidFramebufferOperation),
            glow::OUT_OF_MEMORY => Some(GlError::OutOfMemory),
            other => Some(GlError::Unknown(other)),
        }
    }

    /// The symbolic name of the error as it appears in the GL headers.
    pub fn name(&self) -> &'static str {
        match self {
            GlError::InvalidEnum => "GL_INVALID_ENUM",
            GlError::InvalidValue => "GL_INVALID_VALUE",
            GlError::InvalidOperation => "GL_INVALID_OPERATION",
            GlError::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
            GlError::OutOfMemory => "GL_OUT_OF_MEMORY",
            GlError::Unknown(_) => "unknown GL error",
        }
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlError::Unknown(code) => write!(f, "unknown GL error 0x{code:04X}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Failure to create a GPU object.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create {object}: {reason}")]
    Create { object: &'static str, reason: String },
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {0}")]
    Link(String),
}

/// The operations the renderer needs from the graphics API.
///
/// All methods take `&self`: the context is a single-threaded, globally mutable resource and
/// implementations are expected to use interior mutability where they keep state.
pub trait Gpu {
    /// Compiles both stages and links them into a program.
    fn create_program(&self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError>;

    fn delete_program(&self, program: ProgramId);

    /// Makes `program` current for the following uniform and draw calls.
    fn use_program(&self, program: Option<ProgramId>);

    /// Looks up a uniform by name. `None` means the program has no active uniform with that
    /// name (the GL `-1` location).
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn uniform_1_i32(&self, location: UniformLocation, value: i32);

    fn uniform_1_f32(&self, location: UniformLocation, value: f32);

    fn uniform_3_f32(&self, location: UniformLocation, value: Vec3);

    fn uniform_4_f32(&self, location: UniformLocation, value: Vec4);

    fn uniform_matrix_4_f32(&self, location: UniformLocation, value: &Mat4);

    /// Uploads tightly packed RGBA8 pixels into a new mipmapped texture.
    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, GpuError>;

    /// Binds `texture` to texture unit `unit` (0-based), or unbinds with `None`.
    fn bind_texture(&self, unit: u32, texture: Option<TextureId>);

    fn delete_texture(&self, texture: TextureId);

    /// Uploads interleaved vertices and 32-bit indices.
    fn create_mesh_buffers(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<MeshBuffers, GpuError>;

    fn delete_mesh_buffers(&self, buffers: MeshBuffers);

    /// Issues one indexed triangle draw call.
    fn draw_elements(&self, buffers: &MeshBuffers, index_count: usize);

    fn viewport(&self, width: u32, height: u32);

    /// Clears the colour and depth buffers.
    fn clear(&self);

    /// Pops one pending error flag.
    fn take_error(&self) -> Option<GlError>;
}

/// Drains and logs every pending GPU error. Returns `true` when there were none.
///
/// Errors are reported by symbolic name and never interrupt the frame.
pub fn check_error(gpu: &dyn Gpu, after: &str) -> bool {
    let mut clean = true;
    while let Some(error) = gpu.take_error() {
        log::warn!("GL error after {after}: {error}");
        clean = false;
    }
    clean
}
