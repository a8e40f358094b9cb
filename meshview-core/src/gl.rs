//! OpenGL ES 3 backend.
//!
//! This module defines [`GlowGpu`], the [`Gpu`] implementation over a [`glow::Context`].

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use glow::HasContext;

use crate::{
    gpu::{
        GlError, Gpu, GpuError, MeshBuffers, ProgramId, ShaderStage, TextureId, UniformLocation,
    },
    mesh::Vertex,
};

/// Global pipeline state applied once after the context is made current.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlDefaults {
    pub clear_color: Vec4,
    /// Face to cull, `None` disables culling.
    pub cull_face: Option<u32>,
    pub depth_test: bool,
    pub alpha_blending: bool,
}

impl Default for GlDefaults {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(20.0 / 255.0, 20.0 / 255.0, 20.0 / 255.0, 1.0),
            cull_face: Some(glow::BACK),
            depth_test: true,
            alpha_blending: true,
        }
    }
}

/// A [`Gpu`] backed by a live OpenGL (ES) context.
pub struct GlowGpu {
    gl: Arc<glow::Context>,
}

impl GlowGpu {
    /// Wraps a context that is already current on this thread.
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self { gl }
    }

    /// Returns the underlying context.
    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Logs vendor, renderer, version and extension strings.
    pub fn log_context_info(&self) {
        unsafe {
            log::info!("GL_VENDOR: {}", self.gl.get_parameter_string(glow::VENDOR));
            log::info!("GL_RENDERER: {}", self.gl.get_parameter_string(glow::RENDERER));
            log::info!("GL_VERSION: {}", self.gl.get_parameter_string(glow::VERSION));
            log::info!(
                "GL_SHADING_LANGUAGE_VERSION: {}",
                self.gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION)
            );
        }
        let mut extensions: Vec<&String> = self.gl.supported_extensions().iter().collect();
        extensions.sort();
        log::debug!("GL_EXTENSIONS:");
        for extension in extensions {
            log::debug!("  {extension}");
        }
    }

    /// Applies depth test, culling, blending and the clear colour.
    pub fn apply_defaults(&self, defaults: &GlDefaults) {
        unsafe {
            if defaults.depth_test {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
            match defaults.cull_face {
                Some(face) => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(face);
                }
                None => self.gl.disable(glow::CULL_FACE),
            }
            if defaults.alpha_blending {
                self.gl.enable(glow::BLEND);
                self.gl
                    .blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(glow::BLEND);
            }
            let c = defaults.clear_color;
            self.gl.clear_color(c.x, c.y, c.z, c.w);
        }
    }

    fn compile(&self, stage: ShaderStage, source: &str) -> Result<glow::Shader, GpuError> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(shader_type)
                .map_err(|reason| GpuError::Create {
                    object: "shader",
                    reason,
                })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(GpuError::Compile { stage, log });
            }
            Ok(shader)
        }
    }
}

impl Gpu for GlowGpu {
    fn create_program(&self, vertex: &str, fragment: &str) -> Result<ProgramId, GpuError> {
        let vert = self.compile(ShaderStage::Vertex, vertex)?;
        let frag = match self.compile(ShaderStage::Fragment, fragment) {
            Ok(frag) => frag,
            Err(e) => {
                unsafe { self.gl.delete_shader(vert) };
                return Err(e);
            }
        };

        unsafe {
            let program = self.gl.create_program().map_err(|reason| GpuError::Create {
                object: "program",
                reason,
            });
            let program = match program {
                Ok(program) => program,
                Err(e) => {
                    self.gl.delete_shader(vert);
                    self.gl.delete_shader(frag);
                    return Err(e);
                }
            };

            self.gl.attach_shader(program, vert);
            self.gl.attach_shader(program, frag);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            self.gl.detach_shader(program, vert);
            self.gl.detach_shader(program, frag);
            self.gl.delete_shader(vert);
            self.gl.delete_shader(frag);

            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GpuError::Link(log));
            }
            Ok(ProgramId(program.0))
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe {
            self.gl.delete_program(glow::NativeProgram(program.0));
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)));
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|loc| UniformLocation(loc.0))
        }
    }

    fn uniform_1_i32(&self, location: UniformLocation, value: i32) {
        unsafe {
            self.gl
                .uniform_1_i32(Some(&glow::NativeUniformLocation(location.0)), value);
        }
    }

    fn uniform_1_f32(&self, location: UniformLocation, value: f32) {
        unsafe {
            self.gl
                .uniform_1_f32(Some(&glow::NativeUniformLocation(location.0)), value);
        }
    }

    fn uniform_3_f32(&self, location: UniformLocation, value: Vec3) {
        unsafe {
            self.gl.uniform_3_f32(
                Some(&glow::NativeUniformLocation(location.0)),
                value.x,
                value.y,
                value.z,
            );
        }
    }

    fn uniform_4_f32(&self, location: UniformLocation, value: Vec4) {
        unsafe {
            self.gl.uniform_4_f32(
                Some(&glow::NativeUniformLocation(location.0)),
                value.x,
                value.y,
                value.z,
                value.w,
            );
        }
    }

    fn uniform_matrix_4_f32(&self, location: UniformLocation, value: &Mat4) {
        unsafe {
            self.gl.uniform_matrix_4_f32_slice(
                Some(&glow::NativeUniformLocation(location.0)),
                false,
                value.as_ref(),
            );
        }
    }

    fn create_texture(&self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureId, GpuError> {
        unsafe {
            let texture = self.gl.create_texture().map_err(|reason| GpuError::Create {
                object: "texture",
                reason,
            })?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(rgba)),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);

            Ok(TextureId(texture.0))
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe {
            self.gl.delete_texture(glow::NativeTexture(texture.0));
        }
    }

    fn create_mesh_buffers(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<MeshBuffers, GpuError> {
        let create_error =
            |object: &'static str| move |reason: String| GpuError::Create { object, reason };
        unsafe {
            let vao = self
                .gl
                .create_vertex_array()
                .map_err(create_error("vertex array"))?;
            let vbo = self.gl.create_buffer().map_err(create_error("vertex buffer"))?;
            let ebo = self.gl.create_buffer().map_err(create_error("index buffer"))?;

            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    vertices.as_ptr() as *const u8,
                    std::mem::size_of_val(vertices),
                ),
                glow::STATIC_DRAW,
            );

            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    indices.as_ptr() as *const u8,
                    std::mem::size_of_val(indices),
                ),
                glow::STATIC_DRAW,
            );

            let stride = Vertex::STRIDE as i32;
            self.gl.enable_vertex_attrib_array(0);
            self.gl
                .vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            self.gl.enable_vertex_attrib_array(1);
            self.gl
                .vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);
            self.gl.enable_vertex_attrib_array(2);
            self.gl
                .vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, stride, 6 * 4);

            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            Ok(MeshBuffers {
                vao: vao.0,
                vbo: vbo.0,
                ebo: ebo.0,
            })
        }
    }

    fn delete_mesh_buffers(&self, buffers: MeshBuffers) {
        unsafe {
            self.gl.delete_buffer(glow::NativeBuffer(buffers.vbo));
            self.gl.delete_buffer(glow::NativeBuffer(buffers.ebo));
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(buffers.vao));
        }
    }

    fn draw_elements(&self, buffers: &MeshBuffers, index_count: usize) {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(buffers.vao)));
            self.gl.draw_elements(
                glow::TRIANGLES,
                index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
            self.gl.bind_vertex_array(None);
        }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    fn clear(&self) {
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn take_error(&self) -> Option<GlError> {
        unsafe { GlError::from_code(self.gl.get_error()) }
    }
}
