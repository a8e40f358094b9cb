//! Shader programs
//!
//! This module defines the [`Shader`] struct, a linked program together with the locations of
//! every uniform the renderer writes, and the [`Uniform`] trait for pushing values into those
//! locations. [`ShaderLoader`] compiles programs from asset sources and shares them between
//! materials.

use std::rc::{Rc, Weak};

use fxhash::FxHashMap;
use glam::{Mat4, Vec3, Vec4};

use crate::{
    assets::{AssetError, Assets},
    gpu::{Gpu, GpuError, ProgramId, UniformLocation},
};

/// Uniform names shared by the bundled shaders and the binding code.
pub mod names {
    pub const MODEL: &str = "u_model";
    pub const VIEW: &str = "u_view";
    pub const PROJECTION: &str = "u_projection";
    pub const LIGHT_COLOR: &str = "u_lightColor";
    pub const AMBIENT_INTENSITY: &str = "u_ambientIntensity";
    pub const DIFFUSE_INTENSITY: &str = "u_diffuseIntensity";
    pub const LIGHT_TYPE: &str = "u_lightType";
    pub const CAMERA_LOCAL_POS: &str = "u_cameraLocalPos";
    pub const LIGHT_LOCAL_POS: &str = "u_lightLocalPos";
    pub const LIGHT_DIRECTION: &str = "u_lightDirection";
    pub const ATTEN_CONSTANT: &str = "u_attenConstant";
    pub const ATTEN_LINEAR: &str = "u_attenLinear";
    pub const ATTEN_EXP: &str = "u_attenExp";
    pub const CUTOFF: &str = "u_cutoff";
    pub const USE_DIFFUSE_TEXTURE: &str = "u_useDiffuseTexture";
    pub const DIFFUSE_COLOR: &str = "u_diffuseColor";
    pub const DIFFUSE_TEXTURE: &str = "u_diffuseTexture";
}

/// Represents a value that can be written to a uniform.
pub trait Uniform {
    /// Writes the value to `location` of the current program.
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation);
}

impl Uniform for bool {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        gpu.uniform_1_i32(location, *self as i32);
    }
}

impl Uniform for i32 {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        gpu.uniform_1_i32(location, *self);
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        gpu.uniform_1_f32(location, *self);
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        gpu.uniform_3_f32(location, *self);
    }
}

impl Uniform for Vec4 {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        gpu.uniform_4_f32(location, *self);
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        gpu.uniform_matrix_4_f32(location, self);
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gpu: &dyn Gpu, location: UniformLocation) {
        (*self).set_uniform(gpu, location);
    }
}

/// Locations of the uniforms the renderer writes, resolved once per program.
///
/// `None` marks a uniform the program does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UniformLocations {
    pub model: Option<UniformLocation>,
    pub view: Option<UniformLocation>,
    pub projection: Option<UniformLocation>,
    pub light_color: Option<UniformLocation>,
    pub ambient_intensity: Option<UniformLocation>,
    pub diffuse_intensity: Option<UniformLocation>,
    pub light_type: Option<UniformLocation>,
    pub camera_local_pos: Option<UniformLocation>,
    pub light_local_pos: Option<UniformLocation>,
    pub light_direction: Option<UniformLocation>,
    pub atten_constant: Option<UniformLocation>,
    pub atten_linear: Option<UniformLocation>,
    pub atten_exp: Option<UniformLocation>,
    pub cutoff: Option<UniformLocation>,
    pub use_diffuse_texture: Option<UniformLocation>,
    pub diffuse_color: Option<UniformLocation>,
    pub diffuse_texture: Option<UniformLocation>,
}

impl UniformLocations {
    fn resolve(gpu: &dyn Gpu, program: ProgramId) -> Self {
        let get = |name| gpu.uniform_location(program, name);
        Self {
            model: get(names::MODEL),
            view: get(names::VIEW),
            projection: get(names::PROJECTION),
            light_color: get(names::LIGHT_COLOR),
            ambient_intensity: get(names::AMBIENT_INTENSITY),
            diffuse_intensity: get(names::DIFFUSE_INTENSITY),
            light_type: get(names::LIGHT_TYPE),
            camera_local_pos: get(names::CAMERA_LOCAL_POS),
            light_local_pos: get(names::LIGHT_LOCAL_POS),
            light_direction: get(names::LIGHT_DIRECTION),
            atten_constant: get(names::ATTEN_CONSTANT),
            atten_linear: get(names::ATTEN_LINEAR),
            atten_exp: get(names::ATTEN_EXP),
            cutoff: get(names::CUTOFF),
            use_diffuse_texture: get(names::USE_DIFFUSE_TEXTURE),
            diffuse_color: get(names::DIFFUSE_COLOR),
            diffuse_texture: get(names::DIFFUSE_TEXTURE),
        }
    }
}

/// A linked GPU program and its uniform location cache.
///
/// The program is deleted when the shader is dropped, so the last owner must go away before
/// the context does.
pub struct Shader {
    gpu: Rc<dyn Gpu>,
    program: ProgramId,
    locations: UniformLocations,
}

impl Shader {
    /// Compiles and links a program from vertex and fragment sources.
    pub fn new(gpu: &Rc<dyn Gpu>, vertex: &str, fragment: &str) -> Result<Self, GpuError> {
        let program = gpu.create_program(vertex, fragment)?;
        let locations = UniformLocations::resolve(gpu.as_ref(), program);
        log::debug!("Linked shader program {:?}", program.0);
        Ok(Self {
            gpu: Rc::clone(gpu),
            program,
            locations,
        })
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn locations(&self) -> &UniformLocations {
        &self.locations
    }

    /// Makes this program current.
    pub fn use_program(&self) {
        self.gpu.use_program(Some(self.program));
    }

    /// Writes `value` to a cached location. Absent locations are skipped without a log line:
    /// shader variants routinely leave optional uniforms out.
    pub fn set<T: Uniform>(&self, location: Option<UniformLocation>, value: T) {
        if let Some(location) = location {
            value.set_uniform(self.gpu.as_ref(), location);
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        log::debug!("Deleting shader program {:?}", self.program.0);
        self.gpu.delete_program(self.program);
    }
}

/// Failure to produce a shader from asset sources.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("{path}: {source}")]
    Gpu {
        path: String,
        #[source]
        source: GpuError,
    },
}

/// Loads shader programs from assets and shares programs built from the same sources.
///
/// The cache holds weak references: a program lives exactly as long as some material uses
/// it.
pub struct ShaderLoader {
    gpu: Rc<dyn Gpu>,
    assets: Rc<dyn Assets>,
    cache: FxHashMap<(String, String), Weak<Shader>>,
}

impl ShaderLoader {
    pub fn new(gpu: Rc<dyn Gpu>, assets: Rc<dyn Assets>) -> Self {
        Self {
            gpu,
            assets,
            cache: FxHashMap::default(),
        }
    }

    /// Returns the program built from the two source assets, compiling it on first use.
    pub fn load(&mut self, vertex_path: &str, fragment_path: &str) -> Result<Rc<Shader>, ShaderError> {
        let key = (vertex_path.to_string(), fragment_path.to_string());
        if let Some(shader) = self.cache.get(&key).and_then(Weak::upgrade) {
            return Ok(shader);
        }

        let vertex = self.assets.read_to_string(vertex_path)?;
        let fragment = self.assets.read_to_string(fragment_path)?;
        let shader = Shader::new(&self.gpu, &vertex, &fragment).map_err(|source| {
            ShaderError::Gpu {
                path: format!("{vertex_path} + {fragment_path}"),
                source,
            }
        })?;
        log::info!("Loaded shader {vertex_path} + {fragment_path}");

        let shader = Rc::new(shader);
        self.cache.retain(|_, weak| weak.strong_count() > 0);
        self.cache.insert(key, Rc::downgrade(&shader));
        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::MemoryAssets,
        headless::{GpuCall, RecordingGpu, UniformValue},
    };

    fn loader(gpu: &Rc<RecordingGpu>) -> ShaderLoader {
        let assets = MemoryAssets::new()
            .with("a.vert", "void main() {}")
            .with("a.frag", "void main() {}");
        ShaderLoader::new(gpu.clone(), Rc::new(assets))
    }

    #[test]
    fn resolves_locations_once() {
        let gpu: Rc<dyn Gpu> = Rc::new(RecordingGpu::with_missing_uniforms(&[names::CUTOFF]));
        let shader = Shader::new(&gpu, "", "").unwrap();

        assert!(shader.locations().model.is_some());
        assert!(shader.locations().diffuse_color.is_some());
        assert!(shader.locations().cutoff.is_none());
    }

    #[test]
    fn skips_missing_locations() {
        let recorder = Rc::new(RecordingGpu::with_missing_uniforms(&[names::LIGHT_COLOR]));
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let shader = Shader::new(&gpu, "", "").unwrap();

        shader.set(shader.locations().light_color, Vec3::ONE);
        shader.set(shader.locations().ambient_intensity, 0.5f32);

        assert_eq!(recorder.uniform(names::LIGHT_COLOR), None);
        assert_eq!(
            recorder.uniform(names::AMBIENT_INTENSITY),
            Some(UniformValue::Float(0.5))
        );
    }

    #[test]
    fn loader_shares_programs_while_alive() {
        let gpu = Rc::new(RecordingGpu::new());
        let mut loader = loader(&gpu);

        let a = loader.load("a.vert", "a.frag").unwrap();
        let b = loader.load("a.vert", "a.frag").unwrap();
        assert!(Rc::ptr_eq(&a, &b));

        let program = a.program();
        drop(a);
        drop(b);
        assert!(gpu.calls().contains(&GpuCall::DeleteProgram(program)));

        let c = loader.load("a.vert", "a.frag").unwrap();
        assert_ne!(c.program(), program);
    }

    #[test]
    fn loader_reports_missing_sources() {
        let gpu = Rc::new(RecordingGpu::new());
        let mut loader = loader(&gpu);
        assert!(matches!(
            loader.load("missing.vert", "a.frag"),
            Err(ShaderError::Asset(AssetError::NotFound(_)))
        ));
    }

    #[test]
    fn loader_reports_link_failures() {
        let gpu = Rc::new(RecordingGpu::new());
        gpu.fail_programs(true);
        let mut loader = loader(&gpu);
        assert!(matches!(
            loader.load("a.vert", "a.frag"),
            Err(ShaderError::Gpu { .. })
        ));
    }
}
