//! A [`Gpu`] that records calls instead of executing them.
//!
//! [`RecordingGpu`] hands out increasing ids, remembers which uniform name each location was
//! resolved from and keeps a log of every call, which makes it useful for headless dry runs
//! and for asserting on the exact command stream a frame produces.

use std::{cell::RefCell, collections::VecDeque, num::NonZeroU32};

use fxhash::{FxHashMap, FxHashSet};
use glam::{Mat4, Vec3, Vec4};

use crate::{
    gpu::{GlError, Gpu, GpuError, MeshBuffers, ProgramId, TextureId, UniformLocation},
    mesh::Vertex,
};

/// A value written to a uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// One recorded GPU call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    CreateTexture(TextureId),
    BindTexture {
        unit: u32,
        texture: Option<TextureId>,
    },
    DeleteTexture(TextureId),
    CreateMeshBuffers(MeshBuffers),
    DeleteMeshBuffers(MeshBuffers),
    DrawElements {
        program: Option<ProgramId>,
        vao: NonZeroU32,
        index_count: usize,
    },
    Viewport(u32, u32),
    Clear,
}

#[derive(Default)]
struct State {
    next_id: u32,
    current_program: Option<ProgramId>,
    locations: FxHashMap<UniformLocation, (ProgramId, String)>,
    missing_uniforms: FxHashSet<String>,
    fail_programs: bool,
    fail_mesh_buffers: bool,
    errors: VecDeque<GlError>,
    calls: Vec<GpuCall>,
}

impl State {
    fn next(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN)
    }
}

/// Headless [`Gpu`] that logs every call.
#[derive(Default)]
pub struct RecordingGpu {
    state: RefCell<State>,
}

impl RecordingGpu {
    /// Creates a recorder that resolves every uniform name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `uniform_location` report the given names as absent, like a shader variant that
    /// does not declare them.
    pub fn with_missing_uniforms(names: &[&str]) -> Self {
        let gpu = Self::default();
        gpu.state.borrow_mut().missing_uniforms = names.iter().map(|n| n.to_string()).collect();
        gpu
    }

    /// Makes every following `create_program` fail to link.
    pub fn fail_programs(&self, fail: bool) {
        self.state.borrow_mut().fail_programs = fail;
    }

    /// Makes every following `create_mesh_buffers` fail.
    pub fn fail_mesh_buffers(&self, fail: bool) {
        self.state.borrow_mut().fail_mesh_buffers = fail;
    }

    /// Queues an error flag for `take_error` to report.
    pub fn push_error(&self, error: GlError) {
        self.state.borrow_mut().errors.push_back(error);
    }

    /// Returns a copy of the call log.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.state.borrow().calls.clone()
    }

    /// Forgets all recorded calls.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of draw calls issued so far.
    pub fn draw_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, GpuCall::DrawElements { .. }))
            .count()
    }

    /// The last value written to the uniform called `name`, in any program.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.state.borrow().calls.iter().rev().find_map(|c| match c {
            GpuCall::SetUniform {
                name: n, value, ..
            } if n == name => Some(*value),
            _ => None,
        })
    }

    /// Every uniform write, in order, as `(name, value)` pairs.
    pub fn uniform_writes(&self) -> Vec<(String, UniformValue)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::SetUniform { name, value, .. } => Some((name.clone(), *value)),
                _ => None,
            })
            .collect()
    }

    /// Number of objects created but not yet deleted, across programs, textures and meshes.
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        let mut live: i64 = 0;
        for call in &state.calls {
            match call {
                GpuCall::CreateProgram(_)
                | GpuCall::CreateTexture(_)
                | GpuCall::CreateMeshBuffers(_) => live += 1,
                GpuCall::DeleteProgram(_)
                | GpuCall::DeleteTexture(_)
                | GpuCall::DeleteMeshBuffers(_) => live -= 1,
                _ => {}
            }
        }
        live.max(0) as usize
    }

    fn record(&self, call: GpuCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn set(&self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some((program, name)) = state.locations.get(&location).cloned() else {
            return;
        };
        state.calls.push(GpuCall::SetUniform {
            program,
            name,
            value,
        });
    }
}

impl Gpu for RecordingGpu {
    fn create_program(&self, _vertex: &str, _fragment: &str) -> Result<ProgramId, GpuError> {
        let mut state = self.state.borrow_mut();
        if state.fail_programs {
            return Err(GpuError::Link("program linking disabled".to_string()));
        }
        let id = ProgramId(state.next());
        state.calls.push(GpuCall::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(GpuCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        state.current_program = program;
        state.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        if state.missing_uniforms.contains(name) {
            return None;
        }
        let location = UniformLocation(state.next().get());
        state.locations.insert(location, (program, name.to_string()));
        Some(location)
    }

    fn uniform_1_i32(&self, location: UniformLocation, value: i32) {
        self.set(location, UniformValue::Int(value));
    }

    fn uniform_1_f32(&self, location: UniformLocation, value: f32) {
        self.set(location, UniformValue::Float(value));
    }

    fn uniform_3_f32(&self, location: UniformLocation, value: Vec3) {
        self.set(location, UniformValue::Vec3(value));
    }

    fn uniform_4_f32(&self, location: UniformLocation, value: Vec4) {
        self.set(location, UniformValue::Vec4(value));
    }

    fn uniform_matrix_4_f32(&self, location: UniformLocation, value: &Mat4) {
        self.set(location, UniformValue::Mat4(*value));
    }

    fn create_texture(
        &self,
        _width: u32,
        _height: u32,
        _rgba: &[u8],
    ) -> Result<TextureId, GpuError> {
        let mut state = self.state.borrow_mut();
        let id = TextureId(state.next());
        state.calls.push(GpuCall::CreateTexture(id));
        Ok(id)
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
        self.record(GpuCall::BindTexture { unit, texture });
    }

    fn delete_texture(&self, texture: TextureId) {
        self.record(GpuCall::DeleteTexture(texture));
    }

    fn create_mesh_buffers(
        &self,
        _vertices: &[Vertex],
        _indices: &[u32],
    ) -> Result<MeshBuffers, GpuError> {
        let mut state = self.state.borrow_mut();
        if state.fail_mesh_buffers {
            return Err(GpuError::Create {
                object: "vertex array",
                reason: "buffer creation disabled".to_string(),
            });
        }
        let buffers = MeshBuffers {
            vao: state.next(),
            vbo: state.next(),
            ebo: state.next(),
        };
        state.calls.push(GpuCall::CreateMeshBuffers(buffers));
        Ok(buffers)
    }

    fn delete_mesh_buffers(&self, buffers: MeshBuffers) {
        self.record(GpuCall::DeleteMeshBuffers(buffers));
    }

    fn draw_elements(&self, buffers: &MeshBuffers, index_count: usize) {
        let mut state = self.state.borrow_mut();
        let program = state.current_program;
        state.calls.push(GpuCall::DrawElements {
            program,
            vao: buffers.vao,
            index_count,
        });
    }

    fn viewport(&self, width: u32, height: u32) {
        self.record(GpuCall::Viewport(width, height));
    }

    fn clear(&self) {
        self.record(GpuCall::Clear);
    }

    fn take_error(&self) -> Option<GlError> {
        self.state.borrow_mut().errors.pop_front()
    }
}
