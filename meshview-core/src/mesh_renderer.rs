//! The component that draws meshes.

use std::rc::Rc;

use glam::Vec3;

use crate::{
    component::{
        Component, ComponentError, CreateContext, DestroyContext, RenderContext, UpdateContext,
    },
    gpu::{self, Gpu},
    light::LightSpace,
    mesh::Mesh,
};

/// Owns an ordered list of meshes and draws each of them once per frame.
///
/// Every draw rebinds the program, all matrices, the material and the light. Nothing is
/// assumed to survive from the previous draw call, whatever it left bound.
#[derive(Default)]
pub struct MeshRenderer {
    meshes: Vec<Mesh>,
    spin: f32,
    gpu: Option<Rc<dyn Gpu>>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.add_mesh(mesh);
        self
    }

    /// Adds a mesh before the component is created.
    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Degrees the owner turns around its Y axis on every update.
    pub fn set_spin(&mut self, degrees_per_update: f32) {
        self.spin = degrees_per_update;
    }

    pub fn with_spin(mut self, degrees_per_update: f32) -> Self {
        self.set_spin(degrees_per_update);
        self
    }

    fn release(&mut self, gpu: &dyn Gpu) {
        for mesh in &mut self.meshes {
            mesh.release(gpu);
        }
    }
}

impl Component for MeshRenderer {
    fn name(&self) -> &str {
        "MeshRenderer"
    }

    fn on_create(&mut self, ctx: &CreateContext) -> Result<(), ComponentError> {
        self.gpu = Some(Rc::clone(ctx.gpu));
        for mesh in &mut self.meshes {
            mesh.upload(ctx.gpu.as_ref())?;
            log::debug!(
                "Uploaded mesh {:?} on {}: {} vertices, {} indices",
                mesh.name(),
                ctx.owner,
                mesh.vertices().len(),
                mesh.index_count()
            );
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateContext) {
        if self.spin != 0.0 {
            ctx.transform.rotate(Vec3::new(0.0, self.spin, 0.0));
        }
    }

    fn render(&mut self, ctx: &RenderContext) {
        let world_to_local = ctx.world.inverse();
        let space = LightSpace {
            camera_local_pos: world_to_local.transform_point3(ctx.camera.position),
            world_to_local,
            light_world_pos: ctx.light.map(|l| l.world_position()).unwrap_or_default(),
        };

        for mesh in &self.meshes {
            let material = mesh.material();
            let shader = material.shader();
            let loc = shader.locations();

            shader.use_program();
            shader.set(loc.projection, ctx.projection);
            shader.set(loc.view, ctx.camera.view);
            shader.set(loc.model, ctx.world);
            material.bind();
            if let Some(active) = ctx.light {
                active.light.bind(shader, &space);
            }

            if !mesh.draw(ctx.gpu) {
                log::trace!("Skipping mesh {:?}, not uploaded", mesh.name());
            }
            material.unbind();
            gpu::check_error(ctx.gpu, "mesh draw");
        }
    }

    fn on_destroy(&mut self, ctx: &DestroyContext) {
        self.release(ctx.gpu);
        // Last references to shared programs and textures go away here.
        self.meshes.clear();
        self.gpu = None;
    }
}

impl Drop for MeshRenderer {
    fn drop(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            self.release(gpu.as_ref());
        }
    }
}
