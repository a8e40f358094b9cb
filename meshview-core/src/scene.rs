//! The scene: an object graph, its main camera and the per-frame traversals over it.
//!
//! Traversals are depth-first in insertion order at every level, parents before children.
//! There is no depth sorting and no culling pass. What ends up on screen therefore depends on
//! the depth test and blend state the caller configured and, with blending enabled, on
//! insertion order: a translucent object must be added after whatever should show through it.

use std::rc::Rc;

use glam::Mat4;

use crate::{
    camera::{Camera, CameraComponent, CameraView},
    component::{DestroyContext, ObjectId, RenderContext, UpdateContext},
    gpu::Gpu,
    light::ActiveLight,
    object::SceneObject,
};

/// Failure to insert into a scene.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("the scene has been destroyed")]
    Destroyed,
    #[error("no object {0} in the scene")]
    NoSuchObject(ObjectId),
}

/// Everything a render pass hands to components, computed once per frame.
struct FramePass {
    projection: Mat4,
    camera: CameraView,
    light: Option<ActiveLight>,
}

/// Owns the scene graph and drives its lifecycle.
pub struct Scene {
    gpu: Rc<dyn Gpu>,
    roots: Vec<SceneObject>,
    main_camera: ObjectId,
    size: (u32, u32),
    next_id: u64,
    frame: u64,
    destroyed: bool,
}

impl Scene {
    /// Name of the object carrying the camera the scene creates for itself.
    pub const MAIN_CAMERA: &'static str = "Main Camera";

    /// Creates a scene for a viewport of the given size, with a main camera as its first
    /// root object.
    pub fn new(gpu: Rc<dyn Gpu>, width: u32, height: u32) -> Self {
        let mut scene = Self {
            gpu,
            roots: Vec::new(),
            main_camera: ObjectId(0),
            size: (width, height),
            next_id: 0,
            frame: 0,
            destroyed: false,
        };
        let camera = SceneObject::new(Self::MAIN_CAMERA)
            .with_component(CameraComponent::new(Camera::new(width, height)));
        scene.main_camera = scene.insert_root(camera);
        log::info!("Created scene {width}x{height}");
        scene
    }

    fn insert_root(&mut self, mut object: SceneObject) -> ObjectId {
        object.enter_scene(&mut self.next_id, &self.gpu);
        let id = object.id().unwrap_or(ObjectId(self.next_id));
        self.roots.push(object);
        id
    }

    /// Inserts `object` and its subtree at the root, attaching and creating every component.
    pub fn add_object(&mut self, object: SceneObject) -> Result<ObjectId, SceneError> {
        if self.destroyed {
            return Err(SceneError::Destroyed);
        }
        Ok(self.insert_root(object))
    }

    /// Inserts `object` as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: ObjectId,
        mut object: SceneObject,
    ) -> Result<ObjectId, SceneError> {
        if self.destroyed {
            return Err(SceneError::Destroyed);
        }
        let parent = self
            .roots
            .iter_mut()
            .find_map(|r| r.find_mut(parent))
            .ok_or(SceneError::NoSuchObject(parent))?;
        object.enter_scene(&mut self.next_id, &self.gpu);
        let id = object.id().unwrap_or(ObjectId(self.next_id));
        parent.children.push(object);
        Ok(id)
    }

    /// The GPU the scene's components create their resources on.
    pub fn gpu(&self) -> &Rc<dyn Gpu> {
        &self.gpu
    }

    /// Root objects in insertion order.
    pub fn roots(&self) -> &[SceneObject] {
        &self.roots
    }

    /// Total number of objects, the main camera included.
    pub fn object_count(&self) -> usize {
        self.roots.iter().map(SceneObject::subtree_len).sum()
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.roots.iter().find_map(|r| r.find(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.roots.iter().find_map(|r| r.find_by_name(name))
    }

    /// Mutable access to an object's transform.
    pub fn transform_mut(&mut self, id: ObjectId) -> Option<&mut crate::transform::Transform> {
        self.roots
            .iter_mut()
            .find_map(|r| r.find_mut(id))
            .map(|o| &mut o.transform)
    }

    pub fn main_camera_id(&self) -> ObjectId {
        self.main_camera
    }

    /// Makes the camera on object `id` the one the scene renders through. Returns `false`
    /// if that object has no camera component.
    pub fn set_main_camera(&mut self, id: ObjectId) -> bool {
        let has_camera = self
            .object(id)
            .is_some_and(|o| o.components.iter().any(|s| s.component().camera().is_some()));
        if has_camera {
            self.main_camera = id;
            let (w, h) = self.size;
            if let Some(camera) = self.main_camera_mut() {
                camera.set_size(w, h);
            }
        }
        has_camera
    }

    pub fn main_camera(&self) -> Option<&Camera> {
        self.object(self.main_camera)?
            .components
            .iter()
            .find_map(|s| s.component().camera())
    }

    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        let id = self.main_camera;
        self.roots
            .iter_mut()
            .find_map(|r| r.find_mut(id))?
            .components
            .iter_mut()
            .find_map(|s| s.component_mut().camera_mut())
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Records a new viewport size. The graph is left alone; the camera rebuilds its
    /// projection on the next render if the size actually changed.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        if let Some(camera) = self.main_camera_mut() {
            camera.set_size(width, height);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The first live light in traversal order, with its object's world matrix.
    pub fn active_light(&self) -> Option<ActiveLight> {
        fn find(object: &SceneObject, parent: Mat4) -> Option<ActiveLight> {
            let world = parent * object.transform.matrix();
            object
                .components
                .iter()
                .filter(|s| s.is_live())
                .find_map(|s| s.component().light())
                .map(|light| ActiveLight { light, world })
                .or_else(|| object.children.iter().find_map(|c| find(c, world)))
        }
        self.roots.iter().find_map(|r| find(r, Mat4::IDENTITY))
    }

    /// Calls `render` on every active component, depth-first in insertion order, with the
    /// main camera's matrices and the active light.
    pub fn render(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(camera) = self.main_camera_mut() else {
            log::warn!("Scene has no main camera, skipping render");
            return;
        };
        let projection = camera.projection();
        let camera = CameraView::from(&*camera);
        let pass = FramePass {
            projection,
            camera,
            light: self.active_light(),
        };

        fn visit(object: &mut SceneObject, parent: Mat4, pass: &FramePass, gpu: &dyn Gpu) {
            let world = parent * object.transform.matrix();
            let Some(owner) = object.id() else {
                return;
            };
            let ctx = RenderContext {
                gpu,
                owner,
                world,
                projection: pass.projection,
                camera: &pass.camera,
                light: pass.light.as_ref(),
            };
            for slot in &mut object.components {
                slot.render(&ctx);
            }
            for child in &mut object.children {
                visit(child, world, pass, gpu);
            }
        }

        let gpu = self.gpu.as_ref();
        for root in &mut self.roots {
            visit(root, Mat4::IDENTITY, &pass, gpu);
        }
    }

    /// Calls `update` on every active component, depth-first in insertion order.
    pub fn update(&mut self) {
        if self.destroyed {
            return;
        }

        fn visit(object: &mut SceneObject, frame: u64) {
            let Some(owner) = object.id() else {
                return;
            };
            for slot in object.components.iter_mut() {
                let mut ctx = UpdateContext {
                    owner,
                    transform: &mut object.transform,
                    frame,
                };
                slot.update(&mut ctx);
            }
            for child in &mut object.children {
                visit(child, frame);
            }
        }

        for root in &mut self.roots {
            visit(root, self.frame);
        }
        self.frame += 1;
    }

    /// Calls `on_destroy` on every component exactly once. Must run before the graphics
    /// context goes away. Later calls, renders and updates do nothing.
    pub fn on_destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        fn visit(object: &mut SceneObject, gpu: &dyn Gpu) {
            if let Some(owner) = object.id() {
                let ctx = DestroyContext { gpu, owner };
                for slot in &mut object.components {
                    slot.destroy(&ctx);
                }
            }
            for child in &mut object.children {
                visit(child, gpu);
            }
        }

        let gpu = self.gpu.as_ref();
        for root in &mut self.roots {
            visit(root, gpu);
        }
        log::info!("Destroyed scene ({} objects)", self.object_count());
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.on_destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use glam::{Vec3, Vec4};

    use super::*;
    use crate::{
        component::{Component, ComponentError, CreateContext, LifecycleState},
        headless::{GpuCall, RecordingGpu, UniformValue},
        light::{BaseLight, DirectionalLight, LIGHT_TYPE_DIRECTIONAL, LightComponent, PointLight},
        material::Material,
        mesh::{Mesh, Vertex},
        mesh_renderer::MeshRenderer,
        shader::{Shader, names},
    };

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every lifecycle call it receives.
    struct Probe {
        label: &'static str,
        log: Log,
        fail_create: bool,
        created: bool,
        destroyed: bool,
    }

    impl Probe {
        fn new(label: &'static str, log: &Log) -> Self {
            Self {
                label,
                log: Rc::clone(log),
                fail_create: false,
                created: false,
                destroyed: false,
            }
        }

        fn failing(label: &'static str, log: &Log) -> Self {
            Self {
                fail_create: true,
                ..Self::new(label, log)
            }
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.label));
        }
    }

    impl Component for Probe {
        fn name(&self) -> &str {
            self.label
        }

        fn on_attach(&mut self, _owner: ObjectId) {
            self.record("attach");
        }

        fn on_create(&mut self, _ctx: &CreateContext) -> Result<(), ComponentError> {
            self.record("create");
            if self.fail_create {
                return Err(ComponentError::Other("no resources".into()));
            }
            self.created = true;
            Ok(())
        }

        fn update(&mut self, _ctx: &mut UpdateContext) {
            assert!(self.created && !self.destroyed, "update outside lifetime");
            self.record("update");
        }

        fn render(&mut self, ctx: &RenderContext) {
            assert!(self.created && !self.destroyed, "render outside lifetime");
            let p = ctx.world.w_axis.truncate();
            self.record(&format!("render@{},{},{}", p.x, p.y, p.z));
        }

        fn on_destroy(&mut self, _ctx: &DestroyContext) {
            assert!(!self.destroyed, "destroyed twice");
            self.destroyed = true;
            self.record("destroy");
        }
    }

    fn scene() -> (Rc<RecordingGpu>, Scene) {
        let gpu = Rc::new(RecordingGpu::new());
        let scene = Scene::new(gpu.clone(), 800, 600);
        (gpu, scene)
    }

    fn events(log: &Log, suffix: &str) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|e| e.contains(suffix))
            .cloned()
            .collect()
    }

    #[test]
    fn insertion_attaches_then_creates() {
        let log = Log::default();
        let (_gpu, mut scene) = scene();
        let id = scene
            .add_object(SceneObject::new("a").with_component(Probe::new("a", &log)))
            .unwrap();

        assert_eq!(*log.borrow(), ["a:attach", "a:create"]);
        assert_eq!(
            scene.object(id).unwrap().component_states(),
            [LifecycleState::Created]
        );

        scene.render();
        assert_eq!(
            scene.object(id).unwrap().component_states(),
            [LifecycleState::Active]
        );
    }

    #[test]
    fn render_visits_each_component_once_in_insertion_order() {
        let log = Log::default();
        let (_gpu, mut scene) = scene();
        let mut parent = SceneObject::new("parent")
            .with_component(Probe::new("p1", &log))
            .with_component(Probe::new("p2", &log))
            .with_child(SceneObject::new("child").with_component(Probe::new("c", &log)));
        parent.transform.set_position(1.0, 0.0, 0.0);
        scene.add_object(parent).unwrap();
        let mut second = SceneObject::new("second").with_component(Probe::new("s", &log));
        second.transform.set_position(0.0, 2.0, 0.0);
        let second = scene.add_object(second).unwrap();
        let mut grandchild = SceneObject::new("grandchild").with_component(Probe::new("g", &log));
        grandchild.transform.set_position(0.0, 0.0, 3.0);
        scene.add_child(second, grandchild).unwrap();

        scene.render();

        assert_eq!(
            events(&log, "render"),
            [
                "p1:render@1,0,0",
                "p2:render@1,0,0",
                "c:render@1,0,0",
                "s:render@0,2,0",
                "g:render@0,2,3",
            ]
        );
    }

    #[test]
    fn render_completes_before_update() {
        let log = Log::default();
        let (_gpu, mut scene) = scene();
        scene
            .add_object(
                SceneObject::new("a")
                    .with_component(Probe::new("a", &log))
                    .with_child(SceneObject::new("b").with_component(Probe::new("b", &log))),
            )
            .unwrap();

        scene.render();
        scene.update();

        let frame: Vec<String> = log.borrow()[4..].to_vec();
        assert_eq!(
            frame,
            ["a:render@0,0,0", "b:render@0,0,0", "a:update", "b:update"]
        );
    }

    #[test]
    fn failed_create_is_never_rendered_but_destroyed() {
        let log = Log::default();
        let (_gpu, mut scene) = scene();
        let id = scene
            .add_object(
                SceneObject::new("a")
                    .with_component(Probe::failing("bad", &log))
                    .with_component(Probe::new("good", &log)),
            )
            .unwrap();

        scene.render();
        scene.update();
        assert_eq!(
            scene.object(id).unwrap().component_states(),
            [LifecycleState::Attached, LifecycleState::Active]
        );
        scene.on_destroy();

        assert!(events(&log, "bad:render").is_empty());
        assert!(events(&log, "bad:update").is_empty());
        assert_eq!(events(&log, "bad:destroy"), ["bad:destroy"]);
    }

    #[test]
    fn destroy_reaches_every_component_exactly_once() {
        let log = Log::default();
        let (_gpu, mut scene) = scene();
        let root = scene
            .add_object(
                SceneObject::new("a")
                    .with_component(Probe::new("a", &log))
                    .with_child(SceneObject::new("b").with_component(Probe::new("b", &log))),
            )
            .unwrap();
        scene
            .add_child(root, SceneObject::new("c").with_component(Probe::new("c", &log)))
            .unwrap();
        scene.render();

        scene.on_destroy();
        scene.on_destroy();
        scene.render();
        scene.update();
        drop(scene);

        assert_eq!(events(&log, "destroy"), ["a:destroy", "b:destroy", "c:destroy"]);
        assert_eq!(events(&log, "render").len(), 3);
        assert!(events(&log, "update").is_empty());
    }

    #[test]
    fn destroyed_scene_rejects_objects() {
        let (_gpu, mut scene) = scene();
        scene.on_destroy();
        assert_eq!(
            scene.add_object(SceneObject::new("late")),
            Err(SceneError::Destroyed)
        );
    }

    #[test]
    fn add_child_requires_existing_parent() {
        let (_gpu, mut scene) = scene();
        let missing = ObjectId(99);
        assert_eq!(
            scene.add_child(missing, SceneObject::new("orphan")),
            Err(SceneError::NoSuchObject(missing))
        );
    }

    #[test]
    fn repeated_identical_sizes_do_not_rebuild_projection() {
        let (_gpu, mut scene) = scene();
        scene.render();
        scene.set_size(800, 600);
        scene.set_size(800, 600);
        scene.render();
        assert_eq!(scene.main_camera().unwrap().projection_revision(), 1);

        scene.set_size(1024, 600);
        scene.render();
        scene.render();
        assert_eq!(scene.main_camera().unwrap().projection_revision(), 2);
        assert_eq!(scene.object_count(), 1);
    }

    #[test]
    fn first_live_light_in_traversal_order_wins() {
        let (_gpu, mut scene) = scene();
        let mut lamp = SceneObject::new("lamp").with_component(LightComponent::new(PointLight::default()));
        lamp.transform.set_position(2.0, 0.0, 12.0);
        scene.add_object(lamp).unwrap();
        scene
            .add_object(
                SceneObject::new("sun").with_component(LightComponent::new(DirectionalLight::default())),
            )
            .unwrap();

        let active = scene.active_light().unwrap();
        assert!(matches!(active.light, crate::light::Light::Point(_)));
        assert_eq!(active.world_position(), Vec3::new(2.0, 0.0, 12.0));
    }

    #[test]
    fn one_flat_mesh_and_one_directional_light_draw_once() {
        let recorder = Rc::new(RecordingGpu::new());
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let mut scene = Scene::new(Rc::clone(&gpu), 800, 600);

        let shader = Rc::new(Shader::new(&gpu, "", "").unwrap());
        let mesh = Mesh::new(
            "triangle",
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            Material::with_color(shader, Vec4::new(0.2, 0.4, 0.6, 1.0)),
        );
        let mut model = SceneObject::new("model").with_component(MeshRenderer::new().with_mesh(mesh));
        model.transform.set_position(0.0, 0.0, 4.0);
        scene.add_object(model).unwrap();
        scene
            .add_object(SceneObject::new("sun").with_component(LightComponent::new(
                DirectionalLight {
                    base: BaseLight {
                        color: Vec4::new(1.0, 0.9, 0.8, 1.0),
                        ambient_intensity: 0.8,
                        diffuse_intensity: 1.0,
                    },
                    direction: Vec3::new(4.0, 2.0, 6.0),
                },
            )))
            .unwrap();
        recorder.clear_calls();

        scene.render();

        assert_eq!(recorder.draw_count(), 1);
        assert_eq!(
            recorder.uniform(names::LIGHT_COLOR),
            Some(UniformValue::Vec3(Vec3::new(1.0, 0.9, 0.8)))
        );
        assert_eq!(
            recorder.uniform(names::AMBIENT_INTENSITY),
            Some(UniformValue::Float(0.8))
        );
        assert_eq!(
            recorder.uniform(names::DIFFUSE_INTENSITY),
            Some(UniformValue::Float(1.0))
        );
        assert_eq!(
            recorder.uniform(names::LIGHT_TYPE),
            Some(UniformValue::Int(LIGHT_TYPE_DIRECTIONAL))
        );
        assert_eq!(
            recorder.uniform(names::USE_DIFFUSE_TEXTURE),
            Some(UniformValue::Int(0))
        );
        assert_eq!(
            recorder.uniform(names::MODEL),
            Some(UniformValue::Mat4(Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0))))
        );

        // All uniforms precede the draw call.
        let calls = recorder.calls();
        let draw = calls
            .iter()
            .position(|c| matches!(c, GpuCall::DrawElements { .. }))
            .unwrap();
        let last_uniform = calls
            .iter()
            .rposition(|c| matches!(c, GpuCall::SetUniform { .. }))
            .unwrap();
        assert!(last_uniform < draw);
    }

    #[test]
    fn every_frame_rebinds_all_uniforms() {
        let recorder = Rc::new(RecordingGpu::new());
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let mut scene = Scene::new(Rc::clone(&gpu), 800, 600);
        let shader = Rc::new(Shader::new(&gpu, "", "").unwrap());
        let flat = |name: &str| {
            Mesh::new(
                name,
                vec![Vertex::default(); 3],
                vec![0, 1, 2],
                Material::with_color(Rc::clone(&shader), Vec4::ONE),
            )
        };
        scene
            .add_object(
                SceneObject::new("model")
                    .with_component(MeshRenderer::new().with_mesh(flat("a")).with_mesh(flat("b"))),
            )
            .unwrap();
        scene
            .add_object(SceneObject::new("sun").with_component(LightComponent::new(DirectionalLight::default())))
            .unwrap();

        recorder.clear_calls();
        scene.render();
        let first = recorder.uniform_writes().len();
        recorder.clear_calls();
        scene.render();
        let second = recorder.uniform_writes().len();

        assert_eq!(recorder.draw_count(), 2);
        assert_eq!(first, second);
        assert_eq!(first % 2, 0);
    }

    #[test]
    fn destroy_releases_gpu_resources() {
        let recorder = Rc::new(RecordingGpu::new());
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let mut scene = Scene::new(Rc::clone(&gpu), 800, 600);
        let shader = Rc::new(Shader::new(&gpu, "", "").unwrap());
        let mesh = Mesh::new(
            "tri",
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            Material::with_color(shader, Vec4::ONE),
        );
        scene
            .add_object(SceneObject::new("model").with_component(MeshRenderer::new().with_mesh(mesh)))
            .unwrap();
        assert_eq!(recorder.live_objects(), 2);

        scene.on_destroy();

        assert_eq!(recorder.live_objects(), 0);
    }
}
