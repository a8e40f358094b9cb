//! The component model.
//!
//! A [`Component`] is a unit of behaviour owned by exactly one scene object. The scene drives
//! every component through a fixed lifecycle:
//!
//! ```text
//! Unattached -> Attached -> Created -> Active -> Destroyed
//! ```
//!
//! Attach and create run synchronously when the object is inserted into a scene. A component
//! becomes Active on the first traversal after it was created and from then on receives
//! `update` and `render` every frame, until the destroy traversal. GPU resources acquired in
//! `on_create` are only valid inside that window, so the scene never calls `update` or
//! `render` outside of it.

use std::{fmt, rc::Rc};

use glam::Mat4;

use crate::{
    camera::{Camera, CameraView},
    gpu::{Gpu, GpuError},
    light::{ActiveLight, Light},
    shader::ShaderError,
    transform::Transform,
};

/// Identifier of a scene object, assigned when the object enters a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a component is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Unattached,
    Attached,
    Created,
    Active,
    Destroyed,
}

/// Failure of a component's `on_create`.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("{0}")]
    Other(String),
}

/// Passed to [`Component::on_create`].
pub struct CreateContext<'a> {
    pub gpu: &'a Rc<dyn Gpu>,
    pub owner: ObjectId,
}

/// Passed to [`Component::update`]. The owner's transform is lent for the duration of the
/// call.
pub struct UpdateContext<'a> {
    pub owner: ObjectId,
    pub transform: &'a mut Transform,
    /// Number of update passes before this one.
    pub frame: u64,
}

/// Passed to [`Component::render`].
pub struct RenderContext<'a> {
    pub gpu: &'a dyn Gpu,
    pub owner: ObjectId,
    /// World matrix of the owning object.
    pub world: Mat4,
    pub projection: Mat4,
    pub camera: &'a CameraView,
    /// The single light bound for this frame, if the scene has one.
    pub light: Option<&'a ActiveLight>,
}

/// Passed to [`Component::on_destroy`].
pub struct DestroyContext<'a> {
    pub gpu: &'a dyn Gpu,
    pub owner: ObjectId,
}

/// A unit of behaviour attachable to a scene object.
pub trait Component {
    /// Name used in log output.
    fn name(&self) -> &str;

    /// Called once when the owning object enters a scene.
    fn on_attach(&mut self, _owner: ObjectId) {}

    /// Called once right after `on_attach`; acquire GPU resources here.
    fn on_create(&mut self, _ctx: &CreateContext) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Advances logic and animation. Runs after every component has rendered.
    fn update(&mut self, _ctx: &mut UpdateContext) {}

    /// Issues draw calls.
    fn render(&mut self, _ctx: &RenderContext) {}

    /// Called once during scene teardown; release GPU resources here.
    fn on_destroy(&mut self, _ctx: &DestroyContext) {}

    /// The light this component contributes, if it is a light.
    fn light(&self) -> Option<Light> {
        None
    }

    fn camera(&self) -> Option<&Camera> {
        None
    }

    fn camera_mut(&mut self) -> Option<&mut Camera> {
        None
    }
}

/// A component together with its lifecycle state.
pub(crate) struct ComponentSlot {
    state: LifecycleState,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub(crate) fn new(component: Box<dyn Component>) -> Self {
        Self {
            state: LifecycleState::Unattached,
            component,
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub(crate) fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }

    /// Runs attach and create. A failed create leaves the component Attached: it will never
    /// be updated or rendered, but still gets `on_destroy`.
    pub(crate) fn attach_and_create(&mut self, owner: ObjectId, gpu: &Rc<dyn Gpu>) {
        if self.state != LifecycleState::Unattached {
            return;
        }
        self.component.on_attach(owner);
        self.state = LifecycleState::Attached;

        match self.component.on_create(&CreateContext { gpu, owner }) {
            Ok(()) => {
                self.state = LifecycleState::Created;
                log::debug!("Created {} on {owner}", self.component.name());
            }
            Err(e) => log::error!("Failed to create {} on {owner}: {e}", self.component.name()),
        }
    }

    /// Whether the component may take part in traversals, promoting Created to Active.
    fn activate(&mut self) -> bool {
        match self.state {
            LifecycleState::Created => {
                self.state = LifecycleState::Active;
                true
            }
            LifecycleState::Active => true,
            _ => false,
        }
    }

    /// Whether the component is Created or Active.
    pub(crate) fn is_live(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Created | LifecycleState::Active
        )
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext) {
        if self.activate() {
            self.component.update(ctx);
        }
    }

    pub(crate) fn render(&mut self, ctx: &RenderContext) {
        if self.activate() {
            self.component.render(ctx);
        }
    }

    pub(crate) fn destroy(&mut self, ctx: &DestroyContext) {
        match self.state {
            LifecycleState::Unattached | LifecycleState::Destroyed => {}
            _ => {
                self.state = LifecycleState::Destroyed;
                log::debug!("Destroying {} on {}", self.component.name(), ctx.owner);
                self.component.on_destroy(ctx);
            }
        }
    }
}
