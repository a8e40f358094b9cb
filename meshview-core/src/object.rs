//! Scene graph nodes.

use std::rc::Rc;

use crate::{
    component::{Component, ComponentSlot, LifecycleState, ObjectId},
    gpu::Gpu,
    transform::Transform,
};

/// A node of the scene graph: a transform, an ordered list of components and the children
/// it owns.
///
/// Objects are assembled detached and then handed to [`crate::scene::Scene::add_object`],
/// which assigns ids and runs the component lifecycle for the whole subtree.
pub struct SceneObject {
    id: Option<ObjectId>,
    name: String,
    pub transform: Transform,
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) children: Vec<SceneObject>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            transform: Transform::new(),
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The id assigned by the scene, `None` while detached.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_component(mut self, component: impl Component + 'static) -> Self {
        self.add_component(Box::new(component));
        self
    }

    pub fn with_child(mut self, child: SceneObject) -> Self {
        self.add_child(child);
        self
    }

    /// Appends a component to a detached object.
    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.push(ComponentSlot::new(component));
    }

    /// Appends a child to a detached object.
    pub fn add_child(&mut self, child: SceneObject) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[SceneObject] {
        &self.children
    }

    /// Names of the components in insertion order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|s| s.component().name()).collect()
    }

    /// Lifecycle state of each component in insertion order.
    pub fn component_states(&self) -> Vec<LifecycleState> {
        self.components.iter().map(|s| s.state()).collect()
    }

    /// Number of objects in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneObject::subtree_len).sum::<usize>()
    }

    /// Depth-first search of this subtree.
    pub fn find(&self, id: ObjectId) -> Option<&SceneObject> {
        if self.id == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        if self.id == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Depth-first search by name.
    pub fn find_by_name(&self, name: &str) -> Option<&SceneObject> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_name(name))
    }

    /// Assigns ids and attaches and creates every component, parents before children.
    pub(crate) fn enter_scene(&mut self, next_id: &mut u64, gpu: &Rc<dyn Gpu>) {
        *next_id += 1;
        let id = ObjectId(*next_id);
        self.id = Some(id);
        log::debug!("Object {:?} entered the scene as {id}", self.name);

        for slot in &mut self.components {
            slot.attach_and_create(id, gpu);
        }
        for child in &mut self.children {
            child.enter_scene(next_id, gpu);
        }
    }
}
