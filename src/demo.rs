//! The demo scene: one imported model, one light and the main camera aimed at the model.

use std::{error::Error, rc::Rc};

use glam::{Vec3, Vec4};
use meshview_core::{
    SceneObject,
    assets::Assets,
    importer::ModelImporter,
    light::{Light, LightComponent},
    material::Material,
    mesh::Mesh,
    mesh_renderer::MeshRenderer,
    primitives,
    scene::Scene,
};

use crate::config::DemoConfig;

const MARKER_RADIUS: f32 = 0.1;

/// Fills `scene` from the configuration.
pub fn create_models(
    scene: &mut Scene,
    assets: &Rc<dyn Assets>,
    config: &DemoConfig,
) -> Result<(), Box<dyn Error>> {
    let mut importer = ModelImporter::new(Rc::clone(scene.gpu()), Rc::clone(assets));
    let renderer = importer
        .load_renderer(&config.model.path)?
        .with_spin(config.model.spin);
    let mut model = SceneObject::new("Model").with_component(renderer);

    let [x, y, z] = config.model.position;
    let [rx, ry, rz] = config.model.rotation;
    let scale = config.model.scale;
    model.transform.set_position(x, y, z);
    model.transform.set_rotation(rx, ry, rz);
    model.transform.set_scale(scale, scale, scale);
    scene.add_object(model)?;

    let light = config.light.light();
    let mut light_object = SceneObject::new(light_name(&light)).with_component(LightComponent::new(light));
    if let Some(position) = config.light.position() {
        light_object.transform.set_position(position.x, position.y, position.z);
        if config.light.marker {
            let shader = importer.shader()?;
            let (vertices, indices) = primitives::sphere(MARKER_RADIUS, 16, 8);
            let color = Vec4::from(config.light.color);
            let marker = Mesh::new("marker", vertices, indices, Material::with_color(shader, color));
            light_object = light_object.with_component(MeshRenderer::new().with_mesh(marker));
        }
    }
    scene.add_object(light_object)?;

    if let Some(camera) = scene.main_camera_mut() {
        camera.set_position(Vec3::from(config.camera.position));
        camera.set_target(Vec3::from(config.camera.target));
    }
    log::info!("Demo scene has {} objects", scene.object_count());
    Ok(())
}

fn light_name(light: &Light) -> &'static str {
    match light {
        Light::Directional(_) => "Sun",
        Light::Point(_) => "Lamp",
        Light::Spot(_) => "Spotlight",
    }
}
