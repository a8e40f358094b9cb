//! Lights and their uniform binding protocol.
//!
//! Every light kind binds the shared [`BaseLight`] parameters first and then its own. A draw
//! call binds exactly one light; there is no accumulation over several lights.

use glam::{Mat4, Vec3, Vec4};

use crate::{component::Component, shader::Shader};

/// Value of the light-type uniform when no specific kind has been bound.
pub const LIGHT_TYPE_BASE: i32 = 0;
pub const LIGHT_TYPE_DIRECTIONAL: i32 = 1;
pub const LIGHT_TYPE_POINT: i32 = 2;
pub const LIGHT_TYPE_SPOT: i32 = 3;

/// Spaces a light is bound relative to.
///
/// Lighting is computed in the drawn mesh's local space, so positions and directions are
/// brought into it with `world_to_local`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSpace {
    /// Camera position in the mesh's local space.
    pub camera_local_pos: Vec3,
    /// Inverse of the mesh's world matrix.
    pub world_to_local: Mat4,
    /// World position of the object carrying the light.
    pub light_world_pos: Vec3,
}

impl LightSpace {
    fn local_point(&self, p: Vec3) -> Vec3 {
        self.world_to_local.transform_point3(p)
    }

    fn local_direction(&self, d: Vec3) -> Vec3 {
        self.world_to_local.transform_vector3(d).normalize_or_zero()
    }
}

/// Parameters every light has.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseLight {
    pub color: Vec4,
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
}

impl Default for BaseLight {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            ambient_intensity: 1.0,
            diffuse_intensity: 1.0,
        }
    }
}

impl BaseLight {
    /// Pushes colour, intensities, the type discriminant and the camera position.
    pub fn bind(&self, shader: &Shader, light_type: i32, camera_local_pos: Vec3) {
        let loc = shader.locations();
        shader.set(loc.light_color, self.color.truncate());
        shader.set(loc.ambient_intensity, self.ambient_intensity);
        shader.set(loc.diffuse_intensity, self.diffuse_intensity);
        shader.set(loc.light_type, light_type);
        shader.set(loc.camera_local_pos, camera_local_pos);
    }
}

/// Distance falloff: `1 / (constant + linear * d + exp * d^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub exp: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            exp: 0.0,
        }
    }
}

impl Attenuation {
    fn bind(&self, shader: &Shader) {
        let loc = shader.locations();
        shader.set(loc.atten_constant, self.constant);
        shader.set(loc.atten_linear, self.linear);
        shader.set(loc.atten_exp, self.exp);
    }
}

/// Parallel light from infinitely far away.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub base: BaseLight,
    /// World-space direction the light travels in.
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            base: BaseLight::default(),
            direction: Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

impl DirectionalLight {
    pub fn bind(&self, shader: &Shader, space: &LightSpace) {
        self.base
            .bind(shader, LIGHT_TYPE_DIRECTIONAL, space.camera_local_pos);
        shader.set(
            shader.locations().light_direction,
            space.local_direction(self.direction),
        );
    }
}

/// Light radiating from the owning object's position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointLight {
    pub base: BaseLight,
    pub attenuation: Attenuation,
}

impl PointLight {
    pub fn bind(&self, shader: &Shader, space: &LightSpace) {
        self.base
            .bind(shader, LIGHT_TYPE_POINT, space.camera_local_pos);
        shader.set(
            shader.locations().light_local_pos,
            space.local_point(space.light_world_pos),
        );
        self.attenuation.bind(shader);
    }
}

/// Cone of light from the owning object's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub base: BaseLight,
    pub attenuation: Attenuation,
    /// World-space direction of the cone axis.
    pub direction: Vec3,
    /// Half-angle of the cone in degrees.
    pub cutoff: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            base: BaseLight::default(),
            attenuation: Attenuation::default(),
            direction: Vec3::new(0.0, -1.0, 0.0),
            cutoff: 20.0,
        }
    }
}

impl SpotLight {
    /// Binds like a point light, then the cone axis and the cosine of the cutoff angle.
    pub fn bind(&self, shader: &Shader, space: &LightSpace) {
        self.base
            .bind(shader, LIGHT_TYPE_SPOT, space.camera_local_pos);
        let loc = shader.locations();
        shader.set(loc.light_local_pos, space.local_point(space.light_world_pos));
        shader.set(loc.light_direction, space.local_direction(self.direction));
        self.attenuation.bind(shader);
        shader.set(loc.cutoff, self.cutoff.to_radians().cos());
    }
}

/// One of the supported light kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    /// Binds the light into `shader`, which must be the current program.
    pub fn bind(&self, shader: &Shader, space: &LightSpace) {
        match self {
            Light::Directional(l) => l.bind(shader, space),
            Light::Point(l) => l.bind(shader, space),
            Light::Spot(l) => l.bind(shader, space),
        }
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

/// The light selected for a frame and where its object sits in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveLight {
    pub light: Light,
    pub world: Mat4,
}

impl ActiveLight {
    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

/// Component that puts a [`Light`] into the scene at its owner's position.
pub struct LightComponent {
    light: Light,
}

impl LightComponent {
    pub fn new(light: impl Into<Light>) -> Self {
        Self {
            light: light.into(),
        }
    }
}

impl Component for LightComponent {
    fn name(&self) -> &str {
        match self.light {
            Light::Directional(_) => "DirectionalLight",
            Light::Point(_) => "PointLight",
            Light::Spot(_) => "SpotLight",
        }
    }

    fn light(&self) -> Option<Light> {
        Some(self.light)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        gpu::Gpu,
        headless::{RecordingGpu, UniformValue},
        shader::names,
    };

    fn shader(recorder: &Rc<RecordingGpu>) -> Shader {
        let gpu: Rc<dyn Gpu> = recorder.clone();
        Shader::new(&gpu, "", "").unwrap()
    }

    fn space() -> LightSpace {
        LightSpace {
            camera_local_pos: Vec3::new(0.0, 4.0, 0.0),
            world_to_local: Mat4::from_translation(Vec3::new(0.0, 0.0, -4.0)),
            light_world_pos: Vec3::new(2.0, 0.0, 12.0),
        }
    }

    #[test]
    fn directional_binds_base_then_direction() {
        let recorder = Rc::new(RecordingGpu::new());
        let shader = shader(&recorder);
        let light = DirectionalLight {
            base: BaseLight {
                color: Vec4::new(1.0, 0.5, 0.25, 1.0),
                ambient_intensity: 0.8,
                diffuse_intensity: 1.0,
            },
            direction: Vec3::new(0.0, 0.0, 2.0),
        };

        Light::from(light).bind(&shader, &space());

        let writes: Vec<String> = recorder.uniform_writes().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            writes,
            [
                names::LIGHT_COLOR,
                names::AMBIENT_INTENSITY,
                names::DIFFUSE_INTENSITY,
                names::LIGHT_TYPE,
                names::CAMERA_LOCAL_POS,
                names::LIGHT_DIRECTION,
            ]
        );
        assert_eq!(
            recorder.uniform(names::LIGHT_COLOR),
            Some(UniformValue::Vec3(Vec3::new(1.0, 0.5, 0.25)))
        );
        assert_eq!(
            recorder.uniform(names::LIGHT_TYPE),
            Some(UniformValue::Int(LIGHT_TYPE_DIRECTIONAL))
        );
        assert_eq!(
            recorder.uniform(names::LIGHT_DIRECTION),
            Some(UniformValue::Vec3(Vec3::Z))
        );
    }

    #[test]
    fn point_light_position_is_in_mesh_space() {
        let recorder = Rc::new(RecordingGpu::new());
        let shader = shader(&recorder);
        let light = PointLight {
            attenuation: Attenuation {
                constant: 0.9,
                linear: 0.01,
                exp: 0.0,
            },
            ..Default::default()
        };

        Light::from(light).bind(&shader, &space());

        assert_eq!(
            recorder.uniform(names::LIGHT_LOCAL_POS),
            Some(UniformValue::Vec3(Vec3::new(2.0, 0.0, 8.0)))
        );
        assert_eq!(
            recorder.uniform(names::ATTEN_CONSTANT),
            Some(UniformValue::Float(0.9))
        );
        assert_eq!(
            recorder.uniform(names::LIGHT_TYPE),
            Some(UniformValue::Int(LIGHT_TYPE_POINT))
        );
    }

    #[test]
    fn spot_light_pushes_cosine_cutoff() {
        let recorder = Rc::new(RecordingGpu::new());
        let shader = shader(&recorder);
        let light = SpotLight {
            cutoff: 60.0,
            ..Default::default()
        };

        Light::from(light).bind(&shader, &space());

        let Some(UniformValue::Float(cutoff)) = recorder.uniform(names::CUTOFF) else {
            panic!("cutoff not written");
        };
        assert!((cutoff - 0.5).abs() < 1e-6);
        assert_eq!(
            recorder.uniform(names::LIGHT_TYPE),
            Some(UniformValue::Int(LIGHT_TYPE_SPOT))
        );
    }

    #[test]
    fn missing_uniforms_are_skipped() {
        let recorder = Rc::new(RecordingGpu::with_missing_uniforms(&[
            names::LIGHT_COLOR,
            names::CUTOFF,
            names::ATTEN_LINEAR,
        ]));
        let shader = shader(&recorder);

        Light::from(SpotLight::default()).bind(&shader, &space());

        let writes: Vec<String> = recorder.uniform_writes().into_iter().map(|(n, _)| n).collect();
        assert!(!writes.iter().any(|n| n == names::LIGHT_COLOR));
        assert!(!writes.iter().any(|n| n == names::CUTOFF));
        assert!(!writes.iter().any(|n| n == names::ATTEN_LINEAR));
        assert!(writes.iter().any(|n| n == names::AMBIENT_INTENSITY));
        assert!(writes.iter().any(|n| n == names::ATTEN_EXP));
    }
}
