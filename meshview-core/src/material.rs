//! Surface materials.

use std::rc::Rc;

use glam::Vec4;

use crate::{shader::Shader, texture::Texture};

/// Where a surface gets its diffuse colour from.
#[derive(Clone)]
pub enum Diffuse {
    /// A texture, possibly shared with other materials.
    Texture(Rc<Texture>),
    /// A flat RGBA colour.
    Color(Vec4),
}

/// Shading parameters of a surface and the program that draws it.
#[derive(Clone)]
pub struct Material {
    diffuse: Diffuse,
    shader: Rc<Shader>,
}

impl Material {
    /// Flat black, the colour used when a model defines no material.
    pub const DEFAULT_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

    pub fn with_texture(shader: Rc<Shader>, texture: Rc<Texture>) -> Self {
        Self {
            diffuse: Diffuse::Texture(texture),
            shader,
        }
    }

    pub fn with_color(shader: Rc<Shader>, color: Vec4) -> Self {
        Self {
            diffuse: Diffuse::Color(color),
            shader,
        }
    }

    pub fn shader(&self) -> &Rc<Shader> {
        &self.shader
    }

    pub fn diffuse(&self) -> &Diffuse {
        &self.diffuse
    }

    pub fn uses_texture(&self) -> bool {
        matches!(self.diffuse, Diffuse::Texture(_))
    }

    /// Binds the diffuse source into the material's program, which must be current.
    ///
    /// Textured materials bind unit 0 and raise the texture flag. Flat materials lower the
    /// flag and push the colour instead.
    pub fn bind(&self) {
        let locations = self.shader.locations();
        match &self.diffuse {
            Diffuse::Texture(texture) => {
                texture.bind(0);
                log::trace!("Bind texture {:?}", texture.id().0);
                self.shader.set(locations.use_diffuse_texture, true);
                self.shader.set(locations.diffuse_texture, 0i32);
            }
            Diffuse::Color(color) => {
                self.shader.set(locations.use_diffuse_texture, false);
                self.shader.set(locations.diffuse_color, *color);
            }
        }
    }

    /// Unbinds the texture bound by [`Material::bind`].
    pub fn unbind(&self) {
        if let Diffuse::Texture(texture) = &self.diffuse {
            log::trace!("Unbind texture {:?}", texture.id().0);
            texture.unbind(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gpu::Gpu,
        headless::{GpuCall, RecordingGpu, UniformValue},
        shader::names,
    };

    #[test]
    fn flat_color_lowers_texture_flag() {
        let recorder = Rc::new(RecordingGpu::new());
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let shader = Rc::new(Shader::new(&gpu, "", "").unwrap());
        let material = Material::with_color(shader, Vec4::new(1.0, 0.5, 0.0, 1.0));

        material.bind();
        material.unbind();

        assert_eq!(
            recorder.uniform(names::USE_DIFFUSE_TEXTURE),
            Some(UniformValue::Int(0))
        );
        assert_eq!(
            recorder.uniform(names::DIFFUSE_COLOR),
            Some(UniformValue::Vec4(Vec4::new(1.0, 0.5, 0.0, 1.0)))
        );
        assert!(
            !recorder
                .calls()
                .iter()
                .any(|c| matches!(c, GpuCall::BindTexture { .. }))
        );
    }

    #[test]
    fn texture_binds_unit_zero_and_unbinds() {
        let recorder = Rc::new(RecordingGpu::new());
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let shader = Rc::new(Shader::new(&gpu, "", "").unwrap());
        let texture = Rc::new(Texture::new_from_data(&gpu, 1, 1, &[0; 4]).unwrap());
        let material = Material::with_texture(shader, Rc::clone(&texture));

        material.bind();
        material.unbind();

        let calls = recorder.calls();
        assert!(calls.contains(&GpuCall::BindTexture {
            unit: 0,
            texture: Some(texture.id())
        }));
        assert_eq!(
            calls.last(),
            Some(&GpuCall::BindTexture {
                unit: 0,
                texture: None
            })
        );
        assert_eq!(
            recorder.uniform(names::USE_DIFFUSE_TEXTURE),
            Some(UniformValue::Int(1))
        );
    }

    #[test]
    fn materials_share_one_texture() {
        let recorder = Rc::new(RecordingGpu::new());
        let gpu: Rc<dyn Gpu> = recorder.clone();
        let shader = Rc::new(Shader::new(&gpu, "", "").unwrap());
        let texture = Rc::new(Texture::new_from_data(&gpu, 1, 1, &[0; 4]).unwrap());
        let id = texture.id();

        let a = Material::with_texture(Rc::clone(&shader), Rc::clone(&texture));
        let b = Material::with_texture(shader, texture);
        drop(a);
        assert!(!recorder.calls().contains(&GpuCall::DeleteTexture(id)));
        drop(b);
        assert!(recorder.calls().contains(&GpuCall::DeleteTexture(id)));
    }
}
