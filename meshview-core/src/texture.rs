//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU-side owner of a GPU texture.
//! Textures are shared between materials through `Rc<Texture>`; the GPU object is deleted when
//! the last reference is dropped.

use std::rc::Rc;

use image::{DynamicImage, GenericImageView};

use crate::gpu::{Gpu, GpuError, TextureId};

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gpu: Rc<dyn Gpu>,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Creates a new texture from the given [`image::DynamicImage`].
    ///
    /// Rows are flipped so that texture coordinate `v = 0` is the bottom of the image, as
    /// OBJ files expect.
    pub fn new(gpu: &Rc<dyn Gpu>, image: &DynamicImage) -> Result<Self, GpuError> {
        let (width, height) = image.dimensions();
        let data = image.flipv().to_rgba8().into_raw();
        Self::new_from_data(gpu, width, height, &data)
    }

    /// Creates a new texture from raw RGBA data.
    pub fn new_from_data(
        gpu: &Rc<dyn Gpu>,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<Self, GpuError> {
        let id = gpu.create_texture(width, height, data)?;
        log::debug!("Created texture {:?} ({width}x{height})", id.0);
        Ok(Self {
            gpu: Rc::clone(gpu),
            id,
            width,
            height,
        })
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        self.gpu.bind_texture(unit, Some(self.id));
    }

    /// Clears the specified texture unit.
    pub fn unbind(&self, unit: u32) {
        self.gpu.bind_texture(unit, None);
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        log::debug!("Deleting texture {:?}", self.id.0);
        self.gpu.delete_texture(self.id);
    }
}
