//! Wavefront OBJ model import.
//!
//! [`ModelImporter`] turns an OBJ file and its MTL library into a [`SceneObject`] carrying a
//! [`MeshRenderer`] with one mesh per OBJ model. Diffuse textures are decoded with `image`
//! and shared between every material that names the same file, for as long as any of them
//! is alive.

use std::{
    path::Path,
    rc::{Rc, Weak},
};

use fxhash::FxHashMap;
use glam::{Vec2, Vec3, Vec4};

use crate::{
    assets::{AssetError, Assets, resolve_relative},
    gpu::{Gpu, GpuError},
    material::Material,
    mesh::{self, Mesh, Vertex},
    mesh_renderer::MeshRenderer,
    object::SceneObject,
    shader::{Shader, ShaderError, ShaderLoader},
    texture::Texture,
};

pub const DEFAULT_VERTEX_SHADER: &str = "shaders/base.vert";
pub const DEFAULT_FRAGMENT_SHADER: &str = "shaders/base.frag";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("{0} contains no geometry")]
    Empty(String),
}

pub struct ModelImporter {
    gpu: Rc<dyn Gpu>,
    assets: Rc<dyn Assets>,
    shaders: ShaderLoader,
    textures: FxHashMap<String, Weak<Texture>>,
    vertex_shader: String,
    fragment_shader: String,
}

impl ModelImporter {
    pub fn new(gpu: Rc<dyn Gpu>, assets: Rc<dyn Assets>) -> Self {
        Self {
            shaders: ShaderLoader::new(Rc::clone(&gpu), Rc::clone(&assets)),
            gpu,
            assets,
            textures: FxHashMap::default(),
            vertex_shader: DEFAULT_VERTEX_SHADER.to_string(),
            fragment_shader: DEFAULT_FRAGMENT_SHADER.to_string(),
        }
    }

    /// Uses a different program for the materials of imported models.
    pub fn with_shaders(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    /// The program imported materials are drawn with.
    pub fn shader(&mut self) -> Result<Rc<Shader>, ShaderError> {
        self.shaders.load(&self.vertex_shader, &self.fragment_shader)
    }

    /// Imports the model at `path` as an object named after the file, carrying a
    /// [`MeshRenderer`].
    pub fn import(&mut self, path: &str) -> Result<SceneObject, ImportError> {
        let renderer = self.load_renderer(path)?;
        let name = Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        Ok(SceneObject::new(name).with_component(renderer))
    }

    /// Loads the meshes of the model at `path` into a renderer. Material libraries and
    /// textures are looked up relative to it.
    pub fn load_renderer(&mut self, path: &str) -> Result<MeshRenderer, ImportError> {
        let source = self.assets.read(path)?;
        let assets = Rc::clone(&self.assets);
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, materials) =
            tobj::load_obj_buf(&mut source.as_slice(), &options, |mtl: &Path| {
                let mtl_path = resolve_relative(path, &mtl.to_string_lossy());
                match assets.read(&mtl_path) {
                    Ok(bytes) => tobj::load_mtl_buf(&mut bytes.as_slice()),
                    Err(e) => {
                        log::warn!("{e}");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            })
            .map_err(|source| ImportError::Parse {
                path: path.to_string(),
                source,
            })?;
        let materials = materials.unwrap_or_else(|e| {
            log::warn!("No usable materials for {path}: {e}");
            Vec::new()
        });
        log::debug!("{path}: {} models, {} materials", models.len(), materials.len());

        let shader = self.shader()?;
        let materials = materials
            .iter()
            .map(|m| self.material(path, m, &shader))
            .collect::<Result<Vec<_>, _>>()?;

        let mut renderer = MeshRenderer::new();
        for model in &models {
            let material = model
                .mesh
                .material_id
                .and_then(|i| materials.get(i))
                .cloned()
                .unwrap_or_else(|| Material::with_color(Rc::clone(&shader), Material::DEFAULT_COLOR));
            let (vertices, indices) = geometry(&model.mesh);
            if indices.is_empty() {
                log::debug!("Skipping empty model {:?}", model.name);
                continue;
            }
            renderer.add_mesh(Mesh::new(model.name.clone(), vertices, indices, material));
        }
        if renderer.meshes().is_empty() {
            return Err(ImportError::Empty(path.to_string()));
        }
        log::info!("Imported {path} with {} meshes", renderer.meshes().len());
        Ok(renderer)
    }

    fn material(
        &mut self,
        model_path: &str,
        material: &tobj::Material,
        shader: &Rc<Shader>,
    ) -> Result<Material, ImportError> {
        if let Some(texture) = material.diffuse_texture.as_deref() {
            let texture_path = resolve_relative(model_path, texture);
            if let Some(texture) = self.texture(&texture_path)? {
                return Ok(Material::with_texture(Rc::clone(shader), texture));
            }
        }
        let color = match material.diffuse {
            Some([r, g, b]) => Vec4::new(r, g, b, material.dissolve.unwrap_or(1.0)),
            None => Material::DEFAULT_COLOR,
        };
        Ok(Material::with_color(Rc::clone(shader), color))
    }

    /// Returns the texture at `path`, loading it unless a live copy exists. A texture that
    /// cannot be read or decoded yields `None` so the material falls back to its colour.
    fn texture(&mut self, path: &str) -> Result<Option<Rc<Texture>>, ImportError> {
        if let Some(texture) = self.textures.get(path).and_then(Weak::upgrade) {
            log::trace!("Reusing texture {path}");
            return Ok(Some(texture));
        }
        let image = match self.assets.read(path).map(|bytes| image::load_from_memory(&bytes)) {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                log::warn!("Failed to decode texture {path}: {e}");
                return Ok(None);
            }
            Err(e) => {
                log::warn!("{e}");
                return Ok(None);
            }
        };
        let texture = Rc::new(Texture::new(&self.gpu, &image)?);
        log::debug!("Loaded texture {path} ({}x{})", texture.width(), texture.height());

        self.textures.retain(|_, weak| weak.strong_count() > 0);
        self.textures.insert(path.to_string(), Rc::downgrade(&texture));
        Ok(Some(texture))
    }
}

/// Interleaves a single-indexed tobj mesh, computing smooth normals if it has none.
fn geometry(mesh: &tobj::Mesh) -> (Vec<Vertex>, Vec<u32>) {
    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    } else {
        mesh::compute_normals(&positions, &mesh.indices)
    };

    let vertices = positions
        .iter()
        .zip(&normals)
        .enumerate()
        .map(|(i, (&position, &normal))| {
            let uv = mesh
                .texcoords
                .get(i * 2..i * 2 + 2)
                .map(|t| Vec2::new(t[0], t[1]))
                .unwrap_or_default();
            Vertex::new(position, normal, uv)
        })
        .collect();

    let vertex_count = positions.len() as u32;
    let indices = if mesh.indices.iter().all(|&i| i < vertex_count) {
        mesh.indices.clone()
    } else {
        log::warn!("Dropping mesh with out-of-range indices");
        Vec::new()
    };
    (vertices, indices)
}
