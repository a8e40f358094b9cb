//! Asset sources.
//!
//! Assets are addressed by slash-separated path strings such as `"shaders/base.vert"`. The
//! [`Assets`] trait is the only thing the core needs from the platform's asset storage.

use std::{
    io,
    path::{Path, PathBuf},
};

use fxhash::FxHashMap;

/// Failure to read an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("asset {0} is not valid UTF-8")]
    NotUtf8(String),
}

/// Read access to named assets.
pub trait Assets {
    /// Returns the full contents of the asset at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// Returns the asset at `path` decoded as UTF-8.
    fn read_to_string(&self, path: &str) -> Result<String, AssetError> {
        String::from_utf8(self.read(path)?).map_err(|_| AssetError::NotUtf8(path.to_string()))
    }
}

/// Joins an asset path relative to the directory of `base`.
///
/// ```
/// use meshview_core::assets::resolve_relative;
/// assert_eq!(resolve_relative("models/cube.obj", "cube.mtl"), "models/cube.mtl");
/// assert_eq!(resolve_relative("cube.obj", "tex/a.png"), "tex/a.png");
/// ```
pub fn resolve_relative(base: &str, relative: &str) -> String {
    let relative = relative.replace('\\', "/");
    match base.rfind('/') {
        Some(i) => format!("{}/{}", &base[..i], relative),
        None => relative,
    }
}

/// Assets read from a directory on disk.
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Assets for DirAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => AssetError::NotFound(path.to_string()),
            _ => AssetError::Io {
                path: path.to_string(),
                source,
            },
        })
    }
}

/// Assets held in memory.
#[derive(Default)]
pub struct MemoryAssets {
    files: FxHashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an asset.
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }

    pub fn with(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl Assets for MemoryAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

/// Tries several sources in order. The first source that has the asset wins; errors other
/// than "not found" stop the search.
#[derive(Default)]
pub struct ChainAssets {
    sources: Vec<Box<dyn Assets>>,
}

impl ChainAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, source: impl Assets + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl Assets for ChainAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        for source in &self.sources {
            match source.read(path) {
                Err(AssetError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(AssetError::NotFound(path.to_string()))
    }
}
