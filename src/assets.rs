//! Assets built into the binary.

use std::path::PathBuf;

use include_dir::{Dir, include_dir};
use meshview_core::assets::{AssetError, Assets, ChainAssets, DirAssets};

static EMBEDDED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// The `assets/` directory of this crate, compiled in.
pub struct EmbeddedAssets;

impl Assets for EmbeddedAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        EMBEDDED
            .get_file(path)
            .map(|file| file.contents().to_vec())
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

/// Looks in `dir` first, if given, then in the embedded assets.
pub fn sources(dir: Option<PathBuf>) -> ChainAssets {
    let mut chain = ChainAssets::new();
    if let Some(dir) = dir {
        log::info!("Reading assets from {} before built-in ones", dir.display());
        chain = chain.push(DirAssets::new(dir));
    }
    chain.push(EmbeddedAssets)
}
