//! Named font and image assets
//!
//! The board resolves a manifest of [`AssetSpec`]s through an
//! [`AssetSource`] (the asset storage collaborator) and exposes the results
//! as cheap, immutable handles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::{ASSET_FONT_INFO, ASSET_HERB_1};
use crate::core::error::{LifyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Font,
    Image,
}

/// One manifest entry: a logical name and where to find it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    pub kind: AssetKind,
    pub path: PathBuf,
}

impl AssetSpec {
    pub fn new(name: impl Into<String>, kind: AssetKind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
        }
    }
}

/// Decoded asset payload as delivered by a source
#[derive(Clone, PartialEq)]
pub enum AssetData {
    Font { bytes: Vec<u8> },
    Image { width: u32, height: u32, rgba: Vec<u8> },
}

impl AssetData {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetData::Font { .. } => AssetKind::Font,
            AssetData::Image { .. } => AssetKind::Image,
        }
    }
}

impl fmt::Debug for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetData::Font { bytes } => write!(f, "Font({} bytes)", bytes.len()),
            AssetData::Image { width, height, .. } => write!(f, "Image({}x{})", width, height),
        }
    }
}

/// Asset storage collaborator: resolves a manifest entry to its payload.
pub trait AssetSource: Send {
    fn fetch(&self, spec: &AssetSpec) -> Result<AssetData>;
}

#[derive(Debug)]
struct Asset {
    name: String,
    data: AssetData,
    /// Mean opaque colour, used by presentations that cannot blit images
    tint: [u8; 4],
}

/// Shared handle to a loaded asset
#[derive(Debug, Clone)]
pub struct AssetHandle(Arc<Asset>);

impl AssetHandle {
    fn new(name: String, data: AssetData) -> Self {
        let tint = match &data {
            AssetData::Image { rgba, .. } => mean_opaque_color(rgba),
            AssetData::Font { .. } => [255, 255, 255, 255],
        };
        Self(Arc::new(Asset { name, data, tint }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> AssetKind {
        self.0.data.kind()
    }

    pub fn data(&self) -> &AssetData {
        &self.0.data
    }

    /// Pixel size for images, `None` for fonts
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.0.data {
            AssetData::Image { width, height, .. } => Some((*width, *height)),
            AssetData::Font { .. } => None,
        }
    }

    pub fn tint(&self) -> [u8; 4] {
        self.0.tint
    }

    pub fn ptr_eq(&self, other: &AssetHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Handle to a loaded font asset
#[derive(Debug, Clone)]
pub struct FontHandle(AssetHandle);

impl FontHandle {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn asset(&self) -> &AssetHandle {
        &self.0
    }
}

fn mean_opaque_color(rgba: &[u8]) -> [u8; 4] {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for px in rgba.chunks_exact(4).filter(|px| px[3] > 0) {
        sum[0] += px[0] as u64;
        sum[1] += px[1] as u64;
        sum[2] += px[2] as u64;
        count += 1;
    }
    if count == 0 {
        return [0, 0, 0, 0];
    }
    [
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
        255,
    ]
}

/// Name-indexed registry of loaded assets
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: AHashMap<String, AssetHandle>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every manifest entry. All-or-nothing: on the first failure the
    /// partially filled registry is dropped and nothing becomes visible.
    pub fn fetch_all(source: &dyn AssetSource, manifest: &[AssetSpec]) -> Result<Self> {
        let mut assets = AHashMap::with_capacity(manifest.len());
        for spec in manifest {
            let data = source.fetch(spec).map_err(|e| match e {
                LifyError::AssetLoad { .. } => e,
                other => LifyError::AssetLoad {
                    name: spec.name.clone(),
                    reason: other.to_string(),
                },
            })?;
            if data.kind() != spec.kind {
                return Err(LifyError::AssetLoad {
                    name: spec.name.clone(),
                    reason: format!("expected {:?}, source returned {:?}", spec.kind, data.kind()),
                });
            }
            tracing::debug!("Loaded asset {} ({:?})", spec.name, data);
            assets.insert(spec.name.clone(), AssetHandle::new(spec.name.clone(), data));
        }
        Ok(Self { assets })
    }

    pub fn get(&self, name: &str) -> Option<&AssetHandle> {
        self.assets.get(name)
    }

    pub fn font(&self, name: &str) -> Option<FontHandle> {
        self.assets
            .get(name)
            .filter(|handle| handle.kind() == AssetKind::Font)
            .map(|handle| FontHandle(handle.clone()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Reads assets from files below a root directory
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn fetch(&self, spec: &AssetSpec) -> Result<AssetData> {
        let path = self.root.join(&spec.path);
        let bytes = std::fs::read(&path).map_err(|e| LifyError::AssetLoad {
            name: spec.name.clone(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        match spec.kind {
            AssetKind::Font => {
                if bytes.is_empty() {
                    return Err(LifyError::AssetLoad {
                        name: spec.name.clone(),
                        reason: format!("{}: font file is empty", path.display()),
                    });
                }
                Ok(AssetData::Font { bytes })
            }
            AssetKind::Image => {
                let img = image::load_from_memory(&bytes).map_err(|e| LifyError::AssetLoad {
                    name: spec.name.clone(),
                    reason: format!("{}: {}", path.display(), e),
                })?;
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                Ok(AssetData::Image {
                    width,
                    height,
                    rgba: rgba.into_raw(),
                })
            }
        }
    }
}

/// Side length of the generated herb sprite
const BUILTIN_SPRITE_SIZE: u32 = 8;

/// Serves generated placeholders for the default manifest so the binary
/// runs without an asset directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAssetSource;

impl AssetSource for BuiltinAssetSource {
    fn fetch(&self, spec: &AssetSpec) -> Result<AssetData> {
        match (spec.name.as_str(), spec.kind) {
            (ASSET_FONT_INFO, AssetKind::Font) => Ok(AssetData::Font {
                bytes: b"builtin:monospace:16".to_vec(),
            }),
            (ASSET_HERB_1, AssetKind::Image) => Ok(herb_sprite()),
            _ => Err(LifyError::AssetLoad {
                name: spec.name.clone(),
                reason: "no builtin asset with that name".into(),
            }),
        }
    }
}

/// Green diamond on a transparent background
fn herb_sprite() -> AssetData {
    let size = BUILTIN_SPRITE_SIZE;
    let half = size as i32 / 2;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let inside = (x - half).abs() + (y - half).abs() <= half;
            if inside {
                rgba.extend_from_slice(&[46, 160, 67, 255]);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    AssetData::Image {
        width: size,
        height: size,
        rgba,
    }
}
