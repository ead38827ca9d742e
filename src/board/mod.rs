//! The board: world bounds, loaded assets and every entity in the world

pub mod assets;

pub use assets::{
    AssetData, AssetHandle, AssetKind, AssetRegistry, AssetSource, AssetSpec, BuiltinAssetSource,
    FontHandle, FsAssetSource,
};

use ahash::AHashMap;

use crate::core::config::BoardConfig;
use crate::core::error::{LifyError, Result};
use crate::core::types::{Bounds, EntityId, Rect};
use crate::entity::Entity;
use crate::spatial::SparseHashGrid;

/// Asset load lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
struct LoadFailure {
    name: String,
    reason: String,
}

/// Owning container for all simulated entities
pub struct Board {
    bounds: Bounds,
    manifest: Vec<AssetSpec>,
    source: Box<dyn AssetSource>,
    assets: AssetRegistry,
    load_state: LoadState,
    failure: Option<LoadFailure>,
    entities: AHashMap<EntityId, Entity>,
    grid: SparseHashGrid,
}

impl Board {
    pub fn new(
        bounds: Bounds,
        cell_size: f32,
        manifest: Vec<AssetSpec>,
        source: Box<dyn AssetSource>,
    ) -> Self {
        Self {
            bounds,
            manifest,
            source,
            assets: AssetRegistry::new(),
            load_state: LoadState::Unloaded,
            failure: None,
            entities: AHashMap::new(),
            grid: SparseHashGrid::new(cell_size),
        }
    }

    pub fn from_config(
        config: &BoardConfig,
        manifest: Vec<AssetSpec>,
        source: Box<dyn AssetSource>,
    ) -> Self {
        Self::new(config.bounds(), config.cell_size, manifest, source)
    }

    /// Fetch every asset in the manifest.
    ///
    /// Blocks on the asset source; call it off the render thread. Once the
    /// board is `Loaded` or `Failed`, calling again does not touch the
    /// source: it re-reports the original outcome.
    pub fn load(&mut self) -> Result<()> {
        match self.load_state {
            LoadState::Loaded => {
                tracing::debug!("Board assets already loaded, skipping");
                return Ok(());
            }
            LoadState::Failed => return Err(self.failure_error()),
            LoadState::Unloaded | LoadState::Loading => {}
        }

        self.load_state = LoadState::Loading;
        match AssetRegistry::fetch_all(self.source.as_ref(), &self.manifest) {
            Ok(registry) => {
                tracing::info!("Loaded {} assets", registry.len());
                self.assets = registry;
                self.load_state = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                let failure = match &err {
                    LifyError::AssetLoad { name, reason } => LoadFailure {
                        name: name.clone(),
                        reason: reason.clone(),
                    },
                    other => LoadFailure {
                        name: String::new(),
                        reason: other.to_string(),
                    },
                };
                self.failure = Some(failure);
                self.load_state = LoadState::Failed;
                Err(err)
            }
        }
    }

    fn failure_error(&self) -> LifyError {
        match &self.failure {
            Some(failure) => LifyError::AssetLoad {
                name: failure.name.clone(),
                reason: failure.reason.clone(),
            },
            None => LifyError::AssetLoad {
                name: String::new(),
                reason: "previous load failed".into(),
            },
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Look up a loaded asset by logical name
    pub fn asset(&self, name: &str) -> Result<AssetHandle> {
        if self.load_state != LoadState::Loaded {
            return Err(LifyError::AssetNotFound(name.to_string()));
        }
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| LifyError::AssetNotFound(name.to_string()))
    }

    /// Look up a loaded font by logical name.
    ///
    /// # Panics
    /// If called before assets finished loading.
    pub fn font(&self, name: &str) -> Result<FontHandle> {
        assert!(
            self.load_state == LoadState::Loaded,
            "font {:?} requested while board assets are {:?}",
            name,
            self.load_state
        );
        self.assets
            .font(name)
            .ok_or_else(|| LifyError::AssetNotFound(name.to_string()))
    }

    /// Insert an entity. Either both the id map and the spatial index are
    /// updated, or the board is left untouched.
    pub fn add(&mut self, entity: Entity) -> Result<()> {
        let pos = entity.position();
        if !self.bounds.contains(pos) {
            return Err(LifyError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.bounds.width,
                height: self.bounds.height,
            });
        }
        if self.entities.contains_key(&entity.id()) {
            return Err(LifyError::DuplicateId(entity.id()));
        }

        self.grid.insert(entity.id(), pos);
        self.entities.insert(entity.id(), entity);
        Ok(())
    }

    /// Remove an entity, returning it if it was present
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.grid.remove(id, entity.position());
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Entities whose position lies inside the closed rectangle
    /// `[min_x, max_x] x [min_y, max_y]`.
    ///
    /// The iterator is lazy and read-only; calling again on an unchanged
    /// board yields the same entities in the same order.
    pub fn entities_in(
        &self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    ) -> impl Iterator<Item = &Entity> + '_ {
        self.entities_in_rect(Rect::new(min_x, min_y, max_x, max_y))
    }

    pub fn entities_in_rect(&self, rect: Rect) -> impl Iterator<Item = &Entity> + '_ {
        // Nothing lives outside the bounds; clipping keeps the cell walk finite.
        let clipped = if rect.is_empty() {
            rect
        } else {
            Rect::new(
                rect.min.x.max(0.0),
                rect.min.y.max(0.0),
                rect.max.x.min(self.bounds.width as f32),
                rect.max.y.min(self.bounds.height as f32),
            )
        };
        self.grid
            .query_rect(clipped)
            .filter_map(move |id| self.entities.get(&id))
    }

    /// Every entity, in the same order as a whole-board range query
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities_in_rect(Rect::new(
            0.0,
            0.0,
            self.bounds.width as f32,
            self.bounds.height as f32,
        ))
    }

    /// World extents `(width, height)`
    pub fn bound(&self) -> (u32, u32) {
        (self.bounds.width, self.bounds.height)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("bounds", &self.bounds)
            .field("load_state", &self.load_state)
            .field("assets", &self.assets.len())
            .field("entities", &self.entities.len())
            .finish()
    }
}
