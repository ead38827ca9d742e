//! Board entities: a simulated organism, where it is, and what it looks like

pub mod food;

pub use food::Herb;

use crate::board::assets::AssetHandle;
use crate::core::types::{EntityId, Vec2};
use crate::scene::presentation::{Sprite, Surface};

/// Simulated organism variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Organism {
    Herb(Herb),
}

impl Organism {
    /// Display label
    pub fn label(&self) -> &str {
        match self {
            Organism::Herb(herb) => herb.name(),
        }
    }
}

impl From<Herb> for Organism {
    fn from(herb: Herb) -> Self {
        Organism::Herb(herb)
    }
}

/// A positioned, drawable organism.
///
/// Immutable once built; the board owns it after a successful `add`.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: Organism,
    position: Vec2,
    visual: AssetHandle,
}

impl Entity {
    pub fn new(id: EntityId, kind: impl Into<Organism>, position: Vec2, visual: AssetHandle) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            visual,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> &Organism {
        &self.kind
    }

    pub fn label(&self) -> &str {
        self.kind.label()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn visual(&self) -> &AssetHandle {
        &self.visual
    }

    /// Blit onto `surface`, translating world coordinates by `-offset`.
    pub fn draw(&self, surface: &mut Surface, offset: Vec2) {
        surface.push(Sprite {
            position: self.position - offset,
            visual: self.visual.clone(),
        });
    }
}
