//! Background population: load assets, generate herbs, insert them.
//!
//! The task owns the board while it runs and hands it back through a
//! one-shot channel. The event loop can only read the board after it has
//! received that message, so every `add` happens-before the first query.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::board::assets::AssetHandle;
use crate::board::Board;
use crate::core::error::{LifyError, Result};
use crate::core::types::{Bounds, EntityId, Vec2};
use crate::entity::{Entity, Herb};

/// Process-wide quit request. Cloneable, idempotent.
#[derive(Debug, Clone, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the first request
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What to generate
#[derive(Debug, Clone)]
pub struct PopulationPlan {
    pub count: usize,
    pub seed: u64,
    /// Asset name of the herb sprite
    pub visual: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationReport {
    pub added: usize,
    pub skipped: usize,
    /// Stopped early because quit was requested
    pub cancelled: bool,
}

/// Herbs at uniformly random integer positions inside `bounds`, with ids
/// taken from a counter starting at zero. Empty bounds yield nothing.
pub fn generate_herbs(
    count: usize,
    seed: u64,
    bounds: Bounds,
    visual: AssetHandle,
) -> impl Iterator<Item = Entity> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let count = if bounds.is_empty() { 0 } else { count };
    (0..count).map(move |i| {
        let position = Vec2::new(
            rng.gen_range(0..bounds.width) as f32,
            rng.gen_range(0..bounds.height) as f32,
        );
        Entity::new(
            EntityId(i as u64),
            Herb::new(format!("Herb #{}", i)),
            position,
            visual.clone(),
        )
    })
}

/// Insert `entities` one by one. Rejected entities are logged and skipped;
/// a quit request stops insertion before the next entity.
pub fn populate(
    board: &mut Board,
    entities: impl IntoIterator<Item = Entity>,
    quit: &QuitSignal,
) -> PopulationReport {
    let mut report = PopulationReport::default();
    for entity in entities {
        if quit.is_requested() {
            report.cancelled = true;
            break;
        }
        let id = entity.id();
        let pos = entity.position();
        match board.add(entity) {
            Ok(()) => report.added += 1,
            Err(err) => {
                tracing::warn!("Failed adding {} at ({}, {}): {}", id, pos.x, pos.y, err);
                report.skipped += 1;
            }
        }
    }
    report
}

/// Full population pass: load assets, resolve the sprite, insert herbs.
pub fn run_population(board: &mut Board, plan: &PopulationPlan, quit: &QuitSignal) -> Result<PopulationReport> {
    let bounds = board.bounds();
    if bounds.is_empty() {
        return Err(LifyError::Config(format!(
            "board {}x{} has no room for entities",
            bounds.width, bounds.height
        )));
    }
    board.load()?;
    let visual = board.asset(&plan.visual)?;
    let herbs = generate_herbs(plan.count, plan.seed, board.bounds(), visual);
    let report = populate(board, herbs, quit);
    tracing::info!(
        "Population finished: {} added, {} skipped{}",
        report.added,
        report.skipped,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(report)
}

pub type PopulationOutcome = Result<(Board, PopulationReport)>;

#[derive(Debug)]
pub enum TaskStatus {
    Pending,
    Done(PopulationOutcome),
    /// The task ended without reporting (it panicked)
    Lost,
}

/// Handle to the one background population task of a loading phase.
///
/// The blocking task is detached; only its completion message is kept.
#[derive(Debug)]
pub struct PopulationTask {
    receiver: oneshot::Receiver<PopulationOutcome>,
}

impl PopulationTask {
    pub fn spawn(runtime: &Handle, mut board: Board, plan: PopulationPlan, quit: QuitSignal) -> Self {
        let (sender, receiver) = oneshot::channel();
        runtime.spawn_blocking(move || {
            let outcome = run_population(&mut board, &plan, &quit).map(move |report| (board, report));
            if sender.send(outcome).is_err() {
                tracing::debug!("Population result dropped, scene already gone");
            }
        });
        Self { receiver }
    }

    /// Non-blocking check for the completion message
    pub fn poll(&mut self) -> TaskStatus {
        match self.receiver.try_recv() {
            Ok(outcome) => TaskStatus::Done(outcome),
            Err(TryRecvError::Empty) => TaskStatus::Pending,
            Err(TryRecvError::Closed) => TaskStatus::Lost,
        }
    }
}
