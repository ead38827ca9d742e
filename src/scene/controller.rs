//! Scene state machine: Loading -> Running -> Quitting
//!
//! | From    | Event                        | To       |
//! |---------|------------------------------|----------|
//! | Loading | quit key                     | Quitting |
//! | Loading | population success           | Loading (advance armed) |
//! | Loading | population/asset failure     | Quitting |
//! | Loading | any key once armed           | Running  |
//! | Running | quit key                     | Quitting |
//! | Running | render failure               | Quitting |

use tokio::runtime::Handle;

use crate::board::Board;
use crate::core::config::{AppConfig, ASSET_FONT_INFO, ASSET_HERB_1};
use crate::core::error::{LifyError, Result};
use crate::core::types::{Rect, Vec2};
use crate::scene::input::{BindingTable, Command, Key, KeyPattern, QUIT_KEY};
use crate::scene::population::{
    PopulationPlan, PopulationReport, PopulationTask, QuitSignal, TaskStatus,
};
use crate::scene::presentation::{
    centre, Axis, Color, DrawId, Drawable, Layer, Presentation, Surface, Text,
};

pub const LOADING_TEXT: &str = "Loading assets...";
pub const LOADED_TEXT: &str = "Assets have been loaded";
pub const PROMPT_TEXT: &str = "Press Enter to start, or press Q to quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Running,
    Quitting,
}

impl Phase {
    /// Scene name, as it appears in logs
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading_scene",
            Phase::Running => "lify_scene",
            Phase::Quitting => "quit",
        }
    }
}

/// Everything the controller needs besides the board
#[derive(Debug, Clone)]
pub struct SceneSettings {
    pub population: PopulationPlan,
    /// World position of the viewport's top-left corner
    pub viewport_origin: Vec2,
    pub status_font: String,
}

impl SceneSettings {
    pub fn from_config(config: &AppConfig, seed: u64) -> Self {
        Self {
            population: PopulationPlan {
                count: config.population.count,
                seed,
                visual: ASSET_HERB_1.to_string(),
            },
            viewport_origin: config.viewport.origin(),
            status_font: ASSET_FONT_INFO.to_string(),
        }
    }
}

/// Who holds the board right now
enum BoardSlot {
    /// Before the loading phase starts
    Idle(Board),
    /// Moved into the background task
    Populating(PopulationTask),
    /// Handed back; only the event loop touches it from here on
    Ready(Board),
    /// Dropped with a failed or abandoned task
    Gone,
}

/// Two-phase scene controller owning the single board
pub struct SceneController {
    settings: SceneSettings,
    phase: Phase,
    started: bool,
    slot: BoardSlot,
    bindings: BindingTable,
    quit: QuitSignal,
    runtime: Handle,
    status: Option<(DrawId, Text)>,
    report: Option<PopulationReport>,
    visible: usize,
    failure: Option<String>,
}

impl SceneController {
    pub fn new(board: Board, settings: SceneSettings, runtime: Handle) -> Self {
        Self {
            settings,
            phase: Phase::Loading,
            started: false,
            slot: BoardSlot::Idle(board),
            bindings: BindingTable::new(),
            quit: QuitSignal::new(),
            runtime,
            status: None,
            report: None,
            visible: 0,
            failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Shared quit request; usable from any thread
    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }

    /// The board, when the event loop owns it
    pub fn board(&self) -> Option<&Board> {
        match &self.slot {
            BoardSlot::Idle(board) | BoardSlot::Ready(board) => Some(board),
            BoardSlot::Populating(_) | BoardSlot::Gone => None,
        }
    }

    /// Population finished and the advance binding is armed
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Loading && self.bindings.is_bound(KeyPattern::Any)
    }

    pub fn report(&self) -> Option<PopulationReport> {
        self.report
    }

    /// Entities drawn when the running phase started
    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Set when the controller quit because of an unrecoverable error
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn viewport<P: Presentation + ?Sized>(&self, presentation: &P) -> Rect {
        let (width, height) = presentation.screen_size();
        Rect::from_origin(self.settings.viewport_origin, width as f32, height as f32)
    }

    /// Enter the loading phase and launch the population task
    pub fn start<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        if self.started {
            tracing::warn!("Scene controller already started");
            return;
        }
        self.started = true;
        if self.phase == Phase::Quitting {
            return;
        }
        tracing::info!("Entering {}", self.phase.name());

        self.bindings.retire_all();
        self.bindings.bind(KeyPattern::Key(QUIT_KEY), Command::Quit);

        let mut title = Text::new(LOADING_TEXT, Vec2::ZERO);
        centre(presentation, &mut title, Axis::XY);
        match presentation.draw(Layer::Dynamic, Drawable::Text(title.clone())) {
            Ok(id) => self.status = Some((id, title)),
            Err(err) => {
                self.fail(presentation, "Failed rendering text", err);
                return;
            }
        }

        match std::mem::replace(&mut self.slot, BoardSlot::Gone) {
            BoardSlot::Idle(board) => {
                let task = PopulationTask::spawn(
                    &self.runtime,
                    board,
                    self.settings.population.clone(),
                    self.quit.clone(),
                );
                self.slot = BoardSlot::Populating(task);
            }
            other => self.slot = other,
        }
    }

    /// Route one key press through the active bindings
    pub fn handle_key<P: Presentation + ?Sized>(&mut self, key: Key, presentation: &mut P) {
        if self.phase == Phase::Quitting {
            return;
        }
        match self.bindings.dispatch(key) {
            Some(Command::Quit) => self.quit(presentation),
            Some(Command::Advance) => self.advance(presentation),
            None => tracing::trace!("Unbound key {:?} in {}", key, self.phase.name()),
        }
    }

    /// Per-frame work on the event loop
    pub fn update<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        if self.phase == Phase::Quitting {
            return;
        }
        if self.quit.is_requested() {
            self.quit(presentation);
            return;
        }

        let status = match &mut self.slot {
            BoardSlot::Populating(task) => task.poll(),
            _ => return,
        };

        match status {
            TaskStatus::Pending => {}
            TaskStatus::Done(Ok((board, report))) => {
                self.slot = BoardSlot::Ready(board);
                self.report = Some(report);
                self.population_ready(presentation);
            }
            TaskStatus::Done(Err(err)) => {
                self.slot = BoardSlot::Gone;
                let context = match err {
                    LifyError::AssetNotFound(_) => "Getting herb asset",
                    LifyError::Config(_) => "Invalid board",
                    _ => "Failed loading assets",
                };
                self.fail(presentation, context, err);
            }
            TaskStatus::Lost => {
                self.slot = BoardSlot::Gone;
                self.fail(
                    presentation,
                    "Population task ended",
                    LifyError::AssetLoad {
                        name: String::new(),
                        reason: "task exited without reporting".into(),
                    },
                );
            }
        }
    }

    /// Terminal transition. Safe to call repeatedly and from any phase.
    pub fn quit<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        if self.phase == Phase::Quitting {
            return;
        }
        self.quit.request();
        tracing::info!("Quitting from {}", self.phase.name());
        self.phase = Phase::Quitting;
        self.bindings.retire_all();
        if matches!(self.slot, BoardSlot::Populating(_)) {
            // the task sees the quit signal and stops inserting
            self.slot = BoardSlot::Gone;
        }
        presentation.shutdown();
    }

    /// Report a failed present/poll from the frame pump
    pub fn render_failed<P: Presentation + ?Sized>(&mut self, presentation: &mut P, err: LifyError) {
        self.fail(presentation, "Failed rendering frame", err);
    }

    fn fail<P: Presentation + ?Sized>(&mut self, presentation: &mut P, context: &str, err: LifyError) {
        tracing::error!("{}: {}", context, err);
        if self.failure.is_none() {
            self.failure = Some(format!("{}: {}", context, err));
        }
        self.quit(presentation);
    }

    fn population_ready<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        if let Err(err) = self.show_loaded(presentation) {
            let context = match err {
                LifyError::Render(_) => "Failed rendering text",
                _ => "Getting font asset",
            };
            self.fail(presentation, context, err);
            return;
        }
        self.bindings.bind(KeyPattern::Any, Command::Advance);
        tracing::info!("Assets loaded, waiting for key press");
    }

    fn show_loaded<P: Presentation + ?Sized>(&mut self, presentation: &mut P) -> Result<()> {
        let font = match &self.slot {
            BoardSlot::Ready(board) => board.font(&self.settings.status_font)?,
            _ => return Err(LifyError::AssetNotFound(self.settings.status_font.clone())),
        };

        if let Some((id, mut title)) = self.status.take() {
            title.content = LOADED_TEXT.to_string();
            title.font = Some(font.clone());
            centre(presentation, &mut title, Axis::XY);
            presentation.redraw(id, Drawable::Text(title.clone()))?;
            self.status = Some((id, title));
        }

        let (_, height) = presentation.screen_size();
        let mut prompt = Text::new(PROMPT_TEXT, Vec2::new(0.0, (height * 3 / 4) as f32)).with_font(font);
        centre(presentation, &mut prompt, Axis::X);
        presentation.draw(Layer::Dynamic, Drawable::Text(prompt))?;
        Ok(())
    }

    fn advance<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        if self.phase != Phase::Loading || !matches!(self.slot, BoardSlot::Ready(_)) {
            return;
        }
        tracing::info!("Leaving {}", self.phase.name());
        presentation.clear();
        self.status = None;
        self.phase = Phase::Running;
        tracing::info!("Entering {}", self.phase.name());

        self.bindings.retire_all();
        self.bindings.bind(KeyPattern::Key(QUIT_KEY), Command::Quit);

        if let Err(err) = self.render_viewport(presentation) {
            self.fail(presentation, "Failed rendering viewport", err);
        }
    }

    fn render_viewport<P: Presentation + ?Sized>(&mut self, presentation: &mut P) -> Result<()> {
        let (width, height) = presentation.screen_size();
        let viewport = self.viewport(presentation);
        let mut screen = Surface::new(width, height, Color::TRANSPARENT);

        let BoardSlot::Ready(board) = &self.slot else {
            return Err(LifyError::Render("board is not available".into()));
        };
        let mut visible = 0;
        for entity in board.entities_in_rect(viewport) {
            entity.draw(&mut screen, viewport.min);
            visible += 1;
        }
        self.visible = visible;
        tracing::info!(
            "Viewport ({}, {})-({}, {}) shows {} of {} entities",
            viewport.min.x,
            viewport.min.y,
            viewport.max.x,
            viewport.max.y,
            visible,
            board.len()
        );

        presentation.draw(Layer::Static, Drawable::Surface(screen))?;
        Ok(())
    }
}

impl std::fmt::Debug for SceneController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("phase", &self.phase)
            .field("ready", &self.is_ready())
            .field("visible", &self.visible)
            .finish()
    }
}
