//! Integration tests for the scene state machine
//!
//! These drive the controller with the headless presentation:
//! - Loading -> ready -> Running on the happy path
//! - quitting during loading, idempotent quit
//! - fatal asset and render failures

use std::time::{Duration, Instant};

use lify::board::{AssetKind, AssetSpec, Board, BuiltinAssetSource};
use lify::core::config::{AssetsConfig, ASSET_FONT_INFO, ASSET_HERB_1};
use lify::core::types::{Bounds, Vec2};
use lify::scene::controller::{LOADED_TEXT, LOADING_TEXT, PROMPT_TEXT};
use lify::scene::{
    Command, Drawable, FramePump, Key, KeyPattern, Layer, Phase, PopulationPlan, SceneController,
    SceneSettings, QUIT_KEY,
};
use lify::ui::HeadlessPresentation;
use tokio::runtime::Runtime;

const SCREEN_W: u32 = 400;
const SCREEN_H: u32 = 300;

fn settings(count: usize) -> SceneSettings {
    SceneSettings {
        population: PopulationPlan {
            count,
            seed: 42,
            visual: ASSET_HERB_1.to_string(),
        },
        viewport_origin: Vec2::new(100.0, 50.0),
        status_font: ASSET_FONT_INFO.to_string(),
    }
}

fn board_with(manifest: Vec<AssetSpec>, width: u32, height: u32) -> Board {
    Board::new(
        Bounds::new(width, height),
        32.0,
        manifest,
        Box::new(BuiltinAssetSource),
    )
}

fn default_board() -> Board {
    board_with(AssetsConfig::default().entries, 1000, 800)
}

/// Pump `update` until `done` holds or the deadline passes
fn wait_until(
    controller: &mut SceneController,
    presentation: &mut HeadlessPresentation,
    done: impl Fn(&SceneController) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(30);
    while Instant::now() < deadline {
        controller.update(presentation);
        if done(controller) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_loading_then_running() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(2_000), rt.handle().clone());

    controller.start(&mut p);
    assert_eq!(controller.phase(), Phase::Loading);
    assert_eq!(p.texts(), vec![LOADING_TEXT.to_string()]);
    assert!(controller.bindings().is_bound(KeyPattern::Key(QUIT_KEY)));
    assert!(!controller.is_ready());
    // board belongs to the population task until it reports back
    assert!(controller.board().is_none());

    // advancing before the task reports does nothing
    controller.handle_key(Key::Enter, &mut p);
    assert_eq!(controller.phase(), Phase::Loading);

    assert!(wait_until(&mut controller, &mut p, |c| c.is_ready()));
    assert_eq!(p.texts(), vec![LOADED_TEXT.to_string(), PROMPT_TEXT.to_string()]);

    let report = controller.report().expect("report after success");
    assert_eq!(report.added, 2_000);
    assert_eq!(report.skipped, 0);
    assert_eq!(controller.board().map(|b| b.len()), Some(2_000));

    controller.handle_key(Key::Char('x'), &mut p);
    assert_eq!(controller.phase(), Phase::Running);
    assert!(p.texts().is_empty());

    // loading bindings were retired: only quit remains
    assert_eq!(controller.bindings().len(), 1);
    assert_eq!(controller.bindings().dispatch(Key::Enter), None);
    assert_eq!(controller.bindings().dispatch(QUIT_KEY), Some(Command::Quit));

    let viewport = controller.viewport(&p);
    let board = controller.board().expect("board handed to render path");
    let expected = board.entities_in_rect(viewport).count();
    assert!(expected > 0);
    assert_eq!(controller.visible_count(), expected);

    let surfaces: Vec<_> = p
        .stack()
        .iter()
        .filter_map(|(_, layer, d)| match d {
            Drawable::Surface(s) => Some((layer, s)),
            Drawable::Text(_) => None,
        })
        .collect();
    assert_eq!(surfaces.len(), 1);
    let (layer, surface) = surfaces[0];
    assert_eq!(layer, Layer::Static);
    assert_eq!((surface.width(), surface.height()), (SCREEN_W, SCREEN_H));
    assert_eq!(surface.sprites().len(), expected);
    for sprite in surface.sprites() {
        assert!(sprite.position.x >= 0.0 && sprite.position.x <= SCREEN_W as f32);
        assert!(sprite.position.y >= 0.0 && sprite.position.y <= SCREEN_H as f32);
    }

    controller.handle_key(Key::Enter, &mut p);
    assert_eq!(controller.phase(), Phase::Running);

    controller.handle_key(Key::Char('Q'), &mut p);
    // presentations report lowercase letters; uppercase is unbound
    assert_eq!(controller.phase(), Phase::Running);
    controller.handle_key(QUIT_KEY, &mut p);
    assert_eq!(controller.phase(), Phase::Quitting);
    assert_eq!(p.shutdowns(), 1);
    assert!(controller.failure().is_none());
}

#[test]
fn test_quit_during_loading() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let board = board_with(AssetsConfig::default().entries, 20_000, 20_000);
    let mut controller = SceneController::new(board, settings(5_000_000), rt.handle().clone());
    let quit = controller.quit_signal();

    controller.start(&mut p);
    controller.handle_key(QUIT_KEY, &mut p);

    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(quit.is_requested());
    assert!(controller.bindings().is_empty());
    assert!(controller.board().is_none());

    // nothing moves once quitting
    for _ in 0..10 {
        controller.update(&mut p);
        controller.handle_key(Key::Enter, &mut p);
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(!controller.is_ready());
    assert!(controller.report().is_none());
    assert_eq!(p.shutdowns(), 1);
}

#[test]
fn test_quit_is_idempotent() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(10), rt.handle().clone());

    controller.start(&mut p);
    controller.quit(&mut p);
    controller.quit(&mut p);
    controller.handle_key(QUIT_KEY, &mut p);
    assert_eq!(controller.phase(), Phase::Quitting);
    assert_eq!(p.shutdowns(), 1);
}

#[test]
fn test_quit_requested_from_another_thread() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(10), rt.handle().clone());
    controller.start(&mut p);

    let quit = controller.quit_signal();
    std::thread::spawn(move || quit.request()).join().unwrap();

    controller.update(&mut p);
    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(p.is_shut_down());
}

#[test]
fn test_quit_key_wins_over_advance() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(100), rt.handle().clone());
    controller.start(&mut p);
    assert!(wait_until(&mut controller, &mut p, |c| c.is_ready()));

    controller.handle_key(QUIT_KEY, &mut p);
    assert_eq!(controller.phase(), Phase::Quitting);
}

#[test]
fn test_asset_load_failure_quits() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let manifest = vec![
        AssetSpec::new(ASSET_FONT_INFO, AssetKind::Font, "info.ttf"),
        AssetSpec::new("moss_3", AssetKind::Image, "moss.png"),
    ];
    let board = board_with(manifest, 100, 100);
    let mut controller = SceneController::new(board, settings(10), rt.handle().clone());

    controller.start(&mut p);
    assert!(wait_until(&mut controller, &mut p, |c| c.phase() == Phase::Quitting));
    let failure = controller.failure().expect("failure recorded");
    assert!(failure.contains("Failed loading assets"), "{}", failure);
    assert!(p.is_shut_down());
}

#[test]
fn test_missing_herb_asset_quits() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let manifest = vec![AssetSpec::new(ASSET_FONT_INFO, AssetKind::Font, "info.ttf")];
    let board = board_with(manifest, 100, 100);
    let mut controller = SceneController::new(board, settings(10), rt.handle().clone());

    controller.start(&mut p);
    assert!(wait_until(&mut controller, &mut p, |c| c.phase() == Phase::Quitting));
    assert!(controller.failure().unwrap().contains("Getting herb asset"));
}

#[test]
fn test_empty_board_quits_with_failure() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let board = board_with(AssetsConfig::default().entries, 0, 100);
    let mut controller = SceneController::new(board, settings(10), rt.handle().clone());

    controller.start(&mut p);
    assert!(wait_until(&mut controller, &mut p, |c| c.phase() == Phase::Quitting));
    let failure = controller.failure().expect("failure recorded");
    assert!(failure.starts_with("Invalid board"), "{}", failure);
    assert!(!failure.contains("task exited"));
}

#[test]
fn test_missing_status_font_quits() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let manifest = vec![AssetSpec::new(ASSET_HERB_1, AssetKind::Image, "herb.png")];
    let board = board_with(manifest, 100, 100);
    let mut controller = SceneController::new(board, settings(10), rt.handle().clone());

    controller.start(&mut p);
    assert!(wait_until(&mut controller, &mut p, |c| c.phase() == Phase::Quitting));
    assert!(controller.failure().unwrap().contains("Getting font asset"));
    assert!(!controller.is_ready());
}

#[test]
fn test_render_failure_on_loading_screen_quits() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    p.fail_draws(true);
    let mut controller = SceneController::new(default_board(), settings(10), rt.handle().clone());

    controller.start(&mut p);
    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(controller.failure().unwrap().contains("Failed rendering text"));
    // the task never started, so the board is still here
    assert!(controller.board().is_some());
}

#[test]
fn test_render_failure_on_entering_running_quits() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(100), rt.handle().clone());
    controller.start(&mut p);
    assert!(wait_until(&mut controller, &mut p, |c| c.is_ready()));

    p.fail_draws(true);
    controller.handle_key(Key::Enter, &mut p);
    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(controller.failure().unwrap().contains("Failed rendering viewport"));
}

#[test]
fn test_frame_pump_exits_on_quit_key() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    p.press(Key::Enter);
    p.press(QUIT_KEY);
    let mut controller = SceneController::new(default_board(), settings(10), rt.handle().clone());

    FramePump::new(240, 240).run(&mut controller, &mut p);

    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(p.presents() >= 1);
    assert_eq!(p.shutdowns(), 1);
}

#[test]
fn test_frame_pump_quits_on_present_failure() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(10), rt.handle().clone());
    controller.start(&mut p);
    p.fail_draws(true);

    FramePump::new(240, 240).run(&mut controller, &mut p);

    assert_eq!(controller.phase(), Phase::Quitting);
    // the status redraw may fail first if population finishes quickly
    assert!(controller.failure().unwrap().starts_with("Failed rendering"));
    assert!(p.is_shut_down());
}

#[test]
fn test_unattended_run_reaches_running() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let mut controller = SceneController::new(default_board(), settings(500), rt.handle().clone());

    FramePump::new(240, 240).run_unattended(&mut controller, &mut p);

    assert_eq!(controller.phase(), Phase::Running);
    assert_eq!(controller.report().map(|r| r.added), Some(500));
    assert!(controller.failure().is_none());
}

#[test]
fn test_unattended_run_reports_load_failure() {
    let rt = Runtime::new().unwrap();
    let mut p = HeadlessPresentation::new(SCREEN_W, SCREEN_H);
    let manifest = vec![AssetSpec::new("moss_3", AssetKind::Image, "moss.png")];
    let mut controller =
        SceneController::new(board_with(manifest, 100, 100), settings(10), rt.handle().clone());

    FramePump::new(240, 240).run_unattended(&mut controller, &mut p);

    // the failure path, not a silent quit: main exits non-zero on this
    assert_eq!(controller.phase(), Phase::Quitting);
    assert!(controller.failure().unwrap().contains("Failed loading assets"));
    assert!(p.is_shut_down());
}
