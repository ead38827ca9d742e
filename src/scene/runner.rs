//! Frame pump: the single cooperative loop that feeds input to the
//! controller, polls the population task and redraws.

use std::time::{Duration, Instant};

use crate::core::config::UiConfig;
use crate::scene::controller::{Phase, SceneController};
use crate::scene::input::Key;
use crate::scene::presentation::Presentation;

#[derive(Debug, Clone, Copy)]
pub struct FramePump {
    /// Input/update period
    frame: Duration,
    /// Redraw period
    draw_frame: Duration,
}

impl FramePump {
    pub fn new(frame_rate: u32, draw_frame_rate: u32) -> Self {
        Self {
            frame: Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64),
            draw_frame: Duration::from_secs_f64(1.0 / draw_frame_rate.max(1) as f64),
        }
    }

    pub fn from_config(ui: &UiConfig) -> Self {
        Self::new(ui.frame_rate, ui.draw_frame_rate)
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Run until the controller reaches `Quitting`.
    pub fn run<P: Presentation + ?Sized>(&self, controller: &mut SceneController, presentation: &mut P) {
        controller.start(presentation);
        let mut last_draw: Option<Instant> = None;

        while controller.phase() != Phase::Quitting {
            let frame_start = Instant::now();

            match presentation.poll_key(self.frame) {
                Ok(Some(key)) => controller.handle_key(key, presentation),
                Ok(None) => {}
                Err(err) => {
                    controller.render_failed(presentation, err);
                    break;
                }
            }

            controller.update(presentation);
            if controller.phase() == Phase::Quitting {
                break;
            }

            if last_draw.map_or(true, |t| t.elapsed() >= self.draw_frame) {
                if let Err(err) = presentation.present() {
                    controller.render_failed(presentation, err);
                    break;
                }
                last_draw = Some(Instant::now());
            }

            // poll_key may return early on input; keep the update rate bounded
            let spent = frame_start.elapsed();
            if spent < self.frame {
                std::thread::sleep(self.frame - spent);
            }
        }
    }
}

impl FramePump {
    /// Drive the scene without a user: start, wait for population, advance.
    ///
    /// Returns once the controller is Running or Quitting. There is no
    /// deadline; loading ends by success, failure or a quit request.
    pub fn run_unattended<P: Presentation + ?Sized>(
        &self,
        controller: &mut SceneController,
        presentation: &mut P,
    ) {
        controller.start(presentation);
        while controller.phase() == Phase::Loading && !controller.is_ready() {
            controller.update(presentation);
            std::thread::sleep(self.frame);
        }
        if controller.is_ready() {
            controller.handle_key(Key::Enter, presentation);
        }
    }
}
