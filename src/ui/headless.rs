//! Presentation without a screen: records draws, replays scripted keys.

use std::collections::VecDeque;
use std::time::Duration;

use crate::core::error::{LifyError, Result};
use crate::core::types::Vec2;
use crate::scene::input::Key;
use crate::scene::presentation::{DrawId, DrawStack, Drawable, Layer, Presentation, Text};

/// Nominal glyph cell of the built-in font
const GLYPH_WIDTH: f32 = 8.0;
const GLYPH_HEIGHT: f32 = 16.0;

#[derive(Debug)]
pub struct HeadlessPresentation {
    width: u32,
    height: u32,
    stack: DrawStack,
    keys: VecDeque<Key>,
    presents: usize,
    shutdowns: usize,
    fail_draws: bool,
}

impl HeadlessPresentation {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stack: DrawStack::new(),
            keys: VecDeque::new(),
            presents: 0,
            shutdowns: 0,
            fail_draws: false,
        }
    }

    /// Queue a key for `poll_key`
    pub fn press(&mut self, key: Key) {
        self.keys.push_back(key);
    }

    /// Make every subsequent `draw`/`redraw`/`present` fail
    pub fn fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    pub fn stack(&self) -> &DrawStack {
        &self.stack
    }

    /// Contents of every text label, in composite order
    pub fn texts(&self) -> Vec<String> {
        self.stack
            .iter()
            .filter_map(|(_, _, d)| match d {
                Drawable::Text(t) => Some(t.content.clone()),
                Drawable::Surface(_) => None,
            })
            .collect()
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdowns > 0
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns
    }

    fn check(&self) -> Result<()> {
        if self.fail_draws {
            return Err(LifyError::Render("headless draw failure".into()));
        }
        Ok(())
    }
}

impl Presentation for HeadlessPresentation {
    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn text_extent(&self, text: &Text) -> Vec2 {
        Vec2::new(text.content.chars().count() as f32 * GLYPH_WIDTH, GLYPH_HEIGHT)
    }

    fn draw(&mut self, layer: Layer, drawable: Drawable) -> Result<DrawId> {
        self.check()?;
        Ok(self.stack.push(layer, drawable))
    }

    fn redraw(&mut self, id: DrawId, drawable: Drawable) -> Result<()> {
        self.check()?;
        self.stack.replace(id, drawable)
    }

    fn clear(&mut self) {
        self.stack.clear();
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        match self.keys.pop_front() {
            Some(key) => Ok(Some(key)),
            None => {
                std::thread::sleep(timeout.min(Duration::from_millis(1)));
                Ok(None)
            }
        }
    }

    fn present(&mut self) -> Result<()> {
        self.check()?;
        self.presents += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}
