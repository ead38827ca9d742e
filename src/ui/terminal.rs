//! Terminal presentation (crossterm + ratatui)
//!
//! The screen is treated as a `width x height` pixel canvas scaled onto the
//! terminal. Sprites become braille dots in the sprite's mean colour; text
//! labels are printed at their pixel position.

use std::io::{self, Stdout};
use std::time::Duration;

use ahash::AHashMap;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::CrosstermBackend,
    style::{Color as TermColor, Style},
    symbols::Marker,
    text::Line,
    widgets::canvas::{Canvas, Points},
    Terminal,
};

use crate::core::config::UiConfig;
use crate::core::error::{LifyError, Result};
use crate::core::types::Vec2;
use crate::scene::input::Key;
use crate::scene::presentation::{DrawId, DrawStack, Drawable, Layer, Presentation, Text};

pub struct TerminalPresentation {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    width: u32,
    height: u32,
    stack: DrawStack,
    track_changes: bool,
    dirty: bool,
    active: bool,
}

impl TerminalPresentation {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new(ui: &UiConfig) -> Result<Self> {
        enable_raw_mode()?;
        let terminal = setup_or_restore(
            || {
                let mut stdout = io::stdout();
                execute!(stdout, EnterAlternateScreen, SetTitle(&ui.title))?;
                let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
                terminal.hide_cursor()?;
                Ok(terminal)
            },
            || {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
            },
        )?;
        if !ui.fullscreen {
            tracing::debug!("Windowed mode requested; terminal output is always full screen");
        }

        Ok(Self {
            terminal,
            width: ui.width,
            height: ui.height,
            stack: DrawStack::new(),
            track_changes: ui.track_input_changes,
            dirty: true,
            active: true,
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

/// Run `setup`; if it fails, run `restore` before handing back the error.
/// Raw mode is already on at that point and no `Drop` will turn it off.
fn setup_or_restore<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> io::Result<T> {
    setup().map_err(|err| {
        restore();
        err
    })
}

fn to_term_color(rgba: [u8; 4]) -> TermColor {
    TermColor::Rgb(rgba[0], rgba[1], rgba[2])
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Key {
    match code {
        // raw mode swallows SIGINT
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => crate::scene::input::QUIT_KEY,
        KeyCode::Char(c) => Key::from_char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        _ => Key::Other,
    }
}

impl Presentation for TerminalPresentation {
    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn text_extent(&self, text: &Text) -> Vec2 {
        // one terminal cell per character
        let (cols, rows) = match self.terminal.size() {
            Ok(area) => (area.width.max(1) as f32, area.height.max(1) as f32),
            Err(_) => (80.0, 24.0),
        };
        let cell_w = self.width as f32 / cols;
        let cell_h = self.height as f32 / rows;
        Vec2::new(text.content.chars().count() as f32 * cell_w, cell_h)
    }

    fn draw(&mut self, layer: Layer, drawable: Drawable) -> Result<DrawId> {
        self.dirty = true;
        Ok(self.stack.push(layer, drawable))
    }

    fn redraw(&mut self, id: DrawId, drawable: Drawable) -> Result<()> {
        self.dirty = true;
        self.stack.replace(id, drawable)
    }

    fn clear(&mut self) {
        self.dirty = true;
        self.stack.clear();
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.dirty = true;
                Ok(Some(map_key(key.code, key.modifiers)))
            }
            Event::Resize(_, _) => {
                self.dirty = true;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn present(&mut self) -> Result<()> {
        if !self.active || (self.track_changes && !self.dirty) {
            return Ok(());
        }

        let width = self.width as f64;
        let height = self.height as f64;

        // Canvas y grows upwards; screen y grows downwards.
        let mut dots: AHashMap<[u8; 4], Vec<(f64, f64)>> = AHashMap::new();
        let mut labels: Vec<(f64, f64, String)> = Vec::new();
        let mut background = TermColor::Black;
        for (_, _, drawable) in self.stack.iter() {
            match drawable {
                Drawable::Surface(surface) => {
                    let fill = surface.color();
                    if fill.a > 0 {
                        background = to_term_color([fill.r, fill.g, fill.b, fill.a]);
                    }
                    for sprite in surface.sprites() {
                        let x = sprite.position.x as f64;
                        let y = height - sprite.position.y as f64;
                        dots.entry(sprite.visual.tint()).or_default().push((x, y));
                    }
                }
                Drawable::Text(text) => labels.push((
                    text.position.x as f64,
                    height - text.position.y as f64,
                    text.content.clone(),
                )),
            }
        }

        self.terminal
            .draw(|frame| {
                let canvas = Canvas::default()
                    .marker(Marker::Braille)
                    .background_color(background)
                    .x_bounds([0.0, width])
                    .y_bounds([0.0, height])
                    .paint(|ctx| {
                        for (tint, coords) in &dots {
                            ctx.draw(&Points {
                                coords: coords.as_slice(),
                                color: to_term_color(*tint),
                            });
                        }
                        ctx.layer();
                        for (x, y, content) in &labels {
                            ctx.print(*x, *y, Line::styled(content.clone(), Style::default().fg(TermColor::White)));
                        }
                    });
                frame.render_widget(canvas, frame.size());
            })
            .map_err(|e| LifyError::Render(e.to_string()))?;

        self.dirty = false;
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(err) = self.restore() {
            tracing::warn!("Failed to restore terminal: {}", err);
        }
    }
}

impl Drop for TerminalPresentation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
