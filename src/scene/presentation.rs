//! Presentation collaborator: what the scene controller draws and where
//! its input comes from.
//!
//! Concrete window/terminal back ends live in `crate::ui`; the scene layer
//! only sees the [`Presentation`] trait and the plain drawables below.

use std::time::Duration;

use crate::board::assets::{AssetHandle, FontHandle};
use crate::core::error::{LifyError, Result};
use crate::core::types::Vec2;
use crate::scene::input::Key;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
}

/// A text label. `font: None` means the presentation's built-in font.
#[derive(Clone, Debug)]
pub struct Text {
    pub content: String,
    pub font: Option<FontHandle>,
    pub position: Vec2,
}

impl Text {
    pub fn new(content: impl Into<String>, position: Vec2) -> Self {
        Self {
            content: content.into(),
            font: None,
            position,
        }
    }

    pub fn with_font(mut self, font: FontHandle) -> Self {
        self.font = Some(font);
        self
    }
}

/// One image placed on a surface, in surface coordinates
#[derive(Clone, Debug)]
pub struct Sprite {
    pub position: Vec2,
    pub visual: AssetHandle,
}

/// A coloured rectangle that sprites are blitted onto
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    color: Color,
    sprites: Vec<Sprite>,
}

impl Surface {
    pub fn new(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            color,
            sprites: Vec::new(),
        }
    }

    pub fn push(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill colour; transparent surfaces show what is beneath them
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }
}

#[derive(Clone, Debug)]
pub enum Drawable {
    Text(Text),
    Surface(Surface),
}

/// Draw-stack layers, composited static first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Static,
    Dynamic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawId(pub u64);

/// Layered list of drawables shared by the concrete presentations
#[derive(Debug, Default)]
pub struct DrawStack {
    items: Vec<(DrawId, Layer, Drawable)>,
    next_id: u64,
}

impl DrawStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: Layer, drawable: Drawable) -> DrawId {
        let id = DrawId(self.next_id);
        self.next_id += 1;
        // stable: keeps insertion order within a layer
        let at = self
            .items
            .iter()
            .position(|(_, l, _)| *l > layer)
            .unwrap_or(self.items.len());
        self.items.insert(at, (id, layer, drawable));
        id
    }

    pub fn replace(&mut self, id: DrawId, drawable: Drawable) -> Result<()> {
        let slot = self
            .items
            .iter_mut()
            .find(|(item_id, _, _)| *item_id == id)
            .ok_or_else(|| LifyError::Render(format!("no drawable with id {}", id.0)))?;
        slot.2 = drawable;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drawables in composite order
    pub fn iter(&self) -> impl Iterator<Item = (DrawId, Layer, &Drawable)> {
        self.items.iter().map(|(id, layer, d)| (*id, *layer, d))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Rendering/windowing collaborator driven by the scene controller.
///
/// Scene registration and key bindings are owned by the controller; the
/// presentation only draws, reports input and tears itself down.
pub trait Presentation {
    /// Screen size in pixels
    fn screen_size(&self) -> (u32, u32);

    /// Pixel extent of a label rendered in its font
    fn text_extent(&self, text: &Text) -> Vec2;

    fn draw(&mut self, layer: Layer, drawable: Drawable) -> Result<DrawId>;

    /// Swap the drawable behind an id returned by `draw`
    fn redraw(&mut self, id: DrawId, drawable: Drawable) -> Result<()>;

    /// Drop every drawable (scene end)
    fn clear(&mut self);

    /// Wait up to `timeout` for one key press
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>>;

    /// Composite the draw stack onto the screen
    fn present(&mut self) -> Result<()>;

    /// Release window/render resources. Safe to call more than once.
    fn shutdown(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    XY,
}

/// Centre `text` on the screen along `axis`, keeping the other coordinate.
pub fn centre<P: Presentation + ?Sized>(presentation: &P, text: &mut Text, axis: Axis) {
    let (width, height) = presentation.screen_size();
    let extent = presentation.text_extent(text);
    if matches!(axis, Axis::X | Axis::XY) {
        text.position.x = (width as f32 - extent.x) / 2.0;
    }
    if matches!(axis, Axis::Y | Axis::XY) {
        text.position.y = (height as f32 - extent.y) / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Drawable {
        Drawable::Text(Text::new(s, Vec2::ZERO))
    }

    fn content(d: &Drawable) -> &str {
        match d {
            Drawable::Text(t) => &t.content,
            Drawable::Surface(_) => "<surface>",
        }
    }

    #[test]
    fn test_static_layer_composites_first() {
        let mut stack = DrawStack::new();
        stack.push(Layer::Dynamic, label("a"));
        stack.push(Layer::Static, label("b"));
        stack.push(Layer::Dynamic, label("c"));
        stack.push(Layer::Static, label("d"));

        let order: Vec<_> = stack.iter().map(|(_, _, d)| content(d).to_string()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut stack = DrawStack::new();
        let first = stack.push(Layer::Dynamic, label("loading"));
        stack.push(Layer::Dynamic, label("prompt"));
        stack.replace(first, label("loaded")).unwrap();

        let order: Vec<_> = stack.iter().map(|(_, _, d)| content(d).to_string()).collect();
        assert_eq!(order, vec!["loaded", "prompt"]);
    }

    #[test]
    fn test_replace_unknown_id_is_render_error() {
        let mut stack = DrawStack::new();
        let err = stack.replace(DrawId(9), label("x")).unwrap_err();
        assert!(matches!(err, LifyError::Render(_)));
    }
}
