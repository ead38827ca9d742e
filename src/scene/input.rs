//! Keys, commands and the phase-scoped binding table

/// A key press as reported by a presentation. Letters are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Space,
    Other,
}

impl Key {
    /// Normalise a typed character (`'Q'` and `'q'` are the same key)
    pub fn from_char(c: char) -> Self {
        match c {
            ' ' => Key::Space,
            c => Key::Char(c.to_ascii_lowercase()),
        }
    }
}

/// Key used to quit in every phase
pub const QUIT_KEY: Key = Key::Char('q');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    Key(Key),
    Any,
}

/// What a binding asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Advance,
}

/// Global key-down bindings for the active phase.
///
/// Binding a pattern again replaces the previous command. A specific key
/// binding wins over `Any` for the same press, and at most one command
/// fires per key.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: Vec<(KeyPattern, Command)>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, pattern: KeyPattern, command: Command) {
        match self.bindings.iter_mut().find(|(p, _)| *p == pattern) {
            Some(slot) => slot.1 = command,
            None => self.bindings.push((pattern, command)),
        }
    }

    /// Drop every binding; called on each phase transition
    pub fn retire_all(&mut self) {
        self.bindings.clear();
    }

    pub fn dispatch(&self, key: Key) -> Option<Command> {
        self.bindings
            .iter()
            .find(|(p, _)| *p == KeyPattern::Key(key))
            .or_else(|| self.bindings.iter().find(|(p, _)| *p == KeyPattern::Any))
            .map(|(_, command)| *command)
    }

    pub fn is_bound(&self, pattern: KeyPattern) -> bool {
        self.bindings.iter().any(|(p, _)| *p == pattern)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
