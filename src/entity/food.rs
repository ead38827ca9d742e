//! Food organisms

use serde::{Deserialize, Serialize};

/// A stationary plant that grazers feed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Herb {
    name: String,
}

impl Herb {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
