use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// The executor clicks the confirmation control itself.
    Automatic,
    /// The executor stops at the confirmation surface and waits for it to close.
    #[default]
    Manual,
}

impl Mode {
    pub fn from_auto_flag(auto: bool) -> Self {
        if auto {
            Mode::Automatic
        } else {
            Mode::Manual
        }
    }

    pub fn is_automatic(self) -> bool {
        self == Mode::Automatic
    }
}

/// Holds the operating mode. Only the executor's confirmation decision reads it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeController {
    mode: Mode,
}

impl ModeController {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn current(&self) -> Mode {
        self.mode
    }

    /// Returns true when the mode actually changed.
    pub fn set(&mut self, mode: Mode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }
}
