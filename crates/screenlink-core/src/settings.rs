use serde::{Deserialize, Serialize};

/// Capacidades de display enviadas no handshake.
///
/// Supplied once before a session starts and immutable for the session's
/// lifetime. The fields are `i32` because that is how they travel on the
/// wire (three little-endian int32 values at the tail of the WELCOME
/// message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: i32,
    pub height: i32,
    pub hertz: i32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            hertz: 60,
        }
    }
}

impl std::fmt::Display for DisplaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{} @ {} Hz", self.width, self.height, self.hertz)
    }
}
