use thiserror::Error;

/// Hard protocol violations on the TCP stream.
///
/// Malformed UDP discovery datagrams are *not* errors — the listener
/// silently discards them. These variants exist for the stream side,
/// where a violation means the connection is beyond recovery.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Bad magic word: expected {expected:?}")]
    BadMagic { expected: &'static str },

    #[error("Declared frame size {size} exceeds the {max} byte limit")]
    FrameTooLarge { size: i32, max: usize },
}
