//! ScreenLink streaming client.
//!
//! [`Client::start`] spawns one task that owns the whole TCP lifecycle as
//! a single sequential loop: connect (retrying every 5 s, indefinitely) →
//! send the WELCOME handshake → read frames until the connection dies →
//! reconnect. The handshake is resent after every reconnect, and partial
//! stream state never survives a connection.
//!
//! Frames reach the caller through an mpsc channel of [`ClientEvent`];
//! the advisory connection phase is published on a `watch` channel.

mod client;
mod error;
mod stream;

pub use client::{Client, ClientConfig, ClientEvent, ClientHandle};
pub use error::ClientError;
pub use stream::{FrameReader, DEFAULT_MAX_FRAME_LEN};
