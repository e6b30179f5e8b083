//! ScreenLink wire protocol definitions.
//!
//! Formats describe sequences of elements which make up a single byte-array
//! message:
//!
//! - **literal** — fixed ASCII byte sequence, compared exactly (no case
//!   folding, no partial match)
//! - **int32LE** — 32-bit integer, little-endian
//! - **text** — UTF-16LE; length fields count UTF-16 code units
//!   (2 bytes per unit), not bytes
//!
//! One port is shared by UDP discovery and TCP streaming.

use crate::settings::DisplaySettings;

/// UDP discovery and TCP streaming port.
pub const MONITOR_PORT: u16 = 14765;

/// **WELCOME client message** (TCP, sent once per connection)
///
/// - `"WELCOME"`: literal
/// - device name length: int32LE (UTF-16 units)
/// - device name: text
/// - screen width: int32LE
/// - screen height: int32LE
/// - hertz rate: int32LE
pub const WELCOME_WORD: &[u8] = b"WELCOME";

/// **FRAME server message** (TCP, repeated)
///
/// - `"FRAME"`: literal
/// - data size: int32LE — `< 0` blank-frame signal, `== 0` empty message,
///   `> 0` payload byte count
/// - data: bytes (only if size > 0)
pub const FRAME_WORD: &[u8] = b"FRAME";

/// **ECHO client message** (UDP broadcast, the whole datagram)
///
/// - `"CLIENT_ECHO"`: literal
pub const CLIENT_ECHO_WORD: &[u8] = b"CLIENT_ECHO";

/// **ECHO server reply** (UDP)
///
/// - `"SERVER_ECHO"`: literal
/// - hostname length: int32LE (UTF-16 units)
/// - hostname: text
pub const SERVER_ECHO_WORD: &[u8] = b"SERVER_ECHO";

/// No valid echo reply is longer than this; the listener receives into a
/// buffer of exactly this size so oversized datagrams are truncated and
/// then fail the exact-length check.
pub const MAX_ECHO_REPLY_LEN: usize = 128;

// ── Text encoding ──────────────────────────────────────────────────────────────

/// Encode `text` as UTF-16LE, returning the unit count and the bytes.
pub fn encode_utf16le(text: &str) -> (i32, Vec<u8>) {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    let mut units: i32 = 0;
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
        units += 1;
    }
    (units, bytes)
}

fn decode_utf16le(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

// ── Message encoding ───────────────────────────────────────────────────────────

/// Build the WELCOME handshake for `device_name` and `settings`.
pub fn encode_hello(device_name: &str, settings: &DisplaySettings) -> Vec<u8> {
    let (units, name) = encode_utf16le(device_name);

    let mut msg = Vec::with_capacity(WELCOME_WORD.len() + 4 + name.len() + 12);
    msg.extend_from_slice(WELCOME_WORD);
    msg.extend_from_slice(&units.to_le_bytes());
    msg.extend_from_slice(&name);
    msg.extend_from_slice(&settings.width.to_le_bytes());
    msg.extend_from_slice(&settings.height.to_le_bytes());
    msg.extend_from_slice(&settings.hertz.to_le_bytes());
    msg
}

/// Build a SERVER_ECHO reply datagram for `host_name`.
///
/// The client never sends this; it exists for round-trip tests and for
/// embedding a mock server next to the client.
pub fn encode_server_echo(host_name: &str) -> Vec<u8> {
    let (units, name) = encode_utf16le(host_name);

    let mut msg = Vec::with_capacity(SERVER_ECHO_WORD.len() + 4 + name.len());
    msg.extend_from_slice(SERVER_ECHO_WORD);
    msg.extend_from_slice(&units.to_le_bytes());
    msg.extend_from_slice(&name);
    msg
}

// ── Message decoding ───────────────────────────────────────────────────────────

/// Parse a SERVER_ECHO reply datagram into the advertised hostname.
///
/// Returns `None` for anything malformed — wrong magic, short datagram,
/// negative unit count, padding or truncation (the declared unit count
/// must account for *exactly* the remaining bytes), or invalid UTF-16.
/// Malformed datagrams are expected on a broadcast port and are never an
/// error.
pub fn parse_server_echo(datagram: &[u8]) -> Option<String> {
    let header = SERVER_ECHO_WORD.len();
    if datagram.len() <= header + 4 {
        return None;
    }
    if &datagram[..header] != SERVER_ECHO_WORD {
        return None;
    }

    let units = i32::from_le_bytes(datagram[header..header + 4].try_into().ok()?);
    if units < 0 {
        return None;
    }

    // Exact length equation: header + count field + 2 bytes per unit.
    if header + 4 + (units as usize) * 2 != datagram.len() {
        return None;
    }

    decode_utf16le(&datagram[header + 4..])
}
