//! Connection state machine: connect → handshake → stream → reconnect.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use screenlink_core::protocol::{encode_hello, MONITOR_PORT};
use screenlink_core::{ConnectionState, DisplaySettings, Frame};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::stream::FrameReader;

// MARK: - ClientEvent

/// Caller-facing streaming events, delivered serially in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// TCP connection established (handshake follows immediately).
    Connected,
    /// Connection lost; the client is already reconnecting.
    Disconnected,
    /// One frame, or the explicit blank/clear signal.
    Frame(Frame),
}

// MARK: - ClientConfig

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, usually from a discovery `Detected` event.
    pub server: IpAddr,
    /// TCP port; discovery and streaming share [`MONITOR_PORT`].
    pub port: u16,
    /// Device identifier sent in the handshake. Building this string
    /// (brand, model, user label…) is the caller's business.
    pub device_name: String,
    /// Display capabilities sent in the handshake; fixed for the session.
    pub settings: DisplaySettings,
    /// Delay between failed connection attempts.
    pub retry_delay: Duration,
}

impl ClientConfig {
    pub fn new(server: IpAddr, device_name: impl Into<String>) -> Self {
        Self {
            server,
            port: MONITOR_PORT,
            device_name: device_name.into(),
            settings: DisplaySettings::default(),
            retry_delay: Duration::from_secs(5),
        }
    }
}

// MARK: - Client

pub struct Client;

impl Client {
    /// Spawn the connection task.
    ///
    /// Returns the handle plus the event channel. The task reconnects
    /// indefinitely — there is no retry cap and no error escapes it; a
    /// lost connection is only visible as `Disconnected` followed, once
    /// the server is back, by `Connected`.
    pub fn start(config: ClientConfig) -> (ClientHandle, mpsc::Receiver<ClientEvent>) {
        let (events, events_rx) = mpsc::channel(64);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (state, state_rx) = watch::channel(ConnectionState::Init);

        let task = tokio::spawn(run(config, events, state, shutdown_rx));

        (
            ClientHandle {
                shutdown,
                state: state_rx,
                task,
            },
            events_rx,
        )
    }
}

// MARK: - ClientHandle

/// Running client. Dropping the handle also stops the task, but
/// [`stop`](Self::stop) waits for a clean exit.
pub struct ClientHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    /// Advisory connection phase, written only by the connection task.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Signal shutdown and wait for the task. Unblocks a pending
    /// connect/read by abandoning the socket; never reported as an I/O
    /// failure.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
        info!("[Client] Stopped");
    }
}

// MARK: - Connection task

/// Why a session ended. `Failed` loops back to the connect phase; the
/// other two end the task.
enum SessionExit {
    Failed(ClientError),
    Shutdown,
    ConsumerGone,
}

async fn run(
    config: ClientConfig,
    events: mpsc::Sender<ClientEvent>,
    state: watch::Sender<ConnectionState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let addr = SocketAddr::new(config.server, config.port);

    loop {
        // ── Connect phase: retry every retry_delay, indefinitely ──────────
        let _ = state.send(ConnectionState::Connecting);
        let stream = loop {
            let attempt = tokio::select! {
                attempt = TcpStream::connect(addr) => attempt,
                _ = shutdown.changed() => return,
            };
            match attempt {
                Ok(stream) => break stream,
                Err(e) => {
                    warn!(
                        "[Client] Connection to {} failed: {} — retrying in {:?}",
                        addr, e, config.retry_delay
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(config.retry_delay) => {}
                        _ = shutdown.changed() => return,
                    }
                }
            }
        };

        let _ = state.send(ConnectionState::Connected);
        info!("[Client] Connected to {}", addr);
        if events.send(ClientEvent::Connected).await.is_err() {
            return;
        }

        // ── Handshake + frame stream; the socket dies with the session ────
        match session(stream, &config, &events, &mut shutdown).await {
            SessionExit::Failed(e) => {
                warn!("[Client] Session ended: {} — reconnecting", e);
                let _ = state.send(ConnectionState::Connecting);
                if events.send(ClientEvent::Disconnected).await.is_err() {
                    return;
                }
                // Loop back: reconnect, re-handshake, fresh reader.
            }
            SessionExit::Shutdown => {
                // External stop while connected still ends in a disconnect
                // notification, same as a server-side drop. Best-effort:
                // the consumer may already be gone.
                let _ = events.try_send(ClientEvent::Disconnected);
                return;
            }
            SessionExit::ConsumerGone => return,
        }
    }
}

/// One connection's worth of work: send the handshake exactly once, then
/// read frames until something fatal happens. Consumes the stream, so no
/// partial read state can leak into the next session.
async fn session(
    mut stream: TcpStream,
    config: &ClientConfig,
    events: &mpsc::Sender<ClientEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionExit {
    // Handshake precedes the first frame read of every connection.
    let hello = encode_hello(&config.device_name, &config.settings);
    let written = tokio::select! {
        written = stream.write_all(&hello) => written,
        _ = shutdown.changed() => return SessionExit::Shutdown,
    };
    if let Err(e) = written {
        return SessionExit::Failed(e.into());
    }
    debug!(
        "[Client] Handshake sent: '{}', {}",
        config.device_name, config.settings
    );

    let mut reader = FrameReader::new(stream);
    loop {
        let frame = tokio::select! {
            frame = reader.read_frame() => frame,
            _ = shutdown.changed() => return SessionExit::Shutdown,
        };
        match frame {
            Ok(Some(frame)) => {
                debug!("[Client] Frame received ({} bytes)", frame.len());
                // Racing the send keeps shutdown prompt behind a stalled
                // consumer.
                tokio::select! {
                    sent = events.send(ClientEvent::Frame(frame)) => {
                        if sent.is_err() {
                            return SessionExit::ConsumerGone;
                        }
                    }
                    _ = shutdown.changed() => return SessionExit::Shutdown,
                }
            }
            // size == 0: empty message, no event.
            Ok(None) => {}
            Err(e) => return SessionExit::Failed(e),
        }
    }
}
