//! UDP broadcast/echo discovery for ScreenLink display servers.
//!
//! One socket, bound to the shared monitor port with `SO_BROADCAST`
//! enabled, is shared by two independent tasks:
//!
//! - the **broadcaster** periodically sends a `CLIENT_ECHO` probe to the
//!   broadcast address so servers know a client is looking;
//! - the **listener** parses inbound `SERVER_ECHO` replies into
//!   [`HostInfo`] records.
//!
//! The tasks never talk to each other; everything reaches the caller
//! through one [`DiscoveryEvent`] channel. A genuine socket failure ends
//! the affected task after a single [`DiscoveryEvent::Failed`] — the
//! service does not restart itself; that is the caller's call.

mod broadcaster;
mod listener;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use screenlink_core::protocol::MONITOR_PORT;
use screenlink_core::HostInfo;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

// MARK: - DiscoveryEvent

/// Caller-facing discovery events, delivered serially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A probe is about to be broadcast (UI progress hook).
    Probing,
    /// A server answered with a valid echo reply.
    Detected(HostInfo),
    /// A socket send/receive failed; the affected loop has stopped.
    /// Emitted at most once per loop.
    Failed,
}

// MARK: - DiscoveryOptions

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Port to bind; also the destination port for probes.
    pub port: u16,
    /// Probe destination. `None` means the limited broadcast address
    /// `255.255.255.255:port`. Tests point this at a loopback server.
    pub broadcast_target: Option<SocketAddr>,
    /// Delay between probes.
    pub probe_interval: Duration,
    /// Disable to run listener-only (server address already known, or
    /// probing handled elsewhere).
    pub enable_broadcast: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            port: MONITOR_PORT,
            broadcast_target: None,
            probe_interval: Duration::from_secs(5),
            enable_broadcast: true,
        }
    }
}

// MARK: - DiscoveryError

/// Start-up failures. Runtime socket failures surface as
/// [`DiscoveryEvent::Failed`] instead.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Failed to bind UDP discovery socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Failed to enable SO_BROADCAST: {0}")]
    Broadcast(#[source] std::io::Error),
}

// MARK: - DiscoveryService

/// Running discovery service. Drop or [`stop`](Self::stop) to cancel both
/// loops; cancellation unblocks a pending receive or sleep and is never
/// reported as a failure.
pub struct DiscoveryService {
    socket: Arc<UdpSocket>,
    shutdown: watch::Sender<bool>,
    broadcaster: Option<JoinHandle<()>>,
    listener: JoinHandle<()>,
}

impl DiscoveryService {
    /// Bind the shared socket and spawn the discovery loops.
    ///
    /// Returns the service handle plus the event channel. Events are
    /// emitted in loop order; the channel applies backpressure, so a
    /// stalled consumer stalls the loops rather than losing events.
    pub async fn start(
        options: DiscoveryOptions,
    ) -> Result<(Self, mpsc::Receiver<DiscoveryEvent>), DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, options.port))
            .await
            .map_err(DiscoveryError::Bind)?;
        socket.set_broadcast(true).map_err(DiscoveryError::Broadcast)?;
        let socket = Arc::new(socket);

        let port = socket.local_addr().map_err(DiscoveryError::Bind)?.port();
        let target = options.broadcast_target.unwrap_or_else(|| {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), port)
        });

        let (events, events_rx) = mpsc::channel(16);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let listener = tokio::spawn(listener::run(
            Arc::clone(&socket),
            events.clone(),
            shutdown_rx.clone(),
        ));

        let broadcaster = options.enable_broadcast.then(|| {
            tokio::spawn(broadcaster::run(
                Arc::clone(&socket),
                target,
                options.probe_interval,
                events,
                shutdown_rx,
            ))
        });

        info!(
            "[Discovery] Listening on UDP {} (broadcast {})",
            port,
            if broadcaster.is_some() { "on" } else { "off" }
        );

        Ok((
            Self {
                socket,
                shutdown,
                broadcaster,
                listener,
            },
            events_rx,
        ))
    }

    /// Address of the shared socket (useful when bound to port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Signal both loops to stop and wait for them to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.broadcaster {
            let _ = handle.await;
        }
        let _ = self.listener.await;
        info!("[Discovery] Stopped");
    }
}
