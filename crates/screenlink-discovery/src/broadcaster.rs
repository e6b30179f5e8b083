//! Periodic `CLIENT_ECHO` probe broadcaster.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use screenlink_core::protocol::CLIENT_ECHO_WORD;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::DiscoveryEvent;

/// Probe loop: emit `Probing`, send one `CLIENT_ECHO` datagram, sleep.
///
/// A send failure ends the loop after exactly one `Failed` event — no
/// self-retry. Shutdown aborts the sleep without completing it and emits
/// nothing; it is a distinct outcome from an I/O failure.
pub(crate) async fn run(
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    interval: Duration,
    events: mpsc::Sender<DiscoveryEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        // Racing the send keeps shutdown prompt even if the caller has
        // stopped draining the channel.
        tokio::select! {
            sent = events.send(DiscoveryEvent::Probing) => {
                if sent.is_err() {
                    // Caller dropped the receiver — nothing left to probe for.
                    return;
                }
            }
            _ = shutdown.changed() => return,
        }

        if let Err(e) = socket.send_to(CLIENT_ECHO_WORD, target).await {
            warn!("[Discovery] Probe send to {} failed: {}", target, e);
            let _ = events.send(DiscoveryEvent::Failed).await;
            return;
        }
        debug!(
            "[Discovery] Probe sent to {}, next in {:?}",
            target, interval
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                debug!("[Discovery] Broadcaster stopping");
                return;
            }
        }
    }
}
