//! `SERVER_ECHO` reply listener.

use std::sync::Arc;

use screenlink_core::protocol::{parse_server_echo, MAX_ECHO_REPLY_LEN};
use screenlink_core::HostInfo;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::DiscoveryEvent;

/// Receive loop: block on the shared socket, parse each datagram, emit
/// `Detected` for every valid reply.
///
/// Malformed datagrams (including our own looped-back probes, which share
/// the port) are silently discarded and never end the loop; only a real
/// receive failure does, after one `Failed` event.
pub(crate) async fn run(
    socket: Arc<UdpSocket>,
    events: mpsc::Sender<DiscoveryEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = [0u8; MAX_ECHO_REPLY_LEN];

    loop {
        let (len, from) = tokio::select! {
            received = socket.recv_from(&mut buf) => match received {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("[Discovery] Receive failed: {}", e);
                    let _ = events.send(DiscoveryEvent::Failed).await;
                    return;
                }
            },
            _ = shutdown.changed() => {
                debug!("[Discovery] Listener stopping");
                return;
            }
        };

        match parse_server_echo(&buf[..len]) {
            Some(host_name) => {
                let host = HostInfo::new(from.ip(), host_name);
                info!("[Discovery] Server detected: {}", host);
                tokio::select! {
                    sent = events.send(DiscoveryEvent::Detected(host)) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                    _ = shutdown.changed() => return,
                }
            }
            None => {
                debug!(
                    "[Discovery] Discarding {}-byte datagram from {}",
                    len, from
                );
            }
        }
    }
}
