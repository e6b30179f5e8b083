use anyhow::{bail, Result};
use tracing::{info, warn};

use screenlink_client::{Client, ClientConfig, ClientEvent};
use screenlink_core::protocol::MONITOR_PORT;
use screenlink_core::{DisplaySettings, Frame, HostInfo};
use screenlink_discovery::{DiscoveryEvent, DiscoveryOptions, DiscoveryService};

/// Main client loop.
///
/// # Environment
/// - `SCREENLINK_DEVICE_NAME` — device identifier sent in the handshake
///   (default `"ScreenLink Client"`)
/// - `SCREENLINK_SERVER` — skip discovery and connect to this IP directly
///
/// # Flow
/// 1. Broadcast `CLIENT_ECHO` probes and wait for the first server reply
///    (unless `SCREENLINK_SERVER` is set)
/// 2. Connect, send the WELCOME handshake, stream frames
/// 3. Log frame traffic until Ctrl-C; reconnection is automatic
pub async fn run() -> Result<()> {
    let host = match std::env::var("SCREENLINK_SERVER") {
        Ok(addr) => {
            let address = addr.parse()?;
            info!("Skipping discovery — server fixed at {}", address);
            HostInfo::new(address, addr)
        }
        Err(_) => discover_first_host().await?,
    };

    let device_name = std::env::var("SCREENLINK_DEVICE_NAME")
        .unwrap_or_else(|_| "ScreenLink Client".to_owned());
    let settings = DisplaySettings::default();
    info!(
        "Streaming to {} as '{}' ({})",
        host, device_name, settings
    );

    let mut config = ClientConfig::new(host.address, device_name);
    config.settings = settings;
    let (client, mut events) = Client::start(config);

    // ── Event loop until Ctrl-C ────────────────────────────────────────────
    let mut frames: u64 = 0;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Connected) => {
                    info!("Connected — waiting for frames");
                }
                Some(ClientEvent::Disconnected) => {
                    warn!("Disconnected — reconnecting automatically");
                }
                Some(ClientEvent::Frame(Frame::Blank)) => {
                    info!("Blank frame (clear signal)");
                }
                Some(ClientEvent::Frame(Frame::Payload(data))) => {
                    frames += 1;
                    if frames <= 5 || frames % 300 == 0 {
                        info!("Frame #{}: {} bytes", frames, data.len());
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C — shutting down");
                break;
            }
        }
    }

    client.stop().await;
    info!("Total frames received: {}", frames);
    Ok(())
}

// ── Discovery phase ────────────────────────────────────────────────────────────

/// Run broadcast discovery until one server answers, then stop it.
async fn discover_first_host() -> Result<HostInfo> {
    let (discovery, mut events) = DiscoveryService::start(DiscoveryOptions::default()).await?;
    info!("Probing for display servers on UDP {}...", MONITOR_PORT);

    let host = loop {
        match events.recv().await {
            Some(DiscoveryEvent::Probing) => info!("Probing..."),
            Some(DiscoveryEvent::Detected(host)) => break host,
            Some(DiscoveryEvent::Failed) => {
                bail!(
                    "discovery failed — is UDP port {} available and broadcast allowed?",
                    MONITOR_PORT
                );
            }
            None => bail!("discovery event channel closed"),
        }
    };

    discovery.stop().await;
    info!("Server detected: {}", host);
    Ok(host)
}
