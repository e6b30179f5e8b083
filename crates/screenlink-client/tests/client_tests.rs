//! Lifecycle tests against a mock server on loopback.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use screenlink_client::{Client, ClientConfig, ClientEvent};
use screenlink_core::protocol::{encode_hello, FRAME_WORD};
use screenlink_core::{DisplaySettings, Frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn test_config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::new(IpAddr::V4(Ipv4Addr::LOCALHOST), "unit-test device");
    config.port = port;
    config.retry_delay = Duration::from_millis(50);
    config
}

/// Read and verify the WELCOME handshake off an accepted connection.
async fn expect_hello(stream: &mut TcpStream, config: &ClientConfig) {
    let expected = encode_hello(&config.device_name, &config.settings);
    let mut got = vec![0u8; expected.len()];
    stream.read_exact(&mut got).await.expect("handshake bytes");
    assert_eq!(got, expected, "handshake must match the wire format");
}

async fn send_frame(stream: &mut TcpStream, size: i32, payload: &[u8]) {
    let mut msg = FRAME_WORD.to_vec();
    msg.extend_from_slice(&size.to_le_bytes());
    msg.extend_from_slice(payload);
    stream.write_all(&msg).await.expect("frame write");
}

#[tokio::test]
async fn handshake_is_resent_before_frames_after_every_reconnect() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = test_config(port);

    let (handle, mut events) = Client::start(config.clone());

    // Session 1: handshake arrives before anything else, then one frame,
    // then the server drops the connection mid-stream.
    let (mut conn, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn, &config).await;
    send_frame(&mut conn, 3, &[1, 2, 3]).await;

    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Frame(Frame::Payload(vec![1, 2, 3].into())))
    );

    drop(conn);
    assert_eq!(events.recv().await, Some(ClientEvent::Disconnected));

    // Session 2: the client must re-handshake before reading frames.
    let (mut conn, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn, &config).await;
    send_frame(&mut conn, -1, &[]).await;

    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Frame(Frame::Blank))
    );

    handle.stop().await;
}

#[tokio::test]
async fn empty_frames_produce_no_event_and_blank_frames_one() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = test_config(port);

    let (handle, mut events) = Client::start(config.clone());

    let (mut conn, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn, &config).await;

    // size 0 → nothing; size -1 → Blank; size 4 → payload. Events must
    // come out in stream order with the empty message skipped.
    send_frame(&mut conn, 0, &[]).await;
    send_frame(&mut conn, -1, &[]).await;
    send_frame(&mut conn, 4, b"data").await;

    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert_eq!(events.recv().await, Some(ClientEvent::Frame(Frame::Blank)));
    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Frame(Frame::Payload(
            bytes::Bytes::from_static(b"data")
        )))
    );

    handle.stop().await;
}

#[tokio::test]
async fn stream_desync_tears_down_and_reconnects() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = test_config(port);

    let (handle, mut events) = Client::start(config.clone());

    // Session 1: garbage where the FRAME magic belongs.
    let (mut conn, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn, &config).await;
    conn.write_all(b"GARBAGE??").await.unwrap();

    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert_eq!(events.recv().await, Some(ClientEvent::Disconnected));

    // Session 2: clean handshake again, streaming works.
    let (mut conn2, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn2, &config).await;
    send_frame(&mut conn2, 2, &[5, 6]).await;

    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Frame(Frame::Payload(vec![5, 6].into())))
    );

    handle.stop().await;
}

#[tokio::test]
async fn stop_while_connected_still_reports_a_disconnect() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = test_config(port);

    let (handle, mut events) = Client::start(config.clone());

    let (mut conn, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn, &config).await;
    assert_eq!(events.recv().await, Some(ClientEvent::Connected));

    // Stop mid-session, with the reader blocked on the socket. The
    // session ends like a server-side drop: one Disconnected, then the
    // channel closes.
    handle.stop().await;
    assert_eq!(events.recv().await, Some(ClientEvent::Disconnected));
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn retries_until_the_server_appears() {
    // Grab a free port, then release it so the first attempts fail.
    let probe = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let config = test_config(port);
    let (handle, mut events) = Client::start(config.clone());
    let mut state = handle.state();

    // Let a few refused attempts happen before the server shows up.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!state.borrow().is_connected());

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await.unwrap();
    let (mut conn, _) = listener.accept().await.unwrap();
    expect_hello(&mut conn, &config).await;

    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    state
        .wait_for(|s| s.is_connected())
        .await
        .expect("state watch alive");

    handle.stop().await;
}
