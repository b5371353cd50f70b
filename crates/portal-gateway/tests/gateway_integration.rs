//! End-to-end tests over real sockets: a DNS client against the responder
//! and WebSocket clients against the chat relay, all on ephemeral loopback
//! ports.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

use portal_core::accept_key;
use portal_gateway::application::ConnectionRegistry;
use portal_gateway::domain::GatewayConfig;
use portal_gateway::infrastructure::{dns_server, ws_server};

// ── DNS responder over UDP ────────────────────────────────────────────────────

/// A standard A-record query for `name` with transaction id `0xBEEF`.
fn dns_query(name: &str) -> Vec<u8> {
    let mut packet = vec![
        0xBE, 0xEF, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    for label in name.split('.') {
        packet.push(label.len() as u8);
        packet.extend_from_slice(label.as_bytes());
    }
    packet.push(0x00);
    packet.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    packet
}

async fn start_dns(gateway_ip: Ipv4Addr) -> (SocketAddr, Arc<AtomicBool>) {
    let socket = dns_server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .expect("bind DNS socket");
    let addr = socket.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(dns_server::serve(
        socket,
        gateway_ip,
        Duration::from_millis(100),
        Arc::clone(&running),
    ));
    (addr, running)
}

#[tokio::test]
async fn test_dns_answers_any_name_with_the_gateway_address() {
    let gateway_ip = Ipv4Addr::new(10, 0, 0, 1);
    let (server, running) = start_dns(gateway_ip).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let query = dns_query("example.com");
    client.send_to(&query, server).await.unwrap();

    let mut buf = [0u8; 512];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
        .await
        .expect("responder must answer within the deadline")
        .unwrap();
    let answer = &buf[..len];

    // Transaction id echoed, standard response flags set.
    assert_eq!(&answer[..2], &[0xBE, 0xEF]);
    assert_eq!(&answer[2..4], &[0x81, 0x80]);
    // The question section is echoed verbatim after the 12-byte header.
    assert_eq!(&answer[12..query.len()], &query[12..]);
    // One answer record, 16 bytes, ending in the gateway address.
    assert_eq!(len, query.len() + 16);
    assert_eq!(&answer[len - 4..], &[10, 0, 0, 1]);

    running.store(false, Ordering::Relaxed);
}

#[tokio::test]
async fn test_dns_ignores_garbage_but_keeps_answering() {
    let gateway_ip = Ipv4Addr::new(10, 0, 0, 1);
    let (server, running) = start_dns(gateway_ip).await;
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // Garbage first: no reply may come back for it.
    client.send_to(b"\x01\x02\x03", server).await.unwrap();

    // A real query right after must still be answered.
    client.send_to(&dns_query("chat.local"), server).await.unwrap();
    let mut buf = [0u8; 512];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
        .await
        .expect("real query must still be answered")
        .unwrap();

    // The reply is for the real query, not the garbage.
    assert_eq!(&buf[..2], &[0xBE, 0xEF]);
    assert_eq!(&buf[len - 4..len], &[10, 0, 0, 1]);

    running.store(false, Ordering::Relaxed);
}

// ── WebSocket relay over TCP ──────────────────────────────────────────────────

async fn start_relay() -> (SocketAddr, Arc<AtomicBool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind relay");
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let config = Arc::new(GatewayConfig {
        read_timeout: Some(Duration::from_secs(5)),
        ..GatewayConfig::default()
    });
    tokio::spawn(ws_server::serve(
        listener,
        Arc::new(ConnectionRegistry::new()),
        config,
        Arc::clone(&running),
    ));
    (addr, running)
}

/// Performs the client side of the opening handshake and asserts the
/// server's accept digest, returning the upgraded stream.
async fn connect_ws(addr: SocketAddr) -> TcpStream {
    let key = "dGhlIHNhbXBsZSBub25jZQ==";
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let request = format!(
        "GET /chat HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    // Read headers until the blank line.
    let mut response = Vec::new();
    let mut byte = [0u8; 1];
    while !response.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.expect("handshake response");
        response.push(byte[0]);
    }
    let response = String::from_utf8(response).unwrap();

    assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(response.contains(&format!("Sec-WebSocket-Accept: {}\r\n", accept_key(key))));
    stream
}

/// Builds a masked client Text frame.
fn masked_text_frame(text: &str) -> Vec<u8> {
    let mask = [0x11, 0x22, 0x33, 0x44];
    let mut payload = text.as_bytes().to_vec();
    portal_core::apply_mask(&mut payload, mask);

    let mut frame = vec![0x81];
    assert!(text.len() <= 125, "test helper covers small frames only");
    frame.push(0x80 | text.len() as u8);
    frame.extend_from_slice(&mask);
    frame.extend_from_slice(&payload);
    frame
}

/// Reads one small server Text frame and returns its payload.
async fn read_text_frame(stream: &mut TcpStream) -> String {
    let mut head = [0u8; 2];
    stream.read_exact(&mut head).await.expect("frame header");
    assert_eq!(head[0], 0x81, "fin=1, opcode Text");
    assert_eq!(head[1] & 0x80, 0, "server frames are unmasked");

    let mut payload = vec![0u8; (head[1] & 0x7F) as usize];
    stream.read_exact(&mut payload).await.expect("frame payload");
    String::from_utf8(payload).unwrap()
}

#[tokio::test]
async fn test_chat_message_reaches_every_client_including_the_sender() {
    let (addr, running) = start_relay().await;
    let mut alice = connect_ws(addr).await;
    let mut bob = connect_ws(addr).await;

    // Let the relay finish registering both connections.
    tokio::time::sleep(Duration::from_millis(100)).await;

    alice.write_all(&masked_text_frame("hi room")).await.unwrap();

    let deadline = Duration::from_secs(2);
    let to_bob = tokio::time::timeout(deadline, read_text_frame(&mut bob))
        .await
        .expect("second client must receive the broadcast");
    let echo = tokio::time::timeout(deadline, read_text_frame(&mut alice))
        .await
        .expect("the sender sees its own message echoed");

    assert_eq!(to_bob, "hi room");
    assert_eq!(echo, "hi room");

    running.store(false, Ordering::Relaxed);
}

#[tokio::test]
async fn test_departed_client_does_not_break_the_room() {
    let (addr, running) = start_relay().await;
    let mut alice = connect_ws(addr).await;
    let bob = connect_ws(addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Bob leaves abruptly; Alice keeps chatting.
    drop(bob);
    tokio::time::sleep(Duration::from_millis(100)).await;

    alice.write_all(&masked_text_frame("still here")).await.unwrap();
    let echo = tokio::time::timeout(Duration::from_secs(2), read_text_frame(&mut alice))
        .await
        .expect("broadcast must survive a departed client");

    assert_eq!(echo, "still here");
    running.store(false, Ordering::Relaxed);
}

#[tokio::test]
async fn test_handshake_without_key_is_rejected_without_upgrade() {
    let (addr, running) = start_relay().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();

    // The relay closes the connection without writing a 101.
    let mut response = String::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_to_string(&mut response))
        .await
        .expect("connection must be closed promptly")
        .unwrap();
    assert!(response.is_empty(), "no upgrade without Sec-WebSocket-Key");

    running.store(false, Ordering::Relaxed);
}

#[tokio::test]
async fn test_unmasked_frame_closes_only_the_offender() {
    let (addr, running) = start_relay().await;
    let mut offender = connect_ws(addr).await;
    let mut bystander = connect_ws(addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Unmasked Text frame: a protocol violation.
    offender.write_all(&[0x81, 0x02, b'h', b'i']).await.unwrap();

    // The offender's connection is closed...
    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), offender.read_to_end(&mut rest))
        .await
        .expect("offender must be disconnected")
        .unwrap();

    // ...while the bystander can still chat.
    bystander
        .write_all(&masked_text_frame("unaffected"))
        .await
        .unwrap();
    let echo = tokio::time::timeout(Duration::from_secs(2), read_text_frame(&mut bystander))
        .await
        .expect("the room survives one misbehaving client");
    assert_eq!(echo, "unaffected");

    running.store(false, Ordering::Relaxed);
}
