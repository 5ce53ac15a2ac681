//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Server lifecycle tests: exclusivity displacement, connection limits,
//! acceptor isolation, and graceful shutdown.

use mocktel_server::{AuthMode, ServerConfig, TelnetServer};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};

fn open_config() -> ServerConfig {
    ServerConfig::new("127.0.0.1:0".parse().unwrap())
        .with_auth_mode(AuthMode::None)
        .with_shutdown_timeout(Duration::from_secs(1))
}

async fn start_server(config: ServerConfig) -> TelnetServer {
    let server = TelnetServer::new(config).await.expect("server should bind");
    server.start().await.expect("server should start");
    tokio::time::sleep(Duration::from_millis(50)).await;
    server
}

async fn connect(server: &TelnetServer) -> TcpStream {
    TcpStream::connect(server.bind_address())
        .await
        .expect("client should connect")
}

async fn send(client: &mut TcpStream, text: &str) {
    client.write_all(text.as_bytes()).await.expect("write ok");
    client.flush().await.expect("flush ok");
}

async fn recv_until(client: &mut TcpStream, needle: &str) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut collected = String::new();
    let mut buf = [0u8; 1024];
    while Instant::now() < deadline {
        match timeout(Duration::from_millis(200), client.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                collected.push_str(&String::from_utf8_lossy(&buf[..n]));
                if collected.contains(needle) {
                    return collected;
                }
            }
            Ok(Err(_)) => break,
            Err(_) => {}
        }
    }
    panic!("expected {needle:?} in server output, got {collected:?}");
}

async fn recv_closed(client: &mut TcpStream) {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut buf = [0u8; 1024];
    while Instant::now() < deadline {
        match timeout(Duration::from_millis(200), client.read(&mut buf)).await {
            Ok(Ok(0)) | Ok(Err(_)) => return,
            Ok(Ok(_)) => {}
            Err(_) => {}
        }
    }
    panic!("expected the server to close the connection");
}

/// Assert that nothing arrives on this connection (and it is not served).
async fn recv_nothing(client: &mut TcpStream) {
    let mut buf = [0u8; 1024];
    match timeout(Duration::from_millis(500), client.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) | Err(_) => {}
        Ok(Ok(n)) => panic!(
            "expected no output, got {:?}",
            String::from_utf8_lossy(&buf[..n]),
        ),
    }
}

// ============================================================================
// Exclusivity
// ============================================================================

#[tokio::test]
async fn new_connection_displaces_the_previous_one() {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
        .with_auth_mode(AuthMode::UsernameOnly)
        .with_credential("alice", "")
        .with_single_connection(true)
        .with_shutdown_timeout(Duration::from_secs(1));
    let server = start_server(config).await;

    let mut first = connect(&server).await;
    recv_until(&mut first, "Login: ").await;

    // The second client displaces the first and then authenticates
    // normally.
    let mut second = connect(&server).await;
    recv_until(&mut second, "Login: ").await;

    recv_until(
        &mut first,
        "Connection closed by server: new connection requested.",
    )
    .await;
    recv_closed(&mut first).await;

    send(&mut second, "alice\r\n").await;
    recv_until(&mut second, "Login successful!").await;

    drop(second);
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn non_exclusive_server_serves_connections_concurrently() {
    let server = start_server(open_config()).await;

    let mut first = connect(&server).await;
    recv_until(&mut first, "> ").await;
    let mut second = connect(&server).await;
    recv_until(&mut second, "> ").await;

    // Both sessions stay live and get full service, interleaved.
    send(&mut second, "echo two\r\n").await;
    recv_until(&mut second, "two\r\n").await;
    send(&mut first, "echo one\r\n").await;
    recv_until(&mut first, "one\r\n").await;

    drop(first);
    drop(second);
    server.shutdown().await.unwrap();
}

// ============================================================================
// Connection Limits and Isolation
// ============================================================================

#[tokio::test]
async fn connections_over_the_limit_are_rejected() {
    let server = start_server(open_config().with_max_connections(1)).await;

    let mut served = connect(&server).await;
    recv_until(&mut served, "> ").await;

    // The second connection is accepted by the OS and immediately
    // dropped by the server, never served.
    let mut rejected = connect(&server).await;
    recv_closed(&mut rejected).await;

    // The first session is unaffected.
    send(&mut served, "echo still served\r\n").await;
    recv_until(&mut served, "still served").await;

    drop(served);
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn abrupt_disconnects_do_not_disturb_the_acceptor() {
    let server = start_server(open_config()).await;

    // Connect and slam the connection shut, twice.
    for _ in 0..2 {
        let client = connect(&server).await;
        drop(client);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The acceptor and fresh sessions are unaffected.
    let mut client = connect(&server).await;
    recv_until(&mut client, "> ").await;
    send(&mut client, "echo fine\r\n").await;
    recv_until(&mut client, "fine\r\n").await;

    drop(client);
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn connection_count_tracks_live_sessions() {
    let server = start_server(open_config()).await;
    assert_eq!(server.connection_count(), 0);

    let mut client = connect(&server).await;
    recv_until(&mut client, "> ").await;
    assert_eq!(server.connection_count(), 1);

    drop(client);
    let deadline = Instant::now() + Duration::from_secs(2);
    while server.connection_count() > 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(server.connection_count(), 0);

    server.shutdown().await.unwrap();
}

// ============================================================================
// Graceful Shutdown
// ============================================================================

#[tokio::test]
async fn shutdown_stops_accepting_but_drains_live_sessions() {
    let server = start_server(open_config()).await;

    let mut live = connect(&server).await;
    recv_until(&mut live, "> ").await;

    // Shutdown returns once the drain timeout elapses; the in-flight
    // session is not force-killed.
    server.shutdown().await.unwrap();
    assert!(!server.is_running());

    // The surviving session still gets full service.
    send(&mut live, "echo draining\r\n").await;
    recv_until(&mut live, "draining\r\n").await;

    // A new connection may complete at the TCP level but is never served.
    let mut late = TcpStream::connect(server.bind_address())
        .await
        .expect("TCP connect may still succeed");
    recv_nothing(&mut late).await;

    drop(live);
    drop(late);
}
