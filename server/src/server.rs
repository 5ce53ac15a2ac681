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

//! Mock Telnet server implementation
//!
//! The `TelnetServer` is the main entry point: it owns the TCP listener,
//! accepts connections, and spawns one independent session task per
//! connection. A session failure is isolated to that session; the accept
//! loop is never disturbed by anything a connection does.

use crate::command::CommandSet;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::gate::ConnectionGate;
use crate::session::Session;
use crate::types::ConnectionId;
use metrics::{counter, gauge};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Mock Telnet server
///
/// Binds on construction, accepts on `start`, and drains gracefully on
/// `shutdown`: the acceptor stops immediately while in-flight sessions
/// run to their own natural termination.
///
/// # Example
///
/// ```no_run
/// use mocktel_server::{ServerConfig, TelnetServer};
///
/// #[tokio::main]
/// async fn main() -> mocktel_server::Result<()> {
///     let config = ServerConfig::new("127.0.0.1:2323".parse().unwrap());
///     let server = TelnetServer::new(config).await?;
///     server.start().await?;
///
///     tokio::signal::ctrl_c().await?;
///     server.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct TelnetServer {
    /// Server configuration (defaults installed, read-only from here on)
    config: Arc<ServerConfig>,
    /// Exclusivity gate shared by acceptor and sessions
    gate: Arc<ConnectionGate>,
    /// Live session accounting for drain and limit checks
    tracker: Arc<SessionTracker>,
    /// TCP listener (wrapped for sharing with the accept loop)
    listener: Arc<tokio::sync::Mutex<TcpListener>>,
    /// Actual bind address
    bind_address: SocketAddr,
    /// Server start time
    started_at: Instant,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Shutdown signal for the accept loop
    shutdown: CancellationToken,
    /// Accept loop task handle
    accept_handle: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
    /// Next connection ID (monotonically increasing)
    next_id: Arc<AtomicU64>,
}

impl TelnetServer {
    /// Create a new server with the given configuration.
    ///
    /// Validates the configuration, installs the built-in default command
    /// set if none was registered, and binds the listener. Call `start()`
    /// to begin accepting connections.
    pub async fn new(mut config: ServerConfig) -> Result<Self> {
        config.validate().map_err(ServerError::InvalidConfig)?;

        // The command mapping is the one lazily populated piece of the
        // configuration; from here on everything is read-only.
        if config.commands.is_empty() {
            config.commands = CommandSet::defaults();
        }

        let listener = TcpListener::bind(config.bind_address).await?;
        let bind_address = listener.local_addr()?;

        tracing::info!("Mock Telnet server bound to {}", bind_address);

        Ok(Self {
            gate: Arc::new(ConnectionGate::new(config.single_connection)),
            config: Arc::new(config),
            tracker: Arc::new(SessionTracker::new()),
            listener: Arc::new(tokio::sync::Mutex::new(listener)),
            bind_address,
            started_at: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            accept_handle: Arc::new(tokio::sync::Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Start accepting connections.
    ///
    /// Spawns the accept loop; the server runs until `shutdown()` is
    /// called.
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        tracing::info!("Starting mock Telnet server on {}", self.bind_address);

        let handle = self.spawn_accept_loop();
        *self.accept_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Spawn the accept loop task.
    fn spawn_accept_loop(&self) -> JoinHandle<()> {
        let listener = Arc::clone(&self.listener);
        let config = Arc::clone(&self.config);
        let gate = Arc::clone(&self.gate);
        let tracker = Arc::clone(&self.tracker);
        let running = Arc::clone(&self.running);
        let shutdown = self.shutdown.clone();
        let next_id = Arc::clone(&self.next_id);

        tokio::spawn(async move {
            loop {
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let accept_result = tokio::select! {
                    result = async { listener.lock().await.accept().await } => result,
                    () = shutdown.cancelled() => break,
                };

                match accept_result {
                    Ok((socket, peer_addr)) => {
                        if tracker.active() >= config.max_connections {
                            tracing::warn!(
                                "Connection limit reached ({}), rejecting connection from {}",
                                config.max_connections,
                                peer_addr,
                            );
                            counter!("mocktel.connections.rejected").increment(1);
                            drop(socket);
                            continue;
                        }

                        let id = ConnectionId::new(next_id.fetch_add(1, Ordering::SeqCst));
                        tracing::info!("Connection {} established from {}", id, peer_addr);
                        counter!("mocktel.connections.total").increment(1);

                        // Swap-and-notify before the session task exists,
                        // so admission order matches accept order.
                        let displaced = gate.admit(id);
                        let session =
                            Session::new(id, peer_addr, socket, Arc::clone(&config), displaced);

                        tracker.register();
                        let gate = Arc::clone(&gate);
                        let tracker = Arc::clone(&tracker);
                        tokio::spawn(async move {
                            session.run(gate).await;
                            tracker.deregister();
                        });
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        counter!("mocktel.connections.errors").increment(1);

                        // Back off on errors to avoid a tight loop
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                }
            }

            tracing::info!("Accept loop terminated");
        })
    }

    /// Shutdown the server gracefully.
    ///
    /// Stops accepting new connections immediately; in-flight sessions
    /// are left to reach their own natural termination, waited on for up
    /// to the configured shutdown timeout and never force-killed.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServerError::NotRunning);
        }

        tracing::info!("Shutting down mock Telnet server");

        self.shutdown.cancel();

        if let Some(handle) = self.accept_handle.lock().await.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        }

        if tokio::time::timeout(self.config.shutdown_timeout, self.tracker.drained())
            .await
            .is_err()
        {
            tracing::warn!(
                "Shutdown timeout elapsed with {} session(s) still active",
                self.tracker.active(),
            );
        }

        tracing::info!("Mock Telnet server shutdown complete");

        Ok(())
    }

    /// Check if the server is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the server's bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Get the number of active sessions.
    pub fn connection_count(&self) -> usize {
        self.tracker.active()
    }

    /// Get the server uptime.
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for TelnetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetServer")
            .field("bind_address", &self.bind_address())
            .field("running", &self.is_running())
            .field("connection_count", &self.connection_count())
            .field("uptime", &self.uptime())
            .finish()
    }
}

// Ensure the accept loop stops if the server is dropped while running
impl Drop for TelnetServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("TelnetServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown.cancel();
        }
    }
}

/// Live-session accounting: how many are running, and a drain signal for
/// graceful shutdown.
struct SessionTracker {
    active: AtomicUsize,
    drained: Notify,
}

impl SessionTracker {
    fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    fn register(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
        gauge!("mocktel.connections.active").increment(1.0);
    }

    fn deregister(&self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        gauge!("mocktel.connections.active").decrement(1.0);
        if remaining == 0 {
            self.drained.notify_waiters();
        }
    }

    fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once no sessions remain. The notified future is created
    /// before the count is checked, so a session ending in between cannot
    /// be missed.
    async fn drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}
