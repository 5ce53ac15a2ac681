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

//! Per-connection session loop.
//!
//! One `Session` drives one accepted connection through its whole
//! lifecycle: pre-login banner, login handshake, then the command loop,
//! strictly in that order with no pipelining. Every write is best-effort:
//! a failed send is swallowed and the session ends naturally on the next
//! failed read. Nothing that happens here can disturb the acceptor or any
//! other session.

use crate::auth::{self, AuthMode, AuthOutcome, AuthState};
use crate::command::{self, CLIENT_DISCONNECT_TOKEN, Dispatch};
use crate::config::ServerConfig;
use crate::gate::ConnectionGate;
use crate::types::ConnectionId;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use mocktel_linecodec::{LineCodec, LineEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Everything one line read can resolve to.
#[derive(Debug)]
enum ReadOutcome {
    /// A complete line arrived before the idle deadline.
    Line(String),
    /// The client asked to disconnect via `IAC DO`.
    Disconnect,
    /// No complete line arrived within the idle timeout. The line in
    /// progress, if any, is discarded with the session.
    TimedOut,
    /// The stream closed or faulted.
    Closed,
    /// A newer connection displaced this one (exclusivity policy).
    Displaced,
}

/// One connection's protocol state machine.
pub(crate) struct Session<S> {
    id: ConnectionId,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
    framed: Framed<S, LineCodec>,
    displaced: Option<CancellationToken>,
    authenticated: bool,
    username: Option<String>,
    login_attempts: u32,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an accepted stream into a session.
    pub(crate) fn new(
        id: ConnectionId,
        peer_addr: SocketAddr,
        io: S,
        config: Arc<ServerConfig>,
        displaced: Option<CancellationToken>,
    ) -> Self {
        Self {
            id,
            peer_addr,
            config,
            framed: Framed::new(io, LineCodec::new()),
            displaced,
            authenticated: false,
            username: None,
            login_attempts: 0,
        }
    }

    /// Run the session to completion: banner, handshake, command loop,
    /// teardown. Consumes the session; dropping it closes the stream.
    pub(crate) async fn run(mut self, gate: Arc<ConnectionGate>) {
        info!(id = %self.id, peer = %self.peer_addr, "session started");
        counter!("mocktel.sessions.started").increment(1);

        let config = Arc::clone(&self.config);
        if let Some(banner) = config.banner_text() {
            self.send_line(&banner).await;
        }

        match self.authenticate().await {
            AuthOutcome::Authenticated { username } => {
                if let Some(name) = &username {
                    info!(id = %self.id, username = %name, "login successful");
                }
                self.username = username;
                if let Some(welcome) = config.welcome_text() {
                    self.send_line(&welcome).await;
                }
                self.command_loop().await;
            }
            AuthOutcome::Rejected => {
                counter!("mocktel.sessions.rejected").increment(1);
                debug!(id = %self.id, attempts = self.login_attempts, "login attempts exhausted");
            }
            AuthOutcome::Aborted => {
                debug!(id = %self.id, "session aborted during login");
            }
        }

        gate.release(self.id);
        counter!("mocktel.sessions.ended").increment(1);
        info!(
            id = %self.id,
            authenticated = self.authenticated,
            username = ?self.username,
            "session ended"
        );
    }

    /// Drive the login handshake.
    ///
    /// A timeout, stream closure, or client disconnect request anywhere in
    /// the sequence aborts the whole handshake with no further messages.
    async fn authenticate(&mut self) -> AuthOutcome {
        let config = Arc::clone(&self.config);

        if config.auth_mode == AuthMode::None {
            self.trace_auth(AuthState::Authenticated);
            self.authenticated = true;
            return AuthOutcome::Authenticated { username: None };
        }

        while self.login_attempts < config.max_login_attempts {
            self.trace_auth(AuthState::Prompting);
            self.send(&format!("{} ", config.login_prompt)).await;
            let username = match self.read_line(false).await {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Displaced => {
                    self.notify_displaced().await;
                    return AuthOutcome::Aborted;
                }
                ReadOutcome::TimedOut | ReadOutcome::Closed | ReadOutcome::Disconnect => {
                    return AuthOutcome::Aborted;
                }
            };

            let password = if config.auth_mode == AuthMode::UsernameAndPassword {
                self.send(&format!("{} ", config.password_prompt)).await;
                match self.read_line(true).await {
                    ReadOutcome::Line(line) => Some(line),
                    ReadOutcome::Displaced => {
                        self.notify_displaced().await;
                        return AuthOutcome::Aborted;
                    }
                    ReadOutcome::TimedOut | ReadOutcome::Closed | ReadOutcome::Disconnect => {
                        return AuthOutcome::Aborted;
                    }
                }
            } else {
                None
            };

            self.trace_auth(AuthState::Verifying);
            if auth::verify(
                config.auth_mode,
                &config.credentials,
                &username,
                password.as_deref(),
            ) {
                self.trace_auth(AuthState::Authenticated);
                self.authenticated = true;
                self.send_line(&config.success_message).await;
                return AuthOutcome::Authenticated {
                    username: Some(username),
                };
            }

            self.login_attempts += 1;
            debug!(id = %self.id, attempts = self.login_attempts, "login attempt failed");
            self.send_line(&config.fail_message).await;
        }

        self.trace_auth(AuthState::Rejected);
        self.send_line(&config.too_many_attempts_message).await;
        AuthOutcome::Rejected
    }

    /// The command round-trip loop: prompt, read, dispatch, respond.
    /// A new prompt is never sent until the previous response is out.
    async fn command_loop(&mut self) {
        let config = Arc::clone(&self.config);
        loop {
            self.send(&config.prompt_text()).await;

            let line = match self.read_line(false).await {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Disconnect => CLIENT_DISCONNECT_TOKEN.to_string(),
                ReadOutcome::Displaced => {
                    self.notify_displaced().await;
                    return;
                }
                ReadOutcome::TimedOut | ReadOutcome::Closed => {
                    self.send(&format!("\r\n{}\r\n", config.idle_timeout_message))
                        .await;
                    return;
                }
            };

            match command::dispatch(&line, &config.commands, &config.invalid_command_message) {
                Dispatch::Silent => {}
                Dispatch::Reply(response) => self.send_line(&response).await,
                Dispatch::Close(response) => {
                    self.send_line(&response).await;
                    return;
                }
            }
        }
    }

    /// Read one line with the idle deadline applied across the whole
    /// read, racing the displacement signal.
    ///
    /// The deadline is measured from the start of the read; bytes that
    /// arrive without a terminator do not reset it, and a partial line is
    /// discarded when the deadline passes. `mask_input` is set for
    /// password entry and only keeps the received content out of trace
    /// logs; framing is unaffected.
    async fn read_line(&mut self, mask_input: bool) -> ReadOutcome {
        let idle_timeout = self.config.idle_timeout;
        let displaced = self.displaced.clone();
        tokio::select! {
            () = displacement(displaced) => ReadOutcome::Displaced,
            read = time::timeout(idle_timeout, self.framed.next()) => match read {
                Err(_) => ReadOutcome::TimedOut,
                Ok(None) => ReadOutcome::Closed,
                Ok(Some(Ok(LineEvent::Line(line)))) => {
                    if mask_input {
                        trace!(id = %self.id, "line received (masked)");
                    } else {
                        trace!(id = %self.id, ?line, "line received");
                    }
                    ReadOutcome::Line(line)
                }
                Ok(Some(Ok(LineEvent::Disconnect))) => {
                    debug!(id = %self.id, "client sent IAC DO disconnect request");
                    ReadOutcome::Disconnect
                }
                Ok(Some(Err(error))) => {
                    debug!(id = %self.id, %error, "read failed");
                    ReadOutcome::Closed
                }
            },
        }
    }

    /// Best-effort write with no line ending appended.
    async fn send(&mut self, text: &str) {
        if let Err(error) = self.framed.send(text).await {
            debug!(id = %self.id, %error, "write failed");
        }
    }

    /// Best-effort write of one CRLF-terminated message line.
    async fn send_line(&mut self, text: &str) {
        self.send(&format!("{text}\r\n")).await;
    }

    /// Tell the peer it has been displaced by a newer connection.
    async fn notify_displaced(&mut self) {
        counter!("mocktel.sessions.displaced").increment(1);
        debug!(id = %self.id, "displaced by newer connection");
        let notice = format!("\r\n{}\r\n", self.config.displaced_message);
        self.send(&notice).await;
    }

    fn trace_auth(&self, state: AuthState) {
        trace!(id = %self.id, %state, "auth state");
    }
}

/// Resolves when the session has been displaced; pends forever when the
/// exclusivity policy is off.
async fn displacement(token: Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled_owned().await,
        None => std::future::pending().await,
    }
}
