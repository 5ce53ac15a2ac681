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

//! Configurable Mock Telnet Server
//!
//! A login-gated, command-driven remote terminal for exercising clients
//! that speak the Telnet protocol. Every observable behavior - banner,
//! prompts, authentication policy, credentials, commands, timeouts,
//! exclusivity - is injected through [`ServerConfig`]; the server itself
//! is the per-connection protocol machine.
//!
//! # Architecture
//!
//! ```text
//! TelnetServer (accept loop, graceful drain)
//!     ↓ one task per connection
//! Session (banner → auth handshake → command loop)
//!     ↓
//! Framed<TcpStream, LineCodec> (line framing, IAC interception)
//! ```
//!
//! Connections are fully isolated from each other: the only cross-session
//! state is the read-only configuration and, when the single-connection
//! policy is on, the exclusivity slot that displaces the previous
//! connection whenever a new one arrives.
//!
//! # Example
//!
//! ```no_run
//! use mocktel_server::{AuthMode, ServerConfig, TelnetServer};
//!
//! #[tokio::main]
//! async fn main() -> mocktel_server::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1:2323".parse().unwrap())
//!         .with_banner("=== Welcome! Please login ===")
//!         .with_auth_mode(AuthMode::UsernameAndPassword)
//!         .with_credential("alice", "wonderland")
//!         .with_command("ping", |_line| "pong".to_string());
//!
//!     let server = TelnetServer::new(config).await?;
//!     server.start().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod auth;
mod command;
mod config;
mod error;
mod gate;
mod server;
mod session;
mod types;

pub use self::auth::AuthMode;
pub use self::command::{CommandHandler, CommandSet, Dispatch, dispatch};
pub use self::config::{ServerConfig, TextGenerator};
pub use self::error::{Result, ServerError};
pub use self::server::TelnetServer;
pub use self::types::ConnectionId;
