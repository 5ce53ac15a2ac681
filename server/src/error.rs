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

//! Error types for the mock Telnet server.
//!
//! Per-connection faults are deliberately NOT represented here: a read or
//! write that fails because the peer went away ends that session and is
//! swallowed locally, never surfaced to the listener or other sessions.
//! These variants cover the server lifecycle itself.

use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Mock Telnet server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error from the TCP listener or a connection stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error from the codec layer.
    #[error("Codec error: {0}")]
    Codec(#[from] mocktel_linecodec::CodecError),

    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start` was called while the server was already running.
    #[error("Server already running")]
    AlreadyRunning,

    /// `shutdown` was called while the server was not running.
    #[error("Server not running")]
    NotRunning,
}

impl ServerError {
    /// Check if the error is a connection-level fault rather than a
    /// lifecycle misuse.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ServerError::Io(_) | ServerError::Codec(_))
    }
}
