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

//! # Mocktel Line Framing Codec
//!
//! This crate provides the byte-level framing layer of the mocktel Telnet
//! server: a stateful, byte-oriented [`LineCodec`] that assembles one line
//! of input at a time from a raw byte stream, with inline interception of
//! Telnet IAC control sequences.
//!
//! ## Framing Rules
//!
//! - A line is terminated by CR, LF, or CR-LF. After a CR, one
//!   already-buffered byte is consumed and discarded (this swallows the LF
//!   of a CR-LF pair) without waiting for further input.
//! - The IAC byte (`0xFF`) triggers a one-byte lookahead. `IAC DO`
//!   (`0xFF 0xFD`) - the sequence a Telnet client sends for Ctrl+] - is a
//!   client-initiated close request and yields [`LineEvent::Disconnect`],
//!   abandoning the line in progress. Every other IAC-prefixed byte pair
//!   is silently discarded; no further option negotiation is implemented.
//! - Bytes are interpreted as single-byte ASCII text.
//!
//! ## Usage Example
//!
//! ```rust
//! use mocktel_linecodec::{LineCodec, LineEvent};
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! # fn example() -> Result<(), mocktel_linecodec::CodecError> {
//! let mut codec = LineCodec::new();
//! let mut input = BytesMut::from(&b"help\r\n"[..]);
//! assert_eq!(
//!     codec.decode(&mut input)?,
//!     Some(LineEvent::Line("help".to_string())),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! `LineCodec` is **not** thread-safe and should not be shared between
//! threads without synchronization. Each connection owns its own codec
//! instance, typically inside a `tokio_util::codec::Framed`.

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

mod codec;
pub mod consts;
mod event;
mod result;

pub use self::codec::LineCodec;
pub use self::event::LineEvent;
pub use self::result::{CodecError, CodecResult};
