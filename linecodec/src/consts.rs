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

//! Wire bytes recognized by the line framer.

/// Carriage Return, terminates a line.
pub const CR: u8 = 0x0D;

/// Line Feed, terminates a line.
pub const LF: u8 = 0x0A;

/// Interpret As Command, prefixes every Telnet control sequence.
pub const IAC: u8 = 0xFF;

/// Telnet DO negotiation verb. `IAC DO` is the pair a Telnet client
/// emits for Ctrl+] and is treated as a client-initiated close request.
pub const DO: u8 = 0xFD;

/// Telnet DONT negotiation verb (discarded).
pub const DONT: u8 = 0xFE;

/// Telnet WILL negotiation verb (discarded).
pub const WILL: u8 = 0xFB;

/// Telnet WONT negotiation verb (discarded).
pub const WONT: u8 = 0xFC;
