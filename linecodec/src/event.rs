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

///
/// `LineEvent` is what the framer hands to the session layer: either one
/// complete line of input, or a client-initiated close request lifted out
/// of the byte stream.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// One complete line, terminators stripped, decoded as ASCII text.
    Line(String),
    /// The client sent `IAC DO` (Ctrl+]) asking the server to close.
    /// Any line in progress has been abandoned.
    Disconnect,
}
