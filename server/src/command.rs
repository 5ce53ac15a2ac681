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

//! Command registration and dispatch.
//!
//! Commands are pure text-to-text handlers keyed by name. Lookup is
//! case-insensitive and two-staged: exact match first, then a scan for
//! the first registered key the input line starts with. The fallback is
//! positional, not best-match: a key that is a prefix of another (say
//! `add` vs `address`) shadows the longer one if it was registered first.
//! Registration order is therefore part of the dispatch contract and the
//! set preserves it.

use metrics::counter;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The token the line framer substitutes for a client `IAC DO` close
/// request. Dispatch treats it like a typed session terminator.
pub(crate) const CLIENT_DISCONNECT_TOKEN: &str = "BYE";

/// A named, pure transformation from the full command line to a response.
///
/// Handlers must not hold session state; the same input yields the same
/// response at any point in any session.
pub type CommandHandler = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// An ordered set of command handlers keyed by case-insensitive name.
#[derive(Clone, Default)]
pub struct CommandSet {
    entries: Vec<(String, CommandHandler)>,
}

impl CommandSet {
    /// Create an empty command set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a handler under `name`.
    ///
    /// A case-insensitive re-registration replaces the handler in place,
    /// keeping the original position so prefix-match precedence is stable.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        let handler: CommandHandler = Arc::new(handler);
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((name, handler)),
        }
    }

    /// Iterate the registered command names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Exact case-insensitive lookup.
    fn exact(&self, line: &str) -> Option<&CommandHandler> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(line))
            .map(|(_, handler)| handler)
    }

    /// First registered key the line starts with, case-insensitively.
    fn prefix(&self, line: &str) -> Option<&CommandHandler> {
        let bytes = line.as_bytes();
        self.entries
            .iter()
            .find(|(key, _)| {
                bytes.len() >= key.len()
                    && bytes[..key.len()].eq_ignore_ascii_case(key.as_bytes())
            })
            .map(|(_, handler)| handler)
    }

    /// The built-in default command set, installed at server construction
    /// when the configured set is empty.
    pub fn defaults() -> Self {
        let mut set = Self::new();
        set.register("help", |_line: &str| {
            "Available commands: help, time, echo <msg>, add <num1> <num2>, exit".to_string()
        });
        set.register("time", |_line: &str| {
            jiff::Zoned::now()
                .strftime("%Y-%m-%d %H:%M:%S")
                .to_string()
        });
        set.register("echo", |line: &str| match line.split_once(' ') {
            Some((_, rest)) => rest.to_string(),
            None => "Usage: echo <message>".to_string(),
        });
        set.register("add", |line: &str| {
            let mut parts = line.splitn(3, ' ');
            let _ = parts.next();
            let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
                return "Usage: add <num1> <num2>".to_string();
            };
            match (first.parse::<i32>(), second.parse::<i32>()) {
                (Ok(n1), Ok(n2)) => format!("Result: {}", n1 + n2),
                _ => "Invalid numbers.".to_string(),
            }
        });
        set.register("exit", |_line: &str| "Goodbye!".to_string());
        set
    }
}

impl fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSet")
            .field("commands", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// What the session loop should do with a dispatched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Blank input: send nothing, re-issue the prompt.
    Silent,
    /// Send the response and keep the session open.
    Reply(String),
    /// Send the response and end the session.
    Close(String),
}

/// Dispatch one submitted line against the command set.
///
/// Precedence, in order: blank lines are silently ignored; `BYE` (the
/// disconnect token lifted out of the byte stream by the framer) ends the
/// session; `exit` and `quit` end the session BEFORE any mapping lookup,
/// shadowing handlers registered under those names; an exact
/// case-insensitive key match wins over any prefix; otherwise the first
/// registered key the line starts with is invoked. Matched handlers
/// always receive the full original line.
pub fn dispatch(line: &str, commands: &CommandSet, invalid_message: &str) -> Dispatch {
    if line.trim().is_empty() {
        return Dispatch::Silent;
    }

    if line.eq_ignore_ascii_case(CLIENT_DISCONNECT_TOKEN) {
        return Dispatch::Close("Connection terminated by client.".to_string());
    }

    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Dispatch::Close("Goodbye!".to_string());
    }

    if let Some(handler) = commands.exact(line).or_else(|| commands.prefix(line)) {
        counter!("mocktel.commands.dispatched").increment(1);
        return Dispatch::Reply(handler(line));
    }

    debug!(?line, "no matching command");
    counter!("mocktel.commands.invalid").increment(1);
    Dispatch::Reply(invalid_message.to_string())
}
