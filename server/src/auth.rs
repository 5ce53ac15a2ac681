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

//! Credential verification for the login handshake.
//!
//! The interactive half of the handshake (prompting, bounded retries,
//! abort on timeout) lives in the session loop; this module holds the
//! authentication mode, the pure verification step, and the state names
//! the session traces as it moves through the handshake.

use std::collections::HashMap;
use std::fmt;

/// How a connection must authenticate before reaching the command shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// No login sequence; the connection goes straight to the shell.
    None,
    /// A username that exists as a key in the credential mapping is
    /// sufficient; no password is requested.
    UsernameOnly,
    /// Username and password must exactly match a credential entry.
    #[default]
    UsernameAndPassword,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::UsernameOnly => write!(f, "username-only"),
            Self::UsernameAndPassword => write!(f, "username-and-password"),
        }
    }
}

/// Handshake states, traced per attempt as the session works through the
/// login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthState {
    Prompting,
    Verifying,
    Authenticated,
    Rejected,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompting => write!(f, "prompting"),
            Self::Verifying => write!(f, "verifying"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Result of the whole handshake, as seen by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AuthOutcome {
    /// The client may enter the command loop. `username` is `None` when
    /// the mode required no login.
    Authenticated {
        /// The username the client authenticated as, if any.
        username: Option<String>,
    },
    /// Every permitted attempt failed; the rejection message has been
    /// sent and the connection must close.
    Rejected,
    /// The handshake was cut short (idle timeout, stream closure, or a
    /// client disconnect request); the connection ends with no further
    /// messages.
    Aborted,
}

/// Verify one submitted credential pair against the mapping.
///
/// Username lookup and password comparison are both case-sensitive. Under
/// [`AuthMode::UsernameOnly`] the password is irrelevant and ignored;
/// under [`AuthMode::None`] everything verifies trivially.
pub(crate) fn verify(
    mode: AuthMode,
    credentials: &HashMap<String, String>,
    username: &str,
    password: Option<&str>,
) -> bool {
    match mode {
        AuthMode::None => true,
        AuthMode::UsernameOnly => credentials.contains_key(username),
        AuthMode::UsernameAndPassword => match password {
            Some(password) => credentials
                .get(username)
                .is_some_and(|expected| expected == password),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("alice".to_string(), "wonderland".to_string());
        map.insert("bob".to_string(), "builder".to_string());
        map
    }

    #[test]
    fn username_and_password_requires_exact_match() {
        let creds = credentials();
        let mode = AuthMode::UsernameAndPassword;

        assert!(verify(mode, &creds, "alice", Some("wonderland")));
        assert!(!verify(mode, &creds, "alice", Some("Wonderland")));
        assert!(!verify(mode, &creds, "alice", Some("builder")));
        assert!(!verify(mode, &creds, "alice", None));
        assert!(!verify(mode, &creds, "mallory", Some("wonderland")));
    }

    #[test]
    fn username_lookup_is_case_sensitive() {
        let creds = credentials();
        assert!(!verify(
            AuthMode::UsernameAndPassword,
            &creds,
            "Alice",
            Some("wonderland"),
        ));
        assert!(!verify(AuthMode::UsernameOnly, &creds, "ALICE", None));
    }

    #[test]
    fn username_only_ignores_password() {
        let creds = credentials();
        let mode = AuthMode::UsernameOnly;

        assert!(verify(mode, &creds, "bob", None));
        assert!(verify(mode, &creds, "bob", Some("not-builder")));
        assert!(!verify(mode, &creds, "mallory", None));
    }

    #[test]
    fn none_mode_verifies_trivially() {
        let creds = HashMap::new();
        assert!(verify(AuthMode::None, &creds, "anyone", None));
    }

    #[test]
    fn default_mode_is_username_and_password() {
        assert_eq!(AuthMode::default(), AuthMode::UsernameAndPassword);
    }
}
