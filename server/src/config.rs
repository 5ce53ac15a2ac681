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

//! Server configuration

use crate::auth::AuthMode;
use crate::command::CommandSet;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Generator for dynamic user-facing text. When both a static string and
/// a generator are configured for the same slot, the generator wins.
pub type TextGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Server configuration
///
/// This structure contains all configuration options for the mock Telnet
/// server: every user-facing string, the authentication policy, the
/// credential and command mappings, and the connection limits. It is
/// consumed once at server construction and read-only thereafter.
///
/// # Example
///
/// ```
/// use mocktel_server::{AuthMode, ServerConfig};
/// use std::time::Duration;
///
/// let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
///     .with_auth_mode(AuthMode::UsernameOnly)
///     .with_credential("alice", "")
///     .with_idle_timeout(Duration::from_secs(30));
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Static pre-login banner. Sent before the login sequence when set.
    pub banner: Option<String>,

    /// Generator for the pre-login banner; takes precedence over
    /// [`banner`](Self::banner).
    pub banner_generator: Option<TextGenerator>,

    /// Static post-login welcome, sent after successful authentication.
    pub welcome: Option<String>,

    /// Generator for the post-login welcome; takes precedence over
    /// [`welcome`](Self::welcome).
    pub welcome_generator: Option<TextGenerator>,

    /// Static command prompt. Sent with no line ending.
    pub prompt: String,

    /// Generator for the prompt; takes precedence over
    /// [`prompt`](Self::prompt).
    pub prompt_generator: Option<TextGenerator>,

    /// Authentication policy for new connections.
    pub auth_mode: AuthMode,

    /// Prompt for the username stage (a single space is appended on the
    /// wire).
    pub login_prompt: String,

    /// Prompt for the password stage (a single space is appended on the
    /// wire).
    pub password_prompt: String,

    /// Sent once after successful authentication.
    pub success_message: String,

    /// Sent after each failed login attempt that leaves attempts
    /// remaining.
    pub fail_message: String,

    /// Sent when every permitted login attempt has failed, immediately
    /// before the connection closes.
    pub too_many_attempts_message: String,

    /// Sent when a line matches no registered command.
    pub invalid_command_message: String,

    /// Sent when a read stalls past the idle timeout during the command
    /// loop.
    pub idle_timeout_message: String,

    /// Sent to a connection displaced by a newer one under the
    /// single-connection policy.
    pub displaced_message: String,

    /// Maximum login attempts before the connection is rejected.
    pub max_login_attempts: u32,

    /// Maximum wall-clock time one line read may wait, measured from the
    /// start of the read. Byte activity does not reset it.
    pub idle_timeout: Duration,

    /// Admit at most one live connection, displacing the previous one
    /// when a new connection arrives.
    pub single_connection: bool,

    /// Maximum number of concurrent connections.
    pub max_connections: usize,

    /// How long `shutdown` waits for in-flight sessions to drain.
    pub shutdown_timeout: Duration,

    /// Credential mapping, username to password. Lookup and comparison
    /// are case-sensitive.
    pub credentials: HashMap<String, String>,

    /// Command mapping. Left empty, the built-in default set is installed
    /// at server construction.
    pub commands: CommandSet,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:23".parse().unwrap(),
            banner: None,
            banner_generator: None,
            welcome: None,
            welcome_generator: None,
            prompt: "> ".to_string(),
            prompt_generator: None,
            auth_mode: AuthMode::default(),
            login_prompt: "Login:".to_string(),
            password_prompt: "Password:".to_string(),
            success_message: "Login successful!".to_string(),
            fail_message: "Login failed. Try again.".to_string(),
            too_many_attempts_message: "Too many failed attempts. Disconnecting.".to_string(),
            invalid_command_message: "Invalid command.".to_string(),
            idle_timeout_message: "Idle timeout, disconnecting.".to_string(),
            displaced_message: "Connection closed by server: new connection requested.".to_string(),
            max_login_attempts: 3,
            idle_timeout: Duration::from_secs(60),
            single_connection: false,
            max_connections: 1000,
            shutdown_timeout: Duration::from_secs(30),
            credentials: HashMap::new(),
            commands: CommandSet::new(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given bind address.
    ///
    /// All other settings use their default values.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the static pre-login banner.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Set the pre-login banner generator (wins over the static banner).
    pub fn with_banner_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.banner_generator = Some(Arc::new(generator));
        self
    }

    /// Set the static post-login welcome.
    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = Some(welcome.into());
        self
    }

    /// Set the post-login welcome generator (wins over the static text).
    pub fn with_welcome_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.welcome_generator = Some(Arc::new(generator));
        self
    }

    /// Set the static command prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the prompt generator (wins over the static prompt).
    pub fn with_prompt_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.prompt_generator = Some(Arc::new(generator));
        self
    }

    /// Set the authentication mode.
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Set the username-stage prompt.
    pub fn with_login_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.login_prompt = prompt.into();
        self
    }

    /// Set the password-stage prompt.
    pub fn with_password_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.password_prompt = prompt.into();
        self
    }

    /// Set the successful-login message.
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Set the failed-attempt message.
    pub fn with_fail_message(mut self, message: impl Into<String>) -> Self {
        self.fail_message = message.into();
        self
    }

    /// Set the attempts-exhausted message.
    pub fn with_too_many_attempts_message(mut self, message: impl Into<String>) -> Self {
        self.too_many_attempts_message = message.into();
        self
    }

    /// Set the unmatched-command message.
    pub fn with_invalid_command_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_command_message = message.into();
        self
    }

    /// Set the idle-timeout message.
    pub fn with_idle_timeout_message(mut self, message: impl Into<String>) -> Self {
        self.idle_timeout_message = message.into();
        self
    }

    /// Set the displaced-connection notice.
    pub fn with_displaced_message(mut self, message: impl Into<String>) -> Self {
        self.displaced_message = message.into();
        self
    }

    /// Set the maximum number of login attempts.
    pub fn with_max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    /// Set the idle timeout duration.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Enable or disable the single-connection exclusivity policy.
    pub fn with_single_connection(mut self, exclusive: bool) -> Self {
        self.single_connection = exclusive;
        self
    }

    /// Set the maximum number of concurrent connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the graceful shutdown drain timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Add one credential pair.
    pub fn with_credential(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials.insert(username.into(), password.into());
        self
    }

    /// Replace the whole credential mapping.
    pub fn with_credentials(mut self, credentials: HashMap<String, String>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Register a command handler.
    pub fn with_command<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.commands.register(name, handler);
        self
    }

    /// Resolve the pre-login banner, generator first.
    pub fn banner_text(&self) -> Option<String> {
        match &self.banner_generator {
            Some(generator) => Some(generator()),
            None => self.banner.clone(),
        }
    }

    /// Resolve the post-login welcome, generator first.
    pub fn welcome_text(&self) -> Option<String> {
        match &self.welcome_generator {
            Some(generator) => Some(generator()),
            None => self.welcome.clone(),
        }
    }

    /// Resolve the current prompt, generator first.
    pub fn prompt_text(&self) -> String {
        match &self.prompt_generator {
            Some(generator) => generator(),
            None => self.prompt.clone(),
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_login_attempts == 0 {
            return Err("max_login_attempts must be at least 1".to_string());
        }

        if self.idle_timeout < Duration::from_secs(1) {
            return Err("idle_timeout must be at least 1 second".to_string());
        }

        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }

        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("auth_mode", &self.auth_mode)
            .field("max_login_attempts", &self.max_login_attempts)
            .field("idle_timeout", &self.idle_timeout)
            .field("single_connection", &self.single_connection)
            .field("max_connections", &self.max_connections)
            .field("credentials", &self.credentials.len())
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}
