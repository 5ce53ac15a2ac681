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

//! Fully Configured Mock Server Example
//!
//! This example wires up every configuration surface: dynamic banner and
//! prompt generators, username/password authentication, a custom command
//! set, and a command with its own comma-separated sub-grammar of the
//! kind device-control protocols use.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example mock_server
//! ```
//!
//! Then connect with:
//! ```bash
//! telnet localhost 2323
//! ```
//!
//! Log in as `alice` / `wonderland` and type `help`, or try
//! `#OUTPUT,225,1`.

use mocktel_server::{AuthMode, ServerConfig, TelnetServer};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config = ServerConfig::new("127.0.0.1:2323".parse()?)
        .with_banner("=== Welcome! Please login ===")
        .with_welcome_generator(|| {
            format!(
                "Login time: {}",
                jiff::Zoned::now().strftime("%Y-%m-%d %H:%M:%S"),
            )
        })
        .with_prompt_generator(|| format!("mockserver@{}> ", jiff::Zoned::now().strftime("%H:%M")))
        .with_auth_mode(AuthMode::UsernameAndPassword)
        .with_login_prompt("Username:")
        .with_password_prompt("Password:")
        .with_success_message("You are now logged in!")
        .with_fail_message("Incorrect credentials, please try again.")
        .with_too_many_attempts_message("Maximum login attempts reached. Disconnecting.")
        .with_invalid_command_message("Unknown command, type 'help' for list.")
        .with_idle_timeout_message("Disconnected due to inactivity.")
        .with_max_login_attempts(3)
        .with_idle_timeout(Duration::from_secs(120))
        .with_credential("user", "pass")
        .with_credential("alice", "wonderland")
        .with_credential("bob", "builder")
        .with_command("help", |_line| {
            "Commands: help, time, echo <msg>, add <num1> <num2>, exit".to_string()
        })
        .with_command("time", |_line| {
            jiff::Zoned::now()
                .strftime("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .with_command("echo", |line| match line.split_once(' ') {
            Some((_, rest)) => rest.to_string(),
            None => "Usage: echo <message>".to_string(),
        })
        .with_command("add", |line| {
            let mut parts = line.splitn(3, ' ');
            let _ = parts.next();
            let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
                return "Usage: add <num1> <num2>".to_string();
            };
            match (first.parse::<i32>(), second.parse::<i32>()) {
                (Ok(n1), Ok(n2)) => format!("Sum is: {}", n1 + n2),
                _ => "Invalid numbers.".to_string(),
            }
        })
        .with_command("exit", |_line| "Goodbye!".to_string())
        .with_command("#OUTPUT", output_command);

    let server = TelnetServer::new(config).await?;

    println!("Mock Telnet Server running on 127.0.0.1:2323");
    println!("Press Ctrl+C to stop");

    server.start().await?;

    tokio::signal::ctrl_c().await?;

    server.shutdown().await?;

    Ok(())
}

/// Handler for the `#OUTPUT,<num1>,<num2>` sub-grammar.
///
/// The whole line is the handler's input; it splits on commas, checks the
/// leading token, and echoes the two operands back as `?OUTPUT,...`.
fn output_command(line: &str) -> String {
    let parts: Vec<&str> = line.split(',').filter(|part| !part.is_empty()).collect();
    if parts.len() == 3 && parts[0].eq_ignore_ascii_case("#OUTPUT") {
        match (parts[1].parse::<i32>(), parts[2].parse::<i32>()) {
            (Ok(num1), Ok(num2)) => format!("?OUTPUT,{num1},{num2}"),
            _ => "Invalid number format.".to_string(),
        }
    } else {
        "Invalid command format. Use #OUTPUT,<num1>,<num2>".to_string()
    }
}
