// ABOUTME: Deletion capability adapters: external helper command and a disabled fallback
// ABOUTME: Only a zero exit status within the timeout counts as a confirmed deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! The platform API offers no activity deletion, so removal is delegated to
//! an operator-supplied helper (typically browser automation). The helper is
//! invoked as `<program> [args...] <activity_id>` with the account login in
//! its environment. Credentials never appear on the command line.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::core::{AccountCredential, DeletionCapability};

/// Environment variable carrying the account email to the helper
pub const ACCOUNT_EMAIL_ENV: &str = "CADECALC_ACCOUNT_EMAIL";
/// Environment variable carrying the account password to the helper
pub const ACCOUNT_PASSWORD_ENV: &str = "CADECALC_ACCOUNT_PASSWORD";

/// Default time the helper may take before it is killed
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs an external helper program to delete an activity
#[derive(Debug, Clone)]
pub struct CommandDeletion {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandDeletion {
    /// Helper `program` with fixed leading `args`
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }

    /// Parse a whitespace-separated command line; `None` if it is blank
    #[must_use]
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Override the helper timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DeletionCapability for CommandDeletion {
    #[instrument(skip(self, account), fields(activity.id = activity_id, program = %self.program))]
    async fn delete(&self, account: &AccountCredential, activity_id: u64) -> bool {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(activity_id.to_string())
            .env(ACCOUNT_EMAIL_ENV, &account.email)
            .env(ACCOUNT_PASSWORD_ENV, account.password())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match command.spawn() {
            Ok(child) => timeout(self.timeout, child.wait_with_output()).await,
            Err(e) => {
                error!(error = %e, "failed to start deletion helper");
                return false;
            }
        };

        match output {
            Ok(Ok(output)) if output.status.success() => {
                info!("deletion helper confirmed removal");
                true
            }
            Ok(Ok(output)) => {
                warn!(
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "deletion helper reported failure"
                );
                false
            }
            Ok(Err(e)) => {
                error!(error = %e, "deletion helper I/O failed");
                false
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "deletion helper timed out");
                false
            }
        }
    }
}

/// Used when no helper is configured; never deletes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDeletion;

#[async_trait]
impl DeletionCapability for DisabledDeletion {
    async fn delete(&self, _account: &AccountCredential, activity_id: u64) -> bool {
        warn!(
            activity.id = activity_id,
            "no deletion helper configured; original activity kept"
        );
        false
    }
}
