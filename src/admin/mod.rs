//! Administrative command helper: composes drbdadm invocations over a
//! resource list and runs them with a hard timeout.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::process::Command;
use tracing::info;

/// How long a drbdadm invocation may run before being abandoned.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// drbdadm actions the monitor can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Adjust,
    Attach,
    Detach,
    Connect,
    Disconnect,
    Primary,
    Secondary,
    Up,
    Down,
    CreateMd,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Adjust => "adjust",
            Action::Attach => "attach",
            Action::Detach => "detach",
            Action::Connect => "connect",
            Action::Disconnect => "disconnect",
            Action::Primary => "primary",
            Action::Secondary => "secondary",
            Action::Up => "up",
            Action::Down => "down",
            Action::CreateMd => "create-md",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One composed drbdadm invocation.
#[derive(Debug, Clone)]
pub struct AdminCommand {
    action: Action,
    resources: Vec<String>,
    extra_args: Vec<String>,
}

impl AdminCommand {
    pub fn new(action: Action, resources: Vec<String>) -> Self {
        Self {
            action,
            resources,
            extra_args: Vec::new(),
        }
    }

    /// Add an extra argument such as `--force` or `--discard-my-data`.
    pub fn with_arg(mut self, arg: &str) -> Self {
        self.extra_args.push(arg.to_string());
        self
    }

    /// Target every configured resource instead of a specific list.
    pub fn for_all(mut self) -> Self {
        self.resources = vec!["all".to_string()];
        self
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Commands that can destroy data or force state. These require an
    /// explicit confirmation unless expert mode is set.
    pub fn dangerous(&self) -> bool {
        self.action == Action::CreateMd
            || self
                .extra_args
                .iter()
                .any(|a| a == "--force" || a == "--discard-my-data")
    }

    pub fn needs_confirmation(&self, expert: bool) -> bool {
        self.dangerous() && !expert
    }

    fn args(&self) -> Vec<&str> {
        let mut args = vec![self.action.as_str()];
        args.extend(self.resources.iter().map(String::as_str));
        args.extend(self.extra_args.iter().map(String::as_str));
        args
    }

    /// The full command line, for confirmation prompts and reports.
    pub fn command_line(&self) -> String {
        let mut line = String::from("drbdadm");
        for arg in self.args() {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run the command, returning the combined output. Fails on non-zero
    /// exit (with the combined output in the message) and after
    /// [`COMMAND_TIMEOUT`].
    pub async fn run(&self) -> Result<String> {
        info!(command = %self.command_line(), "executing admin command");

        let output = tokio::time::timeout(
            COMMAND_TIMEOUT,
            Command::new("drbdadm").args(self.args()).output(),
        )
        .await
        .map_err(|_| {
            anyhow!(
                "'{}' timed out after {}s",
                self.command_line(),
                COMMAND_TIMEOUT.as_secs()
            )
        })?
        .with_context(|| format!("invoking '{}'", self.command_line()))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            bail!("'{}' failed: {}", self.command_line(), combined.trim());
        }

        Ok(combined)
    }
}
