// ABOUTME: Per-call option types for commands and init sequences
// ABOUTME: Fluent builders with defaults taken from the client configuration

use std::time::Duration;

/// Options for a single [`command`] or [`sms_command`] call.
///
/// Anything left unset falls back to the client-wide configuration.
///
/// [`command`]: crate::AtClient::command_with
/// [`sms_command`]: crate::AtClient::sms_command_with
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    pub(crate) timeout: Option<Duration>,
}

impl CommandOptions {
    /// Create options with all values at their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the command deadline.
    ///
    /// Dial and SMS commands regularly need more headroom than the driver
    /// default; network round-trips can take tens of seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for an [`init_with`] call.
///
/// [`init_with`]: crate::AtClient::init_with
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub(crate) cmds: Option<Vec<String>>,
    pub(crate) timeout: Option<Duration>,
}

impl InitOptions {
    /// Create options with all values at their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the init command list configured on the client.
    pub fn cmds<I, T>(mut self, cmds: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.cmds = Some(cmds.into_iter().map(Into::into).collect());
        self
    }

    /// Override the deadline applied to each init sub-command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
