use crate::ServerInfo;
use crate::error::model_error::ModelError;

use std::path::PathBuf;

/// Builder for creating validated ServerInfo instances.
#[derive(Debug, Default)]
pub struct ServerInfoBuilder {
    pid: Option<u32>,
    socket_path: Option<PathBuf>,
    command: Option<String>,
    owned: Option<bool>,
}

impl ServerInfoBuilder {
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_optional_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    pub fn with_command(mut self, cmd: impl Into<String>) -> Self {
        self.command = Some(cmd.into());
        self
    }

    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = Some(owned);
        self
    }

    /// Build the ServerInfo with validation.
    ///
    /// The PID is optional (an attached server may not be visible to process
    /// discovery) but must be non-zero when present.
    #[track_caller]
    pub fn build(self) -> Result<ServerInfo, ModelError> {
        if self.pid == Some(0) {
            return Err(ModelError::validation("PID must be non-zero"));
        }

        let socket_path = self
            .socket_path
            .ok_or_else(|| ModelError::validation("Socket path is required"))?;

        if socket_path.as_os_str().is_empty() {
            return Err(ModelError::validation("Socket path cannot be empty"));
        }

        let command = self
            .command
            .ok_or_else(|| ModelError::validation("Command is required"))?;

        if command.is_empty() {
            return Err(ModelError::validation("Command cannot be empty"));
        }

        let owned = self
            .owned
            .ok_or_else(|| ModelError::validation("Owned is required"))?;

        if owned && self.pid.is_none() {
            return Err(ModelError::validation("An owned server must have a PID"));
        }

        Ok(ServerInfo {
            pid: self.pid,
            socket_path,
            command,
            owned,
        })
    }
}
