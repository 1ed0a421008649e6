use models::ServerInfo;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

/// Lifecycle of the manager's control channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl Display for ConnectionState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
        };
        formatter.write_str(name)
    }
}

/// The active connection of a manager. A new handle (with a new id) is issued
/// every time a channel is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionHandle {
    id: Uuid,
    socket_path: PathBuf,
    owner_pid: u32,
    server: ServerInfo,
    connected_at: SystemTime,
}

impl ConnectionHandle {
    pub(crate) fn new(socket_path: PathBuf, server: ServerInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            socket_path,
            owner_pid: std::process::id(),
            server,
            connected_at: SystemTime::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// PID of the process holding the connection.
    pub fn owner_pid(&self) -> u32 {
        self.owner_pid
    }

    pub fn server(&self) -> &ServerInfo {
        &self.server
    }

    pub fn connected_at(&self) -> SystemTime {
        self.connected_at
    }
}

impl Display for ConnectionHandle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(
            formatter,
            "{} ({}, since {})",
            self.id,
            self.socket_path.display(),
            humantime::format_rfc3339_seconds(self.connected_at)
        )
    }
}
