pub mod builder;

use std::path::PathBuf;

use serde::Serialize;

/// Reference to the wmediumd server the connector talks to.
///
/// `owned` is set only when the connector spawned the process itself and is
/// therefore allowed to stop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub pid: Option<u32>,
    pub socket_path: PathBuf,
    pub command: String,
    pub owned: bool,
}
