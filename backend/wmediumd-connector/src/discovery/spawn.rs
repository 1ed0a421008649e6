use crate::config::ConnectorConfig;
use crate::discovery::process::with_process;
use crate::error::spawn::SpawnError;

use common::ErrorLocation;
use models::{MediumMode, ServerInfo, ServerInfoBuilder};

use std::fs::File;
use std::mem::forget;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use sysinfo::Signal;
use tokio::net::UnixStream;
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::time::sleep as TokioSleep;
use tokio::time::timeout as TokioTimeout;

const LOG_LEVEL_FLAG: &str = "-l";
const SERVER_FLAG: &str = "-s";
const CONFIG_FLAG: &str = "-c";
const PER_TABLE_FLAG: &str = "-x";
const DYNAMIC_FLAG: &str = "-d";
const SERVER_LOG_PREFIX: &str = "mn_wmd_log_";
const SERVER_LOG_SUFFIX: &str = ".log";

/// Build the wmediumd command line for `config`.
///
/// `<executable> -l <level> [extra args] -s` followed by `-d` in SpecProb
/// mode, or `-c <medium file> [-x <per table>]` otherwise. The per table is
/// only passed in Snr mode.
pub fn build_spawn_command(
    config: &ConnectorConfig,
    medium_file: Option<&Path>,
) -> Result<TokioCommand, SpawnError> {
    let server = &config.server;

    let mut cmd = TokioCommand::new(&server.executable);
    cmd.arg(LOG_LEVEL_FLAG)
        .arg(server.log_level.to_string())
        .args(&server.extra_args)
        .arg(SERVER_FLAG);

    match config.mode {
        MediumMode::SpecProb => {
            cmd.arg(DYNAMIC_FLAG);
        }
        mode => {
            let medium_file = medium_file.ok_or_else(|| SpawnError::Validation {
                message: format!("{mode} mode requires a medium config file"),
                location: ErrorLocation::from(Location::caller()),
            })?;
            cmd.arg(CONFIG_FLAG).arg(medium_file);

            if mode == MediumMode::Snr
                && let Some(ref per_table) = server.per_table
            {
                cmd.arg(PER_TABLE_FLAG).arg(per_table);
            }
        }
    }

    Ok(cmd)
}

fn describe_command(cmd: &TokioCommand) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A wmediumd process started by this connector.
#[derive(Debug)]
pub struct SpawnedServer {
    child: Option<TokioChild>,
    info: ServerInfo,
    log_path: PathBuf,
    stop_grace: Duration,
}

impl SpawnedServer {
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn is_running(&mut self) -> bool {
        self.child
            .as_mut()
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }

    /// Stop the server: SIGINT so it can release its socket, SIGKILL when it
    /// is still alive after the grace period. Removes the server log.
    pub async fn stop(mut self) -> Result<(), SpawnError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if let Some(pid) = child.id() {
            let interrupted = with_process(pid, |p| p.kill_with(Signal::Interrupt))
                .flatten()
                .unwrap_or(false);
            debug!("Sent SIGINT to wmediumd (PID: {pid}): success={interrupted}");
        }

        match TokioTimeout(self.stop_grace, child.wait()).await {
            Ok(Ok(status)) => debug!("wmediumd exited with {status}"),
            Ok(Err(e)) => warn!("Failed to wait for wmediumd: {e}"),
            Err(_) => {
                debug!(
                    "wmediumd still running after {:?}, sending SIGKILL",
                    self.stop_grace
                );
                child.kill().await.map_err(|e| SpawnError::Spawn {
                    message: format!("Failed to kill wmediumd: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                    source: Box::new(e),
                })?;
            }
        }

        if let Err(e) = std::fs::remove_file(&self.log_path) {
            debug!("Could not remove {}: {e}", self.log_path.display());
        }

        info!("Stopped wmediumd server {}", self.info.command);
        Ok(())
    }

    /// Leave the server running after the connector is gone.
    pub fn detach(mut self) -> ServerInfo {
        if let Some(child) = self.child.take() {
            // The OS reparents the process; nothing waits on it from here.
            forget(child);
        }
        info!(
            "Detached wmediumd server (PID: {:?}), log at {}",
            self.info.pid,
            self.log_path.display()
        );
        self.info.clone()
    }
}

/// Spawn wmediumd and wait until its control socket accepts connections.
///
/// Server output goes to a `mn_wmd_log_*.log` file in the temp directory.
/// The child runs in its own process group so a terminal SIGINT aimed at the
/// harness does not reach it.
///
/// # Returns
///
/// * `Ok(SpawnedServer)` - Server spawned and accepting connections
/// * `Err(SpawnError)` - Failed to spawn, the server exited, or its socket
///   did not come up within `server.startup_timeout`
pub async fn spawn_and_wait(
    config: &ConnectorConfig,
    medium_file: Option<&Path>,
) -> Result<SpawnedServer, SpawnError> {
    let mut cmd = build_spawn_command(config, medium_file)?;
    let command = describe_command(&cmd);
    let owned = !config.server.keep_server_running;

    let (log_file, log_path) = create_server_log()?;
    let stderr_file = log_file.try_clone().map_err(|e| SpawnError::Spawn {
        message: format!("Failed to duplicate {}: {e}", log_path.display()),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })?;

    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(stderr_file))
        .process_group(0)
        .kill_on_drop(owned);

    info!(
        "Spawning wmediumd in {} mode ({}): {command}",
        config.mode,
        config.mode.code()
    );
    info!("wmediumd log: {}", log_path.display());

    let mut child = cmd.spawn().map_err(|e| {
        if let Err(remove_error) = std::fs::remove_file(&log_path) {
            debug!("Could not remove {}: {remove_error}", log_path.display());
        }
        SpawnError::Spawn {
            message: format!("Failed to spawn {}: {e}", config.server.executable),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        }
    })?;

    if let Err(e) = wait_for_socket(&mut child, config, &log_path).await {
        warn!(
            "wmediumd did not come up, killing spawned server (PID: {:?})",
            child.id()
        );
        if let Err(kill_error) = child.kill().await {
            debug!("Could not kill spawned wmediumd: {kill_error}");
        }
        return Err(e);
    }

    let pid = child.id();
    info!(
        "wmediumd ready at {} (PID: {pid:?})",
        config.socket_path.display()
    );

    let info = ServerInfoBuilder::default()
        .with_optional_pid(pid)
        .with_socket_path(config.socket_path.clone())
        .with_command(command)
        .with_owned(owned)
        .build()?;

    Ok(SpawnedServer {
        child: Some(child),
        info,
        log_path,
        stop_grace: config.server.stop_grace,
    })
}

fn create_server_log() -> Result<(File, PathBuf), SpawnError> {
    tempfile::Builder::new()
        .prefix(SERVER_LOG_PREFIX)
        .suffix(SERVER_LOG_SUFFIX)
        .tempfile()
        .and_then(|file| file.keep().map_err(|e| e.error))
        .map_err(|e| SpawnError::Spawn {
            message: format!("Failed to create wmediumd log file: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })
}

async fn wait_for_socket(
    child: &mut TokioChild,
    config: &ConnectorConfig,
    log_path: &Path,
) -> Result<(), SpawnError> {
    let socket_path = &config.socket_path;
    let max_elapsed = config.server.startup_timeout;

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    debug!("Waiting for wmediumd socket at {}", socket_path.display());

    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(SpawnError::Exited {
                message: format!(
                    "wmediumd exited with {status} before opening {}, see {}",
                    socket_path.display(),
                    log_path.display()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if UnixStream::connect(socket_path).await.is_ok() {
            debug!("wmediumd socket {} accepts connections", socket_path.display());
            return Ok(());
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("wmediumd socket not ready, retrying after {duration:?}");
                TokioSleep(duration).await;
            }
            None => {
                return Err(SpawnError::Timeout {
                    message: format!(
                        "wmediumd socket {} did not accept connections within {max_elapsed:?}",
                        socket_path.display()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
}
