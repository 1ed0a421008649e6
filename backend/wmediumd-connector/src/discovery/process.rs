use crate::error::discovery::DiscoveryError;

use common::ErrorLocation;

use std::ffi::OsStr;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, Signal, System};
use tokio::process::Command as TokioCommand;

const PROC_MODULES_PATH: &str = "/proc/modules";
const HWSIM_MODULE: &str = "mac80211_hwsim";
const MODPROBE_BINARY: &str = "modprobe";
const HWSIM_NO_RADIOS_ARG: &str = "radios=0";
const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);

#[track_caller]
pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);

    sys.process(Pid::from_u32(pid))
        .filter(|p| p.status() != ProcessStatus::Zombie)
        .map(f)
}

pub(crate) fn format_command(process: &Process) -> String {
    let cmd_vec: Vec<String> = process
        .cmd()
        .iter()
        .map(|s| s.to_string_lossy().to_string())
        .collect();

    if cmd_vec.is_empty() {
        String::new()
    } else {
        cmd_vec.join(" ")
    }
}

/// A wmediumd process found running on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningServer {
    pub pid: u32,
    pub command: String,
}

/// Find a running process whose name matches the executable's file name.
///
/// Equivalent to `pgrep -x wmediumd`: the executable may be given as a path,
/// only its last component is compared. Zombies are ignored.
///
/// # Returns
///
/// * `Ok(Some(RunningServer))` - If a matching process is running
/// * `Ok(None)` - If none is
/// * `Err(DiscoveryError)` - If the executable has no file name
#[track_caller]
pub fn find_running_server(executable: &str) -> Result<Option<RunningServer>, DiscoveryError> {
    let name = executable_name(executable).ok_or_else(|| DiscoveryError::Validation {
        message: format!("Executable '{executable}' has no file name"),
        location: ErrorLocation::caller(),
    })?;

    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    trace!("Scanning {} processes for {:?}", sys.processes().len(), name);

    let found = sys
        .processes()
        .iter()
        .filter(|(_, p)| p.status() != ProcessStatus::Zombie)
        .find(|(_, p)| p.name() == name)
        .map(|(pid, p)| RunningServer {
            pid: pid.as_u32(),
            command: format_command(p),
        });

    match &found {
        Some(server) => debug!("Found running {:?} (PID: {})", name, server.pid),
        None => debug!("No running {:?} process", name),
    }

    Ok(found)
}

/// Check that `path` exists and is a Unix domain socket.
pub fn is_socket(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.file_type().is_socket())
        .unwrap_or(false)
}

/// True when `module` appears in a `/proc/modules` listing.
pub(crate) fn module_listed(modules: &str, module: &str) -> bool {
    modules
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == module)
}

/// Check whether the `mac80211_hwsim` kernel module is loaded.
#[track_caller]
pub fn hwsim_loaded() -> Result<bool, DiscoveryError> {
    let modules = std::fs::read_to_string(PROC_MODULES_PATH).map_err(|e| {
        DiscoveryError::SystemQuery {
            message: format!("Failed to read {PROC_MODULES_PATH}: {e}"),
            location: ErrorLocation::caller(),
            source: Some(Box::new(e)),
        }
    })?;

    Ok(module_listed(&modules, HWSIM_MODULE))
}

/// Load `mac80211_hwsim` without creating any radios.
///
/// Radios are created later by the harness; wmediumd only needs the module
/// to be present so it can register with the hwsim netlink family.
pub async fn load_hwsim_module() -> Result<(), DiscoveryError> {
    info!("Loading {HWSIM_MODULE} kernel module");

    let status = TokioCommand::new(MODPROBE_BINARY)
        .arg(HWSIM_MODULE)
        .arg(HWSIM_NO_RADIOS_ARG)
        .status()
        .await
        .map_err(|e| DiscoveryError::SystemQuery {
            message: format!("Failed to run {MODPROBE_BINARY} {HWSIM_MODULE}: {e}"),
            location: ErrorLocation::caller(),
            source: Some(Box::new(e)),
        })?;

    if !status.success() {
        return Err(DiscoveryError::SystemQuery {
            message: format!("{MODPROBE_BINARY} {HWSIM_MODULE} exited with {status}"),
            location: ErrorLocation::caller(),
            source: None,
        });
    }

    Ok(())
}

/// Stop a server process by PID.
///
/// Sends SIGINT first so wmediumd can release its socket and netlink
/// registration, falls back to SIGKILL when it is still alive after the
/// backoff window. Never signals PID 0, PID 1 or the current process.
///
/// # Returns
///
/// * `true` - If the process was successfully terminated
/// * `false` - If the process doesn't exist, is protected or couldn't be killed
pub fn stop_pid(pid: u32) -> bool {
    if pid <= 1 || pid == std::process::id() {
        debug!("Refusing to stop protected PID {pid}");
        return false;
    }

    let signalled = with_process(pid, |p| {
        if let Some(sent) = p.kill_with(Signal::Interrupt) {
            debug!("Sent SIGINT to PID {pid}: success={sent}");
            sent
        } else {
            let killed = p.kill();
            debug!("Sent SIGKILL to PID {pid}: success={killed}");
            killed
        }
    })
    .unwrap_or_else(|| {
        debug!("Process {pid} not found");
        false
    });

    if !signalled {
        return false;
    }

    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(KILL_VERIFY_MAX_ELAPSED),
        ..Default::default()
    };

    loop {
        if with_process(pid, |_| true).is_none() {
            debug!("Process {pid} successfully terminated");
            return true;
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Process {pid} still alive, retrying after {duration:?}");
                sleep(duration);
            }
            None => {
                debug!("Process {pid} ignored SIGINT, sending SIGKILL");
                return with_process(pid, |p| p.kill()).unwrap_or(true);
            }
        }
    }
}

/// Process name wmediumd runs under, the last component of `executable`.
pub(crate) fn executable_name(executable: &str) -> Option<&OsStr> {
    Path::new(executable).file_name()
}
