//! Connection manager for a wmediumd server.
//!
//! [`WmediumdManager`] owns the one control channel a connector process keeps
//! to wmediumd. It tracks:
//! - The connection lifecycle (`DISCONNECTED -> CONNECTING -> CONNECTED`)
//! - The server it attached to or spawned, and whether it may stop it
//! - Interfaces registered through it and the link values the server acknowledged
//!
//! # Concurrency
//!
//! All session state sits behind one `tokio::sync::Mutex`. A control message is
//! written and its response read while holding the lock, so concurrent callers
//! never interleave partial messages on the socket. The lifecycle state is
//! published through a `watch` channel and can be read without the lock.
//!
//! # Failure handling
//!
//! Nothing is retried. A timeout, an I/O failure or an out of step response
//! closes the channel and the manager falls back to `DISCONNECTED`; a later
//! [`WmediumdManager::connect`] starts fresh. A rejected update keeps the
//! channel open. An exchange abandoned by its caller (the future was dropped
//! mid-flight) poisons the channel, and the next operation tears it down.

pub(crate) mod ledger;
mod state;

pub use ledger::{LinkSetting, UpdateAck};
pub use state::{ConnectionHandle, ConnectionState};

use crate::channel::ControlChannel;
use crate::config::ConnectorConfig;
use crate::discovery::process::{find_running_server, hwsim_loaded, is_socket, load_hwsim_module};
use crate::discovery::spawn::{SpawnedServer, spawn_and_wait};
use crate::error::WmediumdError;
use crate::error::connection::ConnectionError;
use crate::error::discovery::DiscoveryError;
use crate::error::protocol::ProtocolError;
use crate::medium::MediumFile;
use crate::protocol::{Request, Response};

use common::ErrorLocation;
use ledger::LinkLedger;
use models::{ErrorProbLink, MacAddress, ServerInfo, ServerInfoBuilder, SnrLink, SpecProbLink};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::sync::{Mutex, watch};

/// Everything guarded by the session lock.
#[derive(Default)]
struct Session {
    channel: Option<ControlChannel>,
    handle: Option<ConnectionHandle>,
    /// Spawned server; outlives a torn down channel so a reconnect reuses it.
    server: Option<SpawnedServer>,
    medium_file: Option<PathBuf>,
    /// Interfaces added through this manager and their station index.
    registered: BTreeMap<MacAddress, i32>,
    ledger: LinkLedger,
}

/// Resets the published state when a connect attempt is dropped half way.
struct ConnectingGuard<'a> {
    state_tx: &'a watch::Sender<ConnectionState>,
    armed: bool,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state_tx.send_replace(ConnectionState::Disconnected);
        }
    }
}

/// Client for one wmediumd server.
///
/// Share it through an `Arc`; every operation takes `&self`.
pub struct WmediumdManager {
    config: ConnectorConfig,
    session: Mutex<Session>,
    state_tx: watch::Sender<ConnectionState>,
}

impl WmediumdManager {
    /// Create a disconnected manager.
    ///
    /// # Errors
    ///
    /// Returns [`WmediumdError::Configuration`] if `config` does not validate.
    pub fn new(config: ConnectorConfig) -> Result<Self, WmediumdError> {
        config.validate()?;

        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            config,
            session: Mutex::new(Session::default()),
            state_tx,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Receiver notified on every lifecycle transition.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// The active connection, if any.
    pub async fn handle(&self) -> Option<ConnectionHandle> {
        let session = self.session.lock().await;
        session.channel.as_ref().and(session.handle.clone())
    }

    /// Interfaces registered through this manager, with their station index.
    pub async fn registered_interfaces(&self) -> BTreeMap<MacAddress, i32> {
        self.session.lock().await.registered.clone()
    }

    /// Last value the server acknowledged for the directed link `from -> to`
    /// on the current connection.
    pub async fn link_setting(&self, from: MacAddress, to: MacAddress) -> Option<LinkSetting> {
        self.session.lock().await.ledger.get(from, to).cloned()
    }

    // ============================================
    // LIFECYCLE
    // ============================================

    /// Connect to the server, starting it first when configured to.
    ///
    /// Calling this while connected returns the existing handle without
    /// touching the socket.
    ///
    /// # Errors
    ///
    /// * [`WmediumdError::Connection`] - Server unreachable, running without a
    ///   control socket, or could not be spawned
    /// * [`WmediumdError::Configuration`] - The medium file could not be written
    /// * [`WmediumdError::Timeout`] - The socket did not accept within `connect_timeout`
    pub async fn connect(&self) -> Result<ConnectionHandle, WmediumdError> {
        let mut session = self.session.lock().await;

        if session.channel.as_ref().is_some_and(ControlChannel::is_poisoned) {
            self.teardown(&mut session, "previous exchange was abandoned")
                .await;
        }

        if session.channel.is_some()
            && let Some(ref handle) = session.handle
        {
            debug!("Already connected ({handle}), reusing handle");
            return Ok(handle.clone());
        }

        self.state_tx.send_replace(ConnectionState::Connecting);
        let mut guard = ConnectingGuard {
            state_tx: &self.state_tx,
            armed: true,
        };

        let handle = self.establish(&mut session).await?;

        guard.armed = false;
        self.state_tx.send_replace(ConnectionState::Connected);
        info!("Connected to wmediumd: {handle}");

        Ok(handle)
    }

    async fn establish(&self, session: &mut Session) -> Result<ConnectionHandle, WmediumdError> {
        let server = if self.config.server.auto_start {
            self.ensure_server(session).await?
        } else {
            ServerInfoBuilder::default()
                .with_socket_path(self.config.socket_path.clone())
                .with_command(self.config.server.executable.clone())
                .with_owned(false)
                .build()
                .map_err(DiscoveryError::from)
                .map_err(ConnectionError::from)?
        };

        let channel =
            ControlChannel::open(&self.config.socket_path, self.config.connect_timeout).await?;

        let handle = ConnectionHandle::new(channel.socket_path().to_path_buf(), server);
        session.channel = Some(channel);
        session.handle = Some(handle.clone());
        session.ledger.clear();

        Ok(handle)
    }

    /// Find the server to talk to, spawning one when none is running.
    async fn ensure_server(&self, session: &mut Session) -> Result<ServerInfo, WmediumdError> {
        let config = &self.config;

        if let Some(ref mut spawned) = session.server {
            if spawned.is_running() {
                debug!("Reusing spawned wmediumd {}", spawned.info().command);
                return Ok(spawned.info().clone());
            }
            warn!("Spawned wmediumd is gone, starting a new one");
            session.server = None;
            self.remove_medium_file(session);
        }

        if config.server.load_hwsim_module
            && !hwsim_loaded().map_err(ConnectionError::from)?
        {
            load_hwsim_module().await.map_err(ConnectionError::from)?;
        }

        if let Some(running) =
            find_running_server(&config.server.executable).map_err(ConnectionError::from)?
        {
            if !is_socket(&config.socket_path) {
                return Err(ConnectionError::NoServerSocket {
                    message: format!(
                        "wmediumd is already started (PID: {}) but without server socket {}",
                        running.pid,
                        config.socket_path.display()
                    ),
                    location: ErrorLocation::caller(),
                }
                .into());
            }

            info!(
                "Attaching to running wmediumd (PID: {}): {}",
                running.pid, running.command
            );

            let info = ServerInfoBuilder::default()
                .with_pid(running.pid)
                .with_socket_path(config.socket_path.clone())
                .with_command(running.command)
                .with_owned(false)
                .build()
                .map_err(DiscoveryError::from)
                .map_err(ConnectionError::from)?;
            return Ok(info);
        }

        let medium_file = match MediumFile::render(config)? {
            Some(medium) => Some(medium.write_temp()?),
            None => None,
        };

        session.medium_file = medium_file;

        match spawn_and_wait(config, session.medium_file.as_deref()).await {
            Ok(spawned) => {
                info!(
                    "Spawned wmediumd {}, server log at {}",
                    spawned.info().command,
                    spawned.log_path().display()
                );
                let info = spawned.info().clone();
                session.server = Some(spawned);
                Ok(info)
            }
            Err(e) => {
                self.remove_medium_file(session);
                Err(ConnectionError::from(e).into())
            }
        }
    }

    /// Close the connection.
    ///
    /// Unregisters every interface registered through this manager (best
    /// effort), ends the session with the shutdown message and closes the
    /// socket. An owned server is stopped and its medium file removed; a
    /// server started with `keep_server_running` is left running. Calling it
    /// while disconnected does nothing.
    ///
    /// The manager reports `DISCONNECTED` before the first message is sent,
    /// so dropping this future half way never leaves it `CONNECTED` without a
    /// channel. Interfaces whose unregister never completed stay registered
    /// for the next session to clean up.
    ///
    /// Resources are released on every path; the first channel error, if
    /// any, is returned afterwards.
    pub async fn disconnect(&self) -> Result<(), WmediumdError> {
        let mut session = self.session.lock().await;
        let mut first_error: Option<WmediumdError> = None;

        let was_connected = session.handle.take().is_some();
        session.ledger.clear();
        self.state_tx.send_replace(ConnectionState::Disconnected);

        if let Some(mut channel) = session.channel.take() {
            let bound = self.config.operation_timeout;

            if channel.is_poisoned() {
                warn!("Skipping unregister and shutdown on an abandoned channel");
            } else {
                let registered: Vec<(MacAddress, i32)> = session
                    .registered
                    .iter()
                    .map(|(mac, station)| (*mac, *station))
                    .collect();

                for (mac, station) in registered {
                    match channel.exchange(&Request::DeleteByMac(mac), bound).await {
                        Ok(response) if response.status.is_success() => {
                            debug!("Unregistered {mac} (station {station})");
                        }
                        Ok(response) => {
                            warn!("Server refused to unregister {mac}: {}", response.status);
                        }
                        Err(e) => {
                            warn!("Failed to unregister {mac}: {e}");
                            if e.breaks_channel() {
                                first_error = Some(e);
                                break;
                            }
                        }
                    }
                    session.registered.remove(&mac);
                }

                if first_error.is_none()
                    && let Err(e) = channel.send(&Request::Shutdown, bound).await
                {
                    warn!("Failed to send shutdown message: {e}");
                    first_error = Some(e);
                }
            }

            channel.close().await;
            session.registered.clear();
        }

        if let Some(server) = session.server.take() {
            if server.info().owned {
                self.remove_medium_file(&mut session);
                session.registered.clear();
                if let Err(e) = server.stop().await {
                    warn!("Failed to stop wmediumd: {e}");
                }
            } else {
                server.detach();
                if let Some(path) = session.medium_file.take() {
                    debug!("Leaving medium config {} for the running server", path.display());
                }
            }
        }

        if was_connected {
            info!("Disconnected from wmediumd");
        }

        first_error.map_or(Ok(()), Err)
    }

    fn remove_medium_file(&self, session: &mut Session) {
        if let Some(path) = session.medium_file.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed medium config {}", path.display()),
                Err(e) => warn!("Failed to remove medium config {}: {e}", path.display()),
            }
        }
    }

    /// Drop the channel after an unrecoverable error. The server, if any, is
    /// kept for the next connect.
    async fn teardown(&self, session: &mut Session, reason: &str) {
        session.handle = None;
        session.ledger.clear();
        self.state_tx.send_replace(ConnectionState::Disconnected);

        if let Some(channel) = session.channel.take() {
            warn!(
                "Closing control channel to {}: {reason}",
                channel.socket_path().display()
            );
            channel.close().await;
        }
    }

    // ============================================
    // CONTROL OPERATIONS
    // ============================================

    /// Send one request and wait for a successful response.
    async fn transact(
        &self,
        session: &mut Session,
        request: &Request,
    ) -> Result<Response, WmediumdError> {
        let poisoned = match session.channel.as_ref() {
            Some(channel) => channel.is_poisoned(),
            None => {
                return Err(WmediumdError::state(format!(
                    "Cannot send {}: not connected to wmediumd",
                    request.name()
                )));
            }
        };

        if poisoned {
            self.teardown(session, "previous exchange was abandoned")
                .await;
            return Err(WmediumdError::state(format!(
                "Cannot send {}: the previous exchange was abandoned, reconnect first",
                request.name()
            )));
        }

        let result = match session.channel.as_mut() {
            Some(channel) => channel.exchange(request, self.config.operation_timeout).await,
            None => return Err(WmediumdError::state("Not connected to wmediumd")),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if e.breaks_channel() {
                    self.teardown(session, &e.to_string()).await;
                }
                return Err(e);
            }
        };

        if !response.status.is_success() {
            return Err(ProtocolError::Rejected {
                status: response.status,
                message: format!("wmediumd rejected {}", request.name()),
                location: ErrorLocation::caller(),
            }
            .into());
        }

        Ok(response)
    }

    /// Add an interface to the medium.
    ///
    /// # Returns
    ///
    /// The station index wmediumd assigned to the interface.
    pub async fn register_interface(&self, mac: MacAddress) -> Result<i32, WmediumdError> {
        let mut session = self.session.lock().await;
        let response = self.transact(&mut session, &Request::Add(mac)).await?;

        let station = response
            .station_id
            .ok_or_else(|| ProtocolError::Malformed {
                message: "Add response carries no station index".to_string(),
                location: ErrorLocation::caller(),
            })?;

        session.registered.insert(mac, station);
        info!("Registered interface {mac} as station {station}");
        Ok(station)
    }

    /// Remove an interface from the medium by MAC.
    pub async fn unregister_interface(&self, mac: MacAddress) -> Result<(), WmediumdError> {
        let mut session = self.session.lock().await;
        self.transact(&mut session, &Request::DeleteByMac(mac))
            .await?;

        session.registered.remove(&mac);
        session.ledger.forget_interface(mac);
        info!("Unregistered interface {mac}");
        Ok(())
    }

    /// Remove a station from the medium by its index.
    pub async fn unregister_station(&self, station: i32) -> Result<(), WmediumdError> {
        if station < 0 {
            return Err(ProtocolError::InvalidParameter {
                message: format!("Station index must be non-negative, got {station}"),
                location: ErrorLocation::caller(),
            }
            .into());
        }

        let mut session = self.session.lock().await;
        self.transact(&mut session, &Request::DeleteById(station))
            .await?;

        let removed: Vec<MacAddress> = session
            .registered
            .iter()
            .filter(|(_, id)| **id == station)
            .map(|(mac, _)| *mac)
            .collect();
        for mac in removed {
            session.registered.remove(&mac);
            session.ledger.forget_interface(mac);
        }

        info!("Unregistered station {station}");
        Ok(())
    }

    pub async fn update_link_snr(&self, link: &SnrLink) -> Result<UpdateAck, WmediumdError> {
        link.validate().map_err(ProtocolError::from)?;

        let setting = LinkSetting::Snr(link.snr);
        self.update_link(Request::SnrUpdate(*link), link.from, link.to, setting)
            .await
    }

    pub async fn update_link_errprob(
        &self,
        link: &ErrorProbLink,
    ) -> Result<UpdateAck, WmediumdError> {
        link.validate().map_err(ProtocolError::from)?;

        let setting = LinkSetting::ErrorProb(link.errprob);
        self.update_link(Request::ErrorProbUpdate(*link), link.from, link.to, setting)
            .await
    }

    pub async fn update_link_specprob(
        &self,
        link: &SpecProbLink,
    ) -> Result<UpdateAck, WmediumdError> {
        link.validate().map_err(ProtocolError::from)?;

        let setting = LinkSetting::SpecProb(Box::new(link.errprobs));
        let request = Request::SpecProbUpdate(Box::new(link.clone()));
        self.update_link(request, link.from, link.to, setting).await
    }

    /// Set the SNR (dB) of the directed link `from -> to`.
    pub async fn set_link_snr(
        &self,
        from: MacAddress,
        to: MacAddress,
        snr: i32,
    ) -> Result<UpdateAck, WmediumdError> {
        self.update_link_snr(&SnrLink::new(from, to, snr)).await
    }

    /// Set the frame error probability of the directed link `from -> to`.
    pub async fn set_link_error_rate(
        &self,
        from: MacAddress,
        to: MacAddress,
        rate: f64,
    ) -> Result<UpdateAck, WmediumdError> {
        self.update_link_errprob(&ErrorProbLink::new(from, to, rate))
            .await
    }

    async fn update_link(
        &self,
        request: Request,
        from: MacAddress,
        to: MacAddress,
        setting: LinkSetting,
    ) -> Result<UpdateAck, WmediumdError> {
        let mut session = self.session.lock().await;

        let started = Instant::now();
        self.transact(&mut session, &request).await?;
        let elapsed = started.elapsed();

        session.ledger.record(from, to, setting.clone());
        debug!(
            "{} {from} -> {to} acknowledged in {elapsed:?} ({} links known)",
            request.name(),
            session.ledger.len()
        );

        Ok(UpdateAck {
            from,
            to,
            setting,
            elapsed,
        })
    }
}
