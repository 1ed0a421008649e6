//! Control channel to the wmediumd server.
//!
//! One Unix stream socket, one request/response exchange at a time. The
//! channel never retries: any I/O failure or timeout is reported and the
//! owner is expected to drop the channel.

use crate::error::WmediumdError;
use crate::error::connection::ConnectionError;
use crate::protocol::{Request, Response, decode_response};

use common::ErrorLocation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout as TokioTimeout;

pub(crate) struct ControlChannel {
    stream: UnixStream,
    socket_path: PathBuf,
    /// Set while an exchange is on the wire. Still set on the next call means
    /// the previous exchange was abandoned half way.
    in_flight: bool,
}

impl ControlChannel {
    /// Connect to the server socket. Connecting is the whole handshake: the
    /// server starts serving requests on the accepted stream immediately.
    pub(crate) async fn open(socket_path: &Path, bound: Duration) -> Result<Self, WmediumdError> {
        debug!("Connecting to wmediumd server {}", socket_path.display());

        let stream = match TokioTimeout(bound, UnixStream::connect(socket_path)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ConnectionError::Unreachable {
                    message: format!(
                        "Failed to connect to wmediumd server at {}: {e}",
                        socket_path.display()
                    ),
                    location: ErrorLocation::caller(),
                    source: e,
                }
                .into());
            }
            Err(_) => {
                return Err(WmediumdError::timeout(format!(
                    "Connecting to {} did not complete within {bound:?}",
                    socket_path.display()
                )));
            }
        };

        Ok(Self {
            stream,
            socket_path: socket_path.to_path_buf(),
            in_flight: false,
        })
    }

    pub(crate) fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.in_flight
    }

    /// Send `request` and read the complete response it expects.
    ///
    /// Returns the decoded response whatever its status; interpreting the
    /// status is up to the caller.
    pub(crate) async fn exchange(
        &mut self,
        request: &Request,
        bound: Duration,
    ) -> Result<Response, WmediumdError> {
        let kind = request.expected_response().ok_or_else(|| {
            WmediumdError::state(format!("{} request expects no response", request.name()))
        })?;

        let encoded = request.encode();
        trace!("Sending {} ({} bytes)", request.name(), encoded.len());

        self.in_flight = true;
        let mut buf = vec![0u8; kind.len];

        let io = async {
            self.stream.write_all(&encoded).await?;
            self.stream.flush().await?;
            self.stream.read_exact(&mut buf).await?;
            Ok::<(), std::io::Error>(())
        };

        match TokioTimeout(bound, io).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ConnectionError::ChannelClosed {
                    message: format!("{} exchange failed: {e}", request.name()),
                    location: ErrorLocation::caller(),
                    source: e,
                }
                .into());
            }
            Err(_) => {
                return Err(WmediumdError::timeout(format!(
                    "No {} response within {bound:?}",
                    request.name()
                )));
            }
        }

        let response = decode_response(kind, &buf)?;
        self.in_flight = false;
        trace!("Received {} response: {}", request.name(), response.status);

        Ok(response)
    }

    /// Send a request that the server does not answer.
    pub(crate) async fn send(&mut self, request: &Request, bound: Duration) -> Result<(), WmediumdError> {
        let encoded = request.encode();
        trace!("Sending {} ({} bytes)", request.name(), encoded.len());

        self.in_flight = true;
        let io = async {
            self.stream.write_all(&encoded).await?;
            self.stream.flush().await
        };

        match TokioTimeout(bound, io).await {
            Ok(Ok(())) => {
                self.in_flight = false;
                Ok(())
            }
            Ok(Err(e)) => Err(ConnectionError::ChannelClosed {
                message: format!("Sending {} failed: {e}", request.name()),
                location: ErrorLocation::caller(),
                source: e,
            }
            .into()),
            Err(_) => Err(WmediumdError::timeout(format!(
                "Sending {} did not complete within {bound:?}",
                request.name()
            ))),
        }
    }

    /// Shut down the write half and drop the socket.
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(
                "Ignoring shutdown error on {}: {e}",
                self.socket_path.display()
            );
        }
        debug!("Closed control channel to {}", self.socket_path.display());
    }
}
