//! Test helpers for manager integration tests.
//!
//! Provides an in-process fake wmediumd server listening on a Unix socket in
//! a temp directory. It speaks the control protocol, keeps a record of what
//! it received and can be switched into misbehaving modes:
//! - Silent: swallow requests without answering
//! - WrongType: answer with a response of the wrong type
//! - Reject: answer every update with a fixed status code

use wmediumd_connector::ConnectorConfig;
use wmediumd_connector::protocol::constants::{
    WUPDATE_INTF_DUPLICATE, WUPDATE_INTF_NOTFOUND, WUPDATE_SUCCESS,
};
use wmediumd_connector::protocol::{Request, request_len};

use models::{MacAddress, SpecProbMatrix};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

pub const FAKE_OPERATION_TIMEOUT: Duration = Duration::from_millis(300);

/// Wait bound for observations of asynchronous server side effects.
const WAIT_FOR_SERVER: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Normal,
    Silent,
    WrongType,
    Reject(u8),
}

/// Everything the fake server observed.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub connections: usize,
    pub requests: Vec<Request>,
    pub shutdowns: usize,
    pub stations: BTreeMap<MacAddress, i32>,
    pub snr: HashMap<(MacAddress, MacAddress), i32>,
    pub errprob: HashMap<(MacAddress, MacAddress), f64>,
    pub specprob: HashMap<(MacAddress, MacAddress), SpecProbMatrix>,
    next_station: i32,
}

struct Shared {
    recorded: Mutex<Recorded>,
    behavior: Mutex<Behavior>,
}

pub struct FakeWmediumd {
    _dir: TempDir,
    socket_path: PathBuf,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl FakeWmediumd {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let socket_path = dir.path().join("wmediumd.sock");
        let listener = UnixListener::bind(&socket_path).expect("Failed to bind fake wmediumd");

        let shared = Arc::new(Shared {
            recorded: Mutex::new(Recorded::default()),
            behavior: Mutex::new(Behavior::Normal),
        });

        let accept_shared = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_shared.recorded.lock().unwrap().connections += 1;
                tokio::spawn(serve_connection(stream, Arc::clone(&accept_shared)));
            }
        });

        Self {
            _dir: dir,
            socket_path,
            shared,
            task,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Attach-only config pointing at this server with short timeouts.
    pub fn config(&self) -> ConnectorConfig {
        let mut config = ConnectorConfig::attach(&self.socket_path);
        config.connect_timeout = Duration::from_secs(1);
        config.operation_timeout = FAKE_OPERATION_TIMEOUT;
        config
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.shared.behavior.lock().unwrap() = behavior;
    }

    pub fn recorded(&self) -> Recorded {
        self.shared.recorded.lock().unwrap().clone()
    }

    /// Poll the record until `check` holds. Returns false on timeout.
    pub async fn wait_until<F>(&self, check: F) -> bool
    where
        F: Fn(&Recorded) -> bool,
    {
        let deadline = tokio::time::Instant::now() + WAIT_FOR_SERVER;
        while tokio::time::Instant::now() < deadline {
            let done = {
                let recorded = self.shared.recorded.lock().unwrap();
                check(&*recorded)
            };
            if done {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for FakeWmediumd {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(mut stream: UnixStream, shared: Arc<Shared>) {
    loop {
        let mut type_byte = [0u8; 1];
        if stream.read_exact(&mut type_byte).await.is_err() {
            return;
        }

        let Some(len) = request_len(type_byte[0]) else {
            return;
        };

        let mut buf = vec![0u8; len];
        buf[0] = type_byte[0];
        if stream.read_exact(&mut buf[1..]).await.is_err() {
            return;
        }

        let request = Request::decode(&buf).expect("fake server received malformed request");
        let behavior = *shared.behavior.lock().unwrap();

        let response = {
            let mut recorded = shared.recorded.lock().unwrap();
            recorded.requests.push(request.clone());

            if request == Request::Shutdown {
                recorded.shutdowns += 1;
                None
            } else {
                match behavior {
                    Behavior::Silent => None,
                    Behavior::Normal => {
                        let (status, station) = apply(&mut recorded, &request);
                        Some(build_response(&request, &buf, status, station, 0))
                    }
                    Behavior::Reject(status) => {
                        Some(build_response(&request, &buf, status, Some(-1), 0))
                    }
                    Behavior::WrongType => {
                        Some(build_response(&request, &buf, WUPDATE_SUCCESS, Some(0), 2))
                    }
                }
            }
        };

        if request == Request::Shutdown {
            return;
        }

        if let Some(response) = response
            && stream.write_all(&response).await.is_err()
        {
            return;
        }
    }
}

fn apply(recorded: &mut Recorded, request: &Request) -> (u8, Option<i32>) {
    match request {
        Request::Add(mac) => {
            if let Some(existing) = recorded.stations.get(mac) {
                return (WUPDATE_INTF_DUPLICATE, Some(*existing));
            }
            let station = recorded.next_station;
            recorded.next_station += 1;
            recorded.stations.insert(*mac, station);
            (WUPDATE_SUCCESS, Some(station))
        }
        Request::DeleteByMac(mac) => match recorded.stations.remove(mac) {
            Some(_) => (WUPDATE_SUCCESS, None),
            None => (WUPDATE_INTF_NOTFOUND, None),
        },
        Request::DeleteById(id) => {
            let before = recorded.stations.len();
            recorded.stations.retain(|_, station| *station != *id);
            if recorded.stations.len() < before {
                (WUPDATE_SUCCESS, None)
            } else {
                (WUPDATE_INTF_NOTFOUND, None)
            }
        }
        Request::SnrUpdate(link) => {
            recorded.snr.insert((link.from, link.to), link.snr);
            (WUPDATE_SUCCESS, None)
        }
        Request::ErrorProbUpdate(link) => {
            recorded.errprob.insert((link.from, link.to), link.errprob);
            (WUPDATE_SUCCESS, None)
        }
        Request::SpecProbUpdate(link) => {
            recorded.specprob.insert((link.from, link.to), link.errprobs);
            (WUPDATE_SUCCESS, None)
        }
        Request::Shutdown => (WUPDATE_SUCCESS, None),
    }
}

/// Response record: type, echoed request (MACs only for spec-prob), station
/// index for add, status. `type_offset` shifts the type byte off its correct value.
fn build_response(
    request: &Request,
    raw: &[u8],
    status: u8,
    station: Option<i32>,
    type_offset: u8,
) -> Vec<u8> {
    let mut response = vec![request.msg_type() + 1 + type_offset];

    match request {
        Request::SpecProbUpdate(_) => response.extend_from_slice(&raw[1..13]),
        _ => response.extend_from_slice(raw),
    }

    if let Request::Add(_) = request {
        response.extend_from_slice(&station.unwrap_or(-1).to_be_bytes());
    }

    response.push(status);
    response
}
