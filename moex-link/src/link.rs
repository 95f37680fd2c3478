use std::net::SocketAddr;
use std::sync::Arc;

use moex_core::memo::{Memo, wire};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::moose::Moose;

/// The device always connects to this port.
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum LinkError {
    /// No device communication is possible without the fixed port;
    /// the caller is expected to abort the whole run.
    #[error("failed to bind device port {port}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

type OutboundSlot = Arc<RwLock<Option<mpsc::UnboundedSender<Memo>>>>;

/// Maintains the single logical connection to the device across the
/// life of the process. Connection loss is recovered by re-accepting on
/// the same listener; the experiment never notices. Sends are
/// best-effort telemetry: queued when connected, dropped otherwise.
pub struct DeviceLink {
    moose: Arc<Moose>,
    port: u16,
    outbound: OutboundSlot,
    local_addr: RwLock<Option<SocketAddr>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceLink {
    pub fn new(moose: Arc<Moose>) -> Self {
        Self::with_port(moose, DEFAULT_PORT)
    }

    /// Port 0 picks an ephemeral port; see [`DeviceLink::local_addr`].
    pub fn with_port(moose: Arc<Moose>, port: u16) -> Self {
        Self {
            moose,
            port,
            outbound: Arc::new(RwLock::new(None)),
            local_addr: RwLock::new(None),
            accept_task: Mutex::new(None),
        }
    }

    /// Bind the listener and begin accepting the device. Called once
    /// per process; a bind failure is fatal.
    pub async fn start(&self) -> Result<(), LinkError> {
        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .map_err(|source| LinkError::Bind {
                port: self.port,
                source,
            })?;
        let addr = listener.local_addr().ok();
        *self.local_addr.write() = addr;
        info!(?addr, "listening for device");

        let moose = self.moose.clone();
        let outbound = self.outbound.clone();
        let handle = tokio::spawn(accept_loop(listener, moose, outbound));
        *self.accept_task.lock() = Some(handle);
        Ok(())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn is_connected(&self) -> bool {
        self.outbound.read().is_some()
    }

    /// Queue a memo for the device without blocking. Dropped silently
    /// when no device is connected.
    pub fn send(&self, memo: Memo) {
        match self.outbound.read().as_ref() {
            Some(tx) => {
                let _ = tx.send(memo);
            }
            None => trace!(%memo, "no device connection, memo dropped"),
        }
    }

    /// Best-effort end message, then stop accepting and reading. Any
    /// in-flight read is interrupted rather than awaited.
    pub fn shutdown(&self) {
        self.send(Memo::new(wire::CONNECTION, wire::END, "", ""));
        if let Some(handle) = self.accept_task.lock().take() {
            handle.abort();
        }
        *self.outbound.write() = None;
    }
}

/// One connection at a time: accept, serve until EOF or I/O error,
/// clear the outbound slot, accept again.
async fn accept_loop(listener: TcpListener, moose: Arc<Moose>, outbound: OutboundSlot) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "accept failed");
                continue;
            }
        };
        info!(%peer, "device connected");

        let (tx, rx) = mpsc::unbounded_channel();
        *outbound.write() = Some(tx.clone());
        serve_connection(stream, rx, tx, &moose).await;
        *outbound.write() = None;
        debug!("device disconnected, listening again");
    }
}

async fn serve_connection(
    stream: TcpStream,
    mut rx: mpsc::UnboundedReceiver<Memo>,
    tx: mpsc::UnboundedSender<Memo>,
    moose: &Moose,
) {
    let (read_half, mut write_half) = stream.into_split();

    // Outbound writer: a slow or blocked write must never stall the
    // read loop, so sends drain on their own task.
    let writer = tokio::spawn(async move {
        while let Some(memo) = rx.recv().await {
            let line = format!("{memo}\n");
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!(%line, "device message");
                let memo = Memo::from_line(&line);
                match memo.action.as_str() {
                    wire::CLICK | wire::SCROLL | wire::ZOOM => moose.process_event(&memo),
                    wire::CONNECTION if memo.mode == wire::KEEP_ALIVE => {
                        // Echo back as the liveness acknowledgment.
                        let _ = tx.send(memo);
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                debug!("device closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "read error from device");
                break;
            }
        }
    }

    // Unacknowledged queued sends are lost with the connection.
    writer.abort();
}
