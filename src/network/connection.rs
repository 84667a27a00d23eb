//! Connection - handles an individual client connection.
//!
//! Each connection runs three tasks over the split socket:
//!
//! ```text
//!   socket read half ──FramedRead──▶ read loop ──▶ session forward loop ──▶ router
//!   socket write half ◀─FramedWrite── write loop ◀── session inbox ◀─────── router
//! ```
//!
//! The first task to finish (EOF, I/O error, or QUIT) ends the
//! connection: the siblings are aborted and the router is told to
//! detach the session.

use pirc_proto::IrcCodec;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, instrument, warn};

use crate::router::RouterHandle;
use crate::session::{Session, SessionHandle, SessionId};

/// Depth of the per-connection queues (session inbox and parsed-line
/// queue). A full inbox stalls the router; a full parsed-line queue
/// stalls the socket read.
const SESSION_QUEUE_DEPTH: usize = 64;

/// A client connection handler.
pub struct Connection {
    id: SessionId,
    addr: SocketAddr,
    stream: TcpStream,
    router: RouterHandle,
}

impl Connection {
    /// Create a new connection handler.
    pub fn new(id: SessionId, stream: TcpStream, addr: SocketAddr, router: RouterHandle) -> Self {
        Self {
            id,
            addr,
            stream,
            router,
        }
    }

    /// Drive the connection until either side goes away.
    #[instrument(skip(self), fields(id = %self.id, addr = %self.addr), name = "connection")]
    pub async fn run(self) -> anyhow::Result<()> {
        let Connection {
            id,
            addr: _,
            stream,
            router,
        } = self;

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, IrcCodec::new());
        let mut writer = FramedWrite::new(write_half, IrcCodec::new());

        let (session_handle, mut inbox) = SessionHandle::new(id, SESSION_QUEUE_DEPTH);
        let (parsed_tx, parsed_rx) = mpsc::channel(SESSION_QUEUE_DEPTH);

        router.attach(session_handle).await;
        let session = Session::new(id, parsed_rx, router.clone());

        let mut read_task = tokio::spawn(async move {
            while let Some(item) = reader.next().await {
                match item {
                    Ok(msg) => {
                        debug!(command = %msg.command, "received");
                        if parsed_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "read error");
                        break;
                    }
                }
            }
        });

        let mut write_task = tokio::spawn(async move {
            while let Some(msg) = inbox.recv().await {
                if let Err(e) = writer.send(msg).await {
                    warn!(error = %e, "write error");
                    break;
                }
            }
        });

        let mut forward_task = tokio::spawn(session.run());

        tokio::select! {
            _ = &mut read_task => {}
            _ = &mut write_task => {}
            _ = &mut forward_task => {}
        }
        read_task.abort();
        write_task.abort();
        forward_task.abort();

        // Same cleanup as QUIT, then the session record goes away.
        router.detach(id).await;
        Ok(())
    }
}
