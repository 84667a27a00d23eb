//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds one socket and spawns a Connection task for each
//! incoming client.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::network::Connection;
use crate::router::RouterHandle;
use crate::session::SessionId;

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    router: RouterHandle,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, router: RouterHandle) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Listener bound");
        Ok(Self { listener, router })
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = SessionId::next();
                    info!(%id, %addr, "Connection accepted");

                    let router = self.router.clone();
                    tokio::spawn(async move {
                        let connection = Connection::new(id, stream, addr, router);
                        if let Err(e) = connection.run().await {
                            error!(%id, %addr, error = %e, "Connection error");
                        }
                        info!(%id, %addr, "Connection closed");
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
