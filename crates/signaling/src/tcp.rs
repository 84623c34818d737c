//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `SignalingServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`. Alle Tasks teilen sich die Registry ueber den
//! `SignalingState`.
//!
//! Die Session wird noch in der Accept-Schleife angelegt, damit
//! `max_clients` auch bei schnell aufeinanderfolgenden Verbindungen haelt.
//! Beim Shutdown wartet `starten` auf alle Verbindungs-Tasks, damit
//! `DisconnectAll` noch geschrieben wird.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::connection::ClientConnection;
use crate::error::SignalingResult;
use crate::server_state::SignalingState;

/// Wie lange der Shutdown auf offene Verbindungs-Tasks wartet
const ABSCHLUSS_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP-Signaling-Server
pub struct SignalingServer {
    state: Arc<SignalingState>,
    listener: TcpListener,
}

impl SignalingServer {
    /// Bindet den TCP-Socket
    ///
    /// Port 0 waehlt einen freien Port; siehe `lokale_adresse`.
    pub async fn binden(state: Arc<SignalingState>, addr: SocketAddr) -> SignalingResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { state, listener })
    }

    /// Tatsaechlich gebundene Adresse
    pub fn lokale_adresse(&self) -> SignalingResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(
        self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let lokale_addr = self.listener.local_addr()?;
        tracing::info!(
            server = %self.state.config.server_name,
            adresse = %lokale_addr,
            "TCP Chat-Server gestartet"
        );

        let mut verbindungen = JoinSet::new();

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            // Client-Limit pruefen
                            let online = self.state.registry.anzahl() as u32;
                            if online >= self.state.config.max_clients {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.state.config.max_clients,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
                            }

                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = ClientConnection::neu(
                                Arc::clone(&self.state),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();

                            verbindungen.spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Beendete Verbindungs-Tasks einsammeln
                Some(ergebnis) = verbindungen.join_next(), if !verbindungen.is_empty() => {
                    if let Err(e) = ergebnis {
                        tracing::error!(fehler = %e, "Verbindungs-Task abgebrochen");
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Chat-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        let offen = verbindungen.len();
        let abschluss = async { while verbindungen.join_next().await.is_some() {} };
        if tokio::time::timeout(ABSCHLUSS_TIMEOUT, abschluss).await.is_err() {
            tracing::warn!(offen, "Verbindungs-Tasks nicht rechtzeitig beendet – abgebrochen");
            verbindungen.abort_all();
        }

        tracing::info!("TCP Chat-Server gestoppt");
        Ok(())
    }
}
