//! Client-Connection – Verwaltet eine einzelne Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Der Task liest Frames via `FrameCodec`, reicht sie an den
//! `MessageDispatcher` weiter und schreibt alles, was in der Send-Queue
//! der Session landet, auf den Socket.
//!
//! ## Verbindungsende
//! - EOF oder Lesefehler
//! - Dispatcher verlangt `Schliessen` (abgelehnte Registrierung)
//! - Shutdown-Signal
//!
//! Vor dem Schliessen wird die Session aus der Registry entfernt und die
//! Send-Queue geleert, damit Fehler-Frames und `DisconnectAll` den Client
//! noch erreichen.

use futures_util::{SinkExt, StreamExt};
use netchat_core::{ChatEvent, ConnectionId};
use netchat_protocol::{wire::FrameCodec, Frame};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use crate::dispatcher::{MessageDispatcher, Steuerung};
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
    conn: ConnectionId,
    sende_rx: mpsc::Receiver<Frame>,
}

impl ClientConnection {
    /// Legt die Session in der Registry an
    ///
    /// Die Session zaehlt ab hier gegen `max_clients`, auch bevor der
    /// Verbindungs-Task laeuft.
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        let (conn, sende_rx) = state.registry.verbindung_hinzufuegen(peer_addr);
        Self {
            state,
            peer_addr,
            conn,
            sende_rx,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht. Gibt den Trennungsgrund zurueck.
    pub async fn verarbeiten<S>(
        self,
        stream: S,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> String
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Self {
            state,
            peer_addr,
            conn,
            mut sende_rx,
        } = self;
        let registry = &state.registry;

        tracing::info!(peer = %peer_addr, verbindung = %conn, "Neue Verbindung");
        registry.ereignis_melden(ChatEvent::LogZeile(format!(
            "Neue Verbindung {} von {}",
            conn, peer_addr
        )));

        let mut framed = Framed::new(stream, FrameCodec::server());
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));

        let grund = loop {
            tokio::select! {
                // Eingehendes Frame vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(frame)) => {
                            tracing::trace!(
                                verbindung = %conn,
                                kommando = frame.code(),
                                "Frame empfangen"
                            );
                            if dispatcher.dispatch(frame, conn) == Steuerung::Schliessen {
                                break "Registrierung abgelehnt".to_string();
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                verbindung = %conn,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break format!("Lesefehler: {}", e);
                        }
                        None => {
                            tracing::info!(verbindung = %conn, "Verbindung vom Client getrennt");
                            break "vom Client getrennt".to_string();
                        }
                    }
                }

                // Ausgehendes Frame aus der Send-Queue
                Some(ausgehend) = sende_rx.recv() => {
                    match framed.send(ausgehend).await {
                        Ok(()) => {}
                        // Vom Encoder abgelehnt, der Socket ist unberuehrt
                        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                            tracing::warn!(
                                verbindung = %conn,
                                fehler = %e,
                                "Frame nicht kodierbar – verworfen"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                verbindung = %conn,
                                fehler = %e,
                                "Senden fehlgeschlagen"
                            );
                            break format!("Schreibfehler: {}", e);
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(verbindung = %conn, "Shutdown-Signal – Verbindung wird getrennt");
                        break "Server gestoppt".to_string();
                    }
                }
            }
        };

        // Aufraeumen: erst aus der Registry, dann Rest der Queue senden
        registry.entfernen(conn);
        queue_leeren(conn, &mut framed, &mut sende_rx).await;
        let _ = framed.close().await;

        registry.ereignis_melden(ChatEvent::Getrennt {
            grund: grund.clone(),
        });
        tracing::info!(verbindung = %conn, grund = %grund, "Verbindungs-Task beendet");
        grund
    }
}

/// Sendet alle noch eingereihten Frames
async fn queue_leeren<S>(
    conn: ConnectionId,
    framed: &mut Framed<S, FrameCodec>,
    sende_rx: &mut mpsc::Receiver<Frame>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    sende_rx.close();
    while let Ok(frame) = sende_rx.try_recv() {
        match framed.feed(frame).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::debug!(verbindung = %conn, fehler = %e, "Frame nicht kodierbar – verworfen");
            }
            Err(e) => {
                tracing::debug!(verbindung = %conn, fehler = %e, "Rest der Queue verworfen");
                return;
            }
        }
    }
    let _ = framed.flush().await;
}
