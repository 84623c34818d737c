//! netchat-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod konsole;

use anyhow::{Context, Result};
use config::ServerConfig;
use konsole::KonsolenBefehl;
use netchat_core::{ChatEvent, Empfaenger};
use netchat_signaling::{SignalingServer, SignalingState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Chat-Dienst und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. TCP-Listener binden
    /// 2. Event-Protokoll und Konsole starten
    /// 3. Auf Ctrl-C oder `/stop` warten
    /// 4. Alle Verbindungen mit `DisconnectAll` beenden
    pub async fn starten(self) -> Result<()> {
        let (konsole_tx, konsole_rx) = mpsc::channel(16);
        konsole::lesen_starten(konsole_tx).context("Konsolen-Thread konnte nicht gestartet werden")?;

        let laufend = self.binden().await?;
        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C oder /stop)...");
        laufend.laufen(konsole_rx).await
    }

    /// Bindet den Listener und startet die Hintergrund-Tasks
    pub async fn binden(&self) -> Result<LaufenderServer> {
        let bind_adresse: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{}'", self.config.tcp_bind_adresse()))?;

        let state = SignalingState::neu(self.config.signaling_config());
        let server = SignalingServer::binden(Arc::clone(&state), bind_adresse)
            .await
            .with_context(|| format!("TCP-Listener auf {} konnte nicht gebunden werden", bind_adresse))?;
        let adresse = server.lokale_adresse()?;

        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %adresse,
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        tokio::spawn(ereignisse_protokollieren(state.registry.events_abonnieren()));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let listener = tokio::spawn(async move {
            if let Err(e) = server.starten(shutdown_rx).await {
                tracing::error!(fehler = %e, "TCP-Listener beendet mit Fehler");
            }
        });

        Ok(LaufenderServer {
            state,
            adresse,
            shutdown_tx,
            listener,
        })
    }
}

/// Gebundener, laufender Server
pub struct LaufenderServer {
    pub state: Arc<SignalingState>,
    pub adresse: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    listener: tokio::task::JoinHandle<()>,
}

impl LaufenderServer {
    /// Verarbeitet Konsolen-Befehle bis Ctrl-C oder `/stop`
    pub async fn laufen(self, mut konsole_rx: mpsc::Receiver<KonsolenBefehl>) -> Result<()> {
        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Ctrl-C-Handler konnte nicht installiert werden")?;
                    tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                    break;
                }
                Some(befehl) = konsole_rx.recv() => {
                    if befehl == KonsolenBefehl::Stop {
                        tracing::info!("Stop-Befehl empfangen, Server wird beendet");
                        break;
                    }
                    konsole::ausfuehren(&befehl, &self.state);
                }
            }
        }
        self.stoppen().await
    }

    /// Sendet `DisconnectAll` an alle und wartet auf den Listener
    ///
    /// Der Listener endet erst, wenn alle Verbindungs-Tasks ihre Queue
    /// geleert haben.
    pub async fn stoppen(self) -> Result<()> {
        self.state.herunterfahren(&self.shutdown_tx);
        self.listener.await.context("Listener-Task abgebrochen")?;
        Ok(())
    }
}

/// Schreibt alle Chat-Ereignisse ins Log
async fn ereignisse_protokollieren(mut rx: broadcast::Receiver<ChatEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => ereignis_protokollieren(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(verpasst = n, "Event-Protokoll hinkt hinterher");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn ereignis_protokollieren(event: &ChatEvent) {
    match event {
        ChatEvent::PeerBeigetreten { client_id, name } => {
            tracing::info!(name = %name, client_id = %client_id, "Teilnehmer beigetreten");
        }
        ChatEvent::PeerVerlassen { client_id, name } => {
            tracing::info!(name = %name, client_id = %client_id, "Teilnehmer hat verlassen");
        }
        ChatEvent::NachrichtEmpfangen {
            text,
            absender_name,
            empfaenger,
            zeitpunkt,
        } => {
            let an = match empfaenger {
                Empfaenger::Alle => "alle".to_string(),
                Empfaenger::Ausgewaehlt(liste) => liste.join(", "),
            };
            tracing::info!(
                zeit = %zeitpunkt.format("%H:%M:%S"),
                von = %absender_name,
                an = %an,
                "{}",
                text
            );
        }
        ChatEvent::LogZeile(zeile) => tracing::info!("{}", zeile),
        ChatEvent::Getrennt { grund } => tracing::debug!(grund = %grund, "Verbindung beendet"),
    }
}
