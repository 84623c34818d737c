//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Konfiguration und Registry als Arc-Referenzen, die sicher
//! zwischen tokio-Tasks geteilt werden koennen.

use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::SEND_QUEUE_GROESSE;
use crate::registry::Registry;

/// Standardmaessig reservierte Namen
pub const RESERVIERTE_NAMEN: [&str; 4] = ["server", "chatserver", "majechatserver", "client"];

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
    /// Namen, die kein Client registrieren darf
    pub reservierte_namen: Vec<String>,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Netchat Server".to_string(),
            max_clients: 512,
            send_queue_groesse: SEND_QUEUE_GROESSE,
            reservierte_namen: RESERVIERTE_NAMEN.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Tabelle aller Sessions
    pub registry: Registry,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig) -> Arc<Self> {
        let registry = Registry::neu(&config.reservierte_namen, config.send_queue_groesse);
        Arc::new(Self {
            config: Arc::new(config),
            registry,
            start_time: Instant::now(),
        })
    }

    /// Uptime in Sekunden
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Leitet den Shutdown ein
    ///
    /// Jede Verbindung erhaelt zuerst `DisconnectAll`, danach wird das
    /// Shutdown-Signal gesetzt. Die Verbindungs-Tasks leeren ihre Queue
    /// vor dem Schliessen.
    pub fn herunterfahren(&self, shutdown_tx: &tokio::sync::watch::Sender<bool>) {
        let anzahl = self.registry.alle_trennen();
        tracing::info!(verbindungen = anzahl, "Server wird heruntergefahren");
        let _ = shutdown_tx.send(true);
    }
}
