//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use netchat_signaling::server_state::{SignalingConfig, RESERVIERTE_NAMEN};
use netchat_signaling::broadcast::SEND_QUEUE_GROESSE;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: u32,
    /// Namen, die kein Client registrieren darf (ohne Gross-/Kleinschreibung)
    pub reservierte_namen: Vec<String>,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Netchat Server".into(),
            max_clients: 512,
            reservierte_namen: RESERVIERTE_NAMEN.iter().map(|s| s.to_string()).collect(),
            send_queue_groesse: SEND_QUEUE_GROESSE,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den TCP-Listener
    pub bind_adresse: String,
    /// Port fuer den TCP-Listener
    pub tcp_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 4242,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// Konfiguration fuer den Chat-Dienst
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            server_name: self.server.name.clone(),
            max_clients: self.server.max_clients,
            send_queue_groesse: self.server.send_queue_groesse,
            reservierte_namen: self.server.reservierte_namen.clone(),
        }
    }
}
