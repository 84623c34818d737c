//! Fehlertypen fuer den Client-Kern

use thiserror::Error;

/// Fehler die bei der Server-Verbindung auftreten koennen
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP-Verbindung fehlgeschlagen oder abgebrochen
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Verbindungsaufbau hat zu lange gedauert
    #[error("Zeitueberschreitung beim Verbinden mit {0}")]
    Timeout(String),

    /// Verbindung ist bereits getrennt
    #[error("Nicht mit Server verbunden")]
    NichtVerbunden,
}

/// Result-Typ fuer den Client-Kern
pub type ClientResult<T> = Result<T, ClientError>;
