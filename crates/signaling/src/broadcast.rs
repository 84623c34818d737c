//! Send-Queues der Verbindungen
//!
//! Jede Verbindung besitzt eine begrenzte Queue, aus der ihr
//! Verbindungs-Task liest und auf den Socket schreibt. Die Registry reiht
//! nur nicht-blockierend ein; ein langsamer Client bremst so niemanden aus.

use netchat_core::types::ConnectionId;
use netchat_protocol::Frame;
use tokio::sync::mpsc;

/// Standard-Groesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 256;

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct SessionSender {
    pub connection_id: ConnectionId,
    tx: mpsc::Sender<Frame>,
}

impl SessionSender {
    /// Erstellt Sender und Empfangs-Queue fuer eine Verbindung
    pub fn neu(connection_id: ConnectionId, groesse: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(groesse.max(1));
        (Self { connection_id, tx }, rx)
    }

    /// Reiht ein Frame nicht-blockierend ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, frame: Frame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    verbindung = %self.connection_id,
                    "Send-Queue voll – Frame verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    verbindung = %self.connection_id,
                    "Send-Queue geschlossen (Verbindung getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
