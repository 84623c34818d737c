//! Beobachter-Ereignisse fuer die Praesentationsschicht
//!
//! Der Server-Kern kennt keine konkrete Oberflaeche. Er veroeffentlicht
//! `ChatEvent`s ueber einen Kanal; wer Log-Fenster, Teilnehmerliste oder
//! Benachrichtigungen anzeigen will, abonniert diesen Kanal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ClientId;

/// Empfaengerkreis einer Chat-Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Empfaenger {
    /// An alle registrierten Teilnehmer
    Alle,
    /// An die angegebenen Eintraege (`"name id"` oder nur `id`)
    Ausgewaehlt(Vec<String>),
}

/// Alle Ereignisse, die der Kern an Beobachter meldet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// Ein Teilnehmer hat sich erfolgreich registriert
    PeerBeigetreten { client_id: ClientId, name: String },
    /// Ein registrierter Teilnehmer hat sich abgemeldet oder die Verbindung getrennt
    PeerVerlassen { client_id: ClientId, name: String },
    /// Eine Chat-Nachricht wurde weitergeleitet
    NachrichtEmpfangen {
        text: String,
        absender_name: String,
        empfaenger: Empfaenger,
        zeitpunkt: DateTime<Utc>,
    },
    /// Freie Protokollzeile (Verbindungsauf- und abbau)
    LogZeile(String),
    /// Eine Verbindung wurde beendet
    Getrennt { grund: String },
}

impl ChatEvent {
    /// Erstellt ein `NachrichtEmpfangen`-Ereignis mit aktuellem Zeitstempel
    pub fn nachricht(
        text: impl Into<String>,
        absender_name: impl Into<String>,
        empfaenger: Empfaenger,
    ) -> Self {
        Self::NachrichtEmpfangen {
            text: text.into(),
            absender_name: absender_name.into(),
            empfaenger,
            zeitpunkt: Utc::now(),
        }
    }
}
