//! Typisierte Frames
//!
//! Ein `Frame` ist eine vollstaendige Protokollnachricht mit bereits
//! dekodierten Feldern. Die Kommandos 5 und 6 haben je Richtung ein anderes
//! Feldlayout und deshalb je zwei Varianten (`...Request` fuer C->S).

use netchat_core::types::ClientId;

use crate::command::{Command, ErrorCode};

/// Trennzeichen fuer String-Listen auf dem Draht
///
/// Eintraege werden nicht maskiert: ein Komma innerhalb eines Eintrags
/// teilt ihn beim Empfaenger in zwei.
pub const LISTEN_TRENNER: char = ',';

/// Eine einzelne Protokollnachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Registrierungsanfrage (C->S)
    RegisterRequest { client_id: ClientId, name: String },
    /// Verzeichnis der uebrigen registrierten Clients (S->C), je `"name id"`
    RegisteredClients { eintraege: Vec<String> },
    /// Ein Client ist beigetreten (S->C)
    ClientJoined { client_id: ClientId, name: String },
    /// Ein Client hat den Chat verlassen (S->C)
    ClientLeft { client_id: ClientId, name: String },
    /// Nachricht an alle (C->S)
    MessageToAllRequest { text: String },
    /// Nachricht an alle (S->C)
    MessageToAll {
        absender_id: ClientId,
        absender_name: String,
        text: String,
    },
    /// Nachricht an ausgewaehlte Clients (C->S)
    MessageToSelectedRequest { empfaenger: Vec<String>, text: String },
    /// Nachricht an ausgewaehlte Clients (S->C)
    MessageToSelected {
        empfaenger: Vec<String>,
        absender_id: ClientId,
        absender_name: String,
        text: String,
    },
    /// Server-Nachricht an alle (S->C)
    ServerBroadcast { text: String },
    /// Server-Nachricht an einzelne Clients (S->C)
    ServerPrivate { text: String },
    /// Im Protokoll definiert, wird aber nie gesendet
    RegistrationSuccess,
    /// Server wird gestoppt, Client soll trennen (S->C)
    DisconnectAll,
    /// Abmeldung ohne Verbindungsabbau (C->S)
    DeregisterRequest,
    /// Server hat den Client abgemeldet (S->C)
    Deregistered,
    /// Lebenszeichen (C->S), wird mit `ServerPrivate("pong")` beantwortet
    Ping,
    /// Identitaet direkt nach dem Verbindungsaufbau (C->S)
    LivenessAnnounce { client_id: ClientId },
    /// Registrierung abgelehnt (S->C)
    Error(ErrorCode),
    /// Unbekanntes Kommando-Byte; der Frame-Inhalt wurde verworfen
    Unbekannt { code: u8 },
}

impl Frame {
    /// Gibt das Kommando dieses Frames zurueck (`None` fuer unbekannte Bytes)
    pub fn command(&self) -> Option<Command> {
        let command = match self {
            Self::RegisterRequest { .. } => Command::RegisterRequest,
            Self::RegisteredClients { .. } => Command::RegisteredClients,
            Self::ClientJoined { .. } => Command::ClientJoined,
            Self::ClientLeft { .. } => Command::ClientLeft,
            Self::MessageToAllRequest { .. } | Self::MessageToAll { .. } => Command::MessageToAll,
            Self::MessageToSelectedRequest { .. } | Self::MessageToSelected { .. } => {
                Command::MessageToSelected
            }
            Self::ServerBroadcast { .. } => Command::ServerBroadcast,
            Self::ServerPrivate { .. } => Command::ServerPrivate,
            Self::RegistrationSuccess => Command::RegistrationSuccess,
            Self::DisconnectAll => Command::DisconnectAll,
            Self::DeregisterRequest => Command::DeregisterRequest,
            Self::Deregistered => Command::Deregistered,
            Self::Ping => Command::Ping,
            Self::LivenessAnnounce { .. } => Command::LivenessAnnounce,
            Self::Error(code) => code.command(),
            Self::Unbekannt { .. } => return None,
        };
        Some(command)
    }

    /// Das Byte, unter dem dieses Frame auf dem Draht steht
    pub fn code(&self) -> u8 {
        match self {
            Self::Unbekannt { code } => *code,
            other => other.command().map(Command::code).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Listen-Hilfsfunktionen
// ---------------------------------------------------------------------------

/// Verbindet Listeneintraege zu einem Draht-String
pub fn liste_verbinden(eintraege: &[String]) -> String {
    eintraege.join(&LISTEN_TRENNER.to_string())
}

/// Teilt einen Draht-String in Listeneintraege
///
/// Ein leerer String ergibt eine leere Liste.
pub fn liste_teilen(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(LISTEN_TRENNER).map(str::to_string).collect()
}

/// Verzeichniseintrag im Format `"name id"`
pub fn verzeichnis_eintrag(name: &str, client_id: &ClientId) -> String {
    format!("{} {}", name, client_id)
}

/// Zerlegt einen Verzeichniseintrag in `(name, id)`
///
/// Namen enthalten nie Leerzeichen, daher trennt das erste Leerzeichen.
pub fn verzeichnis_eintrag_teilen(eintrag: &str) -> Option<(&str, &str)> {
    eintrag.split_once(' ')
}

/// Extrahiert die Client-ID aus einem Empfaenger-Eintrag
///
/// Akzeptiert `"name id"` wie aus dem Verzeichnis und die blanke `id`.
pub fn empfaenger_id(eintrag: &str) -> &str {
    eintrag.split_whitespace().last().unwrap_or("")
}
