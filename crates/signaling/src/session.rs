//! Session – Zustand einer einzelnen Verbindung
//!
//! Die Session haelt Identitaet, Anzeigename und Registrierungszustand.
//! Sie interpretiert keine Frames; das uebernimmt der Dispatcher.
//!
//! ## Zustaende
//! ```text
//! Unregistriert --Register--> Registriert --Deregister--> Deregistriert
//!                                  ^                            |
//!                                  +---------Register-----------+
//! ```

use netchat_core::types::{ClientId, ConnectionId};
use netchat_protocol::{frame::verzeichnis_eintrag, Frame};
use std::net::SocketAddr;

use crate::broadcast::SessionSender;

/// Registrierungszustand einer Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZustand {
    /// Verbunden, noch nie registriert
    Unregistriert,
    /// Name erfolgreich beansprucht
    Registriert,
    /// Abgemeldet, Verbindung besteht weiter
    Deregistriert,
}

/// Server-seitiger Datensatz einer Verbindung
#[derive(Debug)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub peer_addr: SocketAddr,
    /// Zuletzt gemeldete oder registrierte Identitaet
    pub client_id: ClientId,
    /// Leer solange nicht registriert
    pub name: String,
    pub zustand: SessionZustand,
    sender: SessionSender,
}

impl Session {
    /// Erstellt eine neue, unregistrierte Session
    pub fn neu(connection_id: ConnectionId, peer_addr: SocketAddr, sender: SessionSender) -> Self {
        Self {
            connection_id,
            peer_addr,
            client_id: ClientId::unbekannt(),
            name: String::new(),
            zustand: SessionZustand::Unregistriert,
            sender,
        }
    }

    pub fn ist_registriert(&self) -> bool {
        self.zustand == SessionZustand::Registriert
    }

    /// Reiht ein Frame in die Send-Queue dieser Verbindung ein
    pub fn senden(&self, frame: Frame) -> bool {
        self.sender.senden(frame)
    }

    /// Eintrag fuer das Verzeichnis (`"name id"`)
    pub fn verzeichnis_eintrag(&self) -> String {
        verzeichnis_eintrag(&self.name, &self.client_id)
    }

    /// Markiert die Session als registriert
    pub(crate) fn registrieren(&mut self, client_id: ClientId, name: &str) {
        self.client_id = client_id;
        self.name = name.to_string();
        self.zustand = SessionZustand::Registriert;
    }

    /// Loescht den Namen; die Identitaet bleibt erhalten
    pub(crate) fn deregistrieren(&mut self) {
        self.name.clear();
        self.zustand = SessionZustand::Deregistriert;
    }
}
