//! Message-Dispatcher – Routet Frames an die richtigen Handler
//!
//! Der Dispatcher empfaengt Frames von einer ClientConnection, prueft den
//! Registrierungszustand der Session und ruft den passenden Handler auf.
//! Antworten laufen immer ueber die Send-Queue der Verbindung.
//!
//! ## Zustandspruefung
//! - Vor der Registrierung sind nur `RegisterRequest`, `LivenessAnnounce`
//!   und `Ping` erlaubt, alles andere wird ignoriert
//! - Registrierte Sessions ignorieren `RegisterRequest` und
//!   `LivenessAnnounce`; die Identitaet der Registrierung bleibt gueltig
//! - Server->Client-Kommandos und unbekannte Bytes werden ignoriert

use netchat_core::ConnectionId;
use netchat_protocol::Frame;
use std::sync::Arc;

use crate::handlers::{auth_handler, chat_handler};
use crate::server_state::SignalingState;

/// Anweisung an die Verbindung nach einem Frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steuerung {
    /// Verbindung bleibt offen
    Weiter,
    /// Queue leeren und Verbindung schliessen
    Schliessen,
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes Frame
    pub fn dispatch(&self, frame: Frame, conn: ConnectionId) -> Steuerung {
        let registriert = self.state.registry.absender(conn).is_some();

        if !registriert && !frame.command().is_some_and(|c| c.vor_registrierung_erlaubt()) {
            tracing::debug!(
                verbindung = %conn,
                kommando = frame.code(),
                "Kommando vor Registrierung ignoriert"
            );
            return Steuerung::Weiter;
        }

        match frame {
            // -------------------------------------------------------------------
            // Registrierung
            // -------------------------------------------------------------------
            Frame::RegisterRequest { client_id, name } => {
                if registriert {
                    tracing::debug!(verbindung = %conn, "Erneute Registrierung ignoriert");
                    return Steuerung::Weiter;
                }
                auth_handler::handle_register(client_id, name, conn, &self.state)
            }

            Frame::LivenessAnnounce { client_id } => {
                if !registriert {
                    auth_handler::handle_liveness(client_id, conn, &self.state);
                }
                Steuerung::Weiter
            }

            Frame::DeregisterRequest => {
                auth_handler::handle_deregister(conn, &self.state);
                Steuerung::Weiter
            }

            // -------------------------------------------------------------------
            // Chat
            // -------------------------------------------------------------------
            Frame::MessageToAllRequest { text } => {
                chat_handler::handle_message_to_all(text, conn, &self.state);
                Steuerung::Weiter
            }

            Frame::MessageToSelectedRequest { empfaenger, text } => {
                chat_handler::handle_message_to_selected(empfaenger, text, conn, &self.state);
                Steuerung::Weiter
            }

            Frame::Ping => {
                chat_handler::handle_ping(conn, &self.state);
                Steuerung::Weiter
            }

            // Server->Client-Kommandos und unbekannte Bytes
            andere => {
                tracing::debug!(
                    verbindung = %conn,
                    kommando = andere.code(),
                    "Unerwartetes Kommando ignoriert"
                );
                Steuerung::Weiter
            }
        }
    }
}
