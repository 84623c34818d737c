//! Auth-Handler – Registrierung, Identitaet, Abmeldung
//!
//! Eine abgelehnte Registrierung beantwortet der Server mit genau einem
//! Fehler-Frame und schliesst danach die Verbindung.

use netchat_core::{ClientId, ConnectionId};
use netchat_protocol::Frame;
use std::sync::Arc;

use crate::dispatcher::Steuerung;
use crate::error::SignalingError;
use crate::server_state::SignalingState;

/// Verarbeitet eine Registrierungsanfrage
pub fn handle_register(
    client_id: ClientId,
    name: String,
    conn: ConnectionId,
    state: &Arc<SignalingState>,
) -> Steuerung {
    match state.registry.registrieren(conn, client_id, &name) {
        Ok(()) => Steuerung::Weiter,
        Err(SignalingError::Registrierung(fehler)) => {
            tracing::info!(
                verbindung = %conn,
                name = %name,
                grund = %fehler,
                "Registrierung abgelehnt"
            );
            state
                .registry
                .an_verbindung_senden(conn, Frame::Error(fehler.error_code()));
            Steuerung::Schliessen
        }
        Err(e) => {
            // Bereits registriert oder schon entfernt
            tracing::debug!(verbindung = %conn, fehler = %e, "Registrierung ignoriert");
            Steuerung::Weiter
        }
    }
}

/// Speichert die vom Client gemeldete Identitaet
pub fn handle_liveness(client_id: ClientId, conn: ConnectionId, state: &Arc<SignalingState>) {
    if state.registry.identitaet_setzen(conn, client_id.clone()) {
        tracing::debug!(verbindung = %conn, client_id = %client_id, "Identitaet gemeldet");
        state
            .registry
            .ereignis_melden(netchat_core::ChatEvent::LogZeile(format!(
                "Client {} meldet sich ({})",
                client_id, conn
            )));
    }
}

/// Meldet die Verbindung ab, ohne sie zu trennen
pub fn handle_deregister(conn: ConnectionId, state: &Arc<SignalingState>) {
    state.registry.deregistrieren(conn);
}
