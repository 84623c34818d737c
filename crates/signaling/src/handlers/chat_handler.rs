//! Chat-Handler – Nachrichten an alle oder an ausgewaehlte Clients
//!
//! Der Absender erhaelt seine eigene Nachricht immer zurueck; Clients
//! zeigen sie erst beim Echo an.

use netchat_core::{ChatEvent, ClientId, ConnectionId, Empfaenger};
use netchat_protocol::{frame::empfaenger_id, wire::passt_in_frame, Frame};
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Verteilt eine Nachricht an alle registrierten Clients
pub fn handle_message_to_all(text: String, conn: ConnectionId, state: &Arc<SignalingState>) {
    let Some((absender_id, absender_name)) = state.registry.absender(conn) else {
        return;
    };

    let frame = Frame::MessageToAll {
        absender_id,
        absender_name: absender_name.clone(),
        text: text.clone(),
    };
    if !passt_in_frame(&frame) {
        tracing::warn!(verbindung = %conn, zeichen = text.len(), "Nachricht zu gross – verworfen");
        return;
    }

    let anzahl = state.registry.an_alle_senden(frame, None);
    tracing::debug!(verbindung = %conn, empfaenger = anzahl, "Nachricht an alle verteilt");

    state
        .registry
        .ereignis_melden(ChatEvent::nachricht(text, absender_name, Empfaenger::Alle));
}

/// Verteilt eine Nachricht an die gelisteten Clients und den Absender
///
/// Empfaenger-Eintraege duerfen `"name id"` oder nur `id` sein.
pub fn handle_message_to_selected(
    empfaenger: Vec<String>,
    text: String,
    conn: ConnectionId,
    state: &Arc<SignalingState>,
) {
    let Some((absender_id, absender_name)) = state.registry.absender(conn) else {
        return;
    };

    let ids: Vec<ClientId> = empfaenger
        .iter()
        .map(|e| empfaenger_id(e))
        .filter(|id| !id.is_empty())
        .map(ClientId::from)
        .collect();

    let frame = Frame::MessageToSelected {
        empfaenger: empfaenger.clone(),
        absender_id,
        absender_name: absender_name.clone(),
        text: text.clone(),
    };
    if !passt_in_frame(&frame) {
        tracing::warn!(verbindung = %conn, zeichen = text.len(), "Nachricht zu gross – verworfen");
        return;
    }

    let anzahl = state.registry.an_ausgewaehlte_senden(frame, &ids, conn);
    tracing::debug!(verbindung = %conn, empfaenger = anzahl, "Nachricht an Auswahl verteilt");

    state.registry.ereignis_melden(ChatEvent::nachricht(
        text,
        absender_name,
        Empfaenger::Ausgewaehlt(empfaenger),
    ));
}

/// Beantwortet einen Ping mit `ServerPrivate("pong")`
pub fn handle_ping(conn: ConnectionId, state: &Arc<SignalingState>) {
    state.registry.an_verbindung_senden(
        conn,
        Frame::ServerPrivate {
            text: "pong".to_string(),
        },
    );
}
