//! Client-Ereignisse
//!
//! Jedes vom Server empfangene Frame wird in hoechstens ein `ClientEvent`
//! uebersetzt.

use netchat_core::ClientId;
use netchat_protocol::{frame::verzeichnis_eintrag_teilen, ErrorCode, Frame};

/// Ereignisse, die der Client-Kern an die Oberflaeche meldet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Registrierung erfolgreich; alle anderen Teilnehmer als `(name, id)`
    Verzeichnis(Vec<(String, ClientId)>),
    PeerBeigetreten { client_id: ClientId, name: String },
    PeerVerlassen { client_id: ClientId, name: String },
    /// Chat-Nachricht; `empfaenger` ist `None` bei Nachrichten an alle
    Nachricht {
        absender_id: ClientId,
        absender_name: String,
        text: String,
        empfaenger: Option<Vec<String>>,
        /// Echo der eigenen Nachricht
        eigene: bool,
    },
    /// Nachricht vom Server selbst
    ServerNachricht { text: String, privat: bool },
    /// Server hat die Registrierung abgelehnt und trennt die Verbindung
    RegistrierungAbgelehnt(ErrorCode),
    /// Server hat diesen Client abgemeldet
    Deregistriert,
    /// Server wird gestoppt
    ServerGestoppt,
    /// Verbindung beendet
    Getrennt { grund: String },
}

impl ClientEvent {
    /// Uebersetzt ein Frame vom Server
    ///
    /// Gibt `None` fuer Frames zurueck, die kein Ereignis ausloesen.
    pub fn aus_frame(frame: Frame, eigene_id: &ClientId) -> Option<Self> {
        let event = match frame {
            Frame::RegisteredClients { eintraege } => Self::Verzeichnis(
                eintraege
                    .iter()
                    .filter_map(|e| verzeichnis_eintrag_teilen(e))
                    .map(|(name, id)| (name.to_string(), ClientId::from(id)))
                    .collect(),
            ),
            Frame::ClientJoined { client_id, name } => Self::PeerBeigetreten { client_id, name },
            Frame::ClientLeft { client_id, name } => Self::PeerVerlassen { client_id, name },
            Frame::MessageToAll {
                absender_id,
                absender_name,
                text,
            } => Self::Nachricht {
                eigene: &absender_id == eigene_id,
                absender_id,
                absender_name,
                text,
                empfaenger: None,
            },
            Frame::MessageToSelected {
                empfaenger,
                absender_id,
                absender_name,
                text,
            } => Self::Nachricht {
                eigene: &absender_id == eigene_id,
                absender_id,
                absender_name,
                text,
                empfaenger: Some(empfaenger),
            },
            Frame::ServerBroadcast { text } => Self::ServerNachricht {
                text,
                privat: false,
            },
            Frame::ServerPrivate { text } => Self::ServerNachricht { text, privat: true },
            Frame::Error(code) => Self::RegistrierungAbgelehnt(code),
            Frame::Deregistered => Self::Deregistriert,
            Frame::DisconnectAll => Self::ServerGestoppt,
            _ => return None,
        };
        Some(event)
    }

    /// Ob der Client nach diesem Ereignis die Verbindung schliesst
    pub fn beendet_verbindung(&self) -> bool {
        matches!(
            self,
            Self::RegistrierungAbgelehnt(_) | Self::ServerGestoppt | Self::Getrennt { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verzeichnis_wird_zerlegt() {
        let event = ClientEvent::aus_frame(
            Frame::RegisteredClients {
                eintraege: vec!["alice {a}".into(), "kaputt".into()],
            },
            &ClientId::from("{ich}"),
        );
        assert_eq!(
            event,
            Some(ClientEvent::Verzeichnis(vec![(
                "alice".to_string(),
                ClientId::from("{a}")
            )]))
        );
    }

    #[test]
    fn eigenes_echo_erkannt() {
        let ich = ClientId::from("{ich}");
        let frame = |id: &str| Frame::MessageToAll {
            absender_id: ClientId::from(id),
            absender_name: "alice".into(),
            text: "hi".into(),
        };

        assert!(matches!(
            ClientEvent::aus_frame(frame("{ich}"), &ich),
            Some(ClientEvent::Nachricht { eigene: true, .. })
        ));
        assert!(matches!(
            ClientEvent::aus_frame(frame("{du}"), &ich),
            Some(ClientEvent::Nachricht { eigene: false, .. })
        ));
    }

    #[test]
    fn server_nachrichten_und_abbruch() {
        let ich = ClientId::from("{ich}");
        assert_eq!(
            ClientEvent::aus_frame(Frame::ServerPrivate { text: "pong".into() }, &ich),
            Some(ClientEvent::ServerNachricht {
                text: "pong".into(),
                privat: true
            })
        );

        let abgelehnt = ClientEvent::aus_frame(Frame::Error(ErrorCode::NameUsed), &ich).unwrap();
        assert!(abgelehnt.beendet_verbindung());
        let gestoppt = ClientEvent::aus_frame(Frame::DisconnectAll, &ich).unwrap();
        assert!(gestoppt.beendet_verbindung());
        assert!(!ClientEvent::Deregistriert.beendet_verbindung());
    }

    #[test]
    fn ohne_ereignis() {
        let ich = ClientId::from("{ich}");
        assert_eq!(ClientEvent::aus_frame(Frame::RegistrationSuccess, &ich), None);
        assert_eq!(ClientEvent::aus_frame(Frame::Unbekannt { code: 42 }, &ich), None);
    }
}
