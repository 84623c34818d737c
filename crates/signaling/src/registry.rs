//! Registry – Tabelle aller Sessions
//!
//! Die Registry besitzt jede Session genau einmal und ist die einzige
//! Stelle, die Namen vergibt. Alle Operationen laufen unter einem einzigen
//! Mutex; Registrierung prueft und uebernimmt atomar, damit zwei
//! gleichzeitige Anfragen nie denselben Namen erhalten.
//!
//! Fan-out blockiert nie: Frames werden nur in die Send-Queues der
//! Verbindungen eingereiht.

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use netchat_core::{ChatEvent, ClientId, ConnectionId};
use netchat_protocol::{wire::passt_in_frame, Frame};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::broadcast::SessionSender;
use crate::error::{RegistrierungsFehler, SignalingError, SignalingResult};
use crate::session::{Session, SessionZustand};

/// Kapazitaet des Event-Kanals fuer Beobachter
const EVENT_KANAL_GROESSE: usize = 256;

/// Minimale Namenslaenge in Zeichen
pub const NAME_MIN: usize = 5;
/// Maximale Namenslaenge in Zeichen
pub const NAME_MAX: usize = 20;

type SessionTabelle = BTreeMap<ConnectionId, Session>;

struct RegistryInner {
    /// Sortiert nach ConnectionId, also in Annahme-Reihenfolge
    sessions: Mutex<SessionTabelle>,
    /// Kleingeschrieben
    reservierte_namen: HashSet<String>,
    naechste_id: AtomicU64,
    send_queue_groesse: usize,
    event_tx: broadcast::Sender<ChatEvent>,
}

/// Gemeinsam genutzte Session-Tabelle
///
/// Klonen ist billig; alle Klone teilen dieselbe Tabelle.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Erstellt eine leere Registry
    pub fn neu<I, S>(reservierte_namen: I, send_queue_groesse: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (event_tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(BTreeMap::new()),
                reservierte_namen: reservierte_namen
                    .into_iter()
                    .map(|n| n.as_ref().to_lowercase())
                    .collect(),
                naechste_id: AtomicU64::new(1),
                send_queue_groesse,
                event_tx,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Verbindungen
    // -----------------------------------------------------------------------

    /// Legt eine neue, unregistrierte Session an
    ///
    /// Gibt die Verbindungs-ID und die Empfangsseite der Send-Queue zurueck.
    pub fn verbindung_hinzufuegen(&self, peer_addr: SocketAddr) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId(self.inner.naechste_id.fetch_add(1, Ordering::Relaxed));
        let (sender, rx) = SessionSender::neu(id, self.inner.send_queue_groesse);
        self.inner
            .sessions
            .lock()
            .insert(id, Session::neu(id, peer_addr, sender));

        tracing::debug!(verbindung = %id, peer = %peer_addr, "Session angelegt");
        (id, rx)
    }

    /// Speichert die per LivenessAnnounce gemeldete Identitaet
    ///
    /// Wird fuer registrierte Sessions ignoriert; dort gilt die ID der
    /// Registrierung.
    pub fn identitaet_setzen(&self, conn: ConnectionId, client_id: ClientId) -> bool {
        let mut sessions = self.inner.sessions.lock();
        match sessions.get_mut(&conn) {
            Some(session) if !session.ist_registriert() => {
                session.client_id = client_id;
                true
            }
            _ => false,
        }
    }

    /// Entfernt eine Session endgueltig
    ///
    /// War sie registriert, erhalten alle anderen vorher `ClientLeft`.
    /// Ein zweiter Aufruf fuer dieselbe Verbindung ist wirkungslos.
    pub fn entfernen(&self, conn: ConnectionId) -> bool {
        let (session, verlassen) = {
            let mut sessions = self.inner.sessions.lock();
            let Some(session) = sessions.remove(&conn) else {
                return false;
            };
            let verlassen = if session.ist_registriert() {
                verlassen_melden(&sessions, &session);
                Some((session.client_id.clone(), session.name.clone()))
            } else {
                None
            };
            (session, verlassen)
        };

        tracing::info!(
            verbindung = %conn,
            peer = %session.peer_addr,
            "Session entfernt"
        );
        if let Some((client_id, name)) = verlassen {
            self.ereignis_melden(ChatEvent::PeerVerlassen { client_id, name });
        }
        self.ereignis_melden(ChatEvent::LogZeile(format!(
            "Verbindung {} ({}) getrennt",
            conn, session.peer_addr
        )));
        true
    }

    // -----------------------------------------------------------------------
    // Registrierung
    // -----------------------------------------------------------------------

    /// Beansprucht einen Namen fuer eine Verbindung
    ///
    /// Prueft in dieser Reihenfolge: Identitaet frei, Name gueltig, Name
    /// nicht reserviert, Name frei. Bei Erfolg erhaelt die neue Session das
    /// Verzeichnis aller anderen und diese ein `ClientJoined`.
    pub fn registrieren(&self, conn: ConnectionId, client_id: ClientId, name: &str) -> SignalingResult<()> {
        {
            let mut sessions = self.inner.sessions.lock();

            match sessions.get(&conn) {
                None => return Err(SignalingError::UnbekannteVerbindung(conn)),
                Some(s) if s.ist_registriert() => {
                    return Err(SignalingError::BereitsRegistriert(conn))
                }
                Some(_) => {}
            }

            self.pruefen(&sessions, &client_id, name)?;

            if let Some(session) = sessions.get_mut(&conn) {
                session.registrieren(client_id.clone(), name);
            }

            let eintraege = verzeichnis_von(&sessions, Some(conn));
            if let Some(session) = sessions.get(&conn) {
                session.senden(Frame::RegisteredClients { eintraege });
            }
            an_registrierte(
                &sessions,
                Some(conn),
                &Frame::ClientJoined {
                    client_id: client_id.clone(),
                    name: name.to_string(),
                },
            );

            debug_assert!(invarianten_halten(&sessions));
        }

        tracing::info!(verbindung = %conn, name = %name, client_id = %client_id, "Client registriert");
        self.ereignis_melden(ChatEvent::PeerBeigetreten {
            client_id,
            name: name.to_string(),
        });
        Ok(())
    }

    fn pruefen(
        &self,
        sessions: &SessionTabelle,
        client_id: &ClientId,
        name: &str,
    ) -> Result<(), RegistrierungsFehler> {
        let registrierte = || sessions.values().filter(|s| s.ist_registriert());

        if registrierte().any(|s| &s.client_id == client_id) {
            return Err(RegistrierungsFehler::IdentitaetVergeben);
        }
        if !name_gueltig(name) {
            return Err(RegistrierungsFehler::NameUngueltig);
        }
        if self.ist_reserviert(name) {
            return Err(RegistrierungsFehler::NameReserviert);
        }
        if registrierte().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(RegistrierungsFehler::NameVergeben);
        }
        Ok(())
    }

    /// Prueft ob ein Name reserviert ist (ohne Gross-/Kleinschreibung)
    pub fn ist_reserviert(&self, name: &str) -> bool {
        self.inner.reservierte_namen.contains(&name.to_lowercase())
    }

    /// Meldet eine registrierte Session ab, ohne die Verbindung zu trennen
    pub fn deregistrieren(&self, conn: ConnectionId) -> bool {
        let verlassen = {
            let mut sessions = self.inner.sessions.lock();
            let Some(session) = sessions.get(&conn).filter(|s| s.ist_registriert()) else {
                return false;
            };
            verlassen_melden(&sessions, session);
            let verlassen = (session.client_id.clone(), session.name.clone());
            if let Some(session) = sessions.get_mut(&conn) {
                session.deregistrieren();
            }
            verlassen
        };

        tracing::info!(verbindung = %conn, name = %verlassen.1, "Client abgemeldet");
        self.ereignis_melden(ChatEvent::PeerVerlassen {
            client_id: verlassen.0,
            name: verlassen.1,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Sendet ein Frame an alle registrierten Sessions
    ///
    /// Gibt die Anzahl erfolgreich eingereihter Frames zurueck.
    pub fn an_alle_senden(&self, frame: Frame, ausgenommen: Option<ConnectionId>) -> usize {
        let sessions = self.inner.sessions.lock();
        an_registrierte(&sessions, ausgenommen, &frame)
    }

    /// Sendet ein Frame an die gelisteten Identitaeten und den Absender
    ///
    /// Jede Session erhaelt das Frame hoechstens einmal, auch wenn sie
    /// mehrfach gelistet ist. Unbekannte IDs werden uebergangen.
    pub fn an_ausgewaehlte_senden(&self, frame: Frame, empfaenger: &[ClientId], absender: ConnectionId) -> usize {
        let sessions = self.inner.sessions.lock();
        sessions
            .values()
            .filter(|s| s.ist_registriert())
            .filter(|s| s.connection_id == absender || empfaenger.contains(&s.client_id))
            .filter(|s| s.senden(frame.clone()))
            .count()
    }

    /// Sendet ein Frame an genau eine Verbindung, unabhaengig vom Zustand
    pub fn an_verbindung_senden(&self, conn: ConnectionId, frame: Frame) -> bool {
        let sessions = self.inner.sessions.lock();
        sessions.get(&conn).is_some_and(|s| s.senden(frame))
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    /// `"name id"` jeder registrierten Session in Tabellenreihenfolge
    pub fn verzeichnis(&self, ausgenommen: Option<ConnectionId>) -> Vec<String> {
        let sessions = self.inner.sessions.lock();
        verzeichnis_von(&sessions, ausgenommen)
    }

    /// Identitaet und Name einer registrierten Session
    pub fn absender(&self, conn: ConnectionId) -> Option<(ClientId, String)> {
        let sessions = self.inner.sessions.lock();
        sessions
            .get(&conn)
            .filter(|s| s.ist_registriert())
            .map(|s| (s.client_id.clone(), s.name.clone()))
    }

    pub fn zustand(&self, conn: ConnectionId) -> Option<SessionZustand> {
        self.inner.sessions.lock().get(&conn).map(|s| s.zustand)
    }

    /// Anzahl aller Sessions (auch unregistrierte)
    pub fn anzahl(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    pub fn registrierte_anzahl(&self) -> usize {
        self.inner
            .sessions
            .lock()
            .values()
            .filter(|s| s.ist_registriert())
            .count()
    }

    // -----------------------------------------------------------------------
    // Server-Funktionen
    // -----------------------------------------------------------------------

    /// Nachricht vom Server
    ///
    /// Ohne Empfaenger geht ein `ServerBroadcast` an alle registrierten
    /// Sessions, sonst ein `ServerPrivate` an die gelisteten IDs.
    pub fn server_nachricht(&self, text: &str, empfaenger: &[ClientId]) -> usize {
        let frame = if empfaenger.is_empty() {
            Frame::ServerBroadcast {
                text: text.to_string(),
            }
        } else {
            Frame::ServerPrivate {
                text: text.to_string(),
            }
        };
        if !passt_in_frame(&frame) {
            tracing::warn!(zeichen = text.len(), "Server-Nachricht zu gross – verworfen");
            return 0;
        }

        let sessions = self.inner.sessions.lock();
        if empfaenger.is_empty() {
            an_registrierte(&sessions, None, &frame)
        } else {
            sessions
                .values()
                .filter(|s| s.ist_registriert() && empfaenger.contains(&s.client_id))
                .filter(|s| s.senden(frame.clone()))
                .count()
        }
    }

    /// Sendet `Deregistered` an jede Session und meldet alle ab
    pub fn alle_deregistrieren(&self) -> usize {
        let verlassen: Vec<(ClientId, String)> = {
            let mut sessions = self.inner.sessions.lock();
            sessions
                .values_mut()
                .filter_map(|s| {
                    s.senden(Frame::Deregistered);
                    if !s.ist_registriert() {
                        return None;
                    }
                    let eintrag = (s.client_id.clone(), s.name.clone());
                    s.deregistrieren();
                    Some(eintrag)
                })
                .collect()
        };

        tracing::info!(anzahl = verlassen.len(), "Alle Clients abgemeldet");
        let anzahl = verlassen.len();
        for (client_id, name) in verlassen {
            self.ereignis_melden(ChatEvent::PeerVerlassen { client_id, name });
        }
        anzahl
    }

    /// Sendet `DisconnectAll` an jede Session
    pub fn alle_trennen(&self) -> usize {
        let sessions = self.inner.sessions.lock();
        sessions
            .values()
            .filter(|s| s.senden(Frame::DisconnectAll))
            .count()
    }

    // -----------------------------------------------------------------------
    // Beobachter
    // -----------------------------------------------------------------------

    /// Abonniert Chat-Events
    pub fn events_abonnieren(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Veroeffentlicht ein Event an alle Beobachter
    pub fn ereignis_melden(&self, event: ChatEvent) {
        // Fehler nur wenn niemand zuhoert
        let _ = self.inner.event_tx.send(event);
    }
}

/// Prueft Laenge und Zeichensatz eines Namens
pub fn name_gueltig(name: &str) -> bool {
    let laenge = name.chars().count();
    (NAME_MIN..=NAME_MAX).contains(&laenge)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen auf der gesperrten Tabelle
// ---------------------------------------------------------------------------

fn an_registrierte(sessions: &SessionTabelle, ausgenommen: Option<ConnectionId>, frame: &Frame) -> usize {
    sessions
        .values()
        .filter(|s| s.ist_registriert() && Some(s.connection_id) != ausgenommen)
        .filter(|s| s.senden(frame.clone()))
        .count()
}

fn verzeichnis_von(sessions: &SessionTabelle, ausgenommen: Option<ConnectionId>) -> Vec<String> {
    sessions
        .values()
        .filter(|s| s.ist_registriert() && Some(s.connection_id) != ausgenommen)
        .map(Session::verzeichnis_eintrag)
        .collect()
}

fn verlassen_melden(sessions: &SessionTabelle, session: &Session) {
    an_registrierte(
        sessions,
        Some(session.connection_id),
        &Frame::ClientLeft {
            client_id: session.client_id.clone(),
            name: session.name.clone(),
        },
    );
}

/// Keine zwei registrierten Sessions teilen Name oder Identitaet
fn invarianten_halten(sessions: &SessionTabelle) -> bool {
    let mut namen = HashSet::new();
    let mut ids = HashSet::new();
    sessions.values().filter(|s| s.ist_registriert()).all(|s| {
        !s.name.is_empty() && namen.insert(s.name.to_lowercase()) && ids.insert(s.client_id.clone())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use netchat_protocol::ErrorCode;

    const RESERVIERT: [&str; 4] = ["server", "chatserver", "majechatserver", "client"];

    fn registry() -> Registry {
        Registry::neu(RESERVIERT, 16)
    }

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn alle_frames(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(f) = rx.try_recv() {
            frames.push(f);
        }
        frames
    }

    fn fehler(r: SignalingResult<()>) -> RegistrierungsFehler {
        match r {
            Err(SignalingError::Registrierung(f)) => f,
            other => panic!("Registrierungsfehler erwartet, war {:?}", other),
        }
    }

    #[test]
    fn name_gueltigkeit() {
        assert!(name_gueltig("alice"));
        assert!(name_gueltig("a_b_c_1"));
        assert!(name_gueltig(&"x".repeat(20)));
        assert!(!name_gueltig("abcd"));
        assert!(!name_gueltig(&"x".repeat(21)));
        assert!(!name_gueltig("ali ce"));
        assert!(!name_gueltig("alice!"));
        assert!(!name_gueltig("älice"));
        assert!(!name_gueltig(""));
    }

    #[test]
    fn reservierte_namen_ohne_gross_klein() {
        let reg = registry();
        assert!(reg.ist_reserviert("Server"));
        assert!(reg.ist_reserviert("CLIENT"));
        assert!(!reg.ist_reserviert("alice"));

        let (c, _rx) = reg.verbindung_hinzufuegen(addr());
        let e = fehler(reg.registrieren(c, ClientId::from("{a}"), "ChatServer"));
        assert_eq!(e, RegistrierungsFehler::NameReserviert);
        assert_eq!(e.error_code(), ErrorCode::NameReserved);
    }

    #[test]
    fn ungueltiger_name_vor_reserviert_geprueft() {
        let reg = Registry::neu(["abc"], 16);
        let (c, _rx) = reg.verbindung_hinzufuegen(addr());
        assert_eq!(
            fehler(reg.registrieren(c, ClientId::from("{a}"), "ABC")),
            RegistrierungsFehler::NameUngueltig
        );
    }

    #[test]
    fn registrierung_sendet_verzeichnis_und_beitritt() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());

        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        assert_eq!(
            alle_frames(&mut rx_a),
            vec![Frame::RegisteredClients { eintraege: vec![] }]
        );

        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        assert_eq!(
            alle_frames(&mut rx_b),
            vec![Frame::RegisteredClients {
                eintraege: vec!["alice {a}".to_string()]
            }]
        );
        assert_eq!(
            alle_frames(&mut rx_a),
            vec![Frame::ClientJoined {
                client_id: ClientId::from("{b}"),
                name: "bobby".into()
            }]
        );
        assert_eq!(reg.registrierte_anzahl(), 2);
    }

    #[test]
    fn doppelter_name_abgelehnt() {
        let reg = registry();
        let (a, _rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());

        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        let e = fehler(reg.registrieren(b, ClientId::from("{b}"), "ALICE"));
        assert_eq!(e, RegistrierungsFehler::NameVergeben);
        assert_eq!(reg.zustand(b), Some(SessionZustand::Unregistriert));
        assert!(alle_frames(&mut rx_b).is_empty());
        assert_eq!(reg.verzeichnis(None), vec!["alice {a}".to_string()]);
    }

    #[test]
    fn doppelte_identitaet_abgelehnt() {
        let reg = registry();
        let (a, _rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, _rx_b) = reg.verbindung_hinzufuegen(addr());

        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        // Identitaet wird vor dem Namen geprueft
        assert_eq!(
            fehler(reg.registrieren(b, ClientId::from("{a}"), "x")),
            RegistrierungsFehler::IdentitaetVergeben
        );
    }

    #[test]
    fn bereits_registriert_und_unbekannt() {
        let reg = registry();
        let (a, _rx) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();

        assert!(matches!(
            reg.registrieren(a, ClientId::from("{z}"), "zorro"),
            Err(SignalingError::BereitsRegistriert(c)) if c == a
        ));
        assert!(matches!(
            reg.registrieren(ConnectionId(999), ClientId::from("{z}"), "zorro"),
            Err(SignalingError::UnbekannteVerbindung(_))
        ));
    }

    #[test]
    fn name_nach_abmeldung_wieder_frei() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        alle_frames(&mut rx_a);
        alle_frames(&mut rx_b);

        assert!(reg.deregistrieren(a));
        assert!(!reg.deregistrieren(a));
        assert_eq!(reg.zustand(a), Some(SessionZustand::Deregistriert));
        assert!(alle_frames(&mut rx_a).is_empty(), "kein Deregistered an sich selbst");
        assert_eq!(
            alle_frames(&mut rx_b),
            vec![Frame::ClientLeft {
                client_id: ClientId::from("{a}"),
                name: "alice".into()
            }]
        );

        let (c, _rx_c) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(c, ClientId::from("{c}"), "alice").unwrap();

        // Abgemeldete Session darf sich erneut registrieren
        reg.registrieren(a, ClientId::from("{a}"), "alice_2").unwrap();
    }

    #[test]
    fn entfernen_genau_einmal() {
        let reg = registry();
        let (a, _rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        alle_frames(&mut rx_b);

        assert!(reg.entfernen(a));
        assert!(!reg.entfernen(a));
        assert_eq!(reg.anzahl(), 1);
        assert_eq!(
            alle_frames(&mut rx_b),
            vec![Frame::ClientLeft {
                client_id: ClientId::from("{a}"),
                name: "alice".into()
            }]
        );
    }

    #[test]
    fn entfernen_unregistriert_ohne_broadcast() {
        let reg = registry();
        let (a, _rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        alle_frames(&mut rx_b);

        assert!(reg.entfernen(a));
        assert!(alle_frames(&mut rx_b).is_empty());
    }

    #[test]
    fn an_alle_inklusive_absender() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());
        let (_u, mut rx_u) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        alle_frames(&mut rx_a);
        alle_frames(&mut rx_b);

        let frame = Frame::MessageToAll {
            absender_id: ClientId::from("{a}"),
            absender_name: "alice".into(),
            text: "hi".into(),
        };
        assert_eq!(reg.an_alle_senden(frame.clone(), None), 2);
        assert_eq!(alle_frames(&mut rx_a), vec![frame.clone()]);
        assert_eq!(alle_frames(&mut rx_b), vec![frame.clone()]);
        assert!(alle_frames(&mut rx_u).is_empty(), "unregistriert erhaelt nichts");

        assert_eq!(reg.an_alle_senden(frame, Some(a)), 1);
        assert!(alle_frames(&mut rx_a).is_empty());
    }

    #[test]
    fn an_ausgewaehlte_mit_echo() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());
        let (c, mut rx_c) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        reg.registrieren(c, ClientId::from("{c}"), "carol").unwrap();
        alle_frames(&mut rx_a);
        alle_frames(&mut rx_b);
        alle_frames(&mut rx_c);

        let frame = Frame::ServerPrivate { text: "x".into() };
        let empfaenger = [
            ClientId::from("{b}"),
            ClientId::from("{b}"),
            ClientId::from("{gibtsnicht}"),
        ];
        assert_eq!(reg.an_ausgewaehlte_senden(frame.clone(), &empfaenger, a), 2);
        assert_eq!(alle_frames(&mut rx_a), vec![frame.clone()]);
        assert_eq!(alle_frames(&mut rx_b), vec![frame]);
        assert!(alle_frames(&mut rx_c).is_empty());
    }

    #[test]
    fn identitaet_nur_vor_registrierung() {
        let reg = registry();
        let (a, _rx) = reg.verbindung_hinzufuegen(addr());
        assert!(reg.identitaet_setzen(a, ClientId::from("{live}")));
        reg.registrieren(a, ClientId::from("{reg}"), "alice").unwrap();
        assert!(!reg.identitaet_setzen(a, ClientId::from("{anders}")));
        assert_eq!(reg.absender(a), Some((ClientId::from("{reg}"), "alice".into())));
    }

    #[test]
    fn server_nachricht_broadcast_und_privat() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        let (b, mut rx_b) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();
        alle_frames(&mut rx_a);
        alle_frames(&mut rx_b);

        assert_eq!(reg.server_nachricht("alle", &[]), 2);
        assert_eq!(
            alle_frames(&mut rx_a),
            vec![Frame::ServerBroadcast { text: "alle".into() }]
        );
        alle_frames(&mut rx_b);

        assert_eq!(reg.server_nachricht("nur b", &[ClientId::from("{b}")]), 1);
        assert!(alle_frames(&mut rx_a).is_empty());
        assert_eq!(
            alle_frames(&mut rx_b),
            vec![Frame::ServerPrivate { text: "nur b".into() }]
        );
    }

    #[test]
    fn zu_grosse_server_nachricht_wird_verworfen() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        alle_frames(&mut rx_a);

        assert_eq!(reg.server_nachricht(&"x".repeat(32766), &[]), 0);
        assert_eq!(reg.server_nachricht(&"x".repeat(32766), &[ClientId::from("{a}")]), 0);
        assert!(alle_frames(&mut rx_a).is_empty());

        assert_eq!(reg.server_nachricht(&"x".repeat(32765), &[]), 1);
    }

    #[test]
    fn alle_deregistrieren_und_trennen() {
        let reg = registry();
        let (a, mut rx_a) = reg.verbindung_hinzufuegen(addr());
        let (_u, mut rx_u) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        alle_frames(&mut rx_a);

        assert_eq!(reg.alle_deregistrieren(), 1);
        assert_eq!(reg.registrierte_anzahl(), 0);
        assert_eq!(alle_frames(&mut rx_a), vec![Frame::Deregistered]);
        assert_eq!(alle_frames(&mut rx_u), vec![Frame::Deregistered]);

        assert_eq!(reg.alle_trennen(), 2);
        assert_eq!(alle_frames(&mut rx_a), vec![Frame::DisconnectAll]);
        assert_eq!(alle_frames(&mut rx_u), vec![Frame::DisconnectAll]);
    }

    #[test]
    fn verzeichnis_in_annahme_reihenfolge() {
        let reg = registry();
        let (a, _ra) = reg.verbindung_hinzufuegen(addr());
        let (b, _rb) = reg.verbindung_hinzufuegen(addr());
        let (c, _rc) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(c, ClientId::from("{c}"), "carol").unwrap();
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.registrieren(b, ClientId::from("{b}"), "bobby").unwrap();

        assert_eq!(
            reg.verzeichnis(None),
            vec!["alice {a}", "bobby {b}", "carol {c}"]
        );
        assert_eq!(reg.verzeichnis(Some(b)), vec!["alice {a}", "carol {c}"]);
    }

    #[test]
    fn events_werden_gemeldet() {
        let reg = registry();
        let mut events = reg.events_abonnieren();
        let (a, _rx) = reg.verbindung_hinzufuegen(addr());
        reg.registrieren(a, ClientId::from("{a}"), "alice").unwrap();
        reg.entfernen(a);

        assert_eq!(
            events.try_recv().unwrap(),
            ChatEvent::PeerBeigetreten {
                client_id: ClientId::from("{a}"),
                name: "alice".into()
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ChatEvent::PeerVerlassen {
                client_id: ClientId::from("{a}"),
                name: "alice".into()
            }
        );
        assert!(matches!(events.try_recv().unwrap(), ChatEvent::LogZeile(_)));
    }

    #[test]
    fn gleichzeitige_registrierung_nur_einer_gewinnt() {
        let reg = registry();
        let verbindungen: Vec<_> = (0..16).map(|_| reg.verbindung_hinzufuegen(addr())).collect();

        let handles: Vec<_> = verbindungen
            .iter()
            .enumerate()
            .map(|(i, (conn, _))| {
                let reg = reg.clone();
                let conn = *conn;
                std::thread::spawn(move || {
                    reg.registrieren(conn, ClientId::from(format!("{{{}}}", i)), "gleich")
                        .is_ok()
                })
            })
            .collect();

        let erfolge = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(erfolge, 1);
        assert_eq!(reg.registrierte_anzahl(), 1);
    }
}
