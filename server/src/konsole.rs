//! Operator-Konsole
//!
//! Liest Befehle zeilenweise von stdin:
//!
//! | Befehl | Wirkung |
//! |---|---|
//! | `/alle <text>` | Server-Nachricht an alle |
//! | `/an <id,id> <text>` | Private Server-Nachricht |
//! | `/liste` | Verzeichnis ins Log schreiben |
//! | `/deregistrieren` | Alle Clients abmelden |
//! | `/stop` | Server herunterfahren |
//!
//! stdin wird auf einem eigenen Thread gelesen. Ein blockierender Read
//! haelt so weder Ctrl-C noch `/stop` auf.

use netchat_core::ClientId;
use netchat_protocol::frame::{empfaenger_id, liste_teilen};
use netchat_signaling::SignalingState;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;

/// Ein geparster Konsolen-Befehl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KonsolenBefehl {
    Alle(String),
    An {
        empfaenger: Vec<ClientId>,
        text: String,
    },
    Liste,
    Deregistrieren,
    Stop,
    Unbekannt(String),
}

/// Parst eine Eingabezeile; leere Zeilen ergeben `None`
pub fn parsen(zeile: &str) -> Option<KonsolenBefehl> {
    let zeile = zeile.trim();
    if zeile.is_empty() {
        return None;
    }

    let (befehl, rest) = zeile.split_once(' ').unwrap_or((zeile, ""));
    let rest = rest.trim_start();

    let befehl = match befehl {
        "/alle" if !rest.is_empty() => KonsolenBefehl::Alle(rest.to_string()),
        "/an" => {
            let (liste, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let empfaenger: Vec<ClientId> = liste_teilen(liste)
                .iter()
                .map(|e| empfaenger_id(e))
                .filter(|id| !id.is_empty())
                .map(ClientId::from)
                .collect();
            let text = text.trim_start();
            if empfaenger.is_empty() || text.is_empty() {
                return Some(KonsolenBefehl::Unbekannt(zeile.to_string()));
            }
            KonsolenBefehl::An {
                empfaenger,
                text: text.to_string(),
            }
        }
        "/liste" => KonsolenBefehl::Liste,
        "/deregistrieren" => KonsolenBefehl::Deregistrieren,
        "/stop" => KonsolenBefehl::Stop,
        _ => KonsolenBefehl::Unbekannt(zeile.to_string()),
    };
    Some(befehl)
}

/// Startet den Konsolen-Thread, der stdin liest
pub fn lesen_starten(tx: mpsc::Sender<KonsolenBefehl>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("konsole".into())
        .spawn(move || zeilen_lesen(std::io::stdin().lock(), &tx))
}

/// Liest Befehle bis die Eingabe endet oder der Empfaenger weg ist
///
/// Blockiert; nicht aus einem async-Kontext aufrufen.
pub fn zeilen_lesen<R: BufRead>(leser: R, tx: &mpsc::Sender<KonsolenBefehl>) {
    for zeile in leser.lines() {
        match zeile {
            Ok(zeile) => {
                let Some(befehl) = parsen(&zeile) else {
                    continue;
                };
                if tx.blocking_send(befehl).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Konsole nicht lesbar");
                return;
            }
        }
    }
    tracing::debug!("Konsole beendet");
}

/// Fuehrt einen Befehl aus; `/stop` wird vom Aufrufer behandelt
pub fn ausfuehren(befehl: &KonsolenBefehl, state: &SignalingState) {
    let registry = &state.registry;
    match befehl {
        KonsolenBefehl::Alle(text) => {
            let anzahl = registry.server_nachricht(text, &[]);
            tracing::info!(empfaenger = anzahl, "Server-Nachricht an alle gesendet");
        }
        KonsolenBefehl::An { empfaenger, text } => {
            let anzahl = registry.server_nachricht(text, empfaenger);
            tracing::info!(empfaenger = anzahl, "Private Server-Nachricht gesendet");
        }
        KonsolenBefehl::Liste => {
            let verzeichnis = registry.verzeichnis(None);
            tracing::info!(
                server = %state.config.server_name,
                verbindungen = registry.anzahl(),
                registriert = verzeichnis.len(),
                uptime_sek = state.uptime_sek(),
                "Teilnehmer"
            );
            for eintrag in verzeichnis {
                tracing::info!("  {}", eintrag);
            }
        }
        KonsolenBefehl::Deregistrieren => {
            registry.alle_deregistrieren();
        }
        KonsolenBefehl::Stop => {}
        KonsolenBefehl::Unbekannt(zeile) => {
            tracing::warn!(eingabe = %zeile, "Unbekanntes Kommando");
        }
    }
}
