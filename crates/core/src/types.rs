//! Gemeinsame Identifikationstypen fuer netchat
//!
//! Zwei getrennte ID-Arten, im Newtype-Pattern damit sie zur Compilezeit
//! nicht verwechselt werden:
//! - `ConnectionId`: vom Server vergeben, eine pro TCP-Verbindung
//! - `ClientId`: vom Client behauptete, stabile Identitaet (`{uuid}`)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-interne Verbindungs-ID
///
/// Wird von der Registry fortlaufend vergeben und ist nur fuer die Laufzeit
/// des Server-Prozesses eindeutig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verbindung:{}", self.0)
    }
}

/// Vom Client gemeldete Identitaet
///
/// Auf dem Draht ein freier String; der Client erzeugt ihn als UUID in
/// geschweiften Klammern (`{xxxxxxxx-...}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Erzeugt eine neue zufaellige Identitaet im Format `{uuid}`
    pub fn generieren() -> Self {
        Self(format!("{{{}}}", Uuid::new_v4()))
    }

    /// Platzhalter fuer Verbindungen, die noch keine Identitaet gemeldet haben
    pub fn unbekannt() -> Self {
        Self(format!("{{{}}}", Uuid::nil()))
    }

    /// Prueft ob dies der Platzhalter ist
    pub fn ist_unbekannt(&self) -> bool {
        *self == Self::unbekannt()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::unbekannt()
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
